use serde::{Deserialize, Serialize};
use std::fmt;

/// A binary operator of the condition-expression language.
///
/// Precedence is not encoded here — it is a property of the grammar
/// (spec.md §4.2) and of the serializer's parenthesization logic, not of the
/// AST node itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Contains,
    IContains,
    IEquals,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Matches,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "\\",
            BinaryOp::Mod => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Contains => "contains",
            BinaryOp::IContains => "icontains",
            BinaryOp::IEquals => "iequals",
            BinaryOp::StartsWith => "startswith",
            BinaryOp::IStartsWith => "istartswith",
            BinaryOp::EndsWith => "endswith",
            BinaryOp::IEndsWith => "iendswith",
            BinaryOp::Matches => "matches",
        })
    }
}

/// Precedence class, lowest-to-highest (spec.md §4.2). Higher binds tighter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Precedence(pub u8);

impl BinaryOp {
    pub const fn precedence(self) -> Precedence {
        use BinaryOp::*;
        Precedence(match self {
            Or => 0,
            And => 1,
            BitOr => 2,
            BitXor => 3,
            BitAnd => 4,
            Eq | Neq => 5,
            Lt | Le | Gt | Ge | Contains | IContains | IEquals | StartsWith | IStartsWith
            | EndsWith | IEndsWith | Matches => 6,
            Shl | Shr => 7,
            Add | Sub => 8,
            Mul | Div | Mod => 9,
        })
    }
}
