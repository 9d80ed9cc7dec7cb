//! The condition-expression language: a single tagged variant over every
//! expression family in spec.md §3, matching the teacher's preference for a
//! tagged-variant AST over a virtual-dispatch hierarchy (spec.md §9).

mod binary;
mod set;
mod sigil;

pub use binary::{BinaryOp, Precedence};
pub use set::{Iterable, Quantifier, RuleSetMember, StringSet, StringSetMember};
pub use sigil::StringRef;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    // --- literals ---
    Integer(i64),
    Float(f64),
    StringLit(Vec<u8>),
    Regex {
        bytes: Vec<u8>,
        case_insensitive: bool,
        dot_all: bool,
    },
    Bool(bool),
    Filesize,
    Entrypoint,

    // --- identifier reference family ---
    Identifier(String),
    Member(Box<Expr>, String),
    Subscript(Box<Expr>, Box<Expr>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        /// Whether `callee` syntactically names one of the built-in integer
        /// readers (`int8`, `uint32be`, ...) rather than a user/module
        /// function (spec.md §3).
        builtin: bool,
    },

    // --- string-reference sigils ---
    StringMatch(StringRef),
    StringCount(StringRef),
    StringOffset {
        id: StringRef,
        index: Option<Box<Expr>>,
    },
    StringLength {
        id: StringRef,
        index: Option<Box<Expr>>,
    },
    /// `$id at E`.
    StringAt {
        id: StringRef,
        at: Box<Expr>,
    },
    /// `$id in (E..E)`; `range` is always an [`Expr::Range`].
    StringIn {
        id: StringRef,
        range: Box<Expr>,
    },
    /// `#id in (range)`; `range` is always an [`Expr::Range`].
    StringCountInRange {
        id: StringRef,
        range: Box<Expr>,
    },

    // --- unary ---
    Neg(Box<Expr>),
    BitNot(Box<Expr>),
    Not(Box<Expr>),
    Defined(Box<Expr>),

    // --- binary ---
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `(lo..hi)`.
    Range {
        lo: Box<Expr>,
        hi: Box<Expr>,
    },

    /// A quantified string set: `any of ($a, $b*)`, optionally narrowed by
    /// `in (range)` and/or `at E`.
    SetOf {
        quantifier: Quantifier,
        set: StringSet,
        in_range: Option<Box<Expr>>,
        at: Option<Box<Expr>>,
    },

    /// A quantified rule set: `any of (RULE_A, RULE_B*)`.
    RuleSetOf {
        quantifier: Quantifier,
        set: Vec<RuleSetMember>,
    },

    /// `for <quantifier> <vars> in <iterable> : (<body>)`.
    ForIn {
        quantifier: Quantifier,
        vars: Vec<String>,
        iterable: Iterable,
        body: Box<Expr>,
    },

    /// `for <quantifier> of <set> : (<body>)`.
    ForOf {
        quantifier: Quantifier,
        set: StringSet,
        body: Box<Expr>,
    },

    /// An expression the source wrapped in explicit parentheses. The
    /// serializer always re-emits these parens (spec.md §4.5), on top of
    /// whatever parens precedence alone would require.
    Paren(Box<Expr>),
}

impl Expr {
    /// Strips [`Expr::Paren`] wrappers, for callers that only care about
    /// the underlying shape (e.g. the builtin-function check).
    pub fn unparen(&self) -> &Expr {
        let mut e = self;
        while let Expr::Paren(inner) = e {
            e = inner;
        }
        e
    }
}

/// Built-in integer-reader function names (spec.md §3).
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "int8", "int16", "int32", "uint8", "uint16", "uint32", "int8be", "int16be", "int32be",
    "uint8be", "uint16be", "uint32be",
];

pub fn is_builtin_name(name: &str) -> bool {
    BUILTIN_FUNCTIONS.contains(&name)
}
