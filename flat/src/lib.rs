//! The flat-form bridge (spec.md §4.6): a parallel, data-only mirror of
//! `yara-ast`'s tree that replaces `Box<Expr>` recursion with arena indices
//! into a flat `Vec<FlatExprNode>`, so a rule set can cross a wire format
//! (or a schema that has no notion of recursive boxed types) without losing
//! information. `to_flat`/`from_flat` are total, pure, and inverse on any
//! rule set the parser can produce.

use serde::{Deserialize, Serialize};

use yara_ast::{
    BinaryOp, Expr, Import, Iterable, Meta, Quantifier, Rule, RuleModifiers, RuleSet,
    RuleSetMember, StringDecl, StringRef, StringSet,
};
use yara_span::Span;

/// An index into a [`FlatRuleSet`]'s expression arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlatQuantifier {
    All,
    Any,
    None,
    Expr(ExprId),
    Percent(ExprId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlatIterable {
    IntegerSet(Vec<ExprId>),
    Range(ExprId),
    TextStringSet(Vec<Vec<u8>>),
    Expr(ExprId),
}

/// One node of a flattened condition expression. Children are referenced by
/// [`ExprId`] rather than nested `Box<Expr>`; every child id is guaranteed
/// to index an earlier, already-pushed arena slot (post-order construction),
/// so the arena is acyclic by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlatExprNode {
    Integer(i64),
    Float(f64),
    StringLit(Vec<u8>),
    Regex { bytes: Vec<u8>, case_insensitive: bool, dot_all: bool },
    Bool(bool),
    Filesize,
    Entrypoint,
    Identifier(String),
    Member { base: ExprId, field: String },
    Subscript { base: ExprId, index: ExprId },
    Call { callee: ExprId, args: Vec<ExprId>, builtin: bool },
    StringMatch(StringRef),
    StringCount(StringRef),
    StringOffset { id: StringRef, index: Option<ExprId> },
    StringLength { id: StringRef, index: Option<ExprId> },
    StringAt { id: StringRef, at: ExprId },
    StringIn { id: StringRef, range: ExprId },
    StringCountInRange { id: StringRef, range: ExprId },
    Neg(ExprId),
    BitNot(ExprId),
    Not(ExprId),
    Defined(ExprId),
    Binary { op: BinaryOp, lhs: ExprId, rhs: ExprId },
    Range { lo: ExprId, hi: ExprId },
    SetOf { quantifier: FlatQuantifier, set: StringSet, in_range: Option<ExprId>, at: Option<ExprId> },
    RuleSetOf { quantifier: FlatQuantifier, set: Vec<RuleSetMember> },
    ForIn { quantifier: FlatQuantifier, vars: Vec<String>, iterable: FlatIterable, body: ExprId },
    ForOf { quantifier: FlatQuantifier, set: StringSet, body: ExprId },
    Paren(ExprId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRule {
    pub identifier: String,
    pub modifiers: RuleModifiers,
    pub tags: Vec<String>,
    pub meta: Vec<Meta>,
    pub strings: Vec<StringDecl>,
    pub condition: ExprId,
    pub span: Span,
}

/// The flattened mirror of a whole [`RuleSet`]: every rule's condition tree
/// lives in the single shared `exprs` arena, referenced by [`ExprId`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatRuleSet {
    pub imports: Vec<Import>,
    pub rules: Vec<FlatRule>,
    pub exprs: Vec<FlatExprNode>,
}

fn push(arena: &mut Vec<FlatExprNode>, node: FlatExprNode) -> ExprId {
    let id = ExprId(arena.len() as u32);
    arena.push(node);
    id
}

fn flatten_quantifier(q: &Quantifier, arena: &mut Vec<FlatExprNode>) -> FlatQuantifier {
    match q {
        Quantifier::All => FlatQuantifier::All,
        Quantifier::Any => FlatQuantifier::Any,
        Quantifier::None => FlatQuantifier::None,
        Quantifier::Expr(e) => FlatQuantifier::Expr(flatten_expr(e, arena)),
        Quantifier::Percent(e) => FlatQuantifier::Percent(flatten_expr(e, arena)),
    }
}

fn flatten_iterable(iterable: &Iterable, arena: &mut Vec<FlatExprNode>) -> FlatIterable {
    match iterable {
        Iterable::IntegerSet(items) => {
            FlatIterable::IntegerSet(items.iter().map(|e| flatten_expr(e, arena)).collect())
        }
        Iterable::Range(e) => FlatIterable::Range(flatten_expr(e, arena)),
        Iterable::TextStringSet(items) => FlatIterable::TextStringSet(items.clone()),
        Iterable::Expr(e) => FlatIterable::Expr(flatten_expr(e, arena)),
    }
}

fn flatten_expr(expr: &Expr, arena: &mut Vec<FlatExprNode>) -> ExprId {
    let node = match expr {
        Expr::Integer(n) => FlatExprNode::Integer(*n),
        Expr::Float(f) => FlatExprNode::Float(*f),
        Expr::StringLit(bytes) => FlatExprNode::StringLit(bytes.clone()),
        Expr::Regex { bytes, case_insensitive, dot_all } => FlatExprNode::Regex {
            bytes: bytes.clone(),
            case_insensitive: *case_insensitive,
            dot_all: *dot_all,
        },
        Expr::Bool(b) => FlatExprNode::Bool(*b),
        Expr::Filesize => FlatExprNode::Filesize,
        Expr::Entrypoint => FlatExprNode::Entrypoint,
        Expr::Identifier(name) => FlatExprNode::Identifier(name.clone()),
        Expr::Member(base, field) => {
            let base = flatten_expr(base, arena);
            FlatExprNode::Member { base, field: field.clone() }
        }
        Expr::Subscript(base, index) => {
            let base = flatten_expr(base, arena);
            let index = flatten_expr(index, arena);
            FlatExprNode::Subscript { base, index }
        }
        Expr::Call { callee, args, builtin } => {
            let callee = flatten_expr(callee, arena);
            let args = args.iter().map(|a| flatten_expr(a, arena)).collect();
            FlatExprNode::Call { callee, args, builtin: *builtin }
        }
        Expr::StringMatch(id) => FlatExprNode::StringMatch(id.clone()),
        Expr::StringCount(id) => FlatExprNode::StringCount(id.clone()),
        Expr::StringOffset { id, index } => {
            let index = index.as_ref().map(|e| flatten_expr(e, arena));
            FlatExprNode::StringOffset { id: id.clone(), index }
        }
        Expr::StringLength { id, index } => {
            let index = index.as_ref().map(|e| flatten_expr(e, arena));
            FlatExprNode::StringLength { id: id.clone(), index }
        }
        Expr::StringAt { id, at } => {
            let at = flatten_expr(at, arena);
            FlatExprNode::StringAt { id: id.clone(), at }
        }
        Expr::StringIn { id, range } => {
            let range = flatten_expr(range, arena);
            FlatExprNode::StringIn { id: id.clone(), range }
        }
        Expr::StringCountInRange { id, range } => {
            let range = flatten_expr(range, arena);
            FlatExprNode::StringCountInRange { id: id.clone(), range }
        }
        Expr::Neg(inner) => FlatExprNode::Neg(flatten_expr(inner, arena)),
        Expr::BitNot(inner) => FlatExprNode::BitNot(flatten_expr(inner, arena)),
        Expr::Not(inner) => FlatExprNode::Not(flatten_expr(inner, arena)),
        Expr::Defined(inner) => FlatExprNode::Defined(flatten_expr(inner, arena)),
        Expr::Binary { op, lhs, rhs } => {
            let lhs = flatten_expr(lhs, arena);
            let rhs = flatten_expr(rhs, arena);
            FlatExprNode::Binary { op: *op, lhs, rhs }
        }
        Expr::Range { lo, hi } => {
            let lo = flatten_expr(lo, arena);
            let hi = flatten_expr(hi, arena);
            FlatExprNode::Range { lo, hi }
        }
        Expr::SetOf { quantifier, set, in_range, at } => {
            let quantifier = flatten_quantifier(quantifier, arena);
            let in_range = in_range.as_ref().map(|e| flatten_expr(e, arena));
            let at = at.as_ref().map(|e| flatten_expr(e, arena));
            FlatExprNode::SetOf { quantifier, set: set.clone(), in_range, at }
        }
        Expr::RuleSetOf { quantifier, set } => {
            let quantifier = flatten_quantifier(quantifier, arena);
            FlatExprNode::RuleSetOf { quantifier, set: set.clone() }
        }
        Expr::ForIn { quantifier, vars, iterable, body } => {
            let quantifier = flatten_quantifier(quantifier, arena);
            let iterable = flatten_iterable(iterable, arena);
            let body = flatten_expr(body, arena);
            FlatExprNode::ForIn { quantifier, vars: vars.clone(), iterable, body }
        }
        Expr::ForOf { quantifier, set, body } => {
            let quantifier = flatten_quantifier(quantifier, arena);
            let body = flatten_expr(body, arena);
            FlatExprNode::ForOf { quantifier, set: set.clone(), body }
        }
        Expr::Paren(inner) => FlatExprNode::Paren(flatten_expr(inner, arena)),
    };
    push(arena, node)
}

/// Flatten a whole [`RuleSet`] into its arena-backed mirror.
pub fn to_flat(ruleset: &RuleSet) -> FlatRuleSet {
    let mut exprs = Vec::new();
    let rules = ruleset
        .rules
        .iter()
        .map(|rule| FlatRule {
            identifier: rule.identifier.clone(),
            modifiers: rule.modifiers,
            tags: rule.tags.clone(),
            meta: rule.meta.clone(),
            strings: rule.strings.clone(),
            condition: flatten_expr(&rule.condition, &mut exprs),
            span: rule.span,
        })
        .collect();
    FlatRuleSet { imports: ruleset.imports.clone(), rules, exprs }
}

fn unflatten_quantifier(q: &FlatQuantifier, arena: &[FlatExprNode]) -> Quantifier {
    match q {
        FlatQuantifier::All => Quantifier::All,
        FlatQuantifier::Any => Quantifier::Any,
        FlatQuantifier::None => Quantifier::None,
        FlatQuantifier::Expr(id) => Quantifier::Expr(Box::new(unflatten_expr(*id, arena))),
        FlatQuantifier::Percent(id) => Quantifier::Percent(Box::new(unflatten_expr(*id, arena))),
    }
}

fn unflatten_iterable(iterable: &FlatIterable, arena: &[FlatExprNode]) -> Iterable {
    match iterable {
        FlatIterable::IntegerSet(items) => {
            Iterable::IntegerSet(items.iter().map(|id| unflatten_expr(*id, arena)).collect())
        }
        FlatIterable::Range(id) => Iterable::Range(Box::new(unflatten_expr(*id, arena))),
        FlatIterable::TextStringSet(items) => Iterable::TextStringSet(items.clone()),
        FlatIterable::Expr(id) => Iterable::Expr(Box::new(unflatten_expr(*id, arena))),
    }
}

/// Reconstruct the `Expr` rooted at `id`. Panics if `id` or any id it
/// transitively references is out of bounds for `arena` — which cannot
/// happen for an arena produced by [`to_flat`], since every id it ever
/// writes indexes an already-pushed, earlier slot.
fn unflatten_expr(id: ExprId, arena: &[FlatExprNode]) -> Expr {
    match &arena[id.0 as usize] {
        FlatExprNode::Integer(n) => Expr::Integer(*n),
        FlatExprNode::Float(f) => Expr::Float(*f),
        FlatExprNode::StringLit(bytes) => Expr::StringLit(bytes.clone()),
        FlatExprNode::Regex { bytes, case_insensitive, dot_all } => Expr::Regex {
            bytes: bytes.clone(),
            case_insensitive: *case_insensitive,
            dot_all: *dot_all,
        },
        FlatExprNode::Bool(b) => Expr::Bool(*b),
        FlatExprNode::Filesize => Expr::Filesize,
        FlatExprNode::Entrypoint => Expr::Entrypoint,
        FlatExprNode::Identifier(name) => Expr::Identifier(name.clone()),
        FlatExprNode::Member { base, field } => {
            Expr::Member(Box::new(unflatten_expr(*base, arena)), field.clone())
        }
        FlatExprNode::Subscript { base, index } => Expr::Subscript(
            Box::new(unflatten_expr(*base, arena)),
            Box::new(unflatten_expr(*index, arena)),
        ),
        FlatExprNode::Call { callee, args, builtin } => Expr::Call {
            callee: Box::new(unflatten_expr(*callee, arena)),
            args: args.iter().map(|id| unflatten_expr(*id, arena)).collect(),
            builtin: *builtin,
        },
        FlatExprNode::StringMatch(id) => Expr::StringMatch(id.clone()),
        FlatExprNode::StringCount(id) => Expr::StringCount(id.clone()),
        FlatExprNode::StringOffset { id: sref, index } => Expr::StringOffset {
            id: sref.clone(),
            index: index.map(|i| Box::new(unflatten_expr(i, arena))),
        },
        FlatExprNode::StringLength { id: sref, index } => Expr::StringLength {
            id: sref.clone(),
            index: index.map(|i| Box::new(unflatten_expr(i, arena))),
        },
        FlatExprNode::StringAt { id: sref, at } => {
            Expr::StringAt { id: sref.clone(), at: Box::new(unflatten_expr(*at, arena)) }
        }
        FlatExprNode::StringIn { id: sref, range } => {
            Expr::StringIn { id: sref.clone(), range: Box::new(unflatten_expr(*range, arena)) }
        }
        FlatExprNode::StringCountInRange { id: sref, range } => Expr::StringCountInRange {
            id: sref.clone(),
            range: Box::new(unflatten_expr(*range, arena)),
        },
        FlatExprNode::Neg(inner) => Expr::Neg(Box::new(unflatten_expr(*inner, arena))),
        FlatExprNode::BitNot(inner) => Expr::BitNot(Box::new(unflatten_expr(*inner, arena))),
        FlatExprNode::Not(inner) => Expr::Not(Box::new(unflatten_expr(*inner, arena))),
        FlatExprNode::Defined(inner) => Expr::Defined(Box::new(unflatten_expr(*inner, arena))),
        FlatExprNode::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(unflatten_expr(*lhs, arena)),
            rhs: Box::new(unflatten_expr(*rhs, arena)),
        },
        FlatExprNode::Range { lo, hi } => Expr::Range {
            lo: Box::new(unflatten_expr(*lo, arena)),
            hi: Box::new(unflatten_expr(*hi, arena)),
        },
        FlatExprNode::SetOf { quantifier, set, in_range, at } => Expr::SetOf {
            quantifier: unflatten_quantifier(quantifier, arena),
            set: set.clone(),
            in_range: in_range.map(|i| Box::new(unflatten_expr(i, arena))),
            at: at.map(|i| Box::new(unflatten_expr(i, arena))),
        },
        FlatExprNode::RuleSetOf { quantifier, set } => Expr::RuleSetOf {
            quantifier: unflatten_quantifier(quantifier, arena),
            set: set.clone(),
        },
        FlatExprNode::ForIn { quantifier, vars, iterable, body } => Expr::ForIn {
            quantifier: unflatten_quantifier(quantifier, arena),
            vars: vars.clone(),
            iterable: unflatten_iterable(iterable, arena),
            body: Box::new(unflatten_expr(*body, arena)),
        },
        FlatExprNode::ForOf { quantifier, set, body } => Expr::ForOf {
            quantifier: unflatten_quantifier(quantifier, arena),
            set: set.clone(),
            body: Box::new(unflatten_expr(*body, arena)),
        },
        FlatExprNode::Paren(inner) => Expr::Paren(Box::new(unflatten_expr(*inner, arena))),
    }
}

/// Reconstruct a [`RuleSet`] from its flattened mirror.
pub fn from_flat(flat: &FlatRuleSet) -> RuleSet {
    let rules = flat
        .rules
        .iter()
        .map(|rule| Rule {
            identifier: rule.identifier.clone(),
            modifiers: rule.modifiers,
            tags: rule.tags.clone(),
            meta: rule.meta.clone(),
            strings: rule.strings.clone(),
            condition: unflatten_expr(rule.condition, &flat.exprs),
            span: rule.span,
        })
        .collect();
    RuleSet::new(flat.imports.clone(), rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> RuleSet {
        yara_parser::parse(src.as_bytes()).expect("parses")
    }

    #[test]
    fn round_trips_through_flat_form() {
        let ruleset = parse(
            r#"
            rule foo {
                strings:
                    $a = "x"
                condition:
                    for any of ($a) : (# > 1) and (1 + 2) * 3 == 9
            }
        "#,
        );
        let flat = to_flat(&ruleset);
        let rebuilt = from_flat(&flat);
        assert_eq!(ruleset, rebuilt);
    }

    #[test]
    fn serializes_as_json() {
        let ruleset = parse("rule foo { condition: uint32(0) == 23117 }");
        let flat = to_flat(&ruleset);
        let json = serde_json::to_string(&flat).unwrap();
        let back: FlatRuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(flat, back);
        assert_eq!(from_flat(&back), ruleset);
    }

    #[test]
    fn flat_to_source_matches_direct_source() {
        let ruleset = parse("rule foo { condition: filesize > 100KB }");
        let flat = to_flat(&ruleset);
        let rebuilt = from_flat(&flat);
        assert_eq!(yara_fmt::to_bytes(&ruleset), yara_fmt::to_bytes(&rebuilt));
    }
}
