use super::Expr;
use serde::{Deserialize, Serialize};

/// `all`, `any`, `none`, an integer expression, or `N% of ...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Quantifier {
    All,
    Any,
    None,
    Expr(Box<Expr>),
    /// The boxed expression is the percent operand, e.g. `50` in `50%` or
    /// `x` in `x%` (spec.md §3, "Quantifier is ... percent-of-integer
    /// (including percent of an identifier expression)").
    Percent(Box<Expr>),
}

/// One entry of an enumerated string set: `$foo1`, the wildcard `$foo4*`, or
/// the bare anonymous `$` (legal only inside a `for…of` body, like every
/// other anonymous sigil — spec.md §3, "Identifier scoping").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringSetMember {
    Named(String),
    /// The prefix before the trailing `*`.
    Wildcard(String),
    Anonymous,
}

/// The string-set operand of a set-of or for-of expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StringSet {
    /// The `them` keyword: every string declared in the enclosing rule.
    Them,
    Enumerated(Vec<StringSetMember>),
}

/// One entry of a rule-set: a rule identifier or a wildcard prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleSetMember {
    Named(String),
    Wildcard(String),
}

/// The iterable operand of a `for ... in` expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Iterable {
    /// `(5, 10, 15)`.
    IntegerSet(Vec<Expr>),
    /// `(0..10)`; the boxed expression is always an [`Expr::Range`].
    Range(Box<Expr>),
    /// `("a", "b")`.
    TextStringSet(Vec<Vec<u8>>),
    /// A generic identifier expression, e.g. a module-provided dictionary.
    Expr(Box<Expr>),
}
