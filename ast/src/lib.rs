//! The YARA abstract syntax tree.
//!
//! Nodes are plain, immutable data once built by `yara-parser`: a single
//! tagged variant per family (spec.md §9) rather than a trait-object
//! hierarchy. This crate has no notion of "parsing" or "validity" beyond the
//! shapes it can represent — invariants like identifier uniqueness are the
//! validator's job, not this crate's (spec.md §4.4).

pub mod expressions;
pub mod hex;
pub mod meta;
pub mod rule;
pub mod ruleset;
pub mod string_decl;

pub use expressions::{BinaryOp, Expr, Iterable, Quantifier, RuleSetMember, StringRef, StringSet, StringSetMember};
pub use hex::{HexByte, HexJump, HexToken, Nibble};
pub use meta::{Meta, MetaValue};
pub use rule::{Rule, RuleModifiers};
pub use ruleset::{Import, RuleSet};
pub use string_decl::{Base64Modifier, StringBody, StringDecl, StringModifiers, XorRange};
