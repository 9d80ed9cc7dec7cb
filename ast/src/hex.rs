//! The hex-string sub-grammar: masked bytes, jumps, and alternations.

use serde::{Deserialize, Serialize};

/// One nibble of a masked byte: a literal hex digit or a `?` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Nibble {
    Literal(u8),
    Wildcard,
}

impl Nibble {
    pub const fn is_wildcard(self) -> bool {
        matches!(self, Nibble::Wildcard)
    }
}

/// A masked byte, e.g. `AB`, `?A`, `A?`, `??`, optionally negated with `~`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexByte {
    pub high: Nibble,
    pub low: Nibble,
    pub negated: bool,
}

impl HexByte {
    pub const fn new(high: Nibble, low: Nibble, negated: bool) -> Self {
        Self { high, low, negated }
    }

    /// A negated byte is legal only when at least one nibble is literal
    /// (spec.md §3, "Negation prefix"). The parser checks this at the point
    /// of construction so that an invalid negation never reaches the AST.
    pub const fn is_valid(&self) -> bool {
        !self.negated || !(self.high.is_wildcard() && self.low.is_wildcard())
    }
}

/// A bounded gap between hex tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexJump {
    /// `[n]`
    Exact(u32),
    /// `[lo-hi]`
    Range(u32, u32),
    /// `[lo-]`
    AtLeast(u32),
    /// `[-]`
    Unbounded,
}

/// One element of a hex-string body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexToken {
    Byte(HexByte),
    Jump(HexJump),
    /// `( branch | branch | ... )`; every branch is a non-empty token run.
    Alternation(Vec<Vec<HexToken>>),
}
