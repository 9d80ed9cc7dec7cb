//! `strings:` section entries.

use crate::hex::HexToken;
use serde::{Deserialize, Serialize};

/// The bound carried by an `xor` modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XorRange {
    /// Bare `xor`, equivalent to the full byte range.
    Bare,
    /// `xor(n)`.
    Single(u32),
    /// `xor(lo-hi)`.
    Range(u32, u32),
}

/// `base64` / `base64wide`, with an optional custom 64-character alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base64Modifier {
    pub alphabet: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringModifiers {
    pub ascii: bool,
    pub wide: bool,
    pub nocase: bool,
    pub fullword: bool,
    pub private: bool,
    pub xor: Option<XorRange>,
    pub base64: Option<Base64Modifier>,
    pub base64wide: Option<Base64Modifier>,
}

impl StringModifiers {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StringBody {
    /// UTF-8 bytes after escape decoding.
    Text(Vec<u8>),
    Regex {
        bytes: Vec<u8>,
        case_insensitive: bool,
        dot_all: bool,
    },
    Hex(Vec<HexToken>),
}

/// One `strings:` entry. `identifier` is empty for an anonymous `$` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringDecl {
    pub identifier: String,
    pub modifiers: StringModifiers,
    pub body: StringBody,
}

impl StringDecl {
    pub const fn is_anonymous(&self) -> bool {
        self.identifier.is_empty()
    }
}
