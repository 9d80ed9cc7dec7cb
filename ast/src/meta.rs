//! `meta:` section entries.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetaValue {
    Integer(i64),
    Boolean(bool),
    /// A byte string; non-ASCII bytes are permitted (spec.md §3).
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub identifier: String,
    pub value: MetaValue,
}

impl Meta {
    pub const fn new(identifier: String, value: MetaValue) -> Self {
        Self { identifier, value }
    }
}
