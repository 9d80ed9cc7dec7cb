use serde::{Deserialize, Serialize};

/// The identifier named by a string-reference sigil (`$id`, `#id`, ...), or
/// `None` for the anonymous forms (`$`, `#`, `@`, `!`).
///
/// Anonymous sigils are legal only inside a `for ... of` body (spec.md §3,
/// "Identifier scoping"); the validator enforces that, not this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringRef(pub Option<String>);

impl StringRef {
    pub const fn anonymous() -> Self {
        Self(None)
    }

    pub const fn named(id: String) -> Self {
        Self(Some(id))
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_none()
    }
}
