use crate::rule::Rule;
use serde::{Deserialize, Serialize};

/// `import "pe"` — a bare, ASCII module name (spec.md SPEC_FULL §4, imports).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import(pub String);

/// A fully parsed YARA source file: an ordered sequence of imports followed
/// by an ordered sequence of rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub imports: Vec<Import>,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(imports: Vec<Import>, rules: Vec<Rule>) -> Self {
        Self { imports, rules }
    }

    /// Look up a rule by identifier; rule identifiers are unique within a
    /// successfully parsed rule set (spec.md §3).
    pub fn rule(&self, identifier: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.identifier == identifier)
    }
}
