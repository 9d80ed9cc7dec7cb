//! Cross-cutting invariants enforced at the point of parsing rather than in
//! a separate pass (spec.md §9): rule/string identifier uniqueness,
//! reference resolution, and sigil-scope legality.

use std::collections::{HashMap, HashSet};

use yara_errors::{Error, Result};
use yara_span::Span;

/// Tracks declared rule identifiers and the rule-set wildcard prefixes
/// referenced so far, for the whole file.
#[derive(Debug, Default)]
pub struct RuleTable {
    declared: HashSet<String>,
    wildcards_seen: Vec<String>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new rule identifier, or error if it collides with an
    /// earlier rule or with a wildcard rule-set pattern already referenced
    /// in an earlier rule's condition.
    pub fn declare(&mut self, span: Span, name: &str) -> Result<()> {
        if self.declared.contains(name) {
            return Err(Error::duplicate_rule(span, name));
        }
        if self.wildcards_seen.iter().any(|w| name.starts_with(w.as_str())) {
            return Err(Error::rule_matches_previous_wildcard(span, name));
        }
        self.declared.insert(name.to_string());
        Ok(())
    }

    /// Resolve a plain rule-identifier reference (as a boolean condition
    /// operand, or a named member of a rule set). Only backward references
    /// are legal.
    pub fn reference_named(&self, span: Span, name: &str) -> Result<()> {
        if !self.declared.contains(name) {
            return Err(Error::undefined_rule_identifier(span, name));
        }
        Ok(())
    }

    /// Record a wildcard rule-set reference (`RULE_*`); any rule declared
    /// later whose identifier matches this prefix is a `declare` error. Also
    /// requires at least one already-declared rule to match the prefix now.
    pub fn reference_wildcard(&mut self, span: Span, prefix: &str) -> Result<()> {
        if !self.declared.iter().any(|r| r.starts_with(prefix)) {
            return Err(Error::undefined_rule_identifier(span, format_args!("{prefix}*")));
        }
        self.wildcards_seen.push(prefix.to_string());
        Ok(())
    }
}

/// Tracks declared string identifiers for a single rule.
#[derive(Debug, Default)]
pub struct StringTable {
    rule_name: String,
    declared: HashMap<String, Span>,
}

impl StringTable {
    pub fn new(rule_name: String) -> Self {
        Self { rule_name, declared: HashMap::new() }
    }

    /// Register a string declaration. Anonymous (`$`) declarations never
    /// collide with each other or with named ones.
    pub fn declare(&mut self, span: Span, identifier: &str) -> Result<()> {
        if identifier.is_empty() {
            return Ok(());
        }
        if self.declared.contains_key(identifier) {
            return Err(Error::duplicate_string_identifier(span, &self.rule_name, identifier));
        }
        self.declared.insert(identifier.to_string(), span);
        Ok(())
    }

    pub fn reference_named(&self, span: Span, identifier: &str, form: &str) -> Result<()> {
        if !self.declared.contains_key(identifier) {
            return Err(Error::undefined_string_identifier(span, format_args!("{form}{identifier}")));
        }
        Ok(())
    }

    pub fn reference_wildcard(&self, span: Span, prefix: &str) -> Result<()> {
        if !self.declared.keys().any(|k| k.starts_with(prefix)) {
            return Err(Error::undefined_string_identifier(span, format_args!("${prefix}*")));
        }
        Ok(())
    }

    /// `them` refers to every string declared in the rule; a rule with no
    /// `strings:` section has nothing for it to refer to.
    pub fn reference_them(&self, span: Span) -> Result<()> {
        if self.declared.is_empty() {
            return Err(Error::undefined_string_identifier(span, "them"));
        }
        Ok(())
    }
}

/// Whether the parser is currently inside the body of a `for ... of`
/// expression, where anonymous sigils (`$`, `#`, `@`, `!`) are legal
/// (spec.md §3, "Identifier scoping").
#[derive(Debug, Default)]
pub struct AnonymousScope(u32);

impl AnonymousScope {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn enter(&mut self) {
        self.0 += 1;
    }

    pub fn exit(&mut self) {
        self.0 -= 1;
    }

    pub fn is_legal(&self) -> bool {
        self.0 > 0
    }

    pub fn check(&self, span: Span, form: &str) -> Result<()> {
        if self.is_legal() {
            Ok(())
        } else {
            Err(Error::anonymous_sigil_out_of_scope(span, form))
        }
    }
}

/// Validator state for one `parse` call: one [`RuleTable`] for the whole
/// file, one [`StringTable`] per rule currently being parsed, and the
/// anonymous-sigil scope depth.
#[derive(Debug, Default)]
pub struct Validator {
    pub rules: RuleTable,
    pub strings: Option<StringTable>,
    pub anon_scope: AnonymousScope,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_rule(&mut self, rule_name: &str) {
        self.strings = Some(StringTable::new(rule_name.to_string()));
    }

    pub fn end_rule(&mut self) {
        self.strings = None;
    }

    pub fn strings_mut(&mut self) -> &mut StringTable {
        self.strings.as_mut().expect("called within a rule body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_rule_is_rejected() {
        let mut t = RuleTable::new();
        t.declare(Span::new(1), "A").unwrap();
        assert!(t.declare(Span::new(2), "A").is_err());
    }

    #[test]
    fn wildcard_reference_with_no_matching_rule_is_rejected() {
        let mut t = RuleTable::new();
        assert!(t.reference_wildcard(Span::new(1), "FOO_").is_err());
    }

    #[test]
    fn rule_matching_earlier_wildcard_is_rejected() {
        let mut t = RuleTable::new();
        t.declare(Span::new(1), "FOO_EXISTING").unwrap();
        t.reference_wildcard(Span::new(1), "FOO_").unwrap();
        assert!(t.declare(Span::new(2), "FOO_BAR").is_err());
        assert!(t.declare(Span::new(2), "BAR_FOO").is_ok());
    }

    #[test]
    fn duplicate_string_identifier_is_rejected() {
        let mut t = StringTable::new("R".to_string());
        t.declare(Span::new(1), "a").unwrap();
        assert!(t.declare(Span::new(2), "a").is_err());
        t.declare(Span::new(2), "").unwrap();
        t.declare(Span::new(3), "").unwrap();
    }

    #[test]
    fn anonymous_sigil_requires_scope() {
        let mut scope = AnonymousScope::new();
        assert!(scope.check(Span::new(1), "$").is_err());
        scope.enter();
        assert!(scope.check(Span::new(1), "$").is_ok());
        scope.exit();
        assert!(scope.check(Span::new(1), "$").is_err());
    }
}
