//! Recursive-descent parser with an inline semantic validator for the YARA
//! rule language.
//!
//! The grammar is split across [`tokenizer`] (byte-level lexing), [`parser`]
//! (the recursive-descent grammar itself), and [`validator`] (cross-cutting
//! invariants consulted as rules/strings/conditions are parsed, rather than
//! in a separate pass over the finished tree — spec.md §9).

pub mod parser;
pub mod tokenizer;
pub mod validator;

pub use yara_ast::RuleSet;
pub use yara_errors::{Error, Result};

/// Parse a complete YARA source buffer into a [`RuleSet`].
pub fn parse(input: &[u8]) -> Result<RuleSet> {
    parser::parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_rule() {
        let ruleset = parse(b"rule foo { condition: true }").unwrap();
        assert_eq!(ruleset.rules.len(), 1);
        assert_eq!(ruleset.rules[0].identifier, "foo");
    }

    #[test]
    fn parses_import_and_tags() {
        let src = br#"
            import "pe"
            rule foo : tag1 tag2 {
                meta:
                    author = "me"
                    trusted = true
                strings:
                    $a = "abc"
                    $b = { 41 42 ?? }
                condition:
                    $a and $b
            }
        "#;
        let ruleset = parse(src).unwrap();
        assert_eq!(ruleset.imports.len(), 1);
        assert_eq!(ruleset.imports[0].0, "pe");
        let rule = &ruleset.rules[0];
        assert_eq!(rule.tags, vec!["tag1", "tag2"]);
        assert_eq!(rule.meta.len(), 2);
        assert_eq!(rule.strings.len(), 2);
    }

    #[test]
    fn duplicate_rule_identifier_errors() {
        let src = b"rule foo { condition: true } rule foo { condition: true }";
        let err = parse(src).unwrap_err();
        assert!(err.to_string().contains("duplicate rule"));
    }

    #[test]
    fn for_in_quantifier_rejects_float() {
        let src = b"rule foo { condition: for 3.14159 i in (1,2,3) : (i > 0) }";
        let err = parse(src).unwrap_err();
        assert_eq!(err.to_string(), "line 1: invalid value in condition: 3.141590");
    }

    #[test]
    fn for_in_quantifier_rejects_negative_literal() {
        let src = b"rule foo { condition: for -1 i in (1,2,3) : (i > 0) }";
        let err = parse(src).unwrap_err();
        assert_eq!(err.to_string(), "line 1: invalid value in condition: -1");
    }

    #[test]
    fn anonymous_sigil_outside_for_of_is_rejected() {
        let src = b"rule foo { strings: $a = \"x\" condition: $ }";
        let err = parse(src).unwrap_err();
        assert!(err.to_string().contains("undefined string identifier"));
    }

    #[test]
    fn anonymous_sigil_inside_for_of_is_legal() {
        let src = b"rule foo { strings: $a = \"x\" condition: for any of ($a) : ($) }";
        assert!(parse(src).is_ok());
    }

    #[test]
    fn wildcard_rule_set_collision_is_rejected() {
        let src = br#"
            rule FOO_A { condition: true }
            rule BAR { condition: any of (FOO_*) }
            rule FOO_B { condition: true }
        "#;
        let err = parse(src).unwrap_err();
        assert!(err.to_string().contains("matches previously used wildcard rule set"));
    }
}
