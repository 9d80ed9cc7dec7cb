//! `yara-lang`: lexer, parser, AST, canonical serializer, and flat-form
//! bridge for the YARA rule language.
//!
//! This crate is a thin facade over its component crates, mirroring how the
//! teacher's frontend glues `leo-span`/`leo-errors`/`leo-ast`/`leo-parser`/
//! `leo-fmt` behind `leo-lang`.

pub use yara_ast::RuleSet;
pub use yara_errors::{Error, Result};
pub use yara_flat::{from_flat, to_flat, FlatRuleSet};
pub use yara_fmt::{write_source, Indent};
pub use yara_parser::parse;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serialize_and_flatten_compose() {
        let src = b"rule foo {\n  condition:\n    uint32(0) == 23117\n}\n";
        let ruleset = parse(src).unwrap();

        let mut out = Vec::new();
        write_source(&ruleset, &mut out, &Indent::default()).unwrap();
        assert_eq!(out, src);

        let flat = to_flat(&ruleset);
        assert_eq!(from_flat(&flat), ruleset);
    }

    #[test]
    fn error_messages_are_stable_strings() {
        let err = parse(b"rule foo { condition: for 3.14159 i in (1) : (i) }").unwrap_err();
        assert_eq!(err.to_string(), "line 1: invalid value in condition: 3.141590");
    }
}
