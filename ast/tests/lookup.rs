use yara_ast::{Expr, Rule, RuleModifiers, RuleSet, StringBody, StringDecl, StringModifiers};
use yara_span::Span;

fn rule(identifier: &str) -> Rule {
    Rule {
        identifier: identifier.to_string(),
        modifiers: RuleModifiers::default(),
        tags: vec![],
        meta: vec![],
        strings: vec![StringDecl {
            identifier: "a".to_string(),
            modifiers: StringModifiers::default(),
            body: StringBody::Text(b"x".to_vec()),
        }],
        condition: Expr::Bool(true),
        span: Span::new(1),
    }
}

#[test]
fn ruleset_looks_up_rule_by_identifier() {
    let rs = RuleSet::new(vec![], vec![rule("A"), rule("B")]);
    assert!(rs.rule("A").is_some());
    assert!(rs.rule("B").is_some());
    assert!(rs.rule("C").is_none());
}

#[test]
fn rule_looks_up_string_by_identifier() {
    let r = rule("A");
    assert!(r.string("a").is_some());
    assert!(r.string("nope").is_none());
}
