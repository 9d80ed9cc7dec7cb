//! Canonical re-emission of a [`RuleSet`] as YARA source text (spec.md
//! §4.5): fixed section ordering, precedence-aware parenthesization that
//! always restores explicit source parens and never adds others, and a
//! configurable indent unit.

use std::io;

use yara_ast::{
    Base64Modifier, Expr, Iterable, Meta, MetaValue, Quantifier, Rule, RuleSet, RuleSetMember,
    StringBody, StringDecl, StringModifiers, StringRef, StringSet, StringSetMember, XorRange,
};
use yara_ast::{HexByte, HexJump, HexToken, Nibble};

/// The unit repeated per indentation level. Defaults to two spaces
/// (spec.md §4.5).
#[derive(Debug, Clone)]
pub struct Indent {
    unit: String,
}

impl Default for Indent {
    fn default() -> Self {
        Self { unit: "  ".to_string() }
    }
}

impl Indent {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }

    fn at(&self, level: usize) -> String {
        self.unit.repeat(level)
    }
}

/// Serialize `ruleset` as canonical YARA source and write it to `w`.
pub fn write_source<W: io::Write>(ruleset: &RuleSet, w: &mut W, indent: &Indent) -> io::Result<()> {
    let span = tracing::span!(tracing::Level::DEBUG, "write_source", rules = ruleset.rules.len());
    let _enter = span.enter();

    let buf = render_ruleset(ruleset, indent);
    tracing::debug!(bytes = buf.len(), "serialized rule set");
    w.write_all(&buf)
}

/// [`write_source`] with the default two-space indent, returning the
/// rendered bytes directly.
pub fn to_bytes(ruleset: &RuleSet) -> Vec<u8> {
    render_ruleset(ruleset, &Indent::default())
}

fn render_ruleset(ruleset: &RuleSet, indent: &Indent) -> Vec<u8> {
    let mut out = Vec::new();
    for import in &ruleset.imports {
        out.extend_from_slice(format!("import \"{}\"\n", import.0).as_bytes());
    }
    if !ruleset.imports.is_empty() && !ruleset.rules.is_empty() {
        out.push(b'\n');
    }
    for (i, rule) in ruleset.rules.iter().enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        render_rule(rule, indent, &mut out);
    }
    out
}

fn render_rule(rule: &Rule, indent: &Indent, out: &mut Vec<u8>) {
    let mut header = String::new();
    if rule.modifiers.global {
        header.push_str("global ");
    }
    if rule.modifiers.private {
        header.push_str("private ");
    }
    header.push_str("rule ");
    header.push_str(&rule.identifier);
    if !rule.tags.is_empty() {
        header.push_str(" : ");
        header.push_str(&rule.tags.join(" "));
    }
    header.push_str(" {\n");
    out.extend_from_slice(header.as_bytes());

    if !rule.meta.is_empty() {
        out.extend_from_slice(format!("{}meta:\n", indent.at(1)).as_bytes());
        for m in &rule.meta {
            render_meta_entry(m, indent, out);
        }
    }
    if !rule.strings.is_empty() {
        out.extend_from_slice(format!("{}strings:\n", indent.at(1)).as_bytes());
        for s in &rule.strings {
            render_string_decl(s, indent, out);
        }
    }
    out.extend_from_slice(format!("{}condition:\n", indent.at(1)).as_bytes());
    out.extend_from_slice(
        format!("{}{}\n", indent.at(2), render_expr(&rule.condition, 0)).as_bytes(),
    );
    out.extend_from_slice(b"}\n");
}

fn render_meta_entry(meta: &Meta, indent: &Indent, out: &mut Vec<u8>) {
    out.extend_from_slice(format!("{}{} = ", indent.at(2), meta.identifier).as_bytes());
    match &meta.value {
        MetaValue::Integer(n) => out.extend_from_slice(format!("{n}\n").as_bytes()),
        MetaValue::Boolean(b) => out.extend_from_slice(format!("{b}\n").as_bytes()),
        MetaValue::Bytes(bytes) => {
            out.extend_from_slice(&escape_bytes(bytes));
            out.push(b'\n');
        }
    }
}

/// Escape a byte string the way spec.md §4.5 pins for meta values (and, by
/// the same rule, string literals and text-string declarations): standard
/// backslash escapes, `\xNN` for control bytes, everything else verbatim —
/// including non-ASCII high bytes, which are never escaped.
fn escape_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'"');
    for &b in bytes {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'"' => out.extend_from_slice(b"\\\""),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            0x00..=0x1F | 0x7F => out.extend_from_slice(format!("\\x{b:02x}").as_bytes()),
            _ => out.push(b),
        }
    }
    out.push(b'"');
    out
}

fn render_string_decl(decl: &StringDecl, indent: &Indent, out: &mut Vec<u8>) {
    out.extend_from_slice(format!("{}${} = ", indent.at(2), decl.identifier).as_bytes());
    match &decl.body {
        StringBody::Text(bytes) => out.extend_from_slice(&escape_bytes(bytes)),
        StringBody::Regex { bytes, case_insensitive, dot_all } => {
            out.push(b'/');
            out.extend_from_slice(bytes);
            out.push(b'/');
            if *case_insensitive {
                out.push(b'i');
            }
            if *dot_all {
                out.push(b's');
            }
        }
        StringBody::Hex(tokens) => out.extend_from_slice(render_hex_body(tokens).as_bytes()),
    }
    let mods = render_string_modifiers(&decl.modifiers);
    if !mods.is_empty() {
        out.push(b' ');
        out.extend_from_slice(mods.as_bytes());
    }
    out.push(b'\n');
}

fn render_string_modifiers(modifiers: &StringModifiers) -> String {
    let mut parts = Vec::new();
    if modifiers.ascii {
        parts.push("ascii".to_string());
    }
    if modifiers.wide {
        parts.push("wide".to_string());
    }
    if modifiers.nocase {
        parts.push("nocase".to_string());
    }
    if modifiers.fullword {
        parts.push("fullword".to_string());
    }
    if modifiers.private {
        parts.push("private".to_string());
    }
    if let Some(xor) = &modifiers.xor {
        parts.push(render_xor_range(*xor));
    }
    if let Some(b64) = &modifiers.base64 {
        parts.push(render_base64_modifier("base64", b64));
    }
    if let Some(b64) = &modifiers.base64wide {
        parts.push(render_base64_modifier("base64wide", b64));
    }
    parts.join(" ")
}

fn render_xor_range(xor: XorRange) -> String {
    match xor {
        XorRange::Bare => "xor".to_string(),
        XorRange::Single(n) => format!("xor({n})"),
        XorRange::Range(lo, hi) => format!("xor({lo}-{hi})"),
    }
}

fn render_base64_modifier(keyword: &str, modifier: &Base64Modifier) -> String {
    match &modifier.alphabet {
        None => keyword.to_string(),
        Some(alphabet) => format!("{keyword}(\"{alphabet}\")"),
    }
}

// --- hex bodies -------------------------------------------------------------

fn render_hex_body(tokens: &[HexToken]) -> String {
    format!("{{ {} }}", render_hex_tokens(tokens))
}

fn render_hex_tokens(tokens: &[HexToken]) -> String {
    tokens.iter().map(render_hex_token).collect::<Vec<_>>().join(" ")
}

fn render_hex_token(token: &HexToken) -> String {
    match token {
        HexToken::Byte(b) => render_hex_byte(b),
        HexToken::Jump(j) => render_hex_jump(*j),
        HexToken::Alternation(branches) => {
            let rendered: Vec<String> = branches.iter().map(|b| render_hex_tokens(b)).collect();
            format!("({})", rendered.join("|"))
        }
    }
}

fn render_hex_byte(byte: &HexByte) -> String {
    let mut s = String::new();
    if byte.negated {
        s.push('~');
    }
    s.push_str(&render_nibble(byte.high));
    s.push_str(&render_nibble(byte.low));
    s
}

fn render_nibble(nibble: Nibble) -> String {
    match nibble {
        Nibble::Wildcard => "?".to_string(),
        Nibble::Literal(n) => format!("{:X}", n),
    }
}

fn render_hex_jump(jump: HexJump) -> String {
    match jump {
        HexJump::Exact(n) => format!("[{n}]"),
        HexJump::Range(lo, hi) => format!("[{lo}-{hi}]"),
        HexJump::AtLeast(lo) => format!("[{lo}-]"),
        HexJump::Unbounded => "[-]".to_string(),
    }
}

// --- condition expressions --------------------------------------------------

/// Atomic constructs (literals, identifiers, calls, sets, `for`, parens
/// themselves) never need defensive parenthesization; only binary operators
/// and the word-unary forms have a meaningful precedence class.
fn expr_precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.precedence().0,
        Expr::Neg(_) | Expr::BitNot(_) | Expr::Not(_) | Expr::Defined(_) => 10,
        _ => 11,
    }
}

fn strip_one_paren(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(inner) => inner,
        other => other,
    }
}

/// Render `expr` as it would appear in a context requiring at least
/// `min_prec`. Explicit source parens (`Expr::Paren`) are always restored;
/// otherwise parens are added only when `expr`'s own precedence is too low
/// for its context — which never fires for a tree the parser itself
/// produced (any such case would have required source parens, captured as
/// `Expr::Paren` already), but keeps programmatically built trees
/// (e.g. via the flat-form bridge) safe to re-serialize.
fn render_expr(expr: &Expr, min_prec: u8) -> String {
    if matches!(expr, Expr::Paren(_)) {
        return format!("({})", render_expr(strip_one_paren(expr), 0));
    }
    if expr_precedence(expr) < min_prec {
        return format!("({})", render_expr_bare(expr));
    }
    render_expr_bare(expr)
}

fn render_string_ref(id: &StringRef, sigil: char) -> String {
    match &id.0 {
        Some(name) => format!("{sigil}{name}"),
        None => sigil.to_string(),
    }
}

fn render_range(lo: &Expr, hi: &Expr) -> String {
    format!("({}..{})", render_expr(lo, 0), render_expr(hi, 0))
}

fn render_optional_index(index: &Option<Box<Expr>>) -> String {
    match index {
        Some(e) => format!("[{}]", render_expr(e, 0)),
        None => String::new(),
    }
}

fn render_string_set(set: &StringSet) -> String {
    match set {
        StringSet::Them => "them".to_string(),
        StringSet::Enumerated(members) => {
            let rendered: Vec<String> = members
                .iter()
                .map(|m| match m {
                    StringSetMember::Named(name) => format!("${name}"),
                    StringSetMember::Wildcard(prefix) => format!("${prefix}*"),
                    StringSetMember::Anonymous => "$".to_string(),
                })
                .collect();
            format!("({})", rendered.join(", "))
        }
    }
}

fn render_rule_set(members: &[RuleSetMember]) -> String {
    let rendered: Vec<String> = members
        .iter()
        .map(|m| match m {
            RuleSetMember::Named(name) => name.clone(),
            RuleSetMember::Wildcard(prefix) => format!("{prefix}*"),
        })
        .collect();
    format!("({})", rendered.join(", "))
}

fn render_quantifier(quantifier: &Quantifier) -> String {
    match quantifier {
        Quantifier::All => "all".to_string(),
        Quantifier::Any => "any".to_string(),
        Quantifier::None => "none".to_string(),
        Quantifier::Expr(e) => render_expr(e, 0),
        Quantifier::Percent(e) => format!("{}%", render_expr(e, 0)),
    }
}

fn render_iterable(iterable: &Iterable) -> String {
    match iterable {
        Iterable::IntegerSet(items) => {
            let rendered: Vec<String> = items.iter().map(|e| render_expr(e, 0)).collect();
            format!("({})", rendered.join(", "))
        }
        Iterable::Range(range_expr) => match strip_one_paren(range_expr) {
            Expr::Range { lo, hi } => render_range(lo, hi),
            other => format!("({})", render_expr(other, 0)),
        },
        Iterable::TextStringSet(items) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|bytes| String::from_utf8_lossy(&escape_bytes(bytes)).into_owned())
                .collect();
            format!("({})", rendered.join(", "))
        }
        Iterable::Expr(e) => render_expr(e, 0),
    }
}

fn render_expr_bare(expr: &Expr) -> String {
    match expr {
        Expr::Paren(_) => unreachable!("handled by render_expr"),
        Expr::Integer(n) => n.to_string(),
        Expr::Float(f) => f.to_string(),
        Expr::StringLit(bytes) => String::from_utf8_lossy(&escape_bytes(bytes)).into_owned(),
        Expr::Regex { bytes, case_insensitive, dot_all } => {
            let mut s = format!("/{}/", String::from_utf8_lossy(bytes));
            if *case_insensitive {
                s.push('i');
            }
            if *dot_all {
                s.push('s');
            }
            s
        }
        Expr::Bool(b) => b.to_string(),
        Expr::Filesize => "filesize".to_string(),
        Expr::Entrypoint => "entrypoint".to_string(),
        Expr::Identifier(name) => name.clone(),
        Expr::Member(base, field) => format!("{}.{field}", render_expr(base, 11)),
        Expr::Subscript(base, index) => {
            format!("{}[{}]", render_expr(base, 11), render_expr(index, 0))
        }
        Expr::Call { callee, args, .. } => {
            let rendered: Vec<String> = args.iter().map(|a| render_expr(a, 0)).collect();
            format!("{}({})", render_expr(callee, 11), rendered.join(", "))
        }
        Expr::StringMatch(id) => render_string_ref(id, '$'),
        Expr::StringCount(id) => render_string_ref(id, '#'),
        Expr::StringOffset { id, index } => {
            format!("{}{}", render_string_ref(id, '@'), render_optional_index(index))
        }
        Expr::StringLength { id, index } => {
            format!("{}{}", render_string_ref(id, '!'), render_optional_index(index))
        }
        Expr::StringAt { id, at } => {
            format!("{} at {}", render_string_ref(id, '$'), render_expr(at, 0))
        }
        Expr::StringIn { id, range } => match strip_one_paren(range) {
            Expr::Range { lo, hi } => format!("{} in {}", render_string_ref(id, '$'), render_range(lo, hi)),
            other => format!("{} in ({})", render_string_ref(id, '$'), render_expr(other, 0)),
        },
        Expr::StringCountInRange { id, range } => match strip_one_paren(range) {
            Expr::Range { lo, hi } => format!("{} in {}", render_string_ref(id, '#'), render_range(lo, hi)),
            other => format!("{} in ({})", render_string_ref(id, '#'), render_expr(other, 0)),
        },
        Expr::Neg(inner) => format!("-{}", render_expr(inner, 10)),
        Expr::BitNot(inner) => format!("~{}", render_expr(inner, 10)),
        Expr::Not(inner) => format!("not {}", render_expr(inner, 10)),
        Expr::Defined(inner) => format!("defined {}", render_expr(inner, 10)),
        Expr::Binary { op, lhs, rhs } => {
            let prec = op.precedence().0;
            format!("{} {op} {}", render_expr(lhs, prec), render_expr(rhs, prec + 1))
        }
        Expr::Range { lo, hi } => render_range(lo, hi),
        Expr::SetOf { quantifier, set, in_range, at } => {
            let mut s = format!("{} of {}", render_quantifier(quantifier), render_string_set(set));
            if let Some(range) = in_range {
                match strip_one_paren(range) {
                    Expr::Range { lo, hi } => s.push_str(&format!(" in {}", render_range(lo, hi))),
                    other => s.push_str(&format!(" in ({})", render_expr(other, 0))),
                }
            }
            if let Some(at) = at {
                s.push_str(&format!(" at {}", render_expr(at, 0)));
            }
            s
        }
        Expr::RuleSetOf { quantifier, set } => {
            format!("{} of {}", render_quantifier(quantifier), render_rule_set(set))
        }
        Expr::ForIn { quantifier, vars, iterable, body } => format!(
            "for {} {} in {} : ({})",
            render_quantifier(quantifier),
            vars.join(", "),
            render_iterable(iterable),
            render_expr(body, 0),
        ),
        Expr::ForOf { quantifier, set, body } => format!(
            "for {} of {} : ({})",
            render_quantifier(quantifier),
            render_string_set(set),
            render_expr(body, 0),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(src: &str) -> String {
        let ruleset = yara_parser::parse(src.as_bytes()).expect("parses");
        String::from_utf8(to_bytes(&ruleset)).unwrap()
    }

    #[test]
    fn minimal_rule_round_trips() {
        let src = "rule foo {\n  condition:\n    true\n}\n";
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn preserves_explicit_parens_and_omits_implicit_ones() {
        let src = "rule foo {\n  condition:\n    (1 + 2) * 3\n}\n";
        assert_eq!(roundtrip(src), src);

        let src_no_parens = "rule foo {\n  condition:\n    1 + 2 * 3\n}\n";
        assert_eq!(roundtrip(src_no_parens), src_no_parens);
    }

    #[test]
    fn hex_string_round_trips() {
        let src = "rule foo {\n  strings:\n    $a = { A1 ?? [2-4] (A1|B2) }\n  condition:\n    $a\n}\n";
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn meta_and_string_modifiers_round_trip() {
        let src = "rule foo {\n  meta:\n    author = \"me\"\n    count = 3\n    trusted = true\n  strings:\n    $a = \"abc\" ascii wide nocase\n  condition:\n    $a\n}\n";
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn percent_of_quantifier_round_trips() {
        let src = "rule foo {\n  strings:\n    $a = \"a\"\n    $b = \"b\"\n  condition:\n    50% of ($a, $b)\n}\n";
        assert_eq!(roundtrip(src), src);
    }
}
