//! The error surface shared by the lexer, parser, and validator.
//!
//! Every error reduces to the single stable string `"line N: <body>"`
//! (spec.md §7). The three [`Error`] variants exist only to keep the
//! lexical/syntactic/semantic origin of a failure visible in `Debug` output
//! and to callers matching on `Error` directly; `Display` does not
//! distinguish between them.

use yara_span::Span;

pub type Result<T> = std::result::Result<T, Error>;

/// A single parse failure, pinned to the line its offending token started on.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Encoding failures, invalid escapes, and other failures raised by the
    /// lexer before a token is even produced.
    #[error("line {line}: {message}", line = .0.line)]
    Lexical(Span, String),

    /// Grammar mismatches and literals used in a position where the grammar
    /// disallows them (e.g. a float as a for-expression quantifier).
    #[error("line {line}: {message}", line = .0.line)]
    Syntax(Span, String),

    /// Cross-cutting invariant violations raised by the validator:
    /// duplicate identifiers, undefined references, out-of-range bounds.
    #[error("line {line}: {message}", line = .0.line)]
    Semantic(Span, String),
}

impl Error {
    pub fn span(&self) -> Span {
        match self {
            Error::Lexical(s, _) | Error::Syntax(s, _) | Error::Semantic(s, _) => *s,
        }
    }

    pub fn line(&self) -> u32 {
        self.span().line
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Lexical(_, m) | Error::Syntax(_, m) | Error::Semantic(_, m) => m,
        }
    }
}

// --- Lexical --------------------------------------------------------------

impl Error {
    pub fn invalid_utf8_character(span: Span, byte: u8) -> Self {
        Error::Lexical(span, format!("invalid UTF-8 character \"\\x{byte:02x}\""))
    }

    pub fn invalid_ascii_character(span: Span, byte: u8) -> Self {
        Error::Lexical(span, format!("invalid ASCII character \"\\x{byte:02x}\""))
    }

    pub fn invalid_escape_sequence(span: Span, c: char) -> Self {
        Error::Lexical(span, format!("invalid escape sequence \"\\{c}\""))
    }

    pub fn unterminated_string(span: Span) -> Self {
        Error::Lexical(span, "unterminated string".to_string())
    }

    pub fn unterminated_regex(span: Span) -> Self {
        Error::Lexical(span, "unterminated regular expression".to_string())
    }

    pub fn uneven_hex_digits(span: Span) -> Self {
        Error::Lexical(span, "uneven number of digits in hex string".to_string())
    }

    pub fn invalid_hex_not(span: Span) -> Self {
        Error::Lexical(span, "invalid not operator (~) in hex string".to_string())
    }
}

// --- Syntax ----------------------------------------------------------------

impl Error {
    pub fn unexpected_token(span: Span, found: impl std::fmt::Display, expected: &str) -> Self {
        Error::Syntax(span, format!("unexpected token \"{found}\", expected {expected}"))
    }

    pub fn unexpected_eof(span: Span, expected: &str) -> Self {
        Error::Syntax(span, format!("unexpected end of file, expected {expected}"))
    }

    pub fn invalid_value_in_condition(span: Span, literal: impl std::fmt::Display) -> Self {
        Error::Syntax(span, format!("invalid value in condition: {literal}"))
    }
}

// --- Semantic ----------------------------------------------------------------

impl Error {
    pub fn duplicate_rule(span: Span, id: &str) -> Self {
        Error::Semantic(span, format!("duplicate rule \"{id}\""))
    }

    pub fn rule_matches_previous_wildcard(span: Span, id: &str) -> Self {
        Error::Semantic(
            span,
            format!("rule identifier \"{id}\" matches previously used wildcard rule set"),
        )
    }

    pub fn duplicate_string_identifier(span: Span, rule: &str, id: &str) -> Self {
        Error::Semantic(
            span,
            format!("rule \"{rule}\": duplicate string identifier \"{id}\""),
        )
    }

    pub fn duplicate_modifier(span: Span) -> Self {
        Error::Semantic(span, "duplicate modifier".to_string())
    }

    pub fn undefined_string_identifier(span: Span, form: impl std::fmt::Display) -> Self {
        Error::Semantic(span, format!("undefined string identifier: {form}"))
    }

    pub fn undefined_rule_identifier(span: Span, form: impl std::fmt::Display) -> Self {
        Error::Semantic(span, format!("undefined rule identifier: {form}"))
    }

    pub fn base64_alphabet_length(span: Span) -> Self {
        Error::Semantic(span, "length of base64 alphabet must be 64".to_string())
    }

    pub fn negative_lower_bound(span: Span) -> Self {
        Error::Semantic(span, "lower bound can not be negative".to_string())
    }

    pub fn negative_upper_bound(span: Span) -> Self {
        Error::Semantic(span, "upper bound can not be negative".to_string())
    }

    pub fn invalid_range(span: Span) -> Self {
        Error::Semantic(span, "lower bound must be less than upper bound".to_string())
    }

    pub fn anonymous_sigil_out_of_scope(span: Span, form: impl std::fmt::Display) -> Self {
        Error::Semantic(span, format!("undefined string identifier: {form}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_pinned_format() {
        let err = Error::duplicate_rule(Span::new(3), "DUPLICATE_RULE_IDENTIFIER");
        assert_eq!(err.to_string(), "line 3: duplicate rule \"DUPLICATE_RULE_IDENTIFIER\"");
    }

    #[test]
    fn hex_escape_is_lowercase() {
        let err = Error::invalid_utf8_character(Span::new(4), 0xE8);
        assert_eq!(err.to_string(), "line 4: invalid UTF-8 character \"\\xe8\"");
    }
}
