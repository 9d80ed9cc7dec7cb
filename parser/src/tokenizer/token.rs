//! The token alphabet of the YARA grammar.

use std::fmt;
use yara_span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Eof,

    Ident(String),
    Int(i64),
    Float(f64),
    /// Already escape-decoded bytes of a `"..."` literal.
    Str(Vec<u8>),
    /// `/body/flags` — `flags` is a subset of `"is"`.
    Regex(Vec<u8>, String),

    // --- keywords ---
    Rule,
    Private,
    Global,
    Import,
    Meta,
    Strings,
    Condition,
    True,
    False,
    Filesize,
    Entrypoint,
    And,
    Or,
    Not,
    Defined,
    All,
    Any,
    None_,
    Of,
    Them,
    For,
    In,
    At,
    Contains,
    IContains,
    IEquals,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Matches,

    // --- string modifier keywords ---
    Ascii,
    Wide,
    Nocase,
    Fullword,
    Xor,
    Base64,
    Base64Wide,

    // --- sigils ---
    Dollar,
    Hash,
    At_,
    Bang,

    // --- punctuation & operators ---
    LeftParen,
    RightParen,
    LeftCurly,
    RightCurly,
    LeftSquare,
    RightSquare,
    Colon,
    Comma,
    Dot,
    DotDot,
    Star,
    Plus,
    Minus,
    Backslash,
    Percent,
    Shl,
    Shr,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
}

/// Keywords that are reserved and therefore cannot be used as plain
/// identifiers. Used by the lexer's identifier-vs-keyword dispatch.
pub const KEYWORD_TOKENS: &[(&str, Token)] = &[
    ("rule", Token::Rule),
    ("private", Token::Private),
    ("global", Token::Global),
    ("import", Token::Import),
    ("meta", Token::Meta),
    ("strings", Token::Strings),
    ("condition", Token::Condition),
    ("true", Token::True),
    ("false", Token::False),
    ("filesize", Token::Filesize),
    ("entrypoint", Token::Entrypoint),
    ("and", Token::And),
    ("or", Token::Or),
    ("not", Token::Not),
    ("defined", Token::Defined),
    ("all", Token::All),
    ("any", Token::Any),
    ("none", Token::None_),
    ("of", Token::Of),
    ("them", Token::Them),
    ("for", Token::For),
    ("in", Token::In),
    ("at", Token::At),
    ("contains", Token::Contains),
    ("icontains", Token::IContains),
    ("iequals", Token::IEquals),
    ("startswith", Token::StartsWith),
    ("istartswith", Token::IStartsWith),
    ("endswith", Token::EndsWith),
    ("iendswith", Token::IEndsWith),
    ("matches", Token::Matches),
    ("ascii", Token::Ascii),
    ("wide", Token::Wide),
    ("nocase", Token::Nocase),
    ("fullword", Token::Fullword),
    ("xor", Token::Xor),
    ("base64", Token::Base64),
    ("base64wide", Token::Base64Wide),
];

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "<eof>"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Int(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Str(_) => write!(f, "<string literal>"),
            Token::Regex(_, _) => write!(f, "<regex literal>"),
            Token::Rule => write!(f, "rule"),
            Token::Private => write!(f, "private"),
            Token::Global => write!(f, "global"),
            Token::Import => write!(f, "import"),
            Token::Meta => write!(f, "meta"),
            Token::Strings => write!(f, "strings"),
            Token::Condition => write!(f, "condition"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Filesize => write!(f, "filesize"),
            Token::Entrypoint => write!(f, "entrypoint"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Defined => write!(f, "defined"),
            Token::All => write!(f, "all"),
            Token::Any => write!(f, "any"),
            Token::None_ => write!(f, "none"),
            Token::Of => write!(f, "of"),
            Token::Them => write!(f, "them"),
            Token::For => write!(f, "for"),
            Token::In => write!(f, "in"),
            Token::At => write!(f, "at"),
            Token::Contains => write!(f, "contains"),
            Token::IContains => write!(f, "icontains"),
            Token::IEquals => write!(f, "iequals"),
            Token::StartsWith => write!(f, "startswith"),
            Token::IStartsWith => write!(f, "istartswith"),
            Token::EndsWith => write!(f, "endswith"),
            Token::IEndsWith => write!(f, "iendswith"),
            Token::Matches => write!(f, "matches"),
            Token::Ascii => write!(f, "ascii"),
            Token::Wide => write!(f, "wide"),
            Token::Nocase => write!(f, "nocase"),
            Token::Fullword => write!(f, "fullword"),
            Token::Xor => write!(f, "xor"),
            Token::Base64 => write!(f, "base64"),
            Token::Base64Wide => write!(f, "base64wide"),
            Token::Dollar => write!(f, "$"),
            Token::Hash => write!(f, "#"),
            Token::At_ => write!(f, "@"),
            Token::Bang => write!(f, "!"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftCurly => write!(f, "{{"),
            Token::RightCurly => write!(f, "}}"),
            Token::LeftSquare => write!(f, "["),
            Token::RightSquare => write!(f, "]"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::DotDot => write!(f, ".."),
            Token::Star => write!(f, "*"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Backslash => write!(f, "\\"),
            Token::Percent => write!(f, "%"),
            Token::Shl => write!(f, "<<"),
            Token::Shr => write!(f, ">>"),
            Token::Amp => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Caret => write!(f, "^"),
            Token::Tilde => write!(f, "~"),
            Token::Eq => write!(f, "=="),
            Token::Neq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Assign => write!(f, "="),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}
