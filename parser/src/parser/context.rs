//! Token-stream cursor with bounded lookahead.
//!
//! Grounded on the teacher's `ParserContext` (buffered-lookahead cursor over
//! a token source), adapted to pull tokens lazily from [`Lexer`] instead of
//! indexing a pre-built `Vec<SpannedToken>` — the hex sub-lexer needs to
//! intercept the byte stream mid-declaration, which an eagerly tokenized
//! vector would not allow.

use std::collections::VecDeque;

use yara_ast::MetaValue;
use yara_errors::{Error, Result};
use yara_span::Span;

use crate::tokenizer::{Lexer, SpannedToken, Token};

pub struct ParserContext<'a> {
    pub(crate) lexer: Lexer<'a>,
    lookahead: VecDeque<SpannedToken>,
}

impl<'a> ParserContext<'a> {
    pub fn new(input: &'a [u8]) -> Result<Self> {
        let mut ctx = Self { lexer: Lexer::new(input), lookahead: VecDeque::new() };
        ctx.fill(1)?;
        Ok(ctx)
    }

    fn fill(&mut self, n: usize) -> Result<()> {
        while self.lookahead.len() < n {
            let tok = self.lexer.next_token()?;
            let at_eof = tok.token == Token::Eof;
            self.lookahead.push_back(tok);
            if at_eof {
                break;
            }
        }
        Ok(())
    }

    /// The current token without consuming it.
    pub fn peek(&mut self) -> &Token {
        self.fill(1).ok();
        &self.lookahead[0].token
    }

    pub fn span(&mut self) -> Span {
        self.fill(1).ok();
        self.lookahead[0].span
    }

    /// The token `dist` positions ahead of the current one (`0` == current).
    pub fn look_ahead(&mut self, dist: usize) -> &Token {
        self.fill(dist + 1).ok();
        let idx = dist.min(self.lookahead.len() - 1);
        &self.lookahead[idx].token
    }

    /// Consume and return the current token.
    pub fn bump(&mut self) -> Result<SpannedToken> {
        self.fill(1)?;
        let tok = self.lookahead.pop_front().expect("filled above");
        if tok.token == Token::Eof {
            self.lookahead.push_front(tok.clone());
        }
        Ok(tok)
    }

    /// `true` and does NOT consume if the current token equals `token`.
    pub fn check(&mut self, token: &Token) -> bool {
        self.peek() == token
    }

    /// Consume the current token if it equals `token`, returning whether it
    /// matched.
    pub fn eat(&mut self, token: &Token) -> Result<bool> {
        if self.check(token) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume the current token, requiring it to equal `token`.
    pub fn expect(&mut self, token: &Token, expected: &str) -> Result<Span> {
        let span = self.span();
        if self.check(token) {
            self.bump()?;
            Ok(span)
        } else {
            Err(Error::unexpected_token(span, self.peek().clone(), expected))
        }
    }

    /// Consume and return the current token's identifier text.
    pub fn expect_ident(&mut self) -> Result<(String, Span)> {
        let span = self.span();
        match self.peek().clone() {
            Token::Ident(name) => {
                self.bump()?;
                Ok((name, span))
            }
            other => Err(Error::unexpected_token(span, other, "an identifier")),
        }
    }

    pub fn is_eof(&mut self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    /// Consume and return an identifier, or `None` (without consuming) if
    /// the current token isn't one.
    pub fn eat_ident(&mut self) -> Result<Option<String>> {
        if let Token::Ident(name) = self.peek().clone() {
            self.bump()?;
            Ok(Some(name))
        } else {
            Ok(None)
        }
    }

    /// Consume and return the current token, requiring it to be an integer
    /// literal.
    pub fn expect_int(&mut self) -> Result<(i64, Span)> {
        let span = self.span();
        match self.peek().clone() {
            Token::Int(n) => {
                self.bump()?;
                Ok((n, span))
            }
            other => Err(Error::unexpected_token(span, other, "an integer")),
        }
    }

    /// Hand off straight to the byte-level hex sub-lexer. Must be called
    /// with no buffered lookahead past the opening `{` — i.e. immediately
    /// after `expect(&Token::LeftCurly, ...)` and before any `peek`/`check`.
    pub fn lex_hex_body(&mut self) -> Result<Vec<yara_ast::HexToken>> {
        self.lookahead.clear();
        self.lexer.lex_hex_body()
    }

    /// A `meta:` entry's value. Quoted strings here skip UTF-8 validation
    /// (spec.md §3: meta values may carry arbitrary bytes), so this bypasses
    /// the ordinary token stream entirely rather than matching on a
    /// `Token::Str` already produced by the UTF-8-checked path. Must be
    /// called with no buffered lookahead, i.e. right after consuming `=`.
    pub fn parse_meta_value(&mut self) -> Result<MetaValue> {
        self.lookahead.clear();
        if self.lexer.peek_byte_after_trivia()? == Some(b'"') {
            let tok = self.lexer.next_meta_string()?;
            match tok.token {
                Token::Str(bytes) => Ok(MetaValue::Bytes(bytes)),
                _ => unreachable!("next_meta_string always yields Token::Str"),
            }
        } else {
            let tok = self.bump()?;
            match tok.token {
                Token::True => Ok(MetaValue::Boolean(true)),
                Token::False => Ok(MetaValue::Boolean(false)),
                Token::Int(n) => Ok(MetaValue::Integer(n)),
                Token::Minus => match self.bump()?.token {
                    Token::Int(n) => Ok(MetaValue::Integer(-n)),
                    other => Err(Error::unexpected_token(tok.span, other, "a meta value")),
                },
                other => Err(Error::unexpected_token(tok.span, other, "a meta value")),
            }
        }
    }

    /// A pure-ASCII quoted string: the `import` operand or a `base64`/
    /// `base64wide` custom-alphabet argument. Must be called with no
    /// buffered lookahead.
    pub fn expect_ascii_string(&mut self) -> Result<(String, Span)> {
        self.lookahead.clear();
        let tok = self.lexer.next_ascii_string()?;
        match tok.token {
            Token::Str(bytes) => Ok((String::from_utf8(bytes).expect("ASCII-validated"), tok.span)),
            _ => unreachable!("next_ascii_string always yields Token::Str"),
        }
    }
}
