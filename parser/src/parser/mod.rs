//! Top-level grammar: rule sets, rules, `meta:`/`strings:` sections.

pub mod context;
pub mod expression;

use yara_ast::{
    Base64Modifier, Import, Meta, Rule, RuleModifiers, RuleSet, StringBody, StringDecl,
    StringModifiers, XorRange,
};
use yara_errors::{Error, Result};

use crate::tokenizer::Token;
use crate::validator::Validator;
use context::ParserContext;
use expression::parse_expr;

/// Parse a complete YARA source buffer into a [`RuleSet`].
pub fn parse(input: &[u8]) -> Result<RuleSet> {
    let span = tracing::span!(tracing::Level::DEBUG, "parse", bytes = input.len());
    let _enter = span.enter();

    let mut ctx = ParserContext::new(input)?;
    let mut validator = Validator::new();
    let mut imports = Vec::new();
    let mut rules = Vec::new();

    while !ctx.is_eof() {
        if ctx.check(&Token::Import) {
            ctx.bump()?;
            let (name, _) = ctx.expect_ascii_string()?;
            tracing::trace!(import = %name, "resolved import");
            imports.push(Import(name));
        } else {
            rules.push(parse_rule(&mut ctx, &mut validator)?);
        }
    }
    tracing::debug!(rules = rules.len(), imports = imports.len(), "parsed rule set");
    Ok(RuleSet::new(imports, rules))
}

fn parse_rule_modifiers(ctx: &mut ParserContext) -> Result<RuleModifiers> {
    let mut modifiers = RuleModifiers::default();
    loop {
        let span = ctx.span();
        match ctx.peek().clone() {
            Token::Global => {
                ctx.bump()?;
                if modifiers.global {
                    return Err(Error::duplicate_modifier(span));
                }
                modifiers.global = true;
            }
            Token::Private => {
                ctx.bump()?;
                if modifiers.private {
                    return Err(Error::duplicate_modifier(span));
                }
                modifiers.private = true;
            }
            _ => break,
        }
    }
    Ok(modifiers)
}

fn parse_tags(ctx: &mut ParserContext) -> Result<Vec<String>> {
    let mut tags = Vec::new();
    if ctx.eat(&Token::Colon)? {
        loop {
            let (name, _) = ctx.expect_ident()?;
            tags.push(name);
            if ctx.check(&Token::LeftCurly) {
                break;
            }
        }
    }
    Ok(tags)
}

fn parse_rule(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Rule> {
    let modifiers = parse_rule_modifiers(ctx)?;
    let rule_span = ctx.expect(&Token::Rule, "'rule'")?;
    let (identifier, id_span) = ctx.expect_ident()?;
    validator.rules.declare(id_span, &identifier)?;
    let tags = parse_tags(ctx)?;
    ctx.expect(&Token::LeftCurly, "'{'")?;
    validator.begin_rule(&identifier);

    let body = (|| -> Result<_> {
        let mut meta = Vec::new();
        let mut strings = Vec::new();
        if ctx.eat(&Token::Meta)? {
            ctx.expect(&Token::Colon, "':'")?;
            meta = parse_meta_entries(ctx)?;
        }
        if ctx.eat(&Token::Strings)? {
            ctx.expect(&Token::Colon, "':'")?;
            strings = parse_string_decls(ctx, validator)?;
        }
        ctx.expect(&Token::Condition, "'condition'")?;
        ctx.expect(&Token::Colon, "':'")?;
        let condition = parse_expr(ctx, validator)?;
        Ok((meta, strings, condition))
    })();
    validator.end_rule();
    let (meta, strings, condition) = body?;

    ctx.expect(&Token::RightCurly, "'}'")?;

    tracing::trace!(rule = %identifier, "parsed rule");
    Ok(Rule { identifier, modifiers, tags, meta, strings, condition, span: rule_span })
}

fn parse_meta_entries(ctx: &mut ParserContext) -> Result<Vec<Meta>> {
    let mut metas = Vec::new();
    while let Some(name) = ctx.eat_ident()? {
        ctx.expect(&Token::Assign, "'='")?;
        let value = ctx.parse_meta_value()?;
        metas.push(Meta::new(name, value));
    }
    Ok(metas)
}

fn parse_string_decls(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Vec<StringDecl>> {
    let mut decls = Vec::new();
    while ctx.check(&Token::Dollar) {
        let span = ctx.span();
        ctx.bump()?;
        let identifier = ctx.eat_ident()?.unwrap_or_default();
        validator.strings_mut().declare(span, &identifier)?;
        ctx.expect(&Token::Assign, "'='")?;
        let body = parse_string_body(ctx)?;
        let modifiers = parse_string_modifiers(ctx)?;
        decls.push(StringDecl { identifier, modifiers, body });
    }
    Ok(decls)
}

fn parse_string_body(ctx: &mut ParserContext) -> Result<StringBody> {
    let span = ctx.span();
    match ctx.peek().clone() {
        Token::Str(_) => match ctx.bump()?.token {
            Token::Str(bytes) => Ok(StringBody::Text(bytes)),
            _ => unreachable!(),
        },
        Token::Regex(_, _) => match ctx.bump()?.token {
            Token::Regex(bytes, flags) => Ok(StringBody::Regex {
                bytes,
                case_insensitive: flags.contains('i'),
                dot_all: flags.contains('s'),
            }),
            _ => unreachable!(),
        },
        Token::LeftCurly => {
            ctx.bump()?;
            let tokens = ctx.lex_hex_body()?;
            Ok(StringBody::Hex(tokens))
        }
        other => Err(Error::unexpected_token(span, other, "a string, regex, or hex-string body")),
    }
}

fn parse_string_modifiers(ctx: &mut ParserContext) -> Result<StringModifiers> {
    let mut modifiers = StringModifiers::default();
    loop {
        let span = ctx.span();
        match ctx.peek().clone() {
            Token::Ascii => {
                ctx.bump()?;
                if modifiers.ascii {
                    return Err(Error::duplicate_modifier(span));
                }
                modifiers.ascii = true;
            }
            Token::Wide => {
                ctx.bump()?;
                if modifiers.wide {
                    return Err(Error::duplicate_modifier(span));
                }
                modifiers.wide = true;
            }
            Token::Nocase => {
                ctx.bump()?;
                if modifiers.nocase {
                    return Err(Error::duplicate_modifier(span));
                }
                modifiers.nocase = true;
            }
            Token::Fullword => {
                ctx.bump()?;
                if modifiers.fullword {
                    return Err(Error::duplicate_modifier(span));
                }
                modifiers.fullword = true;
            }
            Token::Private => {
                ctx.bump()?;
                if modifiers.private {
                    return Err(Error::duplicate_modifier(span));
                }
                modifiers.private = true;
            }
            Token::Xor => {
                ctx.bump()?;
                if modifiers.xor.is_some() {
                    return Err(Error::duplicate_modifier(span));
                }
                modifiers.xor = Some(parse_xor_range(ctx)?);
            }
            Token::Base64 => {
                ctx.bump()?;
                if modifiers.base64.is_some() {
                    return Err(Error::duplicate_modifier(span));
                }
                modifiers.base64 = Some(parse_base64_modifier(ctx)?);
            }
            Token::Base64Wide => {
                ctx.bump()?;
                if modifiers.base64wide.is_some() {
                    return Err(Error::duplicate_modifier(span));
                }
                modifiers.base64wide = Some(parse_base64_modifier(ctx)?);
            }
            _ => break,
        }
    }
    Ok(modifiers)
}

fn parse_xor_range(ctx: &mut ParserContext) -> Result<XorRange> {
    if !ctx.eat(&Token::LeftParen)? {
        return Ok(XorRange::Bare);
    }
    let (lo, _) = ctx.expect_int()?;
    if ctx.eat(&Token::Minus)? {
        let (hi, _) = ctx.expect_int()?;
        ctx.expect(&Token::RightParen, "')'")?;
        Ok(XorRange::Range(lo as u32, hi as u32))
    } else {
        ctx.expect(&Token::RightParen, "')'")?;
        Ok(XorRange::Single(lo as u32))
    }
}

fn parse_base64_modifier(ctx: &mut ParserContext) -> Result<Base64Modifier> {
    if !ctx.eat(&Token::LeftParen)? {
        return Ok(Base64Modifier { alphabet: None });
    }
    let span = ctx.span();
    let (alphabet, _) = ctx.expect_ascii_string()?;
    if alphabet.len() != 64 {
        return Err(Error::base64_alphabet_length(span));
    }
    ctx.expect(&Token::RightParen, "')'")?;
    Ok(Base64Modifier { alphabet: Some(alphabet) })
}
