//! The condition-expression grammar (spec.md §4.2): precedence climbing over
//! the binary operator table, with dedicated productions for string/rule
//! sigils, set-of/for expressions, and quantifiers.

use yara_ast::{
    BinaryOp, Expr, Iterable, Quantifier, RuleSetMember, StringRef, StringSet, StringSetMember,
};
use yara_errors::{Error, Result};
use yara_span::Span;

use crate::parser::context::ParserContext;
use crate::tokenizer::Token;
use crate::validator::Validator;

pub fn parse_expr(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Expr> {
    parse_binary(ctx, validator, 0)
}

fn binary_op_for_token(tok: &Token) -> Option<BinaryOp> {
    Some(match tok {
        Token::Or => BinaryOp::Or,
        Token::And => BinaryOp::And,
        Token::Pipe => BinaryOp::BitOr,
        Token::Caret => BinaryOp::BitXor,
        Token::Amp => BinaryOp::BitAnd,
        Token::Eq => BinaryOp::Eq,
        Token::Neq => BinaryOp::Neq,
        Token::Lt => BinaryOp::Lt,
        Token::Le => BinaryOp::Le,
        Token::Gt => BinaryOp::Gt,
        Token::Ge => BinaryOp::Ge,
        Token::Contains => BinaryOp::Contains,
        Token::IContains => BinaryOp::IContains,
        Token::IEquals => BinaryOp::IEquals,
        Token::StartsWith => BinaryOp::StartsWith,
        Token::IStartsWith => BinaryOp::IStartsWith,
        Token::EndsWith => BinaryOp::EndsWith,
        Token::IEndsWith => BinaryOp::IEndsWith,
        Token::Matches => BinaryOp::Matches,
        Token::Shl => BinaryOp::Shl,
        Token::Shr => BinaryOp::Shr,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Backslash => BinaryOp::Div,
        Token::Percent => BinaryOp::Mod,
        _ => return None,
    })
}

fn parse_binary(ctx: &mut ParserContext, validator: &mut Validator, min_prec: u8) -> Result<Expr> {
    let mut lhs = parse_unary(ctx, validator)?;
    loop {
        let Some(op) = binary_op_for_token(ctx.peek()) else { break };
        let prec = op.precedence().0;
        if prec < min_prec {
            break;
        }
        ctx.bump()?;
        let rhs = parse_binary(ctx, validator, prec + 1)?;
        lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
    }
    Ok(lhs)
}

fn parse_unary(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Expr> {
    match ctx.peek().clone() {
        Token::Not => {
            ctx.bump()?;
            Ok(Expr::Not(Box::new(parse_unary(ctx, validator)?)))
        }
        Token::Defined => {
            ctx.bump()?;
            Ok(Expr::Defined(Box::new(parse_unary(ctx, validator)?)))
        }
        Token::Minus => {
            ctx.bump()?;
            Ok(Expr::Neg(Box::new(parse_unary(ctx, validator)?)))
        }
        Token::Tilde => {
            ctx.bump()?;
            Ok(Expr::BitNot(Box::new(parse_unary(ctx, validator)?)))
        }
        _ => parse_quantified_or_primary(ctx, validator),
    }
}

/// Dispatches on whether the upcoming tokens begin a quantified `of`/`for`
/// construct or a plain primary expression. `<primary> [%] of ...` is
/// unambiguous once the `of` keyword is seen — nothing else can legally
/// follow a complete primary — so no backtracking is required.
fn parse_quantified_or_primary(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Expr> {
    match ctx.peek().clone() {
        Token::All | Token::Any | Token::None_ => {
            let q = parse_quantifier(ctx, validator)?;
            parse_of_tail(ctx, validator, q)
        }
        Token::For => parse_for(ctx, validator),
        _ => {
            let span = ctx.span();
            let base = parse_primary(ctx, validator)?;
            let expr = apply_postfix(ctx, validator, base)?;
            if ctx.check(&Token::Percent) && matches!(ctx.look_ahead(1), Token::Of) {
                ctx.bump()?;
                check_quantifier_value(&expr, span)?;
                return parse_of_tail(ctx, validator, Quantifier::Percent(Box::new(expr)));
            }
            if ctx.check(&Token::Of) {
                check_quantifier_value(&expr, span)?;
                return parse_of_tail(ctx, validator, Quantifier::Expr(Box::new(expr)));
            }
            Ok(expr)
        }
    }
}

fn parse_primary(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Expr> {
    let span = ctx.span();
    match ctx.peek().clone() {
        Token::Int(n) => {
            ctx.bump()?;
            Ok(Expr::Integer(n))
        }
        Token::Float(f) => {
            ctx.bump()?;
            Ok(Expr::Float(f))
        }
        Token::Str(bytes) => {
            ctx.bump()?;
            Ok(Expr::StringLit(bytes))
        }
        Token::Regex(bytes, flags) => {
            ctx.bump()?;
            Ok(Expr::Regex {
                bytes,
                case_insensitive: flags.contains('i'),
                dot_all: flags.contains('s'),
            })
        }
        Token::True => {
            ctx.bump()?;
            Ok(Expr::Bool(true))
        }
        Token::False => {
            ctx.bump()?;
            Ok(Expr::Bool(false))
        }
        Token::Filesize => {
            ctx.bump()?;
            Ok(Expr::Filesize)
        }
        Token::Entrypoint => {
            ctx.bump()?;
            Ok(Expr::Entrypoint)
        }
        Token::LeftParen => {
            ctx.bump()?;
            let inner = parse_expr(ctx, validator)?;
            ctx.expect(&Token::RightParen, "')'")?;
            Ok(Expr::Paren(Box::new(inner)))
        }
        Token::Ident(name) => {
            ctx.bump()?;
            Ok(Expr::Identifier(name))
        }
        Token::Dollar => parse_string_match(ctx, validator, span),
        Token::Hash => parse_string_count(ctx, validator, span),
        Token::At_ => parse_string_offset(ctx, validator, span),
        Token::Bang => parse_string_length(ctx, validator, span),
        other => Err(Error::unexpected_token(span, other, "an expression")),
    }
}

fn apply_postfix(ctx: &mut ParserContext, validator: &mut Validator, mut expr: Expr) -> Result<Expr> {
    loop {
        match ctx.peek().clone() {
            Token::Dot => {
                ctx.bump()?;
                let (name, _) = ctx.expect_ident()?;
                expr = Expr::Member(Box::new(expr), name);
            }
            Token::LeftSquare => {
                ctx.bump()?;
                let idx = parse_expr(ctx, validator)?;
                ctx.expect(&Token::RightSquare, "']'")?;
                expr = Expr::Subscript(Box::new(expr), Box::new(idx));
            }
            Token::LeftParen if matches!(expr, Expr::Identifier(_) | Expr::Member(_, _)) => {
                ctx.bump()?;
                let mut args = Vec::new();
                if !ctx.check(&Token::RightParen) {
                    loop {
                        args.push(parse_expr(ctx, validator)?);
                        if !ctx.eat(&Token::Comma)? {
                            break;
                        }
                    }
                }
                ctx.expect(&Token::RightParen, "')'")?;
                let builtin = matches!(&expr, Expr::Identifier(name) if yara_ast::expressions::is_builtin_name(name));
                expr = Expr::Call { callee: Box::new(expr), args, builtin };
            }
            _ => break,
        }
    }
    Ok(expr)
}

// --- string/rule reference sigils ------------------------------------------

fn parse_sigil_ref(ctx: &mut ParserContext, validator: &mut Validator, span: Span, form: &str) -> Result<StringRef> {
    if let Some(name) = ctx.eat_ident()? {
        validator.strings_mut().reference_named(span, &name, form)?;
        Ok(StringRef::named(name))
    } else {
        validator.anon_scope.check(span, form)?;
        Ok(StringRef::anonymous())
    }
}

fn parse_string_match(ctx: &mut ParserContext, validator: &mut Validator, span: Span) -> Result<Expr> {
    ctx.bump()?; // '$'
    let id = parse_sigil_ref(ctx, validator, span, "$")?;
    if ctx.eat(&Token::At)? {
        let at = parse_expr(ctx, validator)?;
        Ok(Expr::StringAt { id, at: Box::new(at) })
    } else if ctx.eat(&Token::In)? {
        let range = parse_range_paren(ctx, validator)?;
        Ok(Expr::StringIn { id, range: Box::new(range) })
    } else {
        Ok(Expr::StringMatch(id))
    }
}

fn parse_string_count(ctx: &mut ParserContext, validator: &mut Validator, span: Span) -> Result<Expr> {
    ctx.bump()?; // '#'
    let id = parse_sigil_ref(ctx, validator, span, "#")?;
    if ctx.eat(&Token::In)? {
        let range = parse_range_paren(ctx, validator)?;
        Ok(Expr::StringCountInRange { id, range: Box::new(range) })
    } else {
        Ok(Expr::StringCount(id))
    }
}

fn parse_string_offset(ctx: &mut ParserContext, validator: &mut Validator, span: Span) -> Result<Expr> {
    ctx.bump()?; // '@'
    let id = parse_sigil_ref(ctx, validator, span, "@")?;
    let index = parse_optional_subscript(ctx, validator)?;
    Ok(Expr::StringOffset { id, index })
}

fn parse_string_length(ctx: &mut ParserContext, validator: &mut Validator, span: Span) -> Result<Expr> {
    ctx.bump()?; // '!'
    let id = parse_sigil_ref(ctx, validator, span, "!")?;
    let index = parse_optional_subscript(ctx, validator)?;
    Ok(Expr::StringLength { id, index })
}

fn parse_optional_subscript(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Option<Box<Expr>>> {
    if ctx.eat(&Token::LeftSquare)? {
        let e = parse_expr(ctx, validator)?;
        ctx.expect(&Token::RightSquare, "']'")?;
        Ok(Some(Box::new(e)))
    } else {
        Ok(None)
    }
}

// --- ranges ------------------------------------------------------------

fn parse_range_paren(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Expr> {
    ctx.expect(&Token::LeftParen, "'('")?;
    let range = parse_range(ctx, validator)?;
    ctx.expect(&Token::RightParen, "')'")?;
    Ok(range)
}

fn parse_range(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Expr> {
    let span = ctx.span();
    let lo = parse_expr(ctx, validator)?;
    ctx.expect(&Token::DotDot, "'..'")?;
    let hi = parse_expr(ctx, validator)?;
    check_range_bounds(&lo, &hi, span)?;
    Ok(Expr::Range { lo: Box::new(lo), hi: Box::new(hi) })
}

fn check_range_bounds(lo: &Expr, hi: &Expr, span: Span) -> Result<()> {
    if let Expr::Integer(n) = lo.unparen() {
        if *n < 0 {
            return Err(Error::negative_lower_bound(span));
        }
    }
    if let Expr::Integer(n) = hi.unparen() {
        if *n < 0 {
            return Err(Error::negative_upper_bound(span));
        }
    }
    if let (Expr::Integer(l), Expr::Integer(h)) = (lo.unparen(), hi.unparen()) {
        if l > h {
            return Err(Error::invalid_range(span));
        }
    }
    Ok(())
}

// --- quantifiers, set-of, rule-set-of ------------------------------------

fn check_quantifier_value(expr: &Expr, span: Span) -> Result<()> {
    match expr.unparen() {
        Expr::Neg(inner) => {
            if let Expr::Integer(n) = inner.unparen() {
                return Err(Error::invalid_value_in_condition(span, format!("-{n}")));
            }
            Ok(())
        }
        Expr::Float(f) => Err(Error::invalid_value_in_condition(span, format!("{f:.6}"))),
        Expr::StringLit(bytes) => {
            Err(Error::invalid_value_in_condition(span, format!("\"{}\"", String::from_utf8_lossy(bytes))))
        }
        Expr::Regex { bytes, .. } => {
            Err(Error::invalid_value_in_condition(span, format!("/{}/", String::from_utf8_lossy(bytes))))
        }
        _ => Ok(()),
    }
}

/// A quantifier value restricted to a primary expression (no binary
/// operators) with an optional leading unary minus, e.g. `-1`, `pe.count`.
fn parse_quantifier_value(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Expr> {
    if ctx.eat(&Token::Minus)? {
        let inner = parse_primary(ctx, validator)?;
        let inner = apply_postfix(ctx, validator, inner)?;
        Ok(Expr::Neg(Box::new(inner)))
    } else {
        let base = parse_primary(ctx, validator)?;
        apply_postfix(ctx, validator, base)
    }
}

pub(crate) fn parse_quantifier(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Quantifier> {
    match ctx.peek().clone() {
        Token::All => {
            ctx.bump()?;
            Ok(Quantifier::All)
        }
        Token::Any => {
            ctx.bump()?;
            Ok(Quantifier::Any)
        }
        Token::None_ => {
            ctx.bump()?;
            Ok(Quantifier::None)
        }
        _ => {
            let span = ctx.span();
            let value = parse_quantifier_value(ctx, validator)?;
            check_quantifier_value(&value, span)?;
            if ctx.eat(&Token::Percent)? {
                Ok(Quantifier::Percent(Box::new(value)))
            } else {
                Ok(Quantifier::Expr(Box::new(value)))
            }
        }
    }
}

fn parse_string_set_members(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Vec<StringSetMember>> {
    let mut members = Vec::new();
    loop {
        let span = ctx.span();
        ctx.expect(&Token::Dollar, "'$'")?;
        match ctx.eat_ident()? {
            None => {
                validator.anon_scope.check(span, "$")?;
                members.push(StringSetMember::Anonymous);
            }
            Some(name) => {
                if ctx.eat(&Token::Star)? {
                    validator.strings_mut().reference_wildcard(span, &name)?;
                    members.push(StringSetMember::Wildcard(name));
                } else {
                    validator.strings_mut().reference_named(span, &name, "$")?;
                    members.push(StringSetMember::Named(name));
                }
            }
        }
        if !ctx.eat(&Token::Comma)? {
            break;
        }
    }
    Ok(members)
}

fn parse_string_set_value(ctx: &mut ParserContext, validator: &mut Validator) -> Result<StringSet> {
    let span = ctx.span();
    if ctx.eat(&Token::Them)? {
        validator.strings_mut().reference_them(span)?;
        Ok(StringSet::Them)
    } else {
        ctx.expect(&Token::LeftParen, "'(' or 'them'")?;
        let members = parse_string_set_members(ctx, validator)?;
        ctx.expect(&Token::RightParen, "')'")?;
        Ok(StringSet::Enumerated(members))
    }
}

fn parse_rule_set_member_list(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Vec<RuleSetMember>> {
    let mut members = Vec::new();
    loop {
        let span = ctx.span();
        let (name, _) = ctx.expect_ident()?;
        if ctx.eat(&Token::Star)? {
            validator.rules.reference_wildcard(span, &name)?;
            members.push(RuleSetMember::Wildcard(name));
        } else {
            validator.rules.reference_named(span, &name)?;
            members.push(RuleSetMember::Named(name));
        }
        if !ctx.eat(&Token::Comma)? {
            break;
        }
    }
    Ok(members)
}

fn parse_optional_in_range(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Option<Box<Expr>>> {
    if ctx.eat(&Token::In)? {
        Ok(Some(Box::new(parse_range_paren(ctx, validator)?)))
    } else {
        Ok(None)
    }
}

fn parse_optional_at(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Option<Box<Expr>>> {
    if ctx.eat(&Token::At)? {
        Ok(Some(Box::new(parse_expr(ctx, validator)?)))
    } else {
        Ok(None)
    }
}

/// `of` has not yet been consumed. Dispatches between `SetOf` (string set)
/// and `RuleSetOf` (rule set) by looking at the token right after `(`.
fn parse_of_tail(ctx: &mut ParserContext, validator: &mut Validator, quantifier: Quantifier) -> Result<Expr> {
    ctx.expect(&Token::Of, "'of'")?;
    if ctx.check(&Token::Them) {
        let span = ctx.span();
        ctx.bump()?;
        validator.strings_mut().reference_them(span)?;
        let in_range = parse_optional_in_range(ctx, validator)?;
        let at = parse_optional_at(ctx, validator)?;
        return Ok(Expr::SetOf { quantifier, set: StringSet::Them, in_range, at });
    }
    ctx.expect(&Token::LeftParen, "'(' or 'them'")?;
    if ctx.check(&Token::Dollar) {
        let members = parse_string_set_members(ctx, validator)?;
        ctx.expect(&Token::RightParen, "')'")?;
        let in_range = parse_optional_in_range(ctx, validator)?;
        let at = parse_optional_at(ctx, validator)?;
        Ok(Expr::SetOf { quantifier, set: StringSet::Enumerated(members), in_range, at })
    } else {
        let members = parse_rule_set_member_list(ctx, validator)?;
        ctx.expect(&Token::RightParen, "')'")?;
        Ok(Expr::RuleSetOf { quantifier, set: members })
    }
}

/// `of` has not yet been consumed; only string sets are legal here.
fn finish_for_of(ctx: &mut ParserContext, validator: &mut Validator, quantifier: Quantifier) -> Result<Expr> {
    ctx.expect(&Token::Of, "'of'")?;
    let set = parse_string_set_value(ctx, validator)?;
    ctx.expect(&Token::Colon, "':'")?;
    ctx.expect(&Token::LeftParen, "'('")?;
    validator.anon_scope.enter();
    let body = parse_expr(ctx, validator);
    validator.anon_scope.exit();
    let body = body?;
    ctx.expect(&Token::RightParen, "')'")?;
    Ok(Expr::ForOf { quantifier, set, body: Box::new(body) })
}

fn parse_for(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Expr> {
    ctx.bump()?; // 'for'
    let quantifier = parse_quantifier(ctx, validator)?;
    if ctx.check(&Token::Of) {
        return finish_for_of(ctx, validator, quantifier);
    }
    let (first, _) = ctx.expect_ident()?;
    let mut vars = vec![first];
    while ctx.eat(&Token::Comma)? {
        let (v, _) = ctx.expect_ident()?;
        vars.push(v);
    }
    ctx.expect(&Token::In, "'in'")?;
    let iterable = parse_iterable(ctx, validator)?;
    ctx.expect(&Token::Colon, "':'")?;
    ctx.expect(&Token::LeftParen, "'('")?;
    validator.anon_scope.enter();
    let body = parse_expr(ctx, validator);
    validator.anon_scope.exit();
    let body = body?;
    ctx.expect(&Token::RightParen, "')'")?;
    Ok(Expr::ForIn { quantifier, vars, iterable, body: Box::new(body) })
}

fn parse_iterable(ctx: &mut ParserContext, validator: &mut Validator) -> Result<Iterable> {
    if !ctx.check(&Token::LeftParen) {
        let e = parse_expr(ctx, validator)?;
        return Ok(Iterable::Expr(Box::new(e)));
    }
    ctx.bump()?; // '('
    if matches!(ctx.peek(), Token::Str(_)) {
        let mut items = Vec::new();
        loop {
            match ctx.bump()?.token {
                Token::Str(bytes) => items.push(bytes),
                other => {
                    let span = ctx.span();
                    return Err(Error::unexpected_token(span, other, "a string literal"));
                }
            }
            if !ctx.eat(&Token::Comma)? {
                break;
            }
        }
        ctx.expect(&Token::RightParen, "')'")?;
        return Ok(Iterable::TextStringSet(items));
    }

    let span = ctx.span();
    let first = parse_expr(ctx, validator)?;
    if ctx.eat(&Token::DotDot)? {
        let hi = parse_expr(ctx, validator)?;
        check_range_bounds(&first, &hi, span)?;
        let range_expr = Expr::Range { lo: Box::new(first), hi: Box::new(hi) };
        ctx.expect(&Token::RightParen, "')'")?;
        return Ok(Iterable::Range(Box::new(range_expr)));
    }
    let mut items = vec![first];
    while ctx.eat(&Token::Comma)? {
        items.push(parse_expr(ctx, validator)?);
    }
    ctx.expect(&Token::RightParen, "')'")?;
    Ok(Iterable::IntegerSet(items))
}
