use winnow::combinator::{alt, cut_err, opt, separated};
use winnow::error::{StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::literal;

use crate::ast::*;
use crate::parse_utils::{ident, kw, number_literal, quoted_string, ws_skip};

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Parse a complete expression, requiring all input to be consumed.
pub fn parse_expression(input: &str) -> anyhow::Result<Expr> {
    full_expr
        .parse(input)
        .map_err(|e| anyhow::anyhow!("parse error: {e}"))
}

fn full_expr(input: &mut &str) -> ModalResult<Expr> {
    ws_skip.parse_next(input)?;
    let expr = parse_expr.parse_next(input)?;
    ws_skip.parse_next(input)?;
    Ok(expr)
}

pub(crate) fn parse_expr(input: &mut &str) -> ModalResult<Expr> {
    or_expr.parse_next(input)
}

// ---------------------------------------------------------------------------
// Precedence levels (lowest to highest)
// ---------------------------------------------------------------------------

/// `or_expr = and_expr { ("||" | "or") and_expr }`
fn or_expr(input: &mut &str) -> ModalResult<Expr> {
    let mut left = and_expr.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        if opt(alt((literal("||").void(), kw("or"))))
            .parse_next(input)?
            .is_some()
        {
            ws_skip.parse_next(input)?;
            let right = cut_err(and_expr).parse_next(input)?;
            left = Expr::BinOp {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        } else {
            break;
        }
    }
    Ok(left)
}

/// `and_expr = cmp_expr { ("&&" | "and") cmp_expr }`
fn and_expr(input: &mut &str) -> ModalResult<Expr> {
    let mut left = cmp_expr.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        if opt(alt((literal("&&").void(), kw("and"))))
            .parse_next(input)?
            .is_some()
        {
            ws_skip.parse_next(input)?;
            let right = cut_err(cmp_expr).parse_next(input)?;
            left = Expr::BinOp {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        } else {
            break;
        }
    }
    Ok(left)
}

/// `cmp_expr = add_expr [cmp_op add_expr]`
fn cmp_expr(input: &mut &str) -> ModalResult<Expr> {
    let left = add_expr.parse_next(input)?;
    ws_skip.parse_next(input)?;

    if let Some(op) = opt(cmp_op).parse_next(input)? {
        ws_skip.parse_next(input)?;
        let right = cut_err(add_expr).parse_next(input)?;
        return Ok(Expr::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        });
    }

    Ok(left)
}

fn cmp_op(input: &mut &str) -> ModalResult<BinOp> {
    alt((
        literal("==").value(BinOp::Eq),
        literal("!=").value(BinOp::Ne),
        literal("<=").value(BinOp::Le),
        literal(">=").value(BinOp::Ge),
        literal("<").value(BinOp::Lt),
        literal(">").value(BinOp::Gt),
    ))
    .parse_next(input)
}

/// `add_expr = mul_expr { ("+" | "-") mul_expr }`
fn add_expr(input: &mut &str) -> ModalResult<Expr> {
    let mut left = mul_expr.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        let op = opt(alt((
            literal("+").value(BinOp::Add),
            literal("-").value(BinOp::Sub),
        )))
        .parse_next(input)?;
        if let Some(op) = op {
            ws_skip.parse_next(input)?;
            let right = cut_err(mul_expr).parse_next(input)?;
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        } else {
            break;
        }
    }
    Ok(left)
}

/// `mul_expr = unary_expr { ("*" | "/" | "%") unary_expr }`
fn mul_expr(input: &mut &str) -> ModalResult<Expr> {
    let mut left = unary_expr.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        let op = opt(alt((
            literal("*").value(BinOp::Mul),
            literal("/").value(BinOp::Div),
            literal("%").value(BinOp::Mod),
        )))
        .parse_next(input)?;
        if let Some(op) = op {
            ws_skip.parse_next(input)?;
            let right = cut_err(unary_expr).parse_next(input)?;
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        } else {
            break;
        }
    }
    Ok(left)
}

/// `unary_expr = ["-" | "!" | "not"] unary_expr | postfix_expr`
fn unary_expr(input: &mut &str) -> ModalResult<Expr> {
    if opt(literal("-")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        let inner = unary_expr.parse_next(input)?;
        return Ok(Expr::Neg(Box::new(inner)));
    }
    // `!` is logical not only when it isn't the start of `!=`.
    if input.starts_with('!') && !input.starts_with("!=") {
        let _ = literal("!").parse_next(input)?;
        ws_skip.parse_next(input)?;
        let inner = unary_expr.parse_next(input)?;
        return Ok(Expr::Not(Box::new(inner)));
    }
    if opt(kw("not")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        let inner = unary_expr.parse_next(input)?;
        return Ok(Expr::Not(Box::new(inner)));
    }
    postfix_expr.parse_next(input)
}

// ---------------------------------------------------------------------------
// Postfix: method calls and indexing/slicing
// ---------------------------------------------------------------------------

/// `postfix_expr = primary { "." ident "(" args ")" | "[" slice "]" }`
fn postfix_expr(input: &mut &str) -> ModalResult<Expr> {
    let mut expr = primary.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        if opt(literal(".")).parse_next(input)?.is_some() {
            ws_skip.parse_next(input)?;
            let name = cut_err(ident)
                .context(StrContext::Expected(StrContextValue::Description(
                    "method name",
                )))
                .parse_next(input)?
                .to_string();
            ws_skip.parse_next(input)?;
            cut_err(literal("("))
                .context(StrContext::Expected(StrContextValue::Description(
                    "'(' after method name",
                )))
                .parse_next(input)?;
            let args = call_args.parse_next(input)?;
            expr = Expr::MethodCall {
                target: Box::new(expr),
                name,
                args,
            };
        } else if opt(literal("[")).parse_next(input)?.is_some() {
            expr = index_suffix(expr, input)?;
        } else {
            break;
        }
    }
    Ok(expr)
}

/// Parse the inside of `[...]`: `expr`, `expr:expr`, `expr:`, `:expr` or `:`.
fn index_suffix(target: Expr, input: &mut &str) -> ModalResult<Expr> {
    ws_skip.parse_next(input)?;
    let start = opt(parse_expr).parse_next(input)?;
    ws_skip.parse_next(input)?;

    let slice = opt(literal(":")).parse_next(input)?.is_some();
    let end = if slice {
        ws_skip.parse_next(input)?;
        let e = opt(parse_expr).parse_next(input)?;
        ws_skip.parse_next(input)?;
        e
    } else {
        None
    };

    cut_err(literal("]"))
        .context(StrContext::Expected(StrContextValue::Description("']'")))
        .parse_next(input)?;

    Ok(Expr::Index {
        target: Box::new(target),
        start: start.map(Box::new),
        end: end.map(Box::new),
        slice,
    })
}

// ---------------------------------------------------------------------------
// Primary
// ---------------------------------------------------------------------------

fn primary(input: &mut &str) -> ModalResult<Expr> {
    alt((
        number_literal.map(Expr::Number),
        quoted_string.map(Expr::StringLit),
        kw("true").map(|_| Expr::Bool(true)),
        kw("false").map(|_| Expr::Bool(false)),
        paren_expr,
        ident_primary,
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "expression",
    )))
    .parse_next(input)
}

fn paren_expr(input: &mut &str) -> ModalResult<Expr> {
    literal("(").parse_next(input)?;
    ws_skip.parse_next(input)?;
    let inner = cut_err(parse_expr).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(")")).parse_next(input)?;
    Ok(inner)
}

/// Parse an ident-based primary: function call or bare identifier.
fn ident_primary(input: &mut &str) -> ModalResult<Expr> {
    let first = ident.parse_next(input)?.to_string();
    ws_skip.parse_next(input)?;

    if opt(literal("(")).parse_next(input)?.is_some() {
        let args = call_args.parse_next(input)?;
        return Ok(Expr::FuncCall { name: first, args });
    }

    Ok(Expr::Ident(first))
}

/// Parse call arguments after the opening `(`, consuming the closing `)`.
fn call_args(input: &mut &str) -> ModalResult<Vec<Expr>> {
    ws_skip.parse_next(input)?;
    if opt(literal(")")).parse_next(input)?.is_some() {
        return Ok(vec![]);
    }
    let args: Vec<Expr> =
        separated(1.., (ws_skip, parse_expr).map(|(_, e)| e), literal(",")).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(")")).parse_next(input)?;
    Ok(args)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
