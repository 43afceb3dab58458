use winnow::ascii::multispace0;
use winnow::combinator::opt;
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{literal, one_of, take_while};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

pub fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    // First character must be alphabetic or underscore (not digit).
    if !input.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// Quoted string literal. Both `"..."` and `'...'` are accepted; rule files
/// migrated from the legacy format use single quotes freely.
pub fn quoted_string(input: &mut &str) -> ModalResult<String> {
    let quote: char = one_of(['"', '\'']).parse_next(input)?;
    let content = take_while(0.., move |c: char| c != quote).parse_next(input)?;
    winnow::combinator::cut_err(one_of(move |c: char| c == quote))
        .context(StrContext::Expected(StrContextValue::Description(
            "closing quote",
        )))
        .parse_next(input)?;
    Ok(content.to_string())
}

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

/// Skip whitespace. Expressions are single-line fragments, so there is no
/// comment syntax to strip here.
pub fn ws_skip(input: &mut &str) -> ModalResult<()> {
    let _ = multispace0.parse_next(input)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Keyword matching with word boundary
// ---------------------------------------------------------------------------

/// Match an exact keyword string, ensuring it's not a prefix of a longer
/// identifier (i.e. the next character is not alphanumeric or `_`).
pub fn kw<'a>(keyword: &'static str) -> impl FnMut(&mut &'a str) -> ModalResult<()> {
    move |input: &mut &'a str| {
        let saved = *input;
        literal(keyword).parse_next(input)?;
        if input.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
            *input = saved;
            return Err(ErrMode::Backtrack(ContextError::new()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Number literal
// ---------------------------------------------------------------------------

/// Parse a number literal: integer or float, with optional `e`/`E` exponent.
/// Exponents appear when numeric-string metric values are inlined verbatim
/// by the substitution pass.
pub fn number_literal(input: &mut &str) -> ModalResult<f64> {
    let integer_part = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let mut text = integer_part.to_string();

    if opt(literal(".")).parse_next(input)?.is_some() {
        let frac_part = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
        text.push('.');
        text.push_str(frac_part);
    }

    // Exponent only counts when digits follow; `2e` alone is `2` then ident `e`.
    let saved = *input;
    if let Some(e) = opt(winnow::combinator::alt((literal("e"), literal("E")))).parse_next(input)?
    {
        let sign = opt(winnow::combinator::alt((literal("+"), literal("-")))).parse_next(input)?;
        let digits = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
        if digits.is_empty() {
            *input = saved;
        } else {
            text.push_str(e);
            if let Some(s) = sign {
                text.push_str(s);
            }
            text.push_str(digits);
        }
    }

    text.parse::<f64>()
        .map_err(|_| ErrMode::Cut(ContextError::new()))
}
