//! Legacy condition-syntax compiler.
//!
//! Rule files carry conditions in a compact legacy form (`> 100`, `eq 'ON'`,
//! `=~ /^5\./`, `.lower() == 'on'`, or a full boolean expression). This
//! module translates that text into a typed [`Expr`] over a single implicit
//! binding: the rule's already-computed derived value, named by
//! [`VALUE_ALIAS`] (with [`VALUE_ALIAS_LEGACY`] as an alternate spelling of
//! the same binding).

use crate::ast::{Expr, VALUE_ALIAS};
use crate::parser::parse_expression;

/// Compile legacy condition text into an evaluable expression.
///
/// Returns `None` both for empty text ("no recommendation possible", the
/// evaluator is never invoked) and for text that fails to compile (treated
/// as a condition that never matches).
///
/// Translation rules, first match wins:
/// 1. `=~ /PATTERN/FLAGS`: regex search against the string form of the value.
/// 2. `!~ /PATTERN/FLAGS`: negation of rule 1.
/// 3. `eq RHS` / `ne RHS`: equality aliases.
/// 4. Leading `.`: method chain applied to the string form of the value.
/// 5. Leading comparison operator: binary comparison against the value.
/// 6. Anything else: a full expression that may reference the alias.
pub fn compile_condition(text: &str) -> Option<Expr> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(rest) = text.strip_prefix("=~") {
        return compile_regex_match(rest.trim_start(), false);
    }
    if let Some(rest) = text.strip_prefix("!~") {
        return compile_regex_match(rest.trim_start(), true);
    }

    if let Some(rest) = text.strip_prefix("eq ") {
        return parse_with_alias(&format!("{VALUE_ALIAS} == {}", rest.trim()));
    }
    if let Some(rest) = text.strip_prefix("ne ") {
        return parse_with_alias(&format!("{VALUE_ALIAS} != {}", rest.trim()));
    }

    if text.starts_with('.') {
        // Method chain on the value: `.lower() == 'on'` -> `v.lower() == 'on'`.
        return parse_with_alias(&format!("{VALUE_ALIAS}{text}"));
    }

    if text.starts_with(['<', '>', '!', '=']) {
        return parse_with_alias(&format!("{VALUE_ALIAS} {text}"));
    }

    // Full escape hatch: a complete boolean expression referencing the alias.
    parse_with_alias(text)
}

fn parse_with_alias(text: &str) -> Option<Expr> {
    parse_expression(text).ok()
}

/// Compile `/PATTERN/FLAGS` into a regex-match node.
///
/// The pattern/flags split point is the first `/` (after the opening one)
/// whose suffix is entirely ASCII-alphabetic, the same division the legacy
/// format used. Invalid patterns compile to `None` (never matches); the
/// pattern is pre-validated with `regex-syntax` so a bad rule is rejected at
/// compile time rather than failing on every evaluation.
fn compile_regex_match(text: &str, negated: bool) -> Option<Expr> {
    let body = text.strip_prefix('/')?;

    let mut split = None;
    for (i, c) in body.char_indices() {
        if c == '/' && body[i + 1..].chars().all(|f| f.is_ascii_alphabetic()) {
            split = Some(i);
            break;
        }
    }
    let split = split?;
    let pattern = &body[..split];
    let flags = &body[split + 1..];
    let case_insensitive = flags.to_ascii_lowercase().contains('i');

    regex_syntax::Parser::new().parse(pattern).ok()?;

    Some(Expr::RegexMatch {
        target: Box::new(Expr::Ident(VALUE_ALIAS.to_string())),
        pattern: pattern.to_string(),
        case_insensitive,
        negated,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinOp;

    #[test]
    fn empty_text_compiles_to_none() {
        assert_eq!(compile_condition(""), None);
        assert_eq!(compile_condition("   "), None);
    }

    #[test]
    fn leading_comparison_operator_binds_alias() {
        let e = compile_condition("> 100").unwrap();
        assert_eq!(
            e,
            Expr::BinOp {
                op: BinOp::Gt,
                left: Box::new(Expr::Ident("v".to_string())),
                right: Box::new(Expr::Number(100.0)),
            }
        );
    }

    #[test]
    fn eq_and_ne_aliases() {
        let e = compile_condition("eq 'ON'").unwrap();
        assert_eq!(
            e,
            Expr::BinOp {
                op: BinOp::Eq,
                left: Box::new(Expr::Ident("v".to_string())),
                right: Box::new(Expr::StringLit("ON".to_string())),
            }
        );
        let e = compile_condition("ne 0").unwrap();
        assert!(matches!(e, Expr::BinOp { op: BinOp::Ne, .. }));
    }

    #[test]
    fn regex_match_and_negation() {
        let e = compile_condition(r"=~ /^5\./").unwrap();
        assert_eq!(
            e,
            Expr::RegexMatch {
                target: Box::new(Expr::Ident("v".to_string())),
                pattern: r"^5\.".to_string(),
                case_insensitive: false,
                negated: false,
            }
        );
        let e = compile_condition("!~ /debug/i").unwrap();
        assert!(matches!(
            e,
            Expr::RegexMatch {
                case_insensitive: true,
                negated: true,
                ..
            }
        ));
    }

    #[test]
    fn invalid_regex_pattern_compiles_to_none() {
        assert_eq!(compile_condition("=~ /((/"), None);
    }

    #[test]
    fn method_chain_is_prefixed_with_alias() {
        let e = compile_condition(".lower() == 'on'").unwrap();
        assert_eq!(
            e,
            Expr::BinOp {
                op: BinOp::Eq,
                left: Box::new(Expr::MethodCall {
                    target: Box::new(Expr::Ident("v".to_string())),
                    name: "lower".to_string(),
                    args: vec![],
                }),
                right: Box::new(Expr::StringLit("on".to_string())),
            }
        );
    }

    #[test]
    fn full_expression_escape_hatch() {
        let e = compile_condition("v > 10 and v < 20").unwrap();
        assert!(matches!(e, Expr::BinOp { op: BinOp::And, .. }));
    }

    #[test]
    fn malformed_condition_compiles_to_none() {
        assert_eq!(compile_condition("> "), None);
        assert_eq!(compile_condition("=~ no-slashes"), None);
    }
}
