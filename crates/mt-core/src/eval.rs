//! Sandboxed expression interpreter.
//!
//! Walks the typed AST from `mt-lang` against an evaluation context holding
//! at most one binding (the rule's derived value, under the value alias) and
//! the explicit built-in function registry. `None` means evaluation failure;
//! callers degrade gracefully (fall back to raw text, or treat a condition
//! as unmet) rather than abort.

use mt_lang::ast::{BinOp, Expr, VALUE_ALIAS, VALUE_ALIAS_LEGACY};
use regex::RegexBuilder;

use crate::funcs::FuncRegistry;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Evaluation context
// ---------------------------------------------------------------------------

/// Name bindings visible to an expression. Derived-value expressions carry
/// no bindings at all; compiled conditions carry the single value-alias
/// binding (reachable under both its spellings).
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    current: Option<Value>,
}

impl EvalContext {
    /// Context with no bindings, for derived-value expressions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Context binding the value alias, for compiled conditions.
    pub fn with_value(value: Value) -> Self {
        Self {
            current: Some(value),
        }
    }

    fn resolve(&self, name: &str) -> Option<Value> {
        if name == VALUE_ALIAS || name == VALUE_ALIAS_LEGACY {
            self.current.clone()
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

/// Evaluate an expression, returning `None` on any failure.
pub fn eval_expr(expr: &Expr, ctx: &EvalContext, funcs: &FuncRegistry) -> Option<Value> {
    match expr {
        Expr::Number(n) => Some(Value::Number(*n)),
        Expr::StringLit(s) => Some(Value::Str(s.clone())),
        Expr::Bool(b) => Some(Value::Bool(*b)),
        Expr::Ident(name) => ctx.resolve(name),
        Expr::Neg(inner) => match eval_expr(inner, ctx, funcs)? {
            Value::Number(n) => Some(Value::Number(-n)),
            _ => None,
        },
        Expr::Not(inner) => Some(Value::Bool(!eval_expr(inner, ctx, funcs)?.is_truthy())),
        Expr::BinOp { op, left, right } => eval_binop(*op, left, right, ctx, funcs),
        Expr::FuncCall { name, args } => {
            let func = funcs.get(name)?;
            let values = eval_args(args, ctx, funcs)?;
            func(&values)
        }
        Expr::MethodCall { target, name, args } => {
            let text = eval_expr(target, ctx, funcs)?.to_text();
            let values = eval_args(args, ctx, funcs)?;
            eval_method(&text, name, &values)
        }
        Expr::Index {
            target,
            start,
            end,
            slice,
        } => eval_index(target, start.as_deref(), end.as_deref(), *slice, ctx, funcs),
        Expr::RegexMatch {
            target,
            pattern,
            case_insensitive,
            negated,
        } => {
            let text = eval_expr(target, ctx, funcs)?.to_text();
            let re = RegexBuilder::new(pattern)
                .case_insensitive(*case_insensitive)
                .build()
                .ok()?;
            let found = re.is_match(&text);
            Some(Value::Bool(found != *negated))
        }
        _ => None,
    }
}

fn eval_args(args: &[Expr], ctx: &EvalContext, funcs: &FuncRegistry) -> Option<Vec<Value>> {
    args.iter().map(|a| eval_expr(a, ctx, funcs)).collect()
}

// ---------------------------------------------------------------------------
// Binary operators
// ---------------------------------------------------------------------------

fn eval_binop(
    op: BinOp,
    left: &Expr,
    right: &Expr,
    ctx: &EvalContext,
    funcs: &FuncRegistry,
) -> Option<Value> {
    match op {
        BinOp::And => eval_logic_and(left, right, ctx, funcs),
        BinOp::Or => eval_logic_or(left, right, ctx, funcs),
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
            let lv = eval_expr(left, ctx, funcs)?;
            let rv = eval_expr(right, ctx, funcs)?;
            compare_values(op, &lv, &rv)
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            let lv = eval_expr(left, ctx, funcs)?;
            let rv = eval_expr(right, ctx, funcs)?;
            if op == BinOp::Add
                && let (Value::Str(a), Value::Str(b)) = (&lv, &rv)
            {
                return Some(Value::Str(format!("{a}{b}")));
            }
            let ln = coerce_to_f64(&lv)?;
            let rn = coerce_to_f64(&rv)?;
            let out = match op {
                BinOp::Add => ln + rn,
                BinOp::Sub => ln - rn,
                BinOp::Mul => ln * rn,
                BinOp::Div => {
                    if rn == 0.0 {
                        return None;
                    }
                    ln / rn
                }
                BinOp::Mod => {
                    if rn == 0.0 {
                        return None;
                    }
                    ln % rn
                }
                _ => return None,
            };
            Some(Value::Number(out))
        }
        _ => None,
    }
}

/// Short-circuit-tolerant logical AND: a definite `false` on either side
/// wins even when the other side fails to evaluate.
fn eval_logic_and(
    left: &Expr,
    right: &Expr,
    ctx: &EvalContext,
    funcs: &FuncRegistry,
) -> Option<Value> {
    let lv = eval_expr(left, ctx, funcs).map(|v| v.is_truthy());
    let rv = eval_expr(right, ctx, funcs).map(|v| v.is_truthy());
    match (lv, rv) {
        (Some(false), _) | (_, Some(false)) => Some(Value::Bool(false)),
        (Some(true), Some(true)) => Some(Value::Bool(true)),
        _ => None,
    }
}

fn eval_logic_or(
    left: &Expr,
    right: &Expr,
    ctx: &EvalContext,
    funcs: &FuncRegistry,
) -> Option<Value> {
    let lv = eval_expr(left, ctx, funcs).map(|v| v.is_truthy());
    let rv = eval_expr(right, ctx, funcs).map(|v| v.is_truthy());
    match (lv, rv) {
        (Some(true), _) | (_, Some(true)) => Some(Value::Bool(true)),
        (Some(false), Some(false)) => Some(Value::Bool(false)),
        _ => None,
    }
}

fn compare_values(op: BinOp, lv: &Value, rv: &Value) -> Option<Value> {
    let result = match op {
        BinOp::Eq => values_equal(lv, rv),
        BinOp::Ne => !values_equal(lv, rv),
        BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
            let ordering = match (lv, rv) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b)?,
                (Value::Str(a), Value::Str(b)) => a.cmp(b),
                _ => return None,
            };
            match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Gt => ordering.is_gt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Ge => ordering.is_ge(),
                _ => return None,
            }
        }
        _ => return None,
    };
    Some(Value::Bool(result))
}

/// Natural equality: same-type comparison, with a numeric string on one
/// side coercing against a number on the other.
pub fn values_equal(lv: &Value, rv: &Value) -> bool {
    match (lv, rv) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Str(s)) | (Value::Str(s), Value::Number(a)) => {
            s.trim().parse::<f64>().is_ok_and(|b| *a == b)
        }
        _ => false,
    }
}

fn coerce_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => Some(*n),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Methods and indexing (string form)
// ---------------------------------------------------------------------------

fn eval_method(text: &str, name: &str, args: &[Value]) -> Option<Value> {
    match name {
        "lower" if args.is_empty() => Some(Value::Str(text.to_lowercase())),
        "upper" if args.is_empty() => Some(Value::Str(text.to_uppercase())),
        "strip" if args.is_empty() => Some(Value::Str(text.trim().to_string())),
        "len" if args.is_empty() => Some(Value::Number(text.chars().count() as f64)),
        "startswith" => match args {
            [Value::Str(prefix)] => Some(Value::Bool(text.starts_with(prefix.as_str()))),
            _ => None,
        },
        "endswith" => match args {
            [Value::Str(suffix)] => Some(Value::Bool(text.ends_with(suffix.as_str()))),
            _ => None,
        },
        "contains" => match args {
            [Value::Str(needle)] => Some(Value::Bool(text.contains(needle.as_str()))),
            _ => None,
        },
        _ => None,
    }
}

fn eval_index(
    target: &Expr,
    start: Option<&Expr>,
    end: Option<&Expr>,
    slice: bool,
    ctx: &EvalContext,
    funcs: &FuncRegistry,
) -> Option<Value> {
    let text = match eval_expr(target, ctx, funcs)? {
        Value::Str(s) => s,
        _ => return None,
    };
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len() as i64;

    let bound = |e: Option<&Expr>| -> Option<Option<i64>> {
        match e {
            None => Some(None),
            Some(expr) => match eval_expr(expr, ctx, funcs)? {
                Value::Number(n) => Some(Some(n.trunc() as i64)),
                _ => None,
            },
        }
    };

    if !slice {
        let idx = bound(start)??;
        let normalized = if idx < 0 { len + idx } else { idx };
        if normalized < 0 || normalized >= len {
            return None;
        }
        return Some(Value::Str(chars[normalized as usize].to_string()));
    }

    let clamp = |i: i64| -> i64 {
        let n = if i < 0 { len + i } else { i };
        n.clamp(0, len)
    };
    let lo = clamp(bound(start)?.unwrap_or(0));
    let hi = clamp(bound(end)?.unwrap_or(len));
    if lo >= hi {
        return Some(Value::Str(String::new()));
    }
    Some(Value::Str(chars[lo as usize..hi as usize].iter().collect()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mt_lang::{compile_condition, parse_expression};

    fn eval_text(text: &str) -> Option<Value> {
        let funcs = FuncRegistry::standard();
        let expr = parse_expression(text).ok()?;
        eval_expr(&expr, &EvalContext::empty(), &funcs)
    }

    fn eval_condition(text: &str, value: Value) -> bool {
        let funcs = FuncRegistry::standard();
        match compile_condition(text) {
            Some(expr) => eval_expr(&expr, &EvalContext::with_value(value), &funcs)
                .map(|v| v.is_truthy())
                .unwrap_or(false),
            None => false,
        }
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(eval_text("1 + 2 * 3"), Some(Value::Number(7.0)));
        assert_eq!(eval_text("(1 + 2) * 3"), Some(Value::Number(9.0)));
        assert_eq!(eval_text("10 % 3"), Some(Value::Number(1.0)));
    }

    #[test]
    fn division_by_zero_fails() {
        assert_eq!(eval_text("1 / 0"), None);
        assert_eq!(eval_text("1 % 0"), None);
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            eval_text("'a' + 'b'"),
            Some(Value::Str("ab".to_string()))
        );
    }

    #[test]
    fn unknown_identifier_fails() {
        assert_eq!(eval_text("Threads_connected * 2"), None);
    }

    #[test]
    fn function_calls_resolve_through_registry() {
        assert_eq!(eval_text("max(1, 2) + abs(-3)"), Some(Value::Number(5.0)));
        assert_eq!(
            eval_text("hr_bytes(1536)"),
            Some(Value::Str("1.5 Kb".to_string()))
        );
        assert_eq!(eval_text("shutdown(1)"), None);
    }

    #[test]
    fn slicing_follows_python_semantics() {
        assert_eq!(
            eval_text("\"abcdef\"[1:4]"),
            Some(Value::Str("bcd".to_string()))
        );
        assert_eq!(
            eval_text("\"abcdef\"[4:]"),
            Some(Value::Str("ef".to_string()))
        );
        assert_eq!(
            eval_text("\"abcdef\"[-2:]"),
            Some(Value::Str("ef".to_string()))
        );
        assert_eq!(eval_text("\"abc\"[1]"), Some(Value::Str("b".to_string())));
        assert_eq!(eval_text("\"abc\"[7]"), None);
    }

    #[test]
    fn comparison_condition_against_derived_value() {
        assert!(eval_condition("> 100", Value::Number(150.0)));
        assert!(!eval_condition("> 100", Value::Number(50.0)));
        assert!(eval_condition("< 60", Value::Number(30.0)));
    }

    #[test]
    fn regex_condition_against_string_value() {
        assert!(eval_condition(r"=~ /^5\./", Value::Str("5.7.31".to_string())));
        assert!(!eval_condition(r"=~ /^5\./", Value::Str("8.0.1".to_string())));
        assert!(eval_condition(r"!~ /^5\./", Value::Str("8.0.1".to_string())));
        assert!(eval_condition("=~ /on/i", Value::Str("ON".to_string())));
    }

    #[test]
    fn method_chain_condition() {
        assert!(eval_condition(".lower() == 'on'", Value::Str("ON".to_string())));
        assert!(!eval_condition(".lower() == 'on'", Value::Str("OFF".to_string())));
    }

    #[test]
    fn eq_condition_with_numeric_coercion() {
        assert!(eval_condition("eq 30", Value::Str("30".to_string())));
        assert!(eval_condition("eq 'ON'", Value::Str("ON".to_string())));
        assert!(eval_condition("ne 'OFF'", Value::Str("ON".to_string())));
    }

    #[test]
    fn full_expression_condition_with_both_alias_spellings() {
        assert!(eval_condition("v > 10 and v < 20", Value::Number(15.0)));
        assert!(!eval_condition("v > 10 and v < 20", Value::Number(25.0)));
        assert!(eval_condition("_ > 10", Value::Number(15.0)));
    }

    #[test]
    fn condition_evaluation_failure_is_unmet() {
        // Mixed-type ordering has no natural answer.
        assert!(!eval_condition("> 60", Value::Str("fast".to_string())));
        // Unknown identifier in the escape hatch.
        assert!(!eval_condition("no_such_var > 1", Value::Number(5.0)));
    }

    #[test]
    fn logic_tolerates_one_failing_side() {
        // `false and <failure>` is still definitely false...
        assert!(!eval_condition("v > 100 and no_such_var > 1", Value::Number(5.0)));
        // ...and `true or <failure>` definitely true.
        assert!(eval_condition("v > 1 or no_such_var > 1", Value::Number(5.0)));
    }
}
