use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Public types — Value & VariableTable
// ---------------------------------------------------------------------------

/// The bound metric name -> value set available to all expressions. Built
/// once per run from the metric source, read-only afterwards.
pub type VariableTable = HashMap<String, Value>;

/// Scalar value flowing through substitution, evaluation, and display.
///
/// Booleans exist only as evaluation results (comparisons, conditions);
/// the variable table never contains them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    /// String form, used for regex matching, method chains, and indexing.
    pub fn to_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Str(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// Raw rendering for csv output: numbers always keep a decimal point
    /// (`30.0`, `2.33`), strings pass through unchanged.
    pub fn render_raw(&self) -> String {
        match self {
            Self::Number(n) => format!("{n:?}"),
            Self::Str(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// Display rendering for pretty output: numbers show at most two
    /// decimals with trailing zeros trimmed (`12.00` -> `12`).
    pub fn render_pretty(&self) -> String {
        match self {
            Self::Number(n) => format_two_dec(*n),
            Self::Str(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// Condition truthiness: `Bool` as-is, nonzero numbers, non-empty strings.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
        }
    }
}

// ---------------------------------------------------------------------------
// Numeric-string detection
// ---------------------------------------------------------------------------

/// Strict numeric pattern: optional leading `-`, digits, optional `.digits`,
/// optional exponent `e[+-]digits` (case-insensitive `e`). Version-like
/// strings with more than one dot (`5.7.31`) do not match.
pub fn is_numeric_string(text: &str) -> bool {
    let mut rest = text.strip_prefix('-').unwrap_or(text);

    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return false;
    }
    rest = &rest[digits..];

    if let Some(after_dot) = rest.strip_prefix('.') {
        let frac = after_dot.len()
            - after_dot
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .len();
        rest = &after_dot[frac..];
    }

    if rest.is_empty() {
        return true;
    }

    let Some(exp) = rest.strip_prefix(['e', 'E']) else {
        return false;
    };
    let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
    !exp.is_empty() && exp.bytes().all(|b| b.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// Display rounding
// ---------------------------------------------------------------------------

/// Round a value to two decimal places for display.
///
/// Numbers are always rounded. Strings are rounded only when they look
/// numeric **and** the originating expression text does not mention
/// "version": version strings like `5.7.31` (and numeric-looking ones
/// like `5.7`) must never be corrupted by rounding.
pub fn round_display(value: &Value, source_expr: &str) -> Value {
    match value {
        Value::Number(n) => Value::Number(round_two_dec(*n)),
        Value::Str(s) => {
            if is_numeric_string(s) && !source_expr.to_lowercase().contains("version") {
                match s.parse::<f64>() {
                    Ok(n) => Value::Number(round_two_dec(n)),
                    Err(_) => value.clone(),
                }
            } else {
                value.clone()
            }
        }
        Value::Bool(_) => value.clone(),
    }
}

pub(crate) fn round_two_dec(n: f64) -> f64 {
    format!("{n:.2}").parse().unwrap_or(n)
}

/// Format with at most two decimals, trailing zeros trimmed.
pub(crate) fn format_two_dec(n: f64) -> String {
    let mut s = format!("{n:.2}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_string_accepts_plain_and_signed_numbers() {
        assert!(is_numeric_string("30"));
        assert!(is_numeric_string("-3"));
        assert!(is_numeric_string("2.33"));
        assert!(is_numeric_string("12."));
        assert!(is_numeric_string("1.5e3"));
        assert!(is_numeric_string("-2E+10"));
    }

    #[test]
    fn numeric_string_rejects_versions_and_words() {
        assert!(!is_numeric_string("5.7.31"));
        assert!(!is_numeric_string("ON"));
        assert!(!is_numeric_string(""));
        assert!(!is_numeric_string(".5"));
        assert!(!is_numeric_string("1e"));
        assert!(!is_numeric_string("12 bytes"));
    }

    #[test]
    fn rounds_numbers_to_two_decimals() {
        let v = round_display(&Value::Number(7.0 / 3.0), "x / y");
        assert_eq!(v, Value::Number(2.33));
    }

    #[test]
    fn rounds_numeric_strings() {
        let v = round_display(&Value::Str("2.3456".to_string()), "some_expr");
        assert_eq!(v, Value::Number(2.35));
    }

    #[test]
    fn version_expression_suppresses_rounding() {
        let v = round_display(&Value::Str("5.7".to_string()), "Version[0:3]");
        assert_eq!(v, Value::Str("5.7".to_string()));
        // Non-numeric version strings pass through regardless.
        let v = round_display(&Value::Str("5.7.31".to_string()), "anything");
        assert_eq!(v, Value::Str("5.7.31".to_string()));
    }

    #[test]
    fn pretty_rendering_trims_trailing_zeros() {
        assert_eq!(Value::Number(12.0).render_pretty(), "12");
        assert_eq!(Value::Number(2.33).render_pretty(), "2.33");
        assert_eq!(Value::Number(2.3).render_pretty(), "2.3");
    }

    #[test]
    fn raw_rendering_keeps_decimal_point() {
        assert_eq!(Value::Number(30.0).render_raw(), "30.0");
        assert_eq!(Value::Str("5.7.31".to_string()).render_raw(), "5.7.31");
    }

    #[test]
    fn truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(1.5).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Str("x".to_string()).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
    }
}
