//! Variable substitution for rule expressions.
//!
//! Rewrites every maximal identifier token in the raw expression text that
//! exactly matches a variable name into a literal rendering of its value:
//! numbers and numeric strings inline bare (so the parser reads them as
//! numbers), all other strings inline as quoted literals. Identifiers with
//! no matching variable are left untouched so the parser can still resolve
//! built-in function names.

use crate::value::{Value, VariableTable, is_numeric_string};

/// Substitute variable references in `expr` from `vars`.
///
/// Matching is word-boundary exact: a token is replaced only when the full
/// identifier (`[A-Za-z_][A-Za-z0-9_]*`, maximal) equals a variable name.
/// A variable name occurring as a substring of a longer identifier is never
/// touched.
pub fn substitute(expr: &str, vars: &VariableTable) -> String {
    let bytes = expr.as_bytes();
    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        if is_ident_start(bytes[i]) {
            let start = i;
            while i < len && is_ident_cont(bytes[i]) {
                i += 1;
            }
            let word = &expr[start..i];
            match vars.get(word) {
                Some(value) => out.push_str(&render_inline(value)),
                None => out.push_str(word),
            }
        } else {
            let ch = match expr[i..].chars().next() {
                Some(c) => c,
                None => break,
            };
            out.push(ch);
            i += ch.len_utf8();
        }
    }

    out
}

/// Render a variable value as expression text.
fn render_inline(value: &Value) -> String {
    match value {
        Value::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        Value::Str(s) => {
            if is_numeric_string(s) {
                s.clone()
            } else {
                format!("\"{s}\"")
            }
        }
        Value::Bool(b) => b.to_string(),
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_cont(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn table(pairs: &[(&str, Value)]) -> VariableTable {
        let mut t = HashMap::new();
        for (k, v) in pairs {
            t.insert((*k).to_string(), v.clone());
        }
        t
    }

    #[test]
    fn substitution_is_word_boundary_exact() {
        let vars = table(&[
            ("Var1", Value::Number(5.0)),
            ("Variable1", Value::Number(9.0)),
        ]);
        assert_eq!(substitute("Var1*2", &vars), "5*2");
        assert_eq!(substitute("Variable1*2", &vars), "9*2");
        assert_eq!(substitute("Variable1+Var1", &vars), "9+5");
    }

    #[test]
    fn substring_of_longer_identifier_is_untouched() {
        let vars = table(&[("Up", Value::Number(1.0))]);
        assert_eq!(substitute("Uptime", &vars), "Uptime");
    }

    #[test]
    fn numeric_strings_inline_bare() {
        let vars = table(&[("Threads_connected", Value::Str("12".to_string()))]);
        assert_eq!(substitute("Threads_connected", &vars), "12");
    }

    #[test]
    fn non_numeric_strings_inline_quoted() {
        let vars = table(&[("version", Value::Str("5.7.31".to_string()))]);
        assert_eq!(substitute("version", &vars), "\"5.7.31\"");
    }

    #[test]
    fn unknown_identifiers_pass_through() {
        let vars = table(&[("Uptime", Value::Str("30".to_string()))]);
        assert_eq!(
            substitute("hr_bytime(Bytes_sent / Uptime)", &vars),
            "hr_bytime(Bytes_sent / 30)"
        );
    }
}
