//! Built-in function registry for the expression evaluator.
//!
//! The registry is the complete set of callable names reachable from rule
//! text: numeric helpers, human-readable formatters, and a substring helper.
//! It is constructed once at startup and passed to the evaluator explicitly;
//! no other name resolves, so evaluated text can reach no host capability.

use std::collections::HashMap;

use crate::value::{Value, format_two_dec, round_two_dec};

pub type BuiltinFn = fn(&[Value]) -> Option<Value>;

#[derive(Debug)]
pub struct FuncRegistry {
    map: HashMap<&'static str, BuiltinFn>,
}

impl FuncRegistry {
    /// The standard function library.
    pub fn standard() -> Self {
        let mut map: HashMap<&'static str, BuiltinFn> = HashMap::new();
        map.insert("abs", f_abs);
        map.insert("min", f_min);
        map.insert("max", f_max);
        map.insert("int", f_int);
        map.insert("float", f_float);
        map.insert("round", f_round);
        map.insert("len", f_len);
        map.insert("hr_bytime", f_hr_bytime);
        map.insert("hr_bytes", f_hr_bytes);
        map.insert("hr_num", f_hr_num);
        map.insert("pretty_uptime", f_pretty_uptime);
        map.insert("substr", f_substr);
        Self { map }
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.map.get(name).copied()
    }
}

// ---------------------------------------------------------------------------
// Argument coercion
// ---------------------------------------------------------------------------

fn num(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => Some(*n),
        _ => None,
    }
}

/// Lenient numeric coercion: numbers pass through, strings are parsed.
/// Used by `int`/`float` and the formatters, which accept raw metric text.
fn num_lenient(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => Some(*n),
        Value::Str(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

fn f_abs(args: &[Value]) -> Option<Value> {
    if args.len() != 1 {
        return None;
    }
    Some(Value::Number(num(&args[0])?.abs()))
}

fn f_min(args: &[Value]) -> Option<Value> {
    fold_numeric(args, f64::min)
}

fn f_max(args: &[Value]) -> Option<Value> {
    fold_numeric(args, f64::max)
}

fn fold_numeric(args: &[Value], pick: fn(f64, f64) -> f64) -> Option<Value> {
    let mut acc = num(args.first()?)?;
    for arg in &args[1..] {
        acc = pick(acc, num(arg)?);
    }
    Some(Value::Number(acc))
}

fn f_int(args: &[Value]) -> Option<Value> {
    if args.len() != 1 {
        return None;
    }
    Some(Value::Number(num_lenient(&args[0])?.trunc()))
}

fn f_float(args: &[Value]) -> Option<Value> {
    if args.len() != 1 {
        return None;
    }
    Some(Value::Number(num_lenient(&args[0])?))
}

fn f_round(args: &[Value]) -> Option<Value> {
    if args.is_empty() || args.len() > 2 {
        return None;
    }
    let n = num(&args[0])?;
    let digits = match args.get(1) {
        Some(v) => num(v)?.trunc() as i32,
        None => 0,
    };
    let factor = 10f64.powi(digits);
    Some(Value::Number((n * factor).round() / factor))
}

fn f_len(args: &[Value]) -> Option<Value> {
    if args.len() != 1 {
        return None;
    }
    match &args[0] {
        Value::Str(s) => Some(Value::Number(s.chars().count() as f64)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatters
// ---------------------------------------------------------------------------

/// Scale a per-second byte rate up to the smallest period where it is >= 1.
fn f_hr_bytime(args: &[Value]) -> Option<Value> {
    if args.len() != 1 {
        return None;
    }
    let rate = num_lenient(&args[0])?;
    let (scaled, label) = if rate >= 1.0 {
        (rate, "per second")
    } else if rate * 60.0 >= 1.0 {
        (rate * 60.0, "per minute")
    } else if rate * 3600.0 >= 1.0 {
        (rate * 3600.0, "per hour")
    } else {
        (rate * 86400.0, "per day")
    };
    Some(Value::Str(format!(
        "{} {label}",
        format_two_dec(round_two_dec(scaled))
    )))
}

const BYTE_SCALES: [(f64, &str); 8] = [
    (1024f64, "Kb"),
    (1048576f64, "Mb"),
    (1073741824f64, "Gb"),
    (1099511627776f64, "Tb"),
    (1125899906842624f64, "Pb"),
    (1152921504606846976f64, "Eb"),
    (1180591620717411303424f64, "Zb"),
    (1208925819614629174706176f64, "Yb"),
];

fn f_hr_bytes(args: &[Value]) -> Option<Value> {
    if args.len() != 1 {
        return None;
    }
    let n = num_lenient(&args[0])?;
    for (scale, unit) in BYTE_SCALES.iter().rev() {
        if n >= *scale {
            return Some(Value::Str(format!("{:.1} {unit}", n / scale)));
        }
    }
    let text = if n.fract() == 0.0 {
        format!("{} bytes", n as i64)
    } else {
        format!("{n} bytes")
    };
    Some(Value::Str(text))
}

const NUM_SCALES: [(f64, &str); 5] = [
    (1e15, "Quadrillion"),
    (1e12, "Trillion"),
    (1e9, "Billion"),
    (1e6, "Million"),
    (1e3, "Thousand"),
];

fn f_hr_num(args: &[Value]) -> Option<Value> {
    if args.len() != 1 {
        return None;
    }
    let n = num_lenient(&args[0])?;
    for (scale, name) in NUM_SCALES {
        if n >= scale {
            return Some(Value::Str(format!("{} {name}", (n / scale) as i64)));
        }
    }
    let text = if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    };
    Some(Value::Str(text))
}

fn f_pretty_uptime(args: &[Value]) -> Option<Value> {
    if args.len() != 1 {
        return None;
    }
    let total = num_lenient(&args[0])?.trunc() as i64;
    let seconds = total % 60;
    let minutes = (total % 3600) / 60;
    let hours = (total % 86400) / 3600;
    let days = total / 86400;
    let text = if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    };
    Some(Value::Str(text))
}

// ---------------------------------------------------------------------------
// Substring helper
// ---------------------------------------------------------------------------

/// `substr(s, start[, length])`. Negative start counts from the end of the
/// string; a negative or omitted length means "to end of string".
fn f_substr(args: &[Value]) -> Option<Value> {
    if args.len() != 2 && args.len() != 3 {
        return None;
    }
    let text = args[0].to_text();
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len() as i64;

    let start = num(&args[1])?.trunc() as i64;
    let mut start_idx = if start < 0 { len + start } else { start };
    start_idx = start_idx.clamp(0, len);

    let end_idx = match args.get(2) {
        Some(v) => {
            let length = num(v)?.trunc() as i64;
            if length < 0 {
                len
            } else {
                (start_idx + length).min(len)
            }
        }
        None => len,
    };

    let sub: String = chars[start_idx as usize..end_idx as usize].iter().collect();
    Some(Value::Str(sub))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Option<Value> {
        FuncRegistry::standard().get(name)?(args)
    }

    #[test]
    fn numeric_helpers() {
        assert_eq!(
            call("abs", &[Value::Number(-3.0)]),
            Some(Value::Number(3.0))
        );
        assert_eq!(
            call("min", &[Value::Number(4.0), Value::Number(2.0)]),
            Some(Value::Number(2.0))
        );
        assert_eq!(
            call("max", &[Value::Number(4.0), Value::Number(2.0)]),
            Some(Value::Number(4.0))
        );
        assert_eq!(
            call("int", &[Value::Number(3.9)]),
            Some(Value::Number(3.0))
        );
        assert_eq!(
            call("float", &[Value::Str("30".to_string())]),
            Some(Value::Number(30.0))
        );
        assert_eq!(
            call("round", &[Value::Number(2.567), Value::Number(2.0)]),
            Some(Value::Number(2.57))
        );
        assert_eq!(
            call("len", &[Value::Str("abcd".to_string())]),
            Some(Value::Number(4.0))
        );
    }

    #[test]
    fn hr_bytime_scales_to_smallest_period() {
        assert_eq!(
            call("hr_bytime", &[Value::Number(12.0)]),
            Some(Value::Str("12 per second".to_string()))
        );
        assert_eq!(
            call("hr_bytime", &[Value::Number(0.05)]),
            Some(Value::Str("3 per minute".to_string()))
        );
        assert_eq!(
            call("hr_bytime", &[Value::Number(0.0005)]),
            Some(Value::Str("1.8 per hour".to_string()))
        );
    }

    #[test]
    fn hr_bytes_uses_1024_scaling() {
        assert_eq!(
            call("hr_bytes", &[Value::Number(512.0)]),
            Some(Value::Str("512 bytes".to_string()))
        );
        assert_eq!(
            call("hr_bytes", &[Value::Number(1536.0)]),
            Some(Value::Str("1.5 Kb".to_string()))
        );
        assert_eq!(
            call("hr_bytes", &[Value::Number(3.0 * 1048576.0)]),
            Some(Value::Str("3.0 Mb".to_string()))
        );
    }

    #[test]
    fn hr_num_uses_1000_scaling() {
        assert_eq!(
            call("hr_num", &[Value::Number(999.0)]),
            Some(Value::Str("999".to_string()))
        );
        assert_eq!(
            call("hr_num", &[Value::Number(1500000.0)]),
            Some(Value::Str("1 Million".to_string()))
        );
    }

    #[test]
    fn pretty_uptime_formats_components() {
        assert_eq!(
            call("pretty_uptime", &[Value::Number(90061.0)]),
            Some(Value::Str("1d 1h 1m 1s".to_string()))
        );
        assert_eq!(
            call("pretty_uptime", &[Value::Number(59.0)]),
            Some(Value::Str("59s".to_string()))
        );
        assert_eq!(
            call("pretty_uptime", &[Value::Number(3725.0)]),
            Some(Value::Str("1h 2m 5s".to_string()))
        );
    }

    #[test]
    fn substr_with_and_without_length() {
        let s = Value::Str("abcdef".to_string());
        assert_eq!(
            call("substr", &[s.clone(), Value::Number(2.0)]),
            Some(Value::Str("cdef".to_string()))
        );
        assert_eq!(
            call("substr", &[s.clone(), Value::Number(1.0), Value::Number(3.0)]),
            Some(Value::Str("bcd".to_string()))
        );
        // Negative length means "to end".
        assert_eq!(
            call("substr", &[s.clone(), Value::Number(1.0), Value::Number(-1.0)]),
            Some(Value::Str("bcdef".to_string()))
        );
        // Negative start counts from the end.
        assert_eq!(
            call("substr", &[s, Value::Number(-2.0)]),
            Some(Value::Str("ef".to_string()))
        );
    }

    #[test]
    fn unknown_name_does_not_resolve() {
        assert!(FuncRegistry::standard().get("open").is_none());
        assert!(FuncRegistry::standard().get("eval").is_none());
    }
}
