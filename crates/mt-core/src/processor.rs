//! Sequential rule processing.
//!
//! Drives the line-by-line pass over the rule file: category tracking,
//! per-rule substitution + evaluation, metric-line formatting, and
//! recommendation collection. The processor is I/O-free: it consumes the
//! ordered line sequence and returns the ordered output lines; the caller
//! prints them.

use log::debug;
use regex::Regex;

use mt_lang::{compile_condition, parse_expression};

use crate::eval::{EvalContext, eval_expr};
use crate::funcs::FuncRegistry;
use crate::subst::substitute;
use crate::value::{Value, VariableTable, round_display};

/// Field separator of a rule line:
/// `label ||| condition ||| expression ||| recommendation`.
pub const RULE_DELIMITER: &str = "|||";

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    Csv,
}

pub struct RuleProcessor {
    vars: VariableTable,
    mode: OutputMode,
    recommend: bool,
    funcs: FuncRegistry,
    category_re: Regex,
}

impl RuleProcessor {
    pub fn new(vars: VariableTable, mode: OutputMode, recommend: bool) -> Self {
        Self {
            vars,
            mode,
            recommend,
            funcs: FuncRegistry::standard(),
            // Header lines look like `# Category: Memory`.
            category_re: Regex::new(r"(?i)^\s*#\s*Category\s*:\s*(.+?)\s*$")
                .expect("category header pattern is valid"),
        }
    }

    /// Process all rule-file lines, returning the output lines in order
    /// (blank lines are empty strings).
    pub fn run(&self, lines: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut current_category = String::new();
        let mut recommendations: Vec<(String, String)> = Vec::new();

        for line in lines {
            if line.trim().is_empty() {
                continue;
            }

            if line.trim_start().starts_with('#') {
                // A comment line carrying the rule delimiter is a disabled
                // rule, never a category header.
                if !line.contains(RULE_DELIMITER) {
                    self.handle_category(line, &mut current_category, &mut out);
                }
                continue;
            }

            let fields: Vec<&str> = line.split(RULE_DELIMITER).collect();
            if fields.len() != 4 {
                debug!("skipping malformed rule line: {line}");
                continue;
            }
            let label = fields[0].trim();
            let condition = fields[1].trim();
            let expression = fields[2].trim();
            let recommendation = fields[3].trim();

            let value = self.derive_value(expression);
            let metric_line = match self.mode {
                OutputMode::Csv => format!("{label},{}", value.render_raw()),
                OutputMode::Pretty => {
                    format!("{label}: {}", round_display(&value, expression).render_pretty())
                }
            };
            out.push(metric_line.clone());

            if !condition.is_empty() && self.condition_met(condition, &value) {
                debug!("{label} matches {condition}");
                recommendations.push((metric_line, recommendation.to_string()));
            }
        }

        if self.recommend && !recommendations.is_empty() {
            self.emit_recommendations(&recommendations, &mut out);
        }

        out
    }

    /// Category headers change the active category only when the named
    /// category differs from the current one; repeats are silent.
    fn handle_category(&self, line: &str, current: &mut String, out: &mut Vec<String>) {
        let Some(caps) = self.category_re.captures(line) else {
            return;
        };
        let name = &caps[1];
        if name.is_empty() || name == current {
            return;
        }
        *current = name.to_string();
        match self.mode {
            OutputMode::Csv => out.push(format!("Category,{name}")),
            OutputMode::Pretty => {
                out.push(String::new());
                out.push(name.to_string());
            }
        }
    }

    /// Substitute and evaluate a rule's expression field. Failure at either
    /// step falls back to the post-substitution text verbatim.
    fn derive_value(&self, expression: &str) -> Value {
        let substituted = substitute(expression, &self.vars);
        debug!("expr after substitution: {substituted}");

        let derived = parse_expression(&substituted)
            .ok()
            .and_then(|ast| eval_expr(&ast, &EvalContext::empty(), &self.funcs));
        match derived {
            Some(value) => {
                debug!("expr evaluates to {value:?}");
                value
            }
            None => Value::Str(substituted),
        }
    }

    /// Compile and evaluate a condition against the derived value. Any
    /// compile or evaluation failure means "condition not met".
    fn condition_met(&self, condition: &str, value: &Value) -> bool {
        let Some(ast) = compile_condition(condition) else {
            return false;
        };
        let ctx = EvalContext::with_value(value.clone());
        eval_expr(&ast, &ctx, &self.funcs)
            .map(|v| v.is_truthy())
            .unwrap_or(false)
    }

    fn emit_recommendations(&self, pairs: &[(String, String)], out: &mut Vec<String>) {
        out.push(String::new());
        out.push(String::new());
        out.push("RECOMMENDATIONS:".to_string());
        for (metric_line, text) in pairs {
            match self.mode {
                OutputMode::Csv => {
                    out.push(metric_line.clone());
                    out.push(format!("Recommendation,{text}"));
                }
                OutputMode::Pretty => {
                    out.push(format!("{ANSI_BOLD}{metric_line}{ANSI_RESET}"));
                    out.push(text.clone());
                    out.push(String::new());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
