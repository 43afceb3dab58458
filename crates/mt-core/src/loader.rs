//! File loading for rule files and variable snapshots.
//!
//! Variable snapshots are the `SHOW STATUS` / `SHOW VARIABLES` style dumps:
//! one `Name<whitespace>value` pair per line. Several snapshot files can be
//! combined into one table; later files win on name collisions.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;
use orion_error::StructError;
use regex::Regex;

use crate::error::{CoreResult, TunerReason};
use crate::value::{Value, VariableTable};

/// Read a rule file as ordered lines. The file is decoded lossily so a
/// stray non-UTF-8 byte cannot abort a run.
pub fn load_rule_lines(path: &Path) -> CoreResult<Vec<String>> {
    let raw = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return StructError::from(TunerReason::RuleFile)
                .with_detail(format!("cannot read rule file {}: {e}", path.display()))
                .err();
        }
    };
    let text = String::from_utf8_lossy(&raw);
    Ok(text.lines().map(str::to_string).collect())
}

/// Load a comma-separated list of variable snapshot files into one table.
pub fn load_variable_files(filelist: &str) -> CoreResult<VariableTable> {
    let mut vars: VariableTable = HashMap::new();
    // `Name   value`; the value part may be empty or contain spaces.
    let kv_re = match Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*(.*)$") {
        Ok(re) => re,
        Err(e) => {
            return StructError::from(TunerReason::VarSource)
                .with_detail(format!("variable line pattern failed to compile: {e}"))
                .err();
        }
    };

    for name in filelist.split(',') {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let path = Path::new(name);
        let text = match fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                return StructError::from(TunerReason::VarSource)
                    .with_detail(format!("cannot read variable file {}: {e}", path.display()))
                    .err();
            }
        };
        let before = vars.len();
        merge_variable_lines(&text, &kv_re, &mut vars);
        debug!(
            "loaded {} variables from {}",
            vars.len() - before,
            path.display()
        );
    }

    Ok(vars)
}

fn merge_variable_lines(text: &str, kv_re: &Regex, vars: &mut VariableTable) {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(caps) = kv_re.captures(line) {
            let name = caps[1].to_string();
            let value = caps[2].trim().to_string();
            vars.insert(name, Value::Str(value));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> VariableTable {
        let re = Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*(.*)$").unwrap();
        let mut vars = HashMap::new();
        merge_variable_lines(text, &re, &mut vars);
        vars
    }

    #[test]
    fn parses_name_value_pairs() {
        let vars = parse("Uptime\t30\nThreads_connected   12\n");
        assert_eq!(vars.get("Uptime"), Some(&Value::Str("30".to_string())));
        assert_eq!(
            vars.get("Threads_connected"),
            Some(&Value::Str("12".to_string()))
        );
    }

    #[test]
    fn value_may_be_empty_or_contain_spaces() {
        let vars = parse("init_file\nversion_comment MySQL Community Server (GPL)\n");
        assert_eq!(vars.get("init_file"), Some(&Value::Str(String::new())));
        assert_eq!(
            vars.get("version_comment"),
            Some(&Value::Str("MySQL Community Server (GPL)".to_string()))
        );
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let vars = parse("# dump header\n\nUptime 30\n");
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn later_lines_win_on_collision() {
        let vars = parse("Uptime 30\nUptime 60\n");
        assert_eq!(vars.get("Uptime"), Some(&Value::Str("60".to_string())));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_variable_files("/no/such/file.txt").is_err());
        assert!(load_rule_lines(Path::new("/no/such/rules.mt")).is_err());
    }
}
