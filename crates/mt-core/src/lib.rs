//! Core engine: values, substitution, evaluation, and rule processing.
//!
//! The pipeline per rule is substitution (`subst`), parsing (`mt-lang`),
//! evaluation (`eval` + `funcs`), then condition checking and output
//! formatting (`processor`). `loader` turns files into the inputs the
//! processor consumes.

pub mod error;
pub mod eval;
pub mod funcs;
pub mod loader;
pub mod processor;
pub mod subst;
pub mod value;

pub use error::{CoreError, CoreResult, TunerReason};
pub use eval::{EvalContext, eval_expr};
pub use funcs::FuncRegistry;
pub use loader::{load_rule_lines, load_variable_files};
pub use processor::{OutputMode, RuleProcessor};
pub use subst::substitute;
pub use value::{Value, VariableTable};
