pub mod ast;
mod condition;
pub mod parse_utils;
mod parser;

pub use condition::compile_condition;
pub use parser::parse_expression;
