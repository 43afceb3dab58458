// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BinOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// The name a compiled condition uses to refer to the rule's derived value.
pub const VALUE_ALIAS: &str = "v";

/// Legacy spelling of [`VALUE_ALIAS`]; both resolve to the same binding.
pub const VALUE_ALIAS_LEGACY: &str = "_";

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Expr {
    /// Number literal (integer or float, optional exponent).
    Number(f64),
    /// String literal.
    StringLit(String),
    /// Boolean literal.
    Bool(bool),
    /// Bare identifier. Only the value alias resolves at evaluation time;
    /// any other name is an evaluation failure.
    Ident(String),
    /// Binary operation.
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary arithmetic negation.
    Neg(Box<Expr>),
    /// Logical negation: `!expr` or `not expr`.
    Not(Box<Expr>),
    /// Function call from the built-in registry: `name(args...)`.
    FuncCall { name: String, args: Vec<Expr> },
    /// Method-style call on the string form of a value: `target.name(args...)`.
    MethodCall {
        target: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    /// String indexing `s[i]` or slicing `s[a:b]` (either bound optional).
    Index {
        target: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
        slice: bool,
    },
    /// Regex search against the string form of `target`, produced by the
    /// condition compiler for `=~` / `!~` legacy syntax.
    RegexMatch {
        target: Box<Expr>,
        pattern: String,
        case_insensitive: bool,
        negated: bool,
    },
}
