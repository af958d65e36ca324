//! Unified error type for every stage of the assembly pipeline.
//!
//! Each variant carries the 1-based source line that was active when the
//! failure occurred. The lexer and parser track that line themselves; the
//! code generator keeps its own tracker and wraps evaluator failures via
//! [`EvalError::at`].

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AsmError {
    // Lexical errors
    #[error("line {line}: unexpected character `{ch}`")]
    UnexpectedChar { ch: char, line: usize },

    #[error("line {line}: `#` must be followed by a directive name")]
    UnterminatedToken { line: usize },

    #[error("line {line}: unknown directive `#{name}`")]
    UnknownDirective { name: String, line: usize },

    #[error("line {line}: numeric literal out of range")]
    LiteralOverflow { line: usize },

    // Syntax errors
    #[error("line {line}: unexpected {found}")]
    UnexpectedToken { found: String, line: usize },

    #[error("line {line}: `{name}` expects {expected} argument(s), got {got}")]
    WrongArgCount {
        name: &'static str,
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("line {line}: directive argument must be an integer literal")]
    NonLiteralArg { line: usize },

    #[error("line {line}: `#TIMES` needs an expression after it to repeat")]
    MissingRepeatTarget { line: usize },

    // Generation errors
    #[error("line {line}: write at address {addr} exceeds memory size {cap}")]
    Capacity { addr: usize, cap: usize, line: usize },

    #[error("line {line}: undefined label `{name}`")]
    UndefinedLabel { name: String, line: usize },

    #[error("line {line}: operand value {value} does not fit in the word")]
    OperandRange { value: i64, line: usize },

    #[error("line {line}: malformed operand expression: {reason}")]
    Arithmetic { reason: String, line: usize },
}

/// Failures internal to the expression evaluator. The evaluator never sees
/// source positions; the code generator attaches the recorded line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("undefined label `{0}`")]
    UndefinedLabel(String),

    #[error("{0}")]
    Grammar(String),
}

impl EvalError {
    /// Wraps the evaluator failure with the source line it came from.
    pub fn at(self, line: usize) -> AsmError {
        match self {
            EvalError::UndefinedLabel(name) => AsmError::UndefinedLabel { name, line },
            EvalError::Grammar(reason) => AsmError::Arithmetic { reason, line },
        }
    }
}
