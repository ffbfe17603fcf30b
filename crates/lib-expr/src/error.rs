//! Error types for expression parsing and evaluation.

use thiserror::Error;

/// Errors that can occur while parsing or interpreting an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The text is empty or only whitespace.
    #[error("Empty expression")]
    Empty,

    /// Syntax error in the expression text.
    #[error("Syntax error at column {column}: {message}")]
    Syntax { column: usize, message: String },

    /// An identifier that is neither the free variable nor a known constant.
    #[error("Unknown identifier '{name}' (expected '{expected}' or a constant)")]
    UnknownIdentifier { name: String, expected: &'static str },

    /// A function name that the interpretation does not support.
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    /// A function called with the wrong number of arguments.
    #[error("Function '{name}' takes {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    /// A power whose exponent is not an integer constant.
    #[error("Invalid exponent: {0}")]
    InvalidExponent(String),

    /// Division by a polynomial that is identically zero.
    #[error("Division by zero polynomial")]
    DivisionByZero,
}

impl ParseError {
    /// Create a syntax error at a byte offset into the original text.
    pub fn syntax(column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            column,
            message: message.into(),
        }
    }
}

/// Result type for expression operations.
pub type ParseResult<T> = Result<T, ParseError>;
