// ABOUTME: Error types for the tokenizer, parser, and evaluator

use crate::token::TokenKind;
use crate::value::Value;
use thiserror::Error;

/// Failures raised while scanning source text into tokens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("integer literal followed directly by a letter")]
    IntegerFollowedByLetter,
}

/// Failures raised while building the AST from a token stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token {found:?}, expected {expected}")]
    UnexpectedToken { found: TokenKind, expected: String },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("trailing tokens after top-level expression")]
    TrailingTokens,

    #[error("parameter {0} has the same name as its enclosing function")]
    ParamShadowsFunctionName(String),
}

/// Failures raised while walking the AST. Covers the TypeError, NameError,
/// BindError, ArityError, and KeyError categories of the taxonomy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{context}: expected {expected}, got {actual}")]
    TypeError {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("undefined name: {0}")]
    NameError(String),

    #[error("{0}")]
    BindError(String),

    #[error("too many arguments: closure takes {expected}, got {actual}")]
    ArityError { expected: usize, actual: usize },

    #[error("{0}")]
    KeyError(String),
}

impl EvalError {
    /// Build a TypeError with the offending value's runtime type name filled in.
    pub fn type_error(
        context: impl Into<String>,
        expected: impl Into<String>,
        actual: &Value,
    ) -> Self {
        EvalError::TypeError {
            context: context.into(),
            expected: expected.into(),
            actual: actual.type_name().to_string(),
        }
    }
}

/// The top-level failure returned by the driver entry point (§6).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpretError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("eval error: {0}")]
    Eval(#[from] EvalError),
}
