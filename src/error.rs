//! Typed error surfaces for the lex/parse/execute pipeline.
//!
//! Each stage gets its own `thiserror`-derived enum, unified by
//! [`PostScriptError`] for the top-level
//! [`crate::engine::Interpreter::run`] signature.

use thiserror::Error;

/// Failures raised while turning source text into tokens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerError {
    #[error("unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
}

/// Failures raised while turning a token stream into parsed objects.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParserError {
    #[error("unterminated procedure starting at line {line}, column {column}")]
    UnterminatedProcedure { line: usize, column: usize },

    #[error("unterminated array starting at line {line}, column {column}")]
    UnterminatedArray { line: usize, column: usize },

    #[error("unexpected '}}' at line {line}, column {column}")]
    StrayRBrace { line: usize, column: usize },

    #[error("unexpected ']' at line {line}, column {column}")]
    StrayRBracket { line: usize, column: usize },
}

/// Failures raised during execution: stack underflow, type mismatch,
/// divide-by-zero, undefined names, and the like. Each variant names the
/// operator and the condition that failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpreterError {
    #[error("{op}: stack underflow")]
    StackUnderflow { op: &'static str },

    #[error("{op}: type check error, expected {expected}")]
    TypeCheck { op: &'static str, expected: &'static str },

    #[error("{op}: division by zero")]
    DivideByZero { op: &'static str },

    #[error("{op}: range check error")]
    RangeCheck { op: &'static str },

    #[error("{op}: invalid negative size")]
    NegativeSize { op: &'static str },

    #[error("undefined name: {name}")]
    Undefined { name: String },

    #[error("{op}: dictionary stack underflow")]
    DictStackUnderflow { op: &'static str },

    #[error("{op}: no matching mark on the stack")]
    MarkNotFound { op: &'static str },
}

/// Top-level error returned by [`crate::engine::Interpreter::run`].
///
/// `stop`/`stopped` are deliberately absent here: they are non-local
/// control transfers inside the language, never fatal host-visible errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PostScriptError {
    #[error(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Interpreter(#[from] InterpreterError),
}

pub type Result<T, E = PostScriptError> = std::result::Result<T, E>;
