//! A PostScript-family language interpreter.
//!
//! This library implements a stack-oriented, dynamically typed interpreter
//! in the PostScript tradition: source text is lexed into tokens, parsed
//! into a tree of literal and executable objects, and executed against an
//! operand stack and a dictionary stack.
//!
//! # Architecture
//!
//! - **value**: the object model (`Value`) — the tagged universe of
//!   Integer/Real/Boolean/String/Name/Array/Procedure/Dictionary/Mark/
//!   Operator/Null values, with reference semantics for composites.
//! - **lexer**: turns source text into a token stream.
//! - **parser**: turns tokens into a flat program of parsed objects,
//!   building procedure (`{ }`) and array (`[ ]`) literals structurally.
//! - **engine**: the two-stack execution engine (operand stack + dictionary
//!   stack) and the trampoline that drives loop constructs without
//!   growing the host call stack per iteration.
//! - **operators**: the ~60 primitive operators bound into the system
//!   dictionary at interpreter construction.
//! - **error**: typed `LexerError`/`ParserError`/`InterpreterError`,
//!   unified by `PostScriptError` for `Interpreter::run`.
//! - **config**: CLI-facing configuration (REPL prompt), loadable from TOML.
//!
//! # Example
//!
//! ```
//! use postscript_interpreter::engine::Interpreter;
//!
//! let mut interp = Interpreter::new(Box::new(Vec::new()));
//! interp.run("3 4 add").unwrap();
//! assert_eq!(interp.get_stack().last().unwrap().to_string(), "7");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod value;

pub use engine::Interpreter;
pub use error::PostScriptError;
pub use value::Value;
