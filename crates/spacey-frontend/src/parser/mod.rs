//! Backtracking recursive-descent parser for ECMAScript 5.
//!
//! The parser reads characters straight from a [`Cursor`](crate::lexer::Cursor);
//! there is no separate token stream. Each grammar rule either matches and
//! advances past the construct and any whitespace after it, or fails and
//! leaves the cursor where it started. Matched constructs are handed to the
//! [`Factory`](crate::ir::Factory) as they are recognized, so the result of a
//! parse is IR rather than a syntax tree.
//!
//! ## Rule results
//!
//! Rules return [`Rule<T>`], a `Result<Option<T>>`:
//!
//! - `Ok(Some(value))` - the rule matched
//! - `Ok(None)` - the rule did not match; the caller may try an alternative
//! - `Err(error)` - the rule committed and then failed; the whole parse fails
//!
//! ## Structure
//!
//! - `parser` - parser state, programs, functions and directive prologues
//! - `statements` - statement rules
//! - `expressions` - expression rules, from primaries up to the comma operator
//! - `terminals` - keywords, punctuators, literals and automatic semicolons
//!
//! ## Usage
//!
//! ```rust
//! use spacey_frontend::parser::Parser;
//!
//! let program = Parser::new("var x = 1 + 2;").parse_script().unwrap();
//! assert_eq!(program.functions.len(), 1);
//! ```

#[allow(clippy::module_inception)]
mod parser;

mod expressions;
mod statements;
mod terminals;

pub use parser::{Parser, Rule};
