//! Lexical scanning for JavaScript source code.
//!
//! There is no token stream. The parser drives a [`Cursor`] directly and asks
//! for a specific terminal at the current position; a match advances the
//! cursor, a failed multi-step match is undone by restoring a [`Checkpoint`].
//!
//! ## Structure
//!
//! - `cursor.rs` - `Cursor`, checkpoints, whitespace and comment consumer
//! - `chars.rs` - character classes and reserved words
//! - `literals.rs` - numeric, string and identifier literals
//! - `regex.rs` - regular-expression bodies and flags
//!
//! ## Usage
//!
//! ```rust
//! use spacey_frontend::lexer::{Cursor, NumericValue};
//!
//! let mut cursor = Cursor::new("  42 // answer\n");
//! cursor.skip_whitespace().unwrap();
//!
//! let value = cursor.scan_numeric_literal(false).unwrap();
//! assert_eq!(value, Some(NumericValue::Int(42)));
//!
//! cursor.skip_whitespace().unwrap();
//! assert!(cursor.line_break());
//! assert!(cursor.is_eof());
//! ```

pub mod chars;
mod cursor;
pub mod literals;
pub mod regex;

pub use cursor::{Checkpoint, Cursor};
pub use literals::NumericValue;
pub use regex::BodyEnd;
