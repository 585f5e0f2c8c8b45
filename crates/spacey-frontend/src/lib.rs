// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-frontend
//!
//! The front end of the Spacey JavaScript engine: an ECMAScript 5 parser
//! that builds a typed, single-user IR graph ready for a code generator.
//!
//! ## Overview
//!
//! - [`lexer`] - cursor, whitespace and comments, literal scanners
//! - [`scope`] - scope and symbol arena, hoisting, free-symbol resolution
//! - [`parser`] - backtracking recursive-descent grammar
//! - [`ir`] - node graph, factory, visitor and passes
//! - [`error`] - syntax errors
//!
//! ## Quick Start
//!
//! ```rust
//! use spacey_frontend::{ir, parse_number, parse_script};
//!
//! let program = parse_script("var x = 1 + 2;").unwrap();
//! println!("{}", ir::dump::dump(&program));
//!
//! assert_eq!(parse_number(" 42 ").as_f64(), 42.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod scope;

pub use error::{Result, SyntaxError};
pub use ir::{NodeId, NodeKind, Program};
pub use lexer::NumericValue;
pub use parser::Parser;

use tracing::debug;

/// Parses `source` as a script.
///
/// All or nothing: the first syntax error aborts the parse and no IR is
/// returned.
pub fn parse_script(source: &str) -> Result<Program> {
    check_encoding(source);
    debug!(len = source.len(), "parsing script");
    let program = Parser::new(source).parse_script()?;
    debug!(
        nodes = program.graph.len(),
        functions = program.functions.len(),
        "parsed script"
    );

    #[cfg(debug_assertions)]
    for violation in ir::verify::verify(&program) {
        tracing::warn!(%violation, "single-user violation");
    }

    Ok(program)
}

/// Converts a string to a number the way `ToNumber` does.
///
/// Never fails: `""` and whitespace give `+0`, anything that is not a
/// complete `StringNumericLiteral` gives `NaN`.
pub fn parse_number(source: &str) -> NumericValue {
    let value = Parser::new(source).parse_number();
    debug!(%value, "parsed number");
    value
}

/// Validates a regular-expression body and returns its pattern text.
pub fn parse_regular_expression(source: &str) -> Result<String> {
    debug!(len = source.len(), "parsing regular expression");
    Parser::new(source).parse_regular_expression()
}

/// Parses independent scripts in parallel, one parser per script.
///
/// Results come back in input order.
#[cfg(feature = "parallel")]
pub fn parse_scripts(sources: &[&str]) -> Vec<Result<Program>> {
    use rayon::prelude::*;

    sources.par_iter().map(|source| parse_script(source)).collect()
}

/// A NUL in the first two characters usually means UTF-16 text decoded as
/// UTF-8.
fn check_encoding(source: &str) {
    if source.chars().take(2).any(|c| c == '\0') {
        debug!("source starts with NUL; it may be UTF-16 read as UTF-8");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_entry_point() {
        let program = parse_script("var a = 1; function f() { return a; }").unwrap();
        assert_eq!(program.functions.len(), 2);
    }

    #[test]
    fn test_parse_script_error_has_position() {
        let source = "var a = 1;\nvar = 2;";
        let err = parse_script(source).unwrap_err();
        assert_eq!(err.line_column(source), (2, 5));
    }

    #[test]
    fn test_parse_number_fallbacks() {
        assert_eq!(parse_number("   42   "), NumericValue::Int(42));
        assert_eq!(parse_number(""), NumericValue::Int(0));
        assert!(parse_number("12abc").is_nan());
        assert_eq!(parse_number("+Infinity"), NumericValue::Double(f64::INFINITY));
        assert_eq!(parse_number("0x1F"), NumericValue::Int(31));
    }

    #[test]
    fn test_parse_regular_expression() {
        assert_eq!(parse_regular_expression("[/]\\/").unwrap(), "[/]\\/");
        assert!(parse_regular_expression("*").is_err());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parse_scripts_keeps_order() {
        let results = parse_scripts(&["a;", "(", "function f() {}"]);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().functions.len(), 2);
    }
}
