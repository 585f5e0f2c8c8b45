// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Spacey - command-line front end for the Spacey ECMAScript 5 parser.
//!
//! ## Commands
//!
//! - `spacey parse <FILE> [--summary]` - parse a script and print its IR
//! - `spacey eval-number <TEXT>` - string to number conversion
//! - `spacey regex <BODY>` - validate a regular-expression body
//! - `spacey repl` - interactive loop, the default

mod repl;

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use spacey_frontend::{Program, SyntaxError, ir, parse_number, parse_regular_expression, parse_script};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Log filter used unless `RUST_LOG` is set.
const DEFAULT_FILTER: &str = "spacey=info,spacey_frontend=warn";
const VERBOSE_FILTER: &str = "spacey=debug,spacey_frontend=debug";

#[derive(Debug, Parser)]
#[command(name = "spacey", version, about = "Parse ECMAScript 5 into Spacey IR")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a script and print its IR
    Parse {
        /// Script to parse
        file: PathBuf,
        /// Print counts instead of the full IR
        #[arg(long)]
        summary: bool,
    },
    /// Convert text to a number the way ToNumber does
    EvalNumber {
        /// Text to convert
        text: String,
    },
    /// Validate a regular-expression body
    Regex {
        /// Pattern text between the slashes
        body: String,
    },
    /// Start the interactive loop
    Repl,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command.unwrap_or(Command::Repl)) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}: {err:#}", "Error".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Parse { file, summary } => {
            debug!(path = %file.display(), "parsing file");
            let source =
                fs::read_to_string(&file).with_context(|| format!("failed to read {}", file.display()))?;
            Ok(print_parse(&source, summary))
        }
        Command::EvalNumber { text } => {
            println!("{}", parse_number(&text));
            Ok(ExitCode::SUCCESS)
        }
        Command::Regex { body } => match parse_regular_expression(&body) {
            Ok(pattern) => {
                println!("/{pattern}/");
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                print_syntax_error(&body, &err);
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Repl => {
            let mut repl = repl::Repl::new().context("failed to initialize the REPL")?;
            repl.run()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Parses `source` and prints its IR dump or summary.
pub(crate) fn print_parse(source: &str, summary: bool) -> ExitCode {
    match parse_script(source) {
        Ok(program) => {
            if summary {
                print!("{}", summarize(&program));
            } else {
                print!("{}", ir::dump::dump(&program));
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_syntax_error(source, &err);
            ExitCode::FAILURE
        }
    }
}

/// Prints `SyntaxError: message (line:column)` and the context excerpt.
pub(crate) fn print_syntax_error(source: &str, error: &SyntaxError) {
    let (line, column) = error.line_column(source);
    eprintln!(
        "{}: {} {}",
        "SyntaxError".red().bold(),
        error.message,
        format!("({line}:{column})").dimmed()
    );
    eprintln!("    {}", error.context.yellow());
}

/// Counts of functions, scopes, nodes and symbols.
pub(crate) fn summarize(program: &Program) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "functions: {}", program.functions.len());
    let _ = writeln!(out, "scopes:    {}", program.scopes.scope_count());
    let _ = writeln!(out, "nodes:     {}", program.graph.len());
    let _ = writeln!(out, "symbols:   {}", program.scopes.symbol_count());
    for (id, function) in program.functions() {
        let name = match function.name {
            Some(symbol) => program.scopes.symbol(symbol).name.as_str(),
            None if id == program.root => "<program>",
            None => "<anonymous>",
        };
        let symbols = program.scopes.scope(function.scope).symbols().len();
        let _ = writeln!(out, "  #{} {name}: {symbols} symbols", id.index());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["spacey", "parse", "a.js", "--summary"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Parse { summary: true, .. })));

        let cli = Cli::try_parse_from(["spacey", "-v", "eval-number", "0x10"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Command::EvalNumber { ref text }) if text == "0x10"));

        let cli = Cli::try_parse_from(["spacey"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_summarize() {
        let program = parse_script("function f(a) { var b; } var g = function () {};").unwrap();
        let text = summarize(&program);
        assert!(text.starts_with("functions: 3\n"), "{text}");
        assert!(text.contains(" f: "), "{text}");
        assert!(text.contains("<anonymous>"), "{text}");
        assert!(text.contains("<program>"), "{text}");
    }
}
