// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive loop: every entry is parsed as a script and its IR printed.

use std::fs;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use tracing::{debug, warn};

const HISTORY_FILE: &str = ".spacey_history";
const MAX_HISTORY_SIZE: usize = 1000;

/// ES5 reserved words plus the REPL commands, offered for completion.
const WORDS: &[&str] = &[
    "break",
    "case",
    "catch",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "in",
    "instanceof",
    "new",
    "null",
    "return",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
    ".help",
    ".exit",
    ".clear",
    ".load",
    ".summary",
];

/// Dot-prefixed REPL commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Load,
    Summary,
}

impl ReplCommand {
    /// Splits `.name arg` into a command and its optional argument.
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let rest = input.trim().strip_prefix('.')?;
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next()?.to_lowercase();
        let arg = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

        let command = match name.as_str() {
            "help" | "h" | "?" => ReplCommand::Help,
            "exit" | "quit" | "q" => ReplCommand::Exit,
            "clear" | "cls" => ReplCommand::Clear,
            "load" | "l" => ReplCommand::Load,
            "summary" | "s" => ReplCommand::Summary,
            _ => return None,
        };
        Some((command, arg))
    }

    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".help", "Show this help message"),
            (".exit", "Exit the REPL"),
            (".clear", "Clear the screen"),
            (".load <file>", "Parse a file and print its IR"),
            (".summary", "Toggle between full IR and counts"),
        ]
    }
}

/// Completion, hints and multi-line validation for the editor.
struct SpaceyHelper;

/// Start of the word ending at `pos`.
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != '.')
        .map_or(0, |i| i + 1)
}

impl Completer for SpaceyHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[word_start(line, pos)..pos];
        if word.is_empty() {
            return Ok((pos, Vec::new()));
        }

        let matches = WORDS
            .iter()
            .filter(|candidate| candidate.starts_with(word))
            .map(|candidate| Pair {
                display: candidate.to_string(),
                replacement: candidate[word.len()..].to_string(),
            })
            .collect();
        Ok((pos, matches))
    }
}

impl Hinter for SpaceyHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let word = &line[word_start(line, pos)..];
        if word.len() < 2 {
            return None;
        }
        WORDS
            .iter()
            .find(|candidate| candidate.starts_with(word) && candidate.len() > word.len())
            .map(|candidate| (&candidate[word.len()..]).dimmed().to_string())
    }
}

impl Highlighter for SpaceyHelper {}

impl Validator for SpaceyHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        if input.trim_start().starts_with('.') {
            return Ok(ValidationResult::Valid(None));
        }
        if !is_balanced(input) {
            return Ok(ValidationResult::Incomplete);
        }

        let trimmed = input.trim_end();
        if trimmed.ends_with(['\\', '+', '-', '*', '=', ',', '{', '(', '[']) {
            return Ok(ValidationResult::Incomplete);
        }
        Ok(ValidationResult::Valid(None))
    }
}

impl Helper for SpaceyHelper {}

/// Whether brackets are closed outside of strings and comments.
///
/// A mismatched closer counts as balanced so the parser can report it.
fn is_balanced(input: &str) -> bool {
    let mut stack = Vec::new();
    let mut quote = None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(open) = quote {
            match c {
                '\\' => {
                    chars.next();
                }
                _ if c == open => quote = None,
                _ => {}
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '/' if chars.peek() == Some(&'/') => {
                while chars.next_if(|&next| next != '\n').is_some() {}
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                let mut closed = false;
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        closed = true;
                        break;
                    }
                    previous = next;
                }
                if !closed {
                    return false;
                }
            }
            '(' => stack.push(')'),
            '[' => stack.push(']'),
            '{' => stack.push('}'),
            ')' | ']' | '}' => {
                if stack.pop() != Some(c) {
                    return true;
                }
            }
            _ => {}
        }
    }

    stack.is_empty() && quote.is_none()
}

enum CommandResult {
    Continue,
    Exit,
}

/// The interactive parser loop.
pub struct Repl {
    editor: Editor<SpaceyHelper, DefaultHistory>,
    history_path: PathBuf,
    summary: bool,
}

impl Repl {
    pub fn new() -> rustyline::Result<Self> {
        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(SpaceyHelper));

        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spacey")
            .join(HISTORY_FILE);
        if let Some(parent) = history_path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), %err, "cannot create history directory");
            }
        }
        if editor.load_history(&history_path).is_err() {
            debug!(path = %history_path.display(), "no history loaded");
        }

        Ok(Self {
            editor,
            history_path,
            summary: false,
        })
    }

    pub fn run(&mut self) -> rustyline::Result<()> {
        print_banner();
        let prompt = format!("{} ", "spacey>".bright_green().bold());

        loop {
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Some((command, arg)) = ReplCommand::parse(trimmed) {
                        match self.execute_command(command, arg) {
                            CommandResult::Continue => continue,
                            CommandResult::Exit => break,
                        }
                    }
                    crate::print_parse(&line, self.summary);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {err:?}", "Error".red().bold());
                    break;
                }
            }
        }

        if let Err(err) = self.editor.save_history(&self.history_path) {
            warn!(path = %self.history_path.display(), %err, "cannot save history");
        }
        println!();
        Ok(())
    }

    fn execute_command(&mut self, command: ReplCommand, arg: Option<&str>) -> CommandResult {
        match command {
            ReplCommand::Help => print_help(),
            ReplCommand::Exit => return CommandResult::Exit,
            ReplCommand::Clear => print!("\x1B[2J\x1B[H"),
            ReplCommand::Load => match arg {
                Some(path) => match fs::read_to_string(path) {
                    Ok(source) => {
                        crate::print_parse(&source, self.summary);
                    }
                    Err(err) => eprintln!("{}: {path}: {err}", "Error".red().bold()),
                },
                None => eprintln!("{}: {} requires a file path", "Error".red().bold(), ".load".cyan()),
            },
            ReplCommand::Summary => {
                self.summary = !self.summary;
                let mode = if self.summary { "summary" } else { "full IR" };
                println!("{} {}", "Printing".dimmed(), mode.cyan());
            }
        }
        CommandResult::Continue
    }
}

fn print_banner() {
    println!();
    println!(
        "  {} {} {}",
        "Spacey ES5 parser".white().bold(),
        "v".dimmed(),
        env!("CARGO_PKG_VERSION").bright_yellow()
    );
    println!("  {} {} {}", "Type".dimmed(), ".help".cyan(), "for available commands".dimmed());
    println!();
}

fn print_help() {
    println!();
    println!("{}", "REPL Commands:".white().bold());
    println!();
    for (command, description) in ReplCommand::all_commands() {
        println!("  {:16} {}", command.cyan(), description.dimmed());
    }
    println!();
    println!("  {}", "Anything else is parsed as a script.".dimmed());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_command_parse() {
        assert!(matches!(ReplCommand::parse(".help"), Some((ReplCommand::Help, None))));
        assert!(matches!(ReplCommand::parse(".exit"), Some((ReplCommand::Exit, None))));
        assert!(matches!(ReplCommand::parse(".summary"), Some((ReplCommand::Summary, None))));
        assert!(matches!(
            ReplCommand::parse(".load  test.js "),
            Some((ReplCommand::Load, Some("test.js")))
        ));
        assert!(ReplCommand::parse(".load").is_some_and(|(_, arg)| arg.is_none()));
        assert!(ReplCommand::parse("not a command").is_none());
        assert!(ReplCommand::parse(".version").is_none());
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("(1 + 2)"));
        assert!(is_balanced("{ a: 1 }"));
        assert!(is_balanced("function () { return 1; }"));
        assert!(!is_balanced("(1 + 2"));
        assert!(!is_balanced("{ a: 1"));
        assert!(is_balanced("'string with (unbalanced'"));
        assert!(is_balanced("a; // (comment"));
        assert!(!is_balanced("a; /* open"));
        assert!(is_balanced("a /* { */ ;"));
        assert!(!is_balanced("'open string"));
    }

    #[test]
    fn test_word_start() {
        assert_eq!(word_start("var fu", 6), 4);
        assert_eq!(word_start(".sum", 4), 0);
        assert_eq!(word_start("", 0), 0);
    }
}
