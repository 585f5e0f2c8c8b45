//! Character classes and reserved words.

use unicode_xid::UnicodeXID;

/// Zero-width non-joiner.
pub const ZWNJ: char = '\u{200C}';
/// Zero-width joiner.
pub const ZWJ: char = '\u{200D}';

/// Returns true for `<LF>`, `<CR>`, `<LS>` and `<PS>`.
pub fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Returns true for ECMAScript `WhiteSpace`, excluding line terminators.
pub fn is_whitespace(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\u{000B}' | '\u{000C}' | ' ' | '\u{00A0}' | '\u{FEFF}'
    ) || is_space_separator(ch)
}

/// Unicode category Zs.
fn is_space_separator(ch: char) -> bool {
    matches!(
        ch,
        '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

/// Returns true if `ch` can start an identifier.
pub fn is_id_start(ch: char) -> bool {
    ch == '$' || ch == '_' || UnicodeXID::is_xid_start(ch)
}

/// Returns true if `ch` can continue an identifier.
pub fn is_id_part(ch: char) -> bool {
    is_id_start(ch) || ch == ZWNJ || ch == ZWJ || UnicodeXID::is_xid_continue(ch)
}

/// Returns true if `word` cannot be used as an identifier.
///
/// Strict code additionally reserves the strict-mode future reserved words.
pub fn is_reserved_word(word: &str, strict: bool) -> bool {
    is_keyword(word) || is_future_reserved_word(word) || (strict && is_strict_reserved_word(word))
}

fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "break"
            | "case"
            | "catch"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "in"
            | "instanceof"
            | "new"
            | "return"
            | "switch"
            | "this"
            | "throw"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
    )
}

fn is_future_reserved_word(word: &str) -> bool {
    matches!(
        word,
        "class" | "const" | "enum" | "export" | "extends" | "import" | "super"
    )
}

fn is_strict_reserved_word(word: &str) -> bool {
    matches!(
        word,
        "implements"
            | "interface"
            | "yield"
            | "let"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "static"
    )
}
