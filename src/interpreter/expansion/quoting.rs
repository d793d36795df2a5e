//! Quoting helpers for word expansion
//!
//! Backslash processing for literal text. Unquoted and double-quoted text
//! recognise different escapes. Unquoted text also yields a glob pattern in
//! which escaped characters are marked literal.

use crate::interpreter::expansion::glob_escape::escape_glob_chars;

/// Unquoted literal text after escape processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiteralText {
    /// The text as it appears in the argument
    pub text: String,
    /// The same text as a glob pattern: escaped characters are escaped,
    /// unescaped glob characters stay active
    pub pattern: String,
}

/// Apply the unquoted escape rules.
///
/// `\$ \\ \` \" \' \~ \<space>` yield the escaped character, `\<newline>` is
/// a line continuation and vanishes, and an escaped `* ? [` is a literal
/// character that never triggers globbing. Any other backslash is kept.
pub fn process_unquoted_escapes(raw: &str) -> LiteralText {
    let mut out = LiteralText::default();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.text.push(c);
            out.pattern.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('\n') => {
                chars.next();
            }
            Some(next @ ('$' | '\\' | '`' | '"' | '\'' | '~' | ' ' | '*' | '?' | '[')) => {
                chars.next();
                out.text.push(next);
                out.pattern.push_str(&escape_glob_chars(&next.to_string()));
            }
            _ => {
                out.text.push('\\');
                out.pattern.push_str("\\\\");
            }
        }
    }
    out
}

/// Apply the double-quote escape rules: only `\$ \\ \" \`` are escapes and
/// `\<newline>` vanishes.
pub fn process_double_quoted_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('\n') => {
                chars.next();
            }
            Some(next @ ('$' | '\\' | '"' | '`')) => {
                chars.next();
                out.push(next);
            }
            _ => out.push('\\'),
        }
    }
    out
}
