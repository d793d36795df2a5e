//! Glob Pattern Helpers
//!
//! Converts shell patterns (`*`, `?`, `[...]`, extglob groups) to regexes.
//! Used for filename matching by the GlobExpander and for the pattern
//! operators of parameter expansion (`${v#pat}`, `${v/pat/rep}`).
//!
//! A backslash escapes the next character. regex-lite has no lookaround, so
//! an extglob `!(...)` group compiles to two regexes: one where the group
//! matches anything and one where it matches its alternatives; a name
//! matches when it satisfies the first and not the second.

use std::collections::HashMap;

use regex_lite::Regex;

lazy_static::lazy_static! {
    /// Valid POSIX character class names mapped to regex equivalents.
    static ref POSIX_CLASSES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("alnum", "a-zA-Z0-9");
        m.insert("alpha", "a-zA-Z");
        m.insert("ascii", "\\x00-\\x7F");
        m.insert("blank", " \\t");
        m.insert("cntrl", "\\x00-\\x1F\\x7F");
        m.insert("digit", "0-9");
        m.insert("graph", "!-~");
        m.insert("lower", "a-z");
        m.insert("print", " -~");
        m.insert("punct", "!-/:-@\\[-`{-~");
        m.insert("space", " \\t\\n\\r\\f\\v");
        m.insert("upper", "A-Z");
        m.insert("word", "a-zA-Z0-9_");
        m.insert("xdigit", "0-9A-Fa-f");
        m
    };
}

/// How an extglob `!(...)` group is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Negation {
    /// The group matches any text
    Accept,
    /// The group matches one of its alternatives
    Reject,
}

/// A compiled shell pattern matching whole strings.
#[derive(Debug, Clone)]
pub struct ShellPattern {
    accept: Regex,
    reject: Option<Regex>,
}

impl ShellPattern {
    /// Compile a pattern. Returns None if it does not form a valid regex
    /// (e.g. an inverted range like `[z-a]`).
    pub fn new(pattern: &str, extglob: bool) -> Option<Self> {
        let accept = Regex::new(&anchor(&glob_to_regex_inner(pattern, extglob, Negation::Accept))).ok()?;
        let reject = if extglob && has_negated_group(pattern) {
            Some(Regex::new(&anchor(&glob_to_regex_inner(pattern, extglob, Negation::Reject))).ok()?)
        } else {
            None
        };
        Some(Self { accept, reject })
    }

    /// Whether `text` matches the whole pattern.
    pub fn matches(&self, text: &str) -> bool {
        self.accept.is_match(text) && !self.reject.as_ref().is_some_and(|re| re.is_match(text))
    }
}

fn anchor(inner: &str) -> String {
    format!("(?s)^(?:{})$", inner)
}

/// Convert a glob pattern to an unanchored regex string.
///
/// When `extglob` is true, extended glob patterns are supported:
/// - `@(pat1|pat2)`: match exactly one of the patterns
/// - `*(pat1|pat2)`: match zero or more occurrences
/// - `+(pat1|pat2)`: match one or more occurrences
/// - `?(pat1|pat2)`: match zero or one occurrence
/// - `!(pat1|pat2)`: rendered per `negation`; see `ShellPattern`
///
/// Recurses for extglob alternatives.
fn glob_to_regex_inner(pattern: &str, extglob: bool, negation: Negation) -> String {
    let mut regex = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if extglob && is_extglob_prefix(c) && i + 1 < chars.len() && chars[i + 1] == '(' {
            if let Some(close_idx) = find_matching_paren(&chars, i + 1) {
                let content: String = chars[i + 2..close_idx].iter().collect();
                let alt_group = split_extglob_alternatives(&content)
                    .iter()
                    .map(|alt| glob_to_regex_inner(alt, extglob, negation))
                    .collect::<Vec<_>>()
                    .join("|");

                match c {
                    '@' => regex.push_str(&format!("(?:{})", alt_group)),
                    '*' => regex.push_str(&format!("(?:{})*", alt_group)),
                    '+' => regex.push_str(&format!("(?:{})+", alt_group)),
                    '?' => regex.push_str(&format!("(?:{})?", alt_group)),
                    _ => match negation {
                        Negation::Accept => regex.push_str(".*"),
                        Negation::Reject => regex.push_str(&format!("(?:{})", alt_group)),
                    },
                }
                i = close_idx + 1;
                continue;
            }
        }

        if c == '\\' && i + 1 < chars.len() {
            push_literal(&mut regex, chars[i + 1]);
            i += 2;
        } else if c == '*' {
            regex.push_str(".*");
            i += 1;
        } else if c == '?' {
            regex.push('.');
            i += 1;
        } else if c == '[' {
            match find_bracket_end(&chars, i) {
                Some(class_end) => {
                    regex.push_str(&convert_char_class(&chars[i + 1..class_end]));
                    i = class_end + 1;
                }
                None => {
                    // No matching ], treat as literal
                    regex.push_str("\\[");
                    i += 1;
                }
            }
        } else {
            push_literal(&mut regex, c);
            i += 1;
        }
    }

    regex
}

fn is_extglob_prefix(c: char) -> bool {
    matches!(c, '@' | '*' | '+' | '?' | '!')
}

/// Whether an unescaped `!(` occurs in the pattern.
fn has_negated_group(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i + 1 < chars.len() {
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i] == '!' && chars[i + 1] == '(' {
            return true;
        }
        i += 1;
    }
    false
}

/// Check if a character is a regex special character that needs escaping.
fn is_regex_special(c: char) -> bool {
    "\\^$.|+(){}[]*?".contains(c)
}

fn push_literal(regex: &mut String, c: char) {
    if is_regex_special(c) {
        regex.push('\\');
    }
    regex.push(c);
}

/// Find the end of a bracket expression `[...]` starting at `start` (where
/// `chars[start]` is `[`). Returns the index of the closing `]`.
///
/// Handles:
/// - `[!...]` and `[^...]` negation (the `]` right after `[!` or `[^` is literal)
/// - `]` immediately after `[` is literal
/// - POSIX classes `[:name:]` inside the bracket
/// - Escaped characters `\]`
fn find_bracket_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;

    if i < chars.len() && (chars[i] == '!' || chars[i] == '^') {
        i += 1;
    }
    if i < chars.len() && chars[i] == ']' {
        i += 1;
    }

    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            i += 2;
            continue;
        }
        if chars[i] == ']' {
            return Some(i);
        }
        if chars[i] == '[' && i + 1 < chars.len() && chars[i + 1] == ':' {
            if let Some(close) = find_posix_class_end(chars, i + 2) {
                i = close + 2;
                continue;
            }
        }
        i += 1;
    }

    None
}

/// Index of the `:` in the `:]` closing a POSIX class whose name starts at `from`.
fn find_posix_class_end(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len().saturating_sub(1)).find(|&j| chars[j] == ':' && chars[j + 1] == ']')
}

/// Convert the content inside a shell character class `[...]` to a regex
/// character class. Handles `!`/`^` negation, POSIX classes, escapes and
/// ranges.
fn convert_char_class(content: &[char]) -> String {
    let mut result = String::from("[");
    let mut i = 0;

    if !content.is_empty() && (content[0] == '!' || content[0] == '^') {
        result.push('^');
        i += 1;
    }

    let body_start = i;
    while i < content.len() {
        let c = content[i];

        if c == '[' && i + 1 < content.len() && content[i + 1] == ':' {
            if let Some(close) = find_posix_class_end(content, i + 2) {
                let class_name: String = content[i + 2..close].iter().collect();
                if let Some(expansion) = POSIX_CLASSES.get(class_name.as_str()) {
                    result.push_str(expansion);
                }
                i = close + 2;
                continue;
            }
        }

        if c == '\\' && i + 1 < content.len() {
            push_class_literal(&mut result, content[i + 1]);
            i += 2;
            continue;
        }

        // A '-' between two members is a range; elsewhere it is literal
        let is_range = c == '-' && i > body_start && i + 1 < content.len();
        if is_range {
            result.push('-');
        } else {
            push_class_literal(&mut result, c);
        }
        i += 1;
    }

    result.push(']');
    result
}

fn push_class_literal(class: &mut String, c: char) {
    if matches!(c, '[' | ']' | '\\' | '^' | '-') {
        class.push('\\');
    }
    class.push(c);
}

/// Find the matching closing parenthesis for an open paren at `open_idx`,
/// handling nesting.
fn find_matching_paren(chars: &[char], open_idx: usize) -> Option<usize> {
    let mut depth = 1;
    let mut i = open_idx + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split extglob pattern content on `|`, handling nested parentheses.
fn split_extglob_alternatives(content: &str) -> Vec<String> {
    let mut alternatives: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut chars = content.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            '|' if depth == 0 => alternatives.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    alternatives.push(current);
    alternatives
}
