//! Glob Helper Functions
//!
//! Functions for handling glob patterns, escaping, and unescaping.
//! Patterns use backslash to mark a character as literal.

/// Check if a pattern contains unescaped glob characters, including extglob
/// operators when enabled.
pub fn has_glob_pattern(value: &str, extglob: bool) -> bool {
    let chars: Vec<char> = value.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '*' | '?' | '[' => return true,
            _ => {}
        }
        i += 1;
    }
    extglob && has_extglob_pattern(value)
}

/// Check for an unescaped extglob operator: `@( *( +( ?( !(`.
pub fn has_extglob_pattern(value: &str) -> bool {
    let chars: Vec<char> = value.chars().collect();
    let mut i = 0;
    while i + 1 < chars.len() {
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if matches!(chars[i], '@' | '*' | '+' | '?' | '!') && chars[i + 1] == '(' {
            return true;
        }
        i += 1;
    }
    false
}

/// Unescape a glob pattern - convert escaped glob chars to literal chars.
///
/// Used for the no-match fallback and for literal path segments.
pub fn unescape_glob_pattern(pattern: &str) -> String {
    let mut result = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => result.push(next),
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Escape glob metacharacters in a string for literal matching.
/// Includes extglob metacharacters: ( ) | and the extglob prefixes.
pub fn escape_glob_chars(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 2);
    for c in s.chars() {
        match c {
            '*' | '?' | '[' | ']' | '\\' | '(' | ')' | '|' | '@' | '+' | '!' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
