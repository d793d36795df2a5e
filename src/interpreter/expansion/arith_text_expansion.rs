//! Arithmetic Text Expansion
//!
//! Text-level rewrites applied to an arithmetic expression before it reaches
//! the arithmetic evaluator:
//! 1. `$name`, `${name}` and special parameters are replaced by their value,
//!    or `0` when unset or not a number.
//! 2. `$((...))` and `$(...)` spans are replaced by their evaluated result.
//!
//! Both passes locate spans with the quote-aware scanners below, so a `)`
//! inside a quoted string of a substituted command never closes the span.

use crate::interpreter::types::ExpansionContext;

/// Find the `)` matching the `(` at byte offset `open`.
///
/// Single-quoted text, double-quoted text (with backslash escapes) and
/// backslash-escaped characters are skipped.
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'\'' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'\'' {
                    i += 1;
                }
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'(' => depth += 1,
            b')' => {
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

/// Find the `))` closing the `((` whose first `(` is at byte offset `open`.
///
/// Returns the offset of the first `)` of the pair, or None when the parens
/// do not close as a pair (e.g. `$((a) (b))` is a subshell, not arithmetic).
pub fn find_matching_double_paren(text: &str, open: usize) -> Option<usize> {
    if text.as_bytes().get(open) != Some(&b'(') {
        return None;
    }
    let inner_close = find_matching_paren(text, open + 1)?;
    match text.as_bytes().get(inner_close + 1) {
        Some(b')') => Some(inner_close),
        _ => None,
    }
}

/// A substitution span found by `replace_substitution_spans`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithSpan<'a> {
    /// Body of `$((...))`
    Arithmetic(&'a str),
    /// Body of `$(...)`
    Command(&'a str),
}

/// Replace `$name`, `${name}` and special parameters with their numeric
/// value. `$(...)` spans are copied untouched for the second pass.
pub fn expand_dollar_vars_in_arith_text(ctx: &ExpansionContext, text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        let Some(c) = rest.chars().next() else {
            break;
        };
        if c != '$' {
            result.push(c);
            i += c.len_utf8();
            continue;
        }

        let next = rest[1..].chars().next();
        match next {
            Some('(') => {
                let end = find_matching_paren(text, i + 1).map_or(text.len(), |close| close + 1);
                result.push_str(&text[i..end]);
                i = end;
            }
            Some('{') => match text[i + 2..].find('}') {
                Some(close) => {
                    let name = &text[i + 2..i + 2 + close];
                    result.push_str(&numeric_value(ctx, name));
                    i += close + 3;
                }
                None => {
                    result.push_str(rest);
                    i = text.len();
                }
            },
            Some(n) if n.is_ascii_alphabetic() || n == '_' => {
                let len = rest[1..]
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                    .unwrap_or(rest.len() - 1);
                result.push_str(&numeric_value(ctx, &rest[1..1 + len]));
                i += 1 + len;
            }
            Some(n) if n.is_ascii_digit() || "?$!#@*".contains(n) => {
                result.push_str(&numeric_value(ctx, &rest[1..2]));
                i += 2;
            }
            _ => {
                result.push('$');
                i += 1;
            }
        }
    }
    result
}

/// Value of a parameter for arithmetic text, `0` if unset or not a number.
fn numeric_value(ctx: &ExpansionContext, name: &str) -> String {
    match ctx.lookup(name) {
        Some(value) if value.trim().parse::<i64>().is_ok() => value.trim().to_string(),
        _ => "0".to_string(),
    }
}

/// Replace each `$((...))` and `$(...)` span, left to right, with the string
/// `on_span` produces for it. `$((` is tried first; when it does not close as
/// arithmetic the span is treated as a command substitution.
pub fn replace_substitution_spans<E>(
    text: &str,
    mut on_span: impl FnMut(ArithSpan<'_>) -> Result<String, E>,
) -> Result<String, E> {
    let mut result = String::with_capacity(text.len());
    let mut i = 0;

    while let Some(found) = text[i..].find("$(") {
        let start = i + found;
        result.push_str(&text[i..start]);

        if let Some(close) = find_matching_double_paren(text, start + 1) {
            result.push_str(&on_span(ArithSpan::Arithmetic(&text[start + 3..close]))?);
            i = close + 2;
            continue;
        }
        match find_matching_paren(text, start + 1) {
            Some(close) => {
                result.push_str(&on_span(ArithSpan::Command(&text[start + 2..close]))?);
                i = close + 1;
            }
            None => {
                result.push_str(&text[start..]);
                return Ok(result);
            }
        }
    }
    result.push_str(&text[i..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_matching_paren() {
        assert_eq!(find_matching_paren("(a)", 0), Some(2));
        assert_eq!(find_matching_paren("x(a(b)c)d", 1), Some(7));
        assert_eq!(find_matching_paren("(echo ')')", 0), Some(9));
        assert_eq!(find_matching_paren(r#"(echo "(\")")"#, 0), Some(12));
        assert_eq!(find_matching_paren(r"(echo \))", 0), Some(8));
        assert_eq!(find_matching_paren("(unclosed", 0), None);
        assert_eq!(find_matching_paren("no paren", 0), None);
    }

    #[test]
    fn test_find_matching_double_paren() {
        let text = "$((1 + (2 * 3)))";
        assert_eq!(find_matching_double_paren(text, 1), Some(14));
        assert_eq!(find_matching_double_paren("$((a) (b))", 1), None);
        assert_eq!(find_matching_double_paren("$((1 + 2", 1), None);
    }

    #[test]
    fn test_expand_dollar_vars() {
        let mut ctx = ExpansionContext::new();
        ctx.define_variable("x", "4");
        ctx.define_variable("word", "abc");
        ctx.set_positional_params(vec!["7".to_string()]);
        assert_eq!(expand_dollar_vars_in_arith_text(&ctx, "$x + ${x}"), "4 + 4");
        assert_eq!(expand_dollar_vars_in_arith_text(&ctx, "$word + $missing"), "0 + 0");
        assert_eq!(expand_dollar_vars_in_arith_text(&ctx, "$1 * $#"), "7 * 1");
        assert_eq!(expand_dollar_vars_in_arith_text(&ctx, "x + 1"), "x + 1");
        assert_eq!(
            expand_dollar_vars_in_arith_text(&ctx, "$(echo $x) + $x"),
            "$(echo $x) + 4"
        );
    }

    #[test]
    fn test_replace_substitution_spans() {
        let mut seen = Vec::new();
        let out = replace_substitution_spans::<()>("$(echo ')' 4) + $((1 + 2)) + 1", |span| {
            seen.push(format!("{:?}", span));
            Ok(match span {
                ArithSpan::Command(_) => "4".to_string(),
                ArithSpan::Arithmetic(_) => "3".to_string(),
            })
        })
        .unwrap();
        assert_eq!(out, "4 + 3 + 1");
        assert_eq!(seen, vec![r#"Command("echo ')' 4")"#, r#"Arithmetic("1 + 2")"#]);
    }

    #[test]
    fn test_unclosed_span_is_kept() {
        let out = replace_substitution_spans::<()>("1 + $(echo", |_| Ok("x".to_string())).unwrap();
        assert_eq!(out, "1 + $(echo");
    }
}
