//! Command Substitution Helpers
//!
//! Text handling around a command substitution: preparing the body of a
//! backtick substitution and trimming the captured output.

/// Undo the backslash escapes that backtick quoting layers on its body.
///
/// Inside `` `...` `` only `\$`, `` \` `` and `\\` are escapes; every other
/// backslash is kept for the inner shell to see.
pub fn unescape_backtick_command(command: &str) -> String {
    let mut result = String::with_capacity(command.len());
    let mut chars = command.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, '$' | '`' | '\\') {
                    result.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        result.push(c);
    }
    result
}

/// Strip every trailing newline from captured output, leaving internal
/// newlines intact.
pub fn trim_trailing_newlines(output: &str) -> &str {
    output.trim_end_matches('\n')
}
