//! IFS (Internal Field Separator) Handling
//!
//! Centralized utilities for IFS-based field splitting used by word
//! expansion and by `$*` joining.

use std::collections::HashSet;

use indexmap::IndexMap;

/// Default IFS value: space, tab, newline
pub const DEFAULT_IFS: &str = " \t\n";

/// Get the effective IFS value from the variable table.
/// Returns DEFAULT_IFS if IFS is undefined, or the actual value (including empty string).
pub fn get_ifs(vars: &IndexMap<String, String>) -> &str {
    vars.get("IFS").map(|s| s.as_str()).unwrap_or(DEFAULT_IFS)
}

/// Get the first character of IFS (used for joining with $*).
/// Returns space if IFS is undefined, empty string if IFS is empty.
pub fn get_ifs_separator(vars: &IndexMap<String, String>) -> &str {
    match vars.get("IFS") {
        None => " ",
        Some(s) => &s[..s.chars().next().map_or(0, |c| c.len_utf8())],
    }
}

/// Check if a character is an IFS whitespace character.
fn is_ifs_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\n'
}

/// Split IFS characters into whitespace and non-whitespace sets.
fn categorize_ifs(ifs: &str) -> (HashSet<char>, HashSet<char>) {
    let mut whitespace = HashSet::new();
    let mut non_whitespace = HashSet::new();
    for ch in ifs.chars() {
        if is_ifs_whitespace(ch) {
            whitespace.insert(ch);
        } else {
            non_whitespace.insert(ch);
        }
    }
    (whitespace, non_whitespace)
}

/// Result of splitting one expansion result, with delimiter info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfsExpansionSplitResult {
    pub words: Vec<String>,
    /// True if the value started with IFS whitespace
    pub had_leading_delimiter: bool,
    /// True if the value ended with an IFS delimiter
    pub had_trailing_delimiter: bool,
}

/// POSIX field splitting of one expansion result.
///
/// IFS whitespace runs are collapsed and ignored at either end. Each
/// non-whitespace IFS character (with any adjacent IFS whitespace) ends a
/// field, so consecutive ones produce empty fields; a trailing one does not
/// add an empty last field.
pub fn split_by_ifs_for_expansion_ex(value: &str, ifs: &str) -> IfsExpansionSplitResult {
    // Empty IFS means no splitting
    if ifs.is_empty() {
        return IfsExpansionSplitResult {
            words: if value.is_empty() { vec![] } else { vec![value.to_string()] },
            had_leading_delimiter: false,
            had_trailing_delimiter: false,
        };
    }

    let (whitespace, non_whitespace) = categorize_ifs(ifs);
    let chars: Vec<char> = value.chars().collect();
    let mut words = Vec::new();
    let mut pos = 0;

    while pos < chars.len() && whitespace.contains(&chars[pos]) {
        pos += 1;
    }
    let had_leading_delimiter = pos > 0;

    if pos >= chars.len() {
        return IfsExpansionSplitResult {
            words,
            had_leading_delimiter,
            had_trailing_delimiter: had_leading_delimiter,
        };
    }

    let mut had_trailing_delimiter = false;
    loop {
        let mut word = String::new();
        while pos < chars.len()
            && !whitespace.contains(&chars[pos])
            && !non_whitespace.contains(&chars[pos])
        {
            word.push(chars[pos]);
            pos += 1;
        }
        words.push(word);

        if pos >= chars.len() {
            break;
        }

        // Consume one delimiter: ws* [non-ws] ws*
        while pos < chars.len() && whitespace.contains(&chars[pos]) {
            pos += 1;
        }
        if pos < chars.len() && non_whitespace.contains(&chars[pos]) {
            pos += 1;
            while pos < chars.len() && whitespace.contains(&chars[pos]) {
                pos += 1;
            }
        }

        if pos >= chars.len() {
            had_trailing_delimiter = true;
            break;
        }
    }

    IfsExpansionSplitResult {
        words,
        had_leading_delimiter,
        had_trailing_delimiter,
    }
}
