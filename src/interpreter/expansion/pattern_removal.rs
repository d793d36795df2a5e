//! Pattern Removal Helpers
//!
//! Functions for ${var#pattern}, ${var%pattern} and ${var/pattern/string}.
//! Matching is done on char boundaries with whole-substring glob matches.

use crate::ast::types::PatternAnchor;
use crate::shell::glob_helpers::ShellPattern;

/// Side for pattern removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRemovalSide {
    Prefix,
    Suffix,
}

/// Byte offsets of every char boundary, including the end of the string.
fn char_boundaries(value: &str) -> Vec<usize> {
    value
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(value.len()))
        .collect()
}

/// Apply pattern removal (prefix or suffix strip) to a single value.
/// greedy: true for ## and %%, false for # and %
pub fn apply_pattern_removal(
    value: &str,
    pattern: &ShellPattern,
    side: PatternRemovalSide,
    greedy: bool,
) -> String {
    let bounds = char_boundaries(value);
    match side {
        PatternRemovalSide::Prefix => {
            let mut ends: Box<dyn Iterator<Item = &usize>> = if greedy {
                Box::new(bounds.iter().rev())
            } else {
                Box::new(bounds.iter())
            };
            match ends.find(|&&end| pattern.matches(&value[..end])) {
                Some(&end) => value[end..].to_string(),
                None => value.to_string(),
            }
        }
        PatternRemovalSide::Suffix => {
            let mut starts: Box<dyn Iterator<Item = &usize>> = if greedy {
                Box::new(bounds.iter())
            } else {
                Box::new(bounds.iter().rev())
            };
            match starts.find(|&&start| pattern.matches(&value[start..])) {
                Some(&start) => value[..start].to_string(),
                None => value.to_string(),
            }
        }
    }
}

/// Apply pattern replacement to a value.
///
/// The longest match at the leftmost position wins. `replace_all` continues
/// after each replacement; an anchor restricts the match to the start or end
/// of the value.
pub fn apply_pattern_replacement(
    value: &str,
    pattern: &ShellPattern,
    replacement: &str,
    replace_all: bool,
    anchor: Option<PatternAnchor>,
) -> String {
    let bounds = char_boundaries(value);

    match anchor {
        Some(PatternAnchor::Start) => {
            match bounds.iter().rev().find(|&&end| pattern.matches(&value[..end])) {
                Some(&end) => format!("{}{}", replacement, &value[end..]),
                None => value.to_string(),
            }
        }
        Some(PatternAnchor::End) => {
            match bounds.iter().find(|&&start| pattern.matches(&value[start..])) {
                Some(&start) => format!("{}{}", &value[..start], replacement),
                None => value.to_string(),
            }
        }
        None => {
            let mut result = String::with_capacity(value.len());
            let mut idx = 0;
            while idx < bounds.len() - 1 {
                let start = bounds[idx];
                let longest = bounds[idx + 1..]
                    .iter()
                    .rev()
                    .position(|&end| pattern.matches(&value[start..end]));
                match longest {
                    Some(from_back) => {
                        let end_idx = bounds.len() - 1 - from_back;
                        result.push_str(replacement);
                        if !replace_all {
                            result.push_str(&value[bounds[end_idx]..]);
                            return result;
                        }
                        idx = end_idx;
                    }
                    None => {
                        result.push_str(&value[start..bounds[idx + 1]]);
                        idx += 1;
                    }
                }
            }
            result
        }
    }
}
