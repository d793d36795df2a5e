//! Positional Parameter Expansion Handlers
//!
//! Handles `$@` and `$*` inside a word:
//! - `"$@"` splices each parameter as its own field; the first joins the
//!   text before it and the last joins the text after it
//! - `"$*"` is one field joined with the first IFS character
//! - unquoted `$@` and `$*` split every parameter on IFS
//! - `${@:offset:length}` selects a slice first

use crate::ast::types::PositionalList;
use crate::interpreter::expansion::word_split::Segment;

/// Segments contributed by a positional list.
///
/// An empty list contributes nothing at all, so `"pre$@post"` stays one
/// field. Between two parameters a `Break` ends the current field.
pub fn positional_segments(
    params: &[String],
    list: PositionalList,
    quoted: bool,
    separator: &str,
) -> Vec<Segment> {
    if quoted && list == PositionalList::Star {
        return vec![Segment::quoted(params.join(separator))];
    }

    let mut segments = Vec::with_capacity(params.len() * 2);
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            segments.push(Segment::Break);
        }
        segments.push(if quoted {
            Segment::quoted(param.as_str())
        } else {
            Segment::Splittable { text: param.clone() }
        });
    }
    segments
}

/// Apply `${@:offset:length}` slicing.
///
/// Offset 0 includes `$0`; a negative offset counts back from the last
/// parameter. Returns None for a negative length, which is an error.
pub fn slice_positional(
    shell_name: &str,
    params: &[String],
    offset: i64,
    length: Option<i64>,
) -> Option<Vec<String>> {
    let mut all = Vec::with_capacity(params.len() + 1);
    all.push(shell_name.to_string());
    all.extend(params.iter().cloned());

    let start = if offset < 0 { all.len() as i64 + offset } else { offset };
    if start < 0 || start as usize >= all.len() {
        return match length {
            Some(len) if len < 0 => None,
            _ => Some(Vec::new()),
        };
    }
    let start = start as usize;
    let end = match length {
        None => all.len(),
        Some(len) if len < 0 => return None,
        Some(len) => start.saturating_add(len as usize).min(all.len()),
    };
    Some(all[start..end].to_vec())
}
