//! Word Expansion with Glob Handling
//!
//! Applies pathname expansion to the fields of a word, with the shell's
//! policy for patterns that match nothing:
//! - `noglob` skips pathname expansion entirely
//! - matches replace the field, sorted
//! - no match keeps the field's text, unless `nullglob` drops it or
//!   `failglob` fails the command

use tracing::debug;

use crate::interpreter::errors::ExpansionError;
use crate::interpreter::expansion::glob_escape::has_glob_pattern;
use crate::interpreter::expansion::word_split::Field;
use crate::interpreter::types::ExpansionContext;
use crate::shell::glob_expander::{GlobExpander, GlobOptions};

/// Expand every field whose pattern holds active glob characters.
pub fn expand_fields(fields: Vec<Field>, ctx: &ExpansionContext) -> Result<Vec<String>, ExpansionError> {
    let extglob = ctx.shopt_options.extglob;
    if ctx.options.noglob || !fields.iter().any(|f| has_glob_pattern(&f.pattern, extglob)) {
        return Ok(fields.into_iter().map(|f| f.text).collect());
    }

    let expander = GlobExpander::new(
        ctx.cwd.clone(),
        GlobOptions {
            dotglob: ctx.shopt_options.dotglob,
            extglob,
        },
    );

    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
        if !has_glob_pattern(&field.pattern, extglob) {
            values.push(field.text);
            continue;
        }
        let matches = expander.expand(&field.pattern);
        if !matches.is_empty() {
            values.extend(matches);
        } else if ctx.shopt_options.failglob {
            return Err(ExpansionError::NoGlobMatch(field.text));
        } else if ctx.shopt_options.nullglob {
            debug!(pattern = %field.pattern, "nullglob dropped unmatched pattern");
        } else {
            values.push(field.text);
        }
    }
    Ok(values)
}
