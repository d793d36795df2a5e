//! Parameter Operation Handlers
//!
//! Value-level pieces of parameter expansion operations:
//! - UseDefault, AssignDefault, UseAlternative, ErrorIfUnset conditions
//! - Substring
//! - CaseModification
//!
//! Pattern trimming and replacement live in `pattern_removal`.

use crate::ast::types::CaseDirection;
use crate::shell::glob_helpers::ShellPattern;

/// The state of a parameter when an operator is applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterOpContext {
    /// None when the parameter is unset
    pub value: Option<String>,
}

impl ParameterOpContext {
    pub fn new(value: Option<String>) -> Self {
        Self { value }
    }

    pub fn is_unset(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.value.as_deref().map_or(true, str::is_empty)
    }

    /// The value, with unset read as empty.
    pub fn effective_value(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

/// Check if default value should be used.
/// Returns true if the variable is unset, or if check_empty is true and the variable is empty.
pub fn should_use_default(op_ctx: &ParameterOpContext, check_empty: bool) -> bool {
    op_ctx.is_unset() || (check_empty && op_ctx.is_empty())
}

/// Check if alternative value should be used.
/// Returns true if the variable is set (and non-empty if check_empty is true).
pub fn should_use_alternative(op_ctx: &ParameterOpContext, check_empty: bool) -> bool {
    !should_use_default(op_ctx, check_empty)
}

/// Apply substring extraction to a value.
/// offset: starting position (can be negative for counting from end)
/// length: optional length (can be negative for counting from end)
pub fn apply_substring_op(value: &str, offset: i64, length: Option<i64>) -> Result<String, String> {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len() as i64;

    let start = if offset < 0 { len + offset } else { offset };
    if start < 0 || start >= len {
        return Ok(String::new());
    }
    let start = start as usize;

    let end = match length {
        Some(l) if l < 0 => {
            // Negative length: count from end
            let computed = len + l;
            if computed < start as i64 {
                return Err("substring expression < 0".to_string());
            }
            computed as usize
        }
        Some(l) => start.saturating_add(l as usize).min(chars.len()),
        None => chars.len(),
    };

    Ok(chars[start..end].iter().collect())
}

/// Apply case modification to a value.
///
/// `all` converts every matching character (`^^`, `,,`), otherwise only the
/// first (`^`, `,`). With a pattern, only characters it matches change.
pub fn apply_case_modification(
    value: &str,
    direction: CaseDirection,
    all: bool,
    pattern: Option<&ShellPattern>,
) -> String {
    let mut result = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let eligible = (all || i == 0)
            && pattern.map_or(true, |p| {
                let mut buf = [0u8; 4];
                p.matches(c.encode_utf8(&mut buf))
            });
        if !eligible {
            result.push(c);
            continue;
        }
        match direction {
            CaseDirection::Upper => result.extend(c.to_uppercase()),
            CaseDirection::Lower => result.extend(c.to_lowercase()),
        }
    }
    result
}
