//! Shell pattern matching and pathname expansion

pub mod glob_expander;
pub mod glob_helpers;

pub use glob_expander::{GlobExpander, GlobOptions};
pub use glob_helpers::ShellPattern;
