//! Expansion steps
//!
//! Single-purpose pieces the expansion manager drives, one module per step.

pub mod analysis;
pub mod arith_text_expansion;
pub mod command_substitution;
pub mod evaluator;
pub mod glob_escape;
pub mod parameter_ops;
pub mod pattern_removal;
pub mod positional_params;
pub mod quoting;
pub mod tilde;
pub mod word_glob_expansion;
pub mod word_split;

pub use analysis::{
    has_positional_at, has_process_substitution, is_assignment_word, process_substitution_of,
    ProcessSubstitutionWord,
};
pub use evaluator::ExpansionEvaluator;
pub use tilde::TildeExpander;
pub use word_glob_expansion::expand_fields;
pub use word_split::{split_segments, split_words, Field, Segment};
