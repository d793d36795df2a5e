//! Word Splitting
//!
//! IFS-based word splitting for unquoted expansions.
//!
//! A word is first expanded into segments. Only unquoted expansion results
//! are split; literal and quoted text joins whichever field is being built
//! when it is reached. `$@` contributes explicit field breaks between its
//! parameters.

use crate::interpreter::expansion::glob_escape::escape_glob_chars;
use crate::interpreter::helpers::ifs::{split_by_ifs_for_expansion_ex, IfsExpansionSplitResult};

/// One piece of an expanded word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text that is never split.
    Fixed {
        text: String,
        /// Glob form of `text`
        pattern: String,
        /// Quoted text anchors a field even when empty
        quoted: bool,
    },
    /// Unquoted expansion result, subject to IFS splitting.
    Splittable { text: String },
    /// Field boundary between two `$@` parameters.
    Break,
}

impl Segment {
    /// Quoted text: literal in globs, anchors a field.
    pub fn quoted(text: impl Into<String>) -> Self {
        let text = text.into();
        Segment::Fixed {
            pattern: escape_glob_chars(&text),
            text,
            quoted: true,
        }
    }
}

/// One resulting field, before pathname expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub text: String,
    pub pattern: String,
}

impl Field {
    fn push(&mut self, text: &str, pattern: &str) {
        self.text.push_str(text);
        self.pattern.push_str(pattern);
    }
}

/// Accumulates fields while walking segments.
#[derive(Default)]
struct FieldBuilder {
    fields: Vec<Field>,
    current: Field,
    /// The current field exists even if empty
    anchored: bool,
    /// The next content starts a new field
    pending_break: bool,
}

impl FieldBuilder {
    fn flush(&mut self) {
        if self.anchored {
            self.fields.push(std::mem::take(&mut self.current));
        } else {
            self.current = Field::default();
        }
        self.anchored = false;
        self.pending_break = false;
    }

    fn append(&mut self, text: &str, pattern: &str, anchors: bool) {
        if self.pending_break && anchors {
            self.flush();
        }
        self.current.push(text, pattern);
        self.anchored |= anchors;
    }

    fn finish(mut self) -> Vec<Field> {
        self.flush();
        self.fields
    }
}

/// Turn a word's segments into fields.
///
/// `ifs` of None disables splitting (assignment words); unquoted results are
/// then joined as-is.
pub fn split_segments(segments: Vec<Segment>, ifs: Option<&str>) -> Vec<Field> {
    let mut builder = FieldBuilder::default();

    for segment in segments {
        match segment {
            Segment::Fixed { text, pattern, quoted } => {
                let anchors = quoted || !text.is_empty();
                builder.append(&text, &pattern, anchors);
            }
            Segment::Splittable { text } => match ifs {
                None => {
                    let anchors = !text.is_empty();
                    builder.append(&text, &text, anchors);
                }
                Some(ifs) => split_into(&mut builder, &text, ifs),
            },
            Segment::Break => builder.flush(),
        }
    }

    builder.finish()
}

fn split_into(builder: &mut FieldBuilder, text: &str, ifs: &str) {
    let IfsExpansionSplitResult {
        words,
        had_leading_delimiter,
        had_trailing_delimiter,
    } = split_by_ifs_for_expansion_ex(text, ifs);

    if had_leading_delimiter {
        builder.pending_break = true;
    }
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            builder.pending_break = true;
        }
        builder.append(word, word, true);
    }
    if had_trailing_delimiter {
        builder.pending_break = true;
    }
}

/// Split one string on IFS.
///
/// An empty IFS disables splitting: the input comes back as one field,
/// untrimmed.
pub fn split_words(text: &str, ifs: &str) -> Vec<String> {
    if ifs.is_empty() {
        return vec![text.to_string()];
    }
    split_by_ifs_for_expansion_ex(text, ifs).words
}
