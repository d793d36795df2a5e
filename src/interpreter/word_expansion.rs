//! Word Expansion
//!
//! Main entry point for shell word expansion. Turns a command's words into
//! the final argument list, in POSIX order:
//! - process substitution pre-pass
//! - tilde expansion
//! - parameter, command and arithmetic expansion
//! - word splitting
//! - pathname expansion
//!
//! Each word is dispatched by its quoting: single/ANSI-C quoted words are
//! reproduced verbatim, double-quoted words are expanded but never split or
//! globbed, and composite words go through every step. The steps themselves
//! live in the expansion/ submodules.

use tracing::debug;

use crate::ast::types::{Expansion, PositionalList, SimpleCommand, Word, WordPart, AST};
use crate::interpreter::arithmetic::IntegerArithmetic;
use crate::interpreter::errors::ExpansionError;
use crate::interpreter::expansion::analysis::{
    has_positional_at, has_process_substitution, is_assignment_word, process_substitution_of,
};
use crate::interpreter::expansion::evaluator::ExpansionEvaluator;
use crate::interpreter::expansion::positional_params::positional_segments;
use crate::interpreter::expansion::quoting::{process_double_quoted_escapes, process_unquoted_escapes};
use crate::interpreter::expansion::tilde::TildeExpander;
use crate::interpreter::expansion::word_glob_expansion::expand_fields;
use crate::interpreter::expansion::word_split::{split_segments, Segment};
use crate::interpreter::helpers::ifs::get_ifs_separator;
use crate::interpreter::redirections::FdProcessSubstitution;
use crate::interpreter::runtime::{ProcessSubstitutionSetup, ShellCommandRunner};
use crate::interpreter::types::ExpansionContext;

/// Drives the expansion steps for whole commands.
pub struct ExpansionManager {
    evaluator: ExpansionEvaluator,
    process_substitution: Box<dyn ProcessSubstitutionSetup>,
}

impl ExpansionManager {
    pub fn new(evaluator: ExpansionEvaluator, process_substitution: Box<dyn ProcessSubstitutionSetup>) -> Self {
        Self {
            evaluator,
            process_substitution,
        }
    }

    /// A manager backed by `sh -c`, `IntegerArithmetic` and `/dev/fd` pipes.
    pub fn with_defaults() -> Self {
        Self::new(
            ExpansionEvaluator::new(Box::new(ShellCommandRunner::default()), Box::new(IntegerArithmetic)),
            Box::new(FdProcessSubstitution::default()),
        )
    }

    pub fn evaluator(&self) -> &ExpansionEvaluator {
        &self.evaluator
    }

    /// Expand every word of a command into its final arguments.
    ///
    /// Words are processed left to right and side effects of one word (such
    /// as `${v:=x}` or `$?` from a command substitution) are visible to the
    /// next. The first hard failure aborts the whole command.
    ///
    /// Process-substitution pipes and children are retained on `ctx`; call
    /// `ExpansionContext::release_process_substitutions` after the command
    /// has run.
    pub fn expand_arguments(
        &self,
        command: &mut SimpleCommand,
        ctx: &mut ExpansionContext,
    ) -> Result<Vec<String>, ExpansionError> {
        if has_process_substitution(command) {
            self.setup_process_substitutions(command, ctx)?;
        }

        let mut args = Vec::new();
        for word in &command.words {
            args.extend(self.expand_word(word, ctx)?);
        }
        debug!(?args, "expanded arguments");
        Ok(args)
    }

    /// Start process-substitution children and replace their words with the
    /// paths that stand in for them.
    fn setup_process_substitutions(
        &self,
        command: &mut SimpleCommand,
        ctx: &mut ExpansionContext,
    ) -> Result<(), ExpansionError> {
        let subs = self.process_substitution.setup(command, ctx)?;
        debug!(args = ?subs.rewritten_args, pids = ?subs.child_pids, "process substitution");

        let mut paths = subs.fd_paths.into_iter();
        let words = command
            .words
            .iter()
            .map(|word| match process_substitution_of(word) {
                Some(sub) => paths.next().map_or_else(
                    || word.clone(),
                    |path| AST::single_quoted_word(format!("{}{}", path, sub.suffix)),
                ),
                None => word.clone(),
            })
            .collect();
        command.words = words;
        ctx.retain_process_substitutions(subs.child_pids, subs.fds);
        Ok(())
    }

    /// Expand one word into zero or more arguments.
    pub fn expand_word(&self, word: &Word, ctx: &mut ExpansionContext) -> Result<Vec<String>, ExpansionError> {
        match word.quote_type {
            Some(quote) if quote.is_literal() => Ok(vec![word.source_text()]),
            Some(_) => self.expand_double_quoted(word, ctx),
            None => self.expand_composite(word, ctx),
        }
    }

    /// Double-quoted words: one field, unless `$@` splices several.
    fn expand_double_quoted(&self, word: &Word, ctx: &mut ExpansionContext) -> Result<Vec<String>, ExpansionError> {
        let segments = self.word_segments(word, ctx)?;
        let fields: Vec<String> = split_segments(segments, None)
            .into_iter()
            .map(|field| field.text)
            .collect();
        if fields.is_empty() && !has_positional_at(word) {
            return Ok(vec![String::new()]);
        }
        Ok(fields)
    }

    /// Composite words: split unquoted expansion results unless the word is
    /// an assignment, then glob.
    fn expand_composite(&self, word: &Word, ctx: &mut ExpansionContext) -> Result<Vec<String>, ExpansionError> {
        let segments = self.word_segments(word, ctx)?;
        let fields = if is_assignment_word(word) {
            split_segments(segments, None)
        } else {
            let ifs = ctx.ifs().to_string();
            split_segments(segments, Some(&ifs))
        };
        expand_fields(fields, ctx)
    }

    /// Expand each part of a word into segments.
    fn word_segments(&self, word: &Word, ctx: &mut ExpansionContext) -> Result<Vec<Segment>, ExpansionError> {
        let mut segments = Vec::with_capacity(word.parts.len());

        for (i, part) in word.parts.iter().enumerate() {
            match part {
                WordPart::Literal(lit) => match word.quote_type.or(lit.quote) {
                    Some(quote) if quote.is_literal() => segments.push(Segment::quoted(lit.text.as_str())),
                    Some(_) => segments.push(Segment::quoted(process_double_quoted_escapes(&lit.text))),
                    None => {
                        let mut raw = lit.text.as_str();
                        if i == 0 {
                            let tilde = TildeExpander::new(ctx);
                            if let Some((dir, rest)) = tilde.expand_word_prefix(raw, word.parts.len() > 1) {
                                segments.push(Segment::quoted(dir));
                                raw = rest;
                            }
                        }
                        let processed = process_unquoted_escapes(raw);
                        segments.push(Segment::Fixed {
                            text: processed.text,
                            pattern: processed.pattern,
                            quoted: false,
                        });
                    }
                },
                WordPart::Expansion(exp) => {
                    let quoted = word.quote_type.is_some() || exp.is_quoted();
                    if let Some((list, params)) = self.positional_values(&exp.expansion, ctx)? {
                        let separator = get_ifs_separator(&ctx.variables);
                        segments.extend(positional_segments(&params, list, quoted, separator));
                        continue;
                    }
                    let value = self.evaluator.evaluate(&exp.expansion, ctx)?;
                    segments.push(if quoted {
                        Segment::quoted(value)
                    } else {
                        Segment::Splittable { text: value }
                    });
                }
            }
        }
        Ok(segments)
    }

    /// The parameters a `$@`, `$*` or `${@:offset:length}` expansion
    /// stands for.
    fn positional_values(
        &self,
        expansion: &Expansion,
        ctx: &mut ExpansionContext,
    ) -> Result<Option<(PositionalList, Vec<String>)>, ExpansionError> {
        if let Some(list) = expansion.positional_list() {
            return Ok(Some((list, ctx.positional_params().to_vec())));
        }
        match expansion {
            Expansion::Parameter(param) => self.evaluator.positional_slice(param, ctx),
            _ => Ok(None),
        }
    }
}
