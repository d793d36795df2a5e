//! Expansion Evaluator
//!
//! Evaluates one expansion node to a string:
//! - `$name` and special parameters
//! - the `${name[op[word]]}` family, including `${v:=x}` assignment
//! - command substitution through the injected `CommandRunner`
//! - arithmetic through the injected `ArithmeticEvaluator`, after the text
//!   rewrites that resolve `$var`, `$(...)` and nested `$((...))`
//!
//! Soft failures fall back to the node's source text; hard failures
//! propagate and cancel the command.

use tracing::{debug, warn};

use crate::ast::types::{
    CommandSubstitution, Expansion, ParameterExpansion, ParameterOperator, PositionalList, Word,
    WordPart,
};
use crate::interpreter::errors::{ArithmeticError, ExpansionError};
use crate::interpreter::expansion::arith_text_expansion::{
    expand_dollar_vars_in_arith_text, replace_substitution_spans, ArithSpan,
};
use crate::interpreter::expansion::command_substitution::{
    trim_trailing_newlines, unescape_backtick_command,
};
use crate::interpreter::expansion::glob_escape::escape_glob_chars;
use crate::interpreter::expansion::parameter_ops::{
    apply_case_modification, apply_substring_op, should_use_alternative, should_use_default,
    ParameterOpContext,
};
use crate::interpreter::expansion::pattern_removal::{
    apply_pattern_removal, apply_pattern_replacement, PatternRemovalSide,
};
use crate::interpreter::expansion::positional_params::slice_positional;
use crate::interpreter::expansion::quoting::{
    process_double_quoted_escapes, process_unquoted_escapes, LiteralText,
};
use crate::interpreter::expansion::tilde::TildeExpander;
use crate::interpreter::runtime::{ArithmeticEvaluator, CommandRunner};
use crate::interpreter::types::{is_special_parameter, ExpansionContext};
use crate::shell::glob_helpers::ShellPattern;

const SUBSTRING_NEGATIVE: &str = "substring expression < 0";

/// Whether `name` can be expanded at all: a special parameter, positional
/// digits or an identifier.
fn is_valid_parameter_name(name: &str) -> bool {
    if is_special_parameter(name) {
        return true;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Evaluates expansion nodes against an `ExpansionContext`.
pub struct ExpansionEvaluator {
    runner: Box<dyn CommandRunner>,
    arithmetic: Box<dyn ArithmeticEvaluator>,
}

impl ExpansionEvaluator {
    pub fn new(runner: Box<dyn CommandRunner>, arithmetic: Box<dyn ArithmeticEvaluator>) -> Self {
        Self { runner, arithmetic }
    }

    /// Evaluate one node. Soft failures yield the node's source syntax.
    pub fn evaluate(
        &self,
        expansion: &Expansion,
        ctx: &mut ExpansionContext,
    ) -> Result<String, ExpansionError> {
        match self.try_evaluate(expansion, ctx) {
            Err(err) if err.is_soft() => {
                if ctx.options.debug {
                    warn!(expansion = %expansion, error = %err, "expansion kept as source text");
                }
                Ok(expansion.to_string())
            }
            result => result,
        }
    }

    /// Evaluate one node, surfacing soft failures as errors.
    pub fn try_evaluate(
        &self,
        expansion: &Expansion,
        ctx: &mut ExpansionContext,
    ) -> Result<String, ExpansionError> {
        match expansion {
            Expansion::Variable(v) => self.expand_variable(&v.name, ctx),
            Expansion::Parameter(p) => self.expand_parameter(p, ctx),
            Expansion::CommandSubstitution(c) => self.command_substitution(c, ctx),
            Expansion::Arithmetic(a) => self
                .evaluate_arithmetic(&a.expression, ctx)
                .map(|n| n.to_string()),
            // Handled structurally before evaluation
            Expansion::ProcessSubstitution(_) => {
                Err(ExpansionError::BadSubstitution(expansion.to_string()))
            }
        }
    }

    // ========================================================================
    // Variables
    // ========================================================================

    fn expand_variable(&self, name: &str, ctx: &ExpansionContext) -> Result<String, ExpansionError> {
        if !is_valid_parameter_name(name) {
            return Err(ExpansionError::BadSubstitution(format!("${{{}}}", name)));
        }
        self.require_value(name, ctx).map(Option::unwrap_or_default)
    }

    /// Look up a parameter, failing under nounset when it is unset.
    /// `$@` and `$*` are exempt.
    fn require_value(&self, name: &str, ctx: &ExpansionContext) -> Result<Option<String>, ExpansionError> {
        let value = ctx.lookup(name);
        if value.is_none() && ctx.options.nounset && !matches!(name, "@" | "*") {
            return Err(ExpansionError::UnboundVariable(name.to_string()));
        }
        Ok(value)
    }

    // ========================================================================
    // Parameter operators
    // ========================================================================

    fn expand_parameter(
        &self,
        param: &ParameterExpansion,
        ctx: &mut ExpansionContext,
    ) -> Result<String, ExpansionError> {
        let name = param.parameter.as_str();
        if !is_valid_parameter_name(name) {
            return Err(ExpansionError::BadSubstitution(param.to_string()));
        }
        let Some(operator) = &param.operator else {
            return self.expand_variable(name, ctx);
        };

        match operator {
            ParameterOperator::UseDefault { colon } => {
                let op_ctx = ParameterOpContext::new(ctx.lookup(name));
                if should_use_default(&op_ctx, *colon) {
                    return self.operand_text(param.word.as_ref(), ctx);
                }
                Ok(op_ctx.effective_value().to_string())
            }
            ParameterOperator::AssignDefault { colon } => {
                let op_ctx = ParameterOpContext::new(ctx.lookup(name));
                if !should_use_default(&op_ctx, *colon) {
                    return Ok(op_ctx.effective_value().to_string());
                }
                if is_special_parameter(name) {
                    return Err(ExpansionError::CannotAssign(format!("${}", name)));
                }
                let value = self.operand_text(param.word.as_ref(), ctx)?;
                debug!(name, value = %value, "assigning default");
                ctx.define_variable(name, value.clone());
                Ok(value)
            }
            ParameterOperator::ErrorIfUnset { colon } => {
                let op_ctx = ParameterOpContext::new(ctx.lookup(name));
                if !should_use_default(&op_ctx, *colon) {
                    return Ok(op_ctx.effective_value().to_string());
                }
                let mut message = self.operand_text(param.word.as_ref(), ctx)?;
                if message.is_empty() {
                    message = if *colon {
                        "parameter null or not set".to_string()
                    } else {
                        "parameter not set".to_string()
                    };
                }
                Err(ExpansionError::ParameterNullOrUnset {
                    parameter: name.to_string(),
                    message,
                })
            }
            ParameterOperator::UseAlternative { colon } => {
                let op_ctx = ParameterOpContext::new(ctx.lookup(name));
                if should_use_alternative(&op_ctx, *colon) {
                    return self.operand_text(param.word.as_ref(), ctx);
                }
                Ok(String::new())
            }
            ParameterOperator::Length => {
                if matches!(name, "@" | "*") {
                    return Ok(ctx.positional_params().len().to_string());
                }
                let value = self.require_value(name, ctx)?.unwrap_or_default();
                Ok(value.chars().count().to_string())
            }
            ParameterOperator::RemovePrefix { longest } | ParameterOperator::RemoveSuffix { longest } => {
                let value = self.require_value(name, ctx)?.unwrap_or_default();
                let Some(pattern) = self.operand_pattern(param.word.as_ref(), ctx)? else {
                    return Ok(value);
                };
                let side = if matches!(operator, ParameterOperator::RemovePrefix { .. }) {
                    PatternRemovalSide::Prefix
                } else {
                    PatternRemovalSide::Suffix
                };
                Ok(apply_pattern_removal(&value, &pattern, side, *longest))
            }
            ParameterOperator::Replace { all, anchor, replacement } => {
                let value = self.require_value(name, ctx)?.unwrap_or_default();
                let Some(pattern) = self.operand_pattern(param.word.as_ref(), ctx)? else {
                    return Ok(value);
                };
                let replacement = self.operand_text(replacement.as_ref(), ctx)?;
                Ok(apply_pattern_replacement(&value, &pattern, &replacement, *all, *anchor))
            }
            ParameterOperator::Substring { offset, length } => {
                if let Some((list, params)) = self.positional_slice(param, ctx)? {
                    let separator = match list {
                        PositionalList::At => " ".to_string(),
                        PositionalList::Star => ctx.ifs().chars().next().map(String::from).unwrap_or_default(),
                    };
                    return Ok(params.join(&separator));
                }
                let value = self.require_value(name, ctx)?.unwrap_or_default();
                let start = self.evaluate_arithmetic(offset, ctx)?;
                let count = match length {
                    Some(text) => Some(self.evaluate_arithmetic(text, ctx)?),
                    None => None,
                };
                apply_substring_op(&value, start, count).map_err(|message| {
                    ExpansionError::arithmetic(length.clone().unwrap_or_default(), ArithmeticError::new(message))
                })
            }
            ParameterOperator::CaseModification { direction, all } => {
                let value = self.require_value(name, ctx)?.unwrap_or_default();
                let pattern = self.operand_pattern(param.word.as_ref(), ctx)?;
                Ok(apply_case_modification(&value, *direction, *all, pattern.as_ref()))
            }
        }
    }

    /// The parameters selected by `${@:offset[:length]}` or
    /// `${*:offset[:length]}`; None for any other expansion.
    pub fn positional_slice(
        &self,
        param: &ParameterExpansion,
        ctx: &mut ExpansionContext,
    ) -> Result<Option<(PositionalList, Vec<String>)>, ExpansionError> {
        let list = match param.parameter.as_str() {
            "@" => PositionalList::At,
            "*" => PositionalList::Star,
            _ => return Ok(None),
        };
        let Some(ParameterOperator::Substring { offset, length }) = &param.operator else {
            return Ok(None);
        };
        let start = self.evaluate_arithmetic(offset, ctx)?;
        let count = match length {
            Some(text) => Some(self.evaluate_arithmetic(text, ctx)?),
            None => None,
        };
        let params = slice_positional(&ctx.shell_name, ctx.positional_params(), start, count)
            .ok_or_else(|| {
                ExpansionError::arithmetic(
                    length.clone().unwrap_or_default(),
                    ArithmeticError::new(SUBSTRING_NEGATIVE),
                )
            })?;
        Ok(Some((list, params)))
    }

    // ========================================================================
    // Operand words
    // ========================================================================

    /// Expand an operand word: parameter expansions and substitutions run,
    /// but the result is never split or globbed. The returned pattern marks
    /// quoted text literal.
    pub fn expand_operand(&self, word: &Word, ctx: &mut ExpansionContext) -> Result<LiteralText, ExpansionError> {
        let mut out = LiteralText::default();
        let push_quoted = |out: &mut LiteralText, text: &str| {
            out.text.push_str(text);
            out.pattern.push_str(&escape_glob_chars(text));
        };

        if word.quote_type.is_some_and(|q| q.is_literal()) {
            push_quoted(&mut out, &word.source_text());
            return Ok(out);
        }

        for (i, part) in word.parts.iter().enumerate() {
            match part {
                WordPart::Literal(lit) => match word.quote_type.or(lit.quote) {
                    Some(q) if q.is_literal() => push_quoted(&mut out, &lit.text),
                    Some(_) => push_quoted(&mut out, &process_double_quoted_escapes(&lit.text)),
                    None => {
                        let mut raw = lit.text.as_str();
                        if i == 0 {
                            let tilde = TildeExpander::new(ctx);
                            if let Some((dir, rest)) = tilde.expand_word_prefix(raw, word.parts.len() > 1) {
                                push_quoted(&mut out, &dir);
                                raw = rest;
                            }
                        }
                        let processed = process_unquoted_escapes(raw);
                        out.text.push_str(&processed.text);
                        out.pattern.push_str(&processed.pattern);
                    }
                },
                WordPart::Expansion(exp) => {
                    let value = self.evaluate(&exp.expansion, ctx)?;
                    if word.quote_type.or(exp.quote).is_some() {
                        push_quoted(&mut out, &value);
                    } else {
                        out.text.push_str(&value);
                        out.pattern.push_str(&value);
                    }
                }
            }
        }
        Ok(out)
    }

    fn operand_text(&self, word: Option<&Word>, ctx: &mut ExpansionContext) -> Result<String, ExpansionError> {
        match word {
            Some(word) => Ok(self.expand_operand(word, ctx)?.text),
            None => Ok(String::new()),
        }
    }

    /// Compile an operand as a glob pattern; None when it is empty or does
    /// not compile.
    fn operand_pattern(
        &self,
        word: Option<&Word>,
        ctx: &mut ExpansionContext,
    ) -> Result<Option<ShellPattern>, ExpansionError> {
        let Some(word) = word else {
            return Ok(None);
        };
        let operand = self.expand_operand(word, ctx)?;
        if operand.pattern.is_empty() {
            return Ok(None);
        }
        Ok(ShellPattern::new(&operand.pattern, ctx.shopt_options.extglob))
    }

    // ========================================================================
    // Command substitution
    // ========================================================================

    fn command_substitution(
        &self,
        sub: &CommandSubstitution,
        ctx: &mut ExpansionContext,
    ) -> Result<String, ExpansionError> {
        if sub.backtick {
            self.run_command(&unescape_backtick_command(&sub.command), ctx)
        } else {
            self.run_command(&sub.command, ctx)
        }
    }

    /// Run a command, record its status in `$?` and return its output
    /// without trailing newlines.
    pub fn run_command(&self, command: &str, ctx: &mut ExpansionContext) -> Result<String, ExpansionError> {
        let output = self.runner.run(command, ctx)?;
        ctx.last_status = output.status;
        Ok(trim_trailing_newlines(&output.stdout).to_string())
    }

    // ========================================================================
    // Arithmetic
    // ========================================================================

    /// Rewrite the expression text, then hand it to the arithmetic
    /// evaluator. Any arithmetic error is wrapped.
    pub fn evaluate_arithmetic(&self, expression: &str, ctx: &mut ExpansionContext) -> Result<i64, ExpansionError> {
        let text = expand_dollar_vars_in_arith_text(ctx, expression);
        let text = replace_substitution_spans(&text, |span| match span {
            ArithSpan::Arithmetic(inner) => self.evaluate_arithmetic(inner, ctx).map(|n| n.to_string()),
            ArithSpan::Command(command) => {
                let output = self.run_command(command, ctx)?;
                if output.is_empty() {
                    Ok("0".to_string())
                } else {
                    Ok(output)
                }
            }
        })?;
        debug!(expression, rewritten = %text, "evaluating arithmetic");
        self.arithmetic
            .evaluate(&text, ctx)
            .map_err(|e| ExpansionError::arithmetic(expression, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{CaseDirection, PatternAnchor, ProcessDirection, QuoteType, AST};
    use crate::interpreter::arithmetic::IntegerArithmetic;
    use crate::interpreter::runtime::CommandOutput;

    /// Answers `echo ...` with its arguments and `false` with status 1.
    struct StubRunner;

    impl CommandRunner for StubRunner {
        fn run(&self, command: &str, _ctx: &ExpansionContext) -> Result<CommandOutput, ExpansionError> {
            if let Some(rest) = command.strip_prefix("echo ") {
                return Ok(CommandOutput {
                    stdout: format!("{}\n", rest.trim_matches('\'')),
                    status: 0,
                });
            }
            match command {
                "false" => Ok(CommandOutput { stdout: String::new(), status: 1 }),
                "lines" => Ok(CommandOutput { stdout: "a\n\nb\n\n\n".to_string(), status: 0 }),
                other => Err(ExpansionError::CommandSubstitution(other.to_string())),
            }
        }
    }

    fn make_evaluator() -> ExpansionEvaluator {
        ExpansionEvaluator::new(Box::new(StubRunner), Box::new(IntegerArithmetic))
    }

    fn make_ctx() -> ExpansionContext {
        let mut ctx = ExpansionContext::new();
        ctx.define_variable("FOO", "hello");
        ctx.define_variable("EMPTY", "");
        ctx.define_variable("PATHISH", "/usr/local/lib.tar.gz");
        ctx.set_positional_params(vec!["one".to_string(), "two".to_string(), "three".to_string()]);
        ctx
    }

    fn param(name: &str, op: ParameterOperator, word: Option<&str>) -> Expansion {
        AST::parameter(name, Some(op), word.map(AST::literal_word))
    }

    fn eval(expansion: &Expansion, ctx: &mut ExpansionContext) -> Result<String, ExpansionError> {
        make_evaluator().evaluate(expansion, ctx)
    }

    #[test]
    fn test_variables() {
        let mut ctx = make_ctx();
        assert_eq!(eval(&AST::variable("FOO"), &mut ctx).unwrap(), "hello");
        assert_eq!(eval(&AST::variable("MISSING"), &mut ctx).unwrap(), "");
        assert_eq!(eval(&AST::variable("2"), &mut ctx).unwrap(), "two");
        assert_eq!(eval(&AST::variable("#"), &mut ctx).unwrap(), "3");
    }

    #[test]
    fn test_nounset() {
        let mut ctx = make_ctx();
        ctx.options.nounset = true;
        assert_eq!(
            eval(&AST::variable("MISSING"), &mut ctx).unwrap_err(),
            ExpansionError::UnboundVariable("MISSING".to_string())
        );
        assert!(eval(&AST::variable("9"), &mut ctx).is_err());
        assert!(eval(&param("MISSING", ParameterOperator::Length, None), &mut ctx).is_err());
        assert_eq!(eval(&AST::variable("EMPTY"), &mut ctx).unwrap(), "");

        ctx.set_positional_params(Vec::new());
        assert_eq!(eval(&AST::variable("@"), &mut ctx).unwrap(), "");
        let default = param("MISSING", ParameterOperator::UseDefault { colon: true }, Some("d"));
        assert_eq!(eval(&default, &mut ctx).unwrap(), "d");
    }

    #[test]
    fn test_use_default_has_no_side_effect() {
        let mut ctx = make_ctx();
        let default = param("VAR", ParameterOperator::UseDefault { colon: true }, Some("default"));
        assert_eq!(eval(&default, &mut ctx).unwrap(), "default");
        assert_eq!(ctx.get_variable("VAR"), None);

        let set = param("FOO", ParameterOperator::UseDefault { colon: true }, Some("default"));
        assert_eq!(eval(&set, &mut ctx).unwrap(), "hello");
    }

    #[test]
    fn test_colon_forms_treat_null_as_unset() {
        let mut ctx = make_ctx();
        let colon = param("EMPTY", ParameterOperator::UseDefault { colon: true }, Some("d"));
        let plain = param("EMPTY", ParameterOperator::UseDefault { colon: false }, Some("d"));
        assert_eq!(eval(&colon, &mut ctx).unwrap(), "d");
        assert_eq!(eval(&plain, &mut ctx).unwrap(), "");

        let alt = param("EMPTY", ParameterOperator::UseAlternative { colon: true }, Some("alt"));
        let alt_plain = param("EMPTY", ParameterOperator::UseAlternative { colon: false }, Some("alt"));
        assert_eq!(eval(&alt, &mut ctx).unwrap(), "");
        assert_eq!(eval(&alt_plain, &mut ctx).unwrap(), "alt");
    }

    #[test]
    fn test_assign_default() {
        let mut ctx = make_ctx();
        let assign = param("VAR", ParameterOperator::AssignDefault { colon: true }, Some("default"));
        assert_eq!(eval(&assign, &mut ctx).unwrap(), "default");
        assert_eq!(ctx.get_variable("VAR"), Some("default"));

        let special = param("1", ParameterOperator::AssignDefault { colon: true }, Some("x"));
        ctx.set_positional_params(Vec::new());
        assert_eq!(
            eval(&special, &mut ctx).unwrap_err(),
            ExpansionError::CannotAssign("$1".to_string())
        );
    }

    #[test]
    fn test_error_if_unset() {
        let mut ctx = make_ctx();
        let custom = param("VAR", ParameterOperator::ErrorIfUnset { colon: true }, Some("must be set"));
        assert_eq!(
            eval(&custom, &mut ctx).unwrap_err(),
            ExpansionError::ParameterNullOrUnset {
                parameter: "VAR".to_string(),
                message: "must be set".to_string(),
            }
        );

        let bare = param("EMPTY", ParameterOperator::ErrorIfUnset { colon: true }, None);
        assert_eq!(
            eval(&bare, &mut ctx).unwrap_err().to_string(),
            "EMPTY: parameter null or not set"
        );
        let plain = param("EMPTY", ParameterOperator::ErrorIfUnset { colon: false }, None);
        assert_eq!(eval(&plain, &mut ctx).unwrap(), "");
    }

    #[test]
    fn test_pattern_removal() {
        let mut ctx = make_ctx();
        let cases = [
            (ParameterOperator::RemovePrefix { longest: false }, "*/", "usr/local/lib.tar.gz"),
            (ParameterOperator::RemovePrefix { longest: true }, "*/", "lib.tar.gz"),
            (ParameterOperator::RemoveSuffix { longest: false }, ".*", "/usr/local/lib.tar"),
            (ParameterOperator::RemoveSuffix { longest: true }, ".*", "/usr/local/lib"),
        ];
        for (op, pattern, expected) in cases {
            assert_eq!(eval(&param("PATHISH", op, Some(pattern)), &mut ctx).unwrap(), expected);
        }
    }

    #[test]
    fn test_quoted_operand_matches_literally() {
        let mut ctx = make_ctx();
        ctx.define_variable("STARS", "**x");
        let quoted = AST::word(vec![AST::quoted(QuoteType::Double, "*")]);
        let exp = AST::parameter(
            "STARS",
            Some(ParameterOperator::RemovePrefix { longest: false }),
            Some(quoted),
        );
        assert_eq!(eval(&exp, &mut ctx).unwrap(), "*x");
    }

    #[test]
    fn test_replace() {
        let mut ctx = make_ctx();
        let replace = |all, anchor, rep: &str| {
            AST::parameter(
                "FOO",
                Some(ParameterOperator::Replace {
                    all,
                    anchor,
                    replacement: Some(AST::literal_word(rep)),
                }),
                Some(AST::literal_word("l")),
            )
        };
        assert_eq!(eval(&replace(false, None, "L"), &mut ctx).unwrap(), "heLlo");
        assert_eq!(eval(&replace(true, None, "L"), &mut ctx).unwrap(), "heLLo");
        assert_eq!(
            eval(&replace(false, Some(PatternAnchor::Start), "L"), &mut ctx).unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_length_and_case() {
        let mut ctx = make_ctx();
        assert_eq!(eval(&param("FOO", ParameterOperator::Length, None), &mut ctx).unwrap(), "5");
        assert_eq!(eval(&param("@", ParameterOperator::Length, None), &mut ctx).unwrap(), "3");
        let upper = ParameterOperator::CaseModification { direction: CaseDirection::Upper, all: true };
        assert_eq!(eval(&param("FOO", upper, None), &mut ctx).unwrap(), "HELLO");
        let first = ParameterOperator::CaseModification { direction: CaseDirection::Upper, all: false };
        assert_eq!(eval(&param("FOO", first, None), &mut ctx).unwrap(), "Hello");
    }

    #[test]
    fn test_substring() {
        let mut ctx = make_ctx();
        ctx.define_variable("N", "1");
        let sub = |offset: &str, length: Option<&str>| {
            param(
                "FOO",
                ParameterOperator::Substring {
                    offset: offset.to_string(),
                    length: length.map(str::to_string),
                },
                None,
            )
        };
        assert_eq!(eval(&sub("1", Some("3")), &mut ctx).unwrap(), "ell");
        assert_eq!(eval(&sub("$N + 1", None), &mut ctx).unwrap(), "llo");
        assert_eq!(eval(&sub(" -3", None), &mut ctx).unwrap(), "llo");
        assert_eq!(eval(&sub("0", Some("-1")), &mut ctx).unwrap(), "hell");
        assert_eq!(
            eval(&sub("3", Some("-4")), &mut ctx).unwrap_err().to_string(),
            "-4: substring expression < 0"
        );
    }

    #[test]
    fn test_positional_slice() {
        let mut ctx = make_ctx();
        let slice = |name: &str, offset: &str, length: Option<&str>| ParameterExpansion {
            parameter: name.to_string(),
            operator: Some(ParameterOperator::Substring {
                offset: offset.to_string(),
                length: length.map(str::to_string),
            }),
            word: None,
        };
        let evaluator = make_evaluator();
        let (list, params) = evaluator.positional_slice(&slice("@", "2", None), &mut ctx).unwrap().unwrap();
        assert_eq!(list, PositionalList::At);
        assert_eq!(params, vec!["two", "three"]);
        assert!(evaluator.positional_slice(&slice("FOO", "1", None), &mut ctx).unwrap().is_none());

        ctx.define_variable("IFS", ",");
        let joined = Expansion::Parameter(slice("*", "1", Some("2")));
        assert_eq!(eval(&joined, &mut ctx).unwrap(), "one,two");
    }

    #[test]
    fn test_command_substitution() {
        let mut ctx = make_ctx();
        assert_eq!(eval(&AST::command_substitution("echo hi", false), &mut ctx).unwrap(), "hi");
        assert_eq!(eval(&AST::command_substitution("lines", false), &mut ctx).unwrap(), "a\n\nb");

        assert_eq!(eval(&AST::command_substitution("false", false), &mut ctx).unwrap(), "");
        assert_eq!(ctx.last_status, 1);
        eval(&AST::command_substitution("echo ok", false), &mut ctx).unwrap();
        assert_eq!(ctx.last_status, 0);

        let backtick = AST::command_substitution(r"echo \$HOME", true);
        assert_eq!(eval(&backtick, &mut ctx).unwrap(), "$HOME");
    }

    #[test]
    fn test_arithmetic() {
        let mut ctx = make_ctx();
        ctx.define_variable("X", "6");
        assert_eq!(eval(&AST::arithmetic("1 + 2 * 3"), &mut ctx).unwrap(), "7");
        assert_eq!(eval(&AST::arithmetic("$X * 2"), &mut ctx).unwrap(), "12");
        assert_eq!(eval(&AST::arithmetic("${X} + X"), &mut ctx).unwrap(), "12");
        assert_eq!(eval(&AST::arithmetic("$FOO + 1"), &mut ctx).unwrap(), "1");
        assert_eq!(eval(&AST::arithmetic("$# + 0"), &mut ctx).unwrap(), "3");
    }

    #[test]
    fn test_arithmetic_assignment_updates_context() {
        let mut ctx = make_ctx();
        ctx.define_variable("X", "6");
        assert_eq!(eval(&AST::arithmetic("n = 5"), &mut ctx).unwrap(), "5");
        assert_eq!(eval(&AST::arithmetic("n += $X"), &mut ctx).unwrap(), "11");
        assert_eq!(eval(&AST::arithmetic("n++"), &mut ctx).unwrap(), "11");
        assert_eq!(ctx.get_variable("n"), Some("12"));
    }

    #[test]
    fn test_arithmetic_nesting() {
        let mut ctx = make_ctx();
        assert_eq!(eval(&AST::arithmetic("$(echo 4) + 1"), &mut ctx).unwrap(), "5");
        // The quoted parens belong to the command, not the span
        assert_eq!(eval(&AST::arithmetic("$(echo '(4)') + 1"), &mut ctx).unwrap(), "5");
        assert_eq!(eval(&AST::arithmetic("$((2 * 3)) + 1"), &mut ctx).unwrap(), "7");
        assert_eq!(eval(&AST::arithmetic("$(false) + 2"), &mut ctx).unwrap(), "2");
    }

    #[test]
    fn test_arithmetic_errors_are_hard() {
        let mut ctx = make_ctx();
        let err = eval(&AST::arithmetic("1 / 0"), &mut ctx).unwrap_err();
        assert!(!err.is_soft());
        assert_eq!(err.to_string(), "1 / 0: division by 0");
    }

    #[test]
    fn test_soft_failures_fall_back_to_source() {
        let mut ctx = make_ctx();
        let bad = AST::parameter("a-b", Some(ParameterOperator::Length), None);
        assert_eq!(eval(&bad, &mut ctx).unwrap(), "${#a-b}");
        let ps = AST::process_substitution(ProcessDirection::Input, "ls");
        assert_eq!(eval(&ps, &mut ctx).unwrap(), "<(ls)");
        assert!(make_evaluator().try_evaluate(&ps, &mut ctx).unwrap_err().is_soft());
    }

    #[test]
    fn test_operand_expansion() {
        let mut ctx = make_ctx();
        ctx.define_variable("HOME", "/home/me");
        let evaluator = make_evaluator();

        let word = AST::word(vec![AST::literal("~/x\\*"), AST::expansion(AST::variable("FOO"))]);
        let operand = evaluator.expand_operand(&word, &mut ctx).unwrap();
        assert_eq!(operand.text, "/home/me/x*hello");
        assert_eq!(operand.pattern, "/home/me/x\\*hello");

        let single = AST::single_quoted_word("$FOO");
        assert_eq!(evaluator.expand_operand(&single, &mut ctx).unwrap().text, "$FOO");

        let double = AST::double_quoted_word(vec![
            AST::quoted(QuoteType::Double, "a\\$"),
            AST::quoted_expansion(QuoteType::Double, AST::variable("FOO")),
        ]);
        assert_eq!(evaluator.expand_operand(&double, &mut ctx).unwrap().text, "a$hello");
    }
}
