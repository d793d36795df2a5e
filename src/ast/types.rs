//! Abstract Syntax Tree (AST) Types for Shell Words
//!
//! This module defines the structured form of a shell word as the parser
//! hands it to the expansion engine. Words are immutable once built; the
//! engine only ever replaces a command's word sequence, never a node.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// QUOTING
// =============================================================================

/// The quoting mechanism that produced a word or part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteType {
    /// 'text'
    Single,
    /// "text"
    Double,
    /// $'text'
    AnsiC,
}

impl QuoteType {
    /// The character that opens this kind of quoting.
    pub fn quote_char(self) -> char {
        match self {
            QuoteType::Single | QuoteType::AnsiC => '\'',
            QuoteType::Double => '"',
        }
    }

    /// Single and ANSI-C quotes suppress every expansion.
    pub fn is_literal(self) -> bool {
        matches!(self, QuoteType::Single | QuoteType::AnsiC)
    }
}

// =============================================================================
// WORDS
// =============================================================================

/// A Word is a sequence of parts that form a single shell word.
///
/// When `quote_type` is set the whole word is uniformly quoted and the
/// per-part quoting is ignored. When it is `None` the word is a composite
/// whose parts each carry their own quoting, e.g. `pre"mid"$VAR`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub parts: Vec<WordPart>,
    #[serde(default)]
    pub quote_type: Option<QuoteType>,
}

impl Word {
    /// Reconstruct the word's text without its outer quotes, rendering every
    /// expansion back to the syntax it was written in.
    pub fn source_text(&self) -> String {
        self.parts.iter().map(WordPart::source_text).collect()
    }
}

/// Parts that can make up a word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WordPart {
    Literal(LiteralPart),
    Expansion(ExpansionPart),
}

impl WordPart {
    pub fn is_quoted(&self) -> bool {
        match self {
            WordPart::Literal(lit) => lit.quote.is_some(),
            WordPart::Expansion(exp) => exp.quote.is_some(),
        }
    }

    fn source_text(&self) -> String {
        match self {
            WordPart::Literal(lit) => lit.text.clone(),
            WordPart::Expansion(exp) => exp.expansion.to_string(),
        }
    }
}

/// Raw text, with the quoting it appeared in (if any).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralPart {
    pub text: String,
    #[serde(default)]
    pub quote: Option<QuoteType>,
}

impl LiteralPart {
    pub fn is_quoted(&self) -> bool {
        self.quote.is_some()
    }

    pub fn quote_char(&self) -> Option<char> {
        self.quote.map(QuoteType::quote_char)
    }
}

/// One expansion node plus the quoting context it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionPart {
    pub expansion: Expansion,
    #[serde(default)]
    pub quote: Option<QuoteType>,
}

impl ExpansionPart {
    pub fn is_quoted(&self) -> bool {
        self.quote.is_some()
    }

    pub fn quote_char(&self) -> Option<char> {
        self.quote.map(QuoteType::quote_char)
    }
}

// =============================================================================
// EXPANSIONS
// =============================================================================

/// Expansion nodes consumed by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expansion {
    Variable(VariableExpansion),
    Parameter(ParameterExpansion),
    CommandSubstitution(CommandSubstitution),
    Arithmetic(ArithmeticExpansion),
    ProcessSubstitution(ProcessSubstitution),
}

impl Expansion {
    /// True for `$@`, `$*`, `${@}` and `${*}`: the positional list itself.
    pub fn positional_list(&self) -> Option<PositionalList> {
        let name = match self {
            Expansion::Variable(v) => v.name.as_str(),
            Expansion::Parameter(p) if p.operator.is_none() => p.parameter.as_str(),
            _ => return None,
        };
        match name {
            "@" => Some(PositionalList::At),
            "*" => Some(PositionalList::Star),
            _ => None,
        }
    }
}

/// `$@` versus `$*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionalList {
    At,
    Star,
}

/// `$name`, including the special names `@ * # ? ! $ -` and digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableExpansion {
    pub name: String,
}

/// The `${name[op[word]]}` family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterExpansion {
    pub parameter: String,
    #[serde(default)]
    pub operator: Option<ParameterOperator>,
    #[serde(default)]
    pub word: Option<Word>,
}

/// Operators of a braced parameter expansion.
///
/// `colon` forms treat a null value the same as an unset one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ParameterOperator {
    /// ${VAR:-word} or ${VAR-word}
    UseDefault { colon: bool },
    /// ${VAR:=word} or ${VAR=word}
    AssignDefault { colon: bool },
    /// ${VAR:?word} or ${VAR?word}
    ErrorIfUnset { colon: bool },
    /// ${VAR:+word} or ${VAR+word}
    UseAlternative { colon: bool },
    /// ${VAR#word} or ${VAR##word}
    RemovePrefix { longest: bool },
    /// ${VAR%word} or ${VAR%%word}
    RemoveSuffix { longest: bool },
    /// ${VAR/word/replacement}, ${VAR//...}, ${VAR/#...}, ${VAR/%...}
    Replace {
        all: bool,
        #[serde(default)]
        anchor: Option<PatternAnchor>,
        #[serde(default)]
        replacement: Option<Word>,
    },
    /// ${#VAR}
    Length,
    /// ${VAR:offset} or ${VAR:offset:length}; both are arithmetic text
    Substring {
        offset: String,
        #[serde(default)]
        length: Option<String>,
    },
    /// ${VAR^}, ${VAR^^}, ${VAR,}, ${VAR,,}
    CaseModification { direction: CaseDirection, all: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternAnchor {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseDirection {
    Upper,
    Lower,
}

/// `$(command)` or `` `command` ``
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSubstitution {
    pub command: String,
    #[serde(default)]
    pub backtick: bool,
}

/// `$((expression))`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithmeticExpansion {
    pub expression: String,
}

/// `<(command)` or `>(command)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSubstitution {
    pub direction: ProcessDirection,
    pub command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessDirection {
    /// <(cmd): the command's output is read through the path
    Input,
    /// >(cmd): writes to the path feed the command's input
    Output,
}

impl ProcessDirection {
    pub fn opener(self) -> &'static str {
        match self {
            ProcessDirection::Input => "<(",
            ProcessDirection::Output => ">(",
        }
    }
}

// =============================================================================
// SOURCE RECONSTRUCTION
// =============================================================================

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expansion::Variable(v) => {
                if v.name.chars().count() > 1 && v.name.chars().all(|c| c.is_ascii_digit()) {
                    write!(f, "${{{}}}", v.name)
                } else {
                    write!(f, "${}", v.name)
                }
            }
            Expansion::Parameter(p) => write!(f, "{}", p),
            Expansion::CommandSubstitution(c) => {
                if c.backtick {
                    write!(f, "`{}`", c.command)
                } else {
                    write!(f, "$({})", c.command)
                }
            }
            Expansion::Arithmetic(a) => write!(f, "$(({}))", a.expression),
            Expansion::ProcessSubstitution(p) => {
                write!(f, "{}{})", p.direction.opener(), p.command)
            }
        }
    }
}

impl fmt::Display for ParameterExpansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = self.word.as_ref().map(Word::source_text).unwrap_or_default();
        let colon = |c: bool| if c { ":" } else { "" };
        match &self.operator {
            None => write!(f, "${{{}}}", self.parameter),
            Some(ParameterOperator::Length) => write!(f, "${{#{}}}", self.parameter),
            Some(ParameterOperator::UseDefault { colon: c }) => {
                write!(f, "${{{}{}-{}}}", self.parameter, colon(*c), word)
            }
            Some(ParameterOperator::AssignDefault { colon: c }) => {
                write!(f, "${{{}{}={}}}", self.parameter, colon(*c), word)
            }
            Some(ParameterOperator::ErrorIfUnset { colon: c }) => {
                write!(f, "${{{}{}?{}}}", self.parameter, colon(*c), word)
            }
            Some(ParameterOperator::UseAlternative { colon: c }) => {
                write!(f, "${{{}{}+{}}}", self.parameter, colon(*c), word)
            }
            Some(ParameterOperator::RemovePrefix { longest }) => {
                let op = if *longest { "##" } else { "#" };
                write!(f, "${{{}{}{}}}", self.parameter, op, word)
            }
            Some(ParameterOperator::RemoveSuffix { longest }) => {
                let op = if *longest { "%%" } else { "%" };
                write!(f, "${{{}{}{}}}", self.parameter, op, word)
            }
            Some(ParameterOperator::Replace { all, anchor, replacement }) => {
                let op = match (all, anchor) {
                    (true, _) => "//",
                    (false, Some(PatternAnchor::Start)) => "/#",
                    (false, Some(PatternAnchor::End)) => "/%",
                    (false, None) => "/",
                };
                write!(f, "${{{}{}{}", self.parameter, op, word)?;
                if let Some(rep) = replacement {
                    write!(f, "/{}", rep.source_text())?;
                }
                write!(f, "}}")
            }
            Some(ParameterOperator::Substring { offset, length }) => {
                write!(f, "${{{}:{}", self.parameter, offset)?;
                if let Some(len) = length {
                    write!(f, ":{}", len)?;
                }
                write!(f, "}}")
            }
            Some(ParameterOperator::CaseModification { direction, all }) => {
                let op = match (direction, all) {
                    (CaseDirection::Upper, false) => "^",
                    (CaseDirection::Upper, true) => "^^",
                    (CaseDirection::Lower, false) => ",",
                    (CaseDirection::Lower, true) => ",,",
                };
                write!(f, "${{{}{}{}}}", self.parameter, op, word)
            }
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// A simple command's argument words, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimpleCommand {
    pub words: Vec<Word>,
}

// =============================================================================
// BUILDERS
// =============================================================================

/// Convenience constructors for AST nodes.
pub struct AST;

impl AST {
    pub fn simple_command(words: Vec<Word>) -> SimpleCommand {
        SimpleCommand { words }
    }

    /// Composite word; each part keeps its own quoting.
    pub fn word(parts: Vec<WordPart>) -> Word {
        Word { parts, quote_type: None }
    }

    /// Uniformly quoted word.
    pub fn quoted_word(quote: QuoteType, parts: Vec<WordPart>) -> Word {
        Word { parts, quote_type: Some(quote) }
    }

    pub fn single_quoted_word(text: impl Into<String>) -> Word {
        Self::quoted_word(QuoteType::Single, vec![Self::quoted(QuoteType::Single, text)])
    }

    pub fn double_quoted_word(parts: Vec<WordPart>) -> Word {
        Self::quoted_word(QuoteType::Double, parts)
    }

    /// Unquoted literal word.
    pub fn literal_word(text: impl Into<String>) -> Word {
        Self::word(vec![Self::literal(text)])
    }

    pub fn literal(text: impl Into<String>) -> WordPart {
        WordPart::Literal(LiteralPart { text: text.into(), quote: None })
    }

    pub fn quoted(quote: QuoteType, text: impl Into<String>) -> WordPart {
        WordPart::Literal(LiteralPart { text: text.into(), quote: Some(quote) })
    }

    pub fn expansion(expansion: Expansion) -> WordPart {
        WordPart::Expansion(ExpansionPart { expansion, quote: None })
    }

    pub fn quoted_expansion(quote: QuoteType, expansion: Expansion) -> WordPart {
        WordPart::Expansion(ExpansionPart { expansion, quote: Some(quote) })
    }

    pub fn variable(name: impl Into<String>) -> Expansion {
        Expansion::Variable(VariableExpansion { name: name.into() })
    }

    pub fn parameter(
        parameter: impl Into<String>,
        operator: Option<ParameterOperator>,
        word: Option<Word>,
    ) -> Expansion {
        Expansion::Parameter(ParameterExpansion {
            parameter: parameter.into(),
            operator,
            word,
        })
    }

    pub fn command_substitution(command: impl Into<String>, backtick: bool) -> Expansion {
        Expansion::CommandSubstitution(CommandSubstitution {
            command: command.into(),
            backtick,
        })
    }

    pub fn arithmetic(expression: impl Into<String>) -> Expansion {
        Expansion::Arithmetic(ArithmeticExpansion { expression: expression.into() })
    }

    pub fn process_substitution(direction: ProcessDirection, command: impl Into<String>) -> Expansion {
        Expansion::ProcessSubstitution(ProcessSubstitution {
            direction,
            command: command.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_source_syntax() {
        assert_eq!(AST::variable("HOME").to_string(), "$HOME");
        assert_eq!(AST::variable("12").to_string(), "${12}");
        assert_eq!(AST::command_substitution("ls -l", false).to_string(), "$(ls -l)");
        assert_eq!(AST::command_substitution("ls", true).to_string(), "`ls`");
        assert_eq!(AST::arithmetic("1 + 2").to_string(), "$((1 + 2))");
        assert_eq!(
            AST::process_substitution(ProcessDirection::Output, "tee log").to_string(),
            ">(tee log)"
        );
    }

    #[test]
    fn test_parameter_source_syntax() {
        let default = AST::parameter(
            "VAR",
            Some(ParameterOperator::UseDefault { colon: true }),
            Some(AST::literal_word("x")),
        );
        assert_eq!(default.to_string(), "${VAR:-x}");

        let replace = AST::parameter(
            "p",
            Some(ParameterOperator::Replace {
                all: true,
                anchor: None,
                replacement: Some(AST::literal_word("b")),
            }),
            Some(AST::literal_word("a")),
        );
        assert_eq!(replace.to_string(), "${p//a/b}");

        let length = AST::parameter("p", Some(ParameterOperator::Length), None);
        assert_eq!(length.to_string(), "${#p}");
    }

    #[test]
    fn test_source_text_renders_parts() {
        let word = AST::word(vec![
            AST::literal("pre"),
            AST::quoted(QuoteType::Double, "mid"),
            AST::expansion(AST::variable("X")),
        ]);
        assert_eq!(word.source_text(), "premid$X");
    }

    #[test]
    fn test_positional_list_detection() {
        assert_eq!(AST::variable("@").positional_list(), Some(PositionalList::At));
        assert_eq!(
            AST::parameter("*", None, None).positional_list(),
            Some(PositionalList::Star)
        );
        assert_eq!(AST::variable("1").positional_list(), None);
        let with_op = AST::parameter(
            "@",
            Some(ParameterOperator::UseDefault { colon: true }),
            None,
        );
        assert_eq!(with_op.positional_list(), None);
    }

    #[test]
    fn test_word_json_shape() {
        let json = r#"{"parts":[{"type":"literal","text":"a"},
            {"type":"expansion","expansion":{"kind":"variable","name":"B"},"quote":"double"}]}"#;
        let word: Word = serde_json::from_str(json).unwrap();
        assert_eq!(word.quote_type, None);
        assert!(word.parts[1].is_quoted());
        assert!(!word.parts[0].is_quoted());
        match &word.parts[1] {
            WordPart::Expansion(exp) => assert_eq!(exp.quote_char(), Some('"')),
            WordPart::Literal(_) => panic!("expected an expansion part"),
        }
        match AST::quoted(QuoteType::AnsiC, "x") {
            WordPart::Literal(lit) => {
                assert!(lit.is_quoted());
                assert_eq!(lit.quote_char(), Some('\''));
            }
            WordPart::Expansion(_) => panic!("expected a literal part"),
        }
        assert_eq!(word.source_text(), "a$B");
    }
}
