//! Word Analysis
//!
//! Structural checks on words that decide how the expansion manager treats
//! them: assignment form, process substitution and `$@` presence.

use regex_lite::Regex;

use crate::ast::types::{
    Expansion, ParameterOperator, PositionalList, ProcessDirection, SimpleCommand, Word, WordPart,
};
use crate::interpreter::expansion::arith_text_expansion::find_matching_paren;

lazy_static::lazy_static! {
    static ref ASSIGNMENT_PREFIX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\+?=").unwrap();
}

/// Whether a word has `NAME=value` (or `NAME+=value`) form.
///
/// Decided on the word's structure: the name and `=` must come from an
/// unquoted literal leading the word, so `"A=b"` or `$X=1` are not
/// assignments.
pub fn is_assignment_word(word: &Word) -> bool {
    if word.quote_type.is_some() {
        return false;
    }
    match word.parts.first() {
        Some(WordPart::Literal(lit)) if lit.quote.is_none() => ASSIGNMENT_PREFIX.is_match(&lit.text),
        _ => false,
    }
}

/// A word that starts with a process substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSubstitutionWord {
    pub direction: ProcessDirection,
    pub command: String,
    /// Text after the closing paren, kept after the substituted path
    pub suffix: String,
}

/// Recognise a process-substitution word: either one unquoted literal that
/// begins with `<(cmd)` / `>(cmd)`, or one unquoted process-substitution
/// node. A literal whose parens never close is not one.
pub fn process_substitution_of(word: &Word) -> Option<ProcessSubstitutionWord> {
    if word.quote_type.is_some() || word.parts.len() != 1 {
        return None;
    }
    match &word.parts[0] {
        WordPart::Literal(lit) if lit.quote.is_none() => {
            let direction = if lit.text.starts_with("<(") {
                ProcessDirection::Input
            } else if lit.text.starts_with(">(") {
                ProcessDirection::Output
            } else {
                return None;
            };
            let close = find_matching_paren(&lit.text, 1)?;
            Some(ProcessSubstitutionWord {
                direction,
                command: lit.text[2..close].to_string(),
                suffix: lit.text[close + 1..].to_string(),
            })
        }
        WordPart::Expansion(part) if part.quote.is_none() => match &part.expansion {
            Expansion::ProcessSubstitution(ps) => Some(ProcessSubstitutionWord {
                direction: ps.direction,
                command: ps.command.clone(),
                suffix: String::new(),
            }),
            _ => None,
        },
        _ => None,
    }
}

/// Whether any word of the command is a process substitution.
pub fn has_process_substitution(command: &SimpleCommand) -> bool {
    command.words.iter().any(|w| process_substitution_of(w).is_some())
}

/// Whether a word contains `$@`, `${@}` or `${@:offset}` anywhere, i.e.
/// can splice several fields into a quoted word.
pub fn has_positional_at(word: &Word) -> bool {
    word.parts.iter().any(|part| match part {
        WordPart::Expansion(exp) => match &exp.expansion {
            Expansion::Parameter(p) if p.parameter == "@" => {
                matches!(p.operator, None | Some(ParameterOperator::Substring { .. }))
            }
            other => other.positional_list() == Some(PositionalList::At),
        },
        WordPart::Literal(_) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{QuoteType, AST};

    #[test]
    fn test_is_assignment_word() {
        assert!(is_assignment_word(&AST::literal_word("FOO=bar")));
        assert!(is_assignment_word(&AST::literal_word("_x1+=y")));
        assert!(is_assignment_word(&AST::word(vec![
            AST::literal("A="),
            AST::expansion(AST::variable("B")),
        ])));
        assert!(!is_assignment_word(&AST::literal_word("1A=b")));
        assert!(!is_assignment_word(&AST::literal_word("--opt=x")));
        assert!(!is_assignment_word(&AST::word(vec![AST::quoted(QuoteType::Double, "A=b")])));
        assert!(!is_assignment_word(&AST::word(vec![
            AST::expansion(AST::variable("X")),
            AST::literal("=1"),
        ])));
    }

    fn substitution(direction: ProcessDirection, command: &str, suffix: &str) -> Option<ProcessSubstitutionWord> {
        Some(ProcessSubstitutionWord {
            direction,
            command: command.to_string(),
            suffix: suffix.to_string(),
        })
    }

    #[test]
    fn test_process_substitution_literal_form() {
        assert_eq!(
            process_substitution_of(&AST::literal_word("<(ls -l)")),
            substitution(ProcessDirection::Input, "ls -l", "")
        );
        assert_eq!(
            process_substitution_of(&AST::literal_word(">(tee 'a)b')")),
            substitution(ProcessDirection::Output, "tee 'a)b'", "")
        );
        assert_eq!(process_substitution_of(&AST::literal_word("(ls)")), None);
        assert_eq!(process_substitution_of(&AST::single_quoted_word("<(ls)")), None);
    }

    #[test]
    fn test_process_substitution_only_needs_to_begin_the_word() {
        assert_eq!(
            process_substitution_of(&AST::literal_word("<(ls)x")),
            substitution(ProcessDirection::Input, "ls", "x")
        );
        assert_eq!(
            process_substitution_of(&AST::literal_word(">(cat)/.")),
            substitution(ProcessDirection::Output, "cat", "/.")
        );
        // Unbalanced parens stay literal text
        assert_eq!(process_substitution_of(&AST::literal_word("<(ls")), None);
    }

    #[test]
    fn test_process_substitution_node_form() {
        let word = AST::word(vec![AST::expansion(AST::process_substitution(
            ProcessDirection::Input,
            "date",
        ))]);
        assert_eq!(
            process_substitution_of(&word),
            substitution(ProcessDirection::Input, "date", "")
        );
        let cmd = AST::simple_command(vec![AST::literal_word("cat"), word]);
        assert!(has_process_substitution(&cmd));
    }

    #[test]
    fn test_has_positional_at() {
        let word = AST::double_quoted_word(vec![
            AST::quoted(QuoteType::Double, "a"),
            AST::quoted_expansion(QuoteType::Double, AST::variable("@")),
        ]);
        assert!(has_positional_at(&word));
        assert!(!has_positional_at(&AST::word(vec![AST::expansion(AST::variable("*"))])));

        let slice = AST::parameter(
            "@",
            Some(ParameterOperator::Substring { offset: "1".to_string(), length: None }),
            None,
        );
        assert!(has_positional_at(&AST::word(vec![AST::expansion(slice)])));
        let length = AST::parameter("@", Some(ParameterOperator::Length), None);
        assert!(!has_positional_at(&AST::word(vec![AST::expansion(length)])));
    }
}
