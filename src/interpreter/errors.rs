//! Expansion Errors
//!
//! Error types raised while expanding a command's words:
//! - hard failures abort the whole command (`${v:?}`, nounset, arithmetic,
//!   failglob, collaborators that could not run)
//! - soft failures are recovered inside the evaluator, which falls back to
//!   the expansion's source text
//!
//! The arithmetic evaluator's own error type never crosses the engine
//! boundary; it is wrapped into `ExpansionError::Arithmetic`.

use thiserror::Error;

/// Error raised by an arithmetic evaluator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ArithmeticError {
    pub message: String,
}

impl ArithmeticError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Failure while expanding a word.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpansionError {
    /// ${VAR:?message} with VAR unset (or null for the colon form)
    #[error("{parameter}: {message}")]
    ParameterNullOrUnset { parameter: String, message: String },

    /// set -u reference to an unset variable
    #[error("{0}: unbound variable")]
    UnboundVariable(String),

    #[error("{expression}: {source}")]
    Arithmetic {
        expression: String,
        #[source]
        source: ArithmeticError,
    },

    /// failglob with a pattern that matched nothing
    #[error("no match: {0}")]
    NoGlobMatch(String),

    #[error("command substitution: {0}")]
    CommandSubstitution(String),

    #[error("process substitution: {0}")]
    ProcessSubstitution(String),

    /// ${1:=x} and other assignments to special parameters
    #[error("{0}: cannot assign in this way")]
    CannotAssign(String),

    /// Malformed expansion node; recovered by the evaluator
    #[error("{0}: bad substitution")]
    BadSubstitution(String),
}

impl ExpansionError {
    pub fn arithmetic(expression: impl Into<String>, source: ArithmeticError) -> Self {
        ExpansionError::Arithmetic {
            expression: expression.into(),
            source,
        }
    }

    /// Soft failures degrade to the node's literal source text.
    pub fn is_soft(&self) -> bool {
        matches!(self, ExpansionError::BadSubstitution(_))
    }

    /// Exit status a shell reports when this failure cancels a command.
    pub fn exit_status(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ExpansionError::ParameterNullOrUnset {
            parameter: "FOO".to_string(),
            message: "must be set".to_string(),
        };
        assert_eq!(err.to_string(), "FOO: must be set");
        assert_eq!(
            ExpansionError::UnboundVariable("x".to_string()).to_string(),
            "x: unbound variable"
        );
        let arith = ExpansionError::arithmetic("1/0", ArithmeticError::new("division by 0"));
        assert_eq!(arith.to_string(), "1/0: division by 0");
    }

    #[test]
    fn test_severity() {
        assert!(ExpansionError::BadSubstitution("${x".to_string()).is_soft());
        assert!(!ExpansionError::UnboundVariable("x".to_string()).is_soft());
        assert!(!ExpansionError::NoGlobMatch("*.c".to_string()).is_soft());
        assert!(!ExpansionError::CannotAssign("1".to_string()).is_soft());
        assert_eq!(ExpansionError::NoGlobMatch("*.c".to_string()).exit_status(), 1);
    }
}
