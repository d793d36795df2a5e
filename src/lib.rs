//! shell-expansion - POSIX shell word expansion
//!
//! This library turns the parsed words of a simple command into the argument
//! list the command receives: tilde, parameter, command and arithmetic
//! expansion, word splitting, pathname expansion and `$@` splicing.

pub mod ast;
pub mod interpreter;
pub mod session;
pub mod shell;

pub use ast::types::*;
pub use interpreter::{
    ArithmeticError, ArithmeticEvaluator, CommandOutput, CommandRunner, ExpansionContext, ExpansionError,
    ExpansionEvaluator, ExpansionManager, FdProcessSubstitution, IntegerArithmetic, ProcessSubstitutionSetup,
    ProcessSubstitutions, ShellCommandRunner, ShellOptions, ShoptOptions,
};
pub use session::{Session, SessionConfig, SessionError};
