//! Runtime Collaborators
//!
//! The expansion engine reaches outside itself through three seams, each
//! injected at construction:
//! - `CommandRunner` runs a command substitution and captures its stdout
//! - `ArithmeticEvaluator` owns the arithmetic grammar
//! - `ProcessSubstitutionSetup` forks `<(...)` / `>(...)` children and hands
//!   back the paths that replace them
//!
//! `ShellCommandRunner` is the default runner; the other defaults live in
//! `arithmetic` and `redirections`.

use std::os::fd::OwnedFd;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::ast::types::SimpleCommand;
use crate::interpreter::errors::{ArithmeticError, ExpansionError};
use crate::interpreter::types::ExpansionContext;

/// Captured result of a command substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub status: i32,
}

/// Runs a command string synchronously and captures its stdout.
pub trait CommandRunner {
    fn run(&self, command: &str, ctx: &ExpansionContext) -> Result<CommandOutput, ExpansionError>;
}

/// Evaluates an arithmetic expression after text preprocessing. Assignment
/// operators write through `ctx`.
pub trait ArithmeticEvaluator {
    fn evaluate(&self, expression: &str, ctx: &mut ExpansionContext) -> Result<i64, ArithmeticError>;
}

/// What process-substitution setup hands back.
#[derive(Debug, Default)]
pub struct ProcessSubstitutions {
    /// One path per process-substitution word, in word order
    pub fd_paths: Vec<String>,
    /// The command's arguments with each substitution replaced by its path
    pub rewritten_args: Vec<String>,
    /// Children to reap once the command finishes
    pub child_pids: Vec<u32>,
    /// Parent ends of the pipes behind `fd_paths`. They must stay open until
    /// the command has run; dropping them lets the children see EOF.
    pub fds: Vec<OwnedFd>,
}

/// Forks process-substitution children and wires up their pipes.
pub trait ProcessSubstitutionSetup {
    fn setup(
        &self,
        command: &SimpleCommand,
        ctx: &ExpansionContext,
    ) -> Result<ProcessSubstitutions, ExpansionError>;
}

/// Runs commands with `<shell> -c`, in the session's working directory with
/// its variables exported and positional parameters passed along.
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    shell: String,
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl ShellCommandRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &str, ctx: &ExpansionContext) -> Result<CommandOutput, ExpansionError> {
        debug!(shell = %self.shell, command, "running command substitution");
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .arg(&ctx.shell_name)
            .args(ctx.positional_params())
            .envs(&ctx.variables)
            .current_dir(&ctx.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| ExpansionError::CommandSubstitution(format!("{}: {}", self.shell, e)))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            status: output.status.code().unwrap_or(1),
        })
    }
}
