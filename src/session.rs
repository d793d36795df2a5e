//! Shell Session
//!
//! Ties an expansion context to an expansion manager, the way a shell
//! session owns its state and lends it to the engine one command at a time.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::ast::types::SimpleCommand;
use crate::interpreter::errors::ExpansionError;
use crate::interpreter::types::{ExpansionContext, ShellOptions, ShoptOptions};
use crate::interpreter::word_expansion::ExpansionManager;

/// Errors from setting up or running a session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid command: {0}")]
    Command(#[from] serde_json::Error),

    #[error(transparent)]
    Expansion(#[from] ExpansionError),
}

impl SessionError {
    /// Exit status for a failed invocation.
    pub fn exit_status(&self) -> i32 {
        match self {
            SessionError::Expansion(e) => e.exit_status(),
            _ => 2,
        }
    }
}

/// Initial state of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Shell variables, in definition order
    pub variables: IndexMap<String, String>,
    /// $1, $2, ...
    pub positional: Vec<String>,
    /// $0; "sh" when unset
    pub shell_name: Option<String>,
    /// Working directory; the process's when unset
    pub cwd: Option<PathBuf>,
    pub options: ShellOptions,
    pub shopt_options: ShoptOptions,
}

impl SessionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, SessionError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Import the process environment under any variables already set.
    pub fn inherit_environment(&mut self) {
        let mut variables: IndexMap<String, String> = std::env::vars().collect();
        variables.extend(std::mem::take(&mut self.variables));
        self.variables = variables;
    }
}

/// A shell session: one expansion context plus the manager that expands
/// commands against it.
pub struct Session {
    context: ExpansionContext,
    manager: ExpansionManager,
}

impl Session {
    /// Create a session with the default collaborators.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_manager(config, ExpansionManager::with_defaults())
    }

    pub fn with_manager(config: SessionConfig, manager: ExpansionManager) -> Self {
        let mut context = ExpansionContext::new();
        context.variables = config.variables;
        context.positional = config.positional;
        context.options = config.options;
        context.shopt_options = config.shopt_options;
        if let Some(name) = config.shell_name {
            context.shell_name = name;
        }
        if let Some(cwd) = config.cwd {
            context.cwd = cwd;
        }
        if context.get_variable("PWD").is_none() {
            let pwd = context.cwd.to_string_lossy().into_owned();
            context.define_variable("PWD", pwd);
        }
        Self { context, manager }
    }

    pub fn context(&self) -> &ExpansionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ExpansionContext {
        &mut self.context
    }

    /// Expand a command's words into its arguments.
    ///
    /// Process substitutions stay open until `finish_command`; a failed
    /// expansion finishes the command at once, since it will not run.
    pub fn expand(&mut self, command: &mut SimpleCommand) -> Result<Vec<String>, ExpansionError> {
        debug!(words = command.words.len(), "expanding command");
        let result = self.manager.expand_arguments(command, &mut self.context);
        if result.is_err() {
            self.finish_command();
        }
        result
    }

    /// Close the last command's process-substitution pipes and wait for
    /// its children. Returns the pids reaped.
    pub fn finish_command(&mut self) -> Vec<u32> {
        let pids = self.context.release_process_substitutions();
        pids.into_iter()
            .filter(|&pid| {
                let mut status = 0;
                // SAFETY: waitpid only writes to the status integer.
                let rc = unsafe { libc::waitpid(pid as libc::pid_t, &mut status, 0) };
                if rc < 0 {
                    debug!(pid, error = %std::io::Error::last_os_error(), "could not reap child");
                    return false;
                }
                debug!(pid, status, "reaped process substitution");
                true
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{ParameterOperator, AST};

    const CONFIG: &str = r#"
shell_name = "myshell"
positional = ["a", "b c"]
cwd = "/tmp"

[variables]
GREETING = "hello world"
IFS = ":"

[options]
nounset = true

[shopt_options]
nullglob = true
"#;

    #[test]
    fn test_config_from_toml() {
        let config = SessionConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.shell_name.as_deref(), Some("myshell"));
        assert_eq!(config.positional, vec!["a", "b c"]);
        assert_eq!(config.variables.get("GREETING").map(String::as_str), Some("hello world"));
        assert!(config.options.nounset);
        assert!(!config.options.noglob);
        assert!(config.shopt_options.nullglob);
    }

    #[test]
    fn test_invalid_config() {
        let err = SessionConfig::from_toml_str("positional = 3").unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
        assert_eq!(err.exit_status(), 2);
    }

    #[test]
    fn test_session_context_from_config() {
        let session = Session::new(SessionConfig::from_toml_str(CONFIG).unwrap());
        let ctx = session.context();
        assert_eq!(ctx.lookup("0").as_deref(), Some("myshell"));
        assert_eq!(ctx.lookup("2").as_deref(), Some("b c"));
        assert_eq!(ctx.get_variable("PWD"), Some("/tmp"));
        assert_eq!(ctx.ifs(), ":");
    }

    #[test]
    fn test_session_keeps_state_between_commands() {
        let mut session = Session::new(SessionConfig::default());
        let assign = AST::parameter(
            "X",
            Some(ParameterOperator::AssignDefault { colon: true }),
            Some(AST::literal_word("1")),
        );
        let mut first = AST::simple_command(vec![AST::word(vec![AST::expansion(assign)])]);
        assert_eq!(session.expand(&mut first).unwrap(), vec!["1"]);

        let mut second = AST::simple_command(vec![AST::word(vec![AST::expansion(AST::variable("X"))])]);
        assert_eq!(session.expand(&mut second).unwrap(), vec!["1"]);

        session.context_mut().unset_variable("X");
        assert_eq!(session.expand(&mut second).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_inherit_environment_keeps_configured_values() {
        let mut config = SessionConfig::default();
        config.variables.insert("PATH".to_string(), "/configured".to_string());
        config.inherit_environment();
        assert_eq!(config.variables.get("PATH").map(String::as_str), Some("/configured"));
    }

    #[test]
    fn test_command_json() {
        let json = r#"{"words": [
            {"parts": [{"type": "literal", "text": "echo"}]},
            {"parts": [{"type": "expansion", "expansion": {"kind": "variable", "name": "1"}}],
             "quote_type": "double"}
        ]}"#;
        let mut command: SimpleCommand = serde_json::from_str(json).unwrap();
        let mut config = SessionConfig::default();
        config.positional = vec!["a b".to_string()];
        let mut session = Session::new(config);
        assert_eq!(session.expand(&mut command).unwrap(), vec!["echo", "a b"]);
    }

    #[test]
    fn test_finish_command_reaps_output_substitution() {
        let mut session = Session::new(SessionConfig::default());
        let mut command = AST::simple_command(vec![
            AST::literal_word("cat"),
            AST::literal_word(">(cat >/dev/null)"),
        ]);
        let args = session.expand(&mut command).unwrap();
        assert_eq!(args.len(), 2);
        assert!(args[1].starts_with("/dev/fd/"));
        assert_eq!(session.context().process_substitution_fds.len(), 1);
        let pids = session.context().process_substitution_pids.clone();

        assert_eq!(session.finish_command(), pids);
        assert!(session.context().process_substitution_fds.is_empty());
        assert!(session.context().process_substitution_pids.is_empty());
    }

    #[test]
    fn test_failed_expansion_releases_substitutions() {
        let mut config = SessionConfig::default();
        config.options.nounset = true;
        let mut session = Session::new(config);
        let mut command = AST::simple_command(vec![
            AST::literal_word(">(cat >/dev/null)"),
            AST::word(vec![AST::expansion(AST::variable("UNSET"))]),
        ]);
        assert!(session.expand(&mut command).is_err());
        assert!(session.context().process_substitution_fds.is_empty());
        assert!(session.context().process_substitution_pids.is_empty());
    }
}
