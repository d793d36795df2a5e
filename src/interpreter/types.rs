//! Interpreter Types
//!
//! Option flags and the expansion context borrowed from the shell session.

use std::os::fd::OwnedFd;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::interpreter::helpers::ifs::{get_ifs, get_ifs_separator};

/// Shell options (set -f, set -u, etc.)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellOptions {
    /// set -f: Disable filename expansion (globbing)
    pub noglob: bool,
    /// set -u: Treat unset variables as an error when substituting
    pub nounset: bool,
    /// Emit diagnostics when an expansion falls back to its source text
    pub debug: bool,
}

/// Shopt options (shopt -s, etc.)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoptOptions {
    /// shopt -s nullglob: Return empty for non-matching globs instead of literal pattern
    pub nullglob: bool,
    /// shopt -s extglob: Enable extended globbing patterns @(), *(), +(), ?(), !()
    pub extglob: bool,
    /// shopt -s dotglob: Include dotfiles in glob expansion
    pub dotglob: bool,
    /// shopt -s failglob: Fail if glob pattern has no matches
    pub failglob: bool,
}

/// Names that resolve through the special-variable accessor rather than the
/// variable table.
pub fn is_special_parameter(name: &str) -> bool {
    matches!(name, "@" | "*" | "#" | "?" | "$" | "!" | "-")
        || (!name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
}

/// Variables whose value is computed on every read unless the user has
/// assigned them.
const DYNAMIC_VARIABLES: &[&str] = &["RANDOM", "SECONDS", "EPOCHSECONDS"];

/// State the expansion engine reads from (and for `${v:=x}` writes to).
///
/// Owned by the shell session and borrowed for one `expand_arguments` call.
#[derive(Debug)]
pub struct ExpansionContext {
    /// Shell variables in definition order; unset variables are absent
    pub variables: IndexMap<String, String>,
    /// $1, $2, ...
    pub positional: Vec<String>,
    /// $0
    pub shell_name: String,
    pub options: ShellOptions,
    pub shopt_options: ShoptOptions,
    /// Directory glob patterns are resolved against
    pub cwd: PathBuf,
    /// $?
    pub last_status: i32,
    /// $!
    pub last_background_pid: Option<u32>,
    /// $$
    pub shell_pid: u32,
    /// Children started for process substitutions, awaiting reaping
    pub process_substitution_pids: Vec<u32>,
    /// Pipe ends the process-substitution paths name
    pub process_substitution_fds: Vec<OwnedFd>,
    started_at: DateTime<Utc>,
}

impl Default for ExpansionContext {
    fn default() -> Self {
        Self {
            variables: IndexMap::new(),
            positional: Vec::new(),
            shell_name: "sh".to_string(),
            options: ShellOptions::default(),
            shopt_options: ShoptOptions::default(),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
            last_status: 0,
            last_background_pid: None,
            shell_pid: std::process::id(),
            process_substitution_pids: Vec::new(),
            process_substitution_fds: Vec::new(),
            started_at: Utc::now(),
        }
    }
}

impl ExpansionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an ordinary variable.
    pub fn get_variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// The one write path into the variable table.
    pub fn define_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn unset_variable(&mut self, name: &str) {
        self.variables.shift_remove(name);
    }

    pub fn positional_params(&self) -> &[String] {
        &self.positional
    }

    pub fn set_positional_params(&mut self, params: Vec<String>) {
        self.positional = params;
    }

    /// Effective IFS: the default when unset, possibly empty.
    pub fn ifs(&self) -> &str {
        get_ifs(&self.variables)
    }

    /// Resolve any parameter name: special parameters, dynamic variables,
    /// then the variable table. `None` means unset.
    pub fn lookup(&self, name: &str) -> Option<String> {
        if is_special_parameter(name) {
            return self.special_variable(name);
        }
        if let Some(value) = self.variables.get(name) {
            return Some(value.clone());
        }
        if DYNAMIC_VARIABLES.contains(&name) {
            return self.dynamic_variable(name);
        }
        None
    }

    /// Accessor for `@ * # ? $ ! -` and positional digits.
    pub fn special_variable(&self, name: &str) -> Option<String> {
        match name {
            "@" => Some(self.positional.join(" ")),
            "*" => Some(self.positional.join(get_ifs_separator(&self.variables))),
            "#" => Some(self.positional.len().to_string()),
            "?" => Some(self.last_status.to_string()),
            "$" => Some(self.shell_pid.to_string()),
            "!" => self.last_background_pid.map(|pid| pid.to_string()),
            "-" => Some(self.option_flags()),
            "0" => Some(self.shell_name.clone()),
            digits => {
                let index: usize = digits.parse().ok()?;
                self.positional.get(index.checked_sub(1)?).cloned()
            }
        }
    }

    fn dynamic_variable(&self, name: &str) -> Option<String> {
        match name {
            "RANDOM" => Some(rand::thread_rng().gen_range(0..32768).to_string()),
            "SECONDS" => Some((Utc::now() - self.started_at).num_seconds().to_string()),
            "EPOCHSECONDS" => Some(Utc::now().timestamp().to_string()),
            _ => None,
        }
    }

    /// Value of `$-`.
    pub fn option_flags(&self) -> String {
        let mut flags = String::new();
        if self.options.noglob {
            flags.push('f');
        }
        if self.options.nounset {
            flags.push('u');
        }
        flags
    }

    /// Keep process-substitution children for the job subsystem to reap,
    /// along with the pipe ends their paths refer to.
    pub fn retain_process_substitutions(
        &mut self,
        pids: impl IntoIterator<Item = u32>,
        fds: impl IntoIterator<Item = OwnedFd>,
    ) {
        self.process_substitution_pids.extend(pids);
        self.process_substitution_fds.extend(fds);
    }

    /// Close the retained pipe ends and hand back the children to reap.
    /// Call once the command that received the paths has run.
    pub fn release_process_substitutions(&mut self) -> Vec<u32> {
        self.process_substitution_fds.clear();
        std::mem::take(&mut self.process_substitution_pids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_context() -> ExpansionContext {
        let mut ctx = ExpansionContext::new();
        ctx.set_positional_params(vec!["a".to_string(), "b c".to_string()]);
        ctx.define_variable("FOO", "bar");
        ctx
    }

    #[test]
    fn test_special_variables() {
        let mut ctx = make_context();
        ctx.last_status = 3;
        assert_eq!(ctx.lookup("#").as_deref(), Some("2"));
        assert_eq!(ctx.lookup("1").as_deref(), Some("a"));
        assert_eq!(ctx.lookup("2").as_deref(), Some("b c"));
        assert_eq!(ctx.lookup("3"), None);
        assert_eq!(ctx.lookup("?").as_deref(), Some("3"));
        assert_eq!(ctx.lookup("@").as_deref(), Some("a b c"));
        assert_eq!(ctx.lookup("!"), None);
        assert_eq!(ctx.lookup("0").as_deref(), Some("sh"));
    }

    #[test]
    fn test_star_joins_with_first_ifs_char() {
        let mut ctx = make_context();
        ctx.define_variable("IFS", ":-");
        assert_eq!(ctx.lookup("*").as_deref(), Some("a:b c"));
        ctx.define_variable("IFS", "");
        assert_eq!(ctx.lookup("*").as_deref(), Some("ab c"));
    }

    #[test]
    fn test_ordinary_and_dynamic_variables() {
        let mut ctx = make_context();
        assert_eq!(ctx.lookup("FOO").as_deref(), Some("bar"));
        assert_eq!(ctx.lookup("MISSING"), None);
        let random: u32 = ctx.lookup("RANDOM").unwrap().parse().unwrap();
        assert!(random < 32768);
        ctx.define_variable("RANDOM", "7");
        assert_eq!(ctx.lookup("RANDOM").as_deref(), Some("7"));
        ctx.unset_variable("FOO");
        assert_eq!(ctx.lookup("FOO"), None);
    }

    #[test]
    fn test_option_flags() {
        let mut ctx = ExpansionContext::new();
        assert_eq!(ctx.lookup("-").as_deref(), Some(""));
        ctx.options.noglob = true;
        ctx.options.nounset = true;
        assert_eq!(ctx.option_flags(), "fu");
    }

    #[test]
    fn test_ifs_default_and_empty() {
        let mut ctx = ExpansionContext::new();
        assert_eq!(ctx.ifs(), " \t\n");
        ctx.define_variable("IFS", "");
        assert_eq!(ctx.ifs(), "");
    }

    #[test]
    fn test_release_process_substitutions() {
        let mut ctx = ExpansionContext::new();
        let fd = OwnedFd::from(std::fs::File::open("/dev/null").unwrap());
        ctx.retain_process_substitutions(vec![11, 12], vec![fd]);
        assert_eq!(ctx.process_substitution_fds.len(), 1);

        assert_eq!(ctx.release_process_substitutions(), vec![11, 12]);
        assert!(ctx.process_substitution_pids.is_empty());
        assert!(ctx.process_substitution_fds.is_empty());
        assert!(ctx.release_process_substitutions().is_empty());
    }
}
