//! Process Substitution Setup
//!
//! Handles `<(cmd)` and `>(cmd)` arguments:
//! - `<(cmd)` : cmd's stdout is readable through the substituted path
//! - `>(cmd)` : writes to the substituted path feed cmd's stdin
//!
//! Each child is started with a pipe; the parent's end stays open without
//! close-on-exec and is named as `/dev/fd/N`, so the command that receives
//! the path inherits it. The parent ends travel back as `OwnedFd`s and
//! close when the caller drops them.

use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::process::{Child, Command, Stdio};

use tracing::debug;

use crate::ast::types::{ProcessDirection, SimpleCommand};
use crate::interpreter::errors::ExpansionError;
use crate::interpreter::expansion::analysis::process_substitution_of;
use crate::interpreter::runtime::{ProcessSubstitutionSetup, ProcessSubstitutions};
use crate::interpreter::types::ExpansionContext;

/// Starts process-substitution children with `<shell> -c`.
#[derive(Debug, Clone)]
pub struct FdProcessSubstitution {
    shell: String,
}

impl Default for FdProcessSubstitution {
    fn default() -> Self {
        Self::new("sh")
    }
}

/// Children started during one setup. Killed and reaped on drop unless
/// handed off with `into_pids`, so a failed setup leaves nothing behind.
struct StartedChildren(Vec<Child>);

impl StartedChildren {
    fn into_pids(mut self) -> Vec<u32> {
        std::mem::take(&mut self.0).iter().map(Child::id).collect()
    }
}

impl Drop for StartedChildren {
    fn drop(&mut self) {
        for child in &mut self.0 {
            let pid = child.id();
            if let Err(e) = child.kill().and_then(|_| child.wait()) {
                debug!(pid, error = %e, "could not reap process substitution");
            }
        }
    }
}

impl FdProcessSubstitution {
    pub fn new(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }

    /// Spawn one child into `started` and return the parent's end of its
    /// pipe.
    fn spawn(
        &self,
        direction: ProcessDirection,
        command: &str,
        ctx: &ExpansionContext,
        started: &mut StartedChildren,
    ) -> Result<OwnedFd, ExpansionError> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .arg(&ctx.shell_name)
            .args(ctx.positional_params())
            .envs(&ctx.variables)
            .current_dir(&ctx.cwd)
            .stderr(Stdio::inherit());
        match direction {
            ProcessDirection::Input => cmd.stdin(Stdio::null()).stdout(Stdio::piped()),
            ProcessDirection::Output => cmd.stdin(Stdio::piped()).stdout(Stdio::inherit()),
        };

        let mut child = cmd
            .spawn()
            .map_err(|e| ExpansionError::ProcessSubstitution(format!("{}: {}", self.shell, e)))?;

        let pipe: Option<OwnedFd> = match direction {
            ProcessDirection::Input => child.stdout.take().map(OwnedFd::from),
            ProcessDirection::Output => child.stdin.take().map(OwnedFd::from),
        };
        started.0.push(child);
        let pipe = pipe.ok_or_else(|| {
            ExpansionError::ProcessSubstitution(format!("{}: no pipe to child", command))
        })?;

        clear_cloexec(pipe.as_raw_fd())?;
        Ok(pipe)
    }
}

/// Let `fd` survive exec into the command that receives its path.
fn clear_cloexec(fd: RawFd) -> Result<(), ExpansionError> {
    // SAFETY: fd is borrowed from a live OwnedFd.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags < 0 {
        return Err(ExpansionError::ProcessSubstitution(
            std::io::Error::last_os_error().to_string(),
        ));
    }
    // SAFETY: as above; only the FD_CLOEXEC bit changes.
    if unsafe { libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC) } < 0 {
        return Err(ExpansionError::ProcessSubstitution(
            std::io::Error::last_os_error().to_string(),
        ));
    }
    Ok(())
}

impl ProcessSubstitutionSetup for FdProcessSubstitution {
    fn setup(
        &self,
        command: &SimpleCommand,
        ctx: &ExpansionContext,
    ) -> Result<ProcessSubstitutions, ExpansionError> {
        let mut started = StartedChildren(Vec::new());
        let mut result = ProcessSubstitutions::default();

        for word in &command.words {
            match process_substitution_of(word) {
                Some(sub) => {
                    let fd = self.spawn(sub.direction, &sub.command, ctx, &mut started)?;
                    let path = format!("/dev/fd/{}", fd.as_raw_fd());
                    debug!(command = %sub.command, path = %path, "started process substitution");
                    result.rewritten_args.push(format!("{}{}", path, sub.suffix));
                    result.fd_paths.push(path);
                    result.fds.push(fd);
                }
                None => result.rewritten_args.push(word.source_text()),
            }
        }
        result.child_pids = started.into_pids();
        Ok(result)
    }
}
