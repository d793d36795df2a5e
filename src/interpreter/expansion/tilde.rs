//! Tilde Expansion
//!
//! Replaces a leading `~` prefix with a directory:
//! - `~` and `~/...` use HOME, falling back to the passwd entry of the
//!   current user
//! - `~user` uses that user's passwd entry
//! - `~+` is PWD and `~-` is OLDPWD
//!
//! Anything unresolvable stays literal.

use std::ffi::{CStr, CString};

use crate::interpreter::types::ExpansionContext;

/// Resolves `~` prefixes against the session and the user database.
pub struct TildeExpander<'a> {
    ctx: &'a ExpansionContext,
}

impl<'a> TildeExpander<'a> {
    pub fn new(ctx: &'a ExpansionContext) -> Self {
        Self { ctx }
    }

    /// Expand a leading tilde prefix, which runs up to the first `/`.
    pub fn expand(&self, value: &str) -> String {
        let Some(rest) = value.strip_prefix('~') else {
            return value.to_string();
        };
        let (prefix, suffix) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };

        match self.resolve(prefix) {
            Some(dir) => format!("{}{}", dir, suffix),
            None => value.to_string(),
        }
    }

    /// Resolve the tilde prefix of a word's leading unquoted literal.
    ///
    /// The prefix ends at the first `/`; with no `/` in the literal it only
    /// counts when nothing else follows in the word. Returns the directory
    /// and the remaining raw text, or None when the prefix stays literal.
    pub fn expand_word_prefix<'r>(&self, raw: &'r str, word_continues: bool) -> Option<(String, &'r str)> {
        let rest = raw.strip_prefix('~')?;
        let (prefix, suffix) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None if word_continues => return None,
            None => (rest, ""),
        };
        self.resolve(prefix).map(|dir| (dir, suffix))
    }

    fn resolve(&self, prefix: &str) -> Option<String> {
        match prefix {
            "" => self
                .ctx
                .get_variable("HOME")
                .map(str::to_string)
                .or_else(current_user_home),
            "+" => self.ctx.get_variable("PWD").map(str::to_string),
            "-" => self.ctx.get_variable("OLDPWD").map(str::to_string),
            user if is_login_name(user) => user_home(user),
            _ => None,
        }
    }
}

fn is_login_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// Home directory of a named user, from the passwd database.
fn user_home(name: &str) -> Option<String> {
    let c_name = CString::new(name).ok()?;
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut buf = vec![0 as libc::c_char; 4096];
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    // SAFETY: every pointer refers to a live local; buf.len() is its capacity.
    let rc = unsafe {
        libc::getpwnam_r(c_name.as_ptr(), &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
    };
    passwd_dir(rc, result, &pwd)
}

/// Home directory of the current user, for `~` with HOME unset.
fn current_user_home() -> Option<String> {
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut buf = vec![0 as libc::c_char; 4096];
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    // SAFETY: as in user_home.
    let rc = unsafe {
        libc::getpwuid_r(libc::getuid(), &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
    };
    passwd_dir(rc, result, &pwd)
}

fn passwd_dir(rc: libc::c_int, result: *mut libc::passwd, pwd: &libc::passwd) -> Option<String> {
    if rc != 0 || result.is_null() || pwd.pw_dir.is_null() {
        return None;
    }
    // SAFETY: on success pw_dir points to a NUL-terminated string inside buf,
    // which outlives this call.
    let dir = unsafe { CStr::from_ptr(pwd.pw_dir) };
    Some(dir.to_string_lossy().into_owned())
}
