//! Pathname Expansion
//!
//! Expands a glob pattern against the filesystem, relative to a working
//! directory. The nullglob/failglob policy for empty results belongs to the
//! caller; this module only reports what matched.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::glob_helpers::ShellPattern;
use crate::interpreter::expansion::glob_escape::{has_glob_pattern, unescape_glob_pattern};

/// Options controlling how names are matched.
#[derive(Debug, Clone, Default)]
pub struct GlobOptions {
    pub dotglob: bool,
    pub extglob: bool,
}

/// Pathname expander rooted at a working directory.
pub struct GlobExpander {
    cwd: PathBuf,
    dotglob: bool,
    extglob: bool,
}

impl GlobExpander {
    pub fn new(cwd: impl Into<PathBuf>, options: GlobOptions) -> Self {
        Self {
            cwd: cwd.into(),
            dotglob: options.dotglob,
            extglob: options.extglob,
        }
    }

    /// Check if a string contains unescaped glob characters.
    pub fn is_glob_pattern(&self, s: &str) -> bool {
        has_glob_pattern(s, self.extglob)
    }

    /// Expand a pattern to the matching paths, sorted ascending.
    ///
    /// Results keep the pattern's form: relative patterns give paths
    /// relative to the working directory, absolute ones give absolute paths,
    /// and a trailing `/` restricts matches to directories.
    pub fn expand(&self, pattern: &str) -> Vec<String> {
        let is_absolute = pattern.starts_with('/');
        let dirs_only = pattern.len() > 1 && pattern.ends_with('/');
        let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();

        let first_glob_idx = match segments.iter().position(|s| self.is_glob_pattern(s)) {
            Some(idx) => idx,
            None => {
                let literal = unescape_glob_pattern(pattern);
                return if self.resolve(&literal).exists() { vec![literal] } else { vec![] };
            }
        };

        let base = segments[..first_glob_idx]
            .iter()
            .map(|s| unescape_glob_pattern(s))
            .collect::<Vec<_>>()
            .join("/");
        let (fs_base, result_prefix) = match (is_absolute, base.is_empty()) {
            (true, true) => (PathBuf::from("/"), "/".to_string()),
            (true, false) => (PathBuf::from(format!("/{}", base)), format!("/{}", base)),
            (false, true) => (self.cwd.clone(), String::new()),
            (false, false) => (self.cwd.join(&base), base),
        };

        let mut results = Vec::new();
        self.expand_segments(&fs_base, &result_prefix, &segments[first_glob_idx..], dirs_only, &mut results);
        results.sort();
        debug!(pattern, matches = results.len(), "glob expanded");
        results
    }

    fn resolve(&self, path: &str) -> PathBuf {
        if path.starts_with('/') {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// Recursively expand path segments with glob patterns.
    fn expand_segments(
        &self,
        fs_path: &Path,
        result_prefix: &str,
        segments: &[&str],
        dirs_only: bool,
        results: &mut Vec<String>,
    ) {
        let Some((current, remaining)) = segments.split_first() else {
            return;
        };

        if !self.is_glob_pattern(current) {
            let name = unescape_glob_pattern(current);
            let path = fs_path.join(&name);
            self.accept(&path, &join_result(result_prefix, &name), remaining, dirs_only, results);
            return;
        }

        let Some(matcher) = ShellPattern::new(current, self.extglob) else {
            return;
        };
        let entries = match fs::read_dir(fs_path) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        let explicit_dot = current.starts_with('.') || current.starts_with("\\.");
        for entry in entries.flatten() {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') && !explicit_dot && !self.dotglob {
                continue;
            }
            if matcher.matches(&name) {
                self.accept(&entry.path(), &join_result(result_prefix, &name), remaining, dirs_only, results);
            }
        }
    }

    /// Record a matched path, or descend into it when segments remain.
    fn accept(
        &self,
        path: &Path,
        result: &str,
        remaining: &[&str],
        dirs_only: bool,
        results: &mut Vec<String>,
    ) {
        if remaining.is_empty() {
            if dirs_only {
                if path.is_dir() {
                    results.push(format!("{}/", result));
                }
            } else if path.symlink_metadata().is_ok() {
                results.push(result.to_string());
            }
        } else if path.is_dir() {
            self.expand_segments(path, result, remaining, dirs_only, results);
        }
    }
}

fn join_result(prefix: &str, name: &str) -> String {
    match prefix {
        "" => name.to_string(),
        "/" => format!("/{}", name),
        _ => format!("{}/{}", prefix, name),
    }
}
