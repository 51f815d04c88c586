//! Git operations
//!
//! Finds migration files changed relative to a base ref, for `--git-base`.
//! Uses the system `git` binary; it must be in PATH.

use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::error::GitError;

/// Client for git operations
pub struct GitClient {
    /// Working directory for git commands
    working_dir: Option<PathBuf>,
}

impl Default for GitClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitClient {
    /// Create a new git client for current directory
    pub fn new() -> Self {
        Self { working_dir: None }
    }

    /// Create a git client for a specific directory
    pub fn in_dir(path: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(path.into()),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let mut cmd = Command::new("git");
        cmd.args(args);

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|_| GitError::NotARepository)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                message: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// File names (not paths) under the working directory that differ from `base`
    ///
    /// Includes uncommitted changes, so a migration being written locally is
    /// linted before it is committed.
    pub async fn changed_files(&self, base: &str) -> Result<Vec<String>, GitError> {
        let stdout = self
            .run(&["diff", "--name-only", "--relative", base, "--", "."])
            .await?;
        let untracked = self
            .run(&["ls-files", "--others", "--exclude-standard", "--", "."])
            .await?;

        let mut names: Vec<String> = stdout
            .lines()
            .chain(untracked.lines())
            .filter_map(|line| {
                Path::new(line.trim())
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        names.dedup();

        debug!("{} files changed relative to {}", names.len(), base);
        Ok(names)
    }
}
