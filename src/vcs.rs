//! Git collaborator: repository detection, stash, restore and pop.

use crate::paths::ProtectedPathSet;

use anyhow::{bail, Context, Result};
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Version-control metadata directory; never traversed, matched or removed
pub const GIT_DIR: &str = ".git";

/// A stash entry created by this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashRecord {
    pub commit: String,
}

impl StashRecord {
    pub fn short_id(&self) -> &str {
        let end = self.commit.len().min(7);
        &self.commit[..end]
    }
}

/// Result of reapplying the stash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopOutcome {
    Applied,
    /// The stash could not be applied cleanly and is still in the stash list
    Conflicted(String),
}

/// Operations the reset protocol needs from version control
pub trait Vcs {
    /// Top-level directory of the repository containing the working directory
    fn repository_root(&self) -> Result<PathBuf>;

    /// True if there are staged, unstaged or untracked changes
    fn has_uncommitted_changes(&self) -> Result<bool>;

    /// Stash tracked and untracked changes, leaving protected paths on disk.
    /// Returns `None` when there was nothing to stash.
    fn stash_push(&self, message: &str, protected: &ProtectedPathSet)
        -> Result<Option<StashRecord>>;

    /// Check out every tracked file from `HEAD` except protected paths.
    /// Returns the number of files restored.
    fn restore_tracked(&self, protected: &ProtectedPathSet) -> Result<usize>;

    /// Reapply and drop the most recent stash
    fn stash_pop(&self) -> Result<PopOutcome>;
}

/// `Vcs` backed by the `git` executable
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    // Once known, commands run from the root: the starting directory may be wiped
    root: OnceCell<PathBuf>,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Git {
            workdir: workdir.into(),
            root: OnceCell::new(),
        }
    }

    /// Directory git commands currently run in
    pub fn workdir(&self) -> &Path {
        self.root.get().unwrap_or(&self.workdir)
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        let dir = self.workdir();
        tracing::debug!(?args, dir = %dir.display(), "running git");
        Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .with_context(|| format!("Failed to run git {}", args.join(" ")))
    }

    /// Run git and return trimmed stdout, failing with git's stderr on a non-zero exit
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Resolve a revision, `None` if it does not exist
    fn verify(&self, rev: &str) -> Result<Option<String>> {
        let output = self.output(&["rev-parse", "--quiet", "--verify", rev])?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
        } else {
            Ok(None)
        }
    }

    fn tracked_files_at_head(&self) -> Result<Vec<String>> {
        let output = self.output(&["ls-tree", "-r", "-z", "--full-tree", "--name-only", "HEAD"])?;
        if !output.status.success() {
            bail!(
                "git ls-tree failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .split('\0')
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Whole-tree pathspec with every protected path excluded
pub fn protected_pathspec(protected: &ProtectedPathSet) -> Vec<String> {
    let mut spec = vec![":/".to_string()];
    spec.extend(
        protected
            .iter()
            .map(|p| format!(":(top,exclude,literal){}", p)),
    );
    spec
}

impl Vcs for Git {
    fn repository_root(&self) -> Result<PathBuf> {
        let output = self.output(&["rev-parse", "--show-toplevel"])?;
        if !output.status.success() {
            bail!(
                "{} is not inside a git repository",
                self.workdir.display()
            );
        }
        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if root.is_empty() {
            // Bare repositories and the inside of .git have no working tree
            bail!("{} has no working tree", self.workdir.display());
        }
        let root = PathBuf::from(root);
        let _ = self.root.set(root.clone());
        Ok(root)
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        let status = self.run(&["status", "--porcelain", "--untracked-files=all"])?;
        Ok(!status.is_empty())
    }

    fn stash_push(
        &self,
        message: &str,
        protected: &ProtectedPathSet,
    ) -> Result<Option<StashRecord>> {
        let before = self.verify("refs/stash")?;

        let pathspec = protected_pathspec(protected);
        let mut args = vec!["stash", "push", "--include-untracked", "--message", message];
        if !protected.is_empty() {
            args.push("--");
            args.extend(pathspec.iter().map(String::as_str));
        }
        self.run(&args)?;

        let after = self.verify("refs/stash")?;
        match after {
            Some(commit) if before.as_deref() != Some(commit.as_str()) => {
                Ok(Some(StashRecord { commit }))
            }
            _ => Ok(None),
        }
    }

    fn restore_tracked(&self, protected: &ProtectedPathSet) -> Result<usize> {
        if self.verify("HEAD^{commit}")?.is_none() {
            tracing::debug!("HEAD is unborn, nothing to restore");
            return Ok(0);
        }

        let restorable = self
            .tracked_files_at_head()?
            .into_iter()
            .filter(|file| !protected.covers(file))
            .count();
        if restorable == 0 {
            return Ok(0);
        }

        let pathspec = protected_pathspec(protected);
        let mut args = vec!["checkout", "HEAD", "--"];
        args.extend(pathspec.iter().map(String::as_str));
        self.run(&args)?;

        Ok(restorable)
    }

    fn stash_pop(&self) -> Result<PopOutcome> {
        let output = self.output(&["stash", "pop"])?;
        if output.status.success() {
            return Ok(PopOutcome::Applied);
        }

        let mut detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if detail.is_empty() {
            detail = String::from_utf8_lossy(&output.stdout).trim().to_string();
        }
        Ok(PopOutcome::Conflicted(detail))
    }
}
