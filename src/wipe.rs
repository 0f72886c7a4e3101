//! Selective removal of the working tree.
//!
//! Everything under the root is removed except `.git` directories, protected
//! paths, nested repositories, and directories that contain one of those.
//! Those ancestor directories are kept as containers and their children are
//! processed one by one instead of being removed in bulk.
//!
//! A nested repository is any directory below the root holding its own `.git`
//! entry. The stash cannot carry it, so it is kept whole like a protected path.

use crate::paths::{ProtectedPath, ProtectedPathSet};
use crate::vcs::GIT_DIR;

use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What to do with a single directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeDecision {
    /// Leave the entry and everything below it alone
    Skip,
    /// Keep the directory itself and decide for each child
    Recurse,
    /// Remove the entry (recursively for directories)
    Delete,
}

/// Decide the fate of an entry from its root-relative path alone.
///
/// `rel` is the normalized path of the entry relative to the root and `name`
/// its final component.
pub fn decide(rel: &str, name: &str, is_dir: bool, protected: &ProtectedPathSet) -> WipeDecision {
    if name == GIT_DIR || protected.covers(rel) {
        return WipeDecision::Skip;
    }
    if is_dir && protected.has_descendant_of(rel) {
        return WipeDecision::Recurse;
    }
    WipeDecision::Delete
}

/// An entry that could not be listed or removed
#[derive(Debug)]
pub struct WipeWarning {
    pub path: PathBuf,
    pub error: io::Error,
}

/// Outcome of a wipe
#[derive(Debug, Default)]
pub struct WipeResult {
    /// Root-relative paths removed; a removed directory counts once
    pub removed: Vec<String>,
    pub warnings: Vec<WipeWarning>,
    /// Nested repositories that were left in place
    pub nested_repositories: Vec<ProtectedPath>,
}

/// An entry a wipe would remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRemoval {
    pub rel: String,
    pub is_dir: bool,
}

trait Visitor {
    fn delete(&mut self, rel: &str, path: &Path, is_dir: bool);
    fn warn(&mut self, path: &Path, error: io::Error);
}

/// Preserve-ancestor walk shared by `wipe` and `plan`
fn walk(dir: &Path, rel_dir: &str, protected: &ProtectedPathSet, visitor: &mut dyn Visitor) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            visitor.warn(dir, err);
            return;
        }
    };

    for entry_result in entries {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                visitor.warn(dir, err);
                continue;
            }
        };

        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = if rel_dir.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", rel_dir, name)
        };

        // file_type() does not follow symlinks, so a link to a directory is removed as a file
        let is_dir = match entry.file_type() {
            Ok(ft) => ft.is_dir(),
            Err(err) => {
                visitor.warn(&path, err);
                continue;
            }
        };

        match decide(&rel, &name, is_dir, protected) {
            WipeDecision::Skip => {
                tracing::debug!(path = %rel, "keeping");
            }
            WipeDecision::Recurse => walk(&path, &rel, protected, visitor),
            WipeDecision::Delete => visitor.delete(&rel, &path, is_dir),
        }
    }
}

struct Remover {
    result: WipeResult,
}

impl Visitor for Remover {
    fn delete(&mut self, rel: &str, path: &Path, is_dir: bool) {
        let removal = if is_dir {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        match removal {
            Ok(()) => {
                tracing::debug!(path = %rel, "removed");
                self.result.removed.push(rel.to_string());
            }
            Err(err) => self.warn(path, err),
        }
    }

    fn warn(&mut self, path: &Path, error: io::Error) {
        tracing::warn!(path = %path.display(), %error, "could not remove");
        self.result.warnings.push(WipeWarning {
            path: path.to_path_buf(),
            error,
        });
    }
}

/// Root-relative directories below `root` that hold their own `.git` entry, sorted.
///
/// The root's own `.git` does not count. The search does not descend into a
/// `.git` directory.
pub fn find_nested_repositories(root: &Path) -> Vec<ProtectedPath> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .follow_links(false)
        .filter_entry(|entry| {
            !entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|name| name == GIT_DIR)
        })
        .build();

    let mut found = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(%err, "skipping entry while looking for nested repositories");
                continue;
            }
        };
        if entry.depth() < 2 || entry.file_name() != GIT_DIR {
            continue;
        }
        let repo = entry
            .path()
            .parent()
            .and_then(|parent| parent.strip_prefix(root).ok())
            .and_then(ProtectedPath::from_relative);
        if let Some(repo) = repo {
            tracing::debug!(path = %repo, "nested repository");
            found.push(repo);
        }
    }
    found.sort();
    found.dedup();
    found
}

/// The protected set plus every nested repository
fn with_nested_repositories(
    root: &Path,
    protected: &ProtectedPathSet,
) -> (ProtectedPathSet, Vec<ProtectedPath>) {
    let nested = find_nested_repositories(root);
    let mut keep = protected.clone();
    keep.extend(nested.iter().cloned());
    (keep, nested)
}

/// Remove everything under `root` that is not `.git`, protected, a nested
/// repository, or an ancestor of one of those.
///
/// Failures are collected as warnings; the walk always runs to completion.
pub fn wipe(root: &Path, protected: &ProtectedPathSet) -> WipeResult {
    let (keep, nested) = with_nested_repositories(root, protected);
    let mut remover = Remover {
        result: WipeResult::default(),
    };
    walk(root, "", &keep, &mut remover);
    remover.result.nested_repositories = nested;
    remover.result
}

struct Planner {
    planned: Vec<PlannedRemoval>,
}

impl Visitor for Planner {
    fn delete(&mut self, rel: &str, _path: &Path, is_dir: bool) {
        self.planned.push(PlannedRemoval {
            rel: rel.to_string(),
            is_dir,
        });
    }

    fn warn(&mut self, path: &Path, error: io::Error) {
        tracing::warn!(path = %path.display(), %error, "could not inspect");
    }
}

/// Entries `wipe` would remove, sorted, without touching the filesystem
pub fn plan(root: &Path, protected: &ProtectedPathSet) -> Vec<PlannedRemoval> {
    let (keep, _) = with_nested_repositories(root, protected);
    let mut planner = Planner {
        planned: Vec::new(),
    };
    walk(root, "", &keep, &mut planner);
    planner.planned.sort_by(|a, b| a.rel.cmp(&b.rel));
    planner.planned
}
