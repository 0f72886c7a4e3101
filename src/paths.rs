//! Protected paths: normalized, root-relative, collected with set semantics.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path};

/// A path relative to the repository root, forward-slash separated, with no
/// leading `./`, no trailing slash and no `..` components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtectedPath(String);

impl ProtectedPath {
    /// Normalize a root-relative path string.
    ///
    /// Returns `None` for empty paths, absolute paths and paths that climb
    /// out of the root.
    pub fn new(raw: &str) -> Option<Self> {
        let unified = raw.replace('\\', "/");
        if unified.starts_with('/') {
            return None;
        }

        let mut parts = Vec::new();
        for part in unified.split('/') {
            match part {
                "" | "." => continue,
                ".." => return None,
                other => parts.push(other),
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(Self(parts.join("/")))
        }
    }

    /// Build from a path already made relative to the root (e.g. via `strip_prefix`).
    /// Non-UTF-8 components are rejected.
    pub fn from_relative(path: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => parts.push(name.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(Self(parts.join("/")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `rel` equals this path or lies below it.
    pub fn covers(&self, rel: &str) -> bool {
        rel == self.0 || is_below(rel, &self.0)
    }

    /// True if this path lies strictly below `rel`.
    pub fn is_descendant_of(&self, rel: &str) -> bool {
        is_below(&self.0, rel)
    }
}

fn is_below(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

impl fmt::Display for ProtectedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ProtectedPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProtectedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Set of protected paths. Duplicates collapse; insertion order is kept for display.
#[derive(Debug, Clone, Default)]
pub struct ProtectedPathSet {
    order: Vec<ProtectedPath>,
    members: HashSet<ProtectedPath>,
}

impl ProtectedPathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the path was already present
    pub fn insert(&mut self, path: ProtectedPath) -> bool {
        if self.members.contains(&path) {
            return false;
        }
        self.members.insert(path.clone());
        self.order.push(path);
        true
    }

    /// Exact membership of a normalized relative path
    pub fn contains(&self, rel: &str) -> bool {
        self.members.contains(rel)
    }

    /// True if `rel` is protected itself or sits inside a protected directory
    pub fn covers(&self, rel: &str) -> bool {
        self.order.iter().any(|p| p.covers(rel))
    }

    /// True if some protected path begins with `<rel>/`
    pub fn has_descendant_of(&self, rel: &str) -> bool {
        self.order.iter().any(|p| p.is_descendant_of(rel))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtectedPath> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Extend<ProtectedPath> for ProtectedPathSet {
    fn extend<I: IntoIterator<Item = ProtectedPath>>(&mut self, iter: I) {
        for path in iter {
            self.insert(path);
        }
    }
}

impl FromIterator<ProtectedPath> for ProtectedPathSet {
    fn from_iter<I: IntoIterator<Item = ProtectedPath>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a ProtectedPathSet {
    type Item = &'a ProtectedPath;
    type IntoIter = std::slice::Iter<'a, ProtectedPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}
