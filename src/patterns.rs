//! Protection pattern matching against the working tree.
//!
//! Patterns are glob-style and evaluated relative to the repository root:
//! `*` and `?` stay inside one path component, `**` spans directories.
//! Hidden entries (any component starting with `.`) only match patterns that
//! ask for dot-files explicitly, e.g. `.env` or `config/.env.*`.

use crate::config::ProtectConfig;
use crate::paths::ProtectedPath;
use crate::vcs::GIT_DIR;

use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Component, Path};

/// Matches found for one or more patterns, plus non-fatal problems met on the way
#[derive(Debug, Default)]
pub struct PatternMatches {
    pub paths: Vec<ProtectedPath>,
    pub warnings: Vec<String>,
}

/// A single compiled protection pattern
struct CompiledPattern {
    matcher: GlobMatcher,
    dotfiles: bool,
}

/// Resolves protection patterns to concrete root-relative paths
#[derive(Debug, Clone)]
pub struct Matcher {
    excluded_dirs: Vec<String>,
    secret_patterns: Vec<String>,
}

impl Matcher {
    pub fn new(config: &ProtectConfig) -> Self {
        let mut excluded_dirs = config.scan.excluded_dirs.clone();
        // The metadata directory is excluded no matter what the config says
        if !excluded_dirs.iter().any(|d| d == GIT_DIR) {
            excluded_dirs.push(GIT_DIR.to_string());
        }

        Matcher {
            excluded_dirs,
            secret_patterns: config.secrets.patterns.clone(),
        }
    }

    /// Sorted paths under `root` matching `pattern`
    pub fn match_pattern(&self, root: &Path, pattern: &str) -> PatternMatches {
        self.match_all(root, &[pattern.to_string()])
    }

    /// Union of the matches of every pattern, sorted and de-duplicated
    pub fn match_all(&self, root: &Path, patterns: &[String]) -> PatternMatches {
        let mut warnings = Vec::new();
        let mut compiled = Vec::new();

        for pattern in patterns {
            match compile_pattern(pattern) {
                Ok(c) => compiled.push(c),
                Err(message) => warnings.push(message),
            }
        }

        if compiled.is_empty() {
            return PatternMatches {
                paths: Vec::new(),
                warnings,
            };
        }

        let wants_hidden = compiled.iter().any(|c| c.dotfiles);
        let excluded = self.excluded_dirs.clone();

        let walker = WalkBuilder::new(root)
            .hidden(!wants_hidden)
            // Protection is about files git does not know, so ignore files must not hide them
            .git_ignore(false)
            .ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !excluded.iter().any(|d| d.as_str() == name.as_ref())
            })
            .build();

        let mut found = BTreeSet::new();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    warnings.push(format!("Failed to access entry: {}", err));
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };

            let hidden = is_hidden(rel);
            let matched = compiled
                .iter()
                .any(|c| (c.dotfiles || !hidden) && c.matcher.is_match(rel));
            if !matched {
                continue;
            }

            match ProtectedPath::from_relative(rel) {
                Some(path) => {
                    found.insert(path);
                }
                None => warnings.push(format!(
                    "Skipping non UTF-8 path: {}",
                    entry.path().display()
                )),
            }
        }

        tracing::debug!(
            patterns = ?patterns,
            matches = found.len(),
            "resolved protection patterns"
        );

        PatternMatches {
            paths: found.into_iter().collect(),
            warnings,
        }
    }

    /// Union of every secret-file convention match
    pub fn match_secret_files(&self, root: &Path) -> PatternMatches {
        self.match_all(root, &self.secret_patterns)
    }
}

/// True if the pattern names dot-files explicitly
pub fn requests_dotfiles(pattern: &str) -> bool {
    pattern.split('/').any(|segment| segment.starts_with('.'))
}

/// Strip root markers and trailing slashes; reject patterns that climb out of the root
fn normalize_pattern(pattern: &str) -> Result<String, String> {
    let trimmed = pattern.trim();
    let without_root = trimmed
        .strip_prefix("./")
        .unwrap_or(trimmed)
        .trim_start_matches('/');
    let normalized = without_root.trim_end_matches('/');

    if normalized.is_empty() {
        return Err(format!("Ignoring empty protection pattern '{}'", pattern));
    }
    if normalized.split('/').any(|segment| segment == "..") {
        return Err(format!(
            "Ignoring protection pattern '{}': it points outside the repository",
            pattern
        ));
    }

    Ok(normalized.to_string())
}

fn compile_pattern(pattern: &str) -> Result<CompiledPattern, String> {
    let normalized = normalize_pattern(pattern)?;

    let glob = GlobBuilder::new(&normalized)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map_err(|e| format!("Ignoring invalid protection pattern '{}': {}", pattern, e))?;

    Ok(CompiledPattern {
        matcher: glob.compile_matcher(),
        dotfiles: requests_dotfiles(&normalized),
    })
}

fn is_hidden(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
