//! git-scrub - Reset a working tree without losing work
//!
//! git-scrub brings a git working tree back to the state of its last commit.
//! Uncommitted work (tracked and untracked) is stashed first and reapplied
//! afterwards, and a set of protected paths (local secrets, generated config)
//! is never touched at all.
//!
//! ## Protocol
//!
//! 1. Locate the repository and resolve the protected set (`protect`, `patterns`)
//! 2. Stash uncommitted changes if there are any (`vcs`)
//! 3. Remove everything except `.git` and protected paths (`wipe`)
//! 4. Restore tracked files from `HEAD`, then pop the stash (`reset`)
//!
//! A failed stash aborts before anything is deleted. A stash that does not
//! pop cleanly is left in the stash list for the user to inspect.

pub mod config;
pub mod paths;
pub mod patterns;
pub mod protect;
pub mod report;
pub mod reset;
pub mod vcs;
pub mod wipe;

// Re-export commonly used items
pub use config::ProtectConfig;
pub use paths::{ProtectedPath, ProtectedPathSet};
pub use patterns::{Matcher, PatternMatches};
pub use protect::{
    resolve, DialoguerPrompter, Prompter, ProtectionSource, SecretChoice, SecretSelection,
};
pub use report::{Reporter, TerminalReporter};
pub use reset::{
    Orchestrator, Phase, PopStatus, RepoState, ResetOptions, ResetPreview, ResetSummary,
    RunOutcome,
};
pub use vcs::{Git, PopOutcome, StashRecord, Vcs, GIT_DIR};
pub use wipe::{
    decide, find_nested_repositories, plan, wipe, PlannedRemoval, WipeDecision, WipeResult,
};
