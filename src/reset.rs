//! The reset protocol: stash, wipe, restore, pop.
//!
//! Phases run in a fixed order with no way back:
//!
//! `Init → DirtyCheck → (Stashing)? → Wiping → Restoring → (Popping)? → Done`
//!
//! Nothing destructive happens before `Wiping`, and `Wiping` is refused while
//! a dirty tree has not been stashed successfully.

use crate::config::ProtectConfig;
use crate::paths::{ProtectedPath, ProtectedPathSet};
use crate::patterns::Matcher;
use crate::protect::{resolve, Prompter, ProtectionSource};
use crate::report::Reporter;
use crate::vcs::{PopOutcome, StashRecord, Vcs};
use crate::wipe::{self, PlannedRemoval};

use anyhow::{bail, Context, Result};
use chrono::Local;
use std::fmt;
use std::path::PathBuf;

/// Steps of the reset protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    DirtyCheck,
    Stashing,
    Wiping,
    Restoring,
    Popping,
    Done,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Init => "Init",
            Phase::DirtyCheck => "DirtyCheck",
            Phase::Stashing => "Stashing",
            Phase::Wiping => "Wiping",
            Phase::Restoring => "Restoring",
            Phase::Popping => "Popping",
            Phase::Done => "Done",
        }
    }

    /// Legal forward transitions
    pub fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Init, DirtyCheck)
                | (DirtyCheck, Stashing)
                | (DirtyCheck, Wiping)
                | (Stashing, Wiping)
                | (Wiping, Restoring)
                | (Restoring, Popping)
                | (Restoring, Done)
                | (Popping, Done)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the tree had uncommitted changes when the run started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
    Clean,
    Dirty,
}

/// What happened to the stash at the end of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopStatus {
    Applied,
    Skipped,
    Conflicted,
}

impl fmt::Display for PopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PopStatus::Applied => "applied",
            PopStatus::Skipped => "skipped",
            PopStatus::Conflicted => "conflicted",
        };
        f.write_str(s)
    }
}

/// Tracks the current phase and refuses illegal or unsafe transitions
#[derive(Debug)]
pub struct Protocol {
    phase: Phase,
    visited: Vec<Phase>,
    repo_state: Option<RepoState>,
    stashed: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol {
            phase: Phase::Init,
            visited: vec![Phase::Init],
            repo_state: None,
            stashed: false,
        }
    }
}

impl Protocol {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn visited(&self) -> &[Phase] {
        &self.visited
    }

    pub fn record_repo_state(&mut self, state: RepoState) {
        self.repo_state = Some(state);
    }

    /// Mark that the stash step finished without error
    pub fn record_stashed(&mut self) {
        self.stashed = true;
    }

    pub fn advance(&mut self, next: Phase) -> Result<()> {
        if !self.phase.can_advance_to(next) {
            bail!("illegal phase transition {} -> {}", self.phase, next);
        }
        if next == Phase::Wiping {
            match self.repo_state {
                None => bail!("refusing to wipe before the dirty check"),
                Some(RepoState::Dirty) if !self.stashed => {
                    bail!("refusing to wipe: uncommitted changes were not stashed")
                }
                _ => {}
            }
        }
        self.phase = next;
        self.visited.push(next);
        Ok(())
    }
}

/// Inputs for a single run
#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    pub sources: Vec<ProtectionSource>,
    pub dry_run: bool,
}

/// Outcome of a completed run
#[derive(Debug)]
pub struct ResetSummary {
    pub root: PathBuf,
    pub phases: Vec<Phase>,
    pub repo_state: RepoState,
    pub protected: ProtectedPathSet,
    pub removed: usize,
    pub wipe_warnings: usize,
    pub restored: usize,
    pub stash: Option<StashRecord>,
    pub pop: PopStatus,
}

/// Outcome of a dry run
#[derive(Debug)]
pub struct ResetPreview {
    pub root: PathBuf,
    pub repo_state: RepoState,
    pub protected: ProtectedPathSet,
    pub nested_repositories: Vec<ProtectedPath>,
    pub planned: Vec<PlannedRemoval>,
}

/// Either a finished reset or a preview of one
#[derive(Debug)]
pub enum RunOutcome {
    Reset(ResetSummary),
    Preview(ResetPreview),
}

/// Drives the reset protocol against a `Vcs`
pub struct Orchestrator<'a> {
    config: &'a ProtectConfig,
    vcs: &'a dyn Vcs,
    prompter: &'a mut dyn Prompter,
    reporter: &'a mut dyn Reporter,
    protocol: Protocol,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a ProtectConfig,
        vcs: &'a dyn Vcs,
        prompter: &'a mut dyn Prompter,
        reporter: &'a mut dyn Reporter,
    ) -> Self {
        Orchestrator {
            config,
            vcs,
            prompter,
            reporter,
            protocol: Protocol::default(),
        }
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn run(&mut self, options: &ResetOptions) -> Result<RunOutcome> {
        // Init
        self.reporter.phase_started(Phase::Init, "Locating repository");
        let root = self
            .vcs
            .repository_root()
            .context("Init: not inside a git repository, nothing was changed")?;
        self.reporter
            .phase_succeeded(Phase::Init, &format!("Repository root: {}", root.display()));

        // The only step that may wait on the user; it happens before anything destructive
        let matcher = Matcher::new(self.config);
        let protected = resolve(
            &root,
            &options.sources,
            &matcher,
            &mut *self.prompter,
            &mut *self.reporter,
        )
        .context("Failed to resolve protected paths, nothing was changed")?;

        // DirtyCheck
        self.protocol.advance(Phase::DirtyCheck)?;
        self.reporter
            .phase_started(Phase::DirtyCheck, "Checking for uncommitted changes");
        let dirty = self
            .vcs
            .has_uncommitted_changes()
            .context("DirtyCheck: could not read repository status, nothing was changed")?;
        let repo_state = if dirty {
            RepoState::Dirty
        } else {
            RepoState::Clean
        };
        self.protocol.record_repo_state(repo_state);
        let state_message = match repo_state {
            RepoState::Dirty => "Uncommitted changes found",
            RepoState::Clean => "Working tree is clean",
        };
        self.reporter.phase_succeeded(Phase::DirtyCheck, state_message);

        if options.dry_run {
            let planned = wipe::plan(&root, &protected);
            let nested_repositories = wipe::find_nested_repositories(&root);
            return Ok(RunOutcome::Preview(ResetPreview {
                root,
                repo_state,
                protected,
                nested_repositories,
                planned,
            }));
        }

        // Stashing
        let stash = if repo_state == RepoState::Dirty {
            self.protocol.advance(Phase::Stashing)?;
            let stash = self.stash(&protected)?;
            self.protocol.record_stashed();
            stash
        } else {
            None
        };

        // Wiping
        self.protocol.advance(Phase::Wiping)?;
        self.reporter
            .phase_started(Phase::Wiping, "Removing working tree files");
        let result = wipe::wipe(&root, &protected);
        for rel in &result.removed {
            self.reporter.detail(&format!("Removed {}", rel));
        }
        for repo in &result.nested_repositories {
            self.reporter
                .info(&format!("Kept nested repository {}", repo));
        }
        for warning in &result.warnings {
            self.reporter.warn(&format!(
                "Could not remove {}: {}",
                warning.path.display(),
                warning.error
            ));
        }
        if result.warnings.is_empty() {
            self.reporter.phase_succeeded(
                Phase::Wiping,
                &format!("Removed {} entries", result.removed.len()),
            );
        } else {
            self.reporter.phase_warned(
                Phase::Wiping,
                &format!(
                    "Removed {} entries, {} could not be removed",
                    result.removed.len(),
                    result.warnings.len()
                ),
            );
        }

        // Restoring
        self.protocol.advance(Phase::Restoring)?;
        self.reporter
            .phase_started(Phase::Restoring, "Restoring tracked files from HEAD");
        let restored = self
            .vcs
            .restore_tracked(&protected)
            .with_context(|| restore_failure_hint(stash.as_ref()))?;
        self.reporter.phase_succeeded(
            Phase::Restoring,
            &format!("Restored {} tracked files", restored),
        );

        // Popping
        let pop = match &stash {
            Some(record) => {
                self.protocol.advance(Phase::Popping)?;
                self.pop(record)
            }
            None => PopStatus::Skipped,
        };

        // Done
        self.protocol.advance(Phase::Done)?;
        let summary = ResetSummary {
            root,
            phases: self.protocol.visited().to_vec(),
            repo_state,
            protected,
            removed: result.removed.len(),
            wipe_warnings: result.warnings.len(),
            restored,
            stash,
            pop,
        };
        let mut done = format!("Reset complete: {} entries removed", summary.removed);
        if summary.wipe_warnings > 0 {
            done.push_str(&format!(" ({} could not be removed)", summary.wipe_warnings));
        }
        done.push_str(&format!(
            ", {} protected paths kept, stash {}",
            summary.protected.len(),
            summary.pop
        ));
        self.reporter.phase_succeeded(Phase::Done, &done);

        Ok(RunOutcome::Reset(summary))
    }

    fn stash(&mut self, protected: &ProtectedPathSet) -> Result<Option<StashRecord>> {
        self.reporter
            .phase_started(Phase::Stashing, "Stashing uncommitted changes");
        let message = format!(
            "{} autostash {}",
            self.config.stash.message_prefix,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let stash = self.vcs.stash_push(&message, protected).context(
            "Stashing: could not stash uncommitted changes; aborting before anything was deleted",
        )?;

        match &stash {
            Some(record) => self.reporter.phase_succeeded(
                Phase::Stashing,
                &format!("Stashed changes ({})", record.short_id()),
            ),
            None => self.reporter.phase_succeeded(
                Phase::Stashing,
                "Nothing to stash outside protected paths",
            ),
        }
        Ok(stash)
    }

    /// Never fatal: the stash stays in the list whenever it was not applied
    fn pop(&mut self, record: &StashRecord) -> PopStatus {
        self.reporter
            .phase_started(Phase::Popping, "Reapplying stashed changes");
        let detail = match self.vcs.stash_pop() {
            Ok(PopOutcome::Applied) => {
                self.reporter
                    .phase_succeeded(Phase::Popping, "Reapplied stashed changes");
                return PopStatus::Applied;
            }
            Ok(PopOutcome::Conflicted(detail)) => detail,
            Err(err) => {
                let detail = format!("{:#}", err);
                tracing::warn!(error = %detail, "stash pop failed");
                detail
            }
        };

        if !detail.is_empty() {
            self.reporter.detail(&detail);
        }
        self.reporter.phase_warned(
            Phase::Popping,
            &format!(
                "Stash {} did not apply cleanly and was kept. \
                 Inspect it with `git stash list` and `git stash show -p`",
                record.short_id()
            ),
        );
        PopStatus::Conflicted
    }
}

fn restore_failure_hint(stash: Option<&StashRecord>) -> String {
    let mut hint = String::from(
        "Restoring: the working tree was wiped but tracked files could not be restored. \
         Retry manually with `git checkout HEAD -- :/`",
    );
    if let Some(record) = stash {
        hint.push_str(&format!(
            ", then `git stash pop` to bring back your changes (stash {})",
            record.short_id()
        ));
    }
    hint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protect::{SecretChoice, SecretSelection};
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    /// Scripted version control that records calls
    struct FakeVcs {
        root: Option<PathBuf>,
        dirty: bool,
        stash_fails: bool,
        stash_creates: bool,
        restore_fails: bool,
        pop: PopOutcome,
        pop_fails: bool,
        calls: RefCell<Vec<String>>,
        stash_list: RefCell<Vec<String>>,
    }

    impl FakeVcs {
        fn new(root: &std::path::Path) -> Self {
            FakeVcs {
                root: Some(root.to_path_buf()),
                dirty: false,
                stash_fails: false,
                stash_creates: true,
                restore_fails: false,
                pop: PopOutcome::Applied,
                pop_fails: false,
                calls: RefCell::new(Vec::new()),
                stash_list: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Vcs for FakeVcs {
        fn repository_root(&self) -> Result<PathBuf> {
            self.calls.borrow_mut().push("root".into());
            match &self.root {
                Some(root) => Ok(root.clone()),
                None => bail!("/tmp is not inside a git repository"),
            }
        }

        fn has_uncommitted_changes(&self) -> Result<bool> {
            self.calls.borrow_mut().push("status".into());
            Ok(self.dirty)
        }

        fn stash_push(
            &self,
            message: &str,
            protected: &ProtectedPathSet,
        ) -> Result<Option<StashRecord>> {
            self.calls
                .borrow_mut()
                .push(format!("stash:{}", protected.len()));
            if self.stash_fails {
                bail!("fatal: could not write index");
            }
            if !self.stash_creates {
                return Ok(None);
            }
            self.stash_list.borrow_mut().push(message.to_string());
            Ok(Some(StashRecord {
                commit: "abcdef0123456789".into(),
            }))
        }

        fn restore_tracked(&self, _protected: &ProtectedPathSet) -> Result<usize> {
            self.calls.borrow_mut().push("restore".into());
            if self.restore_fails {
                bail!("error: unable to write file");
            }
            Ok(3)
        }

        fn stash_pop(&self) -> Result<PopOutcome> {
            self.calls.borrow_mut().push("pop".into());
            if self.pop_fails {
                bail!("Failed to run git stash pop: No such file or directory");
            }
            if self.pop == PopOutcome::Applied {
                self.stash_list.borrow_mut().pop();
            }
            Ok(self.pop.clone())
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: Vec<String>,
    }

    impl Reporter for RecordingReporter {
        fn phase_started(&mut self, phase: Phase, _message: &str) {
            self.events.push(format!("start:{}", phase));
        }
        fn phase_succeeded(&mut self, phase: Phase, message: &str) {
            self.events.push(format!("ok:{}:{}", phase, message));
        }
        fn phase_warned(&mut self, phase: Phase, message: &str) {
            self.events.push(format!("warn:{}:{}", phase, message));
        }
        fn info(&mut self, message: &str) {
            self.events.push(format!("info:{}", message));
        }
        fn warn(&mut self, message: &str) {
            self.events.push(format!("warning:{}", message));
        }
        fn detail(&mut self, _message: &str) {}
    }

    struct NoPrompt;

    impl Prompter for NoPrompt {
        fn choose_secret_files(&mut self, _detected: &[ProtectedPath]) -> Result<SecretChoice> {
            panic!("no prompt expected");
        }
    }

    fn write(root: &std::path::Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn run(vcs: &FakeVcs, options: &ResetOptions) -> (Result<RunOutcome>, Vec<String>) {
        let config = ProtectConfig::builtin().unwrap();
        let mut prompter = NoPrompt;
        let mut reporter = RecordingReporter::default();
        let result = {
            let mut orchestrator = Orchestrator::new(&config, vcs, &mut prompter, &mut reporter);
            orchestrator.run(options)
        };
        (result, reporter.events)
    }

    fn summary(outcome: RunOutcome) -> ResetSummary {
        match outcome {
            RunOutcome::Reset(summary) => summary,
            RunOutcome::Preview(_) => panic!("expected a reset"),
        }
    }

    #[test]
    fn transition_guard_allows_only_forward_steps() {
        use Phase::*;
        assert!(Init.can_advance_to(DirtyCheck));
        assert!(DirtyCheck.can_advance_to(Wiping));
        assert!(Restoring.can_advance_to(Done));
        assert!(!Init.can_advance_to(Wiping));
        assert!(!Wiping.can_advance_to(Stashing));
        assert!(!Restoring.can_advance_to(Wiping));
        assert!(!Done.can_advance_to(Init));
        assert!(!Stashing.can_advance_to(Restoring));
    }

    #[test]
    fn protocol_refuses_to_wipe_unstashed_dirty_tree() {
        let mut protocol = Protocol::default();
        protocol.advance(Phase::DirtyCheck).unwrap();
        protocol.record_repo_state(RepoState::Dirty);
        let err = protocol.advance(Phase::Wiping).unwrap_err();
        assert!(err.to_string().contains("not stashed"));

        protocol.advance(Phase::Stashing).unwrap();
        assert!(protocol.advance(Phase::Wiping).is_err());
        protocol.record_stashed();
        protocol.advance(Phase::Wiping).unwrap();
    }

    #[test]
    fn protocol_refuses_to_wipe_before_dirty_check() {
        let mut protocol = Protocol::default();
        protocol.advance(Phase::DirtyCheck).unwrap();
        assert!(protocol.advance(Phase::Wiping).is_err());
    }

    #[test]
    fn clean_repository_skips_stash_and_pop() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "build/out", "x");
        let vcs = FakeVcs::new(dir.path());

        let (result, _) = run(&vcs, &ResetOptions::default());
        let summary = summary(result.unwrap());

        use Phase::*;
        assert_eq!(summary.phases, vec![Init, DirtyCheck, Wiping, Restoring, Done]);
        assert_eq!(summary.pop, PopStatus::Skipped);
        assert_eq!(summary.removed, 1);
        assert_eq!(vcs.calls(), vec!["root", "status", "restore"]);
        assert!(!dir.path().join("build").exists());
    }

    #[test]
    fn dirty_repository_runs_every_phase() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "changed");
        let mut vcs = FakeVcs::new(dir.path());
        vcs.dirty = true;

        let (result, events) = run(&vcs, &ResetOptions::default());
        let summary = summary(result.unwrap());

        use Phase::*;
        assert_eq!(
            summary.phases,
            vec![Init, DirtyCheck, Stashing, Wiping, Restoring, Popping, Done]
        );
        assert_eq!(summary.pop, PopStatus::Applied);
        assert_eq!(summary.restored, 3);
        assert_eq!(vcs.calls(), vec!["root", "status", "stash:0", "restore", "pop"]);
        assert!(vcs.stash_list.borrow().is_empty());
        assert!(events.iter().any(|e| e.starts_with("ok:Done:Reset complete")));
    }

    #[test]
    fn stash_failure_aborts_before_anything_is_deleted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "work.txt", "unsaved");
        let mut vcs = FakeVcs::new(dir.path());
        vcs.dirty = true;
        vcs.stash_fails = true;

        let (result, _) = run(&vcs, &ResetOptions::default());
        let err = result.unwrap_err();

        assert!(format!("{:#}", err).contains("Stashing"));
        assert_eq!(vcs.calls(), vec!["root", "status", "stash:0"]);
        assert_eq!(fs::read_to_string(dir.path().join("work.txt")).unwrap(), "unsaved");
    }

    #[test]
    fn pop_conflict_is_a_warning_and_keeps_the_stash() {
        let dir = TempDir::new().unwrap();
        let mut vcs = FakeVcs::new(dir.path());
        vcs.dirty = true;
        vcs.pop = PopOutcome::Conflicted("CONFLICT (content): Merge conflict in a.txt".into());

        let (result, events) = run(&vcs, &ResetOptions::default());
        let summary = summary(result.unwrap());

        assert_eq!(summary.pop, PopStatus::Conflicted);
        assert_eq!(summary.phases.last(), Some(&Phase::Done));
        assert_eq!(vcs.stash_list.borrow().len(), 1);
        assert!(events
            .iter()
            .any(|e| e.starts_with("warn:Popping") && e.contains("git stash list")));
    }

    #[test]
    fn pop_that_cannot_run_is_a_warning_not_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "build/out", "x");
        let mut vcs = FakeVcs::new(dir.path());
        vcs.dirty = true;
        vcs.pop_fails = true;

        let (result, events) = run(&vcs, &ResetOptions::default());
        let summary = summary(result.unwrap());

        assert_eq!(summary.pop, PopStatus::Conflicted);
        assert_eq!(summary.phases.last(), Some(&Phase::Done));
        assert_eq!(summary.removed, 1);
        assert_eq!(vcs.stash_list.borrow().len(), 1);
        assert!(events
            .iter()
            .any(|e| e.starts_with("warn:Popping") && e.contains("git stash list")));
        assert!(events.iter().any(|e| e.contains("stash conflicted")));
    }

    #[test]
    fn nested_repository_is_kept_and_reported() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".git/HEAD", "ref: refs/heads/main\n");
        write(dir.path(), "tools/gen/.git/HEAD", "ref: refs/heads/main\n");
        write(dir.path(), "tools/gen/main.rs", "fn main() {}");
        write(dir.path(), "tools/readme.txt", "x");
        let vcs = FakeVcs::new(dir.path());

        let (result, events) = run(&vcs, &ResetOptions::default());
        let summary = summary(result.unwrap());

        assert_eq!(summary.removed, 1);
        assert!(dir.path().join("tools/gen/main.rs").exists());
        assert!(events
            .iter()
            .any(|e| e == "info:Kept nested repository tools/gen"));
    }

    #[test]
    fn nothing_left_to_stash_skips_pop() {
        let dir = TempDir::new().unwrap();
        let mut vcs = FakeVcs::new(dir.path());
        vcs.dirty = true;
        vcs.stash_creates = false;

        let (result, _) = run(&vcs, &ResetOptions::default());
        let summary = summary(result.unwrap());

        use Phase::*;
        assert_eq!(summary.phases, vec![Init, DirtyCheck, Stashing, Wiping, Restoring, Done]);
        assert_eq!(summary.pop, PopStatus::Skipped);
        assert!(!vcs.calls().contains(&"pop".to_string()));
    }

    #[test]
    fn restore_failure_is_fatal_and_explains_recovery() {
        let dir = TempDir::new().unwrap();
        let mut vcs = FakeVcs::new(dir.path());
        vcs.dirty = true;
        vcs.restore_fails = true;

        let (result, _) = run(&vcs, &ResetOptions::default());
        let message = format!("{:#}", result.unwrap_err());

        assert!(message.contains("git checkout HEAD"));
        assert!(message.contains("git stash pop"));
        assert!(message.contains("abcdef0"));
        assert!(!vcs.calls().contains(&"pop".to_string()));
    }

    #[test]
    fn missing_repository_is_fatal_before_anything_else() {
        let mut vcs = FakeVcs::new(std::path::Path::new("/"));
        vcs.root = None;

        let (result, _) = run(&vcs, &ResetOptions::default());
        let message = format!("{:#}", result.unwrap_err());

        assert!(message.contains("Init"));
        assert_eq!(vcs.calls(), vec!["root"]);
    }

    #[test]
    fn protected_glob_survives_and_reaches_the_stash() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "secret.local", "keep me");
        write(dir.path(), "other.txt", "drop me");
        let mut vcs = FakeVcs::new(dir.path());
        vcs.dirty = true;

        let options = ResetOptions {
            sources: vec![ProtectionSource::Glob("*.local".into())],
            dry_run: false,
        };
        let (result, _) = run(&vcs, &options);
        let summary = summary(result.unwrap());

        assert_eq!(summary.protected.len(), 1);
        assert!(vcs.calls().contains(&"stash:1".to_string()));
        assert_eq!(
            fs::read_to_string(dir.path().join("secret.local")).unwrap(),
            "keep me"
        );
        assert!(!dir.path().join("other.txt").exists());
    }

    #[test]
    fn dry_run_never_touches_the_tree() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".env", "TOKEN=1");
        write(dir.path(), "src/main.rs", "fn main() {}");
        let mut vcs = FakeVcs::new(dir.path());
        vcs.dirty = true;

        let options = ResetOptions {
            sources: vec![ProtectionSource::SecretFiles(SecretSelection::Automatic)],
            dry_run: true,
        };
        let (result, _) = run(&vcs, &options);

        let preview = match result.unwrap() {
            RunOutcome::Preview(preview) => preview,
            RunOutcome::Reset(_) => panic!("expected a preview"),
        };
        assert_eq!(preview.repo_state, RepoState::Dirty);
        assert_eq!(preview.protected.len(), 1);
        assert_eq!(
            preview.planned,
            vec![PlannedRemoval {
                rel: "src".into(),
                is_dir: true
            }]
        );
        assert_eq!(vcs.calls(), vec!["root", "status"]);
        assert!(dir.path().join("src/main.rs").exists());
    }
}
