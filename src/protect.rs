//! Building the protected-path set from every requested source.

use crate::paths::{ProtectedPath, ProtectedPathSet};
use crate::patterns::{Matcher, PatternMatches};
use crate::report::Reporter;

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, MultiSelect, Select};
use std::path::Path;

/// How detected secret files are confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSelection {
    /// Protect everything detected without asking
    Automatic,
    /// Ask the user: all, none, or a hand-picked subset
    Interactive,
}

/// One input contributing to the protected set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectionSource {
    Glob(String),
    SecretFiles(SecretSelection),
}

impl ProtectionSource {
    /// Sources for the command-line flags, globs first
    pub fn from_flags(globs: &[String], env_files: bool, skip_confirmation: bool) -> Vec<Self> {
        let mut sources: Vec<Self> = globs.iter().cloned().map(ProtectionSource::Glob).collect();
        if env_files {
            let selection = if skip_confirmation {
                SecretSelection::Automatic
            } else {
                SecretSelection::Interactive
            };
            sources.push(ProtectionSource::SecretFiles(selection));
        }
        sources
    }
}

/// Answer to the secret-file prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretChoice {
    All,
    None,
    /// Indices into the detected list
    Subset(Vec<usize>),
}

/// Asks the user which detected secret files to keep
pub trait Prompter {
    fn choose_secret_files(&mut self, detected: &[ProtectedPath]) -> Result<SecretChoice>;
}

/// Terminal prompt built on dialoguer
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn choose_secret_files(&mut self, detected: &[ProtectedPath]) -> Result<SecretChoice> {
        let theme = ColorfulTheme::default();

        let options = [
            "Protect all of them",
            "Protect none of them",
            "Choose individually",
        ];
        let selection = Select::with_theme(&theme)
            .with_prompt(format!(
                "Found {} secret file(s). Keep them through the reset?",
                detected.len()
            ))
            .items(&options[..])
            .default(0)
            .interact()
            .context("Interactive selection failed; pass --skip-confirmation to protect every detected file")?;

        match selection {
            0 => Ok(SecretChoice::All),
            1 => Ok(SecretChoice::None),
            _ => {
                let labels: Vec<&str> = detected.iter().map(ProtectedPath::as_str).collect();
                let defaults = vec![true; labels.len()];
                let picked = MultiSelect::with_theme(&theme)
                    .with_prompt("Select the files to protect (space to toggle)")
                    .items(&labels)
                    .defaults(&defaults)
                    .interact()
                    .context("Interactive selection failed")?;
                Ok(SecretChoice::Subset(picked))
            }
        }
    }
}

/// The detected paths a choice keeps, in detection order
pub fn apply_choice(detected: &[ProtectedPath], choice: &SecretChoice) -> Vec<ProtectedPath> {
    match choice {
        SecretChoice::All => detected.to_vec(),
        SecretChoice::None => Vec::new(),
        SecretChoice::Subset(indices) => detected
            .iter()
            .enumerate()
            .filter(|(i, _)| indices.contains(i))
            .map(|(_, p)| p.clone())
            .collect(),
    }
}

fn forward_warnings(matches: &PatternMatches, reporter: &mut dyn Reporter) {
    for warning in &matches.warnings {
        reporter.warn(warning);
    }
}

/// Union of every source's contribution
pub fn resolve(
    root: &Path,
    sources: &[ProtectionSource],
    matcher: &Matcher,
    prompter: &mut dyn Prompter,
    reporter: &mut dyn Reporter,
) -> Result<ProtectedPathSet> {
    let mut protected = ProtectedPathSet::new();

    for source in sources {
        match source {
            ProtectionSource::Glob(pattern) => {
                let matches = matcher.match_pattern(root, pattern);
                forward_warnings(&matches, reporter);
                if matches.paths.is_empty() {
                    reporter.info(&format!("No files match '{}'", pattern));
                } else {
                    reporter.info(&format!(
                        "Protecting {} path(s) matching '{}'",
                        matches.paths.len(),
                        pattern
                    ));
                }
                protected.extend(matches.paths);
            }
            ProtectionSource::SecretFiles(selection) => {
                let matches = matcher.match_secret_files(root);
                forward_warnings(&matches, reporter);
                let detected = matches.paths;

                if detected.is_empty() {
                    reporter.info("No secret files found");
                    continue;
                }

                for path in &detected {
                    reporter.detail(&format!("Found secret file {}", path));
                }

                let choice = match selection {
                    SecretSelection::Automatic => SecretChoice::All,
                    SecretSelection::Interactive => prompter.choose_secret_files(&detected)?,
                };
                let kept = apply_choice(&detected, &choice);
                if kept.is_empty() {
                    reporter.info("Secret files will not be protected");
                } else {
                    reporter.info(&format!("Protecting {} secret file(s)", kept.len()));
                }
                protected.extend(kept);
            }
        }
    }

    for path in &protected {
        reporter.detail(&format!("Protected: {}", path));
    }
    tracing::debug!(count = protected.len(), "protected set resolved");

    Ok(protected)
}
