//! Built-in protection defaults loaded from protect.toml.

use anyhow::{Context, Result};
use serde::Deserialize;

// Embed the TOML file directly in the binary at compile time
const PROTECT_TOML: &str = include_str!("../protect.toml");

/// Top-level protection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProtectConfig {
    pub secrets: SecretsConfig,
    pub scan: ScanConfig,
    pub stash: StashConfig,
}

/// Secret-file conventions evaluated by `--ignore-env-files`
#[derive(Debug, Clone, Deserialize)]
pub struct SecretsConfig {
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Directory names that protection patterns never descend into or match
    #[serde(default)]
    pub excluded_dirs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StashConfig {
    pub message_prefix: String,
}

impl ProtectConfig {
    /// Parse the embedded defaults
    pub fn builtin() -> Result<Self> {
        Self::from_toml(PROTECT_TOML).context("Failed to parse embedded protect.toml")
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ProtectConfig = toml::from_str(content)?;
        Ok(config)
    }
}
