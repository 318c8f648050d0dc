//! Optional user configuration.
//!
//! Loaded from `~/.config/caelestia-installer/config.toml` when present. A
//! missing file means defaults. A malformed file is a hard error before any
//! step runs, so a typo cannot silently install the wrong thing.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::paths;

pub const DEFAULT_DOTFILES_REPO: &str = "https://github.com/caelestia-dots/caelestia.git";
pub const DEFAULT_SHELL_REPO: &str = "https://github.com/caelestia-dots/shell.git";
pub const DEFAULT_CLI_REPO: &str = "https://github.com/caelestia-dots/cli.git";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub repos: RepoConfig,
    pub packages: PackageConfig,
    pub build: BuildConfig,
    pub fonts: FontConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Dotfiles repository URL
    pub dotfiles: String,
    /// Shell repository URL
    pub shell: String,
    /// Helper CLI repository URL
    pub cli: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            dotfiles: DEFAULT_DOTFILES_REPO.to_string(),
            shell: DEFAULT_SHELL_REPO.to_string(),
            cli: DEFAULT_CLI_REPO.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Extra packages appended to the dnf transaction
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Override the parallel job count for builds. Unset means the limit is
    /// derived from available memory.
    pub jobs: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Download and install the desktop fonts
    pub install: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { install: true }
    }
}

impl InstallerConfig {
    /// Load from the default location, or defaults when the file is absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Load from an explicit path, or defaults when the file is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
