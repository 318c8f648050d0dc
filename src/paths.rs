//! Centralized path resolution for the installer.
//!
//! Every well-known location lives here so the rest of the code never
//! hard-codes a home-relative path. Environment variable overrides exist
//! for the paths tests and power users need to relocate.
//!
//! # Environment Variables
//!
//! - `CAELESTIA_INSTALLER_CONFIG_DIR` - Override the installer config directory
//! - `CAELESTIA_INSTALLER_CACHE_DIR` - Override the cache (log) directory
//! - `CAELESTIA_DOTFILES_DIR` - Override the dotfiles checkout location
//! - `CAELESTIA_SHELL_DIR` - Override the shell checkout location

use std::io;
use std::path::PathBuf;

/// Environment variable for installer config directory override
pub const ENV_CONFIG_DIR: &str = "CAELESTIA_INSTALLER_CONFIG_DIR";

/// Environment variable for cache directory override
pub const ENV_CACHE_DIR: &str = "CAELESTIA_INSTALLER_CACHE_DIR";

/// Environment variable for dotfiles checkout override
pub const ENV_DOTFILES_DIR: &str = "CAELESTIA_DOTFILES_DIR";

/// Environment variable for shell checkout override
pub const ENV_SHELL_DIR: &str = "CAELESTIA_SHELL_DIR";

fn home_dir() -> io::Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "could not determine home directory")
    })
}

/// The installer's own config directory (`~/.config/caelestia-installer`).
///
/// Priority:
/// 1. `CAELESTIA_INSTALLER_CONFIG_DIR` env var
/// 2. `XDG_CONFIG_HOME/caelestia-installer`
/// 3. `~/.config/caelestia-installer`
pub fn config_dir() -> io::Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("Using config dir from {}: {}", ENV_CONFIG_DIR, path.display());
        return Ok(path);
    }

    if let Some(base) = dirs::config_dir() {
        return Ok(base.join("caelestia-installer"));
    }
    Ok(home_dir()?.join(".config").join("caelestia-installer"))
}

/// The optional installer config file.
pub fn config_file() -> io::Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// The installer cache directory (`~/.cache/caelestia-installer`).
pub fn cache_dir() -> io::Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
        let path = expand(&dir);
        log::debug!("Using cache dir from {}: {}", ENV_CACHE_DIR, path.display());
        return Ok(path);
    }

    if let Some(base) = dirs::cache_dir() {
        return Ok(base.join("caelestia-installer"));
    }
    Ok(home_dir()?.join(".cache").join("caelestia-installer"))
}

/// The append-only install log.
pub fn log_file() -> io::Result<PathBuf> {
    Ok(cache_dir()?.join("install.log"))
}

/// Where the dotfiles repository is cloned (`~/.local/share/caelestia`).
pub fn dotfiles_dir() -> io::Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_DOTFILES_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using dotfiles dir from {}: {}",
            ENV_DOTFILES_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Some(base) = dirs::data_local_dir() {
        return Ok(base.join("caelestia"));
    }
    Ok(home_dir()?.join(".local").join("share").join("caelestia"))
}

/// Where the shell repository is cloned (`~/.config/quickshell/caelestia`).
pub fn shell_dir() -> io::Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_SHELL_DIR) {
        let path = expand(&dir);
        log::debug!("Using shell dir from {}: {}", ENV_SHELL_DIR, path.display());
        return Ok(path);
    }
    Ok(user_config_dir()?.join("quickshell").join("caelestia"))
}

/// The user's `~/.config` directory, where config symlinks land.
pub fn user_config_dir() -> io::Result<PathBuf> {
    if let Some(dir) = dirs::config_dir() {
        return Ok(dir);
    }
    Ok(home_dir()?.join(".config"))
}

/// The user's Hyprland config directory (`~/.config/hypr`).
pub fn hypr_dir() -> io::Result<PathBuf> {
    Ok(user_config_dir()?.join("hypr"))
}

/// The user font directory (`~/.local/share/fonts`).
pub fn fonts_dir() -> io::Result<PathBuf> {
    if let Some(base) = dirs::data_local_dir() {
        return Ok(base.join("fonts"));
    }
    Ok(home_dir()?.join(".local").join("share").join("fonts"))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
