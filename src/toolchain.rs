//! Toolchain and helper installs that fall outside dnf: rustup, starship,
//! the Python caelestia CLI, color scheme seeding, and the login shell.

use std::env;
use std::fs;
use std::path::Path;

use crate::error::{InstallError, Result};
use crate::fetch;
use crate::logfile::LogFile;
use crate::paths;
use crate::runner;
use crate::steps::RunContext;
use crate::ui;

const RUSTUP_CMD: &str =
    "curl --proto '=https' --tlsv1.2 -sSf https://sh.rustup.rs | sh -s -- -y";
const STARSHIP_CMD: &str = "curl -sS https://starship.rs/install.sh | sh -s -- -y";

const FISH_BIN: &str = "/usr/bin/fish";
const FISH_COMPLETIONS_DST: &str = "/usr/share/fish/vendor_completions.d/caelestia.fish";

const HYPR_VARS_SEED: &str = "# User Hyprland variables\n";
const HYPR_USER_SEED: &str = "# User Hyprland config\n";

// ============================================================================
// Script installers
// ============================================================================

pub fn install_rust(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would install the Rust toolchain via rustup");
        return Ok(());
    }

    if runner::command_exists("rustc") && runner::command_exists("cargo") {
        ui::success("Rust already installed");
        return Ok(());
    }

    ui::info("Installing the Rust toolchain (rustup)...");
    run_install_script(ctx, "rustup", RUSTUP_CMD)?;
    ui::success("Rust installed");
    ui::dim("Restart your shell or run 'source ~/.cargo/env' to pick up cargo");
    ctx.log.line("Rust installation complete");
    Ok(())
}

pub fn install_starship(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would install the starship prompt");
        return Ok(());
    }

    if runner::command_exists("starship") {
        ui::success("starship already installed");
        return Ok(());
    }

    ui::info("Installing the starship prompt...");
    run_install_script(ctx, "starship", STARSHIP_CMD)?;
    ui::success("starship installed");
    ctx.log.line("starship installation complete");
    Ok(())
}

fn run_install_script(ctx: &mut RunContext, name: &str, script: &str) -> Result<()> {
    let out = runner::capture(&mut ctx.log, "sh", &["-c", script])?;
    if !out.success() {
        return Err(InstallError::PackageInstallFailed {
            reason: format!("{name} installer failed: {}", out.tail(400)),
        });
    }
    Ok(())
}

// ============================================================================
// caelestia CLI
// ============================================================================

pub fn install_helper_cli(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would build and install the caelestia CLI");
        return Ok(());
    }

    if runner::command_exists("caelestia") {
        ui::success("caelestia CLI already installed");
        return Ok(());
    }

    let cli_dir = env::temp_dir().join("caelestia-cli");
    fetch::fresh_dir(&cli_dir)?;

    let repo = ctx.config.repos.cli.clone();
    ui::info("Cloning the caelestia CLI...");
    fetch::clone(ctx, &repo, &cli_dir)?;

    ui::info("Building the caelestia CLI...");
    let built = runner::capture_in(&mut ctx.log, Some(&cli_dir), "python3", &[
        "-m", "build", "--wheel",
    ])?;

    if built.success() {
        let out = runner::capture_in(&mut ctx.log, Some(&cli_dir), "sh", &[
            "-c",
            "pip3 install --break-system-packages dist/*.whl",
        ])?;
        if !out.success() {
            return Err(InstallError::PackageInstallFailed {
                reason: format!("pip wheel install failed: {}", out.tail(400)),
            });
        }
    } else {
        // hatchling occasionally refuses a wheel build on older python3-build;
        // a plain source install through pip still works there.
        ui::warn("Wheel build failed, installing from source instead");
        let out = runner::capture_in(&mut ctx.log, Some(&cli_dir), "pip3", &[
            "install", "--break-system-packages", ".",
        ])?;
        if !out.success() {
            return Err(InstallError::PackageInstallFailed {
                reason: format!("pip source install failed: {}", out.tail(400)),
            });
        }
    }

    ui::success("Installed the caelestia CLI");
    ctx.log.line("caelestia CLI installation complete");

    install_fish_completions(ctx, &cli_dir);
    Ok(())
}

fn install_fish_completions(ctx: &mut RunContext, cli_dir: &Path) {
    let src = cli_dir.join("completions/caelestia.fish");
    if !src.exists() {
        return;
    }

    ui::info("Installing fish completions...");
    let src_s = src.display().to_string();
    let ok = runner::capture(&mut ctx.log, "sudo", &["cp", &src_s, FISH_COMPLETIONS_DST])
        .map(|out| out.success())
        .unwrap_or(false);

    if ok {
        ui::success("Installed fish completions");
    } else {
        ui::warn("Could not install fish completions");
    }
}

// ============================================================================
// Color scheme
// ============================================================================

pub fn init_scheme(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would initialize the color scheme and user config seeds");
        return Ok(());
    }

    ui::info("Initializing the color scheme...");
    let dotfiles_dir = paths::dotfiles_dir()?;
    let hypr_dir = paths::hypr_dir()?;
    let config_dir = paths::user_config_dir()?;

    seed_scheme(&mut ctx.log, &dotfiles_dir, &hypr_dir)?;
    seed_user_configs(&mut ctx.log, &config_dir)?;
    Ok(())
}

/// Copy the dotfiles' default scheme to `hypr/scheme/current.conf`. A
/// current.conf that already exists reflects the user's scheme choice and is
/// kept.
fn seed_scheme(log: &mut LogFile, dotfiles_dir: &Path, hypr_dir: &Path) -> Result<()> {
    let src = dotfiles_dir.join("hypr/scheme/default.conf");
    let scheme_dir = hypr_dir.join("scheme");
    fs::create_dir_all(&scheme_dir)?;

    let dst = scheme_dir.join("current.conf");
    if dst.exists() {
        ui::dim("Color scheme already initialized");
        return Ok(());
    }

    if src.exists() {
        fs::copy(&src, &dst)?;
        ui::success("Initialized the default color scheme");
        log.line("Color scheme initialized");
    } else {
        ui::warn("Default scheme file not found in the dotfiles, skipping");
    }
    Ok(())
}

/// Seed the empty per-user override files the dotfiles source at startup.
fn seed_user_configs(log: &mut LogFile, config_dir: &Path) -> Result<()> {
    let caelestia_dir = config_dir.join("caelestia");
    fs::create_dir_all(&caelestia_dir)?;

    for (name, seed) in [
        ("hypr-vars.conf", HYPR_VARS_SEED),
        ("hypr-user.conf", HYPR_USER_SEED),
    ] {
        let path = caelestia_dir.join(name);
        if path.exists() {
            continue;
        }
        fs::write(&path, seed)?;
        log.line(&format!("Seeded {name}"));
    }

    ui::success("User config files are in place");
    Ok(())
}

// ============================================================================
// Login shell
// ============================================================================

pub fn set_fish_default(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would set fish as the login shell");
        return Ok(());
    }

    ui::info("Setting fish as the login shell (chsh may ask for your password)...");
    match runner::interactive(&mut ctx.log, "chsh", &["-s", FISH_BIN]) {
        Ok(status) if status.success() => {
            ui::success("fish is now the login shell");
            ctx.log.line("Default shell changed to fish");
        }
        Ok(_) => {
            ui::warn(&format!("Could not change the login shell, run 'chsh -s {FISH_BIN}' manually"));
            ctx.record_issue("user-shell", "chsh exited non-zero");
        }
        Err(e) => {
            ui::warn("Could not change the login shell");
            ctx.record_issue("user-shell", format!("chsh failed: {e}"));
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_log(tmp: &TempDir) -> LogFile {
        LogFile::at(&tmp.path().join("install.log")).unwrap()
    }

    #[test]
    fn test_seed_user_configs_creates_both_files() {
        let tmp = TempDir::new().unwrap();
        let mut log = test_log(&tmp);
        let config = tmp.path().join("config");

        seed_user_configs(&mut log, &config).unwrap();

        let caelestia = config.join("caelestia");
        assert_eq!(
            fs::read_to_string(caelestia.join("hypr-vars.conf")).unwrap(),
            HYPR_VARS_SEED
        );
        assert_eq!(
            fs::read_to_string(caelestia.join("hypr-user.conf")).unwrap(),
            HYPR_USER_SEED
        );
    }

    #[test]
    fn test_seed_user_configs_preserves_existing() {
        let tmp = TempDir::new().unwrap();
        let mut log = test_log(&tmp);
        let caelestia = tmp.path().join("config/caelestia");
        fs::create_dir_all(&caelestia).unwrap();
        fs::write(caelestia.join("hypr-vars.conf"), "$myVar = 1\n").unwrap();

        seed_user_configs(&mut log, &tmp.path().join("config")).unwrap();

        assert_eq!(
            fs::read_to_string(caelestia.join("hypr-vars.conf")).unwrap(),
            "$myVar = 1\n"
        );
        assert!(caelestia.join("hypr-user.conf").exists());
    }

    #[test]
    fn test_seed_scheme_copies_default() {
        let tmp = TempDir::new().unwrap();
        let mut log = test_log(&tmp);
        let dotfiles = tmp.path().join("dotfiles");
        fs::create_dir_all(dotfiles.join("hypr/scheme")).unwrap();
        fs::write(dotfiles.join("hypr/scheme/default.conf"), "$base = 1e1e2e\n").unwrap();
        let hypr = tmp.path().join("hypr");

        seed_scheme(&mut log, &dotfiles, &hypr).unwrap();

        assert_eq!(
            fs::read_to_string(hypr.join("scheme/current.conf")).unwrap(),
            "$base = 1e1e2e\n"
        );
    }

    #[test]
    fn test_seed_scheme_keeps_current_choice() {
        let tmp = TempDir::new().unwrap();
        let mut log = test_log(&tmp);
        let dotfiles = tmp.path().join("dotfiles");
        fs::create_dir_all(dotfiles.join("hypr/scheme")).unwrap();
        fs::write(dotfiles.join("hypr/scheme/default.conf"), "$base = default\n").unwrap();
        let hypr = tmp.path().join("hypr");
        fs::create_dir_all(hypr.join("scheme")).unwrap();
        fs::write(hypr.join("scheme/current.conf"), "$base = chosen\n").unwrap();

        seed_scheme(&mut log, &dotfiles, &hypr).unwrap();

        assert_eq!(
            fs::read_to_string(hypr.join("scheme/current.conf")).unwrap(),
            "$base = chosen\n"
        );
    }

    #[test]
    fn test_seed_scheme_tolerates_missing_default() {
        let tmp = TempDir::new().unwrap();
        let mut log = test_log(&tmp);

        seed_scheme(&mut log, &tmp.path().join("dotfiles"), &tmp.path().join("hypr")).unwrap();

        assert!(tmp.path().join("hypr/scheme").is_dir());
        assert!(!tmp.path().join("hypr/scheme/current.conf").exists());
    }

    #[test]
    fn test_install_script_constants() {
        assert!(RUSTUP_CMD.contains("--tlsv1.2"));
        assert!(RUSTUP_CMD.ends_with("-y"));
        assert!(STARSHIP_CMD.contains("starship.rs"));
        assert!(FISH_COMPLETIONS_DST.ends_with("caelestia.fish"));
    }
}
