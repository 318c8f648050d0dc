//! Symlinks from the dotfiles checkout into `~/.config`.
//!
//! Links are the only thing this step owns: an existing symlink is replaced,
//! a real file or directory is a conflict. Conflicts never destroy user data.
//! The user chooses whether to back the path up and link over it; under
//! `--noconfirm` the path is left alone and reported at the end of the run.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use crate::error::{InstallError, Result};
use crate::keybinds;
use crate::logfile::LogFile;
use crate::paths;
use crate::steps::RunContext;
use crate::ui;

/// Subdirectories of the dotfiles checkout linked under `~/.config`.
pub const CONFIG_LINKS: &[&str] = &["hypr", "foot", "fish", "fastfetch", "btop", "uwsm"];

/// Single-file link handled alongside the directories.
pub const STARSHIP_CONFIG: &str = "starship.toml";

#[derive(Debug, PartialEq, Eq)]
enum LinkState {
    /// Nothing at the destination.
    Missing,
    /// A symlink that already resolves to the wanted source.
    Correct,
    /// A symlink pointing somewhere else (or dangling).
    WrongLink,
    /// A real file or directory is in the way.
    Occupied,
}

pub fn link_configs(ctx: &mut RunContext) -> Result<()> {
    let dotfiles_dir = paths::dotfiles_dir()?;
    let config_dir = paths::user_config_dir()?;

    let mut targets: Vec<(PathBuf, PathBuf)> = CONFIG_LINKS
        .iter()
        .map(|name| (dotfiles_dir.join(name), config_dir.join(name)))
        .collect();
    targets.push((
        dotfiles_dir.join(STARSHIP_CONFIG),
        config_dir.join(STARSHIP_CONFIG),
    ));

    for (source, dest) in &targets {
        match link_one(ctx, source, dest) {
            Ok(()) => {}
            Err(InstallError::ConfigConflict { path }) => resolve_conflict(ctx, source, &path)?,
            Err(e) => return Err(e),
        }
    }

    keybinds::install(ctx)?;
    Ok(())
}

fn link_one(ctx: &mut RunContext, source: &Path, dest: &Path) -> Result<()> {
    if !source.exists() {
        ui::warn(&format!("{} not found in the dotfiles checkout, skipping", source.display()));
        return Ok(());
    }

    if ctx.opts.dry_run {
        ui::info(&format!("Would link {} -> {}", dest.display(), source.display()));
        return Ok(());
    }

    match classify(dest, source) {
        LinkState::Correct => {
            ui::dim(&format!("{} already linked", dest.display()));
            Ok(())
        }
        LinkState::Missing => make_link(&mut ctx.log, source, dest),
        LinkState::WrongLink => {
            fs::remove_file(dest)?;
            make_link(&mut ctx.log, source, dest)
        }
        LinkState::Occupied => Err(InstallError::ConfigConflict {
            path: dest.to_path_buf(),
        }),
    }
}

/// A real file or directory sits where a link should go. Ask before touching
/// it; declining (or `--noconfirm`) leaves it in place and records the issue.
fn resolve_conflict(ctx: &mut RunContext, source: &Path, dest: &Path) -> Result<()> {
    ctx.log.line(&format!(
        "CONFLICT: {} exists and is not a symlink",
        dest.display()
    ));

    let keep = if ctx.opts.no_confirm {
        true
    } else {
        !ui::confirm(
            &format!("Back up {} and link the Caelestia version?", dest.display()),
            false,
        )
    };

    if keep {
        ui::warn(&format!(
            "{} exists and is not a symlink, leaving it in place",
            dest.display()
        ));
        ctx.record_issue(
            "link-configs",
            format!("{} was not linked, an existing config is in the way", dest.display()),
        );
        return Ok(());
    }

    let backup = backup_path(dest);
    fs::rename(dest, &backup)?;
    ui::info(&format!("Backed up to {}", backup.display()));
    ctx.log.line(&format!("Backed up {} to {}", dest.display(), backup.display()));
    make_link(&mut ctx.log, source, dest)
}

fn classify(dest: &Path, want: &Path) -> LinkState {
    if dest.is_symlink() {
        match (fs::canonicalize(dest), fs::canonicalize(want)) {
            (Ok(actual), Ok(wanted)) if actual == wanted => LinkState::Correct,
            _ => LinkState::WrongLink,
        }
    } else if dest.exists() {
        LinkState::Occupied
    } else {
        LinkState::Missing
    }
}

fn make_link(log: &mut LogFile, source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    symlink(source, dest)?;
    ui::success(&format!("Linked {}", dest.display()));
    log.line(&format!("Created symlink {} -> {}", dest.display(), source.display()));
    Ok(())
}

/// A sibling path for backing up a conflicting config. Never reuses an
/// existing backup name.
fn backup_path(dest: &Path) -> PathBuf {
    let base = format!(
        "{}.bak",
        dest.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
    );
    let mut candidate = dest.with_file_name(&base);
    let mut n = 1;
    while candidate.exists() || candidate.is_symlink() {
        candidate = dest.with_file_name(format!("{base}.{n}"));
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstallerConfig;
    use crate::steps::{RunContext, RunOptions};
    use tempfile::TempDir;

    fn test_ctx(tmp: &TempDir) -> RunContext {
        RunContext {
            opts: RunOptions {
                dry_run: false,
                no_confirm: true,
            },
            config: InstallerConfig::default(),
            log: LogFile::at(&tmp.path().join("install.log")).unwrap(),
            sudo: None,
            issues: Vec::new(),
        }
    }

    fn source_dir(tmp: &TempDir, name: &str) -> PathBuf {
        let dir = tmp.path().join("dotfiles").join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_creates_link_when_missing() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = test_ctx(&tmp);
        let source = source_dir(&tmp, "hypr");
        let dest = tmp.path().join("config/hypr");

        link_one(&mut ctx, &source, &dest).unwrap();

        assert!(dest.is_symlink());
        assert_eq!(fs::read_link(&dest).unwrap(), source);
    }

    #[test]
    fn test_correct_link_left_alone() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = test_ctx(&tmp);
        let source = source_dir(&tmp, "foot");
        let dest = tmp.path().join("config/foot");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        symlink(&source, &dest).unwrap();

        link_one(&mut ctx, &source, &dest).unwrap();

        assert_eq!(fs::read_link(&dest).unwrap(), source);
    }

    #[test]
    fn test_wrong_link_replaced() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = test_ctx(&tmp);
        let source = source_dir(&tmp, "fish");
        let stale = source_dir(&tmp, "old-fish");
        let dest = tmp.path().join("config/fish");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        symlink(&stale, &dest).unwrap();

        link_one(&mut ctx, &source, &dest).unwrap();

        assert_eq!(fs::read_link(&dest).unwrap(), source);
    }

    #[test]
    fn test_real_directory_is_a_conflict() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = test_ctx(&tmp);
        let source = source_dir(&tmp, "btop");
        let dest = tmp.path().join("config/btop");
        fs::create_dir_all(&dest).unwrap();

        let err = link_one(&mut ctx, &source, &dest).unwrap_err();
        assert!(matches!(err, InstallError::ConfigConflict { path } if path == dest));
    }

    #[test]
    fn test_noconfirm_conflict_skips_and_records() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = test_ctx(&tmp);
        let source = source_dir(&tmp, "uwsm");
        let dest = tmp.path().join("config/uwsm");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("env"), "user data").unwrap();

        resolve_conflict(&mut ctx, &source, &dest).unwrap();

        assert!(!dest.is_symlink());
        assert_eq!(fs::read_to_string(dest.join("env")).unwrap(), "user data");
        assert_eq!(ctx.issues.len(), 1);
        assert_eq!(ctx.issues[0].step, "link-configs");
    }

    #[test]
    fn test_missing_source_skipped() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = test_ctx(&tmp);
        let source = tmp.path().join("dotfiles/fastfetch");
        let dest = tmp.path().join("config/fastfetch");

        link_one(&mut ctx, &source, &dest).unwrap();
        assert!(!dest.exists() && !dest.is_symlink());
    }

    #[test]
    fn test_backup_path_never_collides() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("starship.toml");
        fs::write(&dest, "x").unwrap();
        fs::write(tmp.path().join("starship.toml.bak"), "x").unwrap();

        let backup = backup_path(&dest);
        assert_eq!(backup, tmp.path().join("starship.toml.bak.1"));
    }

    #[test]
    fn test_classify_states() {
        let tmp = TempDir::new().unwrap();
        let source = source_dir(&tmp, "hypr");

        let missing = tmp.path().join("none");
        assert_eq!(classify(&missing, &source), LinkState::Missing);

        let occupied = tmp.path().join("real");
        fs::write(&occupied, "data").unwrap();
        assert_eq!(classify(&occupied, &source), LinkState::Occupied);

        let correct = tmp.path().join("good");
        symlink(&source, &correct).unwrap();
        assert_eq!(classify(&correct, &source), LinkState::Correct);

        let dangling = tmp.path().join("dangling");
        symlink(tmp.path().join("gone"), &dangling).unwrap();
        assert_eq!(classify(&dangling, &source), LinkState::WrongLink);
    }
}
