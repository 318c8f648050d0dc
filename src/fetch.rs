//! Git clones for the dotfiles, shell, and helper repositories.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{InstallError, Result};
use crate::paths;
use crate::runner;
use crate::steps::RunContext;
use crate::ui;

/// Clone the dotfiles and shell repositories into their target directories.
/// An existing directory is left untouched so local edits survive re-runs.
pub fn clone_repos(ctx: &mut RunContext) -> Result<()> {
    let targets = [
        (ctx.config.repos.dotfiles.clone(), paths::dotfiles_dir()?),
        (ctx.config.repos.shell.clone(), paths::shell_dir()?),
    ];

    for (url, dest) in targets {
        if dest.exists() {
            ui::warn(&format!("{} already exists, skipping clone", dest.display()));
            ui::dim("Delete the directory and re-run to fetch a fresh copy");
            ctx.log.line(&format!("Skipped clone of {url}, {} exists", dest.display()));
            continue;
        }

        if ctx.opts.dry_run {
            ui::info(&format!("Would clone {url} to {}", dest.display()));
            continue;
        }

        ui::info(&format!("Cloning {url}..."));
        clone(ctx, &url, &dest)?;
        ui::success(&format!("Cloned {} to {}", repo_name(&url), dest.display()));
    }
    Ok(())
}

pub fn clone(ctx: &mut RunContext, url: &str, dest: &Path) -> Result<()> {
    clone_with(ctx, url, dest, false)
}

/// Shallow clone for throwaway build trees.
pub fn clone_shallow(ctx: &mut RunContext, url: &str, dest: &Path) -> Result<()> {
    clone_with(ctx, url, dest, true)
}

fn clone_with(ctx: &mut RunContext, url: &str, dest: &Path, shallow: bool) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let dest_str = dest.display().to_string();
    let mut args = vec!["clone"];
    if shallow {
        args.extend(["--depth", "1"]);
    }
    args.extend([url, dest_str.as_str()]);

    let out = runner::capture(&mut ctx.log, "git", &args)?;
    if !out.success() {
        return Err(InstallError::CloneFailed {
            repo: url.to_string(),
            reason: out.stderr.trim().to_string(),
        });
    }
    ctx.log.line(&format!("Cloned {url} to {dest_str}"));
    Ok(())
}

/// Remove a stale build tree so the next clone starts clean.
pub fn fresh_dir(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// The repository name from a clone URL, without the `.git` suffix.
pub fn repo_name(url: &str) -> &str {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .trim_end_matches(".git")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_repo_name_strips_git_suffix() {
        assert_eq!(repo_name("https://github.com/caelestia-dots/caelestia.git"), "caelestia");
        assert_eq!(repo_name("https://github.com/caelestia-dots/shell.git"), "shell");
    }

    #[test]
    fn test_repo_name_without_suffix() {
        assert_eq!(repo_name("https://github.com/hyprwm/hyprland-qt-support"), "hyprland-qt-support");
        assert_eq!(repo_name("https://github.com/karlstav/cava/"), "cava");
    }

    #[test]
    fn test_fresh_dir_removes_existing_tree() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("build");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/file"), "x").unwrap();

        fresh_dir(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_fresh_dir_ignores_missing_path() {
        let tmp = TempDir::new().unwrap();
        fresh_dir(&tmp.path().join("never-created")).unwrap();
    }
}
