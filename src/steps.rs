//! The installation pipeline.
//!
//! Steps form an ordered table of plain function pointers run by one
//! sequential driver. A failing fatal step halts the remainder; a failing
//! non-fatal step is recorded as an issue and the sequence continues.

use anyhow::bail;

use crate::config::InstallerConfig;
use crate::error::Result;
use crate::logfile::LogFile;
use crate::sudo::SudoContext;
use crate::ui;
use crate::{build, checks, fetch, fonts, greeter, linker, packages, toolchain};

/// Options parsed from the command line, threaded through every step.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub no_confirm: bool,
}

/// A non-fatal problem recorded during the run, replayed in the summary.
#[derive(Debug)]
pub struct Issue {
    pub step: &'static str,
    pub detail: String,
}

/// Everything a step can touch. State is passed explicitly; there are no
/// ambient globals.
pub struct RunContext {
    pub opts: RunOptions,
    pub config: InstallerConfig,
    pub log: LogFile,
    pub sudo: Option<SudoContext>,
    pub issues: Vec<Issue>,
}

impl RunContext {
    /// Record a non-fatal problem for the final summary. The issue is logged
    /// before anything is printed.
    pub fn record_issue(&mut self, step: &'static str, detail: impl Into<String>) {
        let detail = detail.into();
        self.log.line(&format!("ISSUE[{step}]: {detail}"));
        self.issues.push(Issue { step, detail });
    }
}

/// One entry in the install pipeline.
#[derive(Debug)]
pub struct Step {
    pub name: &'static str,
    pub title: &'static str,
    pub fatal: bool,
    pub run: fn(&mut RunContext) -> Result<()>,
}

#[rustfmt::skip]
pub const STEPS: &[Step] = &[
    Step { name: "preflight",    title: "Running pre-flight checks",             fatal: true,  run: checks::run },
    Step { name: "copr",         title: "Enabling COPR repositories",            fatal: true,  run: packages::enable_coprs },
    Step { name: "packages",     title: "Installing system packages",            fatal: true,  run: packages::install_all },
    Step { name: "rust",         title: "Installing the Rust toolchain",         fatal: true,  run: toolchain::install_rust },
    Step { name: "starship",     title: "Installing the starship prompt",        fatal: true,  run: toolchain::install_starship },
    Step { name: "qt-helpers",   title: "Building the Hyprland Qt helpers",      fatal: true,  run: build::install_qt_helpers },
    Step { name: "quickshell",   title: "Building Quickshell",                   fatal: true,  run: build::install_quickshell },
    Step { name: "fonts",        title: "Installing fonts",                      fatal: false, run: fonts::install_all },
    Step { name: "clone",        title: "Cloning the Caelestia repositories",    fatal: true,  run: fetch::clone_repos },
    Step { name: "helper-cli",   title: "Installing the caelestia CLI",          fatal: true,  run: toolchain::install_helper_cli },
    Step { name: "shell-build",  title: "Building the Caelestia shell",          fatal: true,  run: build::build_shell },
    Step { name: "link-configs", title: "Linking configuration files",           fatal: false, run: linker::link_configs },
    Step { name: "scheme",       title: "Initializing the color scheme",         fatal: true,  run: toolchain::init_scheme },
    Step { name: "user-shell",   title: "Setting fish as the login shell",       fatal: false, run: toolchain::set_fish_default },
    Step { name: "greeter",      title: "Configuring the greetd login manager",  fatal: false, run: greeter::setup },
];

/// Resolve `--only`/`--skip` filters against the step table. Unknown names
/// are rejected. `--only` wins when both are given.
pub fn select(only: Option<&str>, skip: Option<&str>) -> anyhow::Result<Vec<&'static Step>> {
    if let Some(only) = only {
        let names = parse_names(only)?;
        return Ok(STEPS.iter().filter(|s| names.contains(&s.name)).collect());
    }

    if let Some(skip) = skip {
        let names = parse_names(skip)?;
        return Ok(STEPS.iter().filter(|s| !names.contains(&s.name)).collect());
    }

    Ok(STEPS.iter().collect())
}

fn parse_names(list: &str) -> anyhow::Result<Vec<&'static str>> {
    let mut names = Vec::new();
    for raw in list.split(',') {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        match STEPS.iter().find(|s| s.name == name) {
            Some(step) => names.push(step.name),
            None => bail!("Unknown step '{name}'. Use --list-steps to see available steps."),
        }
    }
    Ok(names)
}

/// Run the given steps in order. Ordering is the table's declared order;
/// every failure is written to the log before it is reported.
pub fn execute(ctx: &mut RunContext, steps: &[&Step]) -> Result<()> {
    let total = steps.len();
    for (i, step) in steps.iter().enumerate() {
        ui::step(i + 1, total, step.title);
        ctx.log.line(&format!("STEP {}/{}: {}", i + 1, total, step.name));

        match (step.run)(ctx) {
            Ok(()) => {}
            Err(e) if step.fatal => {
                ctx.log.line(&format!("FAILED[{}]: {e}", step.name));
                return Err(e);
            }
            Err(e) => {
                ctx.log.line(&format!("FAILED[{}]: {e}", step.name));
                ui::warn(&format!("{} failed: {e} (continuing)", step.name));
                ctx.issues.push(Issue {
                    step: step.name,
                    detail: e.to_string(),
                });
            }
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
    use crate::error::InstallError;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn test_ctx(tmp: &TempDir) -> RunContext {
        RunContext {
            opts: RunOptions::default(),
            config: InstallerConfig::default(),
            log: LogFile::at(&tmp.path().join("test.log")).unwrap(),
            sudo: None,
            issues: Vec::new(),
        }
    }

    fn ran_a(ctx: &mut RunContext) -> Result<()> {
        ctx.log.line("ran a");
        Ok(())
    }

    fn ran_b(ctx: &mut RunContext) -> Result<()> {
        ctx.log.line("ran b");
        Ok(())
    }

    fn fails_build(_ctx: &mut RunContext) -> Result<()> {
        Err(InstallError::BuildFailed {
            project: "shell".into(),
            output: String::new(),
        })
    }

    fn fails_conflict(_ctx: &mut RunContext) -> Result<()> {
        Err(InstallError::ConfigConflict { path: PathBuf::from("/tmp/x") })
    }

    #[test]
    fn test_select_default_is_full_table_in_order() {
        let steps = select(None, None).unwrap();
        assert_eq!(steps.len(), STEPS.len());
        assert_eq!(steps.first().unwrap().name, "preflight");
        assert_eq!(steps.last().unwrap().name, "greeter");
    }

    #[test]
    fn test_select_only_preserves_table_order() {
        let steps = select(Some("greeter, preflight"), None).unwrap();
        let names: Vec<&str> = steps.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["preflight", "greeter"]);
    }

    #[test]
    fn test_select_skip_removes_steps() {
        let steps = select(None, Some("fonts,greeter")).unwrap();
        assert_eq!(steps.len(), STEPS.len() - 2);
        assert!(!steps.iter().any(|s| s.name == "fonts"));
        assert!(!steps.iter().any(|s| s.name == "greeter"));
    }

    #[test]
    fn test_select_rejects_unknown_names() {
        let err = select(Some("preflight,bogus"), None).unwrap_err();
        assert!(err.to_string().contains("bogus"));
        assert!(select(None, Some("nope")).is_err());
    }

    #[test]
    fn test_step_names_are_unique() {
        for (i, a) in STEPS.iter().enumerate() {
            for b in &STEPS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_build_halts_before_linker_in_table() {
        let build = STEPS.iter().position(|s| s.name == "shell-build").unwrap();
        let link = STEPS.iter().position(|s| s.name == "link-configs").unwrap();
        let greeter = STEPS.iter().position(|s| s.name == "greeter").unwrap();
        assert!(build < link);
        assert!(link < greeter);
        assert!(STEPS[build].fatal);
        assert!(!STEPS[greeter].fatal);
    }

    #[test]
    fn test_execute_fatal_failure_halts_remainder() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = test_ctx(&tmp);

        let a = Step { name: "a", title: "a", fatal: true, run: ran_a };
        let boom = Step { name: "boom", title: "boom", fatal: true, run: fails_build };
        let b = Step { name: "b", title: "b", fatal: true, run: ran_b };

        let result = execute(&mut ctx, &[&a, &boom, &b]);
        assert!(matches!(result, Err(InstallError::BuildFailed { .. })));

        let tail = ctx.log.tail(20).join("\n");
        assert!(tail.contains("ran a"));
        assert!(tail.contains("FAILED[boom]"));
        assert!(!tail.contains("ran b"));
    }

    #[test]
    fn test_execute_nonfatal_failure_continues() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = test_ctx(&tmp);

        let soft = Step { name: "soft", title: "soft", fatal: false, run: fails_conflict };
        let b = Step { name: "b", title: "b", fatal: false, run: ran_b };

        let result = execute(&mut ctx, &[&soft, &b]);
        assert!(result.is_ok());
        assert_eq!(ctx.issues.len(), 1);
        assert_eq!(ctx.issues[0].step, "soft");

        let tail = ctx.log.tail(20).join("\n");
        assert!(tail.contains("FAILED[soft]"));
        assert!(tail.contains("ran b"));
    }

    #[test]
    fn test_failure_logged_before_halt() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = test_ctx(&tmp);

        let boom = Step { name: "boom", title: "boom", fatal: true, run: fails_build };
        let _ = execute(&mut ctx, &[&boom]);

        let tail = ctx.log.tail(5).join("\n");
        assert!(tail.contains("build failed for shell"));
    }
}
