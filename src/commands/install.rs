//! The `install` command: runs the step pipeline end to end.

use std::process;

use anyhow::Result;
use colored::Colorize;

use crate::cli::InstallArgs;
use crate::config::InstallerConfig;
use crate::logfile::LogFile;
use crate::report;
use crate::steps::{self, RunContext, RunOptions, STEPS};
use crate::ui;

pub fn run(args: InstallArgs) -> Result<()> {
    ui::banner();

    if args.list_steps {
        list_steps();
        return Ok(());
    }

    let config = InstallerConfig::load()?;
    let selected = steps::select(args.only.as_deref(), args.skip.as_deref())?;
    if selected.is_empty() {
        ui::warn("No steps matched the selection, nothing to do");
        return Ok(());
    }

    let mut log = LogFile::create()?;
    ui::info(&format!("Logging to {}", log.path().display()));
    log.line("caelestia-installer starting");
    log.line(&format!(
        "Options: dry_run={} no_confirm={} steps={}",
        args.dry_run,
        args.noconfirm,
        selected.iter().map(|s| s.name).collect::<Vec<_>>().join(",")
    ));

    if args.dry_run {
        ui::warn("Dry-run mode: showing what would happen without changing anything");
        println!();
    } else if !args.noconfirm
        && !ui::confirm(
            "This will install the Caelestia Hyprland dotfiles. Continue?",
            true,
        )
    {
        ui::info("Aborted");
        return Ok(());
    }

    let mut ctx = RunContext {
        opts: RunOptions {
            dry_run: args.dry_run,
            no_confirm: args.noconfirm,
        },
        config,
        log,
        sudo: None,
        issues: Vec::new(),
    };

    match steps::execute(&mut ctx, &selected) {
        Ok(()) => {
            ctx.log.line("Installation complete");
            report::print_completion(&mut ctx);
            Ok(())
        }
        Err(e) => {
            report::print_failure(&ctx, &e);
            process::exit(1);
        }
    }
}

fn list_steps() {
    ui::header("Install Steps");
    println!();

    for step in STEPS {
        let marker = if step.fatal {
            String::new()
        } else {
            " (continues on failure)".yellow().to_string()
        };
        println!("  {:<14} {}{}", step.name.bold(), step.title.dimmed(), marker);
    }

    println!();
    ui::section("Usage Examples");
    println!();
    println!("  {} Run the full install", "caelestia-installer install".bold());
    println!(
        "  {} Preview without changing anything",
        "caelestia-installer install --dry-run".bold()
    );
    println!(
        "  {} Retry a single step",
        "caelestia-installer install --only shell-build".bold()
    );
    println!(
        "  {} Skip the greeter setup",
        "caelestia-installer install --skip greeter".bold()
    );
}
