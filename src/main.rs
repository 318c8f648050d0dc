mod build;
mod checks;
mod cli;
mod commands;
mod config;
mod error;
mod fetch;
mod fonts;
mod greeter;
mod keybinds;
mod linker;
mod logfile;
mod packages;
mod paths;
mod report;
mod runner;
mod steps;
mod sudo;
mod system;
mod toolchain;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match cli.command {
        Some(Command::Install(args)) => commands::install::run(args.merge(cli.install)),
        Some(Command::Doctor) => commands::doctor::run(),
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "caelestia-installer", &mut io::stdout());
            Ok(())
        }
        None => commands::install::run(cli.install),
    }
}
