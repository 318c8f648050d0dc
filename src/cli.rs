use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "caelestia-installer")]
#[command(version)]
#[command(about = "Caelestia Hyprland dotfiles installer for Fedora", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Install flags accepted at the top level; running with no subcommand
    /// is the same as `install`.
    #[command(flatten)]
    pub install: InstallArgs,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the installation (the default when no command is given)
    Install(InstallArgs),

    /// Run health checks on the host and the installed setup
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Default)]
pub struct InstallArgs {
    /// Show what would be done without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompts, taking the safe default at each one
    #[arg(long)]
    pub noconfirm: bool,

    /// Only run specific steps (comma-separated)
    #[arg(long, value_name = "STEPS")]
    pub only: Option<String>,

    /// Skip specific steps (comma-separated)
    #[arg(long, value_name = "STEPS")]
    pub skip: Option<String>,

    /// List all install steps
    #[arg(long)]
    pub list_steps: bool,
}

impl InstallArgs {
    /// Fold top-level flags into subcommand flags so
    /// `caelestia-installer --dry-run install` behaves the same as
    /// `caelestia-installer install --dry-run`.
    pub fn merge(self, top: Self) -> Self {
        Self {
            dry_run: self.dry_run || top.dry_run,
            noconfirm: self.noconfirm || top.noconfirm,
            only: self.only.or(top.only),
            skip: self.skip.or(top.skip),
            list_steps: self.list_steps || top.list_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_accepts_install_flags() {
        let cli =
            Cli::try_parse_from(["caelestia-installer", "--dry-run", "--noconfirm"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.install.dry_run);
        assert!(cli.install.noconfirm);
    }

    #[test]
    fn test_install_subcommand_flags() {
        let cli = Cli::try_parse_from([
            "caelestia-installer",
            "install",
            "--only",
            "preflight,clone",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Install(args)) => {
                assert_eq!(args.only.as_deref(), Some("preflight,clone"));
                assert!(!args.dry_run);
            }
            _ => panic!("expected install subcommand"),
        }
    }

    #[test]
    fn test_verbose_is_counted_and_global() {
        let cli = Cli::try_parse_from(["caelestia-installer", "-vv", "doctor"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Command::Doctor)));
    }

    #[test]
    fn test_merge_folds_top_level_flags() {
        let sub = InstallArgs {
            only: Some("fonts".to_string()),
            ..Default::default()
        };
        let top = InstallArgs {
            dry_run: true,
            ..Default::default()
        };
        let merged = sub.merge(top);
        assert!(merged.dry_run);
        assert_eq!(merged.only.as_deref(), Some("fonts"));
    }
}
