//! The `doctor` command: health checks for the host, a partially finished
//! install, and a running Caelestia setup.

use std::fs;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use crate::config::InstallerConfig;
use crate::greeter;
use crate::linker;
use crate::paths;
use crate::runner;
use crate::ui;

struct Issue {
    category: &'static str,
    summary: String,
    detail: Option<String>,
    fix: Option<String>,
    fix_cmd: Option<String>,
}

pub fn run() -> Result<()> {
    ui::banner();
    ui::header("System Health Check");

    let mut issues: Vec<Issue> = Vec::new();

    check_os(&mut issues);
    check_commands(&mut issues);
    check_network(&mut issues);
    check_config(&mut issues);
    check_components();
    check_repos();
    check_links(&mut issues);
    check_greeter();

    println!();
    if issues.is_empty() {
        ui::success("All systems healthy!");
    } else {
        print_issue_summary(&issues);
    }

    Ok(())
}

fn print_issue_summary(issues: &[Issue]) {
    let count = issues.len();
    let label = if count == 1 { "Issue" } else { "Issues" };
    ui::header(&format!("{count} {label} Found"));

    for (i, issue) in issues.iter().enumerate() {
        let num = i + 1;
        println!(
            "  {}  {} {}",
            format!("{num}.").bold(),
            issue.summary,
            format!("[{}]", issue.category).dimmed()
        );
        if let Some(detail) = &issue.detail {
            for line in detail.lines() {
                println!("      {}", line.dimmed());
            }
        }
        if let Some(fix) = &issue.fix {
            println!("      {} {}", "Fix:".cyan(), fix);
        }
        if let Some(cmd) = &issue.fix_cmd {
            println!("      {} {}", "$".dimmed(), cmd.bold());
        }
        println!();
    }

    let fix_cmds: Vec<&str> = issues.iter().filter_map(|i| i.fix_cmd.as_deref()).collect();

    if !fix_cmds.is_empty() {
        ui::section("Quick Fixes");
        println!(
            "  {}",
            "Run these commands to resolve the issues above:".dimmed()
        );
        println!();
        for cmd in &fix_cmds {
            println!("    {}", cmd.bold());
        }
    }
}

fn check_os(issues: &mut Vec<Issue>) {
    ui::section("Operating System");

    let os_release = fs::read_to_string("/etc/os-release").unwrap_or_default();
    let id = os_field(&os_release, "ID").unwrap_or_else(|| "unknown".to_string());
    let pretty = os_field(&os_release, "PRETTY_NAME").unwrap_or_else(|| id.clone());

    if id == "fedora" {
        println!("  {} {}", "✓".green(), pretty);
    } else {
        println!("  {} {} {}", "✗".red(), pretty, "(unsupported)".red());
        issues.push(Issue {
            category: "Operating System",
            summary: format!("Unsupported distribution: {id}"),
            detail: Some("Packages come from dnf and the solopasha/hyprland COPR".into()),
            fix: Some("Run the installer on a Fedora system".into()),
            fix_cmd: None,
        });
    }
}

fn os_field(os_release: &str, key: &str) -> Option<String> {
    let prefix = format!("{key}=");
    os_release
        .lines()
        .find(|l| l.starts_with(&prefix))
        .map(|l| l[prefix.len()..].trim_matches('"').to_string())
}

fn check_commands(issues: &mut Vec<Issue>) {
    ui::section("Required Commands");

    let commands = [
        ("git", "Version control", "sudo dnf install -y git"),
        ("curl", "Script downloads", "sudo dnf install -y curl"),
        (
            "dnf",
            "Fedora package manager",
            "Use a Fedora system; dnf ships with it",
        ),
    ];

    for (cmd, desc, install_hint) in commands {
        if runner::command_exists(cmd) {
            println!("  {} {} - {}", "✓".green(), cmd, desc.dimmed());
        } else {
            println!("  {} {} - {} {}", "✗".red(), cmd, desc, "(missing)".red());
            issues.push(Issue {
                category: "Required Commands",
                summary: format!("{cmd} is not installed"),
                detail: Some(format!("{desc} - needed before the install can run")),
                fix: Some(format!("Install {cmd}")),
                fix_cmd: Some(install_hint.to_string()),
            });
        }
    }
}

fn check_network(issues: &mut Vec<Issue>) {
    ui::section("Network");

    let reachable = "github.com:443"
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| TcpStream::connect_timeout(&addr, Duration::from_secs(5)).is_ok())
        .unwrap_or(false);

    if reachable {
        println!("  {} github.com reachable", "✓".green());
    } else {
        println!(
            "  {} github.com unreachable {}",
            "✗".red(),
            "(offline?)".red()
        );
        issues.push(Issue {
            category: "Network",
            summary: "Cannot reach github.com".into(),
            detail: Some("Cloning repositories and downloading fonts needs network access".into()),
            fix: Some("Check your connection, VPN, or proxy settings".into()),
            fix_cmd: None,
        });
    }
}

fn check_config(issues: &mut Vec<Issue>) {
    ui::section("Installer Config");

    let path = match paths::config_file() {
        Ok(p) => p,
        Err(e) => {
            ui::error("Could not determine config directory");
            issues.push(Issue {
                category: "Installer Config",
                summary: "Could not determine config directory".into(),
                detail: Some(format!("{e}")),
                fix: Some(format!(
                    "Ensure $HOME is set or set {}",
                    paths::ENV_CONFIG_DIR
                )),
                fix_cmd: None,
            });
            return;
        }
    };

    if !path.exists() {
        println!(
            "  {} config.toml - Installer overrides {}",
            "○".dimmed(),
            "(using defaults)".dimmed()
        );
        return;
    }

    match InstallerConfig::load_from(&path) {
        Ok(_) => println!(
            "  {} config.toml - {}",
            "✓".green(),
            "Installer overrides".dimmed()
        ),
        Err(e) => {
            let root_cause = format!("{:#}", e.root_cause());
            println!(
                "  {} config.toml {}",
                "⚠".yellow(),
                format!("(parse error: {root_cause})").yellow()
            );
            issues.push(Issue {
                category: "Installer Config",
                summary: "config.toml has invalid format".into(),
                detail: Some(format!("{e:#}")),
                fix: Some(format!("Edit {} and fix the syntax error", path.display())),
                fix_cmd: Some(format!("$EDITOR {}", path.display())),
            });
        }
    }
}

fn check_components() {
    ui::section("Installed Components");

    let components = [
        ("Hyprland", "Wayland compositor"),
        ("quickshell", "Shell toolkit"),
        ("caelestia", "Helper CLI"),
        ("foot", "Terminal emulator"),
        ("fish", "Login shell"),
        ("starship", "Prompt"),
    ];

    let mut missing = 0;
    for (cmd, desc) in components {
        if runner::command_exists(cmd) {
            println!("  {} {} - {}", "✓".green(), cmd, desc.dimmed());
        } else {
            missing += 1;
            println!(
                "  {} {} - {} {}",
                "○".dimmed(),
                cmd,
                desc.dimmed(),
                "(not installed)".dimmed()
            );
        }
    }

    if missing > 0 {
        println!(
            "  {} {}",
            "ℹ".blue(),
            "Run 'caelestia-installer install' to install missing components".dimmed()
        );
    }
}

fn check_repos() {
    ui::section("Repositories");

    let repos = [(paths::dotfiles_dir(), "Dotfiles"), (paths::shell_dir(), "Shell")];

    for (dir, desc) in repos {
        let Ok(dir) = dir else {
            println!("  {} {} - home directory unknown", "✗".red(), desc);
            continue;
        };
        if dir.join(".git").exists() {
            println!(
                "  {} {} - {}",
                "✓".green(),
                desc,
                dir.display().to_string().dimmed()
            );
        } else {
            println!(
                "  {} {} - {} {}",
                "○".dimmed(),
                desc,
                dir.display().to_string().dimmed(),
                "(not cloned)".dimmed()
            );
        }
    }
}

fn check_links(issues: &mut Vec<Issue>) {
    ui::section("Config Links");

    let Ok(config_dir) = paths::user_config_dir() else {
        ui::error("Could not determine ~/.config");
        return;
    };

    let names = linker::CONFIG_LINKS
        .iter()
        .copied()
        .chain(std::iter::once(linker::STARSHIP_CONFIG));

    for name in names {
        let dest = config_dir.join(name);
        if dest.is_symlink() {
            let target = fs::read_link(&dest).unwrap_or_default();
            if dest.exists() {
                println!(
                    "  {} {} {}",
                    "✓".green(),
                    name,
                    format!("-> {}", target.display()).dimmed()
                );
            } else {
                println!(
                    "  {} {} {}",
                    "⚠".yellow(),
                    name,
                    "(dangling symlink)".yellow()
                );
                issues.push(Issue {
                    category: "Config Links",
                    summary: format!("{name} is a dangling symlink"),
                    detail: Some(format!("Points to missing {}", target.display())),
                    fix: Some("Re-link after cloning the dotfiles".into()),
                    fix_cmd: Some("caelestia-installer install --only clone,link-configs".into()),
                });
            }
        } else if dest.exists() {
            println!(
                "  {} {} {}",
                "⚠".yellow(),
                name,
                "(exists, not a symlink)".yellow()
            );
            issues.push(Issue {
                category: "Config Links",
                summary: format!("{name} exists but is not a symlink"),
                detail: Some(format!("Found at {}", dest.display())),
                fix: Some("Back it up and link the Caelestia version".into()),
                fix_cmd: Some("caelestia-installer install --only link-configs".into()),
            });
        } else {
            println!("  {} {} {}", "○".dimmed(), name, "(not linked)".dimmed());
        }
    }
}

fn check_greeter() {
    ui::section("Greeter");

    if Path::new(greeter::GREETD_CONFIG_PATH).exists() {
        println!("  {} greetd configured", "✓".green());
        if runner::quiet_status("systemctl", &["is-enabled", "--quiet", "greetd"]) {
            println!("  {} greetd service enabled", "✓".green());
        } else {
            println!(
                "  {} greetd service {}",
                "○".dimmed(),
                "(not enabled)".dimmed()
            );
        }
    } else {
        println!("  {} greetd {}", "○".dimmed(), "(not configured)".dimmed());
    }
}
