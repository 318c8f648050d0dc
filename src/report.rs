//! End-of-run reporting: completion summary with the keybinds cheat sheet,
//! recorded issues, the reboot prompt, and the fatal failure report.

use std::fs;

use colored::Colorize;

use crate::error::InstallError;
use crate::runner;
use crate::steps::RunContext;
use crate::ui;

const RULE: &str = "═══════════════════════════════════════════════════════════";

/// How many log lines the failure report replays.
const LOG_TAIL_LINES: usize = 20;

pub fn print_completion(ctx: &mut RunContext) {
    println!();
    println!("{}", RULE.green());
    println!("{}", "  Installation complete!".green().bold());
    println!("{}", RULE.green());

    print_keybinds_summary();
    print_issues(ctx);
    prompt_reboot(ctx);
}

fn print_keybinds_summary() {
    println!();
    println!("{}", "Keybinds Summary:".cyan().bold());
    println!("  {} - Open terminal (foot)", "Super + Return".white().bold());
    println!("  {} - Application launcher", "Super + Space".white().bold());
    println!("  {} - Close window", "Super + W".white().bold());
    println!("  {} - Switch workspaces", "Super + 1-9".white().bold());
    println!(
        "  {} - Move window to workspace",
        "Super + Shift + 1-9".white().bold()
    );
    println!("  {} - Lock screen", "Super + L".white().bold());
    println!();
}

fn print_issues(ctx: &RunContext) {
    if ctx.issues.is_empty() {
        return;
    }

    ui::warn(&format!(
        "{} step(s) reported issues that need a look:",
        ctx.issues.len()
    ));
    for issue in &ctx.issues {
        println!("  {} {}", format!("[{}]", issue.step).yellow(), issue.detail);
    }
    println!();
}

fn prompt_reboot(ctx: &mut RunContext) {
    if ctx.opts.dry_run {
        return;
    }
    if ctx.opts.no_confirm {
        ui::info("Reboot to start using Hyprland");
        return;
    }

    if ui::confirm("Reboot now to apply everything?", true) {
        ui::info("Rebooting...");
        let _ = runner::interactive(&mut ctx.log, "sudo", &["reboot"]);
    } else {
        ui::info("Reboot when convenient to apply everything");
    }
}

/// The fatal failure report: what broke, what the tool said, where the log
/// is, and what to try next.
pub fn print_failure(ctx: &RunContext, err: &InstallError) {
    println!();
    ui::error(&format!("Installation failed: {err}"));

    if let Some(output) = err.captured_output() {
        if !output.is_empty() {
            println!();
            println!("{}", "Captured tool output:".cyan().bold());
            for line in output.lines() {
                println!("  {}", line.dimmed());
            }
        }
    }

    ui::info(&format!("Full log: {}", ctx.log.path().display()));
    let tail = ctx.log.tail(LOG_TAIL_LINES);
    if !tail.is_empty() {
        println!();
        println!("{}", "Last log lines:".cyan().bold());
        for line in tail {
            println!("  {}", line.dimmed());
        }
    }

    print_diagnostics();

    println!();
    println!("{}", "Troubleshooting:".cyan().bold());
    println!("  {}", err.advice());
    println!("  Re-run after fixing the issue; completed steps are skipped or idempotent.");
    println!("  Use --only <step> to retry a single step.");
}

fn print_diagnostics() {
    println!();
    println!("{}", "System snapshot:".cyan().bold());

    let os = fs::read_to_string("/etc/os-release")
        .ok()
        .and_then(|content| pretty_os_name(&content))
        .unwrap_or_else(|| "unknown".to_string());
    println!("  OS: {os}");

    if let Ok(kernel) = fs::read_to_string("/proc/sys/kernel/osrelease") {
        println!("  Kernel: {}", kernel.trim());
    }

    if let Ok(meminfo) = fs::read_to_string("/proc/meminfo") {
        for key in ["MemTotal", "MemAvailable"] {
            if let Some(line) = compact_meminfo_line(&meminfo, key) {
                println!("  {line}");
            }
        }
    }
}

fn pretty_os_name(os_release: &str) -> Option<String> {
    os_release
        .lines()
        .find(|l| l.starts_with("PRETTY_NAME="))
        .map(|l| {
            l.trim_start_matches("PRETTY_NAME=")
                .trim_matches('"')
                .to_string()
        })
}

fn compact_meminfo_line(meminfo: &str, key: &str) -> Option<String> {
    meminfo
        .lines()
        .find(|l| l.starts_with(key))
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_os_name_unquotes() {
        let os_release = "NAME=Fedora\nPRETTY_NAME=\"Fedora Linux 41 (Workstation Edition)\"\nID=fedora\n";
        assert_eq!(
            pretty_os_name(os_release).as_deref(),
            Some("Fedora Linux 41 (Workstation Edition)")
        );
    }

    #[test]
    fn test_pretty_os_name_missing() {
        assert_eq!(pretty_os_name("ID=fedora\n"), None);
    }

    #[test]
    fn test_compact_meminfo_line() {
        let meminfo = "MemTotal:        8022340 kB\nMemFree:          512000 kB\nMemAvailable:    4100000 kB\n";
        assert_eq!(
            compact_meminfo_line(meminfo, "MemTotal").as_deref(),
            Some("MemTotal: 8022340 kB")
        );
        assert_eq!(
            compact_meminfo_line(meminfo, "MemAvailable").as_deref(),
            Some("MemAvailable: 4100000 kB")
        );
        assert_eq!(compact_meminfo_line(meminfo, "SwapTotal"), None);
    }
}
