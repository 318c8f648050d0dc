use colored::Colorize;
use dialoguer::Confirm;

const BANNER: &str = r#"
   ______           __          __  _
  / ____/___ ____  / /__  _____/ /_(_)___ _
 / /   / __ `/ _ \/ / _ \/ ___/ __/ / __ `/
/ /___/ /_/ /  __/ /  __(__  ) /_/ / /_/ /
\____/\__,_/\___/_/\___/____/\__/_/\__,_/
"#;

/// Print the banner shown once at startup.
pub fn banner() {
    println!("{}", BANNER.magenta().bold());
    println!("{}", "  Hyprland Dotfiles Installer for Fedora".white().bold());
    println!();
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "→".blue().bold(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "!".yellow().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header with an underline
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.len()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{}/{}]", num, total).cyan().bold(), msg);
}

/// Ask a yes/no question. Falls back to `false` when no terminal is attached.
pub fn confirm(msg: &str, default: bool) -> bool {
    Confirm::new()
        .with_prompt(msg)
        .default(default)
        .interact()
        .unwrap_or(false)
}
