//! COPR registration and dnf package installation.
//!
//! Everything installs in a single dnf transaction with `--allowerasing`,
//! which resolves conflicts between the Hyprland COPR and the official
//! repositories. dnf does not fail the transaction when it skips conflicting
//! packages, so the output is scanned afterwards and the critical Qt devel
//! set gets a targeted second attempt.

use regex::Regex;

use crate::error::{InstallError, Result};
use crate::runner;
use crate::steps::RunContext;
use crate::ui;

pub const COPR_REPOS: &[&str] = &["solopasha/hyprland"];

/// Qt packages Quickshell cannot build without.
pub const CRITICAL_QT_PACKAGES: &[&str] = &[
    "qt6-qtbase-devel",
    "qt6-qtdeclarative-devel",
    "qt6-qtwayland-devel",
    "qt6-qtsvg-devel",
    "qt6-qtshadertools-devel",
    "qt6-qtbase-private-devel",
    "qt6-qtconnectivity-devel",
];

pub const HYPRLAND_PACKAGES: &[&str] = &[
    "hyprland",
    "xdg-desktop-portal-hyprland",
    "xdg-desktop-portal-gtk",
    "hyprutils-devel",
    "hyprlang-devel",
];

pub const TERMINAL_PACKAGES: &[&str] = &["foot", "fish"];

pub const GREETER_PACKAGES: &[&str] = &["greetd", "tuigreet"];

pub const QT_PACKAGES: &[&str] = &[
    "qt6-qtbase-devel",
    "qt6-qtbase-private-devel",
    "qt6-qtdeclarative-devel",
    "qt6-qtdeclarative-static",
    "qt6-qtbase-static",
    "qt6-qtwayland-devel",
    "qt6-qtsvg-devel",
    "qt6-qtshadertools-devel",
    "qt6-qtconnectivity-devel",
    "spirv-tools",
    "cli11-devel",
    "jemalloc-devel",
];

pub const WAYLAND_PACKAGES: &[&str] = &[
    "wayland-devel",
    "wayland-protocols-devel",
    "libdrm-devel",
    "mesa-libgbm-devel",
    "pipewire-devel",
];

pub const QUICKSHELL_OPTIONAL_PACKAGES: &[&str] = &[
    "polkit-devel",
    "pam-devel",
    "pkgconf-pkg-config",
    "libqalculate-devel",
    "aubio-devel",
];

pub const CAVA_BUILD_PACKAGES: &[&str] = &[
    "alsa-lib-devel",
    "fftw-devel",
    "pulseaudio-libs-devel",
    "autoconf-archive",
    "iniparser-devel",
    "libtool",
];

pub const BUILD_TOOL_PACKAGES: &[&str] = &[
    "cmake",
    "ninja-build",
    "gcc-c++",
    "git",
    "curl",
    "tar",
    "unzip",
];

pub const PYTHON_PACKAGES: &[&str] = &[
    "python3-devel",
    "python3-build",
    "python3-hatchling",
    "python3-pip",
];

pub const DESKTOP_PACKAGES: &[&str] = &[
    "libnotify",
    "fuzzel",
    "glib2-devel",
    "adw-gtk3-theme",
    "papirus-icon-theme",
    "google-noto-fonts-common",
    "google-noto-sans-fonts",
    "google-rubik-fonts",
    "fontawesome-fonts",
];

pub const UTILITY_PACKAGES: &[&str] = &[
    "eza",
    "fastfetch",
    "btop",
    "wl-clipboard",
    "grim",
    "slurp",
    "swappy",
    "brightnessctl",
    "playerctl",
    "pamixer",
    "NetworkManager",
    "lxpolkit",
    "Thunar",
    "plasma-discover",
    "plasma-discover-flatpak",
    "zoxide",
    "fzf",
];

pub const PACKAGE_GROUPS: &[(&str, &[&str])] = &[
    ("Hyprland", HYPRLAND_PACKAGES),
    ("Terminal and shell", TERMINAL_PACKAGES),
    ("Greeter", GREETER_PACKAGES),
    ("Qt 6 development", QT_PACKAGES),
    ("Wayland development", WAYLAND_PACKAGES),
    ("Quickshell optional", QUICKSHELL_OPTIONAL_PACKAGES),
    ("Cava build", CAVA_BUILD_PACKAGES),
    ("Build tools", BUILD_TOOL_PACKAGES),
    ("Python build tools", PYTHON_PACKAGES),
    ("Desktop", DESKTOP_PACKAGES),
    ("Utilities", UTILITY_PACKAGES),
];

/// Packages checked alongside the Qt set before building Quickshell.
const SUPPORT_BUILD_TOOLS: &[&str] = &[
    "cmake",
    "ninja-build",
    "gcc-c++",
    "pkgconf",
    "fftw-devel",
    "iniparser-devel",
    "libqalculate-devel",
    "pipewire-devel",
    "aubio-devel",
];

const QT_QUICK_PRIVATE_CMAKE: &str =
    "/usr/lib64/cmake/Qt6QuickPrivate/Qt6QuickPrivateConfig.cmake";
const QT_WAYLAND_PRIVATE_CMAKE: &str =
    "/usr/lib64/cmake/Qt6WaylandClientPrivate/Qt6WaylandClientPrivateConfig.cmake";

/// The full transaction: every group plus config-supplied extras.
pub fn package_set(extra: &[String]) -> Vec<&str> {
    let mut set: Vec<&str> = Vec::new();
    for (_, group) in PACKAGE_GROUPS {
        set.extend(group.iter().copied());
    }
    set.extend(extra.iter().map(String::as_str));
    set
}

fn dnf_install_args<'a>(packages: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec!["dnf", "install", "-y", "--allowerasing"];
    args.extend(packages.iter().copied());
    args
}

// ============================================================================
// COPR repositories
// ============================================================================

pub fn enable_coprs(ctx: &mut RunContext) -> Result<()> {
    let listed = runner::capture(&mut ctx.log, "dnf", &["copr", "list"])
        .map(|out| out.stdout)
        .unwrap_or_default();

    for repo in COPR_REPOS {
        if copr_enabled(&listed, repo) {
            ui::info(&format!("COPR {repo} already enabled, skipping"));
            continue;
        }

        if ctx.opts.dry_run {
            ui::info(&format!("Would enable COPR repository {repo}"));
            continue;
        }

        let out = runner::capture(&mut ctx.log, "sudo", &["dnf", "copr", "enable", "-y", repo])?;
        if !out.success() {
            return Err(InstallError::PackageInstallFailed {
                reason: format!("could not enable COPR {repo}: {}", out.stderr.trim()),
            });
        }
        ui::success(&format!("Enabled COPR repository {repo}"));
        ctx.log.line(&format!("Enabled COPR {repo}"));
    }
    Ok(())
}

/// Whether `dnf copr list` output names this repository as enabled.
/// Disabled repositories are listed with a "(disabled)" suffix and count
/// as not enabled.
fn copr_enabled(list_output: &str, repo: &str) -> bool {
    list_output
        .lines()
        .any(|l| l.contains(repo) && !l.contains("(disabled)"))
}

// ============================================================================
// Package installation
// ============================================================================

pub fn install_all(ctx: &mut RunContext) -> Result<()> {
    let packages = package_set(&ctx.config.packages.extra);

    if ctx.opts.dry_run {
        ui::info("Would run: sudo dnf install -y --allowerasing <packages>");
        for (group, members) in PACKAGE_GROUPS {
            ui::dim(&format!("{group}: {}", members.join(" ")));
        }
        if !ctx.config.packages.extra.is_empty() {
            ui::dim(&format!("Extra: {}", ctx.config.packages.extra.join(" ")));
        }
        return Ok(());
    }

    let args = dnf_install_args(&packages);
    let out = runner::capture_spinner(
        &mut ctx.log,
        &format!(
            "Installing {} packages with dnf (this can take several minutes)...",
            packages.len()
        ),
        "sudo",
        &args,
    )?;

    if has_skip_warning(&out.stdout) {
        ui::warn("dnf skipped some packages due to conflicts or broken dependencies");
        rescue_skipped_criticals(ctx, &out.stdout)?;
    }

    if !out.success() {
        return Err(InstallError::PackageInstallFailed {
            reason: format!("dnf exited with {}: {}", out.code(), out.tail(400)),
        });
    }

    ui::success("Package installation complete");
    ctx.log.line("Package installation complete");
    Ok(())
}

/// Re-attempt critical Qt packages that dnf skipped. A critical package
/// still skipped after the targeted retry is fatal.
fn rescue_skipped_criticals(ctx: &mut RunContext, stdout: &str) -> Result<()> {
    let skipped = skipped_criticals(stdout);
    if skipped.is_empty() {
        return Ok(());
    }

    ui::error("Critical Qt development packages were skipped:");
    for pkg in &skipped {
        ui::dim(&format!("- {pkg}"));
    }
    let args = dnf_install_args(CRITICAL_QT_PACKAGES);
    let out = runner::capture_spinner(
        &mut ctx.log,
        "Retrying the Qt set with conflict resolution...",
        "sudo",
        &args,
    )?;

    if !out.success() || has_skip_warning(&out.stdout) {
        return Err(InstallError::PackageInstallFailed {
            reason: format!(
                "critical Qt packages could not be installed ({})",
                skipped.join(", ")
            ),
        });
    }

    ui::success("Qt packages installed after conflict resolution");
    Ok(())
}

fn skip_warning_re() -> Regex {
    Regex::new(r"Skipping packages with (conflicts|broken dependencies)").unwrap()
}

fn has_skip_warning(stdout: &str) -> bool {
    skip_warning_re().is_match(stdout)
}

/// Critical Qt packages named inside a dnf "Skipping packages" section.
/// A section ends at a blank line or the next transaction heading.
fn skipped_criticals(stdout: &str) -> Vec<&'static str> {
    let re = skip_warning_re();
    let mut in_section = false;
    let mut skipped = Vec::new();

    for line in stdout.lines() {
        if re.is_match(line) {
            in_section = true;
            continue;
        }
        if in_section
            && (line.trim().is_empty()
                || line.starts_with("Installing")
                || line.starts_with("Upgrading"))
        {
            in_section = false;
        }
        if in_section {
            for pkg in CRITICAL_QT_PACKAGES {
                if line.contains(pkg) && !skipped.contains(pkg) {
                    skipped.push(pkg);
                }
            }
        }
    }
    skipped
}

// ============================================================================
// Qt verification (pre-Quickshell)
// ============================================================================

/// Verify the critical Qt set and supporting tools with rpm, installing
/// anything missing. Called before the Quickshell build; a package still
/// missing afterwards is fatal.
pub fn verify_qt(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would verify Qt development packages (dry-run)");
        return Ok(());
    }

    ui::info("Verifying Qt development packages...");

    let mut missing: Vec<&str> = Vec::new();
    for pkg in CRITICAL_QT_PACKAGES.iter().chain(SUPPORT_BUILD_TOOLS) {
        if !runner::quiet_status("rpm", &["-q", pkg]) {
            missing.push(pkg);
        }
    }

    if missing.is_empty() {
        ui::success("All critical packages are installed");
    } else {
        ui::warn(&format!("Missing critical packages: {}", missing.join(", ")));
        ctx.log.line(&format!("Installing missing packages: {}", missing.join(" ")));

        let args = dnf_install_args(&missing);
        let out = runner::capture(&mut ctx.log, "sudo", &args)?;
        if !out.success() || has_skip_warning(&out.stdout) {
            return Err(InstallError::PackageInstallFailed {
                reason: format!("could not install: {}", missing.join(", ")),
            });
        }

        let still_missing: Vec<&str> = missing
            .iter()
            .filter(|pkg| !runner::quiet_status("rpm", &["-q", pkg]))
            .copied()
            .collect();
        if !still_missing.is_empty() {
            return Err(InstallError::PackageInstallFailed {
                reason: format!("still missing after install: {}", still_missing.join(", ")),
            });
        }
        ui::success("Missing packages installed");
    }

    for (component, path) in [
        ("Qt6QuickPrivate", QT_QUICK_PRIVATE_CMAKE),
        ("Qt6WaylandClientPrivate", QT_WAYLAND_PRIVATE_CMAKE),
    ] {
        if !std::path::Path::new(path).exists() {
            return Err(InstallError::PackageInstallFailed {
                reason: format!("{component} cmake component not found at {path}"),
            });
        }
        ui::success(&format!("{component} component is available"));
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_set_covers_all_groups() {
        let set = package_set(&[]);
        for (_, group) in PACKAGE_GROUPS {
            for pkg in *group {
                assert!(set.contains(pkg), "{pkg} missing from package set");
            }
        }
    }

    #[test]
    fn test_package_set_appends_extras() {
        let extra = vec!["neovim".to_string(), "ripgrep".to_string()];
        let set = package_set(&extra);
        assert!(set.contains(&"neovim"));
        assert!(set.contains(&"ripgrep"));
        assert_eq!(set.last(), Some(&"ripgrep"));
    }

    #[test]
    fn test_criticals_are_in_the_main_transaction() {
        let set = package_set(&[]);
        for pkg in CRITICAL_QT_PACKAGES {
            assert!(set.contains(pkg), "{pkg} not in main transaction");
        }
    }

    #[test]
    fn test_dnf_args_use_allowerasing() {
        let args = dnf_install_args(&["hyprland", "foot"]);
        assert_eq!(&args[..4], &["dnf", "install", "-y", "--allowerasing"]);
        assert_eq!(&args[4..], &["hyprland", "foot"]);
    }

    #[test]
    fn test_skip_warning_detection() {
        assert!(has_skip_warning("Skipping packages with conflicts:\n  foo\n"));
        assert!(has_skip_warning("Skipping packages with broken dependencies:\n"));
        assert!(!has_skip_warning("Installing:\n  foo\n"));
    }

    #[test]
    fn test_skipped_criticals_inside_section() {
        let stdout = "\
Last metadata expiration check: 0:01:00 ago.
Skipping packages with conflicts:
  qt6-qtbase-devel-6.8.1-1.fc41.x86_64
  some-other-package-1.0-1.fc41.x86_64

Installing:
  hyprland-0.45.0-1.fc41.x86_64
";
        let skipped = skipped_criticals(stdout);
        assert_eq!(skipped, vec!["qt6-qtbase-devel"]);
    }

    #[test]
    fn test_skipped_criticals_section_ends_at_heading() {
        let stdout = "\
Skipping packages with broken dependencies:
  qt6-qtwayland-devel-6.8.1-1.fc41.x86_64
Installing:
  qt6-qtsvg-devel-6.8.1-1.fc41.x86_64
";
        let skipped = skipped_criticals(stdout);
        assert_eq!(skipped, vec!["qt6-qtwayland-devel"]);
    }

    #[test]
    fn test_skipped_criticals_empty_without_section() {
        let stdout = "Installing:\n  qt6-qtbase-devel-6.8.1-1.fc41.x86_64\n";
        assert!(skipped_criticals(stdout).is_empty());
    }

    #[test]
    fn test_copr_enabled_matching() {
        let listed = "\
copr.fedorainfracloud.org/solopasha/hyprland
copr.fedorainfracloud.org/other/repo (disabled)
";
        assert!(copr_enabled(listed, "solopasha/hyprland"));
        assert!(!copr_enabled(listed, "other/repo"));
        assert!(!copr_enabled(listed, "missing/repo"));
        assert!(!copr_enabled("", "solopasha/hyprland"));
    }
}
