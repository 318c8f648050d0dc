//! Source builds: Quickshell, the Hyprland Qt helpers, the Caelestia shell,
//! and the cavacore library the shell's audio visualizer links against.
//!
//! Every project follows the same cmake configure / cmake build / sudo
//! install shape. Build parallelism comes from the config override when set,
//! otherwise from available memory.

use std::env;
use std::fs;
use std::path::Path;

use crate::error::{InstallError, Result};
use crate::fetch;
use crate::packages;
use crate::paths;
use crate::runner;
use crate::steps::RunContext;
use crate::system;
use crate::ui;

const QUICKSHELL_REPO: &str = "https://git.outfoxxed.me/outfoxxed/quickshell.git";
const CAVA_REPO: &str = "https://github.com/karlstav/cava";
const QT_SUPPORT_REPO: &str = "https://github.com/hyprwm/hyprland-qt-support";
const QT_UTILS_REPO: &str = "https://github.com/hyprwm/hyprland-qtutils";

const CAVA_PC_PATH: &str = "/usr/lib64/pkgconfig/cava.pc";
const QT_SUPPORT_LIB: &str = "/usr/lib64/libhyprland-qt-support.so";

const SHELL_DEFINES: &[&str] = &[
    "-DCMAKE_BUILD_TYPE=Release",
    "-DCMAKE_INSTALL_PREFIX=/usr",
    "-DINSTALL_QMLDIR=/usr/lib64/qt6/qml",
    "-DINSTALL_LIBDIR=/usr/lib64/caelestia",
];

const QUICKSHELL_DEFINES: &[&str] = &[
    "-DCMAKE_BUILD_TYPE=Release",
    "-DUSE_JEMALLOC=ON",
    "-DX11=OFF",
    "-DCRASH_REPORTER=OFF",
    "-DQt6_DIR=/usr/lib64/cmake/Qt6",
];

const CAVA_DEFINES: &[&str] = &[
    "-DCMAKE_BUILD_TYPE=Release",
    "-DCMAKE_POSITION_INDEPENDENT_CODE=ON",
];

const QT_SUPPORT_DEFINES: &[&str] = &[
    "-DCMAKE_BUILD_TYPE=Release",
    "-DCMAKE_INSTALL_PREFIX=/usr",
    "-DCMAKE_INSTALL_LIBDIR=lib64",
];

const QT_UTILS_DEFINES: &[&str] = &[
    "-DCMAKE_BUILD_TYPE=Release",
    "-DCMAKE_INSTALL_PREFIX=/usr",
    "-DQt6_DIR=/usr/lib64/cmake/Qt6",
];

const CAVA_PC: &str = r#"prefix=/usr
exec_prefix=${prefix}
libdir=${exec_prefix}/lib64
includedir=${prefix}/include

Name: cava
Description: Cava Core Library
Version: 0.10.3
Libs: -L${libdir} -lcavacore -lfftw3 -lm -liniparser
Cflags: -I${includedir}
"#;

// ============================================================================
// Shared cmake machinery
// ============================================================================

fn cmake_configure_args(source: &str, build: &str, defines: &[&str]) -> Vec<String> {
    let mut args: Vec<String> = ["-B", build, "-S", source, "-G", "Ninja"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.extend(defines.iter().map(|s| s.to_string()));
    args
}

fn cmake_build_args(build: &str, jobs: Option<u32>) -> Vec<String> {
    let mut args = vec!["--build".to_string(), build.to_string()];
    if let Some(jobs) = jobs {
        args.push("-j".to_string());
        args.push(jobs.to_string());
    }
    args
}

/// Config override wins; otherwise parallelism is derived from memory.
fn effective_jobs(ctx: &mut RunContext) -> Option<u32> {
    ctx.config.build.jobs.or_else(|| system::build_jobs(&mut ctx.log))
}

fn configure(
    ctx: &mut RunContext,
    project: &str,
    source: &Path,
    build: &Path,
    defines: &[&str],
) -> Result<()> {
    ui::info(&format!("Configuring {project}..."));
    let args = cmake_configure_args(
        &source.display().to_string(),
        &build.display().to_string(),
        defines,
    );
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    let out = runner::capture(&mut ctx.log, "cmake", &arg_refs)?;
    if !out.success() {
        return Err(InstallError::ConfigureFailed {
            project: project.to_string(),
            output: out.tail(2000),
        });
    }
    Ok(())
}

fn compile(ctx: &mut RunContext, project: &str, build: &Path) -> Result<()> {
    let args = cmake_build_args(&build.display().to_string(), effective_jobs(ctx));
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    let out = runner::capture_spinner(
        &mut ctx.log,
        &format!("Compiling {project} (this can take a while)..."),
        "cmake",
        &arg_refs,
    )?;
    if !out.success() {
        system::check_oom(&mut ctx.log);
        return Err(InstallError::BuildFailed {
            project: project.to_string(),
            output: out.tail(2000),
        });
    }
    ui::success(&format!("Built {project}"));
    Ok(())
}

fn sudo_install(ctx: &mut RunContext, project: &str, build: &Path) -> Result<()> {
    ui::info(&format!("Installing {project}..."));
    let build_s = build.display().to_string();
    let out = runner::capture(&mut ctx.log, "sudo", &["cmake", "--install", &build_s])?;
    if !out.success() {
        return Err(InstallError::BuildFailed {
            project: project.to_string(),
            output: out.tail(2000),
        });
    }
    ui::success(&format!("Installed {project}"));
    ctx.log.line(&format!("{project} installation complete"));
    Ok(())
}

// ============================================================================
// Quickshell
// ============================================================================

pub fn install_quickshell(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would build and install Quickshell from source");
        return Ok(());
    }

    if runner::command_exists("qs") || runner::command_exists("quickshell") {
        ui::success("Quickshell already installed");
        return Ok(());
    }

    packages::verify_qt(ctx)?;

    let source = env::temp_dir().join("quickshell");
    fetch::fresh_dir(&source)?;
    ui::info("Cloning Quickshell...");
    fetch::clone_shallow(ctx, QUICKSHELL_REPO, &source)?;

    let build = source.join("build");
    configure(ctx, "Quickshell", &source, &build, QUICKSHELL_DEFINES)?;
    compile(ctx, "Quickshell", &build)?;
    sudo_install(ctx, "Quickshell", &build)
}

// ============================================================================
// Hyprland Qt helpers
// ============================================================================

pub fn install_qt_helpers(ctx: &mut RunContext) -> Result<()> {
    install_qt_support(ctx)?;
    install_qt_utils(ctx)
}

fn install_qt_support(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would build and install hyprland-qt-support");
        return Ok(());
    }

    if Path::new(QT_SUPPORT_LIB).exists() {
        ui::success("hyprland-qt-support already installed");
        return Ok(());
    }

    let source = env::temp_dir().join("hyprland-qt-support");
    fetch::fresh_dir(&source)?;
    ui::info("Cloning hyprland-qt-support...");
    fetch::clone_shallow(ctx, QT_SUPPORT_REPO, &source)?;

    let build = source.join("build");
    configure(ctx, "hyprland-qt-support", &source, &build, QT_SUPPORT_DEFINES)?;
    compile(ctx, "hyprland-qt-support", &build)?;
    sudo_install(ctx, "hyprland-qt-support", &build)
}

fn install_qt_utils(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would build and install hyprland-qtutils");
        return Ok(());
    }

    if runner::command_exists("hyprland-dialog") {
        ui::success("hyprland-qtutils already installed");
        return Ok(());
    }

    packages::verify_qt(ctx)?;

    let source = env::temp_dir().join("hyprland-qtutils");
    fetch::fresh_dir(&source)?;
    ui::info("Cloning hyprland-qtutils...");
    fetch::clone_shallow(ctx, QT_UTILS_REPO, &source)?;

    let build = source.join("build");
    configure(ctx, "hyprland-qtutils", &source, &build, QT_UTILS_DEFINES)?;
    compile(ctx, "hyprland-qtutils", &build)?;
    sudo_install(ctx, "hyprland-qtutils", &build)
}

// ============================================================================
// Caelestia shell
// ============================================================================

pub fn build_shell(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would build and install the Caelestia shell");
        return Ok(());
    }

    let shell_dir = paths::shell_dir()?;
    if !shell_dir.exists() {
        return Err(InstallError::ConfigureFailed {
            project: "caelestia-shell".to_string(),
            output: format!(
                "shell checkout not found at {}, run the clone step first",
                shell_dir.display()
            ),
        });
    }

    let build = shell_dir.join("build");

    match shell_build_once(ctx, &shell_dir, &build) {
        Ok(()) => {}
        // The shell's audio visualizer needs libcava, which has no Fedora
        // package. Build it once, then retry.
        Err(e) if !cavacore_installed() => {
            ui::warn("Shell build failed and libcava is not installed");
            ctx.log.line(&format!("RETRY: building cavacore first, shell build said: {e}"));
            install_cavacore(ctx)?;
            ui::info("Retrying the shell build...");
            shell_build_once(ctx, &shell_dir, &build)?;
        }
        Err(e) => return Err(e),
    }

    install_shell(ctx, &build)
}

fn shell_build_once(ctx: &mut RunContext, shell_dir: &Path, build: &Path) -> Result<()> {
    fetch::fresh_dir(build)?;
    fs::create_dir_all(build)?;
    configure(ctx, "caelestia-shell", shell_dir, build, SHELL_DEFINES)?;
    compile(ctx, "caelestia-shell", build)
}

/// Shell installation failing is recoverable: the build artifacts stay in
/// place and the issue is reported at the end of the run.
fn install_shell(ctx: &mut RunContext, build: &Path) -> Result<()> {
    ui::info("Installing caelestia-shell...");
    let build_s = build.display().to_string();
    let out = runner::capture(&mut ctx.log, "sudo", &["cmake", "--install", &build_s])?;

    if !out.success() {
        ui::warn("Shell installation failed");
        ctx.record_issue(
            "shell-build",
            format!("cmake --install failed: {}", out.stderr.trim()),
        );
        return Ok(());
    }

    ui::success("Installed caelestia-shell");
    ctx.log.line("Shell installation complete");

    for qml_dir in ["/usr/lib64/qt6/qml/Caelestia", "/usr/lib/qt6/qml/Caelestia"] {
        if Path::new(qml_dir).exists() {
            ui::success(&format!("Shell QML modules present at {qml_dir}"));
            return Ok(());
        }
    }
    ui::warn("Shell QML modules not found under /usr/lib64/qt6/qml");
    Ok(())
}

// ============================================================================
// cavacore
// ============================================================================

fn cavacore_installed() -> bool {
    Path::new(CAVA_PC_PATH).exists()
}

/// Build cava's core library and register it with pkg-config by hand.
/// Upstream cava has no install target for the standalone library.
fn install_cavacore(ctx: &mut RunContext) -> Result<()> {
    let source = env::temp_dir().join("cava-build");
    fetch::fresh_dir(&source)?;
    ui::info("Cloning cava...");
    fetch::clone_shallow(ctx, CAVA_REPO, &source)?;

    let build = source.join("build");
    configure(ctx, "cavacore", &source, &build, CAVA_DEFINES)?;
    compile(ctx, "cavacore", &build)?;

    ui::info("Installing the cavacore library and headers...");
    let header = source.join("cavacore.h").display().to_string();
    let lib = build.join("libcavacore.a").display().to_string();

    let pc_file = source.join("cava.pc");
    fs::write(&pc_file, CAVA_PC)?;
    let pc_s = pc_file.display().to_string();

    let installs: &[&[&str]] = &[
        &["cp", &header, "/usr/include/"],
        &["mkdir", "-p", "/usr/include/cava"],
        &["ln", "-sf", "/usr/include/cavacore.h", "/usr/include/cava/cavacore.h"],
        &["cp", &lib, "/usr/lib64/"],
        &["cp", &pc_s, "/usr/lib64/pkgconfig/"],
    ];

    for args in installs {
        let out = runner::capture(&mut ctx.log, "sudo", args)?;
        if !out.success() {
            return Err(InstallError::BuildFailed {
                project: "cavacore".to_string(),
                output: out.tail(2000),
            });
        }
    }

    ui::success("cavacore installed");
    ctx.log.line("cavacore installation complete");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_args_shape() {
        let args = cmake_configure_args("/src", "/src/build", SHELL_DEFINES);
        assert_eq!(&args[..6], &["-B", "/src/build", "-S", "/src", "-G", "Ninja"]);
        assert!(args.contains(&"-DCMAKE_INSTALL_PREFIX=/usr".to_string()));
        assert!(args.contains(&"-DINSTALL_QMLDIR=/usr/lib64/qt6/qml".to_string()));
    }

    #[test]
    fn test_build_args_with_job_limit() {
        let args = cmake_build_args("/src/build", Some(2));
        assert_eq!(args, vec!["--build", "/src/build", "-j", "2"]);
    }

    #[test]
    fn test_build_args_default_parallelism() {
        let args = cmake_build_args("/src/build", None);
        assert_eq!(args, vec!["--build", "/src/build"]);
    }

    #[test]
    fn test_quickshell_defines_disable_x11() {
        assert!(QUICKSHELL_DEFINES.contains(&"-DX11=OFF"));
        assert!(QUICKSHELL_DEFINES.contains(&"-DUSE_JEMALLOC=ON"));
        assert!(QUICKSHELL_DEFINES.contains(&"-DCRASH_REPORTER=OFF"));
    }

    #[test]
    fn test_cava_pc_links_cavacore() {
        assert!(CAVA_PC.contains("Name: cava"));
        assert!(CAVA_PC.contains("-lcavacore"));
        assert!(CAVA_PC.contains("libdir=${exec_prefix}/lib64"));
    }
}
