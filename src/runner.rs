use std::io::Write;
use std::path::Path;
use std::process::{Command, ExitStatus, Output, Stdio};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{InstallError, Result};
use crate::logfile::LogFile;

/// Captured output of a finished subprocess.
#[derive(Debug)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Last `max_chars` characters of combined output, for failure reports.
    pub fn tail(&self, max_chars: usize) -> String {
        let combined = if self.stderr.trim().is_empty() {
            self.stdout.trim().to_string()
        } else if self.stdout.trim().is_empty() {
            self.stderr.trim().to_string()
        } else {
            format!("{}\n{}", self.stdout.trim(), self.stderr.trim())
        };

        let chars: Vec<char> = combined.chars().collect();
        if chars.len() <= max_chars {
            combined
        } else {
            chars[chars.len() - max_chars..].iter().collect()
        }
    }
}

impl From<Output> for CmdOutput {
    fn from(o: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&o.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&o.stderr).into_owned(),
            status: o.status,
        }
    }
}

fn spawn_err(cmd: &str, e: std::io::Error) -> InstallError {
    InstallError::CommandSpawn {
        command: cmd.to_string(),
        source: e,
    }
}

/// Run a command and capture both streams. The invocation, output, and exit
/// code are appended to the install log.
pub fn capture(log: &mut LogFile, cmd: &str, args: &[&str]) -> Result<CmdOutput> {
    capture_in(log, None, cmd, args)
}

/// Like [`capture`] but with an explicit working directory.
pub fn capture_in(
    log: &mut LogFile,
    dir: Option<&Path>,
    cmd: &str,
    args: &[&str],
) -> Result<CmdOutput> {
    log.command(cmd, args);
    let mut command = Command::new(cmd);
    command.args(args);
    if let Some(d) = dir {
        command.current_dir(d);
    }
    let out: CmdOutput = command.output().map_err(|e| spawn_err(cmd, e))?.into();
    log.output("OUT", &out.stdout);
    log.output("ERR", &out.stderr);
    log.line(&format!("EXIT: {}", out.code()));
    Ok(out)
}

/// Run a long command behind a spinner. Output is still captured and logged;
/// the spinner is cleared before returning.
pub fn capture_spinner(
    log: &mut LogFile,
    msg: &str,
    cmd: &str,
    args: &[&str],
) -> Result<CmdOutput> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = capture(log, cmd, args);
    pb.finish_and_clear();
    result
}

/// Run a command with stdio inherited, for interactive tools and live
/// progress (sudo password prompts, curl | sh installers).
pub fn interactive(log: &mut LogFile, cmd: &str, args: &[&str]) -> Result<ExitStatus> {
    log.command(cmd, args);
    let status = Command::new(cmd)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| spawn_err(cmd, e))?;
    log.line(&format!("EXIT: {}", status.code().unwrap_or(-1)));
    Ok(status)
}

/// Run a command feeding `input` to its stdin, capturing output.
pub fn capture_with_stdin(
    log: &mut LogFile,
    cmd: &str,
    args: &[&str],
    input: &str,
) -> Result<CmdOutput> {
    log.command(cmd, args);
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_err(cmd, e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .map_err(|e| spawn_err(cmd, e))?;
    }

    let out: CmdOutput = child
        .wait_with_output()
        .map_err(|e| spawn_err(cmd, e))?
        .into();
    log.output("ERR", &out.stderr);
    log.line(&format!("EXIT: {}", out.code()));
    Ok(out)
}

/// Run a command silently, returning success/failure.
pub fn quiet_status(cmd: &str, args: &[&str]) -> bool {
    Command::new(cmd)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Check if a command exists on PATH.
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

// ============================================================================
// Tests
// ============================================================================
