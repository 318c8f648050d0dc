//! Sudo acquisition for the privileged steps.
//!
//! Sudo is validated once during pre-flight so the later dnf, cmake install,
//! and systemctl invocations reuse the cached timestamp. The timestamp is
//! invalidated again when the context drops.

use std::process::{Command, Stdio};

use crate::error::{InstallError, Result};

pub struct SudoContext;

impl SudoContext {
    /// Validate sudo interactively, showing the reason first. Prompts for a
    /// password if the timestamp is not already cached.
    pub fn acquire(reason: &str) -> Result<Self> {
        eprintln!();
        eprintln!("  Sudo required: {reason}");
        eprintln!();

        let status = Command::new("sudo")
            .arg("-v")
            .status()
            .map_err(|e| InstallError::CommandSpawn {
                command: "sudo".into(),
                source: e,
            })?;

        if !status.success() {
            return Err(InstallError::PrivilegeRequired);
        }
        Ok(Self)
    }

    /// Non-interactive acquisition, used with `--noconfirm`. Succeeds only
    /// when no password would be needed.
    pub fn acquire_cached() -> Result<Self> {
        if Self::is_valid() {
            Ok(Self)
        } else {
            Err(InstallError::PrivilegeRequired)
        }
    }

    /// Check whether sudo is currently valid without prompting.
    pub fn is_valid() -> bool {
        Command::new("sudo")
            .args(["-n", "true"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl Drop for SudoContext {
    fn drop(&mut self) {
        let _ = Command::new("sudo")
            .arg("-k")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
}
