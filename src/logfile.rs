//! Append-only install log.
//!
//! Each run truncates the previous log. Every line is timestamped so the
//! tail can be replayed verbatim in failure reports.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::paths;

pub struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    /// Create (truncating) the install log at its default location.
    pub fn create() -> Result<Self> {
        Self::at(&paths::log_file()?)
    }

    /// Create (truncating) a log at an explicit path.
    pub fn at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory: {}", parent.display())
            })?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line. Write failures never abort the run;
    /// they are reported through `log::debug!` and dropped.
    pub fn line(&mut self, msg: &str) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        if let Err(e) = writeln!(self.file, "[{stamp}] {msg}") {
            log::debug!("install log write failed: {e}");
        }
    }

    /// Append a command invocation.
    pub fn command(&mut self, cmd: &str, args: &[&str]) {
        self.line(&format!("CMD: {} {}", cmd, args.join(" ")));
    }

    /// Append a block of process output, one prefixed line per source line.
    pub fn output(&mut self, prefix: &str, text: &str) {
        for l in text.lines() {
            if !l.trim().is_empty() {
                self.line(&format!("{prefix}: {l}"));
            }
        }
    }

    /// Return the last `n` lines of the log.
    pub fn tail(&self, n: usize) -> Vec<String> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].iter().map(|s| (*s).to_string()).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
