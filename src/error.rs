use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by installation steps.
///
/// Most variants are fatal and halt the run. `ConfigConflict` and
/// `ServiceConfigFailed` are recoverable: they are recorded as issues,
/// reported in the final summary, and the remaining steps continue.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The host is not running Fedora.
    #[error("unsupported distribution (found '{found}', need Fedora)")]
    UnsupportedOs {
        /// The `ID` value read from /etc/os-release
        found: String,
    },

    /// No outbound network connectivity.
    #[error("no network connectivity (cannot reach {host})")]
    NoNetwork {
        /// Host the probe tried to reach
        host: String,
    },

    /// Sudo privileges could not be acquired.
    #[error("sudo privileges are required but could not be acquired")]
    PrivilegeRequired,

    /// dnf failed, or critical packages were skipped and could not be rescued.
    #[error("package installation failed: {reason}")]
    PackageInstallFailed {
        /// What dnf reported
        reason: String,
    },

    /// git clone exited non-zero.
    #[error("failed to clone {repo}: {reason}")]
    CloneFailed {
        /// Repository URL
        repo: String,
        /// Trimmed git stderr
        reason: String,
    },

    /// The cmake configure phase failed.
    #[error("cmake configure failed for {project}")]
    ConfigureFailed {
        /// Human-readable project name
        project: String,
        /// Tail of the captured tool output
        output: String,
    },

    /// Compilation failed.
    #[error("build failed for {project}")]
    BuildFailed {
        /// Human-readable project name
        project: String,
        /// Tail of the captured tool output
        output: String,
    },

    /// A config destination is occupied by a real file or directory.
    #[error("config path already exists and is not a symlink: {}", path.display())]
    ConfigConflict {
        /// The occupied destination
        path: PathBuf,
    },

    /// A greeter config write or systemd unit operation failed.
    #[error("failed to {action} {unit}")]
    ServiceConfigFailed {
        /// Unit or config target (e.g. "greetd")
        unit: String,
        /// What was attempted (e.g. "enable")
        action: String,
    },

    /// Underlying filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A subprocess could not be spawned at all.
    #[error("failed to run {command}: {source}")]
    CommandSpawn {
        /// The executable that was invoked
        command: String,
        #[source]
        source: io::Error,
    },
}

impl InstallError {
    /// Whether this error must halt the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::ConfigConflict { .. } | Self::ServiceConfigFailed { .. }
        )
    }

    /// Tool output captured when a configure or build phase failed.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::ConfigureFailed { output, .. } | Self::BuildFailed { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }

    /// Short hint for the troubleshooting section of the failure report.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::UnsupportedOs { .. } => "This installer only supports Fedora Linux.",
            Self::NoNetwork { .. } => {
                "Check your connection and proxy settings, then re-run the installer."
            }
            Self::PrivilegeRequired => "Run as a user with sudo access (wheel group).",
            Self::PackageInstallFailed { .. } => {
                "Try 'sudo dnf clean all && sudo dnf makecache', then re-run."
            }
            Self::CloneFailed { .. } => "Check network access to github.com, then re-run.",
            Self::ConfigureFailed { .. } => {
                "Verify the devel packages installed cleanly, then re-run."
            }
            Self::BuildFailed { .. } => {
                "Builds need around 4GB of RAM; increase VM memory if constrained."
            }
            Self::ConfigConflict { .. } => {
                "Move the existing path aside and re-run, or accept the backup prompt."
            }
            Self::ServiceConfigFailed { .. } => {
                "Re-run the failed systemctl command manually with sudo."
            }
            Self::Io(_) | Self::CommandSpawn { .. } => "Re-run with -v for more detail.",
        }
    }
}

pub type Result<T> = std::result::Result<T, InstallError>;

// ============================================================================
// Tests
// ============================================================================
