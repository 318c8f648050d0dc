//! Pre-flight checks: distribution, network, privileges.
//!
//! These run before anything mutating. The OS check is read-only and runs
//! even under `--dry-run`; the network and sudo checks are skipped there.

use std::fs;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{InstallError, Result};
use crate::steps::RunContext;
use crate::sudo::SudoContext;
use crate::ui;

const OS_RELEASE_PATH: &str = "/etc/os-release";
const NETWORK_PROBE_HOST: &str = "fedoraproject.org";
const NETWORK_PROBE_PORT: u16 = 443;
const NETWORK_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run(ctx: &mut RunContext) -> Result<()> {
    check_os(ctx)?;
    check_network(ctx)?;
    check_sudo(ctx)?;
    Ok(())
}

fn check_os(ctx: &mut RunContext) -> Result<()> {
    let content = fs::read_to_string(OS_RELEASE_PATH).unwrap_or_default();
    fedora_check(&content)?;
    ui::success("Running on Fedora");
    ctx.log.line("Pre-flight: Fedora detected");
    Ok(())
}

fn fedora_check(os_release: &str) -> Result<()> {
    let id = os_release_id(os_release).unwrap_or_else(|| "unknown".to_string());
    if id != "fedora" {
        return Err(InstallError::UnsupportedOs { found: id });
    }
    Ok(())
}

/// The `ID=` value from os-release content, with optional quotes stripped.
fn os_release_id(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find_map(|l| l.strip_prefix("ID="))
        .map(|v| v.trim_matches('"').to_string())
}

fn check_network(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would check network connectivity (dry-run)");
        return Ok(());
    }

    let no_network = || InstallError::NoNetwork {
        host: NETWORK_PROBE_HOST.to_string(),
    };

    let addrs = (NETWORK_PROBE_HOST, NETWORK_PROBE_PORT)
        .to_socket_addrs()
        .map_err(|_| no_network())?;

    for addr in addrs {
        if TcpStream::connect_timeout(&addr, NETWORK_TIMEOUT).is_ok() {
            ui::success("Network connectivity confirmed");
            ctx.log.line("Pre-flight: network reachable");
            return Ok(());
        }
    }
    Err(no_network())
}

fn check_sudo(ctx: &mut RunContext) -> Result<()> {
    if ctx.opts.dry_run {
        ui::info("Would validate sudo access (dry-run)");
        return Ok(());
    }

    let sudo = if ctx.opts.no_confirm {
        SudoContext::acquire_cached()?
    } else {
        SudoContext::acquire("installing packages and configuring system services")?
    };
    ctx.sudo = Some(sudo);

    ui::success("Sudo privileges acquired");
    ctx.log.line("Pre-flight: sudo acquired");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FEDORA_OS_RELEASE: &str = r#"NAME="Fedora Linux"
VERSION="41 (Workstation Edition)"
ID=fedora
VERSION_ID=41
PRETTY_NAME="Fedora Linux 41 (Workstation Edition)"
"#;

    const UBUNTU_OS_RELEASE: &str = r#"PRETTY_NAME="Ubuntu 24.04 LTS"
NAME="Ubuntu"
VERSION_ID="24.04"
ID=ubuntu
ID_LIKE=debian
"#;

    #[test]
    fn test_os_release_id_bare() {
        assert_eq!(os_release_id(FEDORA_OS_RELEASE).as_deref(), Some("fedora"));
    }

    #[test]
    fn test_os_release_id_quoted() {
        assert_eq!(os_release_id("ID=\"fedora\"\n").as_deref(), Some("fedora"));
    }

    #[test]
    fn test_os_release_id_ignores_id_like() {
        assert_eq!(os_release_id(UBUNTU_OS_RELEASE).as_deref(), Some("ubuntu"));
    }

    #[test]
    fn test_os_release_id_missing() {
        assert_eq!(os_release_id("NAME=Something\n"), None);
        assert_eq!(os_release_id(""), None);
    }

    #[test]
    fn test_fedora_check_accepts_fedora() {
        assert!(fedora_check(FEDORA_OS_RELEASE).is_ok());
        assert!(fedora_check("ID=\"fedora\"").is_ok());
    }

    #[test]
    fn test_fedora_check_names_the_found_distro() {
        let err = fedora_check(UBUNTU_OS_RELEASE).unwrap_err();
        match err {
            InstallError::UnsupportedOs { found } => assert_eq!(found, "ubuntu"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fedora_check_unreadable_is_unknown() {
        let err = fedora_check("").unwrap_err();
        match err {
            InstallError::UnsupportedOs { found } => assert_eq!(found, "unknown"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
