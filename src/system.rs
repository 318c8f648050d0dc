//! Host introspection for build tuning.
//!
//! Compiles of Quickshell and the shell are the memory-hungry part of the
//! install; low-RAM machines (small VMs especially) get their parallelism
//! capped, and failed builds are checked for OOM-killer evidence.

use std::fs;

use crate::logfile::LogFile;
use crate::runner;
use crate::ui;

const MEMINFO_PATH: &str = "/proc/meminfo";

/// Fallback when /proc/meminfo is unreadable, in KB (~8GB).
const DEFAULT_MEM_KB: u64 = 8_000_000;

/// Suggested `--parallel` limit for builds. `None` means let the build tool
/// use every core.
pub fn build_jobs(log: &mut LogFile) -> Option<u32> {
    let mem_kb = fs::read_to_string(MEMINFO_PATH)
        .ok()
        .and_then(|content| parse_mem_total_kb(&content))
        .unwrap_or(DEFAULT_MEM_KB);

    let jobs = jobs_for_mem_kb(mem_kb);
    match jobs {
        Some(1) => {
            ui::warn("Less than 2GB of RAM detected, building single-threaded");
            log.line(&format!("MemTotal {mem_kb} KB, limiting build to 1 job"));
        }
        Some(n) => {
            log.line(&format!("MemTotal {mem_kb} KB, limiting build to {n} jobs"));
        }
        None => {}
    }
    jobs
}

/// `MemTotal:` value from /proc/meminfo content, in KB.
fn parse_mem_total_kb(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find(|l| l.starts_with("MemTotal:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}

fn jobs_for_mem_kb(mem_kb: u64) -> Option<u32> {
    if mem_kb < 2_000_000 {
        Some(1)
    } else if mem_kb < 4_000_000 {
        Some(2)
    } else {
        None
    }
}

/// After a failed build, scan the kernel log for OOM-killer evidence and
/// print a hint when found.
pub fn check_oom(log: &mut LogFile) {
    let Ok(out) = runner::capture(log, "dmesg", &[]) else {
        return;
    };
    if oom_evidence(&out.stdout) {
        ui::warn("The kernel OOM-killer fired during the build");
        ui::dim("Try increasing VM RAM to at least 4GB, or set build.jobs = 1 in the config");
        log.line("OOM-killer evidence found in dmesg");
    }
}

fn oom_evidence(dmesg: &str) -> bool {
    dmesg.contains("Out of memory")
        || dmesg.contains("out of memory")
        || dmesg.contains("OOM-killer")
        || dmesg.contains("oom-kill")
        || dmesg.contains("Killed process")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_MEMINFO: &str = "MemTotal:       16384000 kB\n\
                                  MemFree:         8192000 kB\n\
                                  MemAvailable:   12288000 kB\n";

    #[test]
    fn test_parse_mem_total() {
        assert_eq!(parse_mem_total_kb(SAMPLE_MEMINFO), Some(16_384_000));
    }

    #[test]
    fn test_parse_mem_total_missing() {
        assert_eq!(parse_mem_total_kb("MemFree: 100 kB\n"), None);
        assert_eq!(parse_mem_total_kb(""), None);
    }

    #[test]
    fn test_job_limits_by_memory() {
        assert_eq!(jobs_for_mem_kb(1_000_000), Some(1));
        assert_eq!(jobs_for_mem_kb(1_999_999), Some(1));
        assert_eq!(jobs_for_mem_kb(2_000_000), Some(2));
        assert_eq!(jobs_for_mem_kb(3_500_000), Some(2));
        assert_eq!(jobs_for_mem_kb(4_000_000), None);
        assert_eq!(jobs_for_mem_kb(16_384_000), None);
    }

    #[test]
    fn test_oom_evidence_markers() {
        assert!(oom_evidence("[123.456] Out of memory: Killed process 4321 (cc1plus)"));
        assert!(oom_evidence("invoked oom-killer: gfp_mask=0x100cca"));
        assert!(oom_evidence("Killed process 999 (ninja)"));
        assert!(!oom_evidence("[0.000] Linux version 6.8.0"));
        assert!(!oom_evidence(""));
    }
}
