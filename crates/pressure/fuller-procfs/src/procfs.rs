use fuller_core::pressure::{MemoryPressure, PressureReading};
use fuller_core::util::DEFAULT_MEMORY_LIMIT;
use lazy_static::lazy_static;
use log::{debug, warn};
use std::fs::File;
use std::io::Read;

const STATM_PATH: &str = "/proc/self/statm";
const MEMINFO_PATH: &str = "/proc/meminfo";
const TOKEN: &str = "MemTotal:";

lazy_static! {
    static ref PAGE_SIZE: u64 = {
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 { size as u64 } else { 4096 }
    };
}

fn read_file(path: &str) -> Option<String> {
    let mut s = String::new();
    match File::open(path).and_then(|mut f| f.read_to_string(&mut s)) {
        Ok(_) => Some(s),
        Err(e) => {
            warn!("Failed to read {}: {}", path, e);
            None
        }
    }
}

/// Resident set size in pages (second field of `statm`).
fn parse_statm_resident(s: &str) -> Option<u64> {
    s.split_whitespace().nth(1)?.parse().ok()
}

/// `MemTotal` from `meminfo`, in bytes.
fn parse_meminfo_total(s: &str) -> Option<u64> {
    let line = s.lines().find(|line| line.starts_with(TOKEN))?;
    let mut parts = line.strip_prefix(TOKEN)?.split_whitespace();
    let value = parts.next()?.parse::<u64>().ok()?;
    let unit = match parts.next() {
        Some("kB") => 1024,
        _ => 1,
    };
    Some(value * unit)
}

fn address_space_limit() -> u64 {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    let ret = unsafe { libc::getrlimit(libc::RLIMIT_AS, &mut rlim) };
    if ret != 0 || rlim.rlim_cur == libc::RLIM_INFINITY {
        DEFAULT_MEMORY_LIMIT
    } else {
        rlim.rlim_cur as u64
    }
}

/// Memory pressure of the current process.
///
/// `used` is the resident set size, `total` the physical memory of the host and
/// `limit` the address space limit of the process (2 GB when unlimited).
/// Values that cannot be read are reported as zero.
#[derive(Debug, Default, Copy, Clone)]
pub struct ProcPressure {}

impl ProcPressure {
    /// Creates a new reader.
    pub fn new() -> Self {
        Self {}
    }
}

impl MemoryPressure for ProcPressure {
    fn read(&mut self) -> PressureReading {
        let used = read_file(STATM_PATH)
            .as_deref()
            .and_then(parse_statm_resident)
            .map_or(0, |pages| pages * *PAGE_SIZE);
        let total = read_file(MEMINFO_PATH)
            .as_deref()
            .and_then(parse_meminfo_total)
            .unwrap_or(0);
        let limit = address_space_limit();
        debug!("used: {}, total: {}, limit: {}", used, total, limit);
        PressureReading { used, total, limit }
    }

    #[cfg(target_env = "gnu")]
    fn collect(&mut self) -> bool {
        let released = unsafe { libc::malloc_trim(0) };
        debug!("malloc_trim released memory: {}", released != 0);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statm() {
        assert_eq!(parse_statm_resident("2612 1024 512 21 0 374 0\n"), Some(1024));
        assert_eq!(parse_statm_resident("2612"), None);
        assert_eq!(parse_statm_resident(""), None);
    }

    #[test]
    fn test_parse_meminfo() {
        let meminfo = "MemTotal:       16318412 kB\nMemFree:         1042684 kB\n";
        assert_eq!(parse_meminfo_total(meminfo), Some(16318412 * 1024));
        assert_eq!(parse_meminfo_total("MemFree: 12 kB\n"), None);
        assert_eq!(parse_meminfo_total("MemTotal: lots\n"), None);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_read_self() {
        let reading = ProcPressure::new().read();
        assert!(reading.used > 0);
        assert!(reading.total >= reading.used);
        assert!(reading.limit > 0);
    }
}
