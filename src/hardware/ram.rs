//! Memory adapter
//!
//! Reports total and available physical memory in MiB:
//! - Unix: `sysconf` page count × page size for the total
//! - Linux: `/proc/meminfo` for available memory
//! - Windows: `GlobalMemoryStatusEx`
//! - Anything else: sysinfo

use serde::Serialize;
use tracing::debug;

use super::{Field, MemorySource};
use crate::error::FieldUnavailable;

/// Bytes in one mebibyte
pub const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Total and available physical memory, both in MiB
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryReading {
    pub total_mib: Field<u64>,
    pub available_mib: Field<u64>,
}

/// Memory adapter for the build target
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMemory;

impl MemorySource for NativeMemory {
    fn memory(&self) -> MemoryReading {
        let reading = read_memory();
        debug!(total = ?reading.total_mib, available = ?reading.available_mib, "memory queried");
        reading
    }
}

/// Convert a byte count to whole MiB (rounded down)
pub fn bytes_to_mib(bytes: u64) -> u64 {
    bytes / BYTES_PER_MIB
}

#[cfg(unix)]
fn read_memory() -> MemoryReading {
    MemoryReading {
        total_mib: sysconf_total_mib(),
        available_mib: available_mib(),
    }
}

#[cfg(target_os = "windows")]
fn read_memory() -> MemoryReading {
    use windows_sys::Win32::System::SystemInformation::{GlobalMemoryStatusEx, MEMORYSTATUSEX};

    // SAFETY: MEMORYSTATUSEX is plain data; dwLength is set before the call
    // as the API requires.
    let mut status: MEMORYSTATUSEX = unsafe { std::mem::zeroed() };
    status.dwLength = std::mem::size_of::<MEMORYSTATUSEX>() as u32;

    if unsafe { GlobalMemoryStatusEx(&mut status) } == 0 {
        let reason = FieldUnavailable::query(
            "GlobalMemoryStatusEx",
            std::io::Error::last_os_error().to_string(),
        );
        return MemoryReading {
            total_mib: Field::Unavailable(reason.clone()),
            available_mib: Field::Unavailable(reason),
        };
    }

    MemoryReading {
        total_mib: Field::Available(bytes_to_mib(status.ullTotalPhys)),
        available_mib: Field::Available(bytes_to_mib(status.ullAvailPhys)),
    }
}

#[cfg(not(any(unix, target_os = "windows")))]
fn read_memory() -> MemoryReading {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();

    MemoryReading {
        total_mib: nonzero_mib("sysinfo", sys.total_memory()),
        available_mib: nonzero_mib("sysinfo", sys.available_memory()),
    }
}

/// Total physical memory from page count × page size
#[cfg(unix)]
fn sysconf_total_mib() -> Field<u64> {
    // SAFETY: sysconf only reads configuration values.
    let pages = unsafe { libc::sysconf(libc::_SC_PHYS_PAGES) };
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    if pages <= 0 || page_size <= 0 {
        return Field::Unavailable(FieldUnavailable::query(
            "sysconf",
            format!("pages={pages} page_size={page_size}"),
        ));
    }

    match (pages as u64).checked_mul(page_size as u64) {
        Some(bytes) => Field::Available(bytes_to_mib(bytes)),
        None => Field::Unavailable(FieldUnavailable::query(
            "sysconf",
            "physical memory size overflows u64",
        )),
    }
}

#[cfg(target_os = "linux")]
fn available_mib() -> Field<u64> {
    const MEMINFO_PATH: &str = "/proc/meminfo";

    match std::fs::read_to_string(MEMINFO_PATH) {
        Ok(content) => match parse_meminfo_available_kib(&content) {
            Some(kib) => Field::Available(kib / 1024),
            None => Field::Unavailable(FieldUnavailable::query(
                MEMINFO_PATH,
                "no MemAvailable or MemFree entry",
            )),
        },
        Err(err) => Field::Unavailable(FieldUnavailable::query(MEMINFO_PATH, err.to_string())),
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
fn available_mib() -> Field<u64> {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    nonzero_mib("sysinfo", sys.available_memory())
}

/// sysinfo reports 0 when it could not read a figure
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn nonzero_mib(source_name: &'static str, bytes: u64) -> Field<u64> {
    if bytes == 0 {
        Field::Unavailable(FieldUnavailable::Empty { source_name })
    } else {
        Field::Available(bytes_to_mib(bytes))
    }
}

/// Available memory in KiB from `/proc/meminfo` content.
///
/// Prefers the kernel's `MemAvailable` estimate. Older kernels lack it, in
/// which case `MemFree + Buffers + Cached` is used.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub fn parse_meminfo_available_kib(content: &str) -> Option<u64> {
    let mut free = None;
    let mut buffers = 0;
    let mut cached = 0;

    for line in content.lines() {
        // Format: "MemAvailable:   12345678 kB"
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(kib) = value.parse::<u64>() else {
            continue;
        };

        match key {
            "MemAvailable:" => return Some(kib),
            "MemFree:" => free = Some(kib),
            "Buffers:" => buffers = kib,
            "Cached:" => cached = kib,
            _ => {}
        }
    }

    free.map(|free| free + buffers + cached)
}
