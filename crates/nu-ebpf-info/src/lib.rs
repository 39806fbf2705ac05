#![doc = include_str!("../README.md")]
#![cfg(target_os = "linux")]

mod error;
mod fdinfo;
mod map_info;
mod prog_info;
mod reader;
mod stats;
mod syscall;
mod types;

#[cfg(test)]
mod testing;

use std::os::fd::AsFd;

pub use aya_obj;

pub use error::{InfoError, KernelVersion, ParseFieldError, QueryError, UnsupportedFeatureError};
pub use fdinfo::{ScanError, ScanField, scan_fields};
pub use map_info::MapInfo;
pub use prog_info::{ProgramInfo, ProgramStats};
pub use reader::{DEFAULT_FDINFO_DIR, DEFAULT_MAP_ID_CAPACITY, InfoReader};
pub use stats::{StatsGuard, StatsType};
pub use syscall::{BpfQuery, Syscall, empty_map_info, empty_prog_info};
pub use types::{BtfId, MapId, MapType, ProgramId, ProgramType};

/// Describe the map behind `fd` using the `bpf(2)` syscall and `/proc/self/fdinfo`
pub fn describe_map(fd: impl AsFd) -> Result<MapInfo, InfoError> {
    InfoReader::new().describe_map(fd)
}

/// Describe the program behind `fd` using the `bpf(2)` syscall and `/proc/self/fdinfo`
pub fn describe_program(fd: impl AsFd) -> Result<ProgramInfo, InfoError> {
    InfoReader::new().describe_program(fd)
}

/// Start measuring the run time and run count of eBPF programs
///
/// `which` selects the statistics, see [`StatsType`]. Collection stays
/// enabled until the returned guard is closed or dropped. Requires at
/// least 5.8.
pub fn enable_stats(which: u32) -> Result<StatsGuard, QueryError> {
    InfoReader::new().enable_stats(which)
}
