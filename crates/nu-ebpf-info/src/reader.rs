//! Reader configuration shared by the map and program retrievers

use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::path::PathBuf;

use crate::error::InfoError;
use crate::fdinfo::{ScanField, scan_file};
use crate::syscall::{BpfQuery, Syscall};

/// Where the kernel exposes per-descriptor details for this process
pub const DEFAULT_FDINFO_DIR: &str = "/proc/self/fdinfo";

/// Number of map ids requested by the first program info query
pub const DEFAULT_MAP_ID_CAPACITY: usize = 10;

/// Retrieves metadata for map and program descriptors
///
/// The reader holds no per-object state, so a single instance can be shared
/// between threads and reused for any number of lookups.
#[derive(Debug, Clone)]
pub struct InfoReader<Q = Syscall> {
    query: Q,
    fdinfo_dir: PathBuf,
    map_id_capacity: usize,
}

impl InfoReader<Syscall> {
    /// A reader backed by the `bpf(2)` syscall and `/proc/self/fdinfo`
    pub fn new() -> Self {
        Self::with_query(Syscall)
    }
}

impl Default for InfoReader<Syscall> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: BpfQuery> InfoReader<Q> {
    /// A reader using a custom structured query backend
    pub fn with_query(query: Q) -> Self {
        Self {
            query,
            fdinfo_dir: PathBuf::from(DEFAULT_FDINFO_DIR),
            map_id_capacity: DEFAULT_MAP_ID_CAPACITY,
        }
    }

    /// Read fallback data from `dir` instead of `/proc/self/fdinfo`
    pub fn with_fdinfo_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fdinfo_dir = dir.into();
        self
    }

    /// Size of the map id buffer used by the first program info query
    ///
    /// Programs using more maps than this cost one extra query.
    pub fn with_map_id_capacity(mut self, capacity: usize) -> Self {
        self.map_id_capacity = capacity;
        self
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub(crate) fn map_id_capacity(&self) -> usize {
        self.map_id_capacity
    }

    /// Path of the fdinfo file describing `fd`
    pub fn fdinfo_path(&self, fd: RawFd) -> PathBuf {
        self.fdinfo_dir.join(fd.to_string())
    }

    /// Scan the fdinfo file of `fd` into `fields`
    pub(crate) fn scan_fd_info(
        &self,
        fd: BorrowedFd<'_>,
        fields: &mut [(&str, &mut dyn ScanField)],
    ) -> Result<(), InfoError> {
        scan_file(&self.fdinfo_path(fd.as_raw_fd()), fields)
    }
}
