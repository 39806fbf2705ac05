//! Scripted kernel used by the unit tests

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::os::fd::{AsRawFd, BorrowedFd, OwnedFd};

use tempfile::TempDir;

use aya_obj::generated::{bpf_map_info, bpf_prog_info};

use crate::error::QueryError;
use crate::reader::InfoReader;
use crate::syscall::BpfQuery;

/// A [`BpfQuery`] that answers from canned records and counts calls
pub(crate) struct FakeKernel {
    map: Option<bpf_map_info>,
    program: Option<(bpf_prog_info, Vec<u32>)>,
    errno: i32,
    /// Fail program queries once this many have succeeded
    prog_budget: Option<usize>,
    pub map_calls: Cell<usize>,
    pub prog_calls: Cell<usize>,
    /// Buffer sizes passed to each program query
    pub prog_capacities: RefCell<Vec<usize>>,
    pub stats_requests: RefCell<Vec<u32>>,
}

impl FakeKernel {
    fn failing_with(errno: i32) -> Self {
        Self {
            map: None,
            program: None,
            errno,
            prog_budget: None,
            map_calls: Cell::new(0),
            prog_calls: Cell::new(0),
            prog_capacities: RefCell::new(Vec::new()),
            stats_requests: RefCell::new(Vec::new()),
        }
    }

    /// A kernel without `BPF_OBJ_GET_INFO_BY_FD`
    pub fn unsupported() -> Self {
        Self::failing_with(libc::EINVAL)
    }

    /// A kernel rejecting every command with `errno`
    pub fn failing(errno: i32) -> Self {
        Self::failing_with(errno)
    }

    pub fn with_map(raw: bpf_map_info) -> Self {
        Self {
            map: Some(raw),
            ..Self::failing_with(libc::EBADF)
        }
    }

    /// A program using the maps in `map_ids`
    pub fn with_program(raw: bpf_prog_info, map_ids: Vec<u32>) -> Self {
        Self {
            program: Some((raw, map_ids)),
            ..Self::failing_with(libc::EBADF)
        }
    }

    /// Let `n` program queries succeed, then fail with the configured errno
    pub fn fail_program_after(mut self, n: usize) -> Self {
        self.prog_budget = Some(n);
        self
    }

    /// Allow `enable_stats` to succeed
    pub fn with_stats(mut self) -> Self {
        self.errno = 0;
        self
    }
}

impl BpfQuery for FakeKernel {
    fn map_info(&self, _fd: BorrowedFd<'_>) -> Result<bpf_map_info, QueryError> {
        self.map_calls.set(self.map_calls.get() + 1);
        self.map
            .ok_or_else(|| QueryError::from_errno("BPF_OBJ_GET_INFO_BY_FD", self.errno))
    }

    fn prog_info(
        &self,
        _fd: BorrowedFd<'_>,
        map_ids: &mut [u32],
    ) -> Result<bpf_prog_info, QueryError> {
        let call = self.prog_calls.get();
        self.prog_calls.set(call + 1);
        self.prog_capacities.borrow_mut().push(map_ids.len());

        let exhausted = self.prog_budget.is_some_and(|budget| call >= budget);
        let Some((raw, ids)) = self.program.as_ref().filter(|_| !exhausted) else {
            return Err(QueryError::from_errno("BPF_OBJ_GET_INFO_BY_FD", self.errno));
        };

        let n = map_ids.len().min(ids.len());
        map_ids[..n].copy_from_slice(&ids[..n]);

        Ok(bpf_prog_info {
            nr_map_ids: ids.len() as u32,
            ..*raw
        })
    }

    fn enable_stats(&self, which: u32) -> Result<OwnedFd, QueryError> {
        self.stats_requests.borrow_mut().push(which);
        if self.errno != 0 {
            return Err(QueryError::from_errno("BPF_ENABLE_STATS", self.errno));
        }
        let file = File::open("/dev/null")
            .map_err(|e| QueryError::new("BPF_ENABLE_STATS", e))?;
        Ok(OwnedFd::from(file))
    }
}

/// A NUL padded kernel name field
pub(crate) fn c_name(name: &str) -> [libc::c_char; 16] {
    let mut out = [0; 16];
    for (dst, &b) in out.iter_mut().zip(name.as_bytes()) {
        *dst = b as libc::c_char;
    }
    out
}

/// A descriptor whose fdinfo file contains `text`
///
/// Returns the directory to hand to [`InfoReader::with_fdinfo_dir`] and the
/// descriptor itself, which must stay open for the duration of the test.
pub(crate) fn fdinfo_fixture(text: &str) -> (TempDir, File) {
    let dir = tempfile::tempdir().unwrap();
    let handle = tempfile::tempfile().unwrap();
    std::fs::write(dir.path().join(handle.as_raw_fd().to_string()), text).unwrap();
    (dir, handle)
}

/// A reader over `kernel` that falls back to the fixture directory
pub(crate) fn reader_for(kernel: FakeKernel, dir: &TempDir) -> InfoReader<FakeKernel> {
    InfoReader::with_query(kernel).with_fdinfo_dir(dir.path())
}
