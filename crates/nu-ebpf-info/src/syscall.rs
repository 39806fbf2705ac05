//! Structured queries through the `bpf(2)` syscall
//!
//! [`BpfQuery`] is the seam between the retrievers and the kernel. The
//! production implementation is [`Syscall`]; tests substitute a scripted
//! fake.

use std::io;
use std::mem;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};

use aya_obj::generated::{bpf_attr, bpf_cmd, bpf_map_info, bpf_prog_info};

use crate::error::QueryError;
use crate::stats::StatsType;

/// An all-zero `bpf_map_info`, ready to be filled by the kernel
pub fn empty_map_info() -> bpf_map_info {
    // SAFETY: bpf_map_info only holds integers and integer arrays.
    unsafe { mem::zeroed() }
}

/// An all-zero `bpf_prog_info`, ready to be filled by the kernel
pub fn empty_prog_info() -> bpf_prog_info {
    // SAFETY: bpf_prog_info only holds integers, integer arrays and a
    // bitfield unit backed by a byte array.
    unsafe { mem::zeroed() }
}

/// Decode a NUL padded kernel string
pub(crate) fn c_string(buf: &[libc::c_char]) -> String {
    let bytes: Vec<u8> = buf
        .iter()
        .map(|&c| c as u8)
        .take_while(|&b| b != 0)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Structured access to kernel object metadata
pub trait BpfQuery {
    /// `BPF_OBJ_GET_INFO_BY_FD` for a map descriptor
    fn map_info(&self, fd: BorrowedFd<'_>) -> Result<bpf_map_info, QueryError>;

    /// `BPF_OBJ_GET_INFO_BY_FD` for a program descriptor
    ///
    /// At most `map_ids.len()` ids are written to `map_ids`. The returned
    /// `nr_map_ids` is the number of maps the program actually uses, which
    /// may be larger than the buffer.
    fn prog_info(
        &self,
        fd: BorrowedFd<'_>,
        map_ids: &mut [u32],
    ) -> Result<bpf_prog_info, QueryError>;

    /// `BPF_ENABLE_STATS`, returning the descriptor that keeps stats enabled
    fn enable_stats(&self, which: u32) -> Result<OwnedFd, QueryError>;
}

/// Issues real `bpf(2)` syscalls
#[derive(Debug, Clone, Copy, Default)]
pub struct Syscall;

impl BpfQuery for Syscall {
    fn map_info(&self, fd: BorrowedFd<'_>) -> Result<bpf_map_info, QueryError> {
        let mut info = empty_map_info();
        obj_get_info(fd, &mut info)?;
        Ok(info)
    }

    fn prog_info(
        &self,
        fd: BorrowedFd<'_>,
        map_ids: &mut [u32],
    ) -> Result<bpf_prog_info, QueryError> {
        let mut info = empty_prog_info();
        info.nr_map_ids = u32::try_from(map_ids.len()).unwrap_or(u32::MAX);
        info.map_ids = map_ids.as_mut_ptr() as u64;
        obj_get_info(fd, &mut info)?;
        // The buffer address is meaningless to callers
        info.map_ids = 0;
        Ok(info)
    }

    fn enable_stats(&self, which: u32) -> Result<OwnedFd, QueryError> {
        if let Some(stats) = StatsType::from_raw(which) {
            return aya::sys::enable_stats(stats.into())
                .map_err(|e| QueryError::new("BPF_ENABLE_STATS", e.io_error));
        }

        // Selectors newer than aya's `Stats` go through the raw command
        let mut attr = empty_attr();
        attr.enable_stats.type_ = which;
        let fd = sys_bpf(bpf_cmd::BPF_ENABLE_STATS, &mut attr)
            .map_err(|e| QueryError::new("BPF_ENABLE_STATS", e))?;

        // SAFETY: on success BPF_ENABLE_STATS returns a new descriptor that
        // nothing else owns.
        Ok(unsafe { OwnedFd::from_raw_fd(fd as libc::c_int) })
    }
}

fn empty_attr() -> bpf_attr {
    // SAFETY: bpf_attr is a union of integer-only structs.
    unsafe { mem::zeroed() }
}

/// Only instantiated with `bpf_map_info` and `bpf_prog_info`
fn obj_get_info<T>(fd: BorrowedFd<'_>, info: &mut T) -> Result<(), QueryError> {
    let mut attr = empty_attr();
    attr.info.bpf_fd = fd.as_raw_fd() as u32;
    attr.info.info_len = mem::size_of::<T>() as u32;
    attr.info.info = info as *mut T as u64;

    sys_bpf(bpf_cmd::BPF_OBJ_GET_INFO_BY_FD, &mut attr)
        .map(drop)
        .map_err(|e| QueryError::new("BPF_OBJ_GET_INFO_BY_FD", e))
}

fn sys_bpf(cmd: bpf_cmd, attr: &mut bpf_attr) -> io::Result<libc::c_long> {
    // SAFETY: `attr` is a live `bpf_attr` and any buffers it points to
    // outlive the call.
    let ret = unsafe {
        libc::syscall(
            libc::SYS_bpf,
            cmd as libc::c_int,
            attr as *mut bpf_attr,
            mem::size_of::<bpf_attr>() as libc::c_uint,
        )
    };

    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}
