//! Switching on kernel-side program statistics

use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

use log::debug;

use crate::error::QueryError;
use crate::reader::InfoReader;
use crate::syscall::BpfQuery;

/// Statistics the kernel can collect (`enum bpf_stats_type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StatsType {
    /// Run time and run count of every program
    RunTime = 0,
}

impl StatsType {
    /// The named selector for `raw`, if there is one
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(StatsType::RunTime),
            _ => None,
        }
    }
}

impl From<StatsType> for u32 {
    fn from(stats: StatsType) -> u32 {
        stats as u32
    }
}

impl From<StatsType> for aya::sys::Stats {
    fn from(stats: StatsType) -> Self {
        match stats {
            StatsType::RunTime => aya::sys::Stats::RunTime,
        }
    }
}

/// Keeps statistics collection enabled while held
///
/// Collection stops once every guard for the same statistics type in the
/// system has been closed or dropped.
#[derive(Debug)]
pub struct StatsGuard {
    fd: OwnedFd,
}

impl StatsGuard {
    /// Stop holding statistics collection open
    pub fn close(self) {
        drop(self.fd);
    }
}

impl AsFd for StatsGuard {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl<Q: BpfQuery> InfoReader<Q> {
    /// Start measuring the run time and run count of programs
    ///
    /// Collecting statistics can have an impact on performance. Requires
    /// at least 5.8.
    pub fn enable_stats(&self, which: u32) -> Result<StatsGuard, QueryError> {
        let fd = self.query().enable_stats(which)?;
        debug!("enabled bpf statistics type {which}");
        Ok(StatsGuard { fd })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeKernel;

    #[test]
    fn test_enable_stats_returns_guard() {
        let reader = InfoReader::with_query(FakeKernel::unsupported().with_stats());
        let guard = reader.enable_stats(StatsType::RunTime.into()).unwrap();
        assert!(guard.as_fd().try_clone_to_owned().is_ok());
        guard.close();
        assert_eq!(*reader.query().stats_requests.borrow(), vec![0]);
    }

    #[test]
    fn test_enable_stats_propagates_error() {
        let reader = InfoReader::with_query(FakeKernel::failing(libc::EPERM));
        let err = reader.enable_stats(StatsType::RunTime.into()).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EPERM));
        assert_eq!(err.command(), "BPF_ENABLE_STATS");
    }

    #[test]
    fn test_stats_type_selectors() {
        assert_eq!(StatsType::from_raw(0), Some(StatsType::RunTime));
        assert_eq!(StatsType::from_raw(1), None);
        assert_eq!(u32::from(StatsType::RunTime), 0);
    }

    #[test]
    fn test_enable_stats_unknown_kind() {
        let reader = InfoReader::with_query(FakeKernel::unsupported());
        let err = reader.enable_stats(7).unwrap_err();
        assert!(err.is_unsupported_interface());
        assert_eq!(*reader.query().stats_requests.borrow(), vec![7]);
    }
}
