//! Program metadata

use std::os::fd::{AsFd, BorrowedFd};
use std::time::Duration;

use log::debug;
use serde::Serialize;

use aya_obj::generated::bpf_prog_info;

use crate::error::{InfoError, KernelVersion, UnsupportedFeatureError};
use crate::fdinfo::ScanField;
use crate::reader::InfoReader;
use crate::syscall::{BpfQuery, c_string};
use crate::types::{BtfId, MapId, ProgramId, ProgramType, populated};

/// Runtime statistics of a program
///
/// The kernel only updates the counters while statistics collection is
/// enabled, see [`enable_stats`](crate::enable_stats).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgramStats {
    /// Total accumulated runtime
    pub runtime: Duration,
    /// Total number of times the program was called
    pub run_count: u64,
}

/// Snapshot of a program's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramInfo {
    program_type: ProgramType,
    id: Option<ProgramId>,
    tag: String,
    name: String,
    btf_id: Option<BtfId>,
    map_ids: Option<Vec<MapId>>,
    stats: Option<ProgramStats>,
}

impl ProgramInfo {
    fn from_raw(raw: &bpf_prog_info, map_ids: Vec<u32>) -> Self {
        Self {
            program_type: ProgramType::from(raw.type_),
            id: populated(raw.id),
            tag: hex_tag(&raw.tag),
            // name is available from 4.15
            name: c_string(&raw.name),
            btf_id: populated(raw.btf_id),
            map_ids: Some(map_ids.into_iter().map(MapId).collect()),
            stats: Some(ProgramStats {
                runtime: Duration::from_nanos(raw.run_time_ns),
                run_count: raw.run_cnt,
            }),
        }
    }

    pub fn program_type(&self) -> ProgramType {
        self.program_type
    }

    /// The program ID
    ///
    /// Available from 4.13, and only when the structured query succeeded.
    pub fn id(&self) -> Option<ProgramId> {
        self.id
    }

    /// Truncated hash of the program's bytecode, as 16 hex characters
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Name as supplied by user space at load time
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The BTF object associated with the program
    ///
    /// Available from 5.0. `None` also covers programs loaded without BTF
    /// on kernels that support the field.
    pub fn btf_id(&self) -> Option<BtfId> {
        self.btf_id
    }

    /// IDs of the maps used by the program
    ///
    /// `Some(&[])` means the program uses no maps; `None` means the list
    /// could not be retrieved.
    pub fn map_ids(&self) -> Option<&[MapId]> {
        self.map_ids.as_deref()
    }

    pub fn stats(&self) -> Option<&ProgramStats> {
        self.stats.as_ref()
    }

    /// Total number of times the program was called
    ///
    /// `Some(0)` if statistics collection is disabled.
    pub fn run_count(&self) -> Option<u64> {
        self.stats.map(|stats| stats.run_count)
    }

    /// Total accumulated runtime of the program
    ///
    /// `Some(Duration::ZERO)` if statistics collection is disabled.
    pub fn runtime(&self) -> Option<Duration> {
        self.stats.map(|stats| stats.runtime)
    }
}

fn hex_tag(tag: &[u8]) -> String {
    tag.iter().map(|b| format!("{b:02x}")).collect()
}

impl<Q: BpfQuery> InfoReader<Q> {
    /// Describe the program behind `fd`
    ///
    /// Falls back to fdinfo when the kernel does not support the structured
    /// query. Only the type and tag are available in that case.
    pub fn describe_program(&self, fd: impl AsFd) -> Result<ProgramInfo, InfoError> {
        let fd = fd.as_fd();
        let mut map_ids = vec![0u32; self.map_id_capacity()];

        let mut raw = match self.query().prog_info(fd, &mut map_ids) {
            Ok(raw) => raw,
            Err(e) if e.is_unsupported_interface() => {
                debug!("{e}; reading program info from fdinfo");
                return self.program_info_from_fdinfo(fd);
            }
            Err(e) => return Err(e.into()),
        };

        let count = raw.nr_map_ids as usize;
        if count > map_ids.len() {
            debug!(
                "program uses {count} maps, retrying with a buffer of {count} instead of {}",
                map_ids.len()
            );
            map_ids = vec![0; count];
            raw = self.query().prog_info(fd, &mut map_ids)?;
        }
        map_ids.truncate(raw.nr_map_ids as usize);

        Ok(ProgramInfo::from_raw(&raw, map_ids))
    }

    fn program_info_from_fdinfo(&self, fd: BorrowedFd<'_>) -> Result<ProgramInfo, InfoError> {
        let mut program_type = ProgramType::default();
        let mut tag = String::new();

        let mut fields: [(&str, &mut dyn ScanField); 2] =
            [("prog_type", &mut program_type), ("prog_tag", &mut tag)];

        match self.scan_fd_info(fd, &mut fields) {
            Ok(()) => {}
            Err(InfoError::MissingFields { .. }) => {
                return Err(UnsupportedFeatureError {
                    name: "reading program info from /proc/self/fdinfo".into(),
                    minimum_version: KernelVersion::new(4, 10, 0),
                }
                .into());
            }
            Err(e) => return Err(e),
        }

        Ok(ProgramInfo {
            program_type,
            id: None,
            tag,
            name: String::new(),
            btf_id: None,
            map_ids: None,
            stats: None,
        })
    }
}
