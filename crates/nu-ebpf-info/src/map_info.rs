//! Map metadata

use std::os::fd::{AsFd, BorrowedFd};

use log::debug;
use serde::Serialize;

use aya_obj::generated::bpf_map_info;

use crate::error::InfoError;
use crate::fdinfo::ScanField;
use crate::reader::InfoReader;
use crate::syscall::{BpfQuery, c_string};
use crate::types::{MapId, MapType, populated};

/// Snapshot of a map's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapInfo {
    map_type: MapType,
    id: Option<MapId>,
    key_size: u32,
    value_size: u32,
    max_entries: u32,
    flags: u32,
    name: String,
}

impl MapInfo {
    fn from_raw(raw: &bpf_map_info) -> Self {
        Self {
            map_type: MapType::from(raw.type_),
            id: populated(raw.id),
            key_size: raw.key_size,
            value_size: raw.value_size,
            max_entries: raw.max_entries,
            flags: raw.map_flags,
            name: c_string(&raw.name),
        }
    }

    pub fn map_type(&self) -> MapType {
        self.map_type
    }

    /// The map ID
    ///
    /// Available from 4.13, and only when the structured query succeeded.
    pub fn id(&self) -> Option<MapId> {
        self.id
    }

    /// Size of a key in bytes
    pub fn key_size(&self) -> u32 {
        self.key_size
    }

    /// Size of a value in bytes
    pub fn value_size(&self) -> u32 {
        self.value_size
    }

    pub fn max_entries(&self) -> u32 {
        self.max_entries
    }

    /// `BPF_F_*` flags the map was created with
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Name as supplied by user space at load time
    ///
    /// Empty on kernels older than 4.15 or when read from fdinfo.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<Q: BpfQuery> InfoReader<Q> {
    /// Describe the map behind `fd`
    ///
    /// Falls back to fdinfo when the kernel does not support the structured
    /// query, in which case the ID and name are not available.
    pub fn describe_map(&self, fd: impl AsFd) -> Result<MapInfo, InfoError> {
        let fd = fd.as_fd();
        match self.query().map_info(fd) {
            Ok(raw) => Ok(MapInfo::from_raw(&raw)),
            Err(e) if e.is_unsupported_interface() => {
                debug!("{e}; reading map info from fdinfo");
                self.map_info_from_fdinfo(fd)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn map_info_from_fdinfo(&self, fd: BorrowedFd<'_>) -> Result<MapInfo, InfoError> {
        let mut map_type = MapType::default();
        let (mut key_size, mut value_size, mut max_entries, mut flags) = (0u32, 0u32, 0u32, 0u32);

        let mut fields: [(&str, &mut dyn ScanField); 5] = [
            ("map_type", &mut map_type),
            ("key_size", &mut key_size),
            ("value_size", &mut value_size),
            ("max_entries", &mut max_entries),
            ("map_flags", &mut flags),
        ];
        self.scan_fd_info(fd, &mut fields)?;

        Ok(MapInfo {
            map_type,
            id: None,
            key_size,
            value_size,
            max_entries,
            flags,
            name: String::new(),
        })
    }
}
