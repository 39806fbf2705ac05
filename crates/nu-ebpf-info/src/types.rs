//! Kernel type tags and object identifiers
//!
//! The numeric values mirror `enum bpf_map_type` and `enum bpf_prog_type`
//! from the kernel UAPI headers. Values added by kernels newer than this
//! crate are preserved as `Unknown`.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

/// Declares a kernel type enum with a lossless `u32` conversion
macro_rules! kernel_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal => $label:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize)]
        #[non_exhaustive]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )*
            /// A type value this crate does not know about
            ///
            /// [`From<u32>`] only produces this for values without a named
            /// variant. Comparison and hashing use the raw value, so
            /// `Unknown` holding a known value equals that variant.
            Unknown(u32),
        }

        impl $name {
            /// Kernel name of the type, lower-cased and without the UAPI prefix
            pub fn name(&self) -> &'static str {
                match $name::from(self.raw()) {
                    $($name::$variant => $label,)*
                    $name::Unknown(_) => "unknown",
                }
            }

            /// The raw value as used by the kernel
            pub fn raw(&self) -> u32 {
                u32::from(*self)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                match raw {
                    $($value => $name::$variant,)*
                    other => $name::Unknown(other),
                }
            }
        }

        impl From<$name> for u32 {
            fn from(ty: $name) -> u32 {
                match ty {
                    $($name::$variant => $value,)*
                    $name::Unknown(raw) => raw,
                }
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.raw() == other.raw()
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.raw().hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match $name::from(self.raw()) {
                    $name::Unknown(raw) => write!(f, "unknown ({raw})"),
                    other => f.write_str(other.name()),
                }
            }
        }
    };
}

kernel_enum! {
    /// Type of an eBPF map (`BPF_MAP_TYPE_*`)
    pub enum MapType {
        Unspecified = 0 => "unspec",
        Hash = 1 => "hash",
        Array = 2 => "array",
        ProgramArray = 3 => "prog_array",
        PerfEventArray = 4 => "perf_event_array",
        PerCpuHash = 5 => "percpu_hash",
        PerCpuArray = 6 => "percpu_array",
        StackTrace = 7 => "stack_trace",
        CgroupArray = 8 => "cgroup_array",
        LruHash = 9 => "lru_hash",
        LruPerCpuHash = 10 => "lru_percpu_hash",
        LpmTrie = 11 => "lpm_trie",
        ArrayOfMaps = 12 => "array_of_maps",
        HashOfMaps = 13 => "hash_of_maps",
        DevMap = 14 => "devmap",
        SockMap = 15 => "sockmap",
        CpuMap = 16 => "cpumap",
        XskMap = 17 => "xskmap",
        SockHash = 18 => "sockhash",
        CgroupStorage = 19 => "cgroup_storage",
        ReusePortSockArray = 20 => "reuseport_sockarray",
        PerCpuCgroupStorage = 21 => "percpu_cgroup_storage",
        Queue = 22 => "queue",
        Stack = 23 => "stack",
        SkStorage = 24 => "sk_storage",
        DevMapHash = 25 => "devmap_hash",
        StructOps = 26 => "struct_ops",
        /// Ring buffer (5.8+)
        RingBuf = 27 => "ringbuf",
        InodeStorage = 28 => "inode_storage",
        TaskStorage = 29 => "task_storage",
        BloomFilter = 30 => "bloom_filter",
    }
}

kernel_enum! {
    /// Type of an eBPF program (`BPF_PROG_TYPE_*`)
    pub enum ProgramType {
        Unspecified = 0 => "unspec",
        SocketFilter = 1 => "socket_filter",
        Kprobe = 2 => "kprobe",
        SchedCls = 3 => "sched_cls",
        SchedAct = 4 => "sched_act",
        TracePoint = 5 => "tracepoint",
        Xdp = 6 => "xdp",
        PerfEvent = 7 => "perf_event",
        CgroupSkb = 8 => "cgroup_skb",
        CgroupSock = 9 => "cgroup_sock",
        LwtIn = 10 => "lwt_in",
        LwtOut = 11 => "lwt_out",
        LwtXmit = 12 => "lwt_xmit",
        SockOps = 13 => "sock_ops",
        SkSkb = 14 => "sk_skb",
        CgroupDevice = 15 => "cgroup_device",
        SkMsg = 16 => "sk_msg",
        RawTracePoint = 17 => "raw_tracepoint",
        CgroupSockAddr = 18 => "cgroup_sock_addr",
        LwtSeg6Local = 19 => "lwt_seg6local",
        LircMode2 = 20 => "lirc_mode2",
        SkReusePort = 21 => "sk_reuseport",
        FlowDissector = 22 => "flow_dissector",
        CgroupSysctl = 23 => "cgroup_sysctl",
        RawTracePointWritable = 24 => "raw_tracepoint_writable",
        CgroupSockopt = 25 => "cgroup_sockopt",
        Tracing = 26 => "tracing",
        StructOps = 27 => "struct_ops",
        Extension = 28 => "ext",
        Lsm = 29 => "lsm",
        SkLookup = 30 => "sk_lookup",
        Syscall = 31 => "syscall",
    }
}

impl Default for MapType {
    fn default() -> Self {
        MapType::Unspecified
    }
}

impl Default for ProgramType {
    fn default() -> Self {
        ProgramType::Unspecified
    }
}

/// Declares a kernel object identifier newtype
macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                $name(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

object_id! {
    /// System-wide identifier of a loaded map (4.13+)
    MapId
}

object_id! {
    /// System-wide identifier of a loaded program (4.13+)
    ProgramId
}

object_id! {
    /// Identifier of a BTF object known to the kernel (5.0+)
    BtfId
}

/// Returns `Some(id)` when the kernel populated the identifier
///
/// Zero is never a valid object id, so it always means "not available".
pub(crate) fn populated<T: From<u32>>(raw: u32) -> Option<T> {
    (raw > 0).then(|| T::from(raw))
}
