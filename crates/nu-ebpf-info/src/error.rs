//! Error types for metadata retrieval

use std::fmt;
use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::Utf8Error;

use thiserror::Error;

/// Errors that can occur while describing a map or program
#[derive(Debug, Error)]
pub enum InfoError {
    /// The structured query failed for a reason other than missing kernel support
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Neither the structured query nor the fdinfo fallback is available
    #[error(transparent)]
    Unsupported(#[from] UnsupportedFeatureError),

    #[error("{}: missing fields: {}", path.display(), missing.join(", "))]
    MissingFields { path: PathBuf, missing: Vec<String> },

    #[error("{}: can't parse field {field}", path.display())]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        reason: ParseFieldError,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InfoError {
    /// Returns true if the running kernel is too old for the requested data
    pub fn is_unsupported(&self) -> bool {
        matches!(self, InfoError::Unsupported(_))
    }
}

/// Why a single fdinfo value could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFieldError {
    #[error("empty value")]
    Empty,

    #[error("value is not valid UTF-8")]
    Utf8(#[from] Utf8Error),

    #[error("invalid number {token:?}")]
    Int {
        token: String,
        #[source]
        source: ParseIntError,
    },

    #[error("{token} is out of range for {ty}")]
    OutOfRange { token: String, ty: &'static str },
}

/// A failed `bpf(2)` command
#[derive(Debug, Error)]
#[error("{command}: {source}")]
pub struct QueryError {
    command: &'static str,
    #[source]
    source: io::Error,
}

impl QueryError {
    pub fn new(command: &'static str, source: io::Error) -> Self {
        Self { command, source }
    }

    /// Build an error from a raw errno value
    pub fn from_errno(command: &'static str, errno: i32) -> Self {
        Self::new(command, io::Error::from_raw_os_error(errno))
    }

    /// Name of the bpf command that failed
    pub fn command(&self) -> &'static str {
        self.command
    }

    pub fn raw_os_error(&self) -> Option<i32> {
        self.source.raw_os_error()
    }

    /// Returns true if the kernel rejected the command as unknown or malformed
    ///
    /// Kernels that predate a command answer it with `EINVAL`, which is the
    /// signal to fall back to `/proc/self/fdinfo`.
    pub fn is_unsupported_interface(&self) -> bool {
        self.raw_os_error() == Some(libc::EINVAL)
    }
}

/// A kernel version triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct KernelVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl KernelVersion {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A feature that the running kernel does not provide
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name} not supported (requires >= {minimum_version})")]
pub struct UnsupportedFeatureError {
    /// Human readable name of the feature
    pub name: String,
    /// Oldest kernel that supports the feature
    pub minimum_version: KernelVersion,
}
