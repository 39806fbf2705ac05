//! Parser for `/proc/<pid>/fdinfo/<fd>` files
//!
//! For map and program descriptors the kernel appends object details to
//! the generic fdinfo output, one `key:\tvalue` pair per line:
//!
//! ```text
//! pos:	0
//! flags:	02000002
//! mnt_id:	15
//! ino:	1057
//! map_type:	1
//! key_size:	4
//! value_size:	8
//! max_entries:	1024
//! map_flags:	0x0
//! ```
//!
//! Old kernels print fewer keys, so every scan states exactly which keys it
//! needs and fails with [`ScanError::MissingFields`] if any are absent.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str;

use log::trace;
use thiserror::Error;

use crate::error::{InfoError, ParseFieldError};
use crate::types::{MapType, ProgramType};

/// Errors produced while scanning fdinfo text
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("can't parse field {field}")]
    Parse {
        field: String,
        #[source]
        reason: ParseFieldError,
    },

    /// At least one requested key never appeared in the input
    #[error("missing fields: {}", missing.join(", "))]
    MissingFields { missing: Vec<String> },
}

impl ScanError {
    /// Attach the path of the scanned file
    pub(crate) fn at(self, path: &Path) -> InfoError {
        let path = path.to_path_buf();
        match self {
            ScanError::Io(source) => InfoError::Io { path, source },
            ScanError::Parse { field, reason } => InfoError::Parse {
                path,
                field,
                reason,
            },
            ScanError::MissingFields { missing } => InfoError::MissingFields { path, missing },
        }
    }
}

/// A destination for a single fdinfo value
pub trait ScanField {
    /// Parse `token` and store it
    fn scan_token(&mut self, token: &str) -> Result<(), ParseFieldError>;
}

impl ScanField for u32 {
    fn scan_token(&mut self, token: &str) -> Result<(), ParseFieldError> {
        let value = parse_unsigned(token)?;
        *self = u32::try_from(value).map_err(|_| ParseFieldError::OutOfRange {
            token: token.to_string(),
            ty: "u32",
        })?;
        Ok(())
    }
}

impl ScanField for u64 {
    fn scan_token(&mut self, token: &str) -> Result<(), ParseFieldError> {
        *self = parse_unsigned(token)?;
        Ok(())
    }
}

impl ScanField for String {
    fn scan_token(&mut self, token: &str) -> Result<(), ParseFieldError> {
        *self = token.to_string();
        Ok(())
    }
}

impl ScanField for MapType {
    fn scan_token(&mut self, token: &str) -> Result<(), ParseFieldError> {
        let mut raw = 0u32;
        raw.scan_token(token)?;
        *self = MapType::from(raw);
        Ok(())
    }
}

impl ScanField for ProgramType {
    fn scan_token(&mut self, token: &str) -> Result<(), ParseFieldError> {
        let mut raw = 0u32;
        raw.scan_token(token)?;
        *self = ProgramType::from(raw);
        Ok(())
    }
}

/// Parse a decimal, `0x`, `0o` or `0b` prefixed unsigned integer
///
/// The kernel prints most counters in decimal but `map_flags` as `%#x`.
fn parse_unsigned(token: &str) -> Result<u64, ParseFieldError> {
    let (digits, radix) = if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        (hex, 16)
    } else if let Some(oct) = token.strip_prefix("0o") {
        (oct, 8)
    } else if let Some(bin) = token.strip_prefix("0b") {
        (bin, 2)
    } else {
        (token, 10)
    };

    u64::from_str_radix(digits, radix).map_err(|source| ParseFieldError::Int {
        token: token.to_string(),
        source,
    })
}

/// First whitespace-separated token of a value
fn first_token(value: &[u8]) -> Option<&[u8]> {
    value
        .split(u8::is_ascii_whitespace)
        .find(|token| !token.is_empty())
}

/// Scan `key:\tvalue` lines into the requested fields
///
/// Only the first whitespace-separated token of each value is used. Keys
/// not listed in `fields` are ignored without being decoded, so they may
/// hold arbitrary bytes. Every listed key has to appear at least once,
/// otherwise the scan fails with [`ScanError::MissingFields`].
pub fn scan_fields<R: BufRead>(
    reader: R,
    fields: &mut [(&str, &mut dyn ScanField)],
) -> Result<(), ScanError> {
    let mut seen = vec![false; fields.len()];

    for line in reader.split(b'\n') {
        let line = line?;
        let Some(tab) = line.iter().position(|&b| b == b'\t') else {
            continue;
        };
        let (key, value) = (&line[..tab], &line[tab + 1..]);

        let name = key.strip_suffix(b":").unwrap_or(key);
        let Some(idx) = fields
            .iter()
            .position(|(field, _)| field.as_bytes() == name)
        else {
            trace!("fdinfo: skipping key {}", String::from_utf8_lossy(name));
            continue;
        };

        let field = &mut fields[idx];
        let parse_error = |reason: ParseFieldError| ScanError::Parse {
            field: field.0.to_string(),
            reason,
        };

        let token = first_token(value).ok_or_else(|| parse_error(ParseFieldError::Empty))?;
        let token = str::from_utf8(token).map_err(|e| parse_error(e.into()))?;
        field.1.scan_token(token).map_err(parse_error)?;
        seen[idx] = true;
    }

    let missing: Vec<String> = fields
        .iter()
        .zip(&seen)
        .filter(|(_, seen)| !**seen)
        .map(|((name, _), _)| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ScanError::MissingFields { missing });
    }

    Ok(())
}

/// Open `path` and scan it, attaching the path to any error
///
/// The file is closed when this returns, whatever the outcome.
pub(crate) fn scan_file(
    path: &Path,
    fields: &mut [(&str, &mut dyn ScanField)],
) -> Result<(), InfoError> {
    let file = File::open(path).map_err(|source| InfoError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    scan_fields(BufReader::new(file), fields).map_err(|e| e.at(path))
}
