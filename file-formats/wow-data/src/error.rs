use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The closed set of failures the codec can report.
///
/// Every variant carries enough context (byte offset, file path, table or
/// field name) for a caller to produce a precise diagnostic. Stream
/// truncation is always reported as [`WowDataError::ShortRead`]; only
/// transport failures that are not an early end-of-stream surface as
/// [`WowDataError::Io`].
#[derive(Error, Debug)]
pub enum WowDataError {
    #[error("short read{}", fmt_offset(*offset))]
    ShortRead { offset: Option<u64> },

    #[error("bad magic at offset {offset:#x}: expected '{expected}', found '{found}'")]
    BadMagic {
        expected: String,
        found: String,
        offset: u64,
    },

    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    #[error("missing sibling file: {}", path.display())]
    MissingSibling { path: PathBuf },

    #[error("malformed sibling file {}: {reason}", path.display())]
    MalformedSibling { path: PathBuf, reason: String },

    #[error("offset {offset:#x} (+{size} bytes) lies outside the file ({file_size} bytes)")]
    OffsetOutOfBounds {
        offset: u64,
        size: u64,
        file_size: u64,
    },

    #[error("{table}: index {index} is out of range (length {len})")]
    LookupOutOfRange {
        table: String,
        index: u32,
        len: usize,
    },

    #[error("schema '{schema}' declares field '{field}' more than once")]
    DuplicateField { schema: String, field: String },

    #[error("template '{template}' has no binding for slot {slot}")]
    TemplateUnbound { template: String, slot: String },

    #[error("string at offset {offset:#x} is not terminated")]
    StringNotTerminated { offset: u64 },

    #[error("I/O error: {0}")]
    Io(io::Error),
}

fn fmt_offset(offset: Option<u64>) -> String {
    offset.map_or_else(String::new, |o| format!(" at offset {o:#x}"))
}

impl WowDataError {
    /// Attach a byte offset to a [`WowDataError::ShortRead`] that does not
    /// carry one yet. Other variants pass through unchanged.
    #[must_use]
    pub fn at_offset(self, at: u64) -> Self {
        match self {
            Self::ShortRead { offset: None } => Self::ShortRead { offset: Some(at) },
            other => other,
        }
    }

    pub fn version_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        Self::VersionMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn bad_magic(expected: &[u8], found: &[u8], offset: u64) -> Self {
        Self::BadMagic {
            expected: String::from_utf8_lossy(expected).into_owned(),
            found: String::from_utf8_lossy(found).into_owned(),
            offset,
        }
    }

    pub fn lookup(table: impl Into<String>, index: u32, len: usize) -> Self {
        Self::LookupOutOfRange {
            table: table.into(),
            index,
            len,
        }
    }

    pub fn is_short_read(&self) -> bool {
        matches!(self, Self::ShortRead { .. })
    }
}

impl From<io::Error> for WowDataError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::ShortRead { offset: None }
        } else {
            Self::Io(err)
        }
    }
}

impl From<binrw::Error> for WowDataError {
    fn from(err: binrw::Error) -> Self {
        if err.is_eof() {
            return Self::ShortRead { offset: None };
        }
        match err {
            binrw::Error::BadMagic { pos, found } => Self::BadMagic {
                expected: String::from("declared magic"),
                found: format!("{found:?}"),
                offset: pos,
            },
            binrw::Error::Io(io) => io.into(),
            other => Self::Io(io::Error::new(io::ErrorKind::InvalidData, other.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, WowDataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_becomes_short_read() {
        let err: WowDataError = io::Error::from(io::ErrorKind::UnexpectedEof).into();
        assert!(err.is_short_read());
        assert!(matches!(
            err.at_offset(12),
            WowDataError::ShortRead { offset: Some(12) }
        ));
    }

    #[test]
    fn other_io_errors_stay_io() {
        let err: WowDataError = io::Error::from(io::ErrorKind::PermissionDenied).into();
        assert!(matches!(err, WowDataError::Io(_)));
    }

    #[test]
    fn offset_is_not_overwritten() {
        let err = WowDataError::ShortRead { offset: Some(4) }.at_offset(40);
        assert!(matches!(err, WowDataError::ShortRead { offset: Some(4) }));
    }

    #[test]
    fn display_carries_context() {
        let err = WowDataError::lookup("MOPR.group_index", 5, 4);
        assert_eq!(
            err.to_string(),
            "MOPR.group_index: index 5 is out of range (length 4)"
        );
    }
}
