//! Error types for ADT reading and writing.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use wow_data::error::WowDataError;

/// Error returned by every fallible ADT operation.
#[derive(Error, Debug)]
pub enum AdtError {
    #[error(transparent)]
    Data(#[from] WowDataError),

    /// A failure while reading or writing a tile on disk.
    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: WowDataError,
    },
}

impl AdtError {
    /// The underlying failure kind, wherever it happened.
    pub fn kind(&self) -> &WowDataError {
        match self {
            Self::Data(e) | Self::InFile { source: e, .. } => e,
        }
    }

    /// Attach `path` unless a path is already known.
    pub fn in_file(self, path: &Path) -> Self {
        match self {
            Self::Data(source) => Self::InFile {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

impl From<io::Error> for AdtError {
    fn from(err: io::Error) -> Self {
        Self::Data(err.into())
    }
}

impl From<binrw::Error> for AdtError {
    fn from(err: binrw::Error) -> Self {
        Self::Data(err.into())
    }
}

/// Result type for ADT operations
pub type Result<T> = std::result::Result<T, AdtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_attached_once() {
        let err = AdtError::from(WowDataError::ShortRead { offset: Some(12) })
            .in_file(Path::new("a.adt"))
            .in_file(Path::new("b.adt"));
        assert!(matches!(&err, AdtError::InFile { path, .. } if path == Path::new("a.adt")));
        assert!(err.kind().is_short_read());
        assert_eq!(err.to_string(), "a.adt: short read at offset 0xc");
    }
}
