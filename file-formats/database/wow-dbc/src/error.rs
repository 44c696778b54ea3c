//! Error types for the DBC reader and writer.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use wow_data::error::WowDataError;

/// Errors that can occur when reading or writing a DBC file
#[derive(Debug, Error)]
pub enum DbcError {
    #[error(transparent)]
    Data(#[from] WowDataError),

    /// A failure tied to a table on disk.
    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: WowDataError,
    },
}

impl DbcError {
    /// The underlying failure kind.
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

impl From<io::Error> for DbcError {
    fn from(err: io::Error) -> Self {
        Self::Data(err.into())
    }
}

impl From<binrw::Error> for DbcError {
    fn from(err: binrw::Error) -> Self {
        Self::Data(err.into())
    }
}

#[cfg(feature = "csv_export")]
impl From<csv::Error> for DbcError {
    fn from(err: csv::Error) -> Self {
        Self::Data(io::Error::from(err).into())
    }
}

/// Result type for DBC operations
pub type Result<T> = std::result::Result<T, DbcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binrw_eof_is_a_short_read() {
        let err: DbcError = binrw::Error::Io(io::Error::from(io::ErrorKind::UnexpectedEof)).into();
        assert!(err.kind().is_short_read());
    }

    #[test]
    fn in_file_keeps_the_first_path() {
        let err = DbcError::from(WowDataError::StringNotTerminated { offset: 3 })
            .in_file(Path::new("Spell.dbc"))
            .in_file(Path::new("Other.dbc"));
        assert!(matches!(&err, DbcError::InFile { path, .. } if path == Path::new("Spell.dbc")));
    }
}
