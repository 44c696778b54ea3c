use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use wow_data::error::WowDataError;

/// Error types for WMO reading and writing
#[derive(Error, Debug)]
pub enum WmoError {
    #[error(transparent)]
    Data(#[from] WowDataError),

    /// A failure inside one file of a container, with the file it came from.
    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: WowDataError,
    },
}

impl WmoError {
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

impl From<io::Error> for WmoError {
    fn from(err: io::Error) -> Self {
        Self::Data(err.into())
    }
}

impl From<binrw::Error> for WmoError {
    fn from(err: binrw::Error) -> Self {
        Self::Data(err.into())
    }
}

/// Result type for WMO operations
pub type Result<T> = std::result::Result<T, WmoError>;
