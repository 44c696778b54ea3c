use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use wow_data::error::WowDataError;

/// Error types for M2 model parsing and writing
#[derive(Error, Debug)]
pub enum M2Error {
    #[error(transparent)]
    Data(#[from] WowDataError),

    /// A failure inside one file of a model container (root, skin or anim).
    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: WowDataError,
    },
}

impl M2Error {
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

    /// Re-express the failure as a malformed sibling file, keeping the
    /// original reason.
    pub fn into_malformed(self, path: &Path) -> Self {
        match self {
            Self::Data(source) | Self::InFile { source, .. } => {
                Self::Data(WowDataError::MalformedSibling {
                    path: path.to_path_buf(),
                    reason: source.to_string(),
                })
            }
        }
    }
}

impl From<io::Error> for M2Error {
    fn from(err: io::Error) -> Self {
        Self::Data(err.into())
    }
}

/// Result type using M2Error
pub type Result<T> = std::result::Result<T, M2Error>;
