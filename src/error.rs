//! Error taxonomy for extraction
//!
//! Every failure is recorded into the run's [`ProgressMonitor`] and, on the
//! synchronous path, also returned to the caller. Both need the same value, so
//! the error is cheap to clone: OS and archive causes are held behind [`Arc`].
//!
//! Cancellation is not an error. It is reported as
//! [`Outcome::Cancelled`](crate::progress::Outcome::Cancelled).
//!
//! [`ProgressMonitor`]: crate::progress::ProgressMonitor

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A required argument is missing or unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The archive model has no usable entry directory.
    #[error("invalid archive state: {0}")]
    InvalidState(String),

    /// Directory creation or file write failed.
    #[error("I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// The archive backend failed while reading an entry.
    #[error("failed to read entry '{name}': {source}")]
    Archive {
        name: String,
        #[source]
        source: Arc<zip::result::ZipError>,
    },

    /// The background extraction thread could not be started.
    #[error("failed to start extraction thread: {0}")]
    Spawn(#[source] Arc<io::Error>),

    /// Entry name would resolve outside the output directory.
    #[error("unsafe entry path '{name}' escapes the output directory")]
    UnsafePath { name: String },
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source: Arc::new(source),
        }
    }

    pub fn archive(name: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            name: name.into(),
            source: Arc::new(source),
        }
    }

    /// True for directory creation and write failures, engine failures included.
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Archive { .. } | Self::Spawn(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
