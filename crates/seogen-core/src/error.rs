use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stored record '{key}' is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("update '{0}' not found")]
    UpdateNotFound(String),
    /// Applying to prompts requires prior operator approval.
    #[error("update '{0}' has not been approved")]
    UpdateNotApproved(String),
    #[error("version '{0}' not found")]
    VersionNotFound(String),
    #[error("invalid version document: {0}")]
    InvalidVersion(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
