use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CredentialError>;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Invalid credentials input: {0}")]
    InvalidInput(&'static str),

    #[error("Credential store I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential store {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to lock credential store {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CredentialError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
