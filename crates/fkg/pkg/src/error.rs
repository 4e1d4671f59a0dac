use fkg_storage::StorageError;
use fkg_types::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

pub type PkgResult<T> = Result<T, PkgError>;

/// Failures of PKG operations.
#[derive(Debug, Error)]
pub enum PkgError {
    #[error("Manifest not found: {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("{}", .0.detailed())]
    Manifest(ValidationError),

    #[error("manifest is not readable: {0}")]
    ManifestParse(#[source] serde_json::Error),

    #[error("Checksum verification failed: {}", .0.join(", "))]
    ChecksumMismatch(Vec<String>),

    #[error("{file}:{line}: {}", .source.detailed())]
    Validation {
        file: String,
        line: usize,
        source: ValidationError,
    },

    #[error("{file}:{line}: {source}")]
    Record {
        file: String,
        line: usize,
        source: StorageError,
    },

    #[error("{file}:{line}: invalid JSON: {source}")]
    Json {
        file: String,
        line: usize,
        source: serde_json::Error,
    },

    #[error("{file}:{line}: id {id} is outside the {authority} namespace")]
    ForeignNamespace {
        file: String,
        line: usize,
        id: String,
        authority: String,
    },

    #[error("unsafe file name in manifest: {0}")]
    UnsafePath(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for PkgError {
    fn from(err: zip::result::ZipError) -> Self {
        PkgError::Archive(err.to_string())
    }
}
