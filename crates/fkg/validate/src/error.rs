use std::path::PathBuf;
use thiserror::Error;

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Failures while building a [`crate::SchemaRegistry`].
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema {name} is not valid JSON: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema {name} failed to compile: {message}")]
    Compile { name: String, message: String },
}
