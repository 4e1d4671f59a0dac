use fkg_pkg::PkgError;
use thiserror::Error;

pub type PullResult<T> = Result<T, PullError>;

/// Failures of a single remote pull.
#[derive(Debug, Error)]
pub enum PullError {
    #[error("unknown remote: {0}")]
    UnknownRemote(String),

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Signature verification failed: {0}")]
    Signature(String),

    #[error("downloaded pkg is not a valid archive: {0}")]
    Archive(#[source] PkgError),

    #[error("import failed: {0}")]
    Import(#[source] PkgError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
