//! FKG portable packages (PKG).
//!
//! A PKG is a directory (or a zip of one) holding:
//! - `manifest.json` with counts, the file list and SHA-256 checksums
//! - `entities.jsonl`, `edges.jsonl`, `sources.jsonl` and optionally
//!   `changelog.jsonl`, one canonical record per line
//! - a `signatures/` directory
//!
//! [`export_pkg`] writes one authority's slice of a graph, [`import_pkg`]
//! applies a PKG to a [`fkg_storage::GraphStore`] in a single transaction,
//! and [`validate_pkg`] checks one without writing anything.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod archive;
mod context;
mod error;
mod export;
mod import;
mod manifest;
pub mod sign;

pub use archive::{pack_pkg, unpack_pkg};
pub use context::PkgContext;
pub use error::{PkgError, PkgResult};
pub use export::{export_pkg, ExportStats};
pub use import::{import_pkg, validate_pkg, Authority, ImportOptions, ImportStats, PkgValidation};
pub use manifest::{compute_file_checksum, create_manifest, load_manifest, save_manifest, verify_checksums};
pub use sign::{sign_pkg, verify_pkg, SignatureInfo, SignatureVerifier, StubVerifier, VerificationReport};
