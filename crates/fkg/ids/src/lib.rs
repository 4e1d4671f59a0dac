//! Deterministic identity for FKG records.
//!
//! Two layers:
//! - [`canonicalize`] / [`canonical_json`] turn a record into an order- and
//!   whitespace-insensitive form whose compact JSON text is the hash input.
//! - [`make_id`], [`make_edge_id`] and [`compute_content_hash`] derive
//!   identifiers and change-detection hashes from that text.
//!
//! Identifiers look like `{namespace}:{type}:{16 hex}`; edges use the fixed
//! type `edge`. Sixteen hex characters (64 bits) is enough for deduplication
//! inside one `(namespace, type)` scope; it is not a security property.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod address;
mod canonicalize;

pub use address::{compute_content_hash, make_edge_id, make_id, sha256_hex, SHORT_HASH_LEN};
pub use canonicalize::{
    canonical_json, canonicalize, normalize_name, normalize_string, NAME_FIELDS,
};
