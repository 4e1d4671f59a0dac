//! FKG structural validation.
//!
//! [`SchemaRegistry`] maps `(schema version, record kind)` to a compiled
//! Draft 7 JSON Schema validator. It is built once, either from the schemas
//! compiled into this crate ([`SchemaRegistry::builtin`]) or by scanning a
//! schema directory ([`SchemaRegistry::load_dir`]), and then shared behind
//! the [`fkg_types::RecordValidator`] seam.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod builtin;
mod error;
mod registry;

pub use error::{SchemaError, SchemaResult};
pub use registry::SchemaRegistry;
