//! FKG shared domain types.
//!
//! This crate holds the vocabulary every other FKG crate speaks:
//! - semi-structured [`Record`]s and the graph model built on them
//!   ([`Entity`], [`Edge`], [`Source`], [`Evidence`], [`Event`])
//! - the PKG [`Manifest`] shape
//! - instance, storage and federation [`settings`]
//! - the [`RecordValidator`] seam used for structural schema checks
//!
//! Nothing here performs I/O.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod manifest;
mod model;
mod record;
pub mod settings;
mod validation;

pub use manifest::{Manifest, ManifestCounts, PkgFileKind, MANIFEST_FILE, PKG_FORMAT_VERSION};
pub use model::{Edge, Entity, Event, EventType, Evidence, Source};
pub use record::{record_str, Record};
pub use settings::{
    FederationSettings, InstanceSettings, LoggingSettings, RemoteConfig, RemoteTrust, Settings,
    StorageSettings,
};
pub use validation::{NoopValidator, RecordValidator, SchemaKind, ValidationError};

/// Default schema version used when a record does not carry one.
pub const DEFAULT_SCHEMA_VERSION: &str = "v0.1";
