//! FKG graph storage.
//!
//! This crate defines the storage contract the PKG pipeline is written
//! against:
//! - entity, edge and source records with idempotent, content-addressed upserts
//! - an append-only changelog with gap-free sequence numbers
//! - evidence links and provenance scoring
//! - all-or-nothing transactions ([`GraphStore::begin`])
//!
//! [`memory::InMemoryGraphStore`] is the reference backend. It can snapshot
//! itself to a JSON file after every commit.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod model;
pub mod provenance;
mod traits;
mod upsert;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryGraphStore;
pub use model::{
    Direction, EdgeFilter, EdgeUpsert, EntityFilter, EntityUpsert, EventFilter, SourceFilter,
    SourceUpsert,
};
pub use provenance::{
    calculate_confidence, entity_provenance, source_weight, EntityProvenance, ProvenanceScore,
    SourceEvidence,
};
pub use traits::{GraphReader, GraphStore, GraphTransaction, GraphWriter, QueryWindow};
