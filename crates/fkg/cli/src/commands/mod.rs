//! CLI command implementations

pub mod federation;
pub mod graph;
pub mod ids;
pub mod ingest;
pub mod pkg;
