use crate::model::{
    Direction, EdgeFilter, EdgeUpsert, EntityFilter, EntityUpsert, EventFilter, SourceFilter,
    SourceUpsert,
};
use crate::StorageResult;
use async_trait::async_trait;
use fkg_types::{Edge, Entity, Event, EventType, Evidence, Source};
use serde_json::Value;

/// Generic query window for paged reads. A zero `limit` means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

impl QueryWindow {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }
}

/// Read side of the graph.
#[async_trait]
pub trait GraphReader: Send + Sync {
    async fn get_entity(&self, id: &str) -> StorageResult<Option<Entity>>;

    /// List entities newest-first.
    async fn list_entities(
        &self,
        filter: &EntityFilter,
        window: QueryWindow,
    ) -> StorageResult<Vec<Entity>>;

    async fn count_entities(&self, filter: &EntityFilter) -> StorageResult<u64>;

    /// Entities of one authority ordered by id, for byte-stable export.
    async fn entities_for_export(&self, authority_id: &str) -> StorageResult<Vec<Entity>>;

    /// Entities one hop away along edges of an optional type.
    async fn neighbors(
        &self,
        entity_id: &str,
        edge_type: Option<&str>,
        direction: Direction,
        limit: usize,
    ) -> StorageResult<Vec<Entity>>;

    async fn get_edge(&self, id: &str) -> StorageResult<Option<Edge>>;

    /// List edges newest-first.
    async fn list_edges(&self, filter: &EdgeFilter, window: QueryWindow)
        -> StorageResult<Vec<Edge>>;

    async fn count_edges(&self, filter: &EdgeFilter) -> StorageResult<u64>;

    /// Edges of one authority ordered by id.
    async fn edges_for_export(&self, authority_id: &str) -> StorageResult<Vec<Edge>>;

    async fn edges_between(
        &self,
        src_id: &str,
        dst_id: &str,
        edge_type: Option<&str>,
    ) -> StorageResult<Vec<Edge>>;

    async fn get_source(&self, id: &str) -> StorageResult<Option<Source>>;

    /// List sources newest-first.
    async fn list_sources(
        &self,
        filter: &SourceFilter,
        window: QueryWindow,
    ) -> StorageResult<Vec<Source>>;

    async fn count_sources(&self, filter: &SourceFilter) -> StorageResult<u64>;

    /// Every source ordered by id. Sources are not authority-scoped.
    async fn sources_for_export(&self) -> StorageResult<Vec<Source>>;

    /// Events with `seq > since_seq`, ascending. A zero `limit` means unbounded.
    async fn events(
        &self,
        since_seq: u64,
        filter: &EventFilter,
        limit: usize,
    ) -> StorageResult<Vec<Event>>;

    /// Full changelog ascending by `seq`, optionally for one authority.
    async fn events_for_export(&self, authority_id: Option<&str>) -> StorageResult<Vec<Event>>;

    /// Highest assigned sequence number, `None` on an empty changelog.
    async fn latest_seq(&self) -> StorageResult<Option<u64>>;

    async fn evidence_for_entity(&self, entity_id: &str) -> StorageResult<Vec<Evidence>>;
}

/// Write side of the graph. Only available inside a transaction.
#[async_trait]
pub trait GraphWriter: Send {
    /// Insert or replace an entity; the id is derived from the canonical
    /// payload when absent.
    async fn upsert_entity(&mut self, request: EntityUpsert) -> StorageResult<Entity>;

    /// Insert or replace an edge; the id is derived from
    /// `(type, src_id, dst_id, properties)` when absent.
    async fn upsert_edge(&mut self, request: EdgeUpsert) -> StorageResult<Edge>;

    /// Insert or replace a source. Sources do not produce changelog events.
    async fn upsert_source(&mut self, request: SourceUpsert) -> StorageResult<Source>;

    /// Returns `false` when the entity did not exist.
    async fn delete_entity(&mut self, id: &str, log_event: bool) -> StorageResult<bool>;

    /// Returns `false` when the edge did not exist.
    async fn delete_edge(&mut self, id: &str, log_event: bool) -> StorageResult<bool>;

    /// Append a changelog row; storage assigns `seq` and `created_at`.
    async fn append_event(
        &mut self,
        event_type: EventType,
        authority_id: &str,
        payload: Value,
    ) -> StorageResult<Event>;

    async fn add_evidence(&mut self, evidence: Evidence) -> StorageResult<Evidence>;
}

/// A unit of work. Reads observe the transaction's own writes.
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait GraphTransaction: GraphReader + GraphWriter {
    async fn commit(self: Box<Self>) -> StorageResult<()>;
    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}

/// A graph backend.
#[async_trait]
pub trait GraphStore: GraphReader {
    async fn begin(&self) -> StorageResult<Box<dyn GraphTransaction>>;
}
