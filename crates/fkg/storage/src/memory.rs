//! In-memory reference implementation of the graph storage traits.
//!
//! A transaction works on a private copy of the graph and swaps it in on
//! commit, so a failed import leaves nothing behind. Commits are optimistic:
//! if another transaction committed after this one began, the commit fails
//! with [`StorageError::Conflict`].
//!
//! With a snapshot path the whole graph is rewritten to a JSON file after
//! every commit (temp file + rename) and read back on [`InMemoryGraphStore::open`].

use crate::model::{
    Direction, EdgeFilter, EdgeUpsert, EntityFilter, EntityUpsert, EventFilter, SourceFilter,
    SourceUpsert,
};
use crate::traits::{GraphReader, GraphStore, GraphTransaction, GraphWriter, QueryWindow};
use crate::upsert::{prepare_edge, prepare_entity, prepare_source, PreparedEdge, PreparedEntity};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use fkg_types::{Edge, Entity, Event, EventType, Evidence, Record, RecordValidator, Source};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tracing::{debug, info};

/// Committed graph content. This is also the snapshot file format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GraphState {
    #[serde(default)]
    entities: BTreeMap<String, Entity>,
    #[serde(default)]
    edges: BTreeMap<String, Edge>,
    #[serde(default)]
    sources: BTreeMap<String, Source>,
    #[serde(default)]
    evidence: Vec<Evidence>,
    #[serde(default)]
    events: Vec<Event>,
}

struct Versioned {
    version: u64,
    graph: GraphState,
}

struct Shared {
    state: RwLock<Versioned>,
    snapshot: Option<PathBuf>,
}

impl Shared {
    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Versioned>> {
        self.state
            .read()
            .map_err(|_| StorageError::Backend("graph lock poisoned".to_string()))
    }
}

/// In-memory graph store.
#[derive(Clone)]
pub struct InMemoryGraphStore {
    shared: Arc<Shared>,
    validator: Arc<dyn RecordValidator>,
}

impl fmt::Debug for InMemoryGraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryGraphStore")
            .field("snapshot", &self.shared.snapshot)
            .finish_non_exhaustive()
    }
}

impl InMemoryGraphStore {
    /// Volatile store. `validator` is consulted by upserts that request
    /// validation.
    pub fn new(validator: Arc<dyn RecordValidator>) -> Self {
        Self::with_state(GraphState::default(), None, validator)
    }

    /// Store persisted to `path`, loading the existing snapshot if present.
    pub fn open(path: impl AsRef<Path>, validator: Arc<dyn RecordValidator>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let graph = if path.exists() {
            let bytes = std::fs::read(&path)?;
            serde_json::from_slice(&bytes).map_err(|e| {
                StorageError::Serialization(format!("snapshot {}: {e}", path.display()))
            })?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            GraphState::default()
        };
        info!(
            path = %path.display(),
            entities = graph.entities.len(),
            edges = graph.edges.len(),
            events = graph.events.len(),
            "opened graph snapshot"
        );
        Ok(Self::with_state(graph, Some(path), validator))
    }

    fn with_state(
        graph: GraphState,
        snapshot: Option<PathBuf>,
        validator: Arc<dyn RecordValidator>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(Versioned { version: 0, graph }),
                snapshot,
            }),
            validator,
        }
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.shared.snapshot.as_deref()
    }
}

/// Staged unit of work against an [`InMemoryGraphStore`].
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    validator: Arc<dyn RecordValidator>,
    base_version: u64,
    staged: GraphState,
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn begin(&self) -> StorageResult<Box<dyn GraphTransaction>> {
        let guard = self.shared.read()?;
        Ok(Box::new(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            validator: Arc::clone(&self.validator),
            base_version: guard.version,
            staged: guard.graph.clone(),
        }))
    }
}

#[async_trait]
impl GraphTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let MemoryTransaction {
            shared,
            base_version,
            staged,
            ..
        } = *self;

        let mut guard = shared
            .state
            .write()
            .map_err(|_| StorageError::Backend("graph lock poisoned".to_string()))?;
        if guard.version != base_version {
            return Err(StorageError::Conflict(
                "graph changed since the transaction began".to_string(),
            ));
        }
        if let Some(path) = &shared.snapshot {
            write_snapshot(path, &staged)?;
        }
        guard.graph = staged;
        guard.version += 1;
        debug!(version = guard.version, "committed graph transaction");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        debug!(base_version = self.base_version, "rolled back graph transaction");
        Ok(())
    }
}

fn write_snapshot(path: &Path, graph: &GraphState) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer(&mut tmp, graph)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl GraphWriter for MemoryTransaction {
    async fn upsert_entity(&mut self, request: EntityUpsert) -> StorageResult<Entity> {
        let log_event = request.log_event;
        let prepared = prepare_entity(request, self.validator.as_ref())?;
        self.staged.apply_entity(prepared, log_event)
    }

    async fn upsert_edge(&mut self, request: EdgeUpsert) -> StorageResult<Edge> {
        let log_event = request.log_event;
        let prepared = prepare_edge(request, self.validator.as_ref())?;
        self.staged.apply_edge(prepared, log_event)
    }

    async fn upsert_source(&mut self, request: SourceUpsert) -> StorageResult<Source> {
        let (id, payload) = prepare_source(request, self.validator.as_ref())?;
        Ok(self.staged.apply_source(id, payload))
    }

    async fn delete_entity(&mut self, id: &str, log_event: bool) -> StorageResult<bool> {
        let Some(entity) = self.staged.entities.remove(id) else {
            return Ok(false);
        };
        if log_event {
            self.staged.push_event(
                EventType::DeleteEntity,
                &entity.authority_id,
                json!({"entity_id": entity.id, "type": entity.entity_type}),
            );
        }
        Ok(true)
    }

    async fn delete_edge(&mut self, id: &str, log_event: bool) -> StorageResult<bool> {
        let Some(edge) = self.staged.edges.remove(id) else {
            return Ok(false);
        };
        if log_event {
            self.staged.push_event(
                EventType::DeleteEdge,
                &edge.authority_id,
                json!({"edge_id": edge.id, "type": edge.edge_type}),
            );
        }
        Ok(true)
    }

    async fn append_event(
        &mut self,
        event_type: EventType,
        authority_id: &str,
        payload: Value,
    ) -> StorageResult<Event> {
        Ok(self.staged.push_event(event_type, authority_id, payload))
    }

    async fn add_evidence(&mut self, evidence: Evidence) -> StorageResult<Evidence> {
        if !self.staged.entities.contains_key(&evidence.entity_id) {
            return Err(StorageError::NotFound(format!(
                "entity {} not found",
                evidence.entity_id
            )));
        }
        if !self.staged.sources.contains_key(&evidence.source_id) {
            return Err(StorageError::NotFound(format!(
                "source {} not found",
                evidence.source_id
            )));
        }
        self.staged.evidence.push(evidence.clone());
        Ok(evidence)
    }
}

impl GraphState {
    fn push_event(&mut self, event_type: EventType, authority_id: &str, payload: Value) -> Event {
        let event = Event {
            seq: self.latest_seq().map_or(1, |seq| seq + 1),
            event_type,
            authority_id: authority_id.to_string(),
            payload,
            created_at: Utc::now(),
        };
        self.events.push(event.clone());
        event
    }

    fn apply_entity(&mut self, prepared: PreparedEntity, log_event: bool) -> StorageResult<Entity> {
        let now = Utc::now();
        let (entity, event_type) = match self.entities.get_mut(&prepared.id) {
            Some(existing) => {
                if existing.authority_id != prepared.authority_id {
                    return Err(StorageError::Conflict(format!(
                        "entity {} is owned by {}, not {}",
                        existing.id, existing.authority_id, prepared.authority_id
                    )));
                }
                existing.data = prepared.data;
                existing.schema_version = prepared.schema_version;
                existing.updated_at = now;
                (existing.clone(), EventType::UpdateEntity)
            }
            None => {
                let entity = Entity {
                    id: prepared.id,
                    entity_type: prepared.entity_type,
                    schema_version: prepared.schema_version,
                    authority_id: prepared.authority_id,
                    data: prepared.data,
                    created_at: now,
                    updated_at: now,
                };
                self.entities.insert(entity.id.clone(), entity.clone());
                (entity, EventType::CreateEntity)
            }
        };

        if log_event {
            self.push_event(
                event_type,
                &entity.authority_id,
                json!({"entity_id": entity.id, "type": entity.entity_type}),
            );
        }
        Ok(entity)
    }

    fn apply_edge(&mut self, prepared: PreparedEdge, log_event: bool) -> StorageResult<Edge> {
        let now = Utc::now();
        let (edge, event_type) = match self.edges.get_mut(&prepared.id) {
            Some(existing) => {
                if existing.authority_id != prepared.authority_id {
                    return Err(StorageError::Conflict(format!(
                        "edge {} is owned by {}, not {}",
                        existing.id, existing.authority_id, prepared.authority_id
                    )));
                }
                existing.data = prepared.data;
                existing.schema_version = prepared.schema_version;
                existing.updated_at = now;
                (existing.clone(), EventType::UpdateEdge)
            }
            None => {
                let edge = Edge {
                    id: prepared.id,
                    edge_type: prepared.edge_type,
                    src_id: prepared.src_id,
                    dst_id: prepared.dst_id,
                    schema_version: prepared.schema_version,
                    authority_id: prepared.authority_id,
                    data: prepared.data,
                    created_at: now,
                    updated_at: now,
                };
                self.edges.insert(edge.id.clone(), edge.clone());
                (edge, EventType::CreateEdge)
            }
        };

        if log_event {
            self.push_event(
                event_type,
                &edge.authority_id,
                json!({
                    "edge_id": edge.id,
                    "type": edge.edge_type,
                    "src_id": edge.src_id,
                    "dst_id": edge.dst_id,
                }),
            );
        }
        Ok(edge)
    }

    fn apply_source(&mut self, id: String, data: Record) -> Source {
        match self.sources.get_mut(&id) {
            Some(existing) => {
                existing.data = data;
                existing.clone()
            }
            None => {
                let source = Source {
                    id: id.clone(),
                    data,
                    created_at: Utc::now(),
                };
                self.sources.insert(id, source.clone());
                source
            }
        }
    }

    fn list_entities(&self, filter: &EntityFilter, window: QueryWindow) -> Vec<Entity> {
        let mut values: Vec<_> = self
            .entities
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        values.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        apply_window(values, window)
    }

    fn entities_for_export(&self, authority_id: &str) -> Vec<Entity> {
        self.entities
            .values()
            .filter(|e| e.authority_id == authority_id)
            .cloned()
            .collect()
    }

    fn neighbors(
        &self,
        entity_id: &str,
        edge_type: Option<&str>,
        direction: Direction,
        limit: usize,
    ) -> Vec<Entity> {
        let ids: BTreeSet<&str> = self
            .edges
            .values()
            .filter(|e| edge_type.map_or(true, |t| e.edge_type == t))
            .filter_map(|e| match direction {
                Direction::Out if e.src_id == entity_id => Some(e.dst_id.as_str()),
                Direction::In if e.dst_id == entity_id => Some(e.src_id.as_str()),
                _ => None,
            })
            .take(if limit == 0 { usize::MAX } else { limit })
            .collect();
        ids.into_iter()
            .filter_map(|id| self.entities.get(id).cloned())
            .collect()
    }

    fn list_edges(&self, filter: &EdgeFilter, window: QueryWindow) -> Vec<Edge> {
        let mut values: Vec<_> = self
            .edges
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        values.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        apply_window(values, window)
    }

    fn edges_for_export(&self, authority_id: &str) -> Vec<Edge> {
        self.edges
            .values()
            .filter(|e| e.authority_id == authority_id)
            .cloned()
            .collect()
    }

    fn edges_between(&self, src_id: &str, dst_id: &str, edge_type: Option<&str>) -> Vec<Edge> {
        self.edges
            .values()
            .filter(|e| e.src_id == src_id && e.dst_id == dst_id)
            .filter(|e| edge_type.map_or(true, |t| e.edge_type == t))
            .cloned()
            .collect()
    }

    fn list_sources(&self, filter: &SourceFilter, window: QueryWindow) -> Vec<Source> {
        let mut values: Vec<_> = self
            .sources
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        values.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        apply_window(values, window)
    }

    fn events(&self, since_seq: u64, filter: &EventFilter, limit: usize) -> Vec<Event> {
        let iter = self
            .events
            .iter()
            .filter(|e| e.seq > since_seq && filter.matches(e))
            .cloned();
        if limit == 0 {
            iter.collect()
        } else {
            iter.take(limit).collect()
        }
    }

    fn events_for_export(&self, authority_id: Option<&str>) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| authority_id.map_or(true, |a| e.authority_id == a))
            .cloned()
            .collect()
    }

    fn latest_seq(&self) -> Option<u64> {
        self.events.last().map(|e| e.seq)
    }

    fn evidence_for_entity(&self, entity_id: &str) -> Vec<Evidence> {
        self.evidence
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect()
    }
}

fn apply_window<T>(items: Vec<T>, window: QueryWindow) -> Vec<T> {
    let iter = items.into_iter().skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}

fn count<T>(iter: impl Iterator<Item = T>) -> u64 {
    iter.count() as u64
}

/// Implements [`GraphReader`] by borrowing a [`GraphState`] through `$state`.
macro_rules! graph_reader {
    ($ty:ty, |$this:ident| $state:expr) => {
        #[async_trait]
        impl GraphReader for $ty {
            async fn get_entity(&self, id: &str) -> StorageResult<Option<Entity>> {
                let $this = self;
                Ok($state.entities.get(id).cloned())
            }

            async fn list_entities(
                &self,
                filter: &EntityFilter,
                window: QueryWindow,
            ) -> StorageResult<Vec<Entity>> {
                let $this = self;
                Ok($state.list_entities(filter, window))
            }

            async fn count_entities(&self, filter: &EntityFilter) -> StorageResult<u64> {
                let $this = self;
                Ok(count($state.entities.values().filter(|e| filter.matches(e))))
            }

            async fn entities_for_export(&self, authority_id: &str) -> StorageResult<Vec<Entity>> {
                let $this = self;
                Ok($state.entities_for_export(authority_id))
            }

            async fn neighbors(
                &self,
                entity_id: &str,
                edge_type: Option<&str>,
                direction: Direction,
                limit: usize,
            ) -> StorageResult<Vec<Entity>> {
                let $this = self;
                Ok($state.neighbors(entity_id, edge_type, direction, limit))
            }

            async fn get_edge(&self, id: &str) -> StorageResult<Option<Edge>> {
                let $this = self;
                Ok($state.edges.get(id).cloned())
            }

            async fn list_edges(
                &self,
                filter: &EdgeFilter,
                window: QueryWindow,
            ) -> StorageResult<Vec<Edge>> {
                let $this = self;
                Ok($state.list_edges(filter, window))
            }

            async fn count_edges(&self, filter: &EdgeFilter) -> StorageResult<u64> {
                let $this = self;
                Ok(count($state.edges.values().filter(|e| filter.matches(e))))
            }

            async fn edges_for_export(&self, authority_id: &str) -> StorageResult<Vec<Edge>> {
                let $this = self;
                Ok($state.edges_for_export(authority_id))
            }

            async fn edges_between(
                &self,
                src_id: &str,
                dst_id: &str,
                edge_type: Option<&str>,
            ) -> StorageResult<Vec<Edge>> {
                let $this = self;
                Ok($state.edges_between(src_id, dst_id, edge_type))
            }

            async fn get_source(&self, id: &str) -> StorageResult<Option<Source>> {
                let $this = self;
                Ok($state.sources.get(id).cloned())
            }

            async fn list_sources(
                &self,
                filter: &SourceFilter,
                window: QueryWindow,
            ) -> StorageResult<Vec<Source>> {
                let $this = self;
                Ok($state.list_sources(filter, window))
            }

            async fn count_sources(&self, filter: &SourceFilter) -> StorageResult<u64> {
                let $this = self;
                Ok(count($state.sources.values().filter(|s| filter.matches(s))))
            }

            async fn sources_for_export(&self) -> StorageResult<Vec<Source>> {
                let $this = self;
                Ok($state.sources.values().cloned().collect())
            }

            async fn events(
                &self,
                since_seq: u64,
                filter: &EventFilter,
                limit: usize,
            ) -> StorageResult<Vec<Event>> {
                let $this = self;
                Ok($state.events(since_seq, filter, limit))
            }

            async fn events_for_export(
                &self,
                authority_id: Option<&str>,
            ) -> StorageResult<Vec<Event>> {
                let $this = self;
                Ok($state.events_for_export(authority_id))
            }

            async fn latest_seq(&self) -> StorageResult<Option<u64>> {
                let $this = self;
                Ok($state.latest_seq())
            }

            async fn evidence_for_entity(&self, entity_id: &str) -> StorageResult<Vec<Evidence>> {
                let $this = self;
                Ok($state.evidence_for_entity(entity_id))
            }
        }
    };
}

graph_reader!(InMemoryGraphStore, |store| store.shared.read()?.graph);
graph_reader!(MemoryTransaction, |tx| tx.staged);

#[cfg(test)]
mod tests {
    use super::*;
    use fkg_types::NoopValidator;

    fn store() -> InMemoryGraphStore {
        InMemoryGraphStore::new(Arc::new(NoopValidator))
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn org(name: &str) -> EntityUpsert {
        EntityUpsert::new(record(json!({"name": name})), "county.x").with_type("organization")
    }

    #[tokio::test]
    async fn upsert_is_idempotent_but_logs_events() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let first = tx.upsert_entity(org("Acme Inc.")).await.unwrap();
        let second = tx.upsert_entity(org("ACME")).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.count_entities(&EntityFilter::default()).await.unwrap(), 1);

        let events = store.events(0, &EventFilter::default(), 0).await.unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(kinds, vec![EventType::CreateEntity, EventType::UpdateEntity]);
        assert_eq!(events[0].payload["entity_id"], json!(first.id));
        assert_eq!(store.latest_seq().await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        tx.upsert_entity(org("Acme")).await.unwrap();
        assert_eq!(tx.count_entities(&EntityFilter::default()).await.unwrap(), 1);
        tx.rollback().await.unwrap();

        assert_eq!(store.count_entities(&EntityFilter::default()).await.unwrap(), 0);
        assert_eq!(store.latest_seq().await.unwrap(), None);
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = store();
        {
            let mut tx = store.begin().await.unwrap();
            tx.upsert_entity(org("Acme")).await.unwrap();
        }
        assert_eq!(store.count_entities(&EntityFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_commit_conflicts() {
        let store = store();
        let mut a = store.begin().await.unwrap();
        let mut b = store.begin().await.unwrap();
        a.upsert_entity(org("Acme")).await.unwrap();
        b.upsert_entity(org("Globex")).await.unwrap();
        a.commit().await.unwrap();

        assert!(matches!(b.commit().await, Err(StorageError::Conflict(_))));
        let names: Vec<_> = store
            .list_entities(&EntityFilter::default(), QueryWindow::default())
            .await
            .unwrap()
            .into_iter()
            .filter_map(|e| e.name().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["Acme"]);
    }

    #[tokio::test]
    async fn sequence_numbers_have_no_gaps_after_rollback() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        tx.upsert_entity(org("Acme")).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let event = tx
            .append_event(EventType::CreateEntity, "county.x", json!({"entity_id": "x"}))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(event.seq, 1);
    }

    #[tokio::test]
    async fn cross_authority_overwrite_is_a_conflict() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let entity = tx.upsert_entity(org("Acme")).await.unwrap();
        let hijack = EntityUpsert::new(
            record(json!({"id": entity.id, "name": "Acme"})),
            "county.y",
        )
        .with_type("organization");
        assert!(matches!(
            tx.upsert_entity(hijack).await,
            Err(StorageError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn edges_neighbors_and_deletes() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let acme = tx.upsert_entity(org("Acme")).await.unwrap();
        let meals = tx
            .upsert_entity(
                EntityUpsert::new(record(json!({"name": "Meals"})), "county.x")
                    .with_type("service"),
            )
            .await
            .unwrap();
        let edge = tx
            .upsert_edge(EdgeUpsert::new(
                record(json!({
                    "type": "ORG_OFFERS_SERVICE",
                    "src_id": acme.id,
                    "dst_id": meals.id,
                })),
                "county.x",
            ))
            .await
            .unwrap();

        let out = tx
            .neighbors(&acme.id, None, Direction::Out, 10)
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, meals.id);
        let inbound = tx
            .neighbors(&meals.id, Some("ORG_OFFERS_SERVICE"), Direction::In, 10)
            .await
            .unwrap();
        assert_eq!(inbound[0].id, acme.id);
        assert_eq!(
            tx.edges_between(&acme.id, &meals.id, None).await.unwrap().len(),
            1
        );

        assert!(tx.delete_edge(&edge.id, true).await.unwrap());
        assert!(!tx.delete_edge(&edge.id, true).await.unwrap());
        tx.commit().await.unwrap();

        let last = store
            .events(0, &EventFilter::default(), 0)
            .await
            .unwrap()
            .pop()
            .unwrap();
        assert_eq!(last.event_type, EventType::DeleteEdge);
        assert_eq!(last.payload, json!({"edge_id": edge.id, "type": "ORG_OFFERS_SERVICE"}));
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_windowed() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        for name in ["One", "Two", "Three"] {
            tx.upsert_entity(org(name)).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        tx.commit().await.unwrap();

        let page = store
            .list_entities(&EntityFilter::default(), QueryWindow::new(2, 0))
            .await
            .unwrap();
        let names: Vec<_> = page.iter().filter_map(|e| e.name()).collect();
        assert_eq!(names, vec!["Three", "Two"]);

        let filtered = store
            .list_entities(
                &EntityFilter {
                    name_contains: Some("o".into()),
                    ..EntityFilter::default()
                },
                QueryWindow::default(),
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[tokio::test]
    async fn evidence_requires_known_entity_and_source() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        let acme = tx.upsert_entity(org("Acme")).await.unwrap();
        assert!(matches!(
            tx.add_evidence(Evidence::new(&acme.id, "missing", 0.9)).await,
            Err(StorageError::NotFound(_))
        ));
        let source = tx
            .upsert_source(SourceUpsert::new(record(
                json!({"type": "manual", "title": "site visit"}),
            )))
            .await
            .unwrap();
        tx.add_evidence(Evidence::new(&acme.id, &source.id, 0.9))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.evidence_for_entity(&acme.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("graph.json");

        let store = InMemoryGraphStore::open(&path, Arc::new(NoopValidator)).unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.upsert_entity(org("Acme")).await.unwrap();
        tx.commit().await.unwrap();
        assert!(path.exists());

        let reopened = InMemoryGraphStore::open(&path, Arc::new(NoopValidator)).unwrap();
        assert_eq!(
            reopened.count_entities(&EntityFilter::default()).await.unwrap(),
            1
        );
        assert_eq!(reopened.latest_seq().await.unwrap(), Some(1));
        assert_eq!(reopened.snapshot_path(), Some(path.as_path()));
    }
}
