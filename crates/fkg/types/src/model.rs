use crate::record::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A node in the knowledge graph (organization, service, location, person).
///
/// `id` is content-addressed and scoped to `authority_id`. `data` never
/// contains the metadata fields `id`, `type`, `schema_version` or
/// `authority_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub schema_version: String,
    pub authority_id: String,
    pub data: Record,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Flattened PKG line: metadata fields plus the expanded payload.
    pub fn to_export_record(&self) -> Record {
        let mut out = self.data.clone();
        out.insert("id".into(), Value::String(self.id.clone()));
        out.insert("type".into(), Value::String(self.entity_type.clone()));
        out.insert(
            "schema_version".into(),
            Value::String(self.schema_version.clone()),
        );
        out.insert(
            "authority_id".into(),
            Value::String(self.authority_id.clone()),
        );
        out
    }

    /// Display name, when the payload carries one.
    pub fn name(&self) -> Option<&str> {
        self.data.get("name").and_then(Value::as_str)
    }
}

/// A typed relationship between two entities.
///
/// `data` holds a `properties` sub-record plus any extension fields; only
/// `(type, src_id, dst_id, properties)` participate in the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub src_id: String,
    pub dst_id: String,
    pub schema_version: String,
    pub authority_id: String,
    pub data: Record,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Edge {
    pub fn properties(&self) -> Option<&Record> {
        self.data.get("properties").and_then(Value::as_object)
    }

    /// PKG line. Extension fields outside `properties` are not exported.
    pub fn to_export_record(&self) -> Record {
        let mut out = Record::new();
        out.insert("id".into(), Value::String(self.id.clone()));
        out.insert("type".into(), Value::String(self.edge_type.clone()));
        out.insert("src_id".into(), Value::String(self.src_id.clone()));
        out.insert("dst_id".into(), Value::String(self.dst_id.clone()));
        out.insert(
            "schema_version".into(),
            Value::String(self.schema_version.clone()),
        );
        out.insert(
            "authority_id".into(),
            Value::String(self.authority_id.clone()),
        );
        out.insert(
            "properties".into(),
            Value::Object(self.properties().cloned().unwrap_or_default()),
        );
        out
    }
}

/// A provenance origin (file, URL, dataset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub data: Record,
    pub created_at: DateTime<Utc>,
}

impl Source {
    pub fn source_type(&self) -> Option<&str> {
        self.data.get("type").and_then(Value::as_str)
    }

    pub fn to_export_record(&self) -> Record {
        let mut out = self.data.clone();
        out.insert("id".into(), Value::String(self.id.clone()));
        out
    }
}

/// Links an entity to the source it was extracted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub entity_id: String,
    pub source_id: String,
    pub confidence: f64,
    pub extracted_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Evidence {
    pub fn new(entity_id: impl Into<String>, source_id: impl Into<String>, confidence: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entity_id: entity_id.into(),
            source_id: source_id.into(),
            confidence: confidence.clamp(0.0, 1.0),
            extracted_at: Utc::now(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Kind of mutation recorded in the changelog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CreateEntity,
    UpdateEntity,
    DeleteEntity,
    CreateEdge,
    UpdateEdge,
    DeleteEdge,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::CreateEntity => "create_entity",
            EventType::UpdateEntity => "update_entity",
            EventType::DeleteEntity => "delete_entity",
            EventType::CreateEdge => "create_edge",
            EventType::UpdateEdge => "update_edge",
            EventType::DeleteEdge => "delete_edge",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only changelog row. `seq` is assigned by storage, strictly
/// increasing and never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub seq: u64,
    pub event_type: EventType,
    pub authority_id: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}
