use fkg_types::{Edge, Entity, Event, EventType, Record, Source};
use serde::{Deserialize, Serialize};

/// Entity listing filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFilter {
    pub entity_type: Option<String>,
    pub authority_id: Option<String>,
    /// Case-insensitive substring of `data.name`
    pub name_contains: Option<String>,
}

impl EntityFilter {
    pub fn of_type(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            ..Self::default()
        }
    }

    pub fn owned_by(authority_id: impl Into<String>) -> Self {
        Self {
            authority_id: Some(authority_id.into()),
            ..Self::default()
        }
    }

    pub(crate) fn matches(&self, entity: &Entity) -> bool {
        if let Some(t) = &self.entity_type {
            if &entity.entity_type != t {
                return false;
            }
        }
        if let Some(a) = &self.authority_id {
            if &entity.authority_id != a {
                return false;
            }
        }
        if let Some(q) = &self.name_contains {
            let needle = q.to_lowercase();
            match entity.name() {
                Some(name) if name.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Edge listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeFilter {
    pub edge_type: Option<String>,
    pub authority_id: Option<String>,
    pub src_id: Option<String>,
    pub dst_id: Option<String>,
}

impl EdgeFilter {
    pub fn owned_by(authority_id: impl Into<String>) -> Self {
        Self {
            authority_id: Some(authority_id.into()),
            ..Self::default()
        }
    }

    pub(crate) fn matches(&self, edge: &Edge) -> bool {
        fn eq(want: &Option<String>, have: &str) -> bool {
            want.as_deref().map_or(true, |w| w == have)
        }
        eq(&self.edge_type, &edge.edge_type)
            && eq(&self.authority_id, &edge.authority_id)
            && eq(&self.src_id, &edge.src_id)
            && eq(&self.dst_id, &edge.dst_id)
    }
}

/// Source listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFilter {
    pub source_type: Option<String>,
}

impl SourceFilter {
    pub(crate) fn matches(&self, source: &Source) -> bool {
        match &self.source_type {
            Some(t) => source.source_type() == Some(t.as_str()),
            None => true,
        }
    }
}

/// Changelog read filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub event_type: Option<EventType>,
    pub authority_id: Option<String>,
}

impl EventFilter {
    pub(crate) fn matches(&self, event: &Event) -> bool {
        self.event_type.map_or(true, |t| t == event.event_type)
            && self
                .authority_id
                .as_deref()
                .map_or(true, |a| a == event.authority_id)
    }
}

/// Which side of an edge a neighbor sits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Entities at the `dst_id` of edges leaving the entity
    #[default]
    Out,
    /// Entities at the `src_id` of edges arriving at the entity
    In,
}

/// Entity upsert request.
///
/// `data` may carry `id`, `type`, `schema_version` and `authority_id`; they
/// are lifted out of the stored payload. The explicit `authority_id` always
/// wins over whatever the payload claims.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityUpsert {
    pub data: Record,
    pub entity_type: Option<String>,
    pub authority_id: String,
    pub schema_version: String,
    pub validate: bool,
    pub log_event: bool,
}

impl EntityUpsert {
    pub fn new(data: Record, authority_id: impl Into<String>) -> Self {
        Self {
            data,
            entity_type: None,
            authority_id: authority_id.into(),
            schema_version: fkg_types::DEFAULT_SCHEMA_VERSION.to_string(),
            validate: true,
            log_event: true,
        }
    }

    pub fn with_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn with_schema_version(mut self, schema_version: impl Into<String>) -> Self {
        self.schema_version = schema_version.into();
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn without_event(mut self) -> Self {
        self.log_event = false;
        self
    }
}

/// Edge upsert request. `data` must carry `type`, `src_id` and `dst_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeUpsert {
    pub data: Record,
    pub authority_id: String,
    pub schema_version: String,
    pub validate: bool,
    pub log_event: bool,
}

impl EdgeUpsert {
    pub fn new(data: Record, authority_id: impl Into<String>) -> Self {
        Self {
            data,
            authority_id: authority_id.into(),
            schema_version: fkg_types::DEFAULT_SCHEMA_VERSION.to_string(),
            validate: true,
            log_event: true,
        }
    }

    pub fn with_schema_version(mut self, schema_version: impl Into<String>) -> Self {
        self.schema_version = schema_version.into();
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn without_event(mut self) -> Self {
        self.log_event = false;
        self
    }
}

/// Source upsert request. `data.type` picks the id namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUpsert {
    pub data: Record,
    pub schema_version: String,
    pub validate: bool,
}

impl SourceUpsert {
    pub fn new(data: Record) -> Self {
        Self {
            data,
            schema_version: fkg_types::DEFAULT_SCHEMA_VERSION.to_string(),
            validate: true,
        }
    }

    pub fn with_schema_version(mut self, schema_version: impl Into<String>) -> Self {
        self.schema_version = schema_version.into();
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}
