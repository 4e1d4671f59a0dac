//! Backend-neutral half of the upsert contract: identity derivation, payload
//! shaping and validation. Backends only decide insert vs. update.

use crate::model::{EdgeUpsert, EntityUpsert, SourceUpsert};
use crate::{StorageError, StorageResult};
use fkg_ids::{make_edge_id, make_id};
use fkg_types::{record_str, Record, RecordValidator, SchemaKind};
use serde_json::Value;

const ENTITY_METADATA: [&str; 4] = ["id", "type", "schema_version", "authority_id"];
const EDGE_METADATA: [&str; 7] = [
    "id",
    "type",
    "src_id",
    "dst_id",
    "schema_version",
    "authority_id",
    "properties",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PreparedEntity {
    pub id: String,
    pub entity_type: String,
    pub schema_version: String,
    pub authority_id: String,
    pub data: Record,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PreparedEdge {
    pub id: String,
    pub edge_type: String,
    pub src_id: String,
    pub dst_id: String,
    pub schema_version: String,
    pub authority_id: String,
    pub data: Record,
}

pub(crate) fn prepare_entity(
    request: EntityUpsert,
    validator: &dyn RecordValidator,
) -> StorageResult<PreparedEntity> {
    let EntityUpsert {
        data,
        entity_type,
        authority_id,
        schema_version,
        validate,
        ..
    } = request;

    let entity_type = match entity_type {
        Some(t) if !t.is_empty() => t,
        _ => record_str(&data, "type")
            .map(str::to_string)
            .ok_or_else(|| StorageError::InvalidInput("Entity type must be specified".into()))?,
    };
    require_namespace(&authority_id)?;

    if validate {
        validator.validate(
            &Value::Object(data.clone()),
            &SchemaKind::Entity(entity_type.clone()),
            &schema_version,
        )?;
    }

    let id = match record_str(&data, "id") {
        Some(id) => id.to_string(),
        None => make_id(&authority_id, &entity_type, &data),
    };

    let payload = data
        .into_iter()
        .filter(|(k, _)| !ENTITY_METADATA.contains(&k.as_str()))
        .collect();

    Ok(PreparedEntity {
        id,
        entity_type,
        schema_version,
        authority_id,
        data: payload,
    })
}

pub(crate) fn prepare_edge(
    request: EdgeUpsert,
    validator: &dyn RecordValidator,
) -> StorageResult<PreparedEdge> {
    let EdgeUpsert {
        data,
        authority_id,
        schema_version,
        validate,
        ..
    } = request;

    let (Some(edge_type), Some(src_id), Some(dst_id)) = (
        record_str(&data, "type"),
        record_str(&data, "src_id"),
        record_str(&data, "dst_id"),
    ) else {
        return Err(StorageError::InvalidInput(
            "Edge must have type, src_id, and dst_id".into(),
        ));
    };
    let (edge_type, src_id, dst_id) = (edge_type.to_string(), src_id.to_string(), dst_id.to_string());
    require_namespace(&authority_id)?;

    if validate {
        validator.validate(&Value::Object(data.clone()), &SchemaKind::Edge, &schema_version)?;
    }

    let properties = match data.get("properties") {
        None | Some(Value::Null) => Record::new(),
        Some(Value::Object(props)) => props.clone(),
        Some(_) => {
            return Err(StorageError::InvalidInput(
                "Edge properties must be an object".into(),
            ))
        }
    };

    let id = match record_str(&data, "id") {
        Some(id) => id.to_string(),
        None => make_edge_id(&authority_id, &edge_type, &src_id, &dst_id, Some(&properties)),
    };

    let mut payload = Record::new();
    payload.insert("properties".into(), Value::Object(properties));
    for (k, v) in data {
        if !EDGE_METADATA.contains(&k.as_str()) {
            payload.insert(k, v);
        }
    }

    Ok(PreparedEdge {
        id,
        edge_type,
        src_id,
        dst_id,
        schema_version,
        authority_id,
        data: payload,
    })
}

/// `(id, stored payload)` for a source record.
pub(crate) fn prepare_source(
    request: SourceUpsert,
    validator: &dyn RecordValidator,
) -> StorageResult<(String, Record)> {
    let SourceUpsert {
        data,
        schema_version,
        validate,
    } = request;

    if validate {
        validator.validate(&Value::Object(data.clone()), &SchemaKind::Source, &schema_version)?;
    }

    let id = match record_str(&data, "id") {
        Some(id) => id.to_string(),
        None => make_id("source", record_str(&data, "type").unwrap_or("unknown"), &data),
    };
    let payload = data.into_iter().filter(|(k, _)| k != "id").collect();
    Ok((id, payload))
}

fn require_namespace(authority_id: &str) -> StorageResult<()> {
    if authority_id.is_empty() || authority_id.contains(':') {
        return Err(StorageError::InvalidInput(format!(
            "authority id must be a non-empty token without ':': {authority_id:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fkg_types::{NoopValidator, ValidationError};
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    struct RejectAll;

    impl RecordValidator for RejectAll {
        fn validate(&self, _: &Value, kind: &SchemaKind, _: &str) -> Result<(), ValidationError> {
            Err(ValidationError::new(format!("{kind} rejected")))
        }
    }

    #[test]
    fn entity_type_from_payload_and_metadata_stripped() {
        let prepared = prepare_entity(
            EntityUpsert::new(
                record(json!({
                    "type": "organization",
                    "schema_version": "v0.1",
                    "authority_id": "spoofed",
                    "name": "Acme",
                })),
                "county.x",
            ),
            &NoopValidator,
        )
        .unwrap();

        assert_eq!(prepared.entity_type, "organization");
        assert_eq!(prepared.authority_id, "county.x");
        assert!(prepared.id.starts_with("county.x:organization:"));
        assert_eq!(prepared.data, record(json!({"name": "Acme"})));
    }

    #[test]
    fn entity_without_type_is_rejected() {
        let err = prepare_entity(
            EntityUpsert::new(record(json!({"name": "Acme"})), "county.x"),
            &NoopValidator,
        )
        .unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));
    }

    #[test]
    fn explicit_entity_id_is_kept() {
        let prepared = prepare_entity(
            EntityUpsert::new(
                record(json!({"id": "county.y:service:abc", "name": "Meals"})),
                "county.x",
            )
            .with_type("service"),
            &NoopValidator,
        )
        .unwrap();
        assert_eq!(prepared.id, "county.y:service:abc");
    }

    #[test]
    fn validation_runs_only_when_requested() {
        let request = EntityUpsert::new(record(json!({"name": "Acme"})), "county.x")
            .with_type("organization");
        assert!(matches!(
            prepare_entity(request.clone(), &RejectAll),
            Err(StorageError::Validation(_))
        ));
        assert!(prepare_entity(request.with_validation(false), &RejectAll).is_ok());
    }

    #[test]
    fn namespace_must_not_contain_colon() {
        let request =
            EntityUpsert::new(record(json!({"name": "Acme"})), "a:b").with_type("organization");
        assert!(matches!(
            prepare_entity(request, &NoopValidator),
            Err(StorageError::InvalidInput(_))
        ));
    }

    #[test]
    fn edge_requires_endpoints() {
        let err = prepare_edge(
            EdgeUpsert::new(record(json!({"type": "T", "src_id": "a"})), "county.x"),
            &NoopValidator,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid input: Edge must have type, src_id, and dst_id"
        );
    }

    #[test]
    fn edge_id_ignores_fields_outside_properties() {
        let plain = prepare_edge(
            EdgeUpsert::new(
                record(json!({"type": "ORG_OFFERS_SERVICE", "src_id": "a", "dst_id": "b"})),
                "county.x",
            ),
            &NoopValidator,
        )
        .unwrap();
        let decorated = prepare_edge(
            EdgeUpsert::new(
                record(json!({
                    "type": "ORG_OFFERS_SERVICE",
                    "src_id": "a",
                    "dst_id": "b",
                    "note": "verified by phone",
                })),
                "county.x",
            ),
            &NoopValidator,
        )
        .unwrap();

        assert_eq!(plain.id, decorated.id);
        assert_eq!(decorated.data["note"], json!("verified by phone"));
        assert_eq!(decorated.data["properties"], json!({}));
    }

    #[test]
    fn source_id_defaults_to_content_address() {
        let source = |value: Value| {
            prepare_source(SourceUpsert::new(record(value)), &NoopValidator).unwrap()
        };

        let (id, payload) = source(json!({"type": "url", "uri": "https://x"}));
        assert!(id.starts_with("source:url:"));
        assert!(!payload.contains_key("id"));

        let (id, _) = source(json!({"title": "notes"}));
        assert!(id.starts_with("source:unknown:"));

        let (id, payload) = source(json!({"id": "src-1", "type": "file"}));
        assert_eq!(id, "src-1");
        assert_eq!(payload, record(json!({"type": "file"})));
    }

    #[test]
    fn source_validation_can_be_skipped() {
        let data = record(json!({"type": "bogus"}));
        let err = prepare_source(SourceUpsert::new(data.clone()), &RejectAll).unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));

        let (id, _) =
            prepare_source(SourceUpsert::new(data).with_validation(false), &RejectAll).unwrap();
        assert!(id.starts_with("source:bogus:"));
    }
}
