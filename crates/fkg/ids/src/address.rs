use crate::canonicalize::canonical_json;
use fkg_types::Record;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex characters of the digest kept in an identifier.
pub const SHORT_HASH_LEN: usize = 16;

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn short_hash(record: &Record) -> String {
    let mut digest = sha256_hex(canonical_json(record).as_bytes());
    digest.truncate(SHORT_HASH_LEN);
    digest
}

/// Identifier `{namespace}:{entity_type}:{16 hex}` for a record.
///
/// `id` and `authority_id` are ignored so that re-deriving an identifier from
/// an exported line yields the same value.
pub fn make_id(namespace: &str, entity_type: &str, payload: &Record) -> String {
    let mut hashed = payload.clone();
    hashed.remove("id");
    hashed.remove("authority_id");
    format!("{}:{}:{}", namespace, entity_type, short_hash(&hashed))
}

/// Identifier `{namespace}:edge:{16 hex}`, a function of
/// `(edge_type, src_id, dst_id, properties)` only.
///
/// Absent and empty properties hash the same: the key is left out.
pub fn make_edge_id(
    namespace: &str,
    edge_type: &str,
    src_id: &str,
    dst_id: &str,
    properties: Option<&Record>,
) -> String {
    let mut payload = Record::new();
    payload.insert("type".into(), Value::String(edge_type.to_string()));
    payload.insert("src_id".into(), Value::String(src_id.to_string()));
    payload.insert("dst_id".into(), Value::String(dst_id.to_string()));
    if let Some(props) = properties.filter(|p| !p.is_empty()) {
        payload.insert("properties".into(), Value::Object(props.clone()));
    }
    format!("{}:edge:{}", namespace, short_hash(&payload))
}

/// Full 64-hex SHA-256 of the canonical payload, for change detection.
pub fn compute_content_hash(payload: &Record) -> String {
    sha256_hex(canonical_json(payload).as_bytes())
}
