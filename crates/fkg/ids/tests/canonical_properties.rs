//! Property tests: canonical output is insensitive to key order and to
//! incidental whitespace, and identifiers are stable.

use fkg_ids::{canonical_json, compute_content_hash, make_id};
use fkg_types::Record;
use proptest::prelude::*;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Distinct field names paired with word lists.
fn arb_fields() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::btree_map("[a-z_]{1,10}", prop::collection::vec("[A-Za-z0-9]{1,8}", 1..4), 1..8)
        .prop_map(|m| m.into_iter().collect())
}

/// Whitespace runs used to pad and join words.
fn arb_space() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec![" ", "  ", "\t", "\n", " \t "]), 1..3)
        .prop_map(|parts| parts.concat())
}

/// Render fields as JSON text in the given order, joining words with `sep`.
fn render(fields: &[(String, Vec<String>)], sep: &str, pad: &str) -> Record {
    let body: Vec<String> = fields
        .iter()
        .map(|(k, words)| {
            let value = format!("{}{}{}", pad, words.join(sep), pad);
            format!("{}:{}", Value::String(k.clone()), Value::String(value))
        })
        .collect();
    let text = format!("{{{}}}", body.join(","));
    serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default()
}

proptest! {
    /// Reordering keys never changes the canonical text.
    #[test]
    fn key_order_is_irrelevant(fields in arb_fields()) {
        let forward = render(&fields, " ", "");
        let mut reversed_fields = fields.clone();
        reversed_fields.reverse();
        let reversed = render(&reversed_fields, " ", "");

        prop_assert_eq!(canonical_json(&forward), canonical_json(&reversed));
    }

    /// Padding and widening whitespace never changes the canonical text.
    #[test]
    fn incidental_whitespace_is_irrelevant(
        fields in arb_fields(),
        sep in arb_space(),
        pad in arb_space(),
    ) {
        let tight = render(&fields, " ", "");
        let loose = render(&fields, &sep, &pad);

        prop_assert_eq!(canonical_json(&tight), canonical_json(&loose));
        prop_assert_eq!(compute_content_hash(&tight), compute_content_hash(&loose));
    }

    /// Identifiers are a pure function of the payload.
    #[test]
    fn make_id_is_stable(fields in arb_fields()) {
        let payload = render(&fields, " ", "");
        let first = make_id("county.x", "organization", &payload);
        let second = make_id("county.x", "organization", &payload.clone());
        prop_assert_eq!(first, second);
    }

    /// Content hashes are always 64 lowercase hex characters.
    #[test]
    fn content_hash_shape(fields in arb_fields()) {
        let hash = compute_content_hash(&render(&fields, " ", ""));
        prop_assert_eq!(hash.len(), 64);
        prop_assert!(hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}

#[test]
fn uppercase_changes_nothing_but_content_changes_hash() {
    let a = render(&[("city".into(), vec!["Springfield".into()])], " ", "");
    let b = render(&[("city".into(), vec!["SPRINGFIELD".into()])], " ", "");
    let c = render(&[("city".into(), vec!["Shelbyville".into()])], " ", "");
    assert_eq!(compute_content_hash(&a), compute_content_hash(&b));
    assert_ne!(compute_content_hash(&a), compute_content_hash(&c));
}
