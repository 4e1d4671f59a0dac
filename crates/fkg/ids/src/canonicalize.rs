use fkg_types::Record;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Fields that get legal-suffix and punctuation stripping.
pub const NAME_FIELDS: [&str; 3] = ["name", "organization_name", "service_name"];

// Applied in order, each at most once; "acme co inc" loses both suffixes.
static LEGAL_SUFFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\s+inc\.?$",
        r"(?i)\s+llc\.?$",
        r"(?i)\s+corp\.?$",
        r"(?i)\s+corporation$",
        r"(?i)\s+incorporated$",
        r"(?i)\s+ltd\.?$",
        r"(?i)\s+limited$",
        r"(?i)\s+co\.?$",
        r"(?i)\s+company$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("legal suffix pattern"))
    .collect()
});

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern"));

/// NFKC-normalize, lowercase and collapse whitespace runs to single spaces.
pub fn normalize_string(s: &str) -> String {
    let lowered = s.nfkc().collect::<String>().to_lowercase();
    collapse_whitespace(&lowered)
}

/// [`normalize_string`] plus removal of legal-entity suffixes and all
/// punctuation. "Acme, Inc." and "ACME" both become "acme".
pub fn normalize_name(name: &str) -> String {
    let mut s = normalize_string(name);
    for suffix in LEGAL_SUFFIXES.iter() {
        s = suffix.replace(&s, "").into_owned();
    }
    let s = PUNCTUATION.replace_all(&s, "");
    collapse_whitespace(&s)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form of a record.
///
/// Keys come out sorted at every level, strings are normalized, `null`s and
/// values that normalize to empty are dropped, list order is kept. Numbers and
/// booleans pass through untouched. The function is total.
pub fn canonicalize(record: &Record, normalize_names: bool) -> Record {
    let mut out = Record::new();
    for (key, value) in record {
        if let Some(canonical) = canonical_field(key, value, normalize_names) {
            out.insert(key.clone(), canonical);
        }
    }
    out
}

fn canonical_field(key: &str, value: &Value, normalize_names: bool) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => non_empty_object(canonicalize(map, normalize_names)),
        Value::Array(items) => canonical_list(items, normalize_names),
        Value::String(s) => {
            let normalized = if normalize_names && NAME_FIELDS.contains(&key) {
                normalize_name(s)
            } else {
                normalize_string(s)
            };
            non_empty_string(normalized)
        }
        scalar => Some(scalar.clone()),
    }
}

// List strings never get name treatment, even under a `name` key.
fn canonical_list(items: &[Value], normalize_names: bool) -> Option<Value> {
    let out: Vec<Value> = items
        .iter()
        .filter_map(|item| match item {
            Value::Null => None,
            Value::Object(map) => non_empty_object(canonicalize(map, normalize_names)),
            Value::String(s) => non_empty_string(normalize_string(s)),
            Value::Array(inner) => canonical_list(inner, normalize_names),
            scalar => Some(scalar.clone()),
        })
        .collect();

    if out.is_empty() {
        None
    } else {
        Some(Value::Array(out))
    }
}

fn non_empty_object(map: Record) -> Option<Value> {
    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}

fn non_empty_string(s: String) -> Option<Value> {
    if s.is_empty() {
        None
    } else {
        Some(Value::String(s))
    }
}

/// Compact JSON text of the canonical record (names normalized). This exact
/// text is what gets hashed.
pub fn canonical_json(record: &Record) -> String {
    Value::Object(canonicalize(record, true)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn normalize_string_collapses_and_lowercases() {
        assert_eq!(normalize_string("  Hello \t  World\n"), "hello world");
        assert_eq!(normalize_string(""), "");
    }

    #[test]
    fn normalize_string_applies_nfkc() {
        // U+FB01 LATIN SMALL LIGATURE FI, full-width A
        assert_eq!(normalize_string("\u{FB01}le \u{FF21}"), "file a");
    }

    #[test]
    fn normalize_name_strips_legal_suffixes() {
        assert_eq!(normalize_name("Acme Inc."), "acme");
        assert_eq!(normalize_name("Acme, LLC"), "acme");
        assert_eq!(normalize_name("Acme Corporation"), "acme");
        assert_eq!(normalize_name("Acme Ltd."), "acme");
        assert_eq!(normalize_name("Acme Company"), "acme");
        assert_eq!(normalize_name("Acme Co. Inc."), "acme");
    }

    #[test]
    fn normalize_name_keeps_embedded_suffix_words() {
        assert_eq!(normalize_name("Zinc Works"), "zinc works");
        assert_eq!(normalize_name("Inc Street Food Bank"), "inc street food bank");
        assert_eq!(normalize_name("Mrs. O'Brien's Pantry"), "mrs obriens pantry");
    }

    #[test]
    fn canonicalize_sorts_drops_and_normalizes() {
        let input = record(json!({
            "zeta": "  Mixed   Case ",
            "alpha": null,
            "empty": "",
            "nested": {"b": "", "a": {}},
            "count": 3,
            "open": true,
            "name": "Acme Inc.",
        }));
        let canonical = canonicalize(&input, true);

        let keys: Vec<_> = canonical.keys().cloned().collect();
        assert_eq!(keys, vec!["count", "name", "open", "zeta"]);
        assert_eq!(canonical["zeta"], json!("mixed case"));
        assert_eq!(canonical["name"], json!("acme"));
        assert_eq!(canonical["count"], json!(3));
    }

    #[test]
    fn canonicalize_without_name_normalization() {
        let input = record(json!({"name": "Acme Inc."}));
        assert_eq!(canonicalize(&input, false)["name"], json!("acme inc."));
    }

    #[test]
    fn lists_keep_order_and_drop_empties() {
        let input = record(json!({
            "tags": [" B ", null, "", "a", {"x": null}, {"y": "Z"}, 4, [], ["  Q "]],
            "none": [null, ""],
        }));
        let canonical = canonicalize(&input, true);
        assert_eq!(
            canonical["tags"],
            json!(["b", "a", {"y": "z"}, 4, ["q"]])
        );
        assert!(!canonical.contains_key("none"));
    }

    #[test]
    fn list_strings_do_not_get_name_treatment() {
        let input = record(json!({"name": ["Acme Inc."]}));
        assert_eq!(canonicalize(&input, true)["name"], json!(["acme inc."]));
    }

    #[test]
    fn nested_name_fields_are_normalized() {
        let input = record(json!({"provider": {"organization_name": "Helping Hands, Inc"}}));
        assert_eq!(
            canonicalize(&input, true)["provider"],
            json!({"organization_name": "helping hands"})
        );
    }

    #[test]
    fn canonical_json_is_compact_and_sorted() {
        let a = record(json!({"b": 1, "a": {"d": "X", "c": " y "}}));
        assert_eq!(canonical_json(&a), r#"{"a":{"c":"y","d":"x"},"b":1}"#);
    }

    #[test]
    fn canonical_json_keeps_non_ascii() {
        let a = record(json!({"city": "São Paulo"}));
        assert_eq!(canonical_json(&a), "{\"city\":\"são paulo\"}");
    }
}
