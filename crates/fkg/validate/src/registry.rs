use crate::builtin;
use crate::error::{SchemaError, SchemaResult};
use fkg_types::{RecordValidator, SchemaKind, ValidationError};
use jsonschema::{Draft, Validator};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Compiled schemas indexed by `(schema version, kind)`.
#[derive(Default)]
pub struct SchemaRegistry {
    validators: BTreeMap<(String, SchemaKind), Validator>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field(
                "schemas",
                &self
                    .validators
                    .keys()
                    .map(|(version, kind)| format!("{version}/{kind}"))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the schemas compiled into this crate.
    pub fn builtin() -> SchemaResult<Self> {
        let mut registry = Self::new();
        for (stem, text) in builtin::V0_1 {
            let Some(kind) = kind_from_stem(stem) else {
                continue;
            };
            let schema: Value = serde_json::from_str(text).map_err(|source| SchemaError::Parse {
                name: format!("{}/{stem}", builtin::VERSION),
                source,
            })?;
            registry.register(builtin::VERSION, kind, &schema)?;
        }
        Ok(registry)
    }

    /// Scan `<dir>/<version>/*.json` once.
    ///
    /// Recognised file stems are `entity.<type>`, `edge.schema`,
    /// `source.schema` and `pkg.manifest`; anything else is skipped.
    pub fn load_dir(dir: impl AsRef<Path>) -> SchemaResult<Self> {
        let dir = dir.as_ref();
        let mut registry = Self::new();

        for version_entry in read_dir(dir)? {
            let version_path = version_entry.path();
            if !version_path.is_dir() {
                continue;
            }
            let Some(version) = version_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let version = version.to_string();

            for entry in read_dir(&version_path)? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let Some(kind) = kind_from_stem(stem) else {
                    debug!(path = %path.display(), "skipping unrecognised schema file");
                    continue;
                };

                let text = std::fs::read_to_string(&path).map_err(|source| SchemaError::Io {
                    path: path.clone(),
                    source,
                })?;
                let schema: Value =
                    serde_json::from_str(&text).map_err(|source| SchemaError::Parse {
                        name: path.display().to_string(),
                        source,
                    })?;
                registry.register(&version, kind, &schema)?;
            }
        }

        info!(
            dir = %dir.display(),
            schemas = registry.len(),
            versions = ?registry.versions(),
            "loaded schema registry"
        );
        Ok(registry)
    }

    /// Compile and register one schema, replacing any previous entry.
    pub fn register(&mut self, version: &str, kind: SchemaKind, schema: &Value) -> SchemaResult<()> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft7)
            .build(schema)
            .map_err(|e| SchemaError::Compile {
                name: format!("{version}/{kind}"),
                message: e.to_string(),
            })?;
        self.validators.insert((version.to_string(), kind), validator);
        Ok(())
    }

    pub fn contains(&self, kind: &SchemaKind, version: &str) -> bool {
        self.validators
            .contains_key(&(version.to_string(), kind.clone()))
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Schema versions with at least one schema, sorted.
    pub fn versions(&self) -> Vec<String> {
        self.validators
            .keys()
            .map(|(version, _)| version.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Entity types with a schema under `version`, sorted.
    pub fn entity_types(&self, version: &str) -> Vec<String> {
        self.validators
            .keys()
            .filter(|(v, _)| v == version)
            .filter_map(|(_, kind)| match kind {
                SchemaKind::Entity(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }
}

impl RecordValidator for SchemaRegistry {
    fn validate(
        &self,
        record: &Value,
        kind: &SchemaKind,
        schema_version: &str,
    ) -> Result<(), ValidationError> {
        let key = (schema_version.to_string(), kind.clone());
        let Some(validator) = self.validators.get(&key) else {
            return Err(match kind {
                SchemaKind::Entity(t) => ValidationError::new(format!("Unknown entity type: {t}")),
                other => ValidationError::new(format!(
                    "No {other} schema for version {schema_version}"
                )),
            });
        };

        let errors: Vec<String> = validator
            .iter_errors(record)
            .map(|error| format!("{}: {}", dotted_path(&error.instance_path().to_string()), error))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::with_errors(
                format!(
                    "{} validation failed with {} error(s)",
                    kind_label(kind),
                    errors.len()
                ),
                errors,
            ))
        }
    }
}

fn read_dir(dir: &Path) -> SchemaResult<Vec<std::fs::DirEntry>> {
    let entries = std::fs::read_dir(dir).map_err(|source| SchemaError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut out = entries
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| SchemaError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    out.sort_by_key(|e| e.file_name());
    Ok(out)
}

fn kind_from_stem(stem: &str) -> Option<SchemaKind> {
    match stem {
        "edge.schema" => Some(SchemaKind::Edge),
        "source.schema" => Some(SchemaKind::Source),
        "pkg.manifest" => Some(SchemaKind::Manifest),
        _ => stem
            .strip_prefix("entity.")
            .filter(|t| !t.is_empty())
            .map(|t| SchemaKind::Entity(t.to_string())),
    }
}

fn kind_label(kind: &SchemaKind) -> &'static str {
    match kind {
        SchemaKind::Entity(_) => "Entity",
        SchemaKind::Edge => "Edge",
        SchemaKind::Source => "Source",
        SchemaKind::Manifest => "Manifest",
    }
}

/// JSON pointer `/address/0/city` as `address.0.city`; the empty pointer is
/// `(root)`.
fn dotted_path(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        "(root)".to_string()
    } else {
        trimmed
            .split('/')
            .map(|seg| seg.replace("~1", "/").replace("~0", "~"))
            .collect::<Vec<_>>()
            .join(".")
    }
}
