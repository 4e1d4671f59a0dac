use crate::context::PkgContext;
use crate::error::{PkgError, PkgResult};
use crate::export::file_name;
use crate::manifest::{load_manifest, pkg_file, verify_checksums};
use fkg_storage::{
    EdgeUpsert, EntityUpsert, GraphStore, GraphTransaction, SourceUpsert, StorageError,
};
use fkg_types::{
    record_str, Manifest, PkgFileKind, Record, RecordValidator, SchemaKind, DEFAULT_SCHEMA_VERSION,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

/// Namespace imported records are re-owned under.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Authority {
    /// The local instance id
    #[default]
    Local,
    /// A remote authority namespace, used verbatim
    Remote(String),
}

impl Authority {
    pub fn resolve<'a>(&'a self, ctx: &'a PkgContext) -> &'a str {
        match self {
            Authority::Local => &ctx.instance.id,
            Authority::Remote(id) => id,
        }
    }

    /// Id prefix every entity and edge of a remote PKG must carry.
    fn required_prefix(&self) -> Option<String> {
        match self {
            Authority::Local => None,
            Authority::Remote(id) => Some(format!("{id}:")),
        }
    }
}

impl From<&str> for Authority {
    fn from(value: &str) -> Self {
        if value == "local" {
            Authority::Local
        } else {
            Authority::Remote(value.to_string())
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authority::Local => f.write_str("local"),
            Authority::Remote(id) => f.write_str(id),
        }
    }
}

/// Knobs for [`import_pkg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub authority: Authority,
    pub verify_checksums: bool,
    pub validate: bool,
    /// When set, entities of other types are skipped
    pub allow_entity_types: Option<Vec<String>>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            authority: Authority::Local,
            verify_checksums: true,
            validate: true,
            allow_entity_types: None,
        }
    }
}

impl ImportOptions {
    fn allows(&self, entity_type: Option<&str>) -> bool {
        match (&self.allow_entity_types, entity_type) {
            (None, _) => true,
            (Some(allowed), Some(t)) => allowed.iter().any(|a| a == t),
            (Some(_), None) => false,
        }
    }
}

/// What an import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub authority_id: String,
    pub entities: u64,
    pub edges: u64,
    pub sources: u64,
    /// Entities left out by the allowed-type filter
    pub skipped: u64,
    /// Edges whose `src_id` or `dst_id` is not a known entity
    pub dangling_edges: u64,
}

/// Apply a PKG directory to `store` as one transaction.
///
/// Sources go in first, then entities, then edges. Every record is re-owned
/// by the chosen authority regardless of what the file says. For a remote
/// authority, an entity or edge id outside `{remote}:` rejects the whole PKG.
/// Any checksum, validation or storage failure leaves the store untouched.
/// The changelog file is never replayed.
pub async fn import_pkg<S>(
    ctx: &PkgContext,
    store: &S,
    pkg_dir: &Path,
    options: &ImportOptions,
) -> PkgResult<ImportStats>
where
    S: GraphStore + ?Sized,
{
    let manifest = load_manifest(pkg_dir, ctx.validator.as_ref())?;

    if options.verify_checksums {
        let mismatches = verify_checksums(pkg_dir, &manifest)?;
        if !mismatches.is_empty() {
            warn!(dir = %pkg_dir.display(), ?mismatches, "pkg failed checksum verification");
            return Err(PkgError::ChecksumMismatch(mismatches));
        }
    }

    let authority_id = options.authority.resolve(ctx).to_string();
    let mut tx = store.begin().await?;

    match apply(tx.as_mut(), pkg_dir, &manifest, &authority_id, options).await {
        Ok(stats) => {
            tx.commit().await?;
            info!(
                authority_id = %stats.authority_id,
                from = %manifest.authority_id,
                entities = stats.entities,
                edges = stats.edges,
                sources = stats.sources,
                skipped = stats.skipped,
                dangling_edges = stats.dangling_edges,
                "imported pkg"
            );
            Ok(stats)
        }
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "rollback after failed import also failed");
            }
            Err(err)
        }
    }
}

async fn apply(
    tx: &mut dyn GraphTransaction,
    pkg_dir: &Path,
    manifest: &Manifest,
    authority_id: &str,
    options: &ImportOptions,
) -> PkgResult<ImportStats> {
    let mut stats = ImportStats {
        authority_id: authority_id.to_string(),
        ..ImportStats::default()
    };

    let prefix = options.authority.required_prefix();

    if let Some((file, rows)) = read_listed(pkg_dir, manifest, PkgFileKind::Sources)? {
        for (line, data) in rows {
            let version = schema_version(&data);
            let request = SourceUpsert::new(data)
                .with_schema_version(version)
                .with_validation(options.validate);
            tx.upsert_source(request)
                .await
                .map_err(|e| record_error(&file, line, e))?;
            stats.sources += 1;
        }
        debug!(file = %file, sources = stats.sources, "imported sources");
    }

    if let Some((file, rows)) = read_listed(pkg_dir, manifest, PkgFileKind::Entities)? {
        for (line, data) in rows {
            check_namespace(prefix.as_deref(), &file, line, &data)?;
            let entity_type = record_str(&data, "type").map(str::to_string);
            if !options.allows(entity_type.as_deref()) {
                debug!(line, entity_type = ?entity_type, "skipping entity type not allowed");
                stats.skipped += 1;
                continue;
            }

            let version = schema_version(&data);
            let mut request = EntityUpsert::new(data, authority_id)
                .with_schema_version(version)
                .with_validation(options.validate);
            if let Some(t) = entity_type {
                request = request.with_type(t);
            }
            tx.upsert_entity(request)
                .await
                .map_err(|e| record_error(&file, line, e))?;
            stats.entities += 1;
        }
        if stats.skipped > 0 {
            warn!(
                authority_id,
                skipped = stats.skipped,
                "entities of types not allowed for this authority were skipped"
            );
        }
    }

    if let Some((file, rows)) = read_listed(pkg_dir, manifest, PkgFileKind::Edges)? {
        for (line, data) in rows {
            check_namespace(prefix.as_deref(), &file, line, &data)?;
            let version = schema_version(&data);
            let request = EdgeUpsert::new(data, authority_id)
                .with_schema_version(version)
                .with_validation(options.validate);
            let edge = tx
                .upsert_edge(request)
                .await
                .map_err(|e| record_error(&file, line, e))?;
            stats.edges += 1;

            if tx.get_entity(&edge.src_id).await?.is_none()
                || tx.get_entity(&edge.dst_id).await?.is_none()
            {
                warn!(
                    edge_id = %edge.id,
                    src_id = %edge.src_id,
                    dst_id = %edge.dst_id,
                    "edge references an unknown entity"
                );
                stats.dangling_edges += 1;
            }
        }
    }

    Ok(stats)
}

fn schema_version(data: &Record) -> String {
    record_str(data, "schema_version")
        .unwrap_or(DEFAULT_SCHEMA_VERSION)
        .to_string()
}

/// An explicit id must sit in the importing authority's namespace. Records
/// without an id get one derived under that namespace.
fn check_namespace(
    prefix: Option<&str>,
    file: &str,
    line: usize,
    data: &Record,
) -> PkgResult<()> {
    let (Some(prefix), Some(id)) = (prefix, record_str(data, "id")) else {
        return Ok(());
    };
    if id.starts_with(prefix) {
        return Ok(());
    }
    Err(PkgError::ForeignNamespace {
        file: file.to_string(),
        line,
        id: id.to_string(),
        authority: prefix.trim_end_matches(':').to_string(),
    })
}

fn record_error(file: &str, line: usize, err: StorageError) -> PkgError {
    match err {
        StorageError::Validation(source) => PkgError::Validation {
            file: file.to_string(),
            line,
            source,
        },
        source => PkgError::Record {
            file: file.to_string(),
            line,
            source,
        },
    }
}

/// Parsed `(line number, record)` rows of a listed file, or `None` when the
/// manifest does not list it or the file is absent.
fn read_listed(
    pkg_dir: &Path,
    manifest: &Manifest,
    kind: PkgFileKind,
) -> PkgResult<Option<(String, Vec<(usize, Record)>)>> {
    let Some(filename) = manifest.file(kind) else {
        return Ok(None);
    };
    let path = pkg_file(pkg_dir, filename)?;
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some((filename.to_string(), read_jsonl(&path)?)))
}

/// Parse a JSONL file; blank lines are skipped, line numbers are 1-based.
pub(crate) fn read_jsonl(path: &Path) -> PkgResult<Vec<(usize, Record)>> {
    let file = file_name(path);
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(trimmed).map_err(|source| PkgError::Json {
            file: file.clone(),
            line: idx + 1,
            source,
        })?;
        rows.push((idx + 1, record));
    }
    Ok(rows)
}

/// Outcome of a read-only PKG check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PkgValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub manifest: Option<Manifest>,
}

/// Dry-run a PKG: manifest, checksums, listed files and the structure of
/// every source, entity and edge record.
///
/// Listed-but-missing files are warnings, not errors. Nothing is written.
pub fn validate_pkg(ctx: &PkgContext, pkg_dir: &Path) -> PkgValidation {
    let mut report = PkgValidation {
        valid: true,
        ..PkgValidation::default()
    };

    let manifest = match load_manifest(pkg_dir, ctx.validator.as_ref()) {
        Ok(manifest) => manifest,
        Err(err @ PkgError::ManifestMissing(_)) => {
            report.valid = false;
            report.errors.push(err.to_string());
            return report;
        }
        Err(err) => {
            report.valid = false;
            report.errors.push(format!("Invalid manifest: {err}"));
            return report;
        }
    };

    match verify_checksums(pkg_dir, &manifest) {
        Ok(mismatches) => report.errors.extend(mismatches),
        Err(err) => report.errors.push(format!("checksum verification failed: {err}")),
    }

    for filename in manifest.files.values() {
        match pkg_file(pkg_dir, filename) {
            Ok(path) if path.is_file() => {}
            Ok(_) => report
                .warnings
                .push(format!("Listed file missing: {filename}")),
            Err(err) => report.errors.push(err.to_string()),
        }
    }

    if report.errors.is_empty() {
        check_records(ctx.validator.as_ref(), pkg_dir, &manifest, &mut report.errors);
    }

    report.valid = report.errors.is_empty();
    report.manifest = Some(manifest);
    report
}

fn check_records(
    validator: &dyn RecordValidator,
    pkg_dir: &Path,
    manifest: &Manifest,
    errors: &mut Vec<String>,
) {
    for kind in [PkgFileKind::Sources, PkgFileKind::Entities, PkgFileKind::Edges] {
        let rows = match read_listed(pkg_dir, manifest, kind) {
            Ok(Some((_, rows))) => rows,
            Ok(None) => continue,
            Err(err) => {
                errors.push(err.to_string());
                continue;
            }
        };
        let Some(file) = manifest.file(kind) else {
            continue;
        };

        for (line, record) in rows {
            let schema_kind = match kind {
                PkgFileKind::Entities => match record_str(&record, "type") {
                    Some(t) => SchemaKind::Entity(t.to_string()),
                    None => {
                        errors.push(format!("{file}:{line}: Entity type must be specified"));
                        continue;
                    }
                },
                PkgFileKind::Sources => SchemaKind::Source,
                _ => SchemaKind::Edge,
            };
            let version = record_str(&record, "schema_version").unwrap_or(DEFAULT_SCHEMA_VERSION);
            if let Err(err) = validator.validate(&Value::Object(record.clone()), &schema_kind, version)
            {
                errors.push(format!("{file}:{line}: {}", err.detailed()));
            }
        }
    }
}
