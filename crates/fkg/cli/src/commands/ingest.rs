//! Bulk JSONL ingestion into the local authority.
//!
//! Unlike PKG import, a bad line is reported and skipped; the good lines are
//! committed together.

use crate::app::App;
use crate::output::{print_single, print_success, print_warning, OutputFormat};
use clap::Args;
use fkg_storage::{EdgeUpsert, EntityUpsert, GraphStore, GraphWriter};
use fkg_types::Record;
use serde::Serialize;
use serde_json::Value;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::warn;

#[derive(Args)]
pub struct IngestArgs {
    /// JSONL file of entities and edges
    pub path: PathBuf,

    /// Entity type for lines that carry none
    #[arg(short = 't', long = "type")]
    pub entity_type: Option<String>,

    /// Skip schema validation
    #[arg(long)]
    pub skip_validate: bool,
}

#[derive(Debug, Default, Serialize)]
struct IngestStats {
    entities: u64,
    edges: u64,
    errors: Vec<String>,
}

enum Line {
    Entity(Record),
    Edge(Record),
}

fn classify(text: &str, default_type: Option<&str>) -> Result<Line, String> {
    let mut record = match serde_json::from_str(text) {
        Ok(Value::Object(record)) => record,
        Ok(_) => return Err("not a JSON object".into()),
        Err(e) => return Err(format!("invalid JSON: {e}")),
    };
    if record.contains_key("src_id") && record.contains_key("dst_id") {
        return Ok(Line::Edge(record));
    }
    if !record.contains_key("type") {
        match default_type {
            Some(t) => {
                record.insert("type".into(), Value::String(t.to_string()));
            }
            None => return Err("Unknown record type".into()),
        }
    }
    Ok(Line::Entity(record))
}

pub async fn ingest(app: &App, args: IngestArgs, format: OutputFormat) -> anyhow::Result<()> {
    let authority_id = app.settings.instance.id.as_str();
    let schema_version = app.settings.instance.schema_version.as_str();
    let reader = BufReader::new(std::fs::File::open(&args.path)?);
    let mut stats = IngestStats::default();
    let mut tx = app.store.begin().await?;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let line_no = idx + 1;

        let result = match classify(text, args.entity_type.as_deref()) {
            Ok(Line::Entity(record)) => tx
                .upsert_entity(
                    EntityUpsert::new(record, authority_id)
                        .with_schema_version(schema_version)
                        .with_validation(!args.skip_validate),
                )
                .await
                .map(|_| stats.entities += 1)
                .map_err(|e| e.to_string()),
            Ok(Line::Edge(record)) => tx
                .upsert_edge(
                    EdgeUpsert::new(record, authority_id)
                        .with_schema_version(schema_version)
                        .with_validation(!args.skip_validate),
                )
                .await
                .map(|_| stats.edges += 1)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(line = line_no, error = %e, "skipping line");
            stats.errors.push(format!("line {line_no}: {e}"));
        }
    }
    tx.commit().await?;

    match format {
        OutputFormat::Json => print_single(&stats)?,
        OutputFormat::Table => {
            for error in &stats.errors {
                print_warning(error);
            }
            print_success(&format!(
                "Ingested {} entities, {} edges as {} ({} errors)",
                stats.entities,
                stats.edges,
                authority_id,
                stats.errors.len()
            ));
        }
    }
    Ok(())
}
