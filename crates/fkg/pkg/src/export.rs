use crate::context::PkgContext;
use crate::error::{PkgError, PkgResult};
use crate::manifest::{create_manifest, save_manifest};
use crate::sign::SIGNATURES_DIR;
use fkg_storage::GraphReader;
use fkg_types::{ManifestCounts, PkgFileKind};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// What an export wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    pub authority_id: String,
    pub entities: u64,
    pub edges: u64,
    pub sources: u64,
    pub changelog: u64,
    pub manifest: PathBuf,
}

/// Write one authority's slice of the graph as a PKG directory.
///
/// `authority_id` defaults to the local instance. Entities and edges are
/// that authority's own records ordered by id, sources are all sources ordered
/// by id, and the changelog (when included) is that authority's events in
/// `seq` order. Identical graph state therefore yields identical file bytes.
pub async fn export_pkg<R>(
    ctx: &PkgContext,
    reader: &R,
    output_dir: &Path,
    authority_id: Option<&str>,
    include_changelog: bool,
) -> PkgResult<ExportStats>
where
    R: GraphReader + ?Sized,
{
    let authority_id = authority_id.unwrap_or(&ctx.instance.id).to_string();
    std::fs::create_dir_all(output_dir)?;

    let entities = reader.entities_for_export(&authority_id).await?;
    let entity_count = write_jsonl(
        &output_dir.join(PkgFileKind::Entities.filename()),
        entities.iter().map(|e| e.to_export_record()),
    )?;

    let edges = reader.edges_for_export(&authority_id).await?;
    let edge_count = write_jsonl(
        &output_dir.join(PkgFileKind::Edges.filename()),
        edges.iter().map(|e| e.to_export_record()),
    )?;

    let sources = reader.sources_for_export().await?;
    let source_count = write_jsonl(
        &output_dir.join(PkgFileKind::Sources.filename()),
        sources.iter().map(|s| s.to_export_record()),
    )?;

    let changelog_count = if include_changelog {
        let events = reader.events_for_export(Some(&authority_id)).await?;
        write_jsonl(&output_dir.join(PkgFileKind::Changelog.filename()), events.iter())?
    } else {
        0
    };

    let counts = ManifestCounts {
        entities: entity_count,
        edges: edge_count,
        sources: source_count,
    };
    let manifest = create_manifest(
        &ctx.instance,
        output_dir,
        &authority_id,
        counts,
        include_changelog,
    )?;
    let manifest_path = save_manifest(&manifest, output_dir)?;
    std::fs::create_dir_all(output_dir.join(SIGNATURES_DIR))?;

    info!(
        authority_id = %authority_id,
        entities = entity_count,
        edges = edge_count,
        sources = source_count,
        changelog = changelog_count,
        dir = %output_dir.display(),
        "exported pkg"
    );

    Ok(ExportStats {
        authority_id,
        entities: entity_count,
        edges: edge_count,
        sources: source_count,
        changelog: changelog_count,
        manifest: manifest_path,
    })
}

fn write_jsonl<T, I>(path: &Path, rows: I) -> PkgResult<u64>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut out = BufWriter::new(File::create(path)?);
    let mut count = 0;
    for row in rows {
        serde_json::to_writer(&mut out, &row).map_err(|e| PkgError::Json {
            file: file_name(path),
            line: count as usize + 1,
            source: e,
        })?;
        out.write_all(b"\n")?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
