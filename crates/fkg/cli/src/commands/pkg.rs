//! PKG commands: export, import, validate, sign, verify

use crate::app::App;
use crate::output::{print_error, print_single, print_success, print_warning, OutputFormat};
use anyhow::bail;
use clap::Args;
use fkg_pkg::{
    export_pkg, import_pkg, pack_pkg, sign_pkg, unpack_pkg, validate_pkg, verify_pkg, Authority,
    ImportOptions,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Args)]
pub struct ExportArgs {
    /// Output directory
    pub dir: PathBuf,

    /// Authority to export (defaults to the local instance)
    #[arg(short, long)]
    pub authority: Option<String>,

    /// Leave out changelog.jsonl
    #[arg(long)]
    pub no_changelog: bool,

    /// Also zip the PKG to this file
    #[arg(long)]
    pub zip: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// PKG directory or .zip file
    pub path: PathBuf,

    /// Owning authority: "local" or a remote namespace
    #[arg(short, long, default_value = "local")]
    pub authority: String,

    /// Skip checksum verification
    #[arg(long)]
    pub no_verify: bool,

    /// Skip schema validation
    #[arg(long)]
    pub no_validate: bool,

    /// Only import entities of these types (repeatable)
    #[arg(long = "allow-type")]
    pub allow_types: Vec<String>,
}

#[derive(Args)]
pub struct PathArgs {
    /// PKG directory or .zip file
    pub path: PathBuf,
}

#[derive(Args)]
pub struct SignArgs {
    /// PKG directory
    pub dir: PathBuf,

    /// Private key
    #[arg(long)]
    pub key: Option<String>,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// PKG directory
    pub dir: PathBuf,

    /// Public key of the signing authority
    #[arg(long)]
    pub public_key: Option<String>,
}

/// A PKG ready to read. Zips are extracted into a temporary directory that
/// lives as long as this value.
struct Staged {
    _workdir: Option<TempDir>,
    root: PathBuf,
}

fn stage(path: &Path) -> anyhow::Result<Staged> {
    if path.is_file() {
        let workdir = tempfile::tempdir()?;
        let root = unpack_pkg(path, workdir.path())?;
        Ok(Staged {
            _workdir: Some(workdir),
            root,
        })
    } else {
        Ok(Staged {
            _workdir: None,
            root: path.to_path_buf(),
        })
    }
}

pub async fn export(app: &App, args: ExportArgs, format: OutputFormat) -> anyhow::Result<()> {
    let stats = export_pkg(
        &app.pkg_context(),
        &app.store,
        &args.dir,
        args.authority.as_deref(),
        !args.no_changelog,
    )
    .await?;
    if let Some(zip) = &args.zip {
        pack_pkg(&args.dir, zip)?;
    }

    match format {
        OutputFormat::Json => print_single(&stats)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Exported {} entities, {} edges, {} sources and {} events for {} to {}",
                stats.entities,
                stats.edges,
                stats.sources,
                stats.changelog,
                stats.authority_id,
                args.dir.display()
            ));
            if let Some(zip) = &args.zip {
                print_success(&format!("Packed {}", zip.display()));
            }
        }
    }
    Ok(())
}

pub async fn import(app: &App, args: ImportArgs, format: OutputFormat) -> anyhow::Result<()> {
    let staged = stage(&args.path)?;
    let options = ImportOptions {
        authority: Authority::from(args.authority.as_str()),
        verify_checksums: !args.no_verify,
        validate: !args.no_validate,
        allow_entity_types: (!args.allow_types.is_empty()).then_some(args.allow_types),
    };

    let stats = import_pkg(&app.pkg_context(), &app.store, &staged.root, &options).await?;

    match format {
        OutputFormat::Json => print_single(&stats)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Imported {} entities, {} edges, {} sources as {}",
                stats.entities, stats.edges, stats.sources, stats.authority_id
            ));
            if stats.skipped > 0 {
                print_warning(&format!("Skipped {} entities of types not allowed", stats.skipped));
            }
            if stats.dangling_edges > 0 {
                print_warning(&format!(
                    "{} edges reference entities not in the graph",
                    stats.dangling_edges
                ));
            }
        }
    }
    Ok(())
}

pub fn validate(app: &App, args: PathArgs, format: OutputFormat) -> anyhow::Result<()> {
    let staged = stage(&args.path)?;
    let report = validate_pkg(&app.pkg_context(), &staged.root);

    match format {
        OutputFormat::Json => print_single(&report)?,
        OutputFormat::Table => {
            for warning in &report.warnings {
                print_warning(warning);
            }
            for error in &report.errors {
                print_error(error);
            }
            if let (true, Some(manifest)) = (report.valid, &report.manifest) {
                print_success(&format!(
                    "PKG from {} is valid ({} entities, {} edges, {} sources)",
                    manifest.authority_id,
                    manifest.counts.entities,
                    manifest.counts.edges,
                    manifest.counts.sources
                ));
            }
        }
    }

    if !report.valid {
        bail!("PKG is invalid ({} error(s))", report.errors.len());
    }
    Ok(())
}

pub fn sign(app: &App, args: SignArgs, format: OutputFormat) -> anyhow::Result<()> {
    let info = sign_pkg(&args.dir, app.validator.as_ref(), args.key.as_deref())?;
    match format {
        OutputFormat::Json => print_single(&info)?,
        OutputFormat::Table => print_warning(&info.message),
    }
    Ok(())
}

pub fn verify(app: &App, args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let report = verify_pkg(&args.dir, app.validator.as_ref(), args.public_key.as_deref());
    match format {
        OutputFormat::Json => print_single(&report)?,
        OutputFormat::Table => {
            if let Some(warning) = &report.warning {
                print_warning(warning);
            }
            if let Some(error) = &report.error {
                print_error(error);
            }
        }
    }
    if !report.valid {
        bail!("signature check failed");
    }
    Ok(())
}
