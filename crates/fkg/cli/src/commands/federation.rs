//! Federation commands

use crate::app::App;
use crate::output::{print_output, print_single, OutputFormat};
use anyhow::bail;
use clap::Args;
use fkg_federation::{FederationPuller, PullOutcome, RemoteRegistry};
use fkg_types::Settings;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

#[derive(Args)]
pub struct PullArgs {
    /// Remote id to pull
    #[arg(conflicts_with = "all")]
    pub remote: Option<String>,

    /// Pull every configured remote
    #[arg(long)]
    pub all: bool,

    /// Require a signature check regardless of trust policy
    #[arg(long)]
    pub verify_signatures: bool,

    /// Skip the signature check regardless of trust policy
    #[arg(long, conflicts_with = "verify_signatures")]
    pub skip_signatures: bool,
}

impl PullArgs {
    fn signature_override(&self) -> Option<bool> {
        match (self.verify_signatures, self.skip_signatures) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Table row for pull results
#[derive(Debug, Serialize, Tabled)]
struct PullRow {
    remote: String,
    status: String,
    entities: u64,
    edges: u64,
    sources: u64,
    skipped: u64,
    error: String,
}

impl PullRow {
    fn new(remote: String, outcome: &PullOutcome) -> Self {
        let stats = outcome.stats.clone().unwrap_or_default();
        Self {
            remote,
            status: if outcome.success { "ok" } else { "failed" }.to_string(),
            entities: stats.entities,
            edges: stats.edges,
            sources: stats.sources,
            skipped: stats.skipped,
            error: outcome.error.clone().unwrap_or_default(),
        }
    }
}

/// Table row for remote display
#[derive(Debug, Serialize, Tabled)]
struct RemoteRow {
    id: String,
    endpoint: String,
    verify_signatures: bool,
    allowed_types: String,
}

pub async fn pull(app: &App, args: PullArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut registry = RemoteRegistry::from_settings(&app.settings.federation);
    let puller = FederationPuller::new(app.pkg_context(), &app.settings.federation)?;
    let signatures = args.signature_override();

    let outcomes: BTreeMap<String, PullOutcome> = match (&args.remote, args.all) {
        (Some(id), _) => {
            let remote = registry.require(id)?;
            let result = puller.pull_remote(&app.store, remote, signatures).await;
            BTreeMap::from([(id.clone(), PullOutcome::from(result))])
        }
        (None, true) => {
            if let Some(verify) = signatures {
                for mut remote in registry.list().to_vec() {
                    remote.trust.verify_signatures = verify;
                    registry.add(remote);
                }
            }
            puller.pull_all_remotes(&app.store, &registry).await
        }
        (None, false) => bail!("name a remote to pull or pass --all"),
    };

    let failed = outcomes.values().filter(|o| !o.success).count();
    match format {
        OutputFormat::Json => print_single(&outcomes)?,
        OutputFormat::Table => print_output(
            outcomes
                .iter()
                .map(|(id, outcome)| PullRow::new(id.clone(), outcome))
                .collect(),
            format,
        )?,
    }

    if failed > 0 {
        bail!("{failed} of {} remote pull(s) failed", outcomes.len());
    }
    Ok(())
}

pub fn remotes(settings: &Settings, format: OutputFormat) -> anyhow::Result<()> {
    let registry = RemoteRegistry::from_settings(&settings.federation);
    let rows = registry
        .list()
        .iter()
        .map(|r| RemoteRow {
            id: r.id.clone(),
            endpoint: r.endpoint.clone(),
            verify_signatures: r.trust.verify_signatures,
            allowed_types: r.trust.allow_entity_types.join(", "),
        })
        .collect();
    print_output(rows, format)
}
