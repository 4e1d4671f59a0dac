//! Graph summary and instance identity

use crate::app::App;
use crate::output::{print_single, OutputFormat};
use fkg_storage::{EdgeFilter, EntityFilter, GraphReader, QueryWindow, SourceFilter};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct GraphStats {
    instance: String,
    entities: u64,
    entities_by_type: BTreeMap<String, u64>,
    entities_by_authority: BTreeMap<String, u64>,
    edges: u64,
    sources: u64,
    latest_seq: Option<u64>,
}

pub async fn stats(app: &App, format: OutputFormat) -> anyhow::Result<()> {
    let store = &app.store;
    let entities = store
        .list_entities(&EntityFilter::default(), QueryWindow::default())
        .await?;

    let mut stats = GraphStats {
        instance: app.settings.instance.id.clone(),
        entities: entities.len() as u64,
        entities_by_type: BTreeMap::new(),
        entities_by_authority: BTreeMap::new(),
        edges: store.count_edges(&EdgeFilter::default()).await?,
        sources: store.count_sources(&SourceFilter::default()).await?,
        latest_seq: store.latest_seq().await?,
    };
    for entity in &entities {
        *stats
            .entities_by_type
            .entry(entity.entity_type.clone())
            .or_default() += 1;
        *stats
            .entities_by_authority
            .entry(entity.authority_id.clone())
            .or_default() += 1;
    }

    match format {
        OutputFormat::Json => print_single(&stats)?,
        OutputFormat::Table => {
            println!("Instance:  {}", stats.instance);
            println!("Entities:  {}", stats.entities);
            for (entity_type, count) in &stats.entities_by_type {
                println!("  {entity_type:<14} {count}");
            }
            println!("Edges:     {}", stats.edges);
            println!("Sources:   {}", stats.sources);
            println!("Authorities:");
            for (authority, count) in &stats.entities_by_authority {
                println!("  {authority:<14} {count}");
            }
            match stats.latest_seq {
                Some(seq) => println!("Changelog: seq {seq}"),
                None => println!("Changelog: empty"),
            }
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct Identity<'a> {
    id: &'a str,
    authority_name: &'a str,
    jurisdiction: &'a str,
    schema_version: &'a str,
    public_key: Option<&'a str>,
    entity_types: Vec<String>,
    remotes: Vec<(&'a str, &'a str)>,
}

pub fn whoami(app: &App, format: OutputFormat) -> anyhow::Result<()> {
    let instance = &app.settings.instance;
    let identity = Identity {
        id: &instance.id,
        authority_name: &instance.authority_name,
        jurisdiction: &instance.jurisdiction,
        schema_version: &instance.schema_version,
        public_key: instance.public_key.as_deref(),
        entity_types: app.entity_types.clone(),
        remotes: app
            .settings
            .federation
            .remotes
            .iter()
            .map(|r| (r.id.as_str(), r.endpoint.as_str()))
            .collect(),
    };

    match format {
        OutputFormat::Json => print_single(&identity)?,
        OutputFormat::Table => {
            println!("ID:             {}", identity.id);
            println!("Authority name: {}", identity.authority_name);
            println!("Jurisdiction:   {}", identity.jurisdiction);
            println!("Schema version: {}", identity.schema_version);
            println!(
                "Public key:     {}",
                identity.public_key.unwrap_or("not configured")
            );
            println!("Entity types:   {}", identity.entity_types.join(", "));
            if identity.remotes.is_empty() {
                println!("Remotes:        none");
            }
            for (id, endpoint) in &identity.remotes {
                println!("Remote:         {id} ({endpoint})");
            }
        }
    }
    Ok(())
}
