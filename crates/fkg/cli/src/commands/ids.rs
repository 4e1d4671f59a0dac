//! Identifier and hash commands

use crate::output::{print_single, OutputFormat};
use anyhow::{bail, Context};
use clap::Args;
use fkg_ids::{canonical_json, compute_content_hash, make_id as derive_id};
use fkg_types::Record;
use serde_json::{json, Value};
use std::io::Read;

#[derive(Args)]
pub struct MakeIdArgs {
    /// Namespace (authority id)
    #[arg(short, long)]
    pub namespace: String,

    /// Entity type
    #[arg(short = 't', long = "type")]
    pub entity_type: String,

    /// Record as JSON text, or "-" to read stdin
    pub record: String,
}

#[derive(Args)]
pub struct HashArgs {
    /// Record as JSON text, or "-" to read stdin
    pub record: String,
}

fn parse_record(arg: &str) -> anyhow::Result<Record> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        arg.to_string()
    };
    match serde_json::from_str(&text).context("record is not valid JSON")? {
        Value::Object(record) => Ok(record),
        _ => bail!("record must be a JSON object"),
    }
}

pub fn make_id(args: MakeIdArgs, format: OutputFormat) -> anyhow::Result<()> {
    let record = parse_record(&args.record)?;
    let id = derive_id(&args.namespace, &args.entity_type, &record);
    match format {
        OutputFormat::Json => print_single(&json!({ "id": id })),
        OutputFormat::Table => {
            println!("{id}");
            Ok(())
        }
    }
}

pub fn hash(args: HashArgs, format: OutputFormat) -> anyhow::Result<()> {
    let record = parse_record(&args.record)?;
    let hash = compute_content_hash(&record);
    match format {
        OutputFormat::Json => print_single(&json!({
            "hash": hash,
            "canonical": canonical_json(&record),
        })),
        OutputFormat::Table => {
            println!("{hash}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_requires_object() {
        assert!(parse_record(r#"{"name": "Acme"}"#).is_ok());
        assert!(parse_record("[1, 2]").is_err());
        assert!(parse_record("{oops").is_err());
    }
}
