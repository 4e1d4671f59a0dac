//! Provenance scoring.
//!
//! Confidence is the mean of the evidence confidences plus a small bonus for
//! corroboration by different kinds of source. There is no recency decay.

use crate::traits::GraphReader;
use crate::StorageResult;
use chrono::{DateTime, Utc};
use fkg_types::{Evidence, Source};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One evidence link together with the source it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvidence {
    pub evidence_id: String,
    pub source_id: String,
    /// `None` when the source record has since been removed
    pub source: Option<Source>,
    pub confidence: f64,
    pub extracted_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Everything known about where an entity came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProvenance {
    pub entity_id: String,
    pub source_count: usize,
    pub average_confidence: Option<f64>,
    pub sources: Vec<SourceEvidence>,
}

/// Aggregate confidence for a set of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceScore {
    pub confidence: f64,
    pub source_count: usize,
    pub source_types: Vec<String>,
}

/// Collect the evidence for `entity_id` and resolve each source.
pub async fn entity_provenance<R>(reader: &R, entity_id: &str) -> StorageResult<EntityProvenance>
where
    R: GraphReader + ?Sized,
{
    let evidence = reader.evidence_for_entity(entity_id).await?;

    let mut sources = Vec::with_capacity(evidence.len());
    for ev in evidence {
        let source = reader.get_source(&ev.source_id).await?;
        sources.push(SourceEvidence::from((ev, source)));
    }

    let average_confidence = if sources.is_empty() {
        None
    } else {
        Some(sources.iter().map(|s| s.confidence).sum::<f64>() / sources.len() as f64)
    };

    Ok(EntityProvenance {
        entity_id: entity_id.to_string(),
        source_count: sources.len(),
        average_confidence,
        sources,
    })
}

/// Mean confidence plus `min(0.1, (distinct source types - 1) * 0.05)`,
/// capped at 1.0 and rounded to three decimals.
pub fn calculate_confidence(evidence: &[SourceEvidence]) -> ProvenanceScore {
    if evidence.is_empty() {
        return ProvenanceScore {
            confidence: 0.0,
            source_count: 0,
            source_types: Vec::new(),
        };
    }

    let average = evidence.iter().map(|e| e.confidence).sum::<f64>() / evidence.len() as f64;

    let source_types: BTreeSet<String> = evidence
        .iter()
        .filter_map(|e| e.source.as_ref()?.source_type().map(str::to_string))
        .collect();

    let bonus = if source_types.len() > 1 {
        f64::min(0.1, (source_types.len() - 1) as f64 * 0.05)
    } else {
        0.0
    };

    ProvenanceScore {
        confidence: round3(f64::min(1.0, average + bonus)),
        source_count: evidence.len(),
        source_types: source_types.into_iter().collect(),
    }
}

/// Reliability weight of a source type.
pub fn source_weight(source_type: &str) -> f64 {
    match source_type {
        "api" | "dataset" => 0.9,
        "manual" => 0.8,
        "url" | "file" => 0.7,
        _ => 0.5,
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

impl From<(Evidence, Option<Source>)> for SourceEvidence {
    fn from((ev, source): (Evidence, Option<Source>)) -> Self {
        Self {
            evidence_id: ev.id,
            source_id: ev.source_id,
            source,
            confidence: ev.confidence,
            extracted_at: ev.extracted_at,
            notes: ev.notes,
        }
    }
}
