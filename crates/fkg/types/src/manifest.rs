use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// PKG format version written into every manifest.
pub const PKG_FORMAT_VERSION: &str = "0.1";

/// Manifest filename at the PKG root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// The data files a PKG may carry, keyed in the manifest `files` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PkgFileKind {
    Entities,
    Edges,
    Sources,
    Changelog,
}

impl PkgFileKind {
    pub const ALL: [PkgFileKind; 4] = [
        PkgFileKind::Entities,
        PkgFileKind::Edges,
        PkgFileKind::Sources,
        PkgFileKind::Changelog,
    ];

    /// Key used in the manifest `files` map.
    pub fn key(&self) -> &'static str {
        match self {
            PkgFileKind::Entities => "entities",
            PkgFileKind::Edges => "edges",
            PkgFileKind::Sources => "sources",
            PkgFileKind::Changelog => "changelog",
        }
    }

    /// Conventional filename inside the PKG directory.
    pub fn filename(&self) -> &'static str {
        match self {
            PkgFileKind::Entities => "entities.jsonl",
            PkgFileKind::Edges => "edges.jsonl",
            PkgFileKind::Sources => "sources.jsonl",
            PkgFileKind::Changelog => "changelog.jsonl",
        }
    }
}

impl fmt::Display for PkgFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-kind record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCounts {
    pub entities: u64,
    pub edges: u64,
    pub sources: u64,
}

/// Describes one PKG instance: who produced it, what it contains, and the
/// SHA-256 of every data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub authority_id: String,
    pub authority_name: String,
    pub jurisdiction: String,
    pub created_at: DateTime<Utc>,
    pub schema_version: String,
    pub counts: ManifestCounts,
    /// kind key -> filename
    pub files: BTreeMap<String, String>,
    /// filename -> hex sha256
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
}

impl Manifest {
    /// Filename registered for a file kind, if the PKG lists it.
    pub fn file(&self, kind: PkgFileKind) -> Option<&str> {
        self.files.get(kind.key()).map(String::as_str)
    }

    pub fn has_changelog(&self) -> bool {
        self.files.contains_key(PkgFileKind::Changelog.key())
    }
}
