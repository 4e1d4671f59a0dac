use crate::error::{PkgError, PkgResult};
use chrono::Utc;
use fkg_types::{
    InstanceSettings, Manifest, ManifestCounts, PkgFileKind, RecordValidator, SchemaKind,
    DEFAULT_SCHEMA_VERSION, MANIFEST_FILE, PKG_FORMAT_VERSION,
};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const CHUNK_SIZE: usize = 4096;

/// Hex SHA-256 of a file's raw bytes, read in fixed-size chunks.
pub fn compute_file_checksum(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Resolve a manifest filename inside `dir`. Only bare file names are
/// accepted; anything with a separator or `..` is rejected.
pub(crate) fn pkg_file(dir: &Path, filename: &str) -> PkgResult<PathBuf> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(dir.join(filename)),
        _ => Err(PkgError::UnsafePath(filename.to_string())),
    }
}

/// Build the manifest for the PKG files already written to `dir`.
///
/// Checksums are recorded for every listed file that exists.
pub fn create_manifest(
    instance: &InstanceSettings,
    dir: &Path,
    authority_id: &str,
    counts: ManifestCounts,
    include_changelog: bool,
) -> PkgResult<Manifest> {
    let mut files = BTreeMap::new();
    for kind in PkgFileKind::ALL {
        if kind == PkgFileKind::Changelog && !include_changelog {
            continue;
        }
        files.insert(kind.key().to_string(), kind.filename().to_string());
    }

    let mut checksums = BTreeMap::new();
    for filename in files.values() {
        let path = dir.join(filename);
        if path.is_file() {
            let checksum = compute_file_checksum(&path)?;
            debug!(file = %filename, %checksum, "checksummed pkg file");
            checksums.insert(filename.clone(), checksum);
        }
    }

    Ok(Manifest {
        version: PKG_FORMAT_VERSION.to_string(),
        authority_id: authority_id.to_string(),
        authority_name: instance.authority_name.clone(),
        jurisdiction: instance.jurisdiction.clone(),
        created_at: Utc::now(),
        schema_version: instance.schema_version.clone(),
        counts,
        files,
        checksums,
    })
}

/// Write `manifest.json` (two-space indented) and return its path.
pub fn save_manifest(manifest: &Manifest, dir: &Path) -> PkgResult<PathBuf> {
    let path = dir.join(MANIFEST_FILE);
    let text = serde_json::to_string_pretty(manifest).map_err(PkgError::ManifestParse)?;
    std::fs::write(&path, text)?;
    Ok(path)
}

/// Read `manifest.json` from `dir` and check it against the manifest schema.
pub fn load_manifest(dir: &Path, validator: &dyn RecordValidator) -> PkgResult<Manifest> {
    let path = dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Err(PkgError::ManifestMissing(path));
    }

    let text = std::fs::read_to_string(&path)?;
    let value: Value = serde_json::from_str(&text).map_err(PkgError::ManifestParse)?;
    let schema_version = value
        .get("schema_version")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_SCHEMA_VERSION)
        .to_string();

    validator
        .validate(&value, &SchemaKind::Manifest, &schema_version)
        .map_err(PkgError::Manifest)?;

    serde_json::from_value(value).map_err(PkgError::ManifestParse)
}

/// Recompute every checksum listed in the manifest.
///
/// Returns one `"{filename}: ..."` entry per problem; empty means intact.
pub fn verify_checksums(dir: &Path, manifest: &Manifest) -> PkgResult<Vec<String>> {
    let mut mismatches = Vec::new();
    for (filename, expected) in &manifest.checksums {
        let Ok(path) = pkg_file(dir, filename) else {
            mismatches.push(format!("{filename}: invalid file name"));
            continue;
        };
        if !path.is_file() {
            mismatches.push(format!("{filename}: file missing"));
            continue;
        }
        if &compute_file_checksum(&path)? != expected {
            mismatches.push(format!("{filename}: checksum mismatch"));
        }
    }
    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fkg_types::NoopValidator;

    fn instance() -> InstanceSettings {
        InstanceSettings {
            id: "county.x".into(),
            authority_name: "County X".into(),
            jurisdiction: "X County".into(),
            ..InstanceSettings::default()
        }
    }

    fn write_pkg_files(dir: &Path) {
        std::fs::write(dir.join("entities.jsonl"), "{\"id\":\"a\"}\n").unwrap();
        std::fs::write(dir.join("edges.jsonl"), "").unwrap();
        std::fs::write(dir.join("sources.jsonl"), "").unwrap();
    }

    #[test]
    fn checksum_of_known_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        std::fs::write(&path, "abc").unwrap();
        assert_eq!(
            compute_file_checksum(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn checksum_spans_chunk_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big");
        let bytes: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(
            compute_file_checksum(&path).unwrap(),
            hex::encode(Sha256::digest(&bytes))
        );
    }

    #[test]
    fn manifest_lists_files_and_checksums() {
        let dir = tempfile::tempdir().unwrap();
        write_pkg_files(dir.path());

        let manifest = create_manifest(
            &instance(),
            dir.path(),
            "county.x",
            ManifestCounts {
                entities: 1,
                edges: 0,
                sources: 0,
            },
            true,
        )
        .unwrap();

        assert_eq!(manifest.version, "0.1");
        assert_eq!(manifest.authority_name, "County X");
        assert_eq!(manifest.file(PkgFileKind::Changelog), Some("changelog.jsonl"));
        // changelog was listed but never written
        assert_eq!(manifest.checksums.len(), 3);
        assert!(!manifest.checksums.contains_key("changelog.jsonl"));
    }

    #[test]
    fn saved_manifest_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        write_pkg_files(dir.path());
        let manifest =
            create_manifest(&instance(), dir.path(), "county.x", ManifestCounts::default(), false)
                .unwrap();
        let path = save_manifest(&manifest, dir.path()).unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("\n  \"authority_id\""));

        let loaded = load_manifest(dir.path(), &NoopValidator).unwrap();
        assert_eq!(loaded, manifest);
        assert!(verify_checksums(dir.path(), &loaded).unwrap().is_empty());
    }

    #[test]
    fn load_reports_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_manifest(dir.path(), &NoopValidator).unwrap_err();
        assert!(matches!(err, PkgError::ManifestMissing(_)));
        assert!(err.to_string().starts_with("Manifest not found: "));
    }

    #[test]
    fn verify_reports_mismatch_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_pkg_files(dir.path());
        let manifest =
            create_manifest(&instance(), dir.path(), "county.x", ManifestCounts::default(), false)
                .unwrap();

        std::fs::write(dir.path().join("entities.jsonl"), "{\"id\":\"b\"}\n").unwrap();
        std::fs::remove_file(dir.path().join("edges.jsonl")).unwrap();

        assert_eq!(
            verify_checksums(dir.path(), &manifest).unwrap(),
            vec!["edges.jsonl: file missing", "entities.jsonl: checksum mismatch"]
        );
    }

    #[test]
    fn path_escapes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(pkg_file(dir.path(), "entities.jsonl").is_ok());
        assert!(pkg_file(dir.path(), "../secrets").is_err());
        assert!(pkg_file(dir.path(), "/etc/passwd").is_err());
        assert!(pkg_file(dir.path(), "a/b.jsonl").is_err());

        let mut manifest =
            create_manifest(&instance(), dir.path(), "county.x", ManifestCounts::default(), false)
                .unwrap();
        manifest
            .checksums
            .insert("../outside".into(), "00".repeat(32));
        assert_eq!(
            verify_checksums(dir.path(), &manifest).unwrap(),
            vec!["../outside: invalid file name"]
        );
    }
}
