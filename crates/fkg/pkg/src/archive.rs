//! Zip transport for PKG directories.

use crate::error::{PkgError, PkgResult};
use fkg_types::MANIFEST_FILE;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Zip the contents of `pkg_dir` (files at the archive root, `signatures/`
/// included). Returns the number of files written. `zip_path` may sit
/// inside `pkg_dir`; the archive never includes itself.
pub fn pack_pkg(pkg_dir: &Path, zip_path: &Path) -> PkgResult<u64> {
    let mut zip = ZipWriter::new(File::create(zip_path)?);
    let own_path = std::fs::canonicalize(zip_path)?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut files = 0;

    for entry in WalkDir::new(pkg_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| PkgError::Archive(e.to_string()))?;
        let path = entry.path();
        if entry.file_type().is_file() && std::fs::canonicalize(path)? == own_path {
            continue;
        }
        let rel = path
            .strip_prefix(pkg_dir)
            .map_err(|e| PkgError::Archive(e.to_string()))?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
        } else {
            zip.start_file(name, options)?;
            std::io::copy(&mut File::open(path)?, &mut zip)?;
            files += 1;
        }
    }

    zip.finish()?;
    debug!(dir = %pkg_dir.display(), zip = %zip_path.display(), files, "packed pkg");
    Ok(files)
}

/// Extract a PKG archive into `dest` and return the PKG root.
///
/// Entries that would land outside `dest` abort the extraction. When the
/// archive wraps the PKG in a single top-level directory, that directory is
/// the root.
pub fn unpack_pkg(zip_path: &Path, dest: &Path) -> PkgResult<PathBuf> {
    let mut archive = ZipArchive::new(File::open(zip_path)?)?;
    std::fs::create_dir_all(dest)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(rel) = entry.enclosed_name() else {
            return Err(PkgError::Archive(format!(
                "entry escapes the archive root: {}",
                entry.name()
            )));
        };
        let out = dest.join(rel);

        if entry.is_dir() {
            std::fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::io::copy(&mut entry, &mut File::create(&out)?)?;
    }

    let root = pkg_root(dest)?;
    debug!(zip = %zip_path.display(), root = %root.display(), "unpacked pkg");
    Ok(root)
}

fn pkg_root(dest: &Path) -> PkgResult<PathBuf> {
    if dest.join(MANIFEST_FILE).is_file() {
        return Ok(dest.to_path_buf());
    }
    let entries = std::fs::read_dir(dest)?.collect::<Result<Vec<_>, _>>()?;
    if let [only] = entries.as_slice() {
        let candidate = only.path();
        if candidate.is_dir() && candidate.join(MANIFEST_FILE).is_file() {
            return Ok(candidate);
        }
    }
    Ok(dest.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_pkg(dir: &Path) {
        std::fs::write(dir.join(MANIFEST_FILE), "{}").unwrap();
        std::fs::write(dir.join("entities.jsonl"), "{\"id\":\"a\"}\n").unwrap();
        std::fs::create_dir_all(dir.join("signatures")).unwrap();
        std::fs::write(dir.join("signatures").join("manifest.sig"), "sig").unwrap();
    }

    #[test]
    fn pack_then_unpack_keeps_layout() {
        let src = tempfile::tempdir().unwrap();
        sample_pkg(src.path());
        let work = tempfile::tempdir().unwrap();
        let zip_path = work.path().join("pkg.zip");

        assert_eq!(pack_pkg(src.path(), &zip_path).unwrap(), 3);

        let dest = work.path().join("out");
        let root = unpack_pkg(&zip_path, &dest).unwrap();
        assert_eq!(root, dest);
        assert_eq!(
            std::fs::read_to_string(root.join("entities.jsonl")).unwrap(),
            "{\"id\":\"a\"}\n"
        );
        assert!(root.join("signatures").join("manifest.sig").is_file());
    }

    #[test]
    fn archive_inside_the_pkg_skips_itself() {
        let src = tempfile::tempdir().unwrap();
        sample_pkg(src.path());
        let zip_path = src.path().join(".").join("signatures").join("..").join("pkg.zip");

        assert_eq!(pack_pkg(src.path(), &zip_path).unwrap(), 3);

        let archive = ZipArchive::new(File::open(src.path().join("pkg.zip")).unwrap()).unwrap();
        assert!(archive.file_names().all(|name| name != "pkg.zip"));
    }

    #[test]
    fn single_wrapping_directory_is_the_root() {
        let work = tempfile::tempdir().unwrap();
        let zip_path = work.path().join("wrapped.zip");
        let mut zip = ZipWriter::new(File::create(&zip_path).unwrap());
        let options = SimpleFileOptions::default();
        zip.add_directory("pkg-2024/", options).unwrap();
        zip.start_file("pkg-2024/manifest.json", options).unwrap();
        zip.write_all(b"{}").unwrap();
        zip.finish().unwrap();

        let dest = work.path().join("out");
        let root = unpack_pkg(&zip_path, &dest).unwrap();
        assert_eq!(root, dest.join("pkg-2024"));
    }

    #[test]
    fn traversal_entries_are_rejected() {
        let work = tempfile::tempdir().unwrap();
        let zip_path = work.path().join("evil.zip");
        let mut zip = ZipWriter::new(File::create(&zip_path).unwrap());
        zip.start_file("../escaped.txt", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"gotcha").unwrap();
        zip.finish().unwrap();

        let dest = work.path().join("out");
        assert!(matches!(
            unpack_pkg(&zip_path, &dest),
            Err(PkgError::Archive(_))
        ));
        assert!(!work.path().join("escaped.txt").exists());
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let work = tempfile::tempdir().unwrap();
        let zip_path = work.path().join("junk.zip");
        std::fs::write(&zip_path, "<html>not found</html>").unwrap();
        assert!(matches!(
            unpack_pkg(&zip_path, &work.path().join("out")),
            Err(PkgError::Archive(_))
        ));
    }
}
