//! Checksum manifest generation and verification.
//!
//! The manifest lists every top-level artifact in the output directory as
//! `"{sha256}  {filename}"`, one per line, so `sha256sum -c` and package
//! manager generators can consume it directly.

mod types;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::consts::CHECKSUMS_FILENAME;
use crate::util::hash::{ContentHash, hash_file};

pub use types::*;

/// Hash every artifact in `output_dir` and write `checksums.txt` there.
///
/// Any prior manifest is replaced atomically. If a single artifact cannot be
/// read the whole generation fails: a manifest silently missing an entry is
/// worse for downstream verification than no manifest at all.
pub fn generate(output_dir: &Path) -> Result<PathBuf, ManifestError> {
  let entries = compute_entries(output_dir)?;
  let manifest_path = output_dir.join(CHECKSUMS_FILENAME);

  let write_err = |source| ManifestError::Write {
    path: manifest_path.clone(),
    source,
  };

  let mut tmp = NamedTempFile::new_in(output_dir).map_err(write_err)?;
  tmp.write_all(render(&entries).as_bytes()).map_err(write_err)?;
  tmp.as_file().sync_all().map_err(write_err)?;
  tmp.persist(&manifest_path).map_err(|e| write_err(e.error))?;

  info!(
    path = %manifest_path.display(),
    artifacts = entries.len(),
    "checksum manifest written"
  );
  Ok(manifest_path)
}

/// Digest every artifact in `output_dir`, sorted by file name.
pub fn compute_entries(output_dir: &Path) -> Result<Vec<ChecksumEntry>, ManifestError> {
  artifacts(output_dir)?
    .into_iter()
    .map(|(name, path)| -> Result<ChecksumEntry, ManifestError> {
      let digest = hash_file(&path)?;
      debug!(artifact = %name, digest = %digest, "hashed artifact");
      Ok(ChecksumEntry {
        digest,
        artifact_name: name,
      })
    })
    .collect()
}

/// Top-level regular files of `output_dir` that count as artifacts, with
/// their full paths.
///
/// The manifest itself and dot-files (in-flight temporary archives) are
/// skipped, as are subdirectories. A name that is not valid UTF-8 cannot be
/// written to the manifest and fails the scan.
fn artifacts(output_dir: &Path) -> Result<Vec<(String, PathBuf)>, ManifestError> {
  let read_err = |source| ManifestError::ReadDir {
    path: output_dir.to_path_buf(),
    source,
  };

  let mut found = Vec::new();
  for entry in fs::read_dir(output_dir).map_err(read_err)? {
    let entry = entry.map_err(read_err)?;
    let path = entry.path();
    let Ok(name) = entry.file_name().into_string() else {
      return Err(ManifestError::NonUtf8Name(path));
    };

    if name == CHECKSUMS_FILENAME || name.starts_with('.') {
      continue;
    }
    if !entry.file_type().map_err(read_err)?.is_file() {
      debug!(entry = %name, "skipping non-file entry");
      continue;
    }
    found.push((name, path));
  }

  found.sort_by(|a, b| a.0.cmp(&b.0));
  Ok(found)
}

/// Render entries in manifest format, each line newline-terminated.
pub fn render(entries: &[ChecksumEntry]) -> String {
  entries.iter().map(|e| format!("{}\n", e)).collect()
}

/// Parse manifest text.
///
/// Accepts the two-space text form and the `" *"` binary-mode marker
/// written by some `sha256sum` implementations. Blank lines are ignored.
pub fn parse(text: &str) -> Result<Vec<ChecksumEntry>, ManifestError> {
  let mut entries = Vec::new();

  for (idx, line) in text.lines().enumerate() {
    if line.trim().is_empty() {
      continue;
    }

    let malformed = || ManifestError::Parse {
      line: idx + 1,
      content: line.to_string(),
    };

    let (digest, name) = line
      .split_once("  ")
      .or_else(|| line.split_once(" *"))
      .ok_or_else(malformed)?;

    if !ContentHash::is_valid_hex(digest) || !is_plain_file_name(name) {
      return Err(malformed());
    }

    entries.push(ChecksumEntry {
      digest: ContentHash(digest.to_string()),
      artifact_name: name.to_string(),
    });
  }

  Ok(entries)
}

/// Manifest entries name files directly inside the output directory.
fn is_plain_file_name(name: &str) -> bool {
  !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Check the manifest in `output_dir` against the artifacts next to it.
pub fn verify(output_dir: &Path) -> Result<VerifyReport, ManifestError> {
  let manifest_path = output_dir.join(CHECKSUMS_FILENAME);
  let text = fs::read_to_string(&manifest_path).map_err(|source| ManifestError::Read {
    path: manifest_path.clone(),
    source,
  })?;

  let mut report = VerifyReport::default();
  for entry in parse(&text)? {
    let path = output_dir.join(&entry.artifact_name);
    let actual = match hash_file(&path) {
      Ok(actual) => actual,
      Err(e) if e.source.kind() == std::io::ErrorKind::NotFound => {
        warn!(artifact = %entry.artifact_name, "artifact listed in manifest is missing");
        report.missing.push(entry.artifact_name);
        continue;
      }
      Err(e) => return Err(e.into()),
    };

    if actual == entry.digest {
      report.matched.push(entry.artifact_name);
    } else {
      warn!(artifact = %entry.artifact_name, "checksum mismatch");
      report.mismatched.push(Mismatch {
        artifact_name: entry.artifact_name,
        expected: entry.digest,
        actual,
      });
    }
  }

  Ok(report)
}
