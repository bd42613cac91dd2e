use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::util::hash::{ContentHash, HashError};

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read output directory {path}: {source}")]
  ReadDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("artifact name {0:?} is not valid UTF-8")]
  NonUtf8Name(PathBuf),

  #[error("failed to hash artifact: {0}")]
  Hash(#[from] HashError),

  #[error("failed to write checksum manifest {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read checksum manifest {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed checksum line {line}: {content:?}")]
  Parse { line: usize, content: String },
}

/// One manifest line: an artifact and its SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumEntry {
  pub digest: ContentHash,
  pub artifact_name: String,
}

impl fmt::Display for ChecksumEntry {
  /// `sha256sum` text format: digest, two spaces, file name.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}  {}", self.digest, self.artifact_name)
  }
}

/// A manifest entry whose artifact no longer matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
  pub artifact_name: String,
  pub expected: ContentHash,
  pub actual: ContentHash,
}

/// Outcome of checking a manifest against the artifacts on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
  pub matched: Vec<String>,
  pub mismatched: Vec<Mismatch>,
  pub missing: Vec<String>,
}

impl VerifyReport {
  pub fn is_ok(&self) -> bool {
    self.mismatched.is_empty() && self.missing.is_empty()
  }
}
