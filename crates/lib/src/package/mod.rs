//! Per-platform packaging.
//!
//! The packager copies the shared documentation into a build output directory
//! and turns that directory into one archive in the output directory. Windows
//! targets get a zip container, every other OS a gzip-compressed tarball.
//!
//! Archives are written to an anonymous temporary file next to their final
//! location and renamed into place only once complete, so a failed packaging
//! step never leaves a file under the final archive name.

mod archive;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::consts::{LICENSE_ARCHIVE_NAME, README_ARCHIVE_NAME};
use crate::platform::PlatformSpec;

pub use archive::{ArchiveEntry, write_tar_gz, write_zip};

#[derive(Debug, Error)]
pub enum PackageError {
  #[error("failed to copy {from} to {to}: {source}")]
  CopyShared {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to scan build output: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("archive write failed at {path}: {source}")]
  Archive {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("failed to move archive into place at {path}: {source}")]
  Persist {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Archive container used for a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
  Zip,
  TarGz,
}

impl ArchiveFormat {
  /// Zip for Windows, gzip-compressed tar for everything else.
  pub fn for_os(os: &str) -> Self {
    if os == crate::platform::WINDOWS {
      Self::Zip
    } else {
      Self::TarGz
    }
  }

  pub fn extension(self) -> &'static str {
    match self {
      Self::Zip => "zip",
      Self::TarGz => "tar.gz",
    }
  }
}

impl fmt::Display for ArchiveFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.extension())
  }
}

/// Final archive file name for a platform, e.g. `atomic_linux_amd64.tar.gz`.
pub fn archive_name(app_name: &str, platform: &PlatformSpec) -> String {
  format!(
    "{}.{}",
    platform.artifact_stem(app_name),
    ArchiveFormat::for_os(&platform.os).extension()
  )
}

/// Documentation shipped in every archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFiles {
  /// Plain-text README, or the raw markdown when conversion was unavailable.
  pub readme: PathBuf,
  pub license: PathBuf,
}

impl SharedFiles {
  fn copies(&self) -> [(&Path, &'static str); 2] {
    [
      (self.readme.as_path(), README_ARCHIVE_NAME),
      (self.license.as_path(), LICENSE_ARCHIVE_NAME),
    ]
  }
}

/// Produces release archives into a fixed output directory.
#[derive(Debug, Clone)]
pub struct Packager {
  app_name: String,
  dist_dir: PathBuf,
}

impl Packager {
  pub fn new(app_name: impl Into<String>, dist_dir: impl Into<PathBuf>) -> Self {
    Self {
      app_name: app_name.into(),
      dist_dir: dist_dir.into(),
    }
  }

  /// Package `build_output_dir` for `platform` and return the archive path.
  pub fn package(
    &self,
    build_output_dir: &Path,
    platform: &PlatformSpec,
    shared: &SharedFiles,
  ) -> Result<PathBuf, PackageError> {
    for (from, name) in shared.copies() {
      let to = build_output_dir.join(name);
      fs::copy(from, &to).map_err(|source| PackageError::CopyShared {
        from: from.to_path_buf(),
        to: to.clone(),
        source,
      })?;
    }

    let entries = collect_entries(build_output_dir)?;
    let format = ArchiveFormat::for_os(&platform.os);
    let dest = self.dist_dir.join(archive_name(&self.app_name, platform));

    debug!(
      platform = %platform,
      format = %format,
      entries = entries.len(),
      "writing archive"
    );

    let mut tmp = NamedTempFile::new_in(&self.dist_dir).map_err(|source| PackageError::Archive {
      path: self.dist_dir.clone(),
      source,
    })?;

    match format {
      ArchiveFormat::Zip => write_zip(tmp.as_file_mut(), &entries)?,
      ArchiveFormat::TarGz => write_tar_gz(tmp.as_file_mut(), &entries)?,
    }

    tmp.as_file().sync_all().map_err(|source| PackageError::Archive {
      path: tmp.path().to_path_buf(),
      source,
    })?;

    tmp.persist(&dest).map_err(|e| PackageError::Persist {
      path: dest.clone(),
      source: e.error,
    })?;

    info!(platform = %platform, archive = %dest.display(), "archive written");
    Ok(dest)
  }
}

/// List everything under `dir` as archive entries rooted at the archive top level.
fn collect_entries(dir: &Path) -> Result<Vec<ArchiveEntry>, PackageError> {
  let mut entries = Vec::new();

  for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
    let entry = entry?;
    let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
    let name = rel
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");

    let file_type = entry.file_type();
    if !file_type.is_file() && !file_type.is_dir() {
      continue;
    }

    entries.push(ArchiveEntry {
      source: entry.path().to_path_buf(),
      name,
      is_dir: file_type.is_dir(),
    });
  }

  Ok(entries)
}
