//! Archive writers.
//!
//! Both writers take a list of `(source path, entry name)` pairs and stream
//! them into an already-open destination file. Entry names always use `/`
//! separators.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::{Builder, HeaderMode};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::PackageError;

/// A file or directory to place in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
  pub source: PathBuf,
  pub name: String,
  pub is_dir: bool,
}

/// Write a gzip-compressed tarball.
///
/// Headers are written in deterministic mode: no owners or timestamps, and
/// permissions normalized to 0644/0755 based on the executable bit.
pub fn write_tar_gz(dest: &mut File, entries: &[ArchiveEntry]) -> Result<(), PackageError> {
  let encoder = GzEncoder::new(BufWriter::new(dest), Compression::default());
  let mut builder = Builder::new(encoder);
  builder.mode(HeaderMode::Deterministic);

  for entry in entries {
    let result = if entry.is_dir {
      builder.append_dir(&entry.name, &entry.source)
    } else {
      builder.append_path_with_name(&entry.source, &entry.name)
    };
    result.map_err(|e| archive_io(&entry.source, e))?;
  }

  let encoder = builder.into_inner().map_err(|e| archive_io(Path::new("tar"), e))?;
  let mut writer = encoder.finish().map_err(|e| archive_io(Path::new("gzip"), e))?;
  writer.flush().map_err(|e| archive_io(Path::new("gzip"), e))?;
  Ok(())
}

/// Write a deflate-compressed zip container.
pub fn write_zip(dest: &mut File, entries: &[ArchiveEntry]) -> Result<(), PackageError> {
  let mut zip = ZipWriter::new(dest);

  for entry in entries {
    let meta = fs::metadata(&entry.source).map_err(|e| archive_io(&entry.source, e))?;
    let options = SimpleFileOptions::default()
      .compression_method(CompressionMethod::Deflated)
      .unix_permissions(entry_mode(&entry.name, &meta));

    if entry.is_dir {
      zip.add_directory(entry.name.as_str(), options)?;
      continue;
    }

    zip.start_file(entry.name.as_str(), options)?;
    let mut file = File::open(&entry.source).map_err(|e| archive_io(&entry.source, e))?;
    io::copy(&mut file, &mut zip).map_err(|e| archive_io(&entry.source, e))?;
  }

  zip.finish()?;
  Ok(())
}

#[cfg(unix)]
fn entry_mode(_name: &str, meta: &fs::Metadata) -> u32 {
  use std::os::unix::fs::PermissionsExt;
  meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn entry_mode(name: &str, meta: &fs::Metadata) -> u32 {
  if meta.is_dir() || name.ends_with(".exe") { 0o755 } else { 0o644 }
}

fn archive_io(path: &Path, source: io::Error) -> PackageError {
  PackageError::Archive {
    path: path.to_path_buf(),
    source,
  }
}
