//! Implementation of the `distbuild checksums` command.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use distbuild_lib::consts::DIST_DIR_NAME;
use distbuild_lib::manifest::{self, ChecksumEntry};

use crate::output::{Mark, OutputFormat, checksum_line, print_json, print_marked};

#[derive(Serialize)]
struct ChecksumsOutput {
  manifest_path: PathBuf,
  entries: Vec<ChecksumEntry>,
}

/// Rewrite `checksums.txt` in `dir` from the archives currently there.
pub fn cmd_checksums(dir: Option<PathBuf>, output: OutputFormat) -> Result<ExitCode> {
  let dir = dir.unwrap_or_else(|| PathBuf::from(DIST_DIR_NAME));

  let manifest_path = manifest::generate(&dir).context("Failed to generate checksums")?;
  let text = std::fs::read_to_string(&manifest_path)
    .with_context(|| format!("Failed to read back {}", manifest_path.display()))?;
  let entries = manifest::parse(&text)?;

  if output.is_json() {
    print_json(&ChecksumsOutput { manifest_path, entries })?;
    return Ok(ExitCode::SUCCESS);
  }

  if entries.is_empty() {
    print_marked(Mark::Note, &format!("No archives found in {}", dir.display()));
  }
  for entry in &entries {
    println!("  {}", checksum_line(entry));
  }
  let summary = format!("Wrote {} ({} artifact(s))", manifest_path.display(), entries.len());
  print_marked(Mark::Ok, &summary);

  Ok(ExitCode::SUCCESS)
}
