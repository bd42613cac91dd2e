//! Terminal rendering for release results.
//!
//! Every line shown to the user is built as plain text first (`*_line`
//! functions, easy to test) and only the status mark is colored on print.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use distbuild_lib::execute::JobResult;
use distbuild_lib::manifest::{ChecksumEntry, Mismatch};
use distbuild_lib::util::hash::ContentHash;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Mark in front of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
  Ok,
  Failed,
  Missing,
  Note,
}

impl Mark {
  fn symbol(self) -> &'static str {
    match self {
      Mark::Ok => "✓",
      Mark::Failed => "✗",
      Mark::Missing => "⚠",
      Mark::Note => "•",
    }
  }

  fn painted(self, stream: Stream) -> String {
    let symbol = self.symbol();
    match self {
      Mark::Ok => symbol.if_supports_color(stream, |s| s.green()).to_string(),
      Mark::Failed => symbol.if_supports_color(stream, |s| s.red()).to_string(),
      Mark::Missing => symbol.if_supports_color(stream, |s| s.yellow()).to_string(),
      Mark::Note => symbol.if_supports_color(stream, |s| s.blue()).to_string(),
    }
  }
}

pub fn print_marked(mark: Mark, message: &str) {
  println!("{} {}", mark.painted(Stream::Stdout), message);
}

/// Fatal errors go to stderr so JSON on stdout stays parseable.
pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    Mark::Failed.painted(Stream::Stderr),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_stat(label: &str, value: impl std::fmt::Display) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// First twelve hex digits, enough to tell digests apart by eye.
pub fn short_digest(digest: &ContentHash) -> &str {
  &digest.0[..digest.0.len().min(12)]
}

pub fn human_size(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KB", "MB", "GB"];
  if bytes < 1024 {
    return format!("{} B", bytes);
  }
  let mut value = bytes as f64 / 1024.0;
  let mut unit = 0;
  while value >= 1024.0 && unit < UNITS.len() - 1 {
    value /= 1024.0;
    unit += 1;
  }
  format!("{:.1} {}", value, UNITS[unit])
}

pub fn human_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  if secs >= 60 {
    format!("{}m {:02}s", secs / 60, secs % 60)
  } else {
    format!("{:.2}s", duration.as_secs_f64())
  }
}

/// Headline for one job: where the archive went, or why there is none.
pub fn job_line(job: &JobResult, archive_size: Option<u64>) -> String {
  match &job.archive {
    Some(archive) => match archive_size {
      Some(size) => format!("{} → {} ({})", job.platform, archive.display(), human_size(size)),
      None => format!("{} → {}", job.platform, archive.display()),
    },
    None => format!("{}: {}", job.platform, job.outcome),
  }
}

/// Print a job headline, plus the first few lines of its diagnostics on failure.
pub fn print_job(job: &JobResult) {
  if job.is_success() {
    let size = job
      .archive
      .as_deref()
      .and_then(|path| std::fs::metadata(path).ok())
      .map(|meta| meta.len());
    print_marked(Mark::Ok, &job_line(job, size));
    return;
  }

  print_marked(Mark::Failed, &job_line(job, None));
  for line in job.message.iter().flat_map(|m| m.lines()).take(5) {
    println!("    {}", line);
  }
}

pub fn checksum_line(entry: &ChecksumEntry) -> String {
  format!("{}  {}", short_digest(&entry.digest), entry.artifact_name)
}

pub fn mismatch_line(mismatch: &Mismatch) -> String {
  format!(
    "{}: expected {}, got {}",
    mismatch.artifact_name,
    short_digest(&mismatch.expected),
    short_digest(&mismatch.actual)
  )
}
