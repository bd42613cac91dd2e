//! Implementation of the `distbuild verify` command.
//!
//! Recomputes each digest listed in `checksums.txt` and compares it with the
//! recorded one. Exits non-zero on any mismatch or missing archive.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};

use distbuild_lib::consts::DIST_DIR_NAME;
use distbuild_lib::manifest::{self, VerifyReport};

use crate::output::{Mark, OutputFormat, mismatch_line, print_json, print_marked, print_stat};

pub fn cmd_verify(dir: Option<PathBuf>, output: OutputFormat) -> Result<ExitCode> {
  let dir = dir.unwrap_or_else(|| PathBuf::from(DIST_DIR_NAME));
  let report = manifest::verify(&dir).context("Verification failed")?;

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_verify_report(&report);
  }

  Ok(if report.is_ok() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}

fn print_verify_report(report: &VerifyReport) {
  for name in &report.matched {
    print_marked(Mark::Ok, name);
  }
  for mismatch in &report.mismatched {
    print_marked(Mark::Failed, &mismatch_line(mismatch));
  }
  for name in &report.missing {
    print_marked(Mark::Missing, &format!("{}: missing", name));
  }

  println!();
  print_stat("OK", report.matched.len());
  print_stat("Mismatched", report.mismatched.len());
  print_stat("Missing", report.missing.len());
}
