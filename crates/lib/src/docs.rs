//! Best-effort documentation preprocessing.
//!
//! When enabled, `README.md` is converted to plain text with pandoc once per
//! run, before any job starts. Conversion is attempted exactly once; if it
//! fails for any reason the raw markdown is shipped instead.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::consts::{LICENSE_SOURCE, README_ARCHIVE_NAME, README_SOURCE};
use crate::package::SharedFiles;

/// The document converter, `pandoc` by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocConverter {
  program: String,
  prefix_args: Vec<String>,
}

impl Default for DocConverter {
  fn default() -> Self {
    Self::new("pandoc")
  }
}

impl DocConverter {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      prefix_args: Vec::new(),
    }
  }

  pub fn with_prefix_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
    self.prefix_args = args.into_iter().map(Into::into).collect();
    self
  }

  /// Convert `source` markdown to plain text at `dest`.
  pub async fn convert(&self, source: &Path, dest: &Path) -> Result<(), String> {
    let output = Command::new(&self.program)
      .args(&self.prefix_args)
      .arg("-s")
      .arg(source)
      .arg("-o")
      .arg(dest)
      .args(["--to", "plain"])
      .stdin(Stdio::null())
      .output()
      .await
      .map_err(|e| format!("failed to launch {}: {}", self.program, e))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(format!(
        "{} exited with code {:?}: {}",
        self.program,
        output.status.code(),
        stderr.trim()
      ));
    }
    if !dest.is_file() {
      return Err(format!("{} produced no output at {}", self.program, dest.display()));
    }
    Ok(())
  }
}

/// Work out which README and license every archive ships.
///
/// With `convert` set, tries once to render `<root>/README.md` into
/// `<work_dir>/README.txt`. The plain-text variant is preferred whenever it
/// exists; otherwise the raw markdown is used.
pub async fn prepare_shared_files(
  project_root: &Path,
  work_dir: &Path,
  convert: bool,
  converter: &DocConverter,
) -> SharedFiles {
  let source = project_root.join(README_SOURCE);
  let converted = work_dir.join(README_ARCHIVE_NAME);

  if convert {
    match converter.convert(&source, &converted).await {
      Ok(()) => info!(readme = %converted.display(), "converted README to plain text"),
      Err(e) => warn!(
        error = %e,
        "unable to convert README.md to plain text, shipping the raw markdown; make sure pandoc is installed"
      ),
    }
  }

  let readme = select_readme(&converted, source);
  debug!(readme = %readme.display(), "selected README");

  SharedFiles {
    readme,
    license: project_root.join(LICENSE_SOURCE),
  }
}

fn select_readme(converted: &Path, fallback: PathBuf) -> PathBuf {
  if converted.is_file() {
    converted.to_path_buf()
  } else {
    fallback
  }
}
