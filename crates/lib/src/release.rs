//! End-to-end release run.
//!
//! [`release`] drives one run from a loaded config to a checksum manifest:
//!
//! 1. Acquire a fresh work directory and ensure the output directory exists
//! 2. Run the formatter once, if enabled
//! 3. Prepare shared documentation once, if enabled
//! 4. Build and package every platform under bounded parallelism
//! 5. Write the checksum manifest over whatever archives were produced
//! 6. Remove the work directory
//!
//! Job failures never abort the run; they are reported in [`ReleaseReport`].
//! Errors before step 4 abort it with no jobs started.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{BuildConfig, ConfigError};
use crate::docs::{DocConverter, prepare_shared_files};
use crate::execute::{BuildOrchestrator, CompileError, ExecuteConfig, JobContext, JobResult, Toolchain};
use crate::manifest::{self, ManifestError};
use crate::package::Packager;
use crate::platform::PlatformSpec;
use crate::workspace::{Workspace, WorkspaceError, WorkspacePaths};

#[derive(Debug, Error)]
pub enum ReleaseError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Workspace(#[from] WorkspaceError),

  #[error("code formatting failed: {0}")]
  Prebuild(#[source] CompileError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),
}

/// How and where to run a release.
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
  pub paths: WorkspacePaths,
  pub toolchain: Toolchain,
  pub converter: DocConverter,
  pub execute: ExecuteConfig,
  /// Build only these platforms. Empty means every configured platform.
  pub only: Vec<PlatformSpec>,
}

impl ReleaseOptions {
  pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
    Self {
      paths: WorkspacePaths::for_project(project_root),
      toolchain: Toolchain::default(),
      converter: DocConverter::default(),
      execute: ExecuteConfig::default(),
      only: Vec::new(),
    }
  }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseReport {
  pub app_name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  /// One result per platform, in config order.
  pub jobs: Vec<JobResult>,
  pub manifest_path: PathBuf,
  #[serde(rename = "duration_secs", serialize_with = "as_secs")]
  pub duration: Duration,
}

impl ReleaseReport {
  pub fn failed(&self) -> impl Iterator<Item = &JobResult> {
    self.jobs.iter().filter(|r| !r.is_success())
  }

  pub fn is_success(&self) -> bool {
    self.failed().next().is_none()
  }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_f64(duration.as_secs_f64())
}

/// Run a full release for `config`.
pub async fn release(config: BuildConfig, options: &ReleaseOptions) -> Result<ReleaseReport, ReleaseError> {
  let started = Instant::now();
  let config = config.restrict_to(&options.only)?;
  info!(
    app = %config.app_name,
    platforms = config.platforms.len(),
    "starting release"
  );

  // Dropping the guard on any early return cleans the work directory.
  let workspace = Workspace::acquire(options.paths.clone())?;

  if config.format_code {
    options
      .toolchain
      .format(workspace.project_root())
      .await
      .map_err(ReleaseError::Prebuild)?;
  }

  let shared = prepare_shared_files(
    workspace.project_root(),
    workspace.work_dir(),
    config.doc_conversion_enabled,
    &options.converter,
  )
  .await;

  let ctx = JobContext {
    packager: Packager::new(&config.app_name, workspace.dist_dir()),
    toolchain: options.toolchain.clone(),
    shared,
    project_root: workspace.project_root().to_path_buf(),
    work_dir: workspace.work_dir().to_path_buf(),
    config: Arc::new(config),
  };
  let app_name = ctx.config.app_name.clone();
  let version = ctx.config.version.clone();

  let jobs = BuildOrchestrator::new(ctx, &options.execute).run().await;

  let dist_dir = workspace.dist_dir().to_path_buf();
  let manifest_path = tokio::task::spawn_blocking(move || manifest::generate(&dist_dir))
    .await
    .unwrap_or_else(|e| {
      Err(ManifestError::Write {
        path: options.paths.dist_dir.clone(),
        source: std::io::Error::other(e),
      })
    })?;

  if let Err(e) = workspace.release() {
    warn!(error = %e, "failed to clean up work directory");
  }

  let report = ReleaseReport {
    app_name,
    version,
    jobs,
    manifest_path,
    duration: started.elapsed(),
  };

  let failed = report.failed().count();
  info!(
    succeeded = report.jobs.len() - failed,
    failed,
    elapsed = ?report.duration,
    "release complete"
  );

  Ok(report)
}
