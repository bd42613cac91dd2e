//! A single platform's compile-and-package job.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::config::BuildConfig;
use crate::package::{Packager, SharedFiles};
use crate::platform::PlatformSpec;

use super::compiler::{CompileRequest, Toolchain};
use super::types::{JobOutcome, JobResult, JobState};

/// Everything the jobs of one run share. Read-only once built.
#[derive(Debug, Clone)]
pub struct JobContext {
  pub config: Arc<BuildConfig>,
  pub toolchain: Toolchain,
  pub packager: Packager,
  pub shared: SharedFiles,
  /// Directory the compiler runs in.
  pub project_root: PathBuf,
  /// Parent of the per-platform job directories.
  pub work_dir: PathBuf,
}

impl JobContext {
  /// Directory owned exclusively by `platform`'s job.
  pub fn job_dir(&self, platform: &PlatformSpec) -> PathBuf {
    self.work_dir.join(platform.artifact_stem(&self.config.app_name))
  }
}

/// Compiles and packages one platform. Never retries.
#[derive(Debug)]
pub struct PlatformBuildJob {
  platform: PlatformSpec,
  ctx: Arc<JobContext>,
  state: JobState,
}

impl PlatformBuildJob {
  pub fn new(platform: PlatformSpec, ctx: Arc<JobContext>) -> Self {
    Self {
      platform,
      ctx,
      state: JobState::Pending,
    }
  }

  pub fn state(&self) -> JobState {
    self.state
  }

  /// Run the job to a terminal state.
  ///
  /// Every failure is captured into the returned result; nothing propagates.
  pub async fn run(mut self) -> JobResult {
    self.transition(JobState::Compiling);

    let job_dir = self.ctx.job_dir(&self.platform);
    if let Err(e) = tokio::fs::create_dir_all(&job_dir).await {
      return self.fail(
        JobOutcome::UnexpectedFailure,
        format!("failed to create {}: {}", job_dir.display(), e),
      );
    }

    let config = &self.ctx.config;
    let executable = job_dir.join(self.platform.executable_name(&config.app_name));
    let request = CompileRequest {
      platform: &self.platform,
      output: &executable,
      strip: config.strip_binaries,
      verbose: config.verbose,
    };

    if let Err(e) = self.ctx.toolchain.compile(&self.ctx.project_root, &request).await {
      return self.fail(JobOutcome::CompilerFailure, e.to_string());
    }

    self.transition(JobState::Packaging);

    let packager = self.ctx.packager.clone();
    let shared = self.ctx.shared.clone();
    let platform = self.platform.clone();
    let packaged = tokio::task::spawn_blocking(move || packager.package(&job_dir, &platform, &shared)).await;

    match packaged {
      Ok(Ok(archive)) => {
        self.transition(JobState::Succeeded);
        JobResult::success(self.platform, archive)
      }
      Ok(Err(e)) => self.fail(JobOutcome::PackagingFailure, e.to_string()),
      Err(e) => self.fail(JobOutcome::UnexpectedFailure, format!("packaging task failed: {}", e)),
    }
  }

  fn transition(&mut self, next: JobState) {
    debug_assert!(
      self.state.can_transition_to(next),
      "illegal job transition {} -> {}",
      self.state,
      next
    );
    debug!(platform = %self.platform, from = %self.state, to = %next, "job state");
    self.state = next;
  }

  fn fail(mut self, outcome: JobOutcome, message: String) -> JobResult {
    self.transition(JobState::Failed(outcome));
    JobResult::failure(self.platform, outcome, message)
  }
}
