//! Platform job execution.
//!
//! This module provides the orchestrator that fans out one job per platform.
//! It handles:
//! - Bounded parallelism via a semaphore sized to `min(platforms, workers)`
//! - Failure isolation: a failing job never cancels or affects another
//! - A full-barrier join, with results reported in submission order

pub mod compiler;
pub mod job;
pub mod types;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{Instrument, error, info};

pub use compiler::{CompileError, CompileRequest, Toolchain};
pub use job::{JobContext, PlatformBuildJob};
pub use types::{ExecuteConfig, JobOutcome, JobResult, JobState};

/// Runs every configured platform's job under bounded parallelism.
#[derive(Debug, Clone)]
pub struct BuildOrchestrator {
  ctx: Arc<JobContext>,
  parallelism: usize,
}

impl BuildOrchestrator {
  pub fn new(ctx: JobContext, config: &ExecuteConfig) -> Self {
    let parallelism = config.effective_parallelism(ctx.config.platforms.len());
    Self {
      ctx: Arc::new(ctx),
      parallelism,
    }
  }

  pub fn parallelism(&self) -> usize {
    self.parallelism
  }

  /// Run one job per platform and wait for all of them.
  ///
  /// Returns exactly one result per configured platform, in config order,
  /// regardless of the order in which jobs finished.
  pub async fn run(&self) -> Vec<JobResult> {
    let platforms = &self.ctx.config.platforms;
    info!(
      jobs = platforms.len(),
      parallelism = self.parallelism,
      "starting platform builds"
    );

    let semaphore = Arc::new(Semaphore::new(self.parallelism));
    let mut handles = Vec::with_capacity(platforms.len());

    for platform in platforms {
      info!(platform = %platform, "dispatching build");

      let job = PlatformBuildJob::new(platform.clone(), self.ctx.clone());
      let semaphore = semaphore.clone();
      let task_platform = platform.clone();

      let task = async move {
        let result = match semaphore.acquire().await {
          Ok(_permit) => job.run().await,
          Err(e) => JobResult::failure(task_platform, JobOutcome::UnexpectedFailure, e.to_string()),
        };
        log_completion(&result);
        result
      };
      let handle = tokio::spawn(task.in_current_span());
      handles.push((platform.clone(), handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (platform, handle) in handles {
      let result = match handle.await {
        Ok(result) => result,
        Err(e) => {
          let result = JobResult::failure(platform, JobOutcome::UnexpectedFailure, format!("job panicked: {}", e));
          log_completion(&result);
          result
        }
      };
      results.push(result);
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    info!(
      succeeded = results.len() - failed,
      failed,
      "platform builds complete"
    );

    results
  }
}

fn log_completion(result: &JobResult) {
  match (&result.outcome, &result.archive) {
    (JobOutcome::Success, Some(archive)) => {
      info!(platform = %result.platform, archive = %archive.display(), "build succeeded")
    }
    _ => error!(
      platform = %result.platform,
      outcome = %result.outcome,
      error = result.message.as_deref().unwrap_or(""),
      "build failed"
    ),
  }
}
