//! Types for platform job execution.
//!
//! This module defines the per-job state machine, the job result record, and
//! the configuration for running jobs.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::platform::PlatformSpec;

/// Lifecycle of a single platform job.
///
/// `Pending → Compiling → Packaging → Succeeded`, or `Failed` from either
/// working state. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
  Pending,
  Compiling,
  Packaging,
  Succeeded,
  Failed(JobOutcome),
}

impl JobState {
  pub fn is_terminal(self) -> bool {
    matches!(self, JobState::Succeeded | JobState::Failed(_))
  }

  /// Whether `self → next` is a legal transition.
  pub fn can_transition_to(self, next: JobState) -> bool {
    matches!(
      (self, next),
      (JobState::Pending, JobState::Compiling)
        | (JobState::Pending, JobState::Failed(JobOutcome::UnexpectedFailure))
        | (JobState::Compiling, JobState::Packaging)
        | (JobState::Compiling, JobState::Failed(_))
        | (JobState::Packaging, JobState::Succeeded)
        | (JobState::Packaging, JobState::Failed(_))
    )
  }
}

impl fmt::Display for JobState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      JobState::Pending => f.write_str("pending"),
      JobState::Compiling => f.write_str("compiling"),
      JobState::Packaging => f.write_str("packaging"),
      JobState::Succeeded => f.write_str("succeeded"),
      JobState::Failed(outcome) => write!(f, "failed ({})", outcome),
    }
  }
}

/// How a platform job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
  Success,
  /// The compiler could not be launched, exited non-zero, or produced no executable.
  CompilerFailure,
  /// Copying shared files or writing the archive failed.
  PackagingFailure,
  /// Anything else, including a panicking job.
  UnexpectedFailure,
}

impl JobOutcome {
  pub fn is_success(self) -> bool {
    self == JobOutcome::Success
  }
}

impl fmt::Display for JobOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      JobOutcome::Success => "success",
      JobOutcome::CompilerFailure => "compiler failure",
      JobOutcome::PackagingFailure => "packaging failure",
      JobOutcome::UnexpectedFailure => "unexpected failure",
    };
    f.write_str(s)
  }
}

/// Result of one platform job. Produced exactly once per platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResult {
  pub platform: PlatformSpec,
  pub outcome: JobOutcome,
  /// Failure diagnostics; `None` on success.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  /// The archive written for this platform, on success.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub archive: Option<PathBuf>,
}

impl JobResult {
  pub fn success(platform: PlatformSpec, archive: PathBuf) -> Self {
    Self {
      platform,
      outcome: JobOutcome::Success,
      message: None,
      archive: Some(archive),
    }
  }

  pub fn failure(platform: PlatformSpec, outcome: JobOutcome, message: impl Into<String>) -> Self {
    Self {
      platform,
      outcome,
      message: Some(message.into()),
      archive: None,
    }
  }

  pub fn is_success(&self) -> bool {
    self.outcome.is_success()
  }
}

/// Configuration for job execution.
#[derive(Debug, Clone, Default)]
pub struct ExecuteConfig {
  /// Upper bound on concurrently running jobs. `None` uses the available
  /// parallelism of the machine.
  pub parallelism: Option<usize>,
}

impl ExecuteConfig {
  /// Number of workers for `job_count` jobs: `min(job_count, limit)`, at least 1.
  pub fn effective_parallelism(&self, job_count: usize) -> usize {
    let limit = self.parallelism.unwrap_or_else(num_cpus);
    limit.min(job_count).max(1)
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn legal_transitions() {
    use JobState::*;
    assert!(Pending.can_transition_to(Compiling));
    assert!(Compiling.can_transition_to(Packaging));
    assert!(Compiling.can_transition_to(Failed(JobOutcome::CompilerFailure)));
    assert!(Packaging.can_transition_to(Succeeded));
    assert!(Packaging.can_transition_to(Failed(JobOutcome::PackagingFailure)));

    assert!(!Pending.can_transition_to(Packaging));
    assert!(!Compiling.can_transition_to(Succeeded));
    assert!(!Succeeded.can_transition_to(Compiling));
    assert!(!Failed(JobOutcome::CompilerFailure).can_transition_to(Packaging));
  }

  #[test]
  fn terminal_states() {
    assert!(JobState::Succeeded.is_terminal());
    assert!(JobState::Failed(JobOutcome::UnexpectedFailure).is_terminal());
    assert!(!JobState::Packaging.is_terminal());
  }

  #[test]
  fn job_result_constructors() {
    let ok = JobResult::success(PlatformSpec::new("linux", "amd64"), PathBuf::from("dist/a.tar.gz"));
    assert!(ok.is_success());
    assert!(ok.message.is_none());

    let failed = JobResult::failure(
      PlatformSpec::new("plan9", "386"),
      JobOutcome::CompilerFailure,
      "unsupported",
    );
    assert!(!failed.is_success());
    assert_eq!(failed.message.as_deref(), Some("unsupported"));
    assert!(failed.archive.is_none());
  }

  #[test]
  fn job_result_json_shape() {
    let failed = JobResult::failure(
      PlatformSpec::new("plan9", "386"),
      JobOutcome::PackagingFailure,
      "disk full",
    );
    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["platform"], "plan9/386");
    assert_eq!(json["outcome"], "packaging_failure");
    assert_eq!(json["message"], "disk full");
    assert!(json.get("archive").is_none());
  }

  #[test]
  fn effective_parallelism_is_bounded() {
    let config = ExecuteConfig { parallelism: Some(8) };
    assert_eq!(config.effective_parallelism(3), 3);
    assert_eq!(config.effective_parallelism(20), 8);
    assert_eq!(config.effective_parallelism(0), 1);

    let zero = ExecuteConfig { parallelism: Some(0) };
    assert_eq!(zero.effective_parallelism(5), 1);

    let default = ExecuteConfig::default();
    assert!(default.effective_parallelism(2) >= 1);
    assert!(default.effective_parallelism(2) <= 2);
  }
}
