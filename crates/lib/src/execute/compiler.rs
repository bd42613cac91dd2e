//! Compiler toolchain invocation.
//!
//! The toolchain is an opaque subprocess. Target OS and architecture are
//! passed as `GOOS`/`GOARCH` on each spawned command only; the orchestrator's
//! own process environment is never modified, so concurrent jobs cannot see
//! each other's target.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::consts::DEFAULT_COMPILER;
use crate::platform::PlatformSpec;

#[derive(Debug, Error)]
pub enum CompileError {
  #[error("failed to launch {program}: {source}")]
  Launch {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("compiler exited with code {code:?}:\n{output}")]
  Failed { code: Option<i32>, output: String },

  #[error("compiler succeeded but produced no executable at {0}")]
  MissingOutput(PathBuf),
}

/// What to build for one platform.
#[derive(Debug, Clone)]
pub struct CompileRequest<'a> {
  pub platform: &'a PlatformSpec,
  /// Path the executable must be written to.
  pub output: &'a Path,
  pub strip: bool,
  pub verbose: bool,
}

/// The external compiler, e.g. `go`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
  program: String,
  /// Arguments placed before the subcommand (for wrappers such as `sh script`).
  prefix_args: Vec<String>,
}

impl Default for Toolchain {
  fn default() -> Self {
    Self::new(DEFAULT_COMPILER)
  }
}

impl Toolchain {
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

  pub fn program(&self) -> &str {
    &self.program
  }

  /// Arguments for `build`, without the prefix.
  pub fn build_args(request: &CompileRequest<'_>) -> Vec<String> {
    let mut args = vec![
      "build".to_string(),
      "-o".to_string(),
      request.output.to_string_lossy().into_owned(),
    ];
    if request.strip {
      args.push("-ldflags=-s -w".to_string());
    }
    if request.verbose {
      args.push("-v".to_string());
    }
    args
  }

  /// Compile the project at `project_root` for one platform.
  ///
  /// Succeeds only if the compiler exits with status 0 and the executable
  /// exists at `request.output`.
  pub async fn compile(&self, project_root: &Path, request: &CompileRequest<'_>) -> Result<(), CompileError> {
    let args = Self::build_args(request);
    info!(platform = %request.platform, "compiling");

    let mut command = self.command(project_root);
    command
      .args(&args)
      .env("GOOS", &request.platform.os)
      .env("GOARCH", &request.platform.arch);

    self.run(command).await?;

    if !request.output.is_file() {
      return Err(CompileError::MissingOutput(request.output.to_path_buf()));
    }
    Ok(())
  }

  /// Run the toolchain formatter over the whole project (`fmt ./...`).
  pub async fn format(&self, project_root: &Path) -> Result<(), CompileError> {
    info!(root = %project_root.display(), "formatting sources");
    let mut command = self.command(project_root);
    command.args(["fmt", "./..."]);
    self.run(command).await
  }

  fn command(&self, cwd: &Path) -> Command {
    let mut command = Command::new(&self.program);
    command
      .args(&self.prefix_args)
      .current_dir(cwd)
      .stdin(Stdio::null())
      .kill_on_drop(true);
    command
  }

  async fn run(&self, mut command: Command) -> Result<(), CompileError> {
    debug!(program = %self.program, "spawning toolchain");

    let output = command.output().await.map_err(|source| CompileError::Launch {
      program: self.program.clone(),
      source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
      return Err(CompileError::Failed {
        code: output.status.code(),
        output: diagnostics(&stdout, &stderr),
      });
    }

    if !stdout.trim().is_empty() {
      debug!(stdout = %stdout.trim(), "toolchain output");
    }
    if !stderr.trim().is_empty() {
      debug!(stderr = %stderr.trim(), "toolchain stderr");
    }
    Ok(())
  }
}

/// Combine captured streams into one diagnostic message, stderr first.
fn diagnostics(stdout: &str, stderr: &str) -> String {
  let parts: Vec<&str> = [stderr.trim(), stdout.trim()].into_iter().filter(|s| !s.is_empty()).collect();
  if parts.is_empty() {
    "(no output)".to_string()
  } else {
    parts.join("\n")
  }
}
