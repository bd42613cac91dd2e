//! Implementation of the `distbuild build` command.
//!
//! Loads the release config, runs every platform job and prints a summary.
//! The process exits non-zero when any job failed, after the manifest for
//! the successful ones has been written.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use distbuild_lib::config::BuildConfig;
use distbuild_lib::consts::{CONFIG_FILENAME, DEFAULT_COMPILER};
use distbuild_lib::execute::{ExecuteConfig, Toolchain};
use distbuild_lib::platform::PlatformSpec;
use distbuild_lib::release::{ReleaseOptions, ReleaseReport, release};

use crate::output::{Mark, OutputFormat, human_duration, print_job, print_json, print_marked, print_stat};

#[derive(Debug, Args)]
pub struct BuildArgs {
  /// Release config, relative to the project root (default: release.config.json)
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  /// Project to build
  #[arg(long, default_value = ".")]
  pub project_root: PathBuf,

  /// Transient work directory (default: <project-root>/temp)
  #[arg(long)]
  pub work_dir: Option<PathBuf>,

  /// Output directory for archives (default: <project-root>/dist)
  #[arg(long)]
  pub dist_dir: Option<PathBuf>,

  /// Compiler executable
  #[arg(long, default_value = DEFAULT_COMPILER)]
  pub compiler: String,

  /// Maximum concurrent jobs (default: number of CPUs)
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// Only build these platforms, e.g. `--platform linux/amd64`
  #[arg(long = "platform", value_name = "OS/ARCH")]
  pub platforms: Vec<PlatformSpec>,
}

impl BuildArgs {
  fn options(&self, project_root: &Path) -> ReleaseOptions {
    let mut options = ReleaseOptions::for_project(project_root);
    if let Some(work_dir) = &self.work_dir {
      options.paths.work_dir = absolute(project_root, work_dir);
    }
    if let Some(dist_dir) = &self.dist_dir {
      options.paths.dist_dir = absolute(project_root, dist_dir);
    }
    options.toolchain = Toolchain::new(&self.compiler);
    options.execute = ExecuteConfig { parallelism: self.jobs };
    options.only = self.platforms.clone();
    options
  }
}

fn absolute(base: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() { path.to_path_buf() } else { base.join(path) }
}

pub fn cmd_build(args: BuildArgs, output: OutputFormat) -> Result<ExitCode> {
  let project_root = dunce::canonicalize(&args.project_root)
    .with_context(|| format!("project root {} not found", args.project_root.display()))?;

  let config_path = match &args.config {
    Some(path) => absolute(&project_root, path),
    None => project_root.join(CONFIG_FILENAME),
  };
  let config = BuildConfig::load(&config_path)?;

  let options = args.options(&project_root);
  debug!(
    project_root = %project_root.display(),
    config = %config_path.display(),
    work_dir = %options.paths.work_dir.display(),
    dist_dir = %options.paths.dist_dir.display(),
    compiler = %options.toolchain.program(),
    "resolved build paths"
  );

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(release(config, &options)).context("Release failed")?;

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_report(&report);
  }

  Ok(if report.is_success() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}

fn print_report(report: &ReleaseReport) {
  let title = match &report.version {
    Some(version) => format!("{} {}", report.app_name, version),
    None => report.app_name.clone(),
  };
  print_marked(Mark::Note, &format!("Release {}", title));
  println!();

  report.jobs.iter().for_each(print_job);

  let failed = report.failed().count();
  println!();
  print_stat("Succeeded", report.jobs.len() - failed);
  print_stat("Failed", failed);
  print_stat("Checksums", report.manifest_path.display());
  print_stat("Duration", human_duration(report.duration));
}
