mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::BuildArgs;
use output::{OutputFormat, print_error};

/// distbuild - cross-platform release builds with checksums
#[derive(Parser)]
#[command(name = "distbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build, package and checksum every configured platform
  Build(BuildArgs),

  /// Regenerate checksums.txt for the archives in a directory
  Checksums {
    /// Directory holding the archives (default: ./dist)
    dir: Option<PathBuf>,
  },

  /// Check archives against their checksums.txt
  Verify {
    /// Directory holding the archives and manifest (default: ./dist)
    dir: Option<PathBuf>,
  },
}

fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
  match cli.command {
    Commands::Build(args) => cmd::cmd_build(args, cli.output),
    Commands::Checksums { dir } => cmd::cmd_checksums(dir, cli.output),
    Commands::Verify { dir } => cmd::cmd_verify(dir, cli.output),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  match run(cli) {
    Ok(code) => code,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
