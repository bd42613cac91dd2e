//! Test utilities for distbuild-lib.
//!
//! Provides a stand-in for the Go toolchain: a small POSIX shell script that
//! honours the `build -o <path>` and `fmt ./...` subcommands and writes a
//! fake executable whose content names the target from `GOOS`/`GOARCH`.

use std::path::Path;

use crate::execute::Toolchain;

/// Behaviour of the fake compiler script.
#[derive(Debug, Clone, Default)]
pub struct FakeCompiler {
  /// Exit with status 2 and a diagnostic when `GOOS` equals this value.
  pub fail_os: Option<String>,
  /// Exit successfully without writing the executable.
  pub skip_output: bool,
  /// Make `fmt` fail.
  pub fail_fmt: bool,
  /// Append `start`/`end` lines to `runs.log` around a short sleep, so
  /// overlapping builds can be counted afterwards.
  pub trace_runs: bool,
}

impl FakeCompiler {
  pub fn script(&self) -> String {
    let fail_os = self.fail_os.as_deref().unwrap_or("");
    let write_output = if self.skip_output {
      ":"
    } else {
      r#"printf 'binary for %s/%s' "$GOOS" "$GOARCH" > "$out""#
    };
    let fmt_status = if self.fail_fmt { 1 } else { 0 };
    let (trace_start, trace_end) = if self.trace_runs {
      ("echo start >> runs.log; sleep 0.2", "echo end >> runs.log")
    } else {
      (":", ":")
    };

    format!(
      r#"#!/bin/sh
if [ "$1" = "fmt" ]; then
  echo "$*" >> fmt.log
  if [ {fmt_status} -ne 0 ]; then echo "fmt: syntax error" >&2; fi
  exit {fmt_status}
fi
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
if [ -n "{fail_os}" ] && [ "$GOOS" = "{fail_os}" ]; then
  echo "cmd/go: unsupported GOOS/GOARCH pair $GOOS/$GOARCH" >&2
  exit 2
fi
{trace_start}
{write_output}
{trace_end}
"#
    )
  }
}

/// Write the fake compiler into `dir` and return a toolchain running it via `/bin/sh`.
///
/// Running the script through the shell rather than exec'ing it directly
/// avoids `ETXTBSY` when other test threads fork while the file is being written.
pub fn fake_toolchain(dir: &Path, fake: &FakeCompiler) -> Toolchain {
  let script = dir.join("fake-go.sh");
  std::fs::write(&script, fake.script()).unwrap();
  Toolchain::new("/bin/sh").with_prefix_args([script.to_string_lossy().into_owned()])
}
