//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Stand-in for `go`.
///
/// `build -o <path>` writes a file naming the target; targets whose `GOOS`
/// appears in `$FAKE_GO_FAIL_OS` fail with a diagnostic instead. `fmt`
/// appends its arguments to `fmt.log` in the working directory.
const FAKE_GO: &str = r#"#!/bin/sh
if [ "$1" = "fmt" ]; then
  echo "$*" >> fmt.log
  exit 0
fi
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
case " $FAKE_GO_FAIL_OS " in
  *" $GOOS "*)
    echo "cmd/go: unsupported GOOS/GOARCH pair $GOOS/$GOARCH" >&2
    exit 2 ;;
esac
printf 'binary for %s/%s' "$GOOS" "$GOARCH" > "$out"
"#;

/// Isolated project with a fake toolchain.
///
/// Layout: `<temp>/project` holds the sources and config, `<temp>/bin` the
/// fake compiler.
pub struct TestEnv {
  pub temp: TempDir,
  pub project: PathBuf,
  pub compiler: PathBuf,
}

impl TestEnv {
  /// A project targeting `platforms`, with formatting and pandoc disabled.
  pub fn with_platforms(platforms: &[&str]) -> Self {
    let env = Self::empty();
    env.write_config(&serde_json::json!({
      "app_name": "atomic",
      "strip_binaries": true,
      "verbose": false,
      "format_code": false,
      "platforms": platforms,
      "pandoc_conversion": false,
      "version": "1.0.0",
    }));
    env
  }

  /// A project with sources but no config.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(project.join("main.go"), "package main\n").unwrap();
    std::fs::write(project.join("README.md"), "# atomic\n").unwrap();
    std::fs::write(project.join("LICENSE.txt"), "MIT\n").unwrap();

    let compiler = temp.path().join("bin").join("fake-go");
    write_executable(&compiler, FAKE_GO);

    Self { temp, project, compiler }
  }

  pub fn write_config(&self, config: &serde_json::Value) {
    std::fs::write(self.project.join("release.config.json"), config.to_string()).unwrap();
  }

  pub fn dist(&self) -> PathBuf {
    self.project.join("dist")
  }

  /// `distbuild build` against this project with the fake compiler.
  pub fn build_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("distbuild");
    cmd
      .arg("build")
      .arg("--project-root")
      .arg(&self.project)
      .arg("--compiler")
      .arg(&self.compiler)
      .env_remove("RUST_LOG")
      .env_remove("FAKE_GO_FAIL_OS");
    cmd
  }

  pub fn distbuild_cmd(&self) -> Command {
    cargo_bin_cmd!("distbuild")
  }
}

fn write_executable(path: &Path, content: &str) {
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(path, content).unwrap();

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
  }
}
