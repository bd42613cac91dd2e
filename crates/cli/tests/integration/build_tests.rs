//! Build command integration tests.
//!
//! Each test execs a freshly written fake compiler, so they run serially to
//! keep other threads from forking while the script is open for writing.

#![cfg(unix)]

use std::io::Read;

use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

fn manifest_names(env: &TestEnv) -> Vec<String> {
  std::fs::read_to_string(env.dist().join("checksums.txt"))
    .unwrap()
    .lines()
    .map(|line| line.split_once("  ").unwrap().1.to_string())
    .collect()
}

#[test]
#[serial]
fn build_produces_archives_and_manifest() {
  let env = TestEnv::with_platforms(&["windows/amd64", "linux/amd64"]);

  env
    .build_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("atomic_windows_amd64.zip"))
    .stdout(predicate::str::contains("atomic_linux_amd64.tar.gz"))
    .stdout(predicate::str::contains("Failed: 0"));

  assert_eq!(
    manifest_names(&env),
    ["atomic_linux_amd64.tar.gz", "atomic_windows_amd64.zip"]
  );

  let zip_file = std::fs::File::open(env.dist().join("atomic_windows_amd64.zip")).unwrap();
  let mut zip = zip::ZipArchive::new(zip_file).unwrap();
  let mut binary = String::new();
  zip.by_name("atomic.exe").unwrap().read_to_string(&mut binary).unwrap();
  assert_eq!(binary, "binary for windows/amd64");
  assert!(zip.by_name("LICENSE.txt").is_ok());

  assert!(!env.project.join("temp").exists());
}

#[test]
#[serial]
fn failed_platform_exits_nonzero_after_manifest() {
  let env = TestEnv::with_platforms(&["linux/amd64", "plan9/386", "darwin/arm64"]);

  env
    .build_cmd()
    .env("FAKE_GO_FAIL_OS", "plan9")
    .assert()
    .failure()
    .stdout(predicate::str::contains("plan9/386: compiler failure"))
    .stdout(predicate::str::contains("unsupported GOOS/GOARCH pair"))
    .stdout(predicate::str::contains("Failed: 1"));

  assert_eq!(
    manifest_names(&env),
    ["atomic_darwin_arm64.tar.gz", "atomic_linux_amd64.tar.gz"]
  );
  assert!(!env.project.join("temp").exists());
}

#[test]
#[serial]
fn json_output_reports_every_job() {
  let env = TestEnv::with_platforms(&["linux/amd64", "plan9/386"]);

  let output = env
    .build_cmd()
    .args(["-o", "json"])
    .env("FAKE_GO_FAIL_OS", "plan9")
    .output()
    .unwrap();
  assert!(!output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["app_name"], "atomic");
  assert_eq!(report["version"], "1.0.0");
  assert_eq!(report["jobs"][0]["platform"], "linux/amd64");
  assert_eq!(report["jobs"][0]["outcome"], "success");
  assert_eq!(report["jobs"][1]["platform"], "plan9/386");
  assert_eq!(report["jobs"][1]["outcome"], "compiler_failure");
}

#[test]
#[serial]
fn platform_flag_restricts_the_run() {
  let env = TestEnv::with_platforms(&["linux/amd64", "darwin/arm64", "windows/386"]);

  env
    .build_cmd()
    .args(["--platform", "darwin/arm64", "-j", "1"])
    .assert()
    .success();

  assert_eq!(manifest_names(&env), ["atomic_darwin_arm64.tar.gz"]);
}

#[test]
#[serial]
fn unknown_platform_flag_fails_before_building() {
  let env = TestEnv::with_platforms(&["linux/amd64"]);

  env
    .build_cmd()
    .args(["--platform", "freebsd/amd64"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not part of the release config"));

  assert!(!env.dist().exists());
}

#[test]
#[serial]
fn format_runs_once_before_building() {
  let env = TestEnv::empty();
  env.write_config(&serde_json::json!({
    "app_name": "atomic",
    "strip_binaries": false,
    "verbose": true,
    "format_code": true,
    "platforms": ["linux/amd64", "linux/arm64"],
    "pandoc_conversion": false,
  }));

  env.build_cmd().assert().success();

  let log = std::fs::read_to_string(env.project.join("fmt.log")).unwrap();
  assert_eq!(log, "fmt ./...\n");
}

#[test]
#[serial]
fn custom_dist_dir_is_used() {
  let env = TestEnv::with_platforms(&["linux/amd64"]);
  let dist = env.temp.path().join("out");

  env.build_cmd().arg("--dist-dir").arg(&dist).assert().success();

  assert!(dist.join("atomic_linux_amd64.tar.gz").is_file());
  assert!(dist.join("checksums.txt").is_file());
  assert!(!env.dist().exists());
}

#[test]
#[serial]
fn relative_config_resolves_against_project_root() {
  let env = TestEnv::with_platforms(&["linux/amd64"]);
  let configs = env.project.join("configs");
  std::fs::create_dir_all(&configs).unwrap();
  std::fs::rename(env.project.join("release.config.json"), configs.join("alt.json")).unwrap();

  env
    .build_cmd()
    .current_dir(env.temp.path())
    .args(["--config", "configs/alt.json"])
    .assert()
    .success();

  assert!(env.dist().join("atomic_linux_amd64.tar.gz").is_file());
}

#[test]
#[serial]
fn foreign_work_dir_is_refused() {
  let env = TestEnv::with_platforms(&["linux/amd64"]);
  let scratch = env.temp.path().join("scratch");
  std::fs::create_dir_all(&scratch).unwrap();
  std::fs::write(scratch.join("notes.txt"), "keep me").unwrap();

  env
    .build_cmd()
    .arg("--work-dir")
    .arg(&scratch)
    .assert()
    .failure()
    .stderr(predicate::str::contains("refusing to delete it"));

  assert!(scratch.join("notes.txt").is_file());
}
