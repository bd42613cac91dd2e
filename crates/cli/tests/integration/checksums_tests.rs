//! Checksums and verify command integration tests.
//!
//! Serial with the build tests: every `TestEnv` writes an executable script.

use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

fn dist_with_archives(env: &TestEnv) -> std::path::PathBuf {
  let dist = env.temp.path().join("dist");
  std::fs::create_dir_all(&dist).unwrap();
  std::fs::write(dist.join("atomic_linux_amd64.tar.gz"), "linux").unwrap();
  std::fs::write(dist.join("atomic_windows_amd64.zip"), "windows").unwrap();
  dist
}

#[test]
#[serial]
fn checksums_then_verify_succeeds() {
  let env = TestEnv::empty();
  let dist = dist_with_archives(&env);

  env
    .distbuild_cmd()
    .arg("checksums")
    .arg(&dist)
    .assert()
    .success()
    .stdout(predicate::str::contains("2 artifact(s)"));

  env
    .distbuild_cmd()
    .arg("verify")
    .arg(&dist)
    .assert()
    .success()
    .stdout(predicate::str::contains("Mismatched: 0"));
}

#[test]
#[serial]
fn verify_detects_tampering() {
  let env = TestEnv::empty();
  let dist = dist_with_archives(&env);

  env.distbuild_cmd().arg("checksums").arg(&dist).assert().success();
  std::fs::write(dist.join("atomic_linux_amd64.tar.gz"), "tampered").unwrap();

  env
    .distbuild_cmd()
    .arg("verify")
    .arg(&dist)
    .assert()
    .failure()
    .stdout(predicate::str::contains("atomic_linux_amd64.tar.gz: expected"))
    .stdout(predicate::str::contains("Mismatched: 1"));
}

#[test]
#[serial]
fn verify_reports_missing_archive_as_json() {
  let env = TestEnv::empty();
  let dist = dist_with_archives(&env);

  env.distbuild_cmd().arg("checksums").arg(&dist).assert().success();
  std::fs::remove_file(dist.join("atomic_windows_amd64.zip")).unwrap();

  let output = env
    .distbuild_cmd()
    .args(["verify", "-o", "json"])
    .arg(&dist)
    .output()
    .unwrap();
  assert!(!output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["missing"][0], "atomic_windows_amd64.zip");
  assert_eq!(report["matched"][0], "atomic_linux_amd64.tar.gz");
}
