use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const MB: u64 = 1024 * 1024;
const DAY: Duration = Duration::from_secs(86400);

fn make_file(path: &Path, size: u64, age: Duration) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(path).unwrap();
    file.set_len(size).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

/// A binary invocation with an isolated home directory
fn reclaim(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("reclaim").unwrap();
    cmd.env("HOME", home.path())
        .env("USERPROFILE", home.path())
        .env_remove("RUST_LOG");
    cmd
}

/// data/cache/old.bin is stale (low risk), data/docs/new.bin is not
fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    make_file(&dir.path().join("cache/old.bin"), 11 * MB, 10 * DAY);
    make_file(&dir.path().join("docs/new.bin"), 11 * MB, 3 * DAY);
    make_file(&dir.path().join("docs/small.bin"), MB, 10 * DAY);
    dir
}

#[test]
fn test_help() {
    let home = TempDir::new().unwrap();
    reclaim(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("clean"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    reclaim(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reclaim"));
}

#[test]
fn test_scan_json() {
    let home = TempDir::new().unwrap();
    let data = data_dir();
    let output = reclaim(&home)
        .args(["scan", "--threshold-mb", "10", "--format", "json", "--root"])
        .arg(data.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_bytes"].as_u64(), Some(22 * MB));
    assert_eq!(json["total_count"].as_u64(), Some(2));
    assert_eq!(json["files"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(json["cancelled"].as_bool(), Some(false));
}

#[test]
fn test_scan_reports_unavailable_root() {
    let home = TempDir::new().unwrap();
    let data = data_dir();
    let missing = data.path().join("nowhere");
    reclaim(&home)
        .args(["scan", "--json", "--root"])
        .arg(&missing)
        .arg("--root")
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("root_failures"))
        .stdout(predicate::str::contains("nowhere"))
        .stdout(predicate::str::contains("old.bin"));
}

#[test]
fn test_scan_human_output() {
    let home = TempDir::new().unwrap();
    let data = data_dir();
    reclaim(&home)
        .args(["scan", "--no-color", "--detailed", "--threshold-mb", "10", "--root"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Scan Results"))
        .stdout(predicate::str::contains("Low Risk"))
        .stdout(predicate::str::contains("old.bin"));
}

#[test]
fn test_clean_deletes_low_risk_files() {
    let home = TempDir::new().unwrap();
    let data = data_dir();
    reclaim(&home)
        .args(["clean", "--yes", "--quiet", "--threshold-mb", "10", "--root"])
        .arg(data.path())
        .assert()
        .success();

    assert!(!data.path().join("cache/old.bin").exists());
    assert!(data.path().join("docs/new.bin").exists());
    assert!(data.path().join("docs/small.bin").exists());
}

#[test]
fn test_clean_prompt_does_not_pollute_json() {
    let home = TempDir::new().unwrap();
    let data = data_dir();
    let output = reclaim(&home)
        .args(["clean", "--json", "--threshold-mb", "10", "--root"])
        .arg(data.path())
        .write_stdin("y\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["deleted_count"].as_u64(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[y/N]"));
    assert!(!data.path().join("cache/old.bin").exists());
}

#[test]
fn test_clean_declined_prompt_keeps_files() {
    let home = TempDir::new().unwrap();
    let data = data_dir();
    reclaim(&home)
        .args(["clean", "--quiet", "--threshold-mb", "10", "--root"])
        .arg(data.path())
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(data.path().join("cache/old.bin").exists());
}

#[test]
fn test_clean_dry_run_keeps_files() {
    let home = TempDir::new().unwrap();
    let data = data_dir();
    reclaim(&home)
        .args(["clean", "--dry-run", "--json", "--threshold-mb", "10", "--root"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dry_run\": true"));

    assert!(data.path().join("cache/old.bin").exists());
}

#[test]
fn test_clean_over_quota_fails_without_deleting() {
    let home = TempDir::new().unwrap();
    let data = data_dir();
    reclaim(&home)
        .args(["config", "set", "trial_quota_gb", "0"])
        .assert()
        .success();

    reclaim(&home)
        .args(["clean", "--yes", "--quiet", "--threshold-mb", "10", "--root"])
        .arg(data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quota exceeded"));

    assert!(data.path().join("cache/old.bin").exists());
}

#[test]
fn test_config_set_and_show() {
    let home = TempDir::new().unwrap();
    reclaim(&home)
        .args(["config", "set", "scan_threshold_mb", "250"])
        .assert()
        .success();

    reclaim(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scan_threshold_mb = 250"));

    assert!(home.path().join(".reclaim/config.toml").exists());
}

#[test]
fn test_config_set_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    reclaim(&home)
        .args(["config", "set", "no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn test_malformed_config_is_reported() {
    let home = TempDir::new().unwrap();
    std::fs::create_dir_all(home.path().join(".reclaim")).unwrap();
    std::fs::write(home.path().join(".reclaim/config.toml"), "scan_threshold_mb = [").unwrap();

    reclaim(&home)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config error"));
}
