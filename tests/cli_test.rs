//! Host Adapter CLI Tests
//!
//! Drives the compiled binary: the JSON result record on stdout, exit codes,
//! the invalid-`state` fatal path, check mode, and clap-level parameter
//! validation.

use assert_cmd::Command;
use predicates::prelude::*;

fn ferry() -> Command {
    Command::cargo_bin("s3-ferry").unwrap()
}

fn with_required_args(cmd: &mut Command) -> &mut Command {
    cmd.args([
        "--endpoint_url",
        "127.0.0.1:9000",
        "--ak",
        "test-access",
        "--sk",
        "test-secret",
        "--src",
        "/tmp/a.bin",
        "--dest",
        "bucketA/dir/a.bin",
    ])
}

#[test]
fn test_invalid_state_fails_with_the_fatal_message() {
    let mut cmd = ferry();
    with_required_args(&mut cmd)
        .args(["--state", "sideways"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains(
            "invalid state sideways: only upload or download is supported",
        ))
        .stdout(predicate::str::contains("\"changed\":false"));
}

#[test]
fn test_result_record_echoes_src_and_dest_verbatim() {
    let mut cmd = ferry();
    with_required_args(&mut cmd)
        .args(["--state", "nope"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"src\":\"/tmp/a.bin\""))
        .stdout(predicate::str::contains("\"dest\":\"bucketA/dir/a.bin\""));
}

#[test]
fn test_missing_required_parameter_is_a_usage_error() {
    ferry()
        .args(["--endpoint_url", "127.0.0.1:9000"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_check_mode_reports_no_change_and_exits_zero() {
    let mut cmd = ferry();
    with_required_args(&mut cmd)
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"changed\":false"))
        .stdout(predicate::str::contains("\"msg\":\"\""))
        .stdout(predicate::str::contains("\"src\":\"/tmp/a.bin\""));
}

#[test]
fn test_zero_chunk_size_is_rejected_at_the_boundary() {
    let mut cmd = ferry();
    with_required_args(&mut cmd)
        .args(["--bs", "0"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_zero_concurrency_is_rejected_at_the_boundary() {
    let mut cmd = ferry();
    with_required_args(&mut cmd)
        .args(["--concurrency", "0"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_bad_remote_path_fails_without_reaching_the_network() {
    let mut cmd = ferry();
    ferry_bad_dest(&mut cmd)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("bucket name is empty"));
}

fn ferry_bad_dest(cmd: &mut Command) -> &mut Command {
    cmd.args([
        "--endpoint_url",
        "127.0.0.1:9000",
        "--ak",
        "test-access",
        "--sk",
        "test-secret",
        "--src",
        "/tmp/a.bin",
        "--dest",
        "/leading-slash",
    ])
}

#[test]
fn test_logs_stay_off_stdout() {
    let mut cmd = ferry();
    with_required_args(&mut cmd)
        .args(["--state", "sideways", "--log-level", "debug"])
        .assert()
        .failure()
        // stdout is exactly one JSON record
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("Starting s3-ferry").not());
}
