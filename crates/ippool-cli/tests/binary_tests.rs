//! Exit status and stdout contract of the `ippool` binary

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn ippool(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ippool"))
        .current_dir(dir.path())
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .args(args)
        .output()
        .expect("binary runs")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf-8 stdout")
}

fn create_pool(dir: &TempDir, state: &Path) {
    let output = ippool(
        dir,
        &["create-pool", "--state-file", state.to_str().unwrap(), "--pool", "10.0.0.0/24"],
    );
    assert!(output.status.success());
}

#[test]
fn test_success_prints_reservation_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("pool.json");
    create_pool(&dir, &state);

    let output = ippool(
        &dir,
        &["reserve-size", "--state-file", state.to_str().unwrap(), "--size", "4", "--key", "k"],
    );
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "reserved: 10.0.0.0/28\n");
}

#[test]
fn test_business_failure_exits_one_with_message_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("pool.json");
    create_pool(&dir, &state);

    let output = ippool(
        &dir,
        &["reserve-size", "--state-file", state.to_str().unwrap(), "--size", "9", "--key", "k"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "requested size is too big\n");
}

#[test]
fn test_usage_errors_exit_one_with_message_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("pool.json");
    create_pool(&dir, &state);
    let file = state.to_str().unwrap();

    let cases: [(&[&str], &str); 3] = [
        (&["reserve-size", "--state-file", file, "--size", "abc", "--key", "k"], "abc"),
        (&["reserve-size", "--state-file", file, "--size", "4"], "--key"),
        (
            &["reserve-vnet", "--state-file", file, "--key", "hub", "--size", "4", "--ip", "10.0.0.0/28"],
            "--ip",
        ),
    ];
    for (args, mentioned) in cases {
        let output = ippool(&dir, args);
        assert_eq!(output.status.code(), Some(1), "{args:?}");
        let printed = stdout(&output);
        assert!(printed.contains("error:"), "{args:?}: {printed}");
        assert!(printed.contains(mentioned), "{args:?}: {printed}");
    }
}

#[test]
fn test_help_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = ippool(&dir, &["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("reserve-size"));
}
