// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs::OpenOptions;
use tempfile::TempDir;

fn sh(script: &str) -> Invocation {
    Invocation::new("sh").arg("-c").arg(script)
}

#[test]
fn display_quotes_arguments_with_spaces() {
    let inv = Invocation::new("docker").args(["run", "--env", "A=b c", ""]);
    assert_eq!(inv.to_string(), r#"docker run --env "A=b c" """#);
}

#[test]
fn matches_program_and_prefix() {
    let inv = Invocation::new("git").args(["clone", "--mirror", "uri", "dest"]);
    assert!(inv.matches("git", &["clone", "--mirror"]));
    assert!(inv.matches("git", &[]));
    assert!(!inv.matches("git", &["clone", "--branch"]));
    assert!(!inv.matches("docker", &["clone"]));
}

#[tokio::test]
async fn run_appends_both_streams_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.log");
    std::fs::write(&path, "existing\n").unwrap();
    let file = OpenOptions::new().append(true).open(&path).unwrap();

    let code = LocalProcessAdapter
        .run(&sh("echo to-stdout; echo to-stderr >&2; exit 3"), Sink::File(file))
        .await
        .unwrap();

    assert_eq!(code, 3);
    let log = std::fs::read_to_string(&path).unwrap();
    assert!(log.starts_with("existing\n"));
    assert!(log.contains("to-stdout"));
    assert!(log.contains("to-stderr"));
}

#[tokio::test]
async fn run_honours_working_directory() {
    let dir = TempDir::new().unwrap();
    let code = LocalProcessAdapter
        .run(&sh("test -f marker").current_dir(dir.path()), Sink::Null)
        .await
        .unwrap();
    assert_ne!(code, 0);

    std::fs::write(dir.path().join("marker"), "").unwrap();
    let code = LocalProcessAdapter
        .run(&sh("test -f marker").current_dir(dir.path()), Sink::Null)
        .await
        .unwrap();
    assert_eq!(code, 0);
}

#[tokio::test]
async fn capture_returns_stdout() {
    let captured = LocalProcessAdapter.capture(&sh("printf 'a\\nb\\n'")).await.unwrap();
    assert!(captured.success());
    assert_eq!(captured.stdout, "a\nb\n");
}

#[tokio::test]
async fn missing_program_is_spawn_error() {
    let err = LocalProcessAdapter
        .run(&Invocation::new("allci-definitely-not-a-program"), Sink::Null)
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::SpawnFailed { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn killed_process_reports_signal_exit_code() {
    let code = LocalProcessAdapter.run(&sh("kill -9 $$"), Sink::Null).await.unwrap();
    assert_eq!(code, 137);
}
