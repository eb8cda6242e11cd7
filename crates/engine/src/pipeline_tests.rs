// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support;
use allci_adapters::FakeProcessAdapter;
use allci_core::{ComponentSpec, SPAWN_FAILED_EXIT_CODE};
use tempfile::TempDir;
use yare::parameterized;

/// Docker subcommands in call order, skipping membership probes.
fn docker_steps(adapter: &FakeProcessAdapter) -> Vec<String> {
    adapter
        .calls()
        .into_iter()
        .filter(|c| c.program == "docker" && c.args[0] != "ps")
        .map(|c| match c.args[0].as_str() {
            "network" => format!("network {}", c.args[1]),
            other => other.to_string(),
        })
        .collect()
}

#[parameterized(
    bootstrap = { "bootstrap", &[ActionKind::BuildImage, ActionKind::PushImage, ActionKind::RunImage] },
    test = { "test", &[ActionKind::PullImage, ActionKind::RunImage] },
    deploy = { "deploy", &[ActionKind::PullImage, ActionKind::RunImage] },
)]
fn stages_by_task_stage(stage: &str, expected: &[ActionKind]) {
    assert_eq!(stages_for(&Task::new(1, stage)), expected);
}

#[tokio::test]
async fn bootstrap_builds_pushes_then_runs() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    test_support::mirror_creates(&adapter);
    test_support::clone_creates(&adapter, &[("Dockerfile", "FROM scratch\n")]);
    let task = Task::new(42, "bootstrap").with_component("web", test_support::build_spec("web:1"));
    let config = Arc::new(test_support::config(dir.path()));

    let outcome = run_task(adapter.clone(), config, task).await;

    assert!(outcome.success);
    assert_eq!(docker_steps(&adapter), vec!["network create", "build", "push", "run", "network rm"]);
}

#[tokio::test]
async fn normal_stage_pulls_then_runs() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    adapter.on("docker", &["inspect"], |r| r.exit_code(1));
    adapter.on("docker", &["run"], |r| r.output("done\n"));
    let task = Task::new(42, "test").with_component("web", ComponentSpec::new("web:1"));
    let config = Arc::new(test_support::config(dir.path()));

    let outcome = run_task(adapter.clone(), config, task).await;

    assert!(outcome.success);
    assert_eq!(
        docker_steps(&adapter),
        vec!["network create", "inspect", "pull", "run", "network rm"]
    );
    // The run stage's outcome, which carries the whole append-only log.
    assert!(outcome.output["web"].contains("Pulling web:1"));
    assert!(outcome.output["web"].contains("done"));
}

#[tokio::test]
async fn failed_stage_short_circuits_but_removes_the_pod() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    adapter.on("docker", &["inspect"], |r| r.exit_code(1));
    adapter.on("docker", &["pull"], |r| r.exit_code(1).output("manifest unknown\n"));
    let task = Task::new(42, "test")
        .with_component("web", ComponentSpec::new("web:1"))
        .with_component("db", ComponentSpec::new("postgres:16"));
    let config = Arc::new(test_support::config(dir.path()));

    let outcome = run_task(adapter.clone(), config, task).await;

    assert!(!outcome.success);
    assert_eq!(outcome.len(), 2);
    assert!(outcome.output["web"].contains("manifest unknown"));
    let steps = docker_steps(&adapter);
    assert!(!steps.contains(&"run".to_string()));
    assert_eq!(steps.last().map(String::as_str), Some("network rm"));
}

#[tokio::test]
async fn unusable_build_root_fails_every_component() {
    let dir = TempDir::new().unwrap();
    // A regular file where the build root directory should be.
    std::fs::write(dir.path().join("build"), "not a directory").unwrap();
    let adapter = FakeProcessAdapter::default();
    let task = Task::new(42, "test")
        .with_component("web", ComponentSpec::new("web:1"))
        .with_component("db", ComponentSpec::new("postgres:16"));
    let config = Arc::new(test_support::config(dir.path()));

    let outcome = run_task(adapter.clone(), config, task).await;

    assert!(!outcome.success);
    assert_eq!(outcome.len(), 2);
    assert_eq!(outcome.exit_code["web"], SPAWN_FAILED_EXIT_CODE);
    assert!(outcome.output["db"].contains("failed to reset build directory"));
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn empty_task_succeeds() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    let config = Arc::new(test_support::config(dir.path()));

    let outcome = run_task(adapter.clone(), config, Task::new(1, "test")).await;

    assert!(outcome.success);
    assert!(outcome.is_empty());
    assert_eq!(docker_steps(&adapter), vec!["network create", "network rm"]);
}
