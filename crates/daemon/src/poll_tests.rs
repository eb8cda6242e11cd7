// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_server;
use allci_adapters::FakeProcessAdapter;
use allci_engine::RunnerIdentity;
use tempfile::TempDir;

const TASK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 101\r\n\r\n\
{\"task_id\":17,\"build_id\":3,\"stage\":\"test\",\"task\":\"rspec\",\"components\":{\"web\":{\"image_name\":\"web:1\"}}}";
const OK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
const NUMERIC_ENV_TASK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 91\r\n\r\n\
{\"task_id\":18,\"stage\":\"test\",\"components\":{\"db\":{\"image_name\":\"pg\",\"env\":{\"PGPORT\":5432}}}}";
const MALFORMED_TASK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 77\r\n\r\n\
{\"task_id\":19,\"stage\":\"test\",\"components\":{\"web\":{\"image_name\":\"w\",\"cmd\":7}}}";
const IDLE: &str = "HTTP/1.1 204 No Content\r\n\r\n";

fn poller(url: &str, dir: &TempDir, adapter: &FakeProcessAdapter) -> Poller<FakeProcessAdapter> {
    let config = EngineConfig::new(
        RunnerIdentity::new("ci", url),
        dir.path().join("build"),
        dir.path().join("cache"),
    );
    let client = ServiceClient::new(url, "ci").unwrap().with_timeout(Duration::from_secs(5));
    Poller::new(client, adapter.clone(), Arc::new(config))
        .with_intervals(Duration::from_secs(60), Duration::from_secs(60))
}

#[tokio::test]
async fn task_is_run_and_reported() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    let (url, server) = test_server::serve(vec![TASK, OK]).await;

    let outcome = poller(&url, &dir, &adapter).poll_once().await.unwrap();

    assert_eq!(outcome, PollOutcome::Ran { success: true });
    assert_eq!(adapter.calls_matching("docker", &["run"]).len(), 1);
    let received = server.await.unwrap();
    assert_eq!(received[1].request_line, "POST /tasks/success HTTP/1.1");
    let report = received[1].json();
    assert_eq!(report["runner_name"], "ci");
    assert_eq!(report["task_id"], 17);
    assert_eq!(report["exit_code"]["web"], 0);
    assert!(report["output"]["web"].as_str().unwrap().contains("already present"));
}

#[tokio::test]
async fn failed_task_is_reported_as_failed() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    adapter.on("docker", &["run"], |r| r.exit_code(3));
    let (url, server) = test_server::serve(vec![TASK, OK]).await;

    let outcome = poller(&url, &dir, &adapter).poll_once().await.unwrap();

    assert_eq!(outcome, PollOutcome::Ran { success: false });
    let received = server.await.unwrap();
    assert_eq!(received[1].request_line, "POST /tasks/failed HTTP/1.1");
    assert_eq!(received[1].json()["exit_code"]["web"], 3);
}

#[tokio::test]
async fn numeric_env_values_reach_the_container() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    let (url, server) = test_server::serve(vec![NUMERIC_ENV_TASK, OK]).await;

    let outcome = poller(&url, &dir, &adapter).poll_once().await.unwrap();

    assert_eq!(outcome, PollOutcome::Ran { success: true });
    let runs = adapter.calls_matching("docker", &["run"]);
    assert!(runs[0].args.windows(2).any(|w| w[0] == "--env" && w[1] == "PGPORT=5432"));
    assert_eq!(server.await.unwrap()[1].request_line, "POST /tasks/success HTTP/1.1");
}

#[tokio::test]
async fn undecodable_task_is_reported_as_failed() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    let (url, server) = test_server::serve(vec![MALFORMED_TASK, OK]).await;

    let outcome = poller(&url, &dir, &adapter).poll_once().await.unwrap();

    assert_eq!(outcome, PollOutcome::Ran { success: false });
    assert!(adapter.calls().is_empty());
    let received = server.await.unwrap();
    assert_eq!(received[1].request_line, "POST /tasks/failed HTTP/1.1");
    let report = received[1].json();
    assert_eq!(report["task_id"], 19);
    assert_eq!(report["exit_code"]["web"], -1);
    assert!(report["output"]["web"].as_str().unwrap().starts_with("invalid task: "));
}

#[tokio::test]
async fn idle_service_runs_nothing() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    let (url, _server) = test_server::serve(vec![IDLE]).await;

    let outcome = poller(&url, &dir, &adapter).poll_once().await.unwrap();

    assert_eq!(outcome, PollOutcome::Idle);
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn rejected_report_is_an_error() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    let (url, _server) = test_server::serve(vec![
        TASK,
        "HTTP/1.1 422 Unprocessable Entity\r\nContent-Length: 7\r\n\r\nunknown",
    ])
    .await;

    let result = poller(&url, &dir, &adapter).poll_once().await;

    assert!(matches!(result, Err(ClientError::Status { status: 422, .. })));
}

#[tokio::test]
async fn once_stops_after_a_single_poll() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    let (url, server) = test_server::serve(vec![IDLE]).await;

    tokio::time::timeout(
        Duration::from_secs(5),
        poller(&url, &dir, &adapter).run(CancellationToken::new(), true),
    )
    .await
    .unwrap();

    assert_eq!(server.await.unwrap().len(), 1);
}

#[tokio::test]
async fn repolls_immediately_after_a_task() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    let (url, server) = test_server::serve(vec![TASK, OK, IDLE]).await;
    let shutdown = CancellationToken::new();

    let poller = poller(&url, &dir, &adapter);
    let run = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { poller.run(shutdown, false).await })
    };

    // All three exchanges happen well inside the 60s idle interval.
    let received = tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
    assert_eq!(received[2].request_line, "POST /tasks/pull HTTP/1.1");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), run).await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_interrupts_the_idle_sleep() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    let (url, _server) = test_server::serve(vec![IDLE]).await;
    let shutdown = CancellationToken::new();

    let poller = poller(&url, &dir, &adapter);
    let run = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { poller.run(shutdown, false).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), run).await.unwrap().unwrap();
}

#[tokio::test]
async fn unreachable_service_backs_off_until_shutdown() {
    let dir = TempDir::new().unwrap();
    let adapter = FakeProcessAdapter::default();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let shutdown = CancellationToken::new();

    let poller = poller(&url, &dir, &adapter);
    let run = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { poller.run(shutdown, false).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!run.is_finished());
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), run).await.unwrap().unwrap();
    assert!(adapter.calls().is_empty());
}
