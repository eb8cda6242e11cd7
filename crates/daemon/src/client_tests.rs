// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_server;

const TASK_JSON: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 101\r\n\r\n\
{\"task_id\":17,\"build_id\":3,\"stage\":\"test\",\"task\":\"rspec\",\"components\":{\"web\":{\"image_name\":\"web:1\"}}}";

#[tokio::test]
async fn pull_decodes_a_task() {
    let (url, server) = test_server::serve(vec![TASK_JSON]).await;
    let client = ServiceClient::new(&url, "runner-1").unwrap();

    let Some(Assignment::Task(task)) = client.pull().await.unwrap() else {
        panic!("expected a task");
    };

    assert_eq!(task.task_id, TaskRef::Number(17));
    assert_eq!(task.stage, "test");
    assert_eq!(task.components["web"].image_name, "web:1");
    let received = server.await.unwrap();
    assert_eq!(received[0].request_line, "POST /tasks/pull HTTP/1.1");
    assert_eq!(received[0].json(), serde_json::json!({ "runner_name": "runner-1" }));
}

#[tokio::test]
async fn pull_no_content_is_idle() {
    let (url, _server) = test_server::serve(vec!["HTTP/1.1 204 No Content\r\n\r\n"]).await;
    let client = ServiceClient::new(&url, "runner-1").unwrap();
    assert!(client.pull().await.unwrap().is_none());
}

#[tokio::test]
async fn pull_server_error_is_reported() {
    let (url, _server) = test_server::serve(vec![
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\n\r\noops",
    ])
    .await;
    let client = ServiceClient::new(&url, "runner-1").unwrap();

    match client.pull().await {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "oops");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn pull_bad_json_is_an_error() {
    let (url, _server) =
        test_server::serve(vec!["HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n{nope"]).await;
    let client = ServiceClient::new(&url, "runner-1").unwrap();
    assert!(matches!(client.pull().await, Err(ClientError::Json(_))));
}

#[tokio::test]
async fn undecodable_task_keeps_its_id_and_components() {
    let (url, _server) = test_server::serve(vec![
        "HTTP/1.1 200 OK\r\nContent-Length: 67\r\n\r\n\
{\"task_id\":9,\"components\":{\"web\":{\"image_name\":[1]},\"db\":{}},\"x\":0}",
    ])
    .await;
    let client = ServiceClient::new(&url, "runner-1").unwrap();

    match client.pull().await.unwrap() {
        Some(Assignment::Malformed { task_id, mut components, error }) => {
            assert_eq!(task_id, TaskRef::Number(9));
            components.sort();
            assert_eq!(components, ["db", "web"]);
            assert!(!error.is_empty());
        }
        other => panic!("expected malformed assignment, got {:?}", other),
    }
}

#[tokio::test]
async fn report_routes_by_success() {
    let ok = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
    let (url, server) = test_server::serve(vec![ok, ok]).await;
    let client = ServiceClient::new(&url, "runner-1").unwrap();

    let mut passed = StageOutcome::new();
    passed.record("web", 0, "all green\n".to_string());
    client.report(&TaskRef::Number(17), &passed).await.unwrap();

    let mut failed = StageOutcome::new();
    failed.record("web", 0, String::new());
    failed.record("db", 3, "crashed\n".to_string());
    client.report(&TaskRef::from("t-18"), &failed).await.unwrap();

    let received = server.await.unwrap();
    assert_eq!(received[0].request_line, "POST /tasks/success HTTP/1.1");
    assert_eq!(
        received[0].json(),
        serde_json::json!({
            "runner_name": "runner-1",
            "task_id": 17,
            "output": { "web": "all green\n" },
            "exit_code": { "web": 0 },
        })
    );
    assert_eq!(received[1].request_line, "POST /tasks/failed HTTP/1.1");
    assert_eq!(received[1].json()["task_id"], "t-18");
    assert_eq!(received[1].json()["exit_code"]["db"], 3);
}

#[test]
fn invalid_url_is_rejected_up_front() {
    assert!(matches!(
        ServiceClient::new("ftp://ci.local", "runner-1"),
        Err(ClientError::InvalidUrl(_))
    ));
}
