// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CI service API: pull tasks, report outcomes.

use std::collections::BTreeMap;
use std::time::Duration;

use allci_core::{StageOutcome, Task, TaskRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::{self, Endpoint};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid service url {0}")]
    InvalidUrl(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("{stage} failed: {source}")]
    Io { stage: &'static str, source: std::io::Error },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub(crate) fn io(stage: &'static str, source: std::io::Error) -> Self {
        ClientError::Io { stage, source }
    }
}

/// Work handed out by `/tasks/pull`.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Task(Task),
    /// A task body that names a `task_id` but does not decode. It still has
    /// to be reported so the service does not wait on it.
    Malformed { task_id: TaskRef, components: Vec<String>, error: String },
}

#[derive(Serialize)]
struct PullRequest<'a> {
    runner_name: &'a str,
}

#[derive(Serialize)]
struct ReportRequest<'a> {
    runner_name: &'a str,
    task_id: &'a TaskRef,
    output: &'a BTreeMap<String, String>,
    exit_code: &'a BTreeMap<String, i32>,
}

/// Client for one runner identity.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    endpoint: Endpoint,
    runner_name: String,
    timeout: Duration,
}

impl ServiceClient {
    pub fn new(service_url: &str, runner_name: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            endpoint: Endpoint::parse(service_url)?,
            runner_name: runner_name.into(),
            timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn runner_name(&self) -> &str {
        &self.runner_name
    }

    /// Ask for work. `None` means the service has nothing for this runner.
    pub async fn pull(&self) -> Result<Option<Assignment>, ClientError> {
        let body = serde_json::to_string(&PullRequest { runner_name: &self.runner_name })?;
        let response = self.post("/tasks/pull", &body).await?;
        match response.status {
            204 => Ok(None),
            200 if response.body.trim().is_empty() => Ok(None),
            200 => decode_assignment(&response.body).map(Some),
            status => Err(ClientError::Status { status, body: response.body }),
        }
    }

    /// Report a finished task to `/tasks/success` or `/tasks/failed`.
    pub async fn report(
        &self,
        task_id: &TaskRef,
        outcome: &StageOutcome,
    ) -> Result<(), ClientError> {
        let path = if outcome.success { "/tasks/success" } else { "/tasks/failed" };
        let body = serde_json::to_string(&ReportRequest {
            runner_name: &self.runner_name,
            task_id,
            output: &outcome.output,
            exit_code: &outcome.exit_code,
        })?;
        let response = self.post(path, &body).await?;
        if (200..300).contains(&response.status) {
            Ok(())
        } else {
            Err(ClientError::Status { status: response.status, body: response.body })
        }
    }

    async fn post(&self, path: &str, body: &str) -> Result<http::Response, ClientError> {
        tracing::debug!(path, "posting to ci service");
        http::post_json(&self.endpoint, path, body, self.timeout).await
    }
}

/// Decode a task, falling back to its id and component names when the
/// full body is invalid. Bodies without a readable `task_id` are errors.
fn decode_assignment(body: &str) -> Result<Assignment, ClientError> {
    let error = match serde_json::from_str::<Task>(body) {
        Ok(task) => return Ok(Assignment::Task(task)),
        Err(e) => e,
    };
    let value = serde_json::from_str::<serde_json::Value>(body).ok();
    let task_id = value
        .as_ref()
        .and_then(|v| v.get("task_id"))
        .and_then(|id| TaskRef::deserialize(id).ok());
    let Some(task_id) = task_id else {
        return Err(ClientError::Json(error));
    };
    let components = value
        .as_ref()
        .and_then(|v| v.get("components"))
        .and_then(|c| c.as_object())
        .map(|c| c.keys().cloned().collect())
        .unwrap_or_default();
    Ok(Assignment::Malformed { task_id, components, error: error.to_string() })
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
