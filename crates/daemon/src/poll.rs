// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poll loop: pull a task, run it, report it, repeat.

use std::sync::Arc;
use std::time::Duration;

use allci_adapters::ProcessAdapter;
use allci_core::StageOutcome;
use allci_engine::EngineConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::client::{Assignment, ClientError, ServiceClient};

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A task was run and its outcome reported.
    Ran { success: bool },
    /// The service had no work.
    Idle,
}

pub struct Poller<P> {
    client: ServiceClient,
    adapter: P,
    config: Arc<EngineConfig>,
    poll: Duration,
    failed_poll: Duration,
}

impl<P: ProcessAdapter> Poller<P> {
    pub fn new(client: ServiceClient, adapter: P, config: Arc<EngineConfig>) -> Self {
        Self {
            client,
            adapter,
            config,
            poll: Duration::from_secs(5),
            failed_poll: Duration::from_secs(5),
        }
    }

    pub fn with_intervals(mut self, poll: Duration, failed_poll: Duration) -> Self {
        self.poll = poll;
        self.failed_poll = failed_poll;
        self
    }

    /// Pull once and, if a task arrives, run it to completion and report it.
    pub async fn poll_once(&self) -> Result<PollOutcome, ClientError> {
        let task = match self.client.pull().await? {
            None => return Ok(PollOutcome::Idle),
            Some(Assignment::Task(task)) => task,
            Some(Assignment::Malformed { task_id, components, error }) => {
                warn!(task_id = %task_id, error = %error, "undecodable task, reporting failure");
                self.client.report(&task_id, &rejected(&components, &error)).await?;
                return Ok(PollOutcome::Ran { success: false });
            }
        };

        let task_id = task.task_id.clone();
        info!(
            task_id = %task_id,
            stage = %task.stage,
            components = task.components.len(),
            "task received"
        );
        let outcome =
            allci_engine::run_task(self.adapter.clone(), Arc::clone(&self.config), task).await;
        info!(task_id = %task_id, success = outcome.success, "task finished");

        self.client.report(&task_id, &outcome).await?;
        Ok(PollOutcome::Ran { success: outcome.success })
    }

    /// Poll until `shutdown` is cancelled (or after one poll when `once`).
    ///
    /// Cancellation is only observed between polls; a task in progress is
    /// always completed and reported.
    pub async fn run(&self, shutdown: CancellationToken, once: bool) {
        info!(runner = self.client.runner_name(), "polling for tasks");
        loop {
            let wait = match self.poll_once().await {
                Ok(PollOutcome::Ran { .. }) => Duration::ZERO,
                Ok(PollOutcome::Idle) => self.poll,
                Err(e) => {
                    error!(error = %e, "poll failed");
                    self.failed_poll
                }
            };
            if once || shutdown.is_cancelled() {
                break;
            }
            if wait.is_zero() {
                continue;
            }
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }
        info!("poll loop stopped");
    }
}

/// Outcome for a task that could not be decoded: every named component is a
/// spawn failure carrying the decode error.
fn rejected(components: &[String], error: &str) -> StageOutcome {
    let mut outcome = StageOutcome::new();
    for component in components {
        outcome.record_spawn_failure(component.as_str(), format!("invalid task: {}", error));
    }
    outcome.success = false;
    outcome
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
