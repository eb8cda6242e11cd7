// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod network lifecycle.
//!
//! Every operation here is best-effort: failures are logged and never change
//! a task's outcome.

use allci_adapters::{parse_ids, ContainerCli, Invocation, ProcessAdapter, Sink};

/// The isolated network one task's containers share.
#[derive(Clone)]
pub struct Pod<P> {
    adapter: P,
    container: ContainerCli,
    name: String,
}

impl<P: ProcessAdapter> Pod<P> {
    pub fn new(adapter: P, container: ContainerCli, name: impl Into<String>) -> Self {
        Self { adapter, container, name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn create(&self) {
        tracing::info!(pod = %self.name, "creating pod network");
        self.best_effort(self.container.network_create(&self.name)).await;
    }

    /// Ids of containers currently attached to the pod network.
    pub async fn members(&self) -> Vec<String> {
        let invocation = self.container.ps_network(&self.name);
        match self.adapter.capture(&invocation).await {
            Ok(captured) if captured.success() => parse_ids(&captured.stdout),
            Ok(captured) => {
                tracing::warn!(
                    pod = %self.name,
                    exit_code = captured.exit_code,
                    "failed to list pod members"
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(pod = %self.name, error = %e, "failed to list pod members");
                Vec::new()
            }
        }
    }

    /// Gracefully stop every container left in the pod.
    pub async fn stop_members(&self) {
        let ids = self.members().await;
        if ids.is_empty() {
            tracing::debug!(pod = %self.name, "no pod members to stop");
            return;
        }
        tracing::info!(pod = %self.name, count = ids.len(), "stopping pod members");
        self.best_effort(self.container.stop(&ids)).await;
    }

    /// Force-remove members, then the network itself.
    pub async fn remove(&self) {
        let ids = self.members().await;
        if !ids.is_empty() {
            self.best_effort(self.container.remove_force(&ids)).await;
        }
        tracing::info!(pod = %self.name, "removing pod network");
        self.best_effort(self.container.network_remove(&self.name)).await;
    }

    async fn best_effort(&self, invocation: Invocation) {
        match self.adapter.run(&invocation, Sink::Null).await {
            Ok(0) => {}
            Ok(code) => tracing::warn!(
                pod = %self.name,
                command = %invocation,
                exit_code = code,
                "pod command failed"
            ),
            Err(e) => tracing::warn!(pod = %self.name, error = %e, "pod command failed"),
        }
    }
}

#[cfg(test)]
#[path = "pod_tests.rs"]
mod tests;
