// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task runner: fans a stage out to one action per component and waits on
//! whichever finishes first.
//!
//! Every action runs as its own tokio task and reports `(index, exit_code)`
//! over a channel when done, so completions are observed in the order they
//! happen. After each completion the action kind's [`CompletionHook`] runs
//! against the pod; for run-image that stops the remaining containers.

use std::collections::HashMap;
use std::sync::Arc;

use allci_adapters::ProcessAdapter;
use allci_core::{sanitize_component, ComponentSpec, StageOutcome, Task};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::action::{ActionContext, ActionKind, CompletionHook, ContainerAction};
use crate::config::EngineConfig;
use crate::layout::{LayoutError, TaskLayout};
use crate::log::{read_output, ActionLog};
use crate::pod::Pod;

/// Exit code recorded when an action task ends without reporting (panic or abort).
pub const ABORTED_EXIT_CODE: i32 = 101;

/// Runs the stages of one task against one pod.
pub struct TaskRunner<P> {
    ctx: ActionContext<P>,
    task: Task,
    layout: TaskLayout,
    pod: Pod<P>,
}

impl<P: ProcessAdapter> TaskRunner<P> {
    /// Bind a runner to `task`, wiping the pod's build directory.
    pub fn new(adapter: P, config: Arc<EngineConfig>, task: Task) -> Result<Self, LayoutError> {
        let pod_name = config.identity.pod_name();
        let layout = TaskLayout::new(&config.build_root, &config.cache_root, &pod_name);
        layout.prepare()?;
        let pod = Pod::new(adapter.clone(), config.container.clone(), pod_name);
        Ok(Self { ctx: ActionContext::new(adapter, config), task, layout, pod })
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn layout(&self) -> &TaskLayout {
        &self.layout
    }

    pub fn pod(&self) -> &Pod<P> {
        &self.pod
    }

    fn action(&self, kind: ActionKind, component: &str, spec: &ComponentSpec) -> ContainerAction {
        ContainerAction {
            kind,
            task_id: self.task.task_id.clone(),
            build_id: self.task.build_id.clone(),
            stage: self.task.stage.clone(),
            task_name: self.task.task_name().to_string(),
            pod_name: self.pod.name().to_string(),
            component: component.to_string(),
            spec: spec.clone(),
            log_path: self.layout.log_path(component),
            workdir: self.layout.workdir(component),
            cachedir: self.layout.cachedir(component),
        }
    }

    /// Run `kind` for every component and wait for all of them.
    ///
    /// The outcome has exactly one entry per component. Components that fail
    /// validation or whose log cannot be opened are recorded as spawn
    /// failures; their siblings still run.
    pub async fn run(&self, kind: ActionKind) -> StageOutcome {
        let mut outcome = StageOutcome::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();
        let mut running: HashMap<usize, ContainerAction> = HashMap::new();
        // Sanitized path segment -> component that owns it.
        let mut segments: HashMap<String, &str> = HashMap::new();

        for (index, (component, spec)) in self.task.components.iter().enumerate() {
            if let Some(owner) = segments.get(&sanitize_component(component)).copied() {
                let message = format!(
                    "component {:?} maps to the same log and work directory as {:?}",
                    component, owner
                );
                tracing::warn!(component = %component, owner = %owner, "component paths collide");
                outcome.record_spawn_failure(component.as_str(), message);
                continue;
            }
            segments.insert(sanitize_component(component), component.as_str());

            if let Err(e) = spec.validate(component, kind.required_fields()) {
                tracing::warn!(
                    component = %component,
                    action = %kind,
                    error = %e,
                    "invalid component"
                );
                outcome.record_spawn_failure(component.as_str(), e.to_string());
                continue;
            }
            let action = self.action(kind, component, spec);
            let log = match ActionLog::open(&action.log_path) {
                Ok(log) => log,
                Err(e) => {
                    let message =
                        format!("failed to open log {}: {}", action.log_path.display(), e);
                    tracing::warn!(
                        component = %component,
                        error = %e,
                        "failed to open component log"
                    );
                    outcome.record_spawn_failure(component.as_str(), message);
                    continue;
                }
            };

            let completion = Completion { index, tx: tx.clone(), exit_code: None };
            let ctx = self.ctx.clone();
            let task_action = action.clone();
            tasks.spawn(async move {
                let mut completion = completion;
                completion.exit_code = Some(task_action.run(&ctx, &log).await);
            });
            running.insert(index, action);
        }
        drop(tx);

        tracing::info!(
            task_id = %self.task.task_id,
            stage = %self.task.stage,
            action = %kind,
            spawned = running.len(),
            "stage started"
        );

        while !running.is_empty() {
            let Some((index, exit_code)) = rx.recv().await else {
                break;
            };
            let Some(action) = running.remove(&index) else {
                continue;
            };
            tracing::info!(
                component = %action.component,
                action = %kind,
                exit_code,
                "action finished"
            );
            let output = read_output(&action.log_path);
            outcome.record(action.component.as_str(), exit_code, output);
            self.on_finished(kind, &action, &running).await;
        }

        // Only reachable if every sender vanished without reporting.
        for (_, action) in running {
            let output = read_output(&action.log_path);
            outcome.record(action.component.as_str(), ABORTED_EXIT_CODE, output);
        }

        while tasks.join_next().await.is_some() {}

        tracing::info!(
            task_id = %self.task.task_id,
            action = %kind,
            success = outcome.success,
            failed = ?outcome.failed_components(),
            "stage finished"
        );
        outcome
    }

    async fn on_finished(
        &self,
        kind: ActionKind,
        finished: &ContainerAction,
        still_running: &HashMap<usize, ContainerAction>,
    ) {
        match kind.completion_hook() {
            CompletionHook::Noop => {}
            CompletionHook::StopPod => {
                tracing::debug!(
                    component = %finished.component,
                    remaining = still_running.len(),
                    "component exited, stopping the pod"
                );
                self.pod.stop_members().await;
            }
        }
    }
}

/// Reports an action's exit code when dropped, including on panic.
struct Completion {
    index: usize,
    tx: mpsc::UnboundedSender<(usize, i32)>,
    exit_code: Option<i32>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        let exit_code = self.exit_code.take().unwrap_or(ABORTED_EXIT_CODE);
        let _ = self.tx.send((self.index, exit_code));
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
