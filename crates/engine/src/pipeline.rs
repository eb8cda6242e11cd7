// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage sequencing for one task.

use std::sync::Arc;

use allci_adapters::ProcessAdapter;
use allci_core::{StageOutcome, Task};

use crate::action::ActionKind;
use crate::config::EngineConfig;
use crate::supervisor::TaskRunner;

const BOOTSTRAP_STAGES: &[ActionKind] =
    &[ActionKind::BuildImage, ActionKind::PushImage, ActionKind::RunImage];
const NORMAL_STAGES: &[ActionKind] = &[ActionKind::PullImage, ActionKind::RunImage];

/// Action kinds run for a task, in order.
pub fn stages_for(task: &Task) -> &'static [ActionKind] {
    if task.is_bootstrap() {
        BOOTSTRAP_STAGES
    } else {
        NORMAL_STAGES
    }
}

/// Run every stage of `task`, stopping at the first failed one.
///
/// The pod is created up front and always removed afterwards. The returned
/// outcome is the last executed stage's.
pub async fn run_task<P: ProcessAdapter>(
    adapter: P,
    config: Arc<EngineConfig>,
    task: Task,
) -> StageOutcome {
    let task_id = task.task_id.clone();
    let components: Vec<String> = task.components.keys().cloned().collect();
    let runner = match TaskRunner::new(adapter, config, task) {
        Ok(runner) => runner,
        Err(e) => {
            tracing::error!(task_id = %task_id, error = %e, "cannot prepare task");
            let mut outcome = StageOutcome::new();
            for component in components {
                outcome.record_spawn_failure(component, e.to_string());
            }
            outcome.success = false;
            return outcome;
        }
    };

    runner.pod().create().await;

    let mut outcome = StageOutcome::new();
    for kind in stages_for(runner.task()) {
        tracing::info!(task_id = %task_id, action = %kind, "running stage");
        outcome = runner.run(*kind).await;
        if !outcome.success {
            tracing::warn!(
                task_id = %task_id,
                action = %kind,
                failed = ?outcome.failed_components(),
                "stage failed, skipping the rest"
            );
            break;
        }
    }

    runner.pod().remove().await;
    outcome
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
