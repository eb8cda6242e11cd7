// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use allci_adapters::{ProcessAdapter, RunOptions};
use allci_core::sanitize_component;

use super::{ActionError, ContainerAction, StepRunner};
use crate::config::EngineConfig;

pub(super) async fn execute<P: ProcessAdapter>(
    action: &ContainerAction,
    steps: &StepRunner<'_, P>,
    config: &EngineConfig,
) -> Result<(), ActionError> {
    let opts = run_options(action, config);
    steps.log(&format!("Running {} as {}", opts.image, opts.name));
    steps.run_checked(&config.container.run(&opts)).await
}

/// Container options: pod network, component alias, spec settings and the
/// injected identity variables (after the component's own env).
pub(crate) fn run_options(action: &ContainerAction, config: &EngineConfig) -> RunOptions {
    let spec = &action.spec;
    let identity = &config.identity;

    let mut env: Vec<(String, String)> =
        spec.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    env.extend([
        ("CI_SERVICE_URL".to_string(), identity.service_url.clone()),
        ("RUNNER_NAME".to_string(), identity.runner_name.clone()),
        ("POD_NAME".to_string(), action.pod_name.clone()),
        ("BUILD_TASK_ID".to_string(), action.task_id.to_string()),
        ("BUILD_ID".to_string(), action.build_id.to_string()),
        ("BUILD_STAGE".to_string(), action.stage.clone()),
        ("BUILD_TASK".to_string(), action.task_name.clone()),
        ("BUILD_COMPONENT".to_string(), action.component.clone()),
    ]);

    RunOptions {
        network: action.pod_name.clone(),
        name: format!("{}_{}", action.pod_name, sanitize_component(&action.component)),
        network_alias: action.component.clone(),
        hostname: spec.hostname.clone().unwrap_or_else(|| action.component.clone()),
        env,
        tmpfs: spec.tmpfs.clone(),
        privileged: spec.privileged,
        image: spec.image_name.clone(),
        cmd: spec.cmd.clone(),
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
