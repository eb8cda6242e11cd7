// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use allci_adapters::ProcessAdapter;

use super::{ActionError, ContainerAction, StepRunner};
use crate::config::EngineConfig;

pub(super) async fn push<P: ProcessAdapter>(
    action: &ContainerAction,
    steps: &StepRunner<'_, P>,
    config: &EngineConfig,
) -> Result<(), ActionError> {
    steps.log(&format!("Pushing {}", action.spec.image_name));
    steps.run_checked(&config.container.push(&action.spec.image_name)).await
}

/// Pull only when the image is not already present locally.
pub(super) async fn pull<P: ProcessAdapter>(
    action: &ContainerAction,
    steps: &StepRunner<'_, P>,
    config: &EngineConfig,
) -> Result<(), ActionError> {
    let image = &action.spec.image_name;
    if steps.probe(&config.container.inspect(image)).await? == 0 {
        steps.log(&format!("Image {} already present", image));
        return Ok(());
    }
    steps.log(&format!("Pulling {}", image));
    steps.run_checked(&config.container.pull(image)).await
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
