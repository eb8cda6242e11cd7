// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container actions: one unit of work per component per stage.
//!
//! Each variant is an `async fn` over a [`StepRunner`]. Steps return
//! [`ActionError`] instead of exiting; the supervisor turns the final result
//! into the component's exit code.

mod build;
mod image;
mod run;

use std::path::PathBuf;
use std::sync::Arc;

use allci_adapters::{Invocation, ProcessAdapter, ProcessError, Sink};
use allci_core::{ComponentSpec, SpecField, TaskRef};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::log::ActionLog;

/// Exit code for a tool that could not be started.
pub const NOT_FOUND_EXIT_CODE: i32 = 127;

/// The four stage variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    BuildImage,
    PushImage,
    PullImage,
    RunImage,
}

allci_core::simple_display! {
    ActionKind {
        BuildImage => "build-image",
        PushImage => "push-image",
        PullImage => "pull-image",
        RunImage => "run-image",
    }
}

/// What the supervisor does after an action of a given kind finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionHook {
    Noop,
    /// Stop every container left in the pod: first exit ends the group.
    StopPod,
}

impl ActionKind {
    /// Spec fields that must be present before this action is dispatched.
    pub fn required_fields(&self) -> &'static [SpecField] {
        match self {
            ActionKind::BuildImage => &[
                SpecField::ImageName,
                SpecField::RepositoryUri,
                SpecField::Branch,
                SpecField::Dockerfile,
            ],
            ActionKind::PushImage | ActionKind::PullImage | ActionKind::RunImage => {
                &[SpecField::ImageName]
            }
        }
    }

    pub fn completion_hook(&self) -> CompletionHook {
        match self {
            ActionKind::RunImage => CompletionHook::StopPod,
            ActionKind::BuildImage | ActionKind::PushImage | ActionKind::PullImage => {
                CompletionHook::Noop
            }
        }
    }
}

/// Errors that end an action. Every variant maps to an exit code.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("`{command}` exited with code {code}")]
    ToolFailed { command: String, code: i32 },
    #[error("{0}")]
    Contract(String),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("{context}: {source}")]
    Io { context: String, source: std::io::Error },
}

impl ActionError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ActionError::Io { context: context.into(), source }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ActionError::ToolFailed { code, .. } => *code,
            ActionError::Contract(_) => 1,
            ActionError::Process(ProcessError::SpawnFailed { .. }) => NOT_FOUND_EXIT_CODE,
            ActionError::Process(_) => 1,
            ActionError::Io { .. } => 1,
        }
    }
}

/// Shared, cloneable state every action runs with.
#[derive(Clone)]
pub struct ActionContext<P> {
    pub adapter: P,
    pub config: Arc<EngineConfig>,
}

impl<P: ProcessAdapter> ActionContext<P> {
    pub fn new(adapter: P, config: Arc<EngineConfig>) -> Self {
        Self { adapter, config }
    }
}

/// One component's work for one stage, with resolved paths.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerAction {
    pub kind: ActionKind,
    pub task_id: TaskRef,
    pub build_id: TaskRef,
    pub stage: String,
    pub task_name: String,
    pub pod_name: String,
    pub component: String,
    pub spec: ComponentSpec,
    pub log_path: PathBuf,
    pub workdir: PathBuf,
    pub cachedir: PathBuf,
}

impl ContainerAction {
    /// Run to completion and return the component's exit code.
    ///
    /// Failures are written to the component log before returning.
    pub async fn run<P: ProcessAdapter>(&self, ctx: &ActionContext<P>, log: &ActionLog) -> i32 {
        match self.execute(ctx, log).await {
            Ok(()) => 0,
            Err(e) => {
                log.log(&e.to_string());
                e.exit_code()
            }
        }
    }

    async fn execute<P: ProcessAdapter>(
        &self,
        ctx: &ActionContext<P>,
        log: &ActionLog,
    ) -> Result<(), ActionError> {
        let steps = StepRunner { adapter: &ctx.adapter, log };
        let config = ctx.config.as_ref();
        match self.kind {
            ActionKind::BuildImage => build::execute(self, &steps, config).await,
            ActionKind::PushImage => image::push(self, &steps, config).await,
            ActionKind::PullImage => image::pull(self, &steps, config).await,
            ActionKind::RunImage => run::execute(self, &steps, config).await,
        }
    }
}

/// Runs tool invocations on behalf of one action, logging each command line.
pub(crate) struct StepRunner<'a, P> {
    adapter: &'a P,
    log: &'a ActionLog,
}

impl<P: ProcessAdapter> StepRunner<'_, P> {
    pub(crate) fn log(&self, message: &str) {
        self.log.log(message);
    }

    /// Run with output appended to the component log; the exit code is returned as is.
    pub(crate) async fn run(&self, invocation: &Invocation) -> Result<i32, ActionError> {
        self.log(&format!("$ {}", invocation));
        Ok(self.adapter.run(invocation, self.log.sink()).await?)
    }

    /// Run, failing the action on a non-zero exit.
    pub(crate) async fn run_checked(&self, invocation: &Invocation) -> Result<(), ActionError> {
        match self.run(invocation).await? {
            0 => Ok(()),
            code => Err(ActionError::ToolFailed { command: invocation.to_string(), code }),
        }
    }

    /// Run with output discarded, for probes whose exit code is the answer.
    pub(crate) async fn probe(&self, invocation: &Invocation) -> Result<i32, ActionError> {
        self.log(&format!("$ {}", invocation));
        Ok(self.adapter.run(invocation, Sink::Null).await?)
    }
}

/// Run blocking filesystem work off the async workers.
pub(crate) async fn blocking<T, F>(context: String, f: F) -> Result<T, ActionError>
where
    T: Send + 'static,
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(|e| ActionError::io(context, e)),
        Err(e) => Err(ActionError::io(context, std::io::Error::other(e))),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
