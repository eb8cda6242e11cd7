// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! allci-engine: task execution engine
//!
//! Turns a [`allci_core::Task`] into concurrently supervised container
//! actions sharing one pod network, with persistent repository and package
//! caches.

pub mod action;
pub mod cache;
pub mod config;
pub mod layout;
pub mod log;
pub mod pipeline;
pub mod pod;
pub mod supervisor;

#[cfg(test)]
mod test_support;

pub use action::{ActionContext, ActionError, ActionKind, CompletionHook, ContainerAction};
pub use cache::{mirror_path, normalize_mtimes, sync_dir, SyncMode, PACKAGE_EPOCH};
pub use config::{collect_proxy_env, EngineConfig, RunnerIdentity, PROXY_VARS};
pub use layout::{LayoutError, TaskLayout};
pub use log::{read_output, ActionLog};
pub use pipeline::{run_task, stages_for};
pub use pod::Pod;
pub use supervisor::{TaskRunner, ABORTED_EXIT_CODE};
