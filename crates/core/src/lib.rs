// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! allci-core: data model shared by the allci runner crates

pub mod macros;

pub mod names;
pub mod outcome;
pub mod task;

pub use names::{pod_name, sanitize_component, POD_PREFIX};
pub use outcome::{StageOutcome, SPAWN_FAILED_EXIT_CODE};
pub use task::{ComponentSpec, SpecError, SpecField, Task, TaskRef, BOOTSTRAP_STAGE};
