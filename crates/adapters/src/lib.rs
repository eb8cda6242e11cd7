// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! allci-adapters: subprocess seam and external CLI argument vectors

pub mod container;
pub mod git;
pub mod process;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use container::{parse_ids, ContainerCli, RunOptions};
pub use git::{GitCli, PackagerCli};
pub use process::{Captured, Invocation, LocalProcessAdapter, ProcessAdapter, ProcessError, Sink};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcessAdapter, FakeRule};
