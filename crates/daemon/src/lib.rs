// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! allci-runner: service client, poll loop and process setup around the engine

pub mod client;
pub mod env;
pub mod http;
pub mod logging;
pub mod poll;
pub mod settings;

#[cfg(test)]
mod test_server;

pub use client::{Assignment, ClientError, ServiceClient};
pub use poll::{PollOutcome, Poller};
pub use settings::{Args, Settings, SettingsError};
