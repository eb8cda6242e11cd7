// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregate result of running one stage (or a whole task).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Exit code recorded for a component whose action could not be started.
pub const SPAWN_FAILED_EXIT_CODE: i32 = -1;

/// Per-component results plus the folded success flag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Logical AND of every component's success, plus any spawn failure.
    pub success: bool,
    /// Captured log text by component name.
    pub output: BTreeMap<String, String>,
    /// Exit code by component name.
    pub exit_code: BTreeMap<String, i32>,
}

impl StageOutcome {
    /// An empty outcome; success until something fails.
    pub fn new() -> Self {
        Self { success: true, ..Default::default() }
    }

    /// Record a finished component and fold its result into `success`.
    pub fn record(&mut self, component: impl Into<String>, exit_code: i32, output: String) {
        let component = component.into();
        self.success &= exit_code == 0;
        self.output.insert(component.clone(), output);
        self.exit_code.insert(component, exit_code);
    }

    /// Record a component that never started.
    pub fn record_spawn_failure(&mut self, component: impl Into<String>, message: String) {
        self.record(component, SPAWN_FAILED_EXIT_CODE, message);
    }

    pub fn len(&self) -> usize {
        self.exit_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exit_code.is_empty()
    }

    /// Components with a non-zero exit code, in name order.
    pub fn failed_components(&self) -> Vec<&str> {
        self.exit_code
            .iter()
            .filter(|(_, code)| **code != 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
