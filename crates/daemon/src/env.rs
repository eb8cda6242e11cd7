// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the runner.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_POLL_SECS: u64 = 5;

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn seconds(name: &str) -> Option<Duration> {
    non_empty(name)
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .map(Duration::from_secs)
}

/// CI service base URL (`CI_SERVICE_URL`), e.g. `http://ci.local:3000`.
pub fn service_url() -> Option<String> {
    non_empty("CI_SERVICE_URL")
}

/// Runner name reported to the service (`RUNNER_NAME`). The caller falls
/// back to the host name.
pub fn runner_name() -> Option<String> {
    non_empty("RUNNER_NAME")
}

/// Work directory and log root (default `tmp/build`).
pub fn build_root() -> PathBuf {
    non_empty("BUILD_ROOT").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("tmp/build"))
}

/// Persistent cache root: CACHE_ROOT > XDG cache dir/allci > tmp/cache
pub fn cache_root() -> PathBuf {
    if let Some(dir) = non_empty("CACHE_ROOT") {
        return PathBuf::from(dir);
    }
    dirs::cache_dir().map(|d| d.join("allci")).unwrap_or_else(|| PathBuf::from("tmp/cache"))
}

/// Idle poll interval (`CI_POLL_FREQUENCY` seconds, default 5).
pub fn poll_frequency() -> Duration {
    seconds("CI_POLL_FREQUENCY").unwrap_or(Duration::from_secs(DEFAULT_POLL_SECS))
}

/// Retry interval after a failed poll (`CI_FAILED_POLL_FREQUENCY`,
/// default: the poll interval).
pub fn failed_poll_frequency() -> Duration {
    failed_poll_override().unwrap_or_else(poll_frequency)
}

/// `CI_FAILED_POLL_FREQUENCY` alone, without falling back.
pub fn failed_poll_override() -> Option<Duration> {
    seconds("CI_FAILED_POLL_FREQUENCY")
}

pub fn container_bin() -> String {
    non_empty("ALLCI_CONTAINER_BIN").unwrap_or_else(|| "docker".to_string())
}

pub fn git_bin() -> String {
    non_empty("ALLCI_GIT_BIN").unwrap_or_else(|| "git".to_string())
}

pub fn package_bin() -> String {
    non_empty("ALLCI_PACKAGE_BIN").unwrap_or_else(|| "bundle".to_string())
}

/// Grace period passed to `stop --time`. Unset leaves it to the runtime.
pub fn stop_timeout() -> Option<Duration> {
    non_empty("ALLCI_STOP_TIMEOUT_SECS")
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Directory for daily-rolling runner logs. Unset logs to stderr.
pub fn log_dir() -> Option<PathBuf> {
    non_empty("ALLCI_LOG_DIR").map(PathBuf::from)
}

/// Proxy variables forwarded to image builds, captured once.
pub fn proxy_env() -> Vec<(String, String)> {
    allci_engine::collect_proxy_env(|name| std::env::var(name).ok())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
