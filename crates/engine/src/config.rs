// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration, resolved once by the caller.

use std::path::PathBuf;

use allci_adapters::{ContainerCli, GitCli, PackagerCli};

/// Who this runner is; injected into every running container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerIdentity {
    pub runner_name: String,
    pub service_url: String,
}

impl RunnerIdentity {
    pub fn new(runner_name: impl Into<String>, service_url: impl Into<String>) -> Self {
        Self { runner_name: runner_name.into(), service_url: service_url.into() }
    }

    pub fn pod_name(&self) -> String {
        allci_core::pod_name(&self.runner_name)
    }
}

/// Everything the engine needs to run tasks. No ambient environment is read
/// after this value is built.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub identity: RunnerIdentity,
    /// Root for per-task work directories and logs (wiped per task).
    pub build_root: PathBuf,
    /// Root for persistent caches (never deleted by the engine).
    pub cache_root: PathBuf,
    pub container: ContainerCli,
    pub git: GitCli,
    pub packager: PackagerCli,
    /// Proxy variables forwarded to image builds as build args.
    pub proxy_env: Vec<(String, String)>,
}

impl EngineConfig {
    pub fn new(
        identity: RunnerIdentity,
        build_root: impl Into<PathBuf>,
        cache_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identity,
            build_root: build_root.into(),
            cache_root: cache_root.into(),
            container: ContainerCli::default(),
            git: GitCli::default(),
            packager: PackagerCli::default(),
            proxy_env: Vec::new(),
        }
    }

    allci_core::setters! {
        set {
            container: ContainerCli,
            git: GitCli,
            packager: PackagerCli,
            proxy_env: Vec<(String, String)>,
        }
    }
}

/// Proxy variable names forwarded to builds when present.
pub const PROXY_VARS: &[&str] = &[
    "http_proxy",
    "https_proxy",
    "ftp_proxy",
    "all_proxy",
    "no_proxy",
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "FTP_PROXY",
    "ALL_PROXY",
    "NO_PROXY",
];

/// Collect the proxy variables that are set (and non-empty) via `lookup`.
pub fn collect_proxy_env(lookup: impl Fn(&str) -> Option<String>) -> Vec<(String, String)> {
    PROXY_VARS
        .iter()
        .filter_map(|name| {
            lookup(name).filter(|v| !v.is_empty()).map(|value| (name.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
