// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner settings: command-line flags layered over the environment.

use std::path::PathBuf;
use std::time::Duration;

use allci_adapters::{ContainerCli, GitCli, PackagerCli};
use allci_engine::{EngineConfig, RunnerIdentity};
use clap::Parser;
use thiserror::Error;

use crate::env;
use crate::http::Endpoint;

/// Poll a CI service for tasks and run them as pods of containers.
#[derive(Debug, Default, Parser)]
#[command(name = "allci-runner", version, about)]
pub struct Args {
    /// CI service base URL [env: CI_SERVICE_URL]
    #[arg(long, value_name = "URL")]
    pub service_url: Option<String>,

    /// Name reported to the service [env: RUNNER_NAME, default: host name]
    #[arg(long, value_name = "NAME")]
    pub runner_name: Option<String>,

    /// Work directory root [env: BUILD_ROOT]
    #[arg(long, value_name = "DIR")]
    pub build_root: Option<PathBuf>,

    /// Persistent cache root [env: CACHE_ROOT]
    #[arg(long, value_name = "DIR")]
    pub cache_root: Option<PathBuf>,

    /// Seconds between idle polls [env: CI_POLL_FREQUENCY]
    #[arg(long, value_name = "SECS")]
    pub poll_frequency: Option<u64>,

    /// Seconds between polls after an error [env: CI_FAILED_POLL_FREQUENCY]
    #[arg(long, value_name = "SECS")]
    pub failed_poll_frequency: Option<u64>,

    /// Poll once, run any task received, then exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no CI service URL: pass --service-url or set CI_SERVICE_URL")]
    MissingServiceUrl,
    #[error(transparent)]
    InvalidServiceUrl(#[from] crate::client::ClientError),
    #[error("cannot determine host name for RUNNER_NAME: {0}")]
    Hostname(#[from] nix::Error),
}

/// Fully resolved runner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub service_url: String,
    pub runner_name: String,
    pub build_root: PathBuf,
    pub cache_root: PathBuf,
    pub poll_frequency: Duration,
    pub failed_poll_frequency: Duration,
    pub container_bin: String,
    pub git_bin: String,
    pub package_bin: String,
    pub stop_timeout: Option<Duration>,
    pub proxy_env: Vec<(String, String)>,
    pub once: bool,
}

impl Settings {
    /// Resolve `args` over the environment, applying defaults.
    pub fn resolve(args: &Args) -> Result<Self, SettingsError> {
        let service_url = args
            .service_url
            .clone()
            .or_else(env::service_url)
            .ok_or(SettingsError::MissingServiceUrl)?;
        Endpoint::parse(&service_url)?;

        let runner_name = match args.runner_name.clone().or_else(env::runner_name) {
            Some(name) => name,
            None => nix::unistd::gethostname()?.to_string_lossy().into_owned(),
        };

        let poll_flag = positive_secs(args.poll_frequency);
        let poll_frequency = poll_flag.unwrap_or_else(env::poll_frequency);
        // An explicit --poll-frequency also moves the failure interval unless
        // that one is given too.
        let failed_poll_frequency = positive_secs(args.failed_poll_frequency)
            .or_else(env::failed_poll_override)
            .or(poll_flag)
            .unwrap_or(poll_frequency);

        Ok(Self {
            service_url,
            runner_name,
            build_root: args.build_root.clone().unwrap_or_else(env::build_root),
            cache_root: args.cache_root.clone().unwrap_or_else(env::cache_root),
            poll_frequency,
            failed_poll_frequency,
            container_bin: env::container_bin(),
            git_bin: env::git_bin(),
            package_bin: env::package_bin(),
            stop_timeout: env::stop_timeout(),
            proxy_env: env::proxy_env(),
            once: args.once,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(
            RunnerIdentity::new(&self.runner_name, &self.service_url),
            &self.build_root,
            &self.cache_root,
        )
        .container(ContainerCli::new(&self.container_bin).with_stop_timeout(self.stop_timeout))
        .git(GitCli::new(&self.git_bin))
        .packager(PackagerCli::default().with_bin(&self.package_bin))
        .proxy_env(self.proxy_env.clone())
    }
}

fn positive_secs(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|s| *s > 0).map(Duration::from_secs)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
