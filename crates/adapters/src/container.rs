// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument vectors for the container-management CLI.
//!
//! The runtime is a black box: `docker` by default, or any CLI that speaks
//! the same subcommands (`build`, `push`, `pull`, `inspect`, `run`, `stop`,
//! `ps`, `rm`, `network create|rm`).

use std::path::Path;
use std::time::Duration;

use crate::process::Invocation;

/// Options for `run`, in the order they are emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub network: String,
    pub name: String,
    pub network_alias: String,
    pub hostname: String,
    pub env: Vec<(String, String)>,
    pub tmpfs: Vec<String>,
    pub privileged: bool,
    pub image: String,
    pub cmd: Vec<String>,
}

/// Builder for container CLI invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerCli {
    bin: String,
    stop_timeout: Option<Duration>,
}

impl Default for ContainerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl ContainerCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into(), stop_timeout: None }
    }

    /// Override the runtime's own stop grace period (`stop --time N`).
    ///
    /// When unset, `stop` relies on the runtime's default SIGTERM-then-SIGKILL
    /// escalation.
    pub fn with_stop_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(&self.bin)
    }

    /// `build -t <image> -f <dockerfile> [--build-arg K=V]… <context>`
    pub fn build<'a>(
        &self,
        image: &str,
        dockerfile: &Path,
        build_args: impl IntoIterator<Item = (&'a str, &'a str)>,
        context: &Path,
    ) -> Invocation {
        let mut inv = self.invocation().args(["build", "-t", image, "-f"]).path_arg(dockerfile);
        for (key, value) in build_args {
            inv = inv.arg("--build-arg").arg(format!("{}={}", key, value));
        }
        inv.path_arg(context)
    }

    pub fn push(&self, image: &str) -> Invocation {
        self.invocation().args(["push", image])
    }

    pub fn pull(&self, image: &str) -> Invocation {
        self.invocation().args(["pull", image])
    }

    /// Probe whether an image exists locally (exit 0 when present).
    pub fn inspect(&self, image: &str) -> Invocation {
        self.invocation().args(["inspect", image])
    }

    /// `run --rm -a STDOUT -a STDERR …` attached to the pod network.
    pub fn run(&self, opts: &RunOptions) -> Invocation {
        let mut inv = self.invocation().args([
            "run",
            "--rm",
            "-a",
            "STDOUT",
            "-a",
            "STDERR",
            "--network",
            opts.network.as_str(),
            "--name",
            opts.name.as_str(),
            "--network-alias",
            opts.network_alias.as_str(),
            "--hostname",
            opts.hostname.as_str(),
        ]);
        for (key, value) in &opts.env {
            inv = inv.arg("--env").arg(format!("{}={}", key, value));
        }
        for mount in &opts.tmpfs {
            inv = inv.args(["--tmpfs", mount.as_str()]);
        }
        if opts.privileged {
            inv = inv.arg("--privileged");
        }
        inv.arg(&opts.image).args(&opts.cmd)
    }

    /// Container ids attached to a network.
    pub fn ps_network(&self, network: &str) -> Invocation {
        self.invocation().args(["ps", "--quiet", "--filter"]).arg(format!("network={}", network))
    }

    pub fn stop(&self, ids: &[String]) -> Invocation {
        let mut inv = self.invocation().arg("stop");
        if let Some(timeout) = self.stop_timeout {
            inv = inv.arg("--time").arg(timeout.as_secs().to_string());
        }
        inv.args(ids)
    }

    pub fn remove_force(&self, ids: &[String]) -> Invocation {
        self.invocation().args(["rm", "-f"]).args(ids)
    }

    pub fn network_create(&self, network: &str) -> Invocation {
        self.invocation().args(["network", "create", "--driver", "bridge", network])
    }

    pub fn network_remove(&self, network: &str) -> Invocation {
        self.invocation().args(["network", "rm", network])
    }
}

/// Split `ps --quiet` output into container ids.
pub fn parse_ids(stdout: &str) -> Vec<String> {
    stdout.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
