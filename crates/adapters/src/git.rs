// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument vectors for the version-control CLI and the package tool.

use std::path::Path;

use crate::process::Invocation;

/// Builder for git invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCli {
    bin: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// `clone --mirror <uri> <dest>`
    pub fn clone_mirror(&self, uri: &str, dest: &Path) -> Invocation {
        Invocation::new(&self.bin).args(["clone", "--mirror", uri]).path_arg(dest)
    }

    /// `fetch`, run inside an existing mirror.
    pub fn fetch(&self, mirror: &Path) -> Invocation {
        Invocation::new(&self.bin).arg("fetch").current_dir(mirror)
    }

    /// `clone --branch <branch> <source> <dest>`
    pub fn clone_branch(&self, branch: &str, source: &Path, dest: &Path) -> Invocation {
        Invocation::new(&self.bin)
            .args(["clone", "--branch", branch])
            .path_arg(source)
            .path_arg(dest)
    }

    /// `log -n1 --oneline`, run inside a working copy.
    pub fn log_head(&self, workdir: &Path) -> Invocation {
        Invocation::new(&self.bin).args(["log", "-n1", "--oneline"]).current_dir(workdir)
    }
}

/// Package tool settings: which lock file triggers packaging, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagerCli {
    pub bin: String,
    /// Arguments for the download-only packaging run.
    pub args: Vec<String>,
    /// Lock file (relative to the work directory) whose presence enables packaging.
    pub lock_file: String,
    /// Package cache directory (relative to the work directory) the tool fills.
    pub cache_subdir: String,
}

impl Default for PackagerCli {
    fn default() -> Self {
        Self {
            bin: "bundle".to_string(),
            args: ["package", "--all", "--no-install"].map(String::from).to_vec(),
            lock_file: "Gemfile.lock".to_string(),
            cache_subdir: "vendor/cache".to_string(),
        }
    }
}

impl PackagerCli {
    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    pub fn package(&self, workdir: &Path) -> Invocation {
        Invocation::new(&self.bin).args(&self.args).current_dir(workdir)
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
