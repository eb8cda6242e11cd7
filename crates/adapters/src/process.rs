// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution seam.
//!
//! Every external tool (container runtime, version control, package tool)
//! is driven through [`ProcessAdapter`] with an explicit argument vector.
//! Exit codes are trusted as reported; output goes either to a component
//! log file or nowhere.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from starting or reaping a subprocess.
///
/// A subprocess that runs and exits non-zero is not an error; its exit code
/// is returned as a value.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn `{command}`: {source}")]
    SpawnFailed { command: String, source: std::io::Error },
    #[error("failed waiting on `{command}`: {source}")]
    WaitFailed { command: String, source: std::io::Error },
    #[error("failed to redirect output of `{command}`: {source}")]
    RedirectFailed { command: String, source: std::io::Error },
}

/// A program plus its argument vector and optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), cwd: None }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument (lossy for non-UTF-8 paths).
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// True when `program` matches and the arguments start with `prefix`.
    pub fn matches(&self, program: &str, prefix: &[&str]) -> bool {
        self.program == program
            && self.args.len() >= prefix.len()
            && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Where a subprocess's stdout and stderr go.
#[derive(Debug)]
pub enum Sink {
    /// Discard all output.
    Null,
    /// Append both streams to this (already opened) file.
    File(File),
}

/// Exit code and stdout of a captured run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Captured {
    pub exit_code: i32,
    pub stdout: String,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Adapter for running external programs to completion.
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Run to completion with output sent to `sink`; returns the exit code.
    async fn run(&self, invocation: &Invocation, sink: Sink) -> Result<i32, ProcessError>;

    /// Run to completion capturing stdout (stderr is discarded).
    async fn capture(&self, invocation: &Invocation) -> Result<Captured, ProcessError>;
}

/// Production adapter backed by `tokio::process`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalProcessAdapter;

impl LocalProcessAdapter {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &Invocation) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args).stdin(Stdio::null());
        if let Some(ref cwd) = invocation.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

#[async_trait]
impl ProcessAdapter for LocalProcessAdapter {
    async fn run(&self, invocation: &Invocation, sink: Sink) -> Result<i32, ProcessError> {
        let mut cmd = Self::command(invocation);
        match sink {
            Sink::Null => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
            Sink::File(file) => {
                let stderr = file.try_clone().map_err(|source| ProcessError::RedirectFailed {
                    command: invocation.to_string(),
                    source,
                })?;
                cmd.stdout(Stdio::from(file)).stderr(Stdio::from(stderr));
            }
        }

        let mut child = cmd.spawn().map_err(|source| ProcessError::SpawnFailed {
            command: invocation.to_string(),
            source,
        })?;
        tracing::debug!(command = %invocation, pid = ?child.id(), "spawned subprocess");

        let status = child.wait().await.map_err(|source| ProcessError::WaitFailed {
            command: invocation.to_string(),
            source,
        })?;
        Ok(exit_code(status))
    }

    async fn capture(&self, invocation: &Invocation) -> Result<Captured, ProcessError> {
        let mut cmd = Self::command(invocation);
        cmd.stdout(Stdio::piped()).stderr(Stdio::null());
        let output = cmd.output().await.map_err(|source| ProcessError::SpawnFailed {
            command: invocation.to_string(),
            source,
        })?;
        Ok(Captured {
            exit_code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Map an OS exit status to a shell-style exit code (`128 + signal` when killed).
pub fn exit_code(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
