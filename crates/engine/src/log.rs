// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-component log.
//!
//! The supervisor opens the file before an action starts; engine messages and
//! tool output share the same handle. The whole file is the component's
//! captured output once the action finishes.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use allci_adapters::Sink;
use chrono::{SecondsFormat, Utc};

/// Open handle to a component log file.
#[derive(Debug)]
pub struct ActionLog {
    path: PathBuf,
    file: File,
}

impl ActionLog {
    /// Open (creating if needed) in append mode.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a timestamped line: `2026-01-30T08:14:09Z message`.
    ///
    /// Falls back to stdout when the file cannot be written.
    pub fn log(&self, message: &str) {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let line = format!("{} {}\n", stamp, message);
        if let Err(e) = (&self.file).write_all(line.as_bytes()) {
            tracing::warn!(path = %self.path.display(), error = %e, "component log unwritable");
            print!("{}", line);
        }
    }

    /// A sink that appends subprocess output to this log.
    pub fn sink(&self) -> Sink {
        match self.file.try_clone() {
            Ok(file) => Sink::File(file),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "cannot share component log with subprocess, discarding its output"
                );
                Sink::Null
            }
        }
    }
}

/// Read a finished component's complete log.
///
/// Missing or unreadable logs yield an empty string: output is always
/// reported, even when there is none.
pub fn read_output(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read component log");
            String::new()
        }
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
