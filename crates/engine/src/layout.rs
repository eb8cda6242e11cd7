// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task filesystem layout.
//!
//! ```text
//! <build_root>/<pod>/<component>.log   component log (append-only)
//! <build_root>/<pod>/<component>/      work directory (wiped per task)
//! <cache_root>/<pod>/<component>/      persistent component cache
//! ```
//!
//! Component segments are sanitized with [`allci_core::sanitize_component`].

use std::path::{Path, PathBuf};

use allci_core::sanitize_component;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to reset build directory {}: {source}", path.display())]
    ResetFailed { path: PathBuf, source: std::io::Error },
}

/// Resolved directories for one pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLayout {
    pod_build_dir: PathBuf,
    pod_cache_dir: PathBuf,
}

impl TaskLayout {
    pub fn new(build_root: &Path, cache_root: &Path, pod_name: &str) -> Self {
        Self { pod_build_dir: build_root.join(pod_name), pod_cache_dir: cache_root.join(pod_name) }
    }

    pub fn pod_build_dir(&self) -> &Path {
        &self.pod_build_dir
    }

    pub fn pod_cache_dir(&self) -> &Path {
        &self.pod_cache_dir
    }

    pub fn log_path(&self, component: &str) -> PathBuf {
        self.pod_build_dir.join(format!("{}.log", sanitize_component(component)))
    }

    pub fn workdir(&self, component: &str) -> PathBuf {
        self.pod_build_dir.join(sanitize_component(component))
    }

    pub fn cachedir(&self, component: &str) -> PathBuf {
        self.pod_cache_dir.join(sanitize_component(component))
    }

    /// Wipe and recreate the pod build directory; ensure the cache root exists.
    ///
    /// Cache directory creation is best-effort: a failure is logged and the
    /// affected actions fail on their own when they need the cache.
    pub fn prepare(&self) -> Result<(), LayoutError> {
        let reset = |source| LayoutError::ResetFailed { path: self.pod_build_dir.clone(), source };
        match std::fs::remove_dir_all(&self.pod_build_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(reset(e)),
        }
        std::fs::create_dir_all(&self.pod_build_dir).map_err(reset)?;

        if let Err(e) = std::fs::create_dir_all(&self.pod_cache_dir) {
            tracing::warn!(
                path = %self.pod_cache_dir.display(),
                error = %e,
                "failed to create cache directory"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
