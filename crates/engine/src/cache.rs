// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent content caches: repository mirrors and package caches.
//!
//! Caches outlive tasks and are never deleted by the engine. They assume a
//! single writer: only one task pipeline runs per runner at a time, and each
//! component has its own cache directory. Two runners sharing a cache root
//! concurrently is unsupported.

use std::fs::{self, File, FileTimes};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Fixed timestamp applied to packaged files (2000-01-01T00:00:00Z).
///
/// The package tool rewrites mtimes on every run; pinning them keeps the
/// image build's "copy package cache" layer cacheable when content is unchanged.
pub const PACKAGE_EPOCH: Duration = Duration::from_secs(946_684_800);

/// Directory under a component cache that holds repository mirrors.
pub const REPOSITORY_DIR: &str = "repository";

/// Directory under a component cache that holds the persistent package cache.
pub const PACKAGE_DIR: &str = "package";

/// Mirror location for a repository: `<cachedir>/repository/<sha256(uri)>`.
///
/// A pure function of the URI, so every branch of a repository shares one mirror.
pub fn mirror_path(cachedir: &Path, repository_uri: &str) -> PathBuf {
    let digest = Sha256::digest(repository_uri.as_bytes());
    cachedir.join(REPOSITORY_DIR).join(format!("{:x}", digest))
}

pub fn package_cache_path(cachedir: &Path) -> PathBuf {
    cachedir.join(PACKAGE_DIR)
}

/// How [`sync_dir`] treats destination entries missing from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Copy new and changed files; keep everything else in the destination.
    Additive,
    /// Copy new and changed files; delete destination entries absent from the source.
    Mirror,
}

/// Counts from one [`sync_dir`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub copied: usize,
    pub unchanged: usize,
    pub removed: usize,
}

/// Copy-merge `src` into `dst`.
///
/// Files are copied when missing from `dst` or different in length or
/// content. A missing `src` is treated as empty. `dst` is created if needed.
pub fn sync_dir(src: &Path, dst: &Path, mode: SyncMode) -> io::Result<SyncStats> {
    let mut stats = SyncStats::default();
    fs::create_dir_all(dst)?;
    if src.is_dir() {
        sync_into(src, dst, mode, &mut stats)?;
    } else if mode == SyncMode::Mirror {
        prune(src, dst, &mut stats)?;
    }
    Ok(stats)
}

fn sync_into(src: &Path, dst: &Path, mode: SyncMode, stats: &mut SyncStats) -> io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        // Follows symlinks: linked content is copied as regular files.
        let meta = fs::metadata(&from)?;

        if meta.is_dir() {
            if to.exists() && !to.is_dir() {
                fs::remove_file(&to)?;
            }
            fs::create_dir_all(&to)?;
            sync_into(&from, &to, mode, stats)?;
        } else if to.is_dir() {
            fs::remove_dir_all(&to)?;
            fs::copy(&from, &to)?;
            stats.copied += 1;
        } else if same_content(&from, &to)? {
            stats.unchanged += 1;
        } else {
            fs::copy(&from, &to)?;
            stats.copied += 1;
        }
    }

    if mode == SyncMode::Mirror {
        prune(src, dst, stats)?;
    }
    Ok(())
}

/// Remove entries of `dst` that have no counterpart in `src`.
fn prune(src: &Path, dst: &Path, stats: &mut SyncStats) -> io::Result<()> {
    for entry in fs::read_dir(dst)? {
        let entry = entry?;
        if src.join(entry.file_name()).exists() {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        stats.removed += 1;
    }
    Ok(())
}

fn same_content(a: &Path, b: &Path) -> io::Result<bool> {
    let meta_b = match fs::metadata(b) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if fs::metadata(a)?.len() != meta_b.len() {
        return Ok(false);
    }

    let mut fa = File::open(a)?;
    let mut fb = File::open(b)?;
    let mut buf_a = [0u8; 8192];
    let mut buf_b = [0u8; 8192];
    loop {
        let n = fa.read(&mut buf_a)?;
        if n == 0 {
            return Ok(true);
        }
        fb.read_exact(&mut buf_b[..n])?;
        if buf_a[..n] != buf_b[..n] {
            return Ok(false);
        }
    }
}

/// Set access and modification time of everything under `root` (inclusive)
/// to `UNIX_EPOCH + epoch`. Returns the number of entries touched.
pub fn normalize_mtimes(root: &Path, epoch: Duration) -> io::Result<usize> {
    let time = UNIX_EPOCH + epoch;
    let times = FileTimes::new().set_accessed(time).set_modified(time);
    let mut touched = 0;
    normalize_into(root, times, &mut touched)?;
    Ok(touched)
}

fn normalize_into(path: &Path, times: FileTimes, touched: &mut usize) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Ok(());
    }
    if meta.is_dir() {
        for entry in fs::read_dir(path)? {
            normalize_into(&entry?.path(), times, touched)?;
        }
    }
    // Children first: entry updates never touch a directory's mtime, but
    // creating files would.
    File::open(path)?.set_times(times)?;
    *touched += 1;
    Ok(())
}

/// Modification time of `path`, for diagnostics and tests.
pub fn modified(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
