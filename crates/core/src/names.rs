// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem and network name derivation.

/// Prefix for pod (network) names derived from the runner name.
pub const POD_PREFIX: &str = "allci-runner-";

/// Map a component name to a filesystem path segment.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, one for one, so
/// `"db/primary"` maps to `"db_primary"`.
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' { ch } else { '_' })
        .collect()
}

/// Derive the pod (network) name for a runner.
///
/// Characters the container runtime does not accept in network names
/// (anything outside `[A-Za-z0-9_.-]`) become `-`.
pub fn pod_name(runner_name: &str) -> String {
    let safe: String = runner_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-') {
                ch
            } else {
                '-'
            }
        })
        .collect();
    format!("{}{}", POD_PREFIX, safe)
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;
