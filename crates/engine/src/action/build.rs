// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Component, Path, PathBuf};

use allci_adapters::ProcessAdapter;

use super::{blocking, ActionError, ContainerAction, StepRunner};
use crate::cache::{self, SyncMode, PACKAGE_EPOCH};
use crate::config::EngineConfig;

/// Mirror the repository, check out the branch, package if needed, build.
pub(super) async fn execute<P: ProcessAdapter>(
    action: &ContainerAction,
    steps: &StepRunner<'_, P>,
    config: &EngineConfig,
) -> Result<(), ActionError> {
    let spec = &action.spec;
    let uri = required(&spec.repository_uri, "repository_uri")?;
    let branch = required(&spec.branch, "branch")?;
    let dockerfile = required(&spec.dockerfile, "dockerfile")?;

    let mirror = cache::mirror_path(&action.cachedir, uri);
    if mirror.is_dir() {
        steps.log(&format!("Updating mirror of {}", uri));
        steps.run_checked(&config.git.fetch(&mirror)).await?;
    } else {
        steps.log(&format!("Mirroring {}", uri));
        if let Some(parent) = mirror.parent().map(Path::to_path_buf) {
            let context = format!("creating {}", parent.display());
            blocking(context, move || std::fs::create_dir_all(parent)).await?;
        }
        steps.run_checked(&config.git.clone_mirror(uri, &mirror)).await?;
    }

    let stale = action.workdir.clone();
    let context = format!("removing {}", stale.display());
    blocking(context, move || remove_stale(&stale)).await?;
    steps.log(&format!("Checking out {} of {}", branch, uri));
    steps.run_checked(&config.git.clone_branch(branch, &mirror, &action.workdir)).await?;
    if let Err(e) = steps.run(&config.git.log_head(&action.workdir)).await {
        tracing::debug!(component = %action.component, error = %e, "head summary unavailable");
    }

    let dockerfile_path = within_checkout(dockerfile)
        .map(|relative| action.workdir.join(relative))
        .ok_or_else(|| {
            ActionError::Contract(format!(
                "The dockerfile {} points outside the repository {}",
                dockerfile, uri
            ))
        })?;
    if !dockerfile_path.is_file() {
        return Err(ActionError::Contract(format!(
            "Couldn't see a dockerfile named {} in the repository {} on branch {}",
            dockerfile, uri, branch
        )));
    }

    let packaging = action.workdir.join(&config.packager.lock_file).is_file();
    let workdir_cache = action.workdir.join(&config.packager.cache_subdir);
    let persistent_cache = cache::package_cache_path(&action.cachedir);
    if packaging {
        package(action, steps, config, &persistent_cache, &workdir_cache).await?;
    }

    let build_args = spec
        .effective_build_args()
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain(config.proxy_env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    steps.log(&format!("Building {}", spec.image_name));
    steps
        .run_checked(&config.container.build(
            &spec.image_name,
            &dockerfile_path,
            build_args,
            &action.workdir,
        ))
        .await?;

    if packaging {
        let (from, to) = (workdir_cache.clone(), persistent_cache.clone());
        let stats = blocking(format!("saving package cache to {}", to.display()), move || {
            cache::sync_dir(&from, &to, SyncMode::Mirror)
        })
        .await?;
        tracing::debug!(
            component = %action.component,
            copied = stats.copied,
            removed = stats.removed,
            "package cache saved"
        );
    }
    Ok(())
}

/// Restore the persistent package cache, run the package tool, pin mtimes.
async fn package<P: ProcessAdapter>(
    action: &ContainerAction,
    steps: &StepRunner<'_, P>,
    config: &EngineConfig,
    persistent_cache: &Path,
    workdir_cache: &Path,
) -> Result<(), ActionError> {
    let (from, to) = (persistent_cache.to_path_buf(), workdir_cache.to_path_buf());
    let stats = blocking(format!("restoring package cache into {}", to.display()), move || {
        cache::sync_dir(&from, &to, SyncMode::Additive)
    })
    .await?;
    steps.log(&format!("Restored {} cached packages", stats.copied + stats.unchanged));

    steps.run_checked(&config.packager.package(&action.workdir)).await?;

    let root = workdir_cache.to_path_buf();
    let context = format!("normalizing timestamps under {}", root.display());
    blocking(context, move || cache::normalize_mtimes(&root, PACKAGE_EPOCH)).await?;
    Ok(())
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ActionError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ActionError::Contract(format!("missing required field {}", field))),
    }
}

/// `dockerfile` as a path relative to the checkout root.
///
/// Leading `/` is dropped so absolute paths name a file in the checkout.
/// Any `..` component is refused.
fn within_checkout(dockerfile: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(dockerfile).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            Component::ParentDir => return None,
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

fn remove_stale(workdir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(workdir) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
