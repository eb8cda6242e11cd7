// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures shared by the engine's unit tests.

use std::path::Path;
use std::sync::Arc;

use allci_adapters::{FakeProcessAdapter, Invocation};
use allci_core::{ComponentSpec, TaskRef};

use crate::action::{ActionContext, ActionKind, ContainerAction};
use crate::config::{EngineConfig, RunnerIdentity};
use crate::layout::TaskLayout;
use crate::log::ActionLog;

pub const RUNNER: &str = "ci";
pub const POD: &str = "allci-runner-ci";
pub const SERVICE_URL: &str = "http://ci.local:3000";

pub fn config(root: &Path) -> EngineConfig {
    EngineConfig::new(
        RunnerIdentity::new(RUNNER, SERVICE_URL),
        root.join("build"),
        root.join("cache"),
    )
}

pub fn context(
    adapter: &FakeProcessAdapter,
    config: EngineConfig,
) -> ActionContext<FakeProcessAdapter> {
    ActionContext::new(adapter.clone(), Arc::new(config))
}

/// An action for `component` with paths resolved under `root`, directories created.
pub fn action(
    root: &Path,
    kind: ActionKind,
    component: &str,
    spec: ComponentSpec,
) -> ContainerAction {
    let layout = TaskLayout::new(&root.join("build"), &root.join("cache"), POD);
    let action = ContainerAction {
        kind,
        task_id: TaskRef::Number(42),
        build_id: TaskRef::Number(7),
        stage: "test".to_string(),
        task_name: "rspec".to_string(),
        pod_name: POD.to_string(),
        component: component.to_string(),
        spec,
        log_path: layout.log_path(component),
        workdir: layout.workdir(component),
        cachedir: layout.cachedir(component),
    };
    std::fs::create_dir_all(layout.pod_build_dir()).unwrap();
    std::fs::create_dir_all(&action.cachedir).unwrap();
    action
}

pub fn open_log(action: &ContainerAction) -> ActionLog {
    ActionLog::open(&action.log_path).unwrap()
}

pub fn build_spec(image: &str) -> ComponentSpec {
    ComponentSpec::new(image)
        .repository_uri("https://git.local/web.git")
        .branch("main")
        .dockerfile("Dockerfile")
}

/// Script `git clone --branch` to create the destination with `files`.
pub fn clone_creates(adapter: &FakeProcessAdapter, files: &'static [(&'static str, &'static str)]) {
    adapter.on("git", &["clone", "--branch"], |r| {
        r.effect(move |inv: &Invocation| {
            let Some(dest) = inv.args.last() else { return };
            let dest = Path::new(dest);
            std::fs::create_dir_all(dest).unwrap();
            for (name, content) in files {
                let path = dest.join(name);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).unwrap();
                }
                std::fs::write(path, content).unwrap();
            }
        })
    });
}

/// Script `git clone --mirror` to create the mirror directory.
pub fn mirror_creates(adapter: &FakeProcessAdapter) {
    adapter.on("git", &["clone", "--mirror"], |r| {
        r.effect(|inv: &Invocation| {
            if let Some(dest) = inv.args.last() {
                std::fs::create_dir_all(dest).unwrap();
            }
        })
    });
}
