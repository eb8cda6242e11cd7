// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task and component data model, as delivered by the CI service.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Name of the stage that builds and pushes images before running them.
pub const BOOTSTRAP_STAGE: &str = "bootstrap";

/// Identifier scalar as sent by the service.
///
/// The service may send numeric or string identifiers; the original JSON
/// shape is preserved when the value is reported back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskRef {
    Number(i64),
    Text(String),
}

impl Default for TaskRef {
    fn default() -> Self {
        TaskRef::Text(String::new())
    }
}

impl std::fmt::Display for TaskRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskRef::Number(n) => write!(f, "{}", n),
            TaskRef::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for TaskRef {
    fn from(n: i64) -> Self {
        TaskRef::Number(n)
    }
}

impl From<&str> for TaskRef {
    fn from(s: &str) -> Self {
        TaskRef::Text(s.to_string())
    }
}

/// One unit of CI work: a stage designation plus named containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskRef,
    #[serde(default)]
    pub build_id: TaskRef,
    #[serde(default)]
    pub stage: String,
    /// Task name within the stage; absent for single-task stages.
    #[serde(default)]
    pub task: Option<String>,
    pub components: IndexMap<String, ComponentSpec>,
}

impl Task {
    pub fn new(task_id: impl Into<TaskRef>, stage: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            build_id: TaskRef::default(),
            stage: stage.into(),
            task: None,
            components: IndexMap::new(),
        }
    }

    /// Add a component (replacing any existing one with the same name).
    pub fn with_component(mut self, name: impl Into<String>, spec: ComponentSpec) -> Self {
        self.components.insert(name.into(), spec);
        self
    }

    pub fn is_bootstrap(&self) -> bool {
        self.stage == BOOTSTRAP_STAGE
    }

    /// Task name rendered for logs and injected env (empty when absent).
    pub fn task_name(&self) -> &str {
        self.task.as_deref().unwrap_or("")
    }

    crate::setters! {
        into {
            build_id: TaskRef,
        }
        option {
            task: String,
        }
    }
}

/// Declarative description of one container.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComponentSpec {
    #[serde(default)]
    pub image_name: String,
    #[serde(default)]
    pub repository_uri: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub dockerfile: Option<String>,
    /// Build-time args; when absent the runtime env doubles as build args.
    #[serde(default, alias = "args", deserialize_with = "optional_scalar_map")]
    pub build_args: Option<IndexMap<String, String>>,
    #[serde(default, alias = "runtime_env", deserialize_with = "scalar_map")]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub cmd: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub tmpfs: Vec<String>,
    #[serde(default)]
    pub privileged: bool,
}

impl ComponentSpec {
    pub fn new(image_name: impl Into<String>) -> Self {
        Self { image_name: image_name.into(), ..Default::default() }
    }

    crate::setters! {
        set {
            env: IndexMap<String, String>,
            cmd: Vec<String>,
            tmpfs: Vec<String>,
            privileged: bool,
        }
        option {
            repository_uri: String,
            branch: String,
            dockerfile: String,
            build_args: IndexMap<String, String>,
            hostname: String,
        }
    }

    /// Args passed to the image build: explicit build args, else the runtime env.
    pub fn effective_build_args(&self) -> &IndexMap<String, String> {
        self.build_args.as_ref().unwrap_or(&self.env)
    }

    /// Check that every field in `required` carries a non-empty value.
    pub fn validate(&self, component: &str, required: &[SpecField]) -> Result<(), SpecError> {
        for field in required {
            let present = match field {
                SpecField::ImageName => !self.image_name.is_empty(),
                SpecField::RepositoryUri => non_empty(&self.repository_uri),
                SpecField::Branch => non_empty(&self.branch),
                SpecField::Dockerfile => non_empty(&self.dockerfile),
            };
            if !present {
                return Err(SpecError::MissingField {
                    component: component.to_string(),
                    field: *field,
                });
            }
        }
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Fields that a stage may require before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecField {
    ImageName,
    RepositoryUri,
    Branch,
    Dockerfile,
}

crate::simple_display! {
    SpecField {
        ImageName => "image_name",
        RepositoryUri => "repository_uri",
        Branch => "branch",
        Dockerfile => "dockerfile",
    }
}

/// Declared input that cannot be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("component {component:?} is missing required field {field}")]
    MissingField { component: String, field: SpecField },
}

/// Accept either a single string or a list of strings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => Vec::new(),
    })
}

/// A JSON scalar in a `KEY → VALUE` map, kept as its string form.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Null(()),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(s) => s,
            Scalar::Bool(b) => b.to_string(),
            Scalar::Signed(n) => n.to_string(),
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Null(()) => String::new(),
        }
    }
}

/// Map values may be strings, numbers, booleans or null.
fn scalar_map<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Scalar>>::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default().into_iter().map(|(k, v)| (k, v.into())).collect())
}

fn optional_scalar_map<'de, D>(
    deserializer: D,
) -> Result<Option<IndexMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Scalar>>::deserialize(deserializer)?;
    Ok(raw.map(|map| map.into_iter().map(|(k, v)| (k, v.into())).collect()))
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
