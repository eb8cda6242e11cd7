// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable process adapter for tests.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::process::{Captured, Invocation, ProcessAdapter, ProcessError, Sink};

type Effect = Arc<dyn Fn(&Invocation) + Send + Sync>;

/// Scripted response for invocations matching a program and argument prefix.
#[derive(Clone)]
pub struct FakeRule {
    program: String,
    prefix: Vec<String>,
    contains: Option<String>,
    exit_code: i32,
    output: String,
    stdout: String,
    delay: Option<Duration>,
    hold_until_stop: bool,
    spawn_error: bool,
    effect: Option<Effect>,
}

impl FakeRule {
    fn new(program: &str, prefix: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            contains: None,
            exit_code: 0,
            output: String::new(),
            stdout: String::new(),
            delay: None,
            hold_until_stop: false,
            spawn_error: false,
            effect: None,
        }
    }

    fn matches(&self, invocation: &Invocation) -> bool {
        let prefix: Vec<&str> = self.prefix.iter().map(String::as_str).collect();
        invocation.matches(&self.program, &prefix)
            && self.contains.as_ref().is_none_or(|needle| invocation.args.contains(needle))
    }

    /// Only match invocations that also carry this exact argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.contains = Some(arg.into());
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Text written to the log sink (if any) before exiting.
    pub fn output(mut self, text: impl Into<String>) -> Self {
        self.output = text.into();
        self
    }

    /// Text returned from `capture`.
    pub fn stdout(mut self, text: impl Into<String>) -> Self {
        self.stdout = text.into();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Block until a `stop` invocation is seen, like a long-running container.
    pub fn hold_until_stop(mut self) -> Self {
        self.hold_until_stop = true;
        self
    }

    /// Fail to spawn instead of running.
    pub fn spawn_error(mut self) -> Self {
        self.spawn_error = true;
        self
    }

    /// Side effect applied when the invocation runs (e.g. create a clone directory).
    pub fn effect(mut self, f: impl Fn(&Invocation) + Send + Sync + 'static) -> Self {
        self.effect = Some(Arc::new(f));
        self
    }
}

struct FakeState {
    rules: Vec<FakeRule>,
    calls: Vec<Invocation>,
}

/// Fake process adapter that records invocations and replays scripted rules.
///
/// Rules added later take precedence. Unmatched invocations exit 0 with no
/// output. Any invocation whose arguments start with `stop` (for the
/// configured stop program) releases every held invocation.
#[derive(Clone)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeState>>,
    stop_program: Arc<str>,
    stopped: watch::Sender<bool>,
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl FakeProcessAdapter {
    /// Create a fake that treats `<stop_program> stop …` as the stop signal.
    pub fn new(stop_program: &str) -> Self {
        let (stopped, _) = watch::channel(false);
        Self {
            inner: Arc::new(Mutex::new(FakeState { rules: Vec::new(), calls: Vec::new() })),
            stop_program: Arc::from(stop_program),
            stopped,
        }
    }

    /// Register a rule built from `program` and an argument prefix.
    pub fn on(&self, program: &str, prefix: &[&str], build: impl FnOnce(FakeRule) -> FakeRule) {
        let rule = build(FakeRule::new(program, prefix));
        self.inner.lock().rules.push(rule);
    }

    /// All recorded invocations, in call order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.inner.lock().calls.clone()
    }

    /// Recorded invocations matching `program` and an argument prefix.
    pub fn calls_matching(&self, program: &str, prefix: &[&str]) -> Vec<Invocation> {
        self.inner.lock().calls.iter().filter(|c| c.matches(program, prefix)).cloned().collect()
    }

    pub fn was_stopped(&self) -> bool {
        *self.stopped.borrow()
    }

    fn begin(&self, invocation: &Invocation) -> Option<FakeRule> {
        let mut state = self.inner.lock();
        state.calls.push(invocation.clone());
        state.rules.iter().rev().find(|r| r.matches(invocation)).cloned()
    }

    async fn play(&self, invocation: &Invocation, rule: &FakeRule) -> Result<(), ProcessError> {
        if rule.spawn_error {
            return Err(ProcessError::SpawnFailed {
                command: invocation.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "fake spawn error"),
            });
        }
        if let Some(ref effect) = rule.effect {
            effect(invocation);
        }
        if let Some(delay) = rule.delay {
            tokio::time::sleep(delay).await;
        }
        if rule.hold_until_stop {
            let mut rx = self.stopped.subscribe();
            loop {
                let stopped = *rx.borrow_and_update();
                if stopped || rx.changed().await.is_err() {
                    break;
                }
            }
        }
        Ok(())
    }

    fn observe_stop(&self, invocation: &Invocation) {
        if invocation.matches(&self.stop_program, &["stop"]) {
            self.stopped.send_replace(true);
        }
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn run(&self, invocation: &Invocation, sink: Sink) -> Result<i32, ProcessError> {
        let rule = self.begin(invocation);
        self.observe_stop(invocation);
        let Some(rule) = rule else {
            return Ok(0);
        };
        self.play(invocation, &rule).await?;
        if let Sink::File(mut file) = sink {
            if !rule.output.is_empty() {
                let _ = file.write_all(rule.output.as_bytes());
            }
        }
        Ok(rule.exit_code)
    }

    async fn capture(&self, invocation: &Invocation) -> Result<Captured, ProcessError> {
        let rule = self.begin(invocation);
        self.observe_stop(invocation);
        let Some(rule) = rule else {
            return Ok(Captured::default());
        };
        self.play(invocation, &rule).await?;
        Ok(Captured { exit_code: rule.exit_code, stdout: rule.stdout.clone() })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
