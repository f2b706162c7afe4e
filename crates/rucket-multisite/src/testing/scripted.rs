// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! A cluster that replays queued outputs.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::admin::{AdminOptions, AdminOutput, Cluster};
use crate::error::MultisiteResult;

/// Return code used when no output is queued.
pub const UNSCRIPTED_RETCODE: i32 = 255;

/// A single admin call as seen by a test cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Full command line.
    pub args: Vec<String>,
    /// Options the call was made with.
    pub options: AdminOptions,
}

impl RecordedCall {
    /// Returns true if `flag` appears immediately followed by `value`.
    pub fn has_arg(&self, flag: &str, value: &str) -> bool {
        self.args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }
}

/// Replays queued [`AdminOutput`]s in order.
///
/// Once the queue is empty every call fails with [`UNSCRIPTED_RETCODE`].
#[derive(Debug)]
pub struct ScriptedCluster {
    name: String,
    responses: Mutex<VecDeque<AdminOutput>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCluster {
    /// Create a cluster with an empty script.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), responses: Mutex::new(VecDeque::new()), calls: Mutex::new(Vec::new()) }
    }

    /// Queue an output.
    pub fn push(&self, output: AdminOutput) {
        self.responses.lock().push_back(output);
    }

    /// Queue a successful output.
    pub fn push_success(&self, stdout: impl Into<String>) {
        self.push(AdminOutput::success(stdout));
    }

    /// Queue a failure.
    pub fn push_failure(&self, retcode: i32, stderr: impl Into<String>) {
        self.push(AdminOutput::failure(retcode, stderr));
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Cluster for ScriptedCluster {
    fn name(&self) -> &str {
        &self.name
    }

    fn admin(&self, args: &[String], options: &AdminOptions) -> MultisiteResult<AdminOutput> {
        self.calls.lock().push(RecordedCall { args: args.to_vec(), options: options.clone() });
        let output = self.responses.lock().pop_front().unwrap_or_else(|| {
            AdminOutput::failure(UNSCRIPTED_RETCODE, format!("no scripted output for `{}`", args.join(" ")))
        });
        Ok(output)
    }
}
