// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! The administrative command channel.
//!
//! A [`Cluster`] is the only point of contact with a backing storage
//! cluster: it executes one admin command line and reports the captured
//! output together with the return code. A non-zero return code is a normal
//! result at this level; turning it into an error is up to the caller.

use std::fmt;

use serde_json::Value;

use crate::error::{MultisiteError, MultisiteResult};

/// Options for a single admin command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminOptions {
    /// The command only reads state. A hint; clusters may ignore it.
    pub read_only: bool,
    /// Payload written to the command's standard input.
    pub stdin: Option<String>,
}

impl AdminOptions {
    /// Options for a read-only command.
    pub fn read_only() -> Self {
        Self { read_only: true, stdin: None }
    }

    /// Options supplying a payload on standard input.
    pub fn with_stdin(payload: impl Into<String>) -> Self {
        Self { read_only: false, stdin: Some(payload.into()) }
    }
}

/// Captured result of an admin command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Return code; zero means success.
    pub retcode: i32,
}

impl AdminOutput {
    /// A successful result with the given output.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self { stdout: stdout.into(), stderr: String::new(), retcode: 0 }
    }

    /// A failed result with the given return code and error output.
    pub fn failure(retcode: i32, stderr: impl Into<String>) -> Self {
        Self { stdout: String::new(), stderr: stderr.into(), retcode }
    }

    /// Returns true if the command succeeded.
    pub fn is_success(&self) -> bool {
        self.retcode == 0
    }

    /// Converts a non-zero return code into [`MultisiteError::CommandFailed`].
    pub fn check(self, args: &[String]) -> MultisiteResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(MultisiteError::command_failed(args, self.retcode, self.stdout, self.stderr))
        }
    }
}

/// Interface for running admin commands against one storage cluster.
pub trait Cluster: Send + Sync + fmt::Debug {
    /// Human-readable cluster name, used in logs.
    fn name(&self) -> &str;

    /// Executes an admin command line.
    ///
    /// Returns `Err` only when the command could not be run at all; a
    /// command that ran and failed is reported through
    /// [`AdminOutput::retcode`].
    fn admin(&self, args: &[String], options: &AdminOptions) -> MultisiteResult<AdminOutput>;
}

/// Extracts the JSON document from raw command output.
///
/// Everything before the first `{` is discarded, since admin tools may print
/// a preamble on standard output. Output without any `{` is an error.
pub fn parse_json_output(command: &str, output: &str) -> MultisiteResult<Value> {
    let start = output.find('{').ok_or_else(|| MultisiteError::MissingJson {
        command: command.to_string(),
        retcode: None,
        output: output.to_string(),
        stderr: String::new(),
    })?;
    serde_json::from_str(&output[start..]).map_err(|source| MultisiteError::json(command, output, source))
}

/// Joins arguments into a printable command line.
pub(crate) fn command_line(args: &[String]) -> String {
    args.join(" ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_json_with_preamble() {
        let raw = "some preamble text {\"id\": \"z1\", \"name\": \"zone1\"}";
        let value = parse_json_output("zone get", raw).unwrap();
        assert_eq!(value, json!({"id": "z1", "name": "zone1"}));
    }

    #[test]
    fn test_parse_json_plain() {
        let value = parse_json_output("realm get", "{\"id\": \"r1\"}\n").unwrap();
        assert_eq!(value["id"], "r1");
    }

    #[test]
    fn test_parse_json_missing_brace() {
        let err = parse_json_output("zone delete", "deleted\n").unwrap_err();
        assert!(matches!(err, MultisiteError::MissingJson { .. }));
        assert_eq!(err.command(), Some("zone delete"));
        assert_eq!(err.stdout(), Some("deleted\n"));
    }

    #[test]
    fn test_parse_json_invalid() {
        let err = parse_json_output("zone get", "warning: {not json").unwrap_err();
        assert!(matches!(err, MultisiteError::Json { .. }));
        assert_eq!(err.stdout(), Some("warning: {not json"));
    }

    #[test]
    fn test_output_check() {
        let args = vec!["period".to_string(), "commit".to_string()];
        assert!(AdminOutput::success("{}").check(&args).is_ok());

        let err = AdminOutput::failure(22, "invalid argument").check(&args).unwrap_err();
        assert_eq!(err.retcode(), Some(22));
        assert_eq!(err.command(), Some("period commit"));
        assert_eq!(err.stderr(), Some("invalid argument"));
    }

    #[test]
    fn test_options() {
        assert!(AdminOptions::read_only().read_only);
        assert_eq!(AdminOptions::with_stdin("{}").stdin.as_deref(), Some("{}"));
        assert_eq!(AdminOptions::default(), AdminOptions { read_only: false, stdin: None });
    }
}
