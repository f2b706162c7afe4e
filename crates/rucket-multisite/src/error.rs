// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Error types for multisite topology operations.

use thiserror::Error;

use crate::admin::AdminOutput;

/// Result type for multisite operations.
pub type MultisiteResult<T> = Result<T, MultisiteError>;

/// Errors that can occur while driving the multisite topology.
#[derive(Debug, Error)]
pub enum MultisiteError {
    /// An admin command returned a non-zero status.
    #[error("command `{command}` failed with return code {retcode}: {}", .stderr.trim())]
    CommandFailed {
        /// The full command line that was executed.
        command: String,
        /// The return code reported by the admin channel.
        retcode: i32,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// A higher-level operation failed because a dependent call failed.
    #[error("{context}: {source}")]
    Wrapped {
        /// Description of the operation that was attempted.
        context: String,
        /// The underlying failure.
        source: Box<MultisiteError>,
    },

    /// Command output contained no JSON object.
    #[error("no JSON object in output of `{command}`")]
    MissingJson {
        /// The command that produced the output.
        command: String,
        /// Return code, when the output came from a command.
        retcode: Option<i32>,
        /// The raw output.
        output: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Command output or a snapshot could not be decoded.
    #[error("invalid JSON from `{command}`: {source}")]
    Json {
        /// The command (or entity) the JSON came from.
        command: String,
        /// Return code, when the output came from a command.
        retcode: Option<i32>,
        /// The raw output or snapshot.
        output: String,
        /// Captured standard error.
        stderr: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// The acting zone has no admin cluster bound.
    #[error("zone {0} has no admin cluster bound")]
    NoCluster(String),

    /// The zone has no gateway to connect to.
    #[error("zone {0} has no gateways")]
    NoGateway(String),

    /// A period snapshot would move the epoch backwards.
    #[error("stale snapshot for period {period}: {field} {incoming} < {current}")]
    StaleEpoch {
        /// Period id.
        period: String,
        /// Which counter regressed.
        field: &'static str,
        /// Counter value currently loaded.
        current: u64,
        /// Counter value in the rejected snapshot.
        incoming: u64,
    },

    /// An admin command did not finish in time.
    #[error("command `{command}` timed out after {timeout_ms}ms")]
    Timeout {
        /// The command line.
        command: String,
        /// Timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The admin command could not be run.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Gateway control failed.
    #[error("gateway {endpoint}: {message}")]
    Gateway {
        /// Gateway endpoint.
        endpoint: String,
        /// Error message.
        message: String,
    },

    /// Configuration error.
    #[error(transparent)]
    Core(#[from] rucket_core::Error),
}

impl MultisiteError {
    /// Create a command failure from a command line and its captured output.
    pub fn command_failed(
        args: &[String],
        retcode: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: args.join(" "),
            retcode,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a decode error for JSON that did not come straight from a command.
    pub fn json(command: impl Into<String>, output: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json { command: command.into(), retcode: None, output: output.into(), stderr: String::new(), source }
    }

    /// Attaches the command line and captured output to a decode error.
    /// Other errors are returned unchanged.
    pub(crate) fn with_output(self, line: &str, captured: &AdminOutput) -> Self {
        match self {
            Self::Json { source, .. } => Self::Json {
                command: line.to_string(),
                retcode: Some(captured.retcode),
                output: captured.stdout.clone(),
                stderr: captured.stderr.clone(),
                source,
            },
            Self::MissingJson { .. } => Self::MissingJson {
                command: line.to_string(),
                retcode: Some(captured.retcode),
                output: captured.stdout.clone(),
                stderr: captured.stderr.clone(),
            },
            other => other,
        }
    }

    /// Wrap this error with the context of a higher-level operation.
    #[must_use]
    pub fn wrap(self, context: impl Into<String>) -> Self {
        Self::Wrapped { context: context.into(), source: Box::new(self) }
    }

    /// Create a gateway error.
    pub fn gateway(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Gateway { endpoint: endpoint.into(), message: message.into() }
    }

    /// The innermost error, looking through any wrapping.
    pub fn root(&self) -> &Self {
        match self {
            Self::Wrapped { source, .. } => source.root(),
            other => other,
        }
    }

    /// The failing command line, if the root cause was a command failure.
    pub fn command(&self) -> Option<&str> {
        match self.root() {
            Self::CommandFailed { command, .. }
            | Self::Timeout { command, .. }
            | Self::MissingJson { command, .. }
            | Self::Json { command, .. } => Some(command),
            _ => None,
        }
    }

    /// Return code of the failed command.
    pub fn retcode(&self) -> Option<i32> {
        match self.root() {
            Self::CommandFailed { retcode, .. } => Some(*retcode),
            Self::MissingJson { retcode, .. } | Self::Json { retcode, .. } => *retcode,
            _ => None,
        }
    }

    /// Standard output of the failed command.
    pub fn stdout(&self) -> Option<&str> {
        match self.root() {
            Self::CommandFailed { stdout, .. } => Some(stdout),
            Self::MissingJson { output, .. } | Self::Json { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Standard error of the failed command.
    pub fn stderr(&self) -> Option<&str> {
        match self.root() {
            Self::CommandFailed { stderr, .. }
            | Self::MissingJson { stderr, .. }
            | Self::Json { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Returns true if the remote admin command reported failure.
    pub fn is_command_failure(&self) -> bool {
        matches!(self.root(), Self::CommandFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> MultisiteError {
        let args = vec!["zone".to_string(), "get".to_string(), "--rgw-zone".to_string(), "z1".to_string()];
        MultisiteError::command_failed(&args, 2, "", "failed to load zone: (2) No such file\n")
    }

    #[test]
    fn test_command_failed_display() {
        let err = failure();
        assert_eq!(
            err.to_string(),
            "command `zone get --rgw-zone z1` failed with return code 2: failed to load zone: (2) No such file"
        );
        assert!(err.is_command_failure());
    }

    #[test]
    fn test_wrapped_preserves_diagnostics() {
        let err = failure().wrap("failed to add zone z1").wrap("failed to build federation");

        assert!(err.to_string().starts_with("failed to build federation: failed to add zone z1: command"));
        assert_eq!(err.retcode(), Some(2));
        assert_eq!(err.command(), Some("zone get --rgw-zone z1"));
        assert_eq!(err.stdout(), Some(""));
        assert!(err.stderr().unwrap().contains("No such file"));
        assert!(err.is_command_failure());
    }

    #[test]
    fn test_stale_epoch_display() {
        let err = MultisiteError::StaleEpoch { period: "p1".to_string(), field: "epoch", current: 4, incoming: 3 };
        assert_eq!(err.to_string(), "stale snapshot for period p1: epoch 3 < 4");
        assert_eq!(err.retcode(), None);
    }

    #[test]
    fn test_gateway_error() {
        let err = MultisiteError::gateway("http://h1:80", "not running");
        assert!(err.to_string().contains("http://h1:80"));
        assert!(!err.is_command_failure());
    }
}
