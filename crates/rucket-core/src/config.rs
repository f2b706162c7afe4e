// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Configuration management for the multisite tooling.
//!
//! Configuration is read from TOML. Every section is optional and falls back
//! to its defaults:
//!
//! ```toml
//! [admin]
//! binary = "radosgw-admin"
//! args = ["--cluster", "c1"]
//! timeout_ms = 60000
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default admin tool invoked for topology commands.
pub const DEFAULT_ADMIN_BINARY: &str = "radosgw-admin";

/// Default timeout for a single admin command in milliseconds.
pub const DEFAULT_ADMIN_TIMEOUT_MS: u64 = 60_000;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Admin command channel configuration.
    pub admin: AdminConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        let config = Self::parse(&content).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Rejected configuration file");
            e
        })?;
        debug!(
            path = %path.display(),
            binary = %config.admin.binary.display(),
            timeout_ms = config.admin.timeout_ms,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed or validated.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.admin.validate()
    }
}

/// Configuration for the process-backed admin command channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Admin tool to execute.
    pub binary: PathBuf,
    /// Global arguments placed before every command (e.g. `--cluster c1`).
    pub args: Vec<String>,
    /// Timeout for a single command in milliseconds. The child is killed
    /// when it is exceeded.
    pub timeout_ms: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_ADMIN_BINARY),
            args: Vec::new(),
            timeout_ms: DEFAULT_ADMIN_TIMEOUT_MS,
        }
    }
}

impl AdminConfig {
    /// Creates a configuration for the given admin binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into(), ..Default::default() }
    }

    /// Adds a global argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets the command timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns the command timeout as a Duration.
    #[must_use]
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates the admin settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary is empty or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.binary.as_os_str().is_empty() {
            return Err(Error::config("admin.binary must not be empty"));
        }
        if self.timeout_ms == 0 {
            return Err(Error::config("admin.timeout_ms must be positive"));
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format.
    #[default]
    Pretty,
    /// JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub level: String,
    /// Log output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}
