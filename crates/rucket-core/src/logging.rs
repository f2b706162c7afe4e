// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Tracing subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Error, Result};

/// Builds the log filter. `RUST_LOG` takes precedence over the configured level.
///
/// # Errors
///
/// Returns an error if the configured level is not a valid filter directive.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| Error::Logging(e.to_string())),
    }
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the level is invalid or a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let fmt_layer = tracing_subscriber::fmt::layer();

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry().with(filter).with(fmt_layer.json()).try_init(),
        LogFormat::Pretty => tracing_subscriber::registry().with(filter).with(fmt_layer).try_init(),
    };

    result.map_err(|e| Error::Logging(e.to_string()))
}
