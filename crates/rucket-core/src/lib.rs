// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Core types and utilities for the Rucket multisite tooling.
//!
//! This crate provides the building blocks shared by the multisite crates:
//! - Configuration management (TOML)
//! - Error types
//! - Tracing subscriber setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AdminConfig, Config, LogFormat, LoggingConfig};
pub use error::{Error, Result};
pub use logging::init_logging;
