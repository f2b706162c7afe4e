// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Gateways serving a zone.

use std::fmt;

use tracing::debug;

use crate::error::MultisiteResult;

/// Control interface for an object gateway.
pub trait Gateway: Send + Sync + fmt::Debug {
    /// Base URL of the gateway, `<scheme>://<host>:<port>`.
    fn endpoint(&self) -> String;

    /// Starts the gateway.
    fn start(&self) -> MultisiteResult<()>;

    /// Stops the gateway.
    fn stop(&self) -> MultisiteResult<()>;
}

/// A gateway that is managed elsewhere and only known by its address.
///
/// Starting and stopping are no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEndpoint {
    /// URL scheme.
    pub proto: String,
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl GatewayEndpoint {
    /// Create an endpoint.
    pub fn new(proto: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self { proto: proto.into(), host: host.into(), port }
    }

    /// A plain HTTP endpoint.
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self::new("http", host, port)
    }
}

impl Gateway for GatewayEndpoint {
    fn endpoint(&self) -> String {
        format!("{}://{}:{}", self.proto, self.host, self.port)
    }

    fn start(&self) -> MultisiteResult<()> {
        debug!(endpoint = %self.endpoint(), "Gateway start requested");
        Ok(())
    }

    fn stop(&self) -> MultisiteResult<()> {
        debug!(endpoint = %self.endpoint(), "Gateway stop requested");
        Ok(())
    }
}
