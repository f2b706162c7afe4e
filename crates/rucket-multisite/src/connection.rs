// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Client connections to a zone's gateways.

use std::sync::Arc;

use tracing::info;

use crate::error::{MultisiteError, MultisiteResult};
use crate::gateway::Gateway;
use crate::ids::ZoneId;
use crate::user::Credentials;
use crate::zone::Zone;

/// Opens client sessions against a gateway endpoint.
pub trait Connector {
    /// The session type.
    type Connection;

    /// Opens a session to `endpoint` authenticated with `credentials`.
    fn connect(&self, endpoint: &str, credentials: &Credentials) -> MultisiteResult<Self::Connection>;
}

/// A lazily opened client connection to a zone.
///
/// The session is opened against the zone's first gateway on first use and
/// reused afterwards.
pub struct ZoneConnection<C: Connector> {
    zone_name: String,
    zone_id: Option<ZoneId>,
    gateway: Option<Arc<dyn Gateway>>,
    credentials: Credentials,
    connector: C,
    connection: Option<C::Connection>,
}

impl<C: Connector> ZoneConnection<C> {
    /// Prepare a connection to `zone`. Nothing is opened yet.
    pub fn new(zone: &Zone, credentials: Credentials, connector: C) -> Self {
        Self {
            zone_name: zone.name().to_string(),
            zone_id: zone.id().cloned(),
            gateway: zone.gateways().first().cloned(),
            credentials,
            connector,
            connection: None,
        }
    }

    /// Name of the zone.
    pub fn zone_name(&self) -> &str {
        &self.zone_name
    }

    /// Id of the zone, if it was known when the connection was prepared.
    pub fn zone_id(&self) -> Option<&ZoneId> {
        self.zone_id.as_ref()
    }

    /// Credentials presented to the gateway.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns true once a session has been opened.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The session, opening it if needed.
    pub fn connection(&mut self) -> MultisiteResult<&mut C::Connection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.open()?,
        };
        Ok(self.connection.insert(connection))
    }

    fn open(&self) -> MultisiteResult<C::Connection> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| MultisiteError::NoGateway(self.zone_name.clone()))?;
        let endpoint = gateway.endpoint();
        let connection = self.connector.connect(&endpoint, &self.credentials)?;
        info!(zone = %self.zone_name, endpoint = %endpoint, "Connected to zone");
        Ok(connection)
    }
}
