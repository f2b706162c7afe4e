// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Multi-site replication topology for Rucket.
//!
//! This crate models how independent storage clusters federate into one
//! namespace and drives changes to that model through an external admin
//! tool:
//!
//! - **Topology**: [`Realm`] → [`Period`] → [`ZoneGroup`] → [`Zone`], owned
//!   top-down; children refer to parents through non-owning keys
//! - **Addressed objects**: every entity builds its own command line and
//!   reloads itself from the tool's JSON output ([`SystemObject`])
//! - **Admin channel**: the [`Cluster`] trait, a process-backed
//!   [`AdminCommand`], and in-memory clusters in [`testing`]
//! - **Federation**: realm pull, period update and commit
//!
//! The local mirror only changes after the remote command succeeds. Failed
//! commands are never retried and nothing is rolled back remotely.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────┐   owns   ┌──────────┐   owns   ┌───────────┐   owns   ┌────────┐
//! │  Realm  │─────────▶│  Period  │─────────▶│ ZoneGroup │─────────▶│  Zone  │
//! └─────────┘          └──────────┘          └───────────┘          └────────┘
//!      ▲                     ▲                     ▲                     │
//!      └──── RealmKey ───────┴──── ZoneGroupKey ───┴─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rucket_multisite::{Realm, GatewayEndpoint, Credentials, AdminCommand};
//!
//! let cluster = Arc::new(AdminCommand::from_config("c2", &config)?);
//! let mut realm = Realm::new("earth");
//! realm.pull(cluster.as_ref(), &GatewayEndpoint::http("master", 80), &creds, &[])?;
//! realm.bind_zone("us-west", cluster.clone(), Vec::new());
//!
//! let master = realm.meta_master_zone().map(|z| z.name().to_string());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod admin;
pub mod command;
pub mod connection;
pub mod error;
pub mod gateway;
pub mod ids;
pub mod object;
pub mod period;
pub mod realm;
pub mod testing;
pub mod user;
pub mod zone;
pub mod zonegroup;

pub use admin::{parse_json_output, AdminOptions, AdminOutput, Cluster};
pub use command::AdminCommand;
pub use connection::{Connector, ZoneConnection};
pub use error::{MultisiteError, MultisiteResult};
pub use gateway::{Gateway, GatewayEndpoint};
pub use ids::{PeriodId, RealmId, RealmKey, ZoneGroupId, ZoneGroupKey, ZoneId};
pub use object::{Create, Delete, Get, Modify, Set, SystemObject};
pub use period::Period;
pub use realm::Realm;
pub use user::{Credentials, User};
pub use zone::{TierType, Zone};
pub use zonegroup::ZoneGroup;
