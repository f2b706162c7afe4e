// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Realms: the root of the topology.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::admin::{AdminOptions, Cluster};
use crate::error::{MultisiteError, MultisiteResult};
use crate::gateway::Gateway;
use crate::ids::{non_empty, PeriodId, RealmId, RealmKey};
use crate::object::{Create, Delete, Get, Set, SystemObject};
use crate::period::{Period, PeriodInfo};
use crate::user::Credentials;
use crate::zone::Zone;
use crate::zonegroup::ZoneGroup;

/// `current_period` is a bare id in `realm get` output and an embedded
/// period in `realm pull` output.
#[derive(Deserialize)]
#[serde(untagged)]
enum CurrentPeriod {
    Id(String),
    Embedded(Box<PeriodInfo>),
}

#[derive(Deserialize)]
struct RealmInfo {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    epoch: u64,
    #[serde(default)]
    current_period: Option<CurrentPeriod>,
}

/// A realm and its current period.
#[derive(Debug, Clone)]
pub struct Realm {
    id: Option<RealmId>,
    name: String,
    epoch: u64,
    current_period: Option<Period>,
    data: Option<Value>,
}

impl Realm {
    /// Create an unloaded realm with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: None, name: name.into(), epoch: 0, current_period: None, data: None }
    }

    /// Realm id, once known.
    pub fn id(&self) -> Option<&RealmId> {
        self.id.as_ref()
    }

    /// Realm name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Realm epoch; advances with every new period.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The current period, if known.
    pub fn current_period(&self) -> Option<&Period> {
        self.current_period.as_ref()
    }

    /// The current period, mutably.
    pub fn current_period_mut(&mut self) -> Option<&mut Period> {
        self.current_period.as_mut()
    }

    /// Non-owning key for this realm.
    pub fn key(&self) -> RealmKey {
        RealmKey { id: self.id.clone(), name: self.name.clone() }
    }

    /// The master zonegroup of the current period.
    pub fn master_zonegroup(&self) -> Option<&ZoneGroup> {
        self.current_period.as_ref()?.master_zonegroup()
    }

    /// The master zone of the master zonegroup.
    pub fn meta_master_zone(&self) -> Option<&Zone> {
        self.master_zonegroup()?.master_zone()
    }

    /// Finds zone `name` in any zonegroup of the current period.
    pub fn zone_by_name(&self, name: &str) -> Option<&Zone> {
        self.current_period
            .as_ref()?
            .zonegroups()
            .iter()
            .find_map(|zg| zg.zone_by_name(name))
    }

    /// Binds a cluster and gateways to zone `name`, wherever it lives in the
    /// current period. Returns false if the zone is unknown.
    pub fn bind_zone(&mut self, name: &str, cluster: Arc<dyn Cluster>, gateways: Vec<Arc<dyn Gateway>>) -> bool {
        let Some(period) = self.current_period.as_mut() else {
            return false;
        };
        let Some(zonegroup) = period
            .zonegroups()
            .iter()
            .find(|zg| zg.zone_by_name(name).is_some())
            .map(|zg| zg.name().to_string())
        else {
            return false;
        };
        match period.zonegroup_by_name_mut(&zonegroup) {
            Some(zonegroup) => zonegroup.bind(name, cluster, gateways),
            None => false,
        }
    }

    /// Joins a federation by pulling the realm from a remote gateway.
    ///
    /// On success the realm and its whole period are rebuilt from the
    /// returned snapshot.
    pub fn pull(
        &mut self,
        cluster: &dyn Cluster,
        gateway: &dyn Gateway,
        credentials: &Credentials,
        args: &[String],
    ) -> MultisiteResult<Value> {
        let endpoint = gateway.endpoint();
        let mut argv = args.to_vec();
        argv.push("--url".to_string());
        argv.push(endpoint.clone());
        argv.extend(credentials.credential_args());

        let data = self
            .json_command(cluster, "pull", &argv, &AdminOptions::default())
            .map_err(|e| e.wrap(format!("failed to pull realm {} from {}", self.name, endpoint)))?;
        info!(
            realm = %self.name,
            url = %endpoint,
            zonegroups = self.current_period.as_ref().map_or(0, |p| p.zonegroups().len()),
            "Pulled realm"
        );
        Ok(data)
    }
}

impl SystemObject for Realm {
    const KIND: &'static str = "realm";

    fn address_args(&self) -> Vec<String> {
        self.key().realm_arg()
    }

    fn load_json(&mut self, data: &Value) -> MultisiteResult<()> {
        let info: RealmInfo = serde_json::from_value(data.clone())
            .map_err(|source| MultisiteError::json("realm", data.to_string(), source))?;

        let period = match info.current_period {
            Some(CurrentPeriod::Embedded(period_info)) => {
                // An embedded period replaces the whole subtree; only bindings survive.
                let mut period = Period::new();
                period.apply_info(*period_info);
                if let Some(previous) = &self.current_period {
                    period.carry_bindings(previous);
                }
                Some(period)
            }
            Some(CurrentPeriod::Id(id)) => match non_empty::<PeriodId>(id) {
                Some(id) if self.current_period.as_ref().and_then(Period::id) == Some(&id) => {
                    self.current_period.take()
                }
                Some(id) => Some(Period::with_id(id)),
                None => self.current_period.take(),
            },
            None => self.current_period.take(),
        };

        self.id = non_empty(info.id);
        self.name = info.name;
        self.epoch = info.epoch;
        self.current_period = period;
        let key = self.key();
        if let Some(period) = self.current_period.as_mut() {
            period.set_realm(Some(key));
        }
        Ok(())
    }

    fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    fn set_data(&mut self, data: Option<Value>) {
        self.data = data;
    }
}

impl Create for Realm {}
impl Delete for Realm {}
impl Get for Realm {}
impl Set for Realm {}
