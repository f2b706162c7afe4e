// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Zonegroups: collections of zones sharing one metadata namespace.
//!
//! A zonegroup owns its zones in snapshot order and keeps two indices over
//! them (id to slot, name to id), the read-write/read-only partition, the
//! per-tier grouping and the concatenated endpoint list. All of these are
//! rebuilt together whenever membership changes, so they never disagree.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{info, warn};

use crate::admin::{AdminOptions, Cluster};
use crate::error::{MultisiteError, MultisiteResult};
use crate::gateway::Gateway;
use crate::ids::{non_empty, PeriodId, RealmKey, ZoneGroupId, ZoneGroupKey, ZoneId};
use crate::object::{Create, Delete, Get, Modify, Set, SystemObject};
use crate::zone::{TierType, Zone, ZoneInfo};

/// Accepts `true`/`false` as booleans or as strings.
pub(crate) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s == "true",
    })
}

/// A zonegroup entry as it appears in zonegroup and period snapshots.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ZoneGroupInfo {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    api_name: String,
    #[serde(default, deserialize_with = "flag")]
    is_master: bool,
    #[serde(default)]
    master_zone: String,
    #[serde(default)]
    zones: Vec<ZoneInfo>,
}

/// A zonegroup and its member zones.
#[derive(Debug, Clone)]
pub struct ZoneGroup {
    id: Option<ZoneGroupId>,
    name: String,
    api_name: String,
    is_master: bool,
    master_zone: Option<ZoneId>,
    zones: Vec<Zone>,
    zones_by_id: HashMap<ZoneId, usize>,
    zones_by_name: HashMap<String, ZoneId>,
    rw_zones: Vec<usize>,
    ro_zones: Vec<usize>,
    zones_by_type: HashMap<TierType, Vec<usize>>,
    endpoints: Vec<String>,
    period: Option<PeriodId>,
    realm: Option<RealmKey>,
    data: Option<Value>,
}

impl ZoneGroup {
    /// Create an empty zonegroup with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            api_name: String::new(),
            is_master: false,
            master_zone: None,
            zones: Vec::new(),
            zones_by_id: HashMap::new(),
            zones_by_name: HashMap::new(),
            rw_zones: Vec::new(),
            ro_zones: Vec::new(),
            zones_by_type: HashMap::new(),
            endpoints: Vec::new(),
            period: None,
            realm: None,
            data: None,
        }
    }

    /// Address the zonegroup inside a realm.
    pub fn with_realm(mut self, realm: RealmKey) -> Self {
        self.set_realm(Some(realm));
        self
    }

    pub(crate) fn from_info(info: ZoneGroupInfo, period: Option<PeriodId>, realm: Option<RealmKey>) -> Self {
        let mut zonegroup = Self::new(info.name.clone());
        zonegroup.period = period;
        zonegroup.realm = realm;
        zonegroup.apply_info(info);
        zonegroup
    }

    /// Zonegroup id, once known.
    pub fn id(&self) -> Option<&ZoneGroupId> {
        self.id.as_ref()
    }

    /// Zonegroup name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used in S3 location constraints.
    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    /// Returns true if this is the realm's master zonegroup.
    pub fn is_master(&self) -> bool {
        self.is_master
    }

    /// Endpoints of all member zones, in zone order.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Member zones, in snapshot order.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Zone id to slot in [`ZoneGroup::zones`].
    pub fn zones_by_id(&self) -> &HashMap<ZoneId, usize> {
        &self.zones_by_id
    }

    /// Zone name to zone id.
    pub fn zones_by_name(&self) -> &HashMap<String, ZoneId> {
        &self.zones_by_name
    }

    /// Period this zonegroup was loaded from.
    pub fn period(&self) -> Option<&PeriodId> {
        self.period.as_ref()
    }

    /// Realm this zonegroup belongs to, as reached through its period.
    pub fn realm(&self) -> Option<&RealmKey> {
        self.realm.as_ref()
    }

    /// Non-owning key for this zonegroup.
    pub fn key(&self) -> ZoneGroupKey {
        ZoneGroupKey {
            id: self.id.clone(),
            name: self.name.clone(),
            period: self.period.clone(),
            realm: self.realm.clone(),
        }
    }

    /// The master zone, if it resolves to a member.
    pub fn master_zone(&self) -> Option<&Zone> {
        self.master_zone.as_ref().and_then(|id| self.zone_by_id(id.as_str()))
    }

    /// Looks up a member zone by id.
    pub fn zone_by_id(&self, id: &str) -> Option<&Zone> {
        self.zones_by_id.get(id).map(|&slot| &self.zones[slot])
    }

    /// Looks up a member zone by id, mutably.
    pub fn zone_by_id_mut(&mut self, id: &str) -> Option<&mut Zone> {
        let slot = *self.zones_by_id.get(id)?;
        self.zones.get_mut(slot)
    }

    /// Looks up a member zone by name.
    pub fn zone_by_name(&self, name: &str) -> Option<&Zone> {
        self.zones_by_name.get(name).and_then(|id| self.zone_by_id(id.as_str()))
    }

    /// Looks up a member zone by name, mutably.
    pub fn zone_by_name_mut(&mut self, name: &str) -> Option<&mut Zone> {
        let slot = *self.zones_by_name.get(name).and_then(|id| self.zones_by_id.get(id))?;
        self.zones.get_mut(slot)
    }

    /// Zones that accept client writes.
    pub fn rw_zones(&self) -> impl Iterator<Item = &Zone> + '_ {
        self.rw_zones.iter().map(|&slot| &self.zones[slot])
    }

    /// Zones that only mirror data.
    pub fn ro_zones(&self) -> impl Iterator<Item = &Zone> + '_ {
        self.ro_zones.iter().map(|&slot| &self.zones[slot])
    }

    /// Zones of the given tier.
    pub fn zones_of_type<'a>(&'a self, tier: &TierType) -> impl Iterator<Item = &'a Zone> + 'a {
        self.zones_by_type
            .get(tier)
            .into_iter()
            .flatten()
            .map(|&slot| &self.zones[slot])
    }

    /// Returns true if any member zone advertises `endpoint`.
    pub fn endpoint_exists(&self, endpoint: &str) -> bool {
        self.endpoints.iter().any(|e| e == endpoint)
    }

    /// Endpoints of the member zone with the given id.
    pub fn zone_endpoints(&self, zone_id: &str) -> Option<&[String]> {
        self.zone_by_id(zone_id).map(Zone::endpoints)
    }

    /// Binds a cluster and gateways to the member zone `zone_name`.
    ///
    /// Returns false if no such zone exists.
    pub fn bind(&mut self, zone_name: &str, cluster: Arc<dyn Cluster>, gateways: Vec<Arc<dyn Gateway>>) -> bool {
        match self.zone_by_name_mut(zone_name) {
            Some(zone) => {
                zone.cluster = Some(cluster);
                zone.gateways = gateways;
                true
            }
            None => false,
        }
    }

    /// Adds `zone` to this zonegroup.
    ///
    /// Runs `zonegroup add` and reloads from the returned snapshot. The
    /// caller's zone learns its id and its zonegroup key; the member copy
    /// keeps the caller's cluster and gateway bindings. On failure nothing
    /// changes.
    pub fn add(&mut self, cluster: &dyn Cluster, zone: &mut Zone, args: &[String]) -> MultisiteResult<Value> {
        let mut argv = args.to_vec();
        argv.extend(zone.zone_arg());
        let data = self
            .json_command(cluster, "add", &argv, &AdminOptions::default())
            .map_err(|e| e.wrap(format!("failed to add zone {} to zonegroup {}", zone.name(), self.name)))?;

        self.adopt(zone);
        info!(zonegroup = %self.name, zone = %zone.name(), zones = self.zones.len(), "Added zone to zonegroup");
        Ok(data)
    }

    /// Removes `zone` from this zonegroup.
    ///
    /// The command is issued even if the zone is not a local member. On
    /// success the zone is gone from the mirror and its zonegroup key is
    /// cleared if it pointed here.
    pub fn remove(&mut self, cluster: &dyn Cluster, zone: &mut Zone, args: &[String]) -> MultisiteResult<Value> {
        let mut argv = args.to_vec();
        argv.extend(zone.zone_arg());
        let data = self
            .json_command(cluster, "remove", &argv, &AdminOptions::default())
            .map_err(|e| e.wrap(format!("failed to remove zone {} from zonegroup {}", zone.name(), self.name)))?;

        let before = self.zones.len();
        self.zones.retain(|member| !member.matches(zone));
        if self.zones.len() != before {
            self.reindex();
        }

        let key = self.key();
        match zone.zonegroup.as_ref() {
            Some(current) if current.same_zonegroup(&key) => zone.zonegroup = None,
            Some(current) => {
                warn!(
                    zone = %zone.name(),
                    zonegroup = %self.name,
                    member_of = %current.name,
                    "Removed zone belongs to another zonegroup; keeping its key"
                );
            }
            None => {
                warn!(zone = %zone.name(), zonegroup = %self.name, "Removed zone had no zonegroup");
            }
        }
        info!(zonegroup = %self.name, zone = %zone.name(), zones = self.zones.len(), "Removed zone from zonegroup");
        Ok(data)
    }

    pub(crate) fn set_period(&mut self, period: Option<PeriodId>) {
        self.period = period;
        self.refresh_zone_keys();
    }

    pub(crate) fn set_realm(&mut self, realm: Option<RealmKey>) {
        self.realm = realm;
        self.refresh_zone_keys();
    }

    /// Replaces the zonegroup from a decoded snapshot.
    ///
    /// Zones are reused by id so their bindings survive.
    pub(crate) fn apply_info(&mut self, info: ZoneGroupInfo) {
        let mut previous: HashMap<ZoneId, Zone> = self
            .zones
            .drain(..)
            .filter_map(|zone| zone.id().cloned().map(|id| (id, zone)))
            .collect();

        let zones = info
            .zones
            .into_iter()
            .map(|entry| {
                let reused = non_empty::<ZoneId>(entry.id.clone()).and_then(|id| previous.remove(&id));
                let mut zone = reused.unwrap_or_else(|| Zone::new(entry.name.clone()));
                zone.apply_info(entry);
                zone
            })
            .collect();

        self.id = non_empty(info.id);
        self.name = info.name;
        self.api_name = info.api_name;
        self.is_master = info.is_master;
        self.master_zone = non_empty(info.master_zone);
        self.zones = zones;
        self.reindex();
    }

    fn adopt(&mut self, zone: &mut Zone) {
        match self.zones.iter_mut().find(|member| member.matches(zone)) {
            Some(member) => {
                member.bind_from(zone);
                if zone.id().is_none() {
                    if let Some(id) = member.id().cloned() {
                        *zone = zone.clone().with_id(id);
                    }
                }
            }
            None => {
                self.zones.push(zone.clone());
                self.reindex();
            }
        }
        self.refresh_zone_keys();
        zone.zonegroup = Some(self.key());
    }

    fn reindex(&mut self) {
        self.zones_by_id.clear();
        self.zones_by_name.clear();
        self.rw_zones.clear();
        self.ro_zones.clear();
        self.zones_by_type.clear();
        self.endpoints.clear();

        for (slot, zone) in self.zones.iter().enumerate() {
            self.endpoints.extend(zone.endpoints().iter().cloned());
            self.zones_by_type.entry(zone.tier_type().clone()).or_default().push(slot);
            if zone.is_read_only() {
                self.ro_zones.push(slot);
            } else {
                self.rw_zones.push(slot);
            }
            // Id-less zones stay partitioned but cannot be looked up.
            let Some(id) = zone.id().cloned() else {
                warn!(zonegroup = %self.name, zone = %zone.name(), "Zone has no id; not indexed");
                continue;
            };
            self.zones_by_id.insert(id.clone(), slot);
            self.zones_by_name.insert(zone.name().to_string(), id);
        }

        if let Some(master) = &self.master_zone {
            if !self.zones_by_id.contains_key(master) {
                warn!(zonegroup = %self.name, master_zone = %master, "Master zone is not a member");
            }
        }
        self.refresh_zone_keys();
    }

    fn refresh_zone_keys(&mut self) {
        let key = self.key();
        for zone in &mut self.zones {
            zone.zonegroup = Some(key.clone());
        }
    }
}

impl SystemObject for ZoneGroup {
    const KIND: &'static str = "zonegroup";

    fn address_args(&self) -> Vec<String> {
        self.key().zonegroup_args()
    }

    fn load_json(&mut self, data: &Value) -> MultisiteResult<()> {
        let info: ZoneGroupInfo = serde_json::from_value(data.clone())
            .map_err(|source| MultisiteError::json("zonegroup", data.to_string(), source))?;
        self.apply_info(info);
        Ok(())
    }

    fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    fn set_data(&mut self, data: Option<Value>) {
        self.data = data;
    }
}

impl Create for ZoneGroup {}
impl Delete for ZoneGroup {}
impl Get for ZoneGroup {}
impl Set for ZoneGroup {}
impl Modify for ZoneGroup {}
