// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Periods: versioned snapshots of a realm's zonegroup topology.
//!
//! Reloading the same period must not lower its epoch; such a snapshot is
//! rejected. Moving to another period with a lower realm epoch is accepted
//! with a warning, since the admin tool already confirmed it. Staging
//! periods (ids ending in `:staging`, produced by an uncommitted update)
//! are loaded for inspection but do not advance the committed watermark
//! that later snapshots are checked against.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::admin::AdminOptions;
use crate::error::{MultisiteError, MultisiteResult};
use crate::ids::{non_empty, PeriodId, RealmKey, ZoneGroupId, ZoneId};
use crate::object::{Get, SystemObject};
use crate::zone::Zone;
use crate::zonegroup::{ZoneGroup, ZoneGroupInfo};

const STAGING_SUFFIX: &str = ":staging";

#[derive(Debug, Clone, Default, Deserialize)]
struct PeriodMap {
    #[serde(default)]
    zonegroups: Vec<ZoneGroupInfo>,
}

/// A period as it appears in period and realm snapshots.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PeriodInfo {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(default)]
    epoch: u64,
    #[serde(default)]
    realm_epoch: u64,
    #[serde(default, rename = "predecessor_uuid")]
    predecessor: String,
    #[serde(default)]
    master_zonegroup: String,
    #[serde(default)]
    master_zone: String,
    #[serde(default)]
    period_map: Option<PeriodMap>,
    #[serde(default)]
    zonegroups: Vec<ZoneGroupInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Watermark {
    id: PeriodId,
    epoch: u64,
    realm_epoch: u64,
}

/// A period and the zonegroups it describes.
#[derive(Debug, Clone)]
pub struct Period {
    id: Option<PeriodId>,
    epoch: u64,
    realm_epoch: u64,
    predecessor: Option<PeriodId>,
    master_zonegroup: Option<ZoneGroupId>,
    master_zone: Option<ZoneId>,
    realm: Option<RealmKey>,
    zonegroups: Vec<ZoneGroup>,
    zonegroups_by_id: HashMap<ZoneGroupId, usize>,
    zonegroups_by_name: HashMap<String, ZoneGroupId>,
    committed: Option<Watermark>,
    loaded: bool,
    data: Option<Value>,
}

impl Default for Period {
    fn default() -> Self {
        Self::new()
    }
}

impl Period {
    /// Create an unloaded period.
    pub fn new() -> Self {
        Self {
            id: None,
            epoch: 0,
            realm_epoch: 0,
            predecessor: None,
            master_zonegroup: None,
            master_zone: None,
            realm: None,
            zonegroups: Vec::new(),
            zonegroups_by_id: HashMap::new(),
            zonegroups_by_name: HashMap::new(),
            committed: None,
            loaded: false,
            data: None,
        }
    }

    /// Create an unloaded period that is known only by id.
    pub fn with_id(id: impl Into<PeriodId>) -> Self {
        Self { id: Some(id.into()), ..Self::new() }
    }

    /// Returns true once a snapshot has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Period id, once known.
    pub fn id(&self) -> Option<&PeriodId> {
        self.id.as_ref()
    }

    /// Commit counter within this period.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Position of this period in the realm's history.
    pub fn realm_epoch(&self) -> u64 {
        self.realm_epoch
    }

    /// The period this one succeeded.
    pub fn predecessor(&self) -> Option<&PeriodId> {
        self.predecessor.as_ref()
    }

    /// Returns true for an uncommitted staging period.
    pub fn is_staging(&self) -> bool {
        self.id.as_ref().is_some_and(|id| id.as_str().ends_with(STAGING_SUFFIX))
    }

    /// Realm this period belongs to.
    pub fn realm(&self) -> Option<&RealmKey> {
        self.realm.as_ref()
    }

    /// Zonegroups in snapshot order.
    pub fn zonegroups(&self) -> &[ZoneGroup] {
        &self.zonegroups
    }

    /// Zonegroup id to slot in [`Period::zonegroups`].
    pub fn zonegroups_by_id(&self) -> &HashMap<ZoneGroupId, usize> {
        &self.zonegroups_by_id
    }

    /// Zonegroup name to zonegroup id.
    pub fn zonegroups_by_name(&self) -> &HashMap<String, ZoneGroupId> {
        &self.zonegroups_by_name
    }

    /// Looks up a zonegroup by id.
    pub fn zonegroup_by_id(&self, id: &str) -> Option<&ZoneGroup> {
        self.zonegroups_by_id.get(id).map(|&slot| &self.zonegroups[slot])
    }

    /// Looks up a zonegroup by id, mutably.
    pub fn zonegroup_by_id_mut(&mut self, id: &str) -> Option<&mut ZoneGroup> {
        let slot = *self.zonegroups_by_id.get(id)?;
        self.zonegroups.get_mut(slot)
    }

    /// Looks up a zonegroup by name.
    pub fn zonegroup_by_name(&self, name: &str) -> Option<&ZoneGroup> {
        self.zonegroups_by_name.get(name).and_then(|id| self.zonegroup_by_id(id.as_str()))
    }

    /// Looks up a zonegroup by name, mutably.
    pub fn zonegroup_by_name_mut(&mut self, name: &str) -> Option<&mut ZoneGroup> {
        let slot = *self
            .zonegroups_by_name
            .get(name)
            .and_then(|id| self.zonegroups_by_id.get(id))?;
        self.zonegroups.get_mut(slot)
    }

    /// The master zonegroup, if it resolves to a member.
    pub fn master_zonegroup(&self) -> Option<&ZoneGroup> {
        self.master_zonegroup.as_ref().and_then(|id| self.zonegroup_by_id(id.as_str()))
    }

    /// Id of the metadata master zone as recorded by the period.
    pub fn master_zone_id(&self) -> Option<&ZoneId> {
        self.master_zone.as_ref()
    }

    /// Returns true if any zonegroup advertises `endpoint`.
    pub fn endpoint_exists(&self, endpoint: &str) -> bool {
        self.zonegroups.iter().any(|zg| zg.endpoint_exists(endpoint))
    }

    /// Endpoints of zone `zone_id` in zonegroup `zonegroup_id`.
    pub fn zone_endpoints(&self, zonegroup_id: &str, zone_id: &str) -> Option<&[String]> {
        self.zonegroup_by_id(zonegroup_id)?.zone_endpoints(zone_id)
    }

    /// Runs `period update` on the zone's cluster, committing if asked.
    ///
    /// The zone is only used for addressing and for its cluster binding; a
    /// clone of a member zone works.
    pub fn update(&mut self, zone: &Zone, args: &[String], commit: bool) -> MultisiteResult<Value> {
        let cluster = zone.require_cluster()?;
        let mut argv = zone.zone_args();
        argv.extend_from_slice(args);
        if commit {
            argv.push("--commit".to_string());
        }
        let data = self
            .json_command(cluster, "update", &argv, &AdminOptions::default())
            .map_err(|e| e.wrap(format!("failed to update period from zone {}", zone.name())))?;
        info!(
            zone = %zone.name(),
            period = %self.id.as_ref().map(PeriodId::as_str).unwrap_or_default(),
            epoch = self.epoch,
            commit,
            "Updated period"
        );
        Ok(data)
    }

    /// Runs `period commit` on the zone's cluster.
    pub fn commit(&mut self, zone: &Zone, args: &[String]) -> MultisiteResult<Value> {
        let cluster = zone.require_cluster()?;
        let mut argv = zone.zone_args();
        argv.extend_from_slice(args);
        let data = self
            .json_command(cluster, "commit", &argv, &AdminOptions::default())
            .map_err(|e| e.wrap(format!("failed to commit period from zone {}", zone.name())))?;
        info!(
            zone = %zone.name(),
            period = %self.id.as_ref().map(PeriodId::as_str).unwrap_or_default(),
            epoch = self.epoch,
            realm_epoch = self.realm_epoch,
            "Committed period"
        );
        Ok(data)
    }

    pub(crate) fn set_realm(&mut self, realm: Option<RealmKey>) {
        self.realm = realm;
        for zonegroup in &mut self.zonegroups {
            zonegroup.set_realm(self.realm.clone());
        }
    }

    /// Rejects snapshots that would move the same period backwards.
    pub(crate) fn check_epoch(&self, info: &PeriodInfo) -> MultisiteResult<()> {
        let Some(mark) = &self.committed else {
            return Ok(());
        };
        if mark.id == info.id.as_str() {
            if info.epoch < mark.epoch {
                return Err(MultisiteError::StaleEpoch {
                    period: info.id.clone(),
                    field: "epoch",
                    current: mark.epoch,
                    incoming: info.epoch,
                });
            }
        } else if info.realm_epoch < mark.realm_epoch {
            warn!(
                period = %info.id,
                previous = %mark.id,
                current = mark.realm_epoch,
                incoming = info.realm_epoch,
                "Period moved to a lower realm epoch"
            );
        }
        Ok(())
    }

    /// Carries cluster and gateway bindings over from `previous`, matching
    /// zones by id.
    pub(crate) fn carry_bindings(&mut self, previous: &Period) {
        for zonegroup in &mut self.zonegroups {
            let ids: Vec<ZoneId> = zonegroup.zones().iter().filter_map(|z| z.id().cloned()).collect();
            for id in ids {
                let Some(old) = previous.zonegroups.iter().find_map(|zg| zg.zone_by_id(id.as_str())) else {
                    continue;
                };
                if old.cluster().is_none() && old.gateways().is_empty() {
                    continue;
                }
                if let Some(zone) = zonegroup.zone_by_id_mut(id.as_str()) {
                    zone.bind_from(old);
                }
            }
        }
    }

    /// Replaces the period from a decoded, epoch-checked snapshot.
    pub(crate) fn apply_info(&mut self, mut info: PeriodInfo) {
        let id: Option<PeriodId> = non_empty(info.id);
        let entries = match info.period_map.take() {
            Some(map) => map.zonegroups,
            None => std::mem::take(&mut info.zonegroups),
        };

        let mut previous: HashMap<ZoneGroupId, ZoneGroup> = self
            .zonegroups
            .drain(..)
            .filter_map(|zg| zg.id().cloned().map(|zg_id| (zg_id, zg)))
            .collect();

        let mut zonegroups = Vec::with_capacity(entries.len());
        for entry in entries {
            let reused = non_empty::<ZoneGroupId>(entry.id.clone()).and_then(|zg_id| previous.remove(&zg_id));
            let zonegroup = match reused {
                Some(mut zonegroup) => {
                    zonegroup.apply_info(entry);
                    zonegroup
                }
                None => ZoneGroup::from_info(entry, None, None),
            };
            zonegroups.push(zonegroup);
        }

        if let Some(period_id) = &id {
            if !period_id.as_str().ends_with(STAGING_SUFFIX) {
                self.committed = Some(Watermark {
                    id: period_id.clone(),
                    epoch: info.epoch,
                    realm_epoch: info.realm_epoch,
                });
            }
        }

        self.id = id;
        self.epoch = info.epoch;
        self.realm_epoch = info.realm_epoch;
        self.predecessor = non_empty(info.predecessor);
        self.master_zonegroup = non_empty(info.master_zonegroup);
        self.master_zone = non_empty(info.master_zone);
        self.zonegroups = zonegroups;
        self.loaded = true;
        self.reindex();
    }

    fn reindex(&mut self) {
        self.zonegroups_by_id.clear();
        self.zonegroups_by_name.clear();

        for (slot, zonegroup) in self.zonegroups.iter_mut().enumerate() {
            zonegroup.set_period(self.id.clone());
            zonegroup.set_realm(self.realm.clone());
            let Some(id) = zonegroup.id().cloned() else {
                warn!(zonegroup = %zonegroup.name(), "Zonegroup has no id; not indexed");
                continue;
            };
            self.zonegroups_by_name.insert(zonegroup.name().to_string(), id.clone());
            self.zonegroups_by_id.insert(id, slot);
        }

        if let Some(master) = &self.master_zonegroup {
            if !self.zonegroups_by_id.contains_key(master) {
                warn!(master_zonegroup = %master, "Master zonegroup is not a member");
            }
        }
    }
}

impl SystemObject for Period {
    const KIND: &'static str = "period";

    fn address_args(&self) -> Vec<String> {
        Vec::new()
    }

    fn load_json(&mut self, data: &Value) -> MultisiteResult<()> {
        let info: PeriodInfo = serde_json::from_value(data.clone())
            .map_err(|source| MultisiteError::json("period", data.to_string(), source))?;
        self.check_epoch(&info)?;
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

impl Get for Period {}
