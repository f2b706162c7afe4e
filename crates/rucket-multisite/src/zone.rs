// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Zones: the leaves of the topology, one per storage cluster.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::admin::Cluster;
use crate::connection::{Connector, ZoneConnection};
use crate::error::{MultisiteError, MultisiteResult};
use crate::gateway::Gateway;
use crate::ids::{non_empty, PeriodId, RealmKey, ZoneGroupKey, ZoneId};
use crate::object::{Create, Delete, Get, Modify, Set, SystemObject};
use crate::user::Credentials;

/// Sync module a zone runs.
///
/// Plain gateway zones (`rgw`, or an empty string) serve reads and writes.
/// Every other tier only mirrors data from its peers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TierType {
    /// Regular read-write zone.
    #[default]
    Rgw,
    /// Search index tier.
    Elasticsearch,
    /// Cloud sync tier.
    Cloud,
    /// Notification tier.
    PubSub,
    /// Archive tier; keeps every object version.
    Archive,
    /// A tier this crate does not know about.
    Other(String),
}

impl TierType {
    /// The tier name as used on the command line.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rgw => "rgw",
            Self::Elasticsearch => "elasticsearch",
            Self::Cloud => "cloud",
            Self::PubSub => "pubsub",
            Self::Archive => "archive",
            Self::Other(name) => name,
        }
    }

    /// Returns true if zones of this tier do not accept client writes.
    pub fn is_read_only(&self) -> bool {
        !matches!(self, Self::Rgw)
    }

    /// Returns true if zones of this tier hold bucket data.
    pub fn has_buckets(&self) -> bool {
        matches!(self, Self::Rgw | Self::Archive)
    }
}

impl From<&str> for TierType {
    fn from(s: &str) -> Self {
        match s {
            "" | "rgw" => Self::Rgw,
            "elasticsearch" => Self::Elasticsearch,
            "cloud" => Self::Cloud,
            "pubsub" => Self::PubSub,
            "archive" => Self::Archive,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for TierType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<TierType> for String {
    fn from(tier: TierType) -> Self {
        tier.as_str().to_string()
    }
}

impl fmt::Display for TierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A zone entry as it appears in zone and zonegroup snapshots.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ZoneInfo {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) endpoints: Vec<String>,
    #[serde(default)]
    pub(crate) tier_type: TierType,
}

impl ZoneInfo {
    pub(crate) fn decode(data: &Value) -> MultisiteResult<Self> {
        serde_json::from_value(data.clone())
            .map_err(|source| MultisiteError::json("zone", data.to_string(), source))
    }
}

/// A zone and the local bindings needed to act on it.
///
/// The cluster and gateway bindings are not part of any snapshot; they
/// survive reloads of the owning zonegroup.
#[derive(Debug, Clone)]
pub struct Zone {
    id: Option<ZoneId>,
    name: String,
    endpoints: Vec<String>,
    tier_type: TierType,
    pub(crate) zonegroup: Option<ZoneGroupKey>,
    pub(crate) cluster: Option<Arc<dyn Cluster>>,
    pub(crate) gateways: Vec<Arc<dyn Gateway>>,
    data: Option<Value>,
}

impl Zone {
    /// Create an unloaded zone with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            endpoints: Vec::new(),
            tier_type: TierType::default(),
            zonegroup: None,
            cluster: None,
            gateways: Vec::new(),
            data: None,
        }
    }

    /// Set the zone id.
    pub fn with_id(mut self, id: impl Into<ZoneId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the zone endpoints.
    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the tier type.
    pub fn with_tier_type(mut self, tier_type: TierType) -> Self {
        self.tier_type = tier_type;
        self
    }

    /// Address the zone inside a zonegroup.
    pub fn with_zonegroup(mut self, zonegroup: ZoneGroupKey) -> Self {
        self.zonegroup = Some(zonegroup);
        self
    }

    /// Bind the admin cluster that hosts this zone.
    pub fn with_cluster(mut self, cluster: Arc<dyn Cluster>) -> Self {
        self.cluster = Some(cluster);
        self
    }

    /// Bind the gateways serving this zone.
    pub fn with_gateways(mut self, gateways: Vec<Arc<dyn Gateway>>) -> Self {
        self.gateways = gateways;
        self
    }

    /// Zone id, once known.
    pub fn id(&self) -> Option<&ZoneId> {
        self.id.as_ref()
    }

    /// Zone name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoints the zone advertises.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Tier type.
    pub fn tier_type(&self) -> &TierType {
        &self.tier_type
    }

    /// Returns true if the zone does not accept client writes.
    pub fn is_read_only(&self) -> bool {
        self.tier_type.is_read_only()
    }

    /// Returns true if the zone holds bucket data.
    pub fn has_buckets(&self) -> bool {
        self.tier_type.has_buckets()
    }

    /// Key of the zonegroup this zone belongs to, if any.
    pub fn zonegroup(&self) -> Option<&ZoneGroupKey> {
        self.zonegroup.as_ref()
    }

    /// Period the owning zonegroup was loaded from.
    pub fn period(&self) -> Option<&PeriodId> {
        self.zonegroup.as_ref().and_then(|zg| zg.period.as_ref())
    }

    /// Realm of the owning zonegroup.
    pub fn realm(&self) -> Option<&RealmKey> {
        self.zonegroup.as_ref().and_then(|zg| zg.realm.as_ref())
    }

    /// The bound admin cluster.
    pub fn cluster(&self) -> Option<&Arc<dyn Cluster>> {
        self.cluster.as_ref()
    }

    /// The bound gateways.
    pub fn gateways(&self) -> &[Arc<dyn Gateway>] {
        &self.gateways
    }

    /// The bound cluster, or [`MultisiteError::NoCluster`].
    pub fn require_cluster(&self) -> MultisiteResult<&dyn Cluster> {
        self.cluster.as_deref().ok_or_else(|| MultisiteError::NoCluster(self.name.clone()))
    }

    /// Tokens that select this zone alone.
    pub fn zone_arg(&self) -> Vec<String> {
        vec!["--rgw-zone".to_string(), self.name.clone()]
    }

    /// Tokens that select this zone and all of its ancestors.
    pub fn zone_args(&self) -> Vec<String> {
        self.address_args()
    }

    /// Starts every gateway of the zone.
    pub fn start(&self) -> MultisiteResult<()> {
        for gateway in &self.gateways {
            gateway.start()?;
        }
        info!(zone = %self.name, gateways = self.gateways.len(), "Zone started");
        Ok(())
    }

    /// Stops every gateway of the zone.
    pub fn stop(&self) -> MultisiteResult<()> {
        for gateway in &self.gateways {
            gateway.stop()?;
        }
        info!(zone = %self.name, gateways = self.gateways.len(), "Zone stopped");
        Ok(())
    }

    /// Builds a connection to this zone. Nothing is opened until first use.
    pub fn connect<C: Connector>(&self, credentials: Credentials, connector: C) -> ZoneConnection<C> {
        ZoneConnection::new(self, credentials, connector)
    }

    /// Replaces snapshot fields. Bindings and the zonegroup key are kept.
    pub(crate) fn apply_info(&mut self, info: ZoneInfo) {
        self.id = non_empty(info.id);
        self.name = info.name;
        self.endpoints = info.endpoints;
        self.tier_type = info.tier_type;
    }

    /// Takes the local bindings of `other`.
    pub(crate) fn bind_from(&mut self, other: &Zone) {
        self.cluster = other.cluster.clone();
        self.gateways = other.gateways.clone();
    }

    pub(crate) fn matches(&self, other: &Zone) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.name == other.name,
        }
    }
}

impl SystemObject for Zone {
    const KIND: &'static str = "zone";

    fn address_args(&self) -> Vec<String> {
        let mut args = self.zone_arg();
        if let Some(zonegroup) = &self.zonegroup {
            args.extend(zonegroup.zonegroup_args());
        }
        args
    }

    fn load_json(&mut self, data: &Value) -> MultisiteResult<()> {
        let info = ZoneInfo::decode(data)?;
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

impl Create for Zone {}
impl Delete for Zone {}
impl Get for Zone {}
impl Set for Zone {}
impl Modify for Zone {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::GatewayEndpoint;
    use crate::ids::RealmKey;
    use crate::testing::ScriptedCluster;

    fn us_key() -> ZoneGroupKey {
        ZoneGroupKey {
            id: Some("zg1".into()),
            name: "us".to_string(),
            period: Some("p1".into()),
            realm: Some(RealmKey { id: Some("r1".into()), name: "earth".to_string() }),
        }
    }

    #[test]
    fn test_tier_type_properties() {
        assert!(!TierType::Rgw.is_read_only());
        assert!(TierType::Rgw.has_buckets());
        assert!(TierType::Elasticsearch.is_read_only());
        assert!(!TierType::Elasticsearch.has_buckets());
        assert!(TierType::Archive.is_read_only());
        assert!(TierType::Archive.has_buckets());
        assert!(TierType::from("custom").is_read_only());
    }

    #[test]
    fn test_tier_type_serde() {
        let tier: TierType = serde_json::from_value(json!("")).unwrap();
        assert_eq!(tier, TierType::Rgw);
        let tier: TierType = serde_json::from_value(json!("pubsub")).unwrap();
        assert_eq!(tier, TierType::PubSub);
        assert_eq!(serde_json::to_value(TierType::Cloud).unwrap(), json!("cloud"));
        assert_eq!(TierType::from("sync-x").to_string(), "sync-x");
    }

    #[test]
    fn test_address_args() {
        let standalone = Zone::new("z1");
        assert_eq!(standalone.zone_args(), vec!["--rgw-zone", "z1"]);

        let member = Zone::new("z1").with_zonegroup(us_key());
        assert_eq!(
            member.zone_args(),
            vec!["--rgw-zone", "z1", "--rgw-zonegroup", "us", "--rgw-realm", "earth"]
        );
        assert_eq!(member.period().map(PeriodId::as_str), Some("p1"));
        assert_eq!(member.realm().map(|r| r.name.as_str()), Some("earth"));
    }

    #[test]
    fn test_get_loads_snapshot() {
        let cluster = ScriptedCluster::new("c1");
        cluster.push_success(
            "{\"id\": \"z1\", \"name\": \"z1\", \"endpoints\": [\"http://h1:80\"], \"tier_type\": \"archive\"}",
        );

        let mut zone = Zone::new("z1");
        zone.get(&cluster, &[]).unwrap();

        assert_eq!(zone.id().map(ZoneId::as_str), Some("z1"));
        assert_eq!(zone.endpoints(), ["http://h1:80"]);
        assert_eq!(zone.tier_type(), &TierType::Archive);
        assert!(zone.data().is_some());
    }

    #[test]
    fn test_require_cluster() {
        let zone = Zone::new("z1");
        let err = zone.require_cluster().unwrap_err();
        assert!(matches!(err, MultisiteError::NoCluster(ref name) if name == "z1"));

        let bound = zone.with_cluster(Arc::new(ScriptedCluster::new("c1")));
        assert_eq!(bound.require_cluster().unwrap().name(), "c1");
    }

    #[test]
    fn test_start_stop() {
        let zone = Zone::new("z1").with_gateways(vec![
            Arc::new(GatewayEndpoint::http("h1", 80)),
            Arc::new(GatewayEndpoint::http("h2", 80)),
        ]);
        zone.start().unwrap();
        zone.stop().unwrap();
    }

    #[test]
    fn test_apply_info_keeps_bindings() {
        let mut zone = Zone::new("z1")
            .with_cluster(Arc::new(ScriptedCluster::new("c1")))
            .with_zonegroup(us_key());
        zone.apply_info(ZoneInfo { id: "z9".to_string(), name: "z1".to_string(), ..Default::default() });

        assert_eq!(zone.id().map(ZoneId::as_str), Some("z9"));
        assert!(zone.cluster().is_some());
        assert!(zone.zonegroup().is_some());
    }
}
