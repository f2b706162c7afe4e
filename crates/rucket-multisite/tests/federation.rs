// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! End-to-end federation flows on simulated clusters.

use std::sync::Arc;

use rucket_multisite::testing::SimulatedCluster;
use rucket_multisite::{
    Create, Credentials, Delete, Gateway, GatewayEndpoint, Get, Modify, Realm, User, Zone, ZoneGroup,
};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

struct Master {
    cluster: Arc<SimulatedCluster>,
    realm: Realm,
    zonegroup: ZoneGroup,
    zone: Zone,
}

/// Builds a one-zone realm on a fresh cluster and commits its first period.
fn bootstrap_master() -> Master {
    let cluster = Arc::new(SimulatedCluster::new("c1"));

    let mut realm = Realm::new("earth");
    realm.create(cluster.as_ref(), &args(&["--default"])).unwrap();

    let mut zonegroup = ZoneGroup::new("us").with_realm(realm.key());
    zonegroup.create(cluster.as_ref(), &args(&["--master", "--endpoints", "http://h1:80"])).unwrap();

    let gateway: Arc<dyn Gateway> = Arc::new(GatewayEndpoint::http("h1", 80));
    let mut zone = Zone::new("us-east").with_cluster(cluster.clone()).with_gateways(vec![gateway]);
    zone.create(cluster.as_ref(), &args(&["--endpoints", "http://h1:80"])).unwrap();
    zonegroup.add(cluster.as_ref(), &mut zone, &args(&["--master"])).unwrap();

    let mut system = User::new("sys");
    system
        .create(&zone, &args(&["--display-name", "System", "--access-key", "ak", "--secret", "sk", "--system"]))
        .unwrap();

    let mut period = rucket_multisite::Period::new();
    period.update(&zone, &[], true).unwrap();
    assert_eq!(period.epoch(), 1);
    assert_eq!(period.realm_epoch(), 1);

    realm.get(cluster.as_ref(), &[]).unwrap();
    let current = realm.current_period_mut().unwrap();
    assert!(!current.is_loaded());
    current.get(cluster.as_ref(), &zone.zone_args()).unwrap();

    Master { cluster, realm, zonegroup, zone }
}

#[test]
fn test_bootstrap_master_zone() {
    let master = bootstrap_master();

    assert_eq!(master.zonegroup.master_zone().map(Zone::name), Some("us-east"));
    assert_eq!(master.zone.zonegroup().map(|key| key.name.as_str()), Some("us"));
    assert!(master.zone.id().is_some());

    let member = master.zonegroup.zone_by_name("us-east").unwrap();
    assert_eq!(member.gateways().len(), 1);
    assert_eq!(member.require_cluster().unwrap().name(), "c1");

    assert_eq!(master.realm.master_zonegroup().map(ZoneGroup::name), Some("us"));
    assert_eq!(master.realm.meta_master_zone().map(Zone::name), Some("us-east"));
    assert_eq!(master.cluster.zonegroup_members("us"), vec!["us-east"]);
}

#[test]
fn test_secondary_joins_and_commits() {
    let master = bootstrap_master();
    let master_period = master.realm.current_period().unwrap().id().cloned().unwrap();

    let secondary = Arc::new(SimulatedCluster::new("c2"));
    secondary.add_peer("http://h1:80", master.cluster.clone());

    let mut realm = Realm::new("earth");
    realm
        .pull(secondary.as_ref(), &GatewayEndpoint::http("h1", 80), &Credentials::new("ak", "sk"), &[])
        .unwrap();
    assert_eq!(realm.id(), master.realm.id());
    assert_eq!(realm.current_period().and_then(|p| p.id()), Some(&master_period));
    assert_eq!(
        realm.master_zonegroup().and_then(ZoneGroup::id),
        master.realm.master_zonegroup().and_then(ZoneGroup::id)
    );

    let us = realm.master_zonegroup().unwrap().key();
    let mut west = Zone::new("us-west").with_zonegroup(us).with_cluster(secondary.clone());
    west.create(secondary.as_ref(), &args(&["--endpoints", "http://h2:80"])).unwrap();

    let period = realm.current_period_mut().unwrap();
    period.update(&west, &[], true).unwrap();
    assert_eq!(period.id(), Some(&master_period));
    assert_eq!(period.epoch(), 2);

    let us = realm.master_zonegroup().unwrap();
    assert_eq!(us.endpoints(), ["http://h1:80", "http://h2:80"]);
    assert_eq!(us.rw_zones().count(), 2);
    assert_eq!(us.zone_by_name("us-west").and_then(Zone::realm).map(|r| r.name.as_str()), Some("earth"));

    assert!(realm.bind_zone("us-west", secondary.clone(), Vec::new()));
    let bound = realm.zone_by_name("us-west").unwrap();
    assert_eq!(bound.require_cluster().unwrap().name(), "c2");
}

#[test]
fn test_pull_with_wrong_secret_fails() {
    let master = bootstrap_master();
    let secondary = SimulatedCluster::new("c2");
    secondary.add_peer("http://h1:80", master.cluster.clone());

    let mut realm = Realm::new("earth");
    let err = realm
        .pull(&secondary, &GatewayEndpoint::http("h1", 80), &Credentials::new("ak", "wrong"), &[])
        .unwrap_err();

    assert_eq!(err.retcode(), Some(13));
    assert!(realm.current_period().is_none());
}

#[test]
fn test_injected_add_failure_changes_nothing() {
    let mut master = bootstrap_master();
    let mut archive = Zone::new("us-archive");
    archive
        .create(master.cluster.as_ref(), &args(&["--tier-type", "archive", "--endpoints", "http://h9:80"]))
        .unwrap();

    master.cluster.inject_failure("zonegroup", "add", 1, "(1) Operation not permitted");
    let err = master.zonegroup.add(master.cluster.as_ref(), &mut archive, &[]).unwrap_err();

    assert_eq!(err.retcode(), Some(1));
    assert_eq!(master.zonegroup.zones().len(), 1);
    assert!(archive.zonegroup().is_none());
    assert_eq!(master.cluster.zonegroup_members("us"), vec!["us-east"]);

    master.zonegroup.add(master.cluster.as_ref(), &mut archive, &[]).unwrap();
    assert_eq!(master.zonegroup.ro_zones().map(Zone::name).collect::<Vec<_>>(), vec!["us-archive"]);
    assert!(archive.has_buckets());
}

#[test]
fn test_remove_and_delete_zone() {
    let mut master = bootstrap_master();
    let mut west = Zone::new("us-west");
    west.create(master.cluster.as_ref(), &args(&["--endpoints", "http://h2:80"])).unwrap();
    master.zonegroup.add(master.cluster.as_ref(), &mut west, &[]).unwrap();
    assert_eq!(master.zonegroup.endpoints(), ["http://h1:80", "http://h2:80"]);

    master.zonegroup.remove(master.cluster.as_ref(), &mut west, &[]).unwrap();
    assert!(master.zonegroup.zone_by_name("us-west").is_none());
    assert!(west.zonegroup().is_none());
    assert_eq!(master.zonegroup.endpoints(), ["http://h1:80"]);

    west.delete(master.cluster.as_ref(), &[]).unwrap();
    assert!(west.get(master.cluster.as_ref(), &[]).is_err());
}

#[test]
fn test_modify_zone_endpoints() {
    let master = bootstrap_master();
    let mut zone = master.zone.clone();
    zone.modify(master.cluster.as_ref(), &args(&["--endpoints", "http://h1:80,http://h1b:80"])).unwrap();
    assert_eq!(zone.endpoints(), ["http://h1:80", "http://h1b:80"]);
}

#[test]
fn test_staged_update_then_commit() {
    let mut master = bootstrap_master();
    let zone = master.zone.clone();
    let period = master.realm.current_period_mut().unwrap();
    let committed = period.id().cloned();

    period.update(&zone, &[], false).unwrap();
    assert!(period.is_staging());
    assert_eq!(master.cluster.period_epoch(), Some(1));

    period.commit(&zone, &[]).unwrap();
    assert!(!period.is_staging());
    assert_eq!(period.id().cloned(), committed);
    assert_eq!(period.epoch(), 2);
}
