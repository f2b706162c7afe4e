// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! An in-memory admin tool for topology commands.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use uuid::Uuid;

use super::scripted::RecordedCall;
use crate::admin::{AdminOptions, AdminOutput, Cluster};
use crate::error::MultisiteResult;

const ENOENT: i32 = 2;
const EACCES: i32 = 13;
const EEXIST: i32 = 17;
const EINVAL: i32 = 22;

type Reply = Result<Value, (i32, String)>;

#[derive(Debug, Clone)]
struct SimRealm {
    id: String,
    name: String,
    epoch: u64,
}

#[derive(Debug, Clone)]
struct SimZoneGroup {
    id: String,
    name: String,
    api_name: String,
    is_master: bool,
    endpoints: Vec<String>,
    master_zone: String,
    zones: Vec<String>,
}

#[derive(Debug, Clone)]
struct SimZone {
    id: String,
    name: String,
    endpoints: Vec<String>,
    tier_type: String,
}

#[derive(Debug, Clone)]
struct SimPeriod {
    id: String,
    epoch: u64,
    realm_epoch: u64,
    predecessor: String,
    master_zonegroup: String,
    master_zone: String,
    zonegroups: Vec<Value>,
}

#[derive(Debug, Clone)]
struct SimUser {
    uid: String,
    display_name: String,
    keys: Vec<(String, String)>,
    system: bool,
}

#[derive(Debug, Default)]
struct SimState {
    realm: Option<SimRealm>,
    zonegroups: Vec<SimZoneGroup>,
    zones: Vec<SimZone>,
    period: Option<SimPeriod>,
    users: Vec<SimUser>,
}

/// An admin channel backed by in-memory topology state.
///
/// Understands `realm`, `zonegroup`, `zone`, `period` and `user` commands.
/// Errors use errno-style return codes (2 for missing entities, 17 for
/// duplicates, 13 for rejected credentials, 22 for bad arguments).
#[derive(Debug)]
pub struct SimulatedCluster {
    name: String,
    state: Mutex<SimState>,
    peers: Mutex<HashMap<String, Arc<SimulatedCluster>>>,
    failures: Mutex<VecDeque<(String, String, AdminOutput)>>,
    calls: Mutex<Vec<RecordedCall>>,
    preamble: Mutex<Option<String>>,
}

impl SimulatedCluster {
    /// Create an empty cluster.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(SimState::default()),
            peers: Mutex::new(HashMap::new()),
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            preamble: Mutex::new(None),
        }
    }

    /// Make `peer` reachable for `realm pull --url <url>`.
    pub fn add_peer(&self, url: impl Into<String>, peer: Arc<SimulatedCluster>) {
        self.peers.lock().insert(url.into(), peer);
    }

    /// Fail the next `<kind> <verb>` command with the given return code.
    /// The command is recorded but has no effect.
    pub fn inject_failure(&self, kind: &str, verb: &str, retcode: i32, stderr: &str) {
        self.failures.lock().push_back((
            kind.to_string(),
            verb.to_string(),
            AdminOutput::failure(retcode, stderr),
        ));
    }

    /// Print `text` before the JSON of every successful command.
    pub fn set_preamble(&self, text: impl Into<String>) {
        *self.preamble.lock() = Some(text.into());
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Calls whose first two tokens are `kind verb`.
    pub fn calls_to(&self, kind: &str, verb: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.args.first().map(String::as_str) == Some(kind))
            .filter(|c| c.args.get(1).map(String::as_str) == Some(verb))
            .cloned()
            .collect()
    }

    /// Epoch of the committed period, if any.
    pub fn period_epoch(&self) -> Option<u64> {
        self.state.lock().period.as_ref().map(|p| p.epoch)
    }

    /// Names of the zones the stored zonegroup `name` lists as members.
    pub fn zonegroup_members(&self, name: &str) -> Vec<String> {
        let state = self.state.lock();
        let Some(zg) = state.zonegroups.iter().find(|zg| zg.name == name) else {
            return Vec::new();
        };
        zg.zones
            .iter()
            .filter_map(|id| state.zones.iter().find(|z| &z.id == id))
            .map(|z| z.name.clone())
            .collect()
    }

    fn take_failure(&self, kind: &str, verb: &str) -> Option<AdminOutput> {
        let mut failures = self.failures.lock();
        let pos = failures.iter().position(|(k, v, _)| k == kind && v == verb)?;
        failures.remove(pos).map(|(_, _, output)| output)
    }

    fn dispatch(&self, args: &[String], options: &AdminOptions) -> Reply {
        let kind = args.first().map(String::as_str).unwrap_or_default();
        let verb = args.get(1).map(String::as_str).unwrap_or_default();
        let rest = &args[args.len().min(2)..];

        if kind == "realm" && verb == "pull" {
            return self.realm_pull(rest);
        }

        let mut state = self.state.lock();
        match kind {
            "realm" => state.realm_command(verb, rest),
            "zonegroup" => state.zonegroup_command(verb, rest, options),
            "zone" => state.zone_command(verb, rest, options),
            "period" => state.period_command(verb, rest),
            "user" => state.user_command(verb, rest),
            _ => Err((EINVAL, format!("unknown command: {kind} {verb}"))),
        }
    }

    fn realm_pull(&self, args: &[String]) -> Reply {
        let url = opt(args, "--url").ok_or((EINVAL, "--url is required".to_string()))?;
        let peer = self
            .peers
            .lock()
            .get(url)
            .cloned()
            .ok_or((ENOENT, format!("failed to connect to {url}")))?;

        // Copy what is needed and release the peer before locking our own
        // state; a cluster may be its own peer.
        let (realm, zonegroups, zones, period) = {
            let remote = peer.state.lock();
            let access_key = opt(args, "--access-key").unwrap_or_default();
            let secret = opt(args, "--secret").unwrap_or_default();
            let authorized = remote.users.iter().filter(|u| u.system).any(|u| {
                u.keys.iter().any(|(k, s)| k == access_key && s == secret)
            });
            if !authorized {
                return Err((EACCES, "(13) Permission denied".to_string()));
            }
            let realm = remote.realm.clone().ok_or((ENOENT, "remote has no realm".to_string()))?;
            (realm, remote.zonegroups.clone(), remote.zones.clone(), remote.period.clone())
        };
        if let Some(name) = opt(args, "--rgw-realm") {
            if name != realm.name {
                return Err((ENOENT, format!("realm {name} not found on {url}")));
            }
        }

        let mut state = self.state.lock();
        state.realm = Some(realm);
        state.zonegroups = zonegroups;
        state.zones = zones;
        state.period = period;
        Ok(state.realm_json(true))
    }
}

impl Cluster for SimulatedCluster {
    fn name(&self) -> &str {
        &self.name
    }

    fn admin(&self, args: &[String], options: &AdminOptions) -> MultisiteResult<AdminOutput> {
        self.calls.lock().push(RecordedCall { args: args.to_vec(), options: options.clone() });

        let kind = args.first().map(String::as_str).unwrap_or_default();
        let verb = args.get(1).map(String::as_str).unwrap_or_default();
        if let Some(output) = self.take_failure(kind, verb) {
            return Ok(output);
        }

        let output = match self.dispatch(args, options) {
            Ok(Value::Null) => AdminOutput::success(""),
            Ok(value) => {
                let preamble = self.preamble.lock().clone().unwrap_or_default();
                AdminOutput::success(format!("{preamble}{value:#}\n"))
            }
            Err((retcode, stderr)) => AdminOutput::failure(retcode, stderr),
        };
        Ok(output)
    }
}

impl SimState {
    fn realm_json(&self, embed_period: bool) -> Value {
        let Some(realm) = &self.realm else {
            return Value::Null;
        };
        let current_period = match (&self.period, embed_period) {
            (Some(period), true) => self.period_json(period),
            (Some(period), false) => json!(period.id),
            (None, _) => json!(""),
        };
        json!({
            "id": realm.id,
            "name": realm.name,
            "current_period": current_period,
            "epoch": realm.epoch,
        })
    }

    fn zone_entry(zone: &SimZone) -> Value {
        let read_only = !matches!(zone.tier_type.as_str(), "" | "rgw");
        json!({
            "id": zone.id,
            "name": zone.name,
            "endpoints": zone.endpoints,
            "tier_type": zone.tier_type,
            "read_only": read_only.to_string(),
        })
    }

    fn zone_json(&self, zone: &SimZone) -> Value {
        let mut value = Self::zone_entry(zone);
        value["realm_id"] = json!(self.realm.as_ref().map(|r| r.id.clone()).unwrap_or_default());
        value
    }

    fn zonegroup_json(&self, zg: &SimZoneGroup) -> Value {
        let zones: Vec<Value> = zg
            .zones
            .iter()
            .filter_map(|id| self.zones.iter().find(|z| &z.id == id))
            .map(Self::zone_entry)
            .collect();
        json!({
            "id": zg.id,
            "name": zg.name,
            "api_name": zg.api_name,
            "is_master": zg.is_master.to_string(),
            "endpoints": zg.endpoints,
            "master_zone": zg.master_zone,
            "zones": zones,
            "realm_id": self.realm.as_ref().map(|r| r.id.clone()).unwrap_or_default(),
        })
    }

    fn period_json(&self, period: &SimPeriod) -> Value {
        let realm = self.realm.as_ref();
        json!({
            "id": period.id,
            "epoch": period.epoch,
            "predecessor_uuid": period.predecessor,
            "realm_id": realm.map(|r| r.id.clone()).unwrap_or_default(),
            "realm_name": realm.map(|r| r.name.clone()).unwrap_or_default(),
            "realm_epoch": period.realm_epoch,
            "master_zonegroup": period.master_zonegroup,
            "master_zone": period.master_zone,
            "period_map": {
                "id": period.id,
                "zonegroups": period.zonegroups,
            },
        })
    }

    fn realm_command(&mut self, verb: &str, args: &[String]) -> Reply {
        let name = opt(args, "--rgw-realm").ok_or((EINVAL, "missing realm name".to_string()))?;
        match verb {
            "create" => {
                if self.realm.is_some() {
                    return Err((EEXIST, "(17) File exists".to_string()));
                }
                self.realm = Some(SimRealm { id: new_id(), name: name.to_string(), epoch: 1 });
                Ok(self.realm_json(false))
            }
            "get" | "set" | "delete" => {
                if self.realm.as_ref().map(|r| r.name.as_str()) != Some(name) {
                    return Err((ENOENT, format!("failed to read realm {name}")));
                }
                if verb == "delete" {
                    *self = SimState { users: std::mem::take(&mut self.users), ..Default::default() };
                    return Ok(Value::Null);
                }
                Ok(self.realm_json(false))
            }
            _ => Err((EINVAL, format!("unsupported: realm {verb}"))),
        }
    }

    fn zonegroup_command(&mut self, verb: &str, args: &[String], options: &AdminOptions) -> Reply {
        let name = opt(args, "--rgw-zonegroup").ok_or((EINVAL, "missing zonegroup name".to_string()))?;
        let existing = self.zonegroups.iter().position(|zg| zg.name == name);

        if verb == "create" {
            if existing.is_some() {
                return Err((EEXIST, "(17) File exists".to_string()));
            }
            let is_master = has(args, "--master");
            if is_master {
                self.zonegroups.iter_mut().for_each(|zg| zg.is_master = false);
            }
            let zg = SimZoneGroup {
                id: new_id(),
                name: name.to_string(),
                api_name: opt(args, "--api-name").unwrap_or(name).to_string(),
                is_master,
                endpoints: endpoints(args),
                master_zone: String::new(),
                zones: Vec::new(),
            };
            let value = self.zonegroup_json(&zg);
            self.zonegroups.push(zg);
            return Ok(value);
        }

        let idx = existing.ok_or((ENOENT, format!("failed to load zonegroup {name}")))?;
        match verb {
            "get" => {}
            "delete" => {
                self.zonegroups.remove(idx);
                return Ok(Value::Null);
            }
            "add" | "remove" => {
                let zone_name = opt(args, "--rgw-zone").ok_or((EINVAL, "missing zone name".to_string()))?;
                let zone_id = self
                    .zones
                    .iter()
                    .find(|z| z.name == zone_name)
                    .map(|z| z.id.clone())
                    .ok_or((ENOENT, format!("failed to load zone {zone_name}")))?;
                let zg = &mut self.zonegroups[idx];
                if verb == "add" {
                    if !zg.zones.contains(&zone_id) {
                        zg.zones.push(zone_id.clone());
                    }
                    if has(args, "--master") || zg.master_zone.is_empty() {
                        zg.master_zone = zone_id;
                    }
                } else {
                    zg.zones.retain(|id| id != &zone_id);
                    if zg.master_zone == zone_id {
                        zg.master_zone.clear();
                    }
                }
            }
            "modify" => {
                let zg = &mut self.zonegroups[idx];
                if let Some(api_name) = opt(args, "--api-name") {
                    zg.api_name = api_name.to_string();
                }
                if has(args, "--endpoints") {
                    zg.endpoints = endpoints(args);
                }
                if has(args, "--master") {
                    self.zonegroups.iter_mut().enumerate().for_each(|(i, zg)| zg.is_master = i == idx);
                }
            }
            "set" => {
                let payload: Value = options
                    .stdin
                    .as_deref()
                    .and_then(|s| serde_json::from_str(s).ok())
                    .ok_or((EINVAL, "failed to decode JSON input".to_string()))?;
                let zg = &mut self.zonegroups[idx];
                if let Some(api_name) = payload.get("api_name").and_then(Value::as_str) {
                    zg.api_name = api_name.to_string();
                }
                if let Some(master) = payload.get("master_zone").and_then(Value::as_str) {
                    zg.master_zone = master.to_string();
                }
                if let Some(list) = payload.get("endpoints").and_then(Value::as_array) {
                    zg.endpoints = list.iter().filter_map(Value::as_str).map(str::to_string).collect();
                }
            }
            _ => return Err((EINVAL, format!("unsupported: zonegroup {verb}"))),
        }
        Ok(self.zonegroup_json(&self.zonegroups[idx]))
    }

    fn zone_command(&mut self, verb: &str, args: &[String], options: &AdminOptions) -> Reply {
        let name = opt(args, "--rgw-zone").ok_or((EINVAL, "missing zone name".to_string()))?;
        let existing = self.zones.iter().position(|z| z.name == name);

        if verb == "create" {
            if existing.is_some() {
                return Err((EEXIST, "(17) File exists".to_string()));
            }
            let zone = SimZone {
                id: new_id(),
                name: name.to_string(),
                endpoints: endpoints(args),
                tier_type: opt(args, "--tier-type").unwrap_or_default().to_string(),
            };
            if let Some(zg_name) = opt(args, "--rgw-zonegroup") {
                if let Some(zg) = self.zonegroups.iter_mut().find(|zg| zg.name == zg_name) {
                    zg.zones.push(zone.id.clone());
                    if has(args, "--master") || zg.master_zone.is_empty() {
                        zg.master_zone = zone.id.clone();
                    }
                }
            }
            let value = self.zone_json(&zone);
            self.zones.push(zone);
            return Ok(value);
        }

        let idx = existing.ok_or((ENOENT, format!("failed to load zone {name}")))?;
        match verb {
            "get" => {}
            "delete" => {
                let zone = self.zones.remove(idx);
                for zg in &mut self.zonegroups {
                    zg.zones.retain(|id| id != &zone.id);
                }
                return Ok(Value::Null);
            }
            "modify" => {
                let zone = &mut self.zones[idx];
                if has(args, "--endpoints") {
                    zone.endpoints = endpoints(args);
                }
                if let Some(tier) = opt(args, "--tier-type") {
                    zone.tier_type = tier.to_string();
                }
                if has(args, "--master") {
                    let id = zone.id.clone();
                    if let Some(zg) = self.zonegroups.iter_mut().find(|zg| zg.zones.contains(&id)) {
                        zg.master_zone = id;
                    }
                }
            }
            "set" => {
                let payload: Value = options
                    .stdin
                    .as_deref()
                    .and_then(|s| serde_json::from_str(s).ok())
                    .ok_or((EINVAL, "failed to decode JSON input".to_string()))?;
                let zone = &mut self.zones[idx];
                if let Some(list) = payload.get("endpoints").and_then(Value::as_array) {
                    zone.endpoints = list.iter().filter_map(Value::as_str).map(str::to_string).collect();
                }
                if let Some(tier) = payload.get("tier_type").and_then(Value::as_str) {
                    zone.tier_type = tier.to_string();
                }
            }
            _ => return Err((EINVAL, format!("unsupported: zone {verb}"))),
        }
        Ok(self.zone_json(&self.zones[idx]))
    }

    fn period_command(&mut self, verb: &str, args: &[String]) -> Reply {
        match verb {
            "get" => {
                let period = self.period.as_ref().ok_or((ENOENT, "no current period".to_string()))?;
                Ok(self.period_json(period))
            }
            "update" if !has(args, "--commit") => {
                let realm = self.realm.as_ref().ok_or((ENOENT, "no realm".to_string()))?;
                let (master_zonegroup, master_zone) = self.masters();
                let staged = SimPeriod {
                    id: format!("{}:staging", realm.id),
                    epoch: self.period.as_ref().map_or(1, |p| p.epoch + 1),
                    realm_epoch: self.period.as_ref().map_or(1, |p| p.realm_epoch + 1),
                    predecessor: self.period.as_ref().map(|p| p.id.clone()).unwrap_or_default(),
                    master_zonegroup,
                    master_zone,
                    zonegroups: self.zonegroups.iter().map(|zg| self.zonegroup_json(zg)).collect(),
                };
                Ok(self.period_json(&staged))
            }
            "update" | "commit" => self.commit(),
            _ => Err((EINVAL, format!("unsupported: period {verb}"))),
        }
    }

    fn masters(&self) -> (String, String) {
        self.zonegroups
            .iter()
            .find(|zg| zg.is_master)
            .or_else(|| self.zonegroups.first())
            .map(|zg| (zg.id.clone(), zg.master_zone.clone()))
            .unwrap_or_default()
    }

    fn commit(&mut self) -> Reply {
        if self.realm.is_none() {
            return Err((ENOENT, "no realm".to_string()));
        }
        let (master_zonegroup, master_zone) = self.masters();
        let zonegroups: Vec<Value> = self.zonegroups.iter().map(|zg| self.zonegroup_json(zg)).collect();

        let period = match self.period.take() {
            Some(mut current)
                if current.master_zonegroup == master_zonegroup && current.master_zone == master_zone =>
            {
                current.epoch += 1;
                current.zonegroups = zonegroups;
                current
            }
            previous => {
                let realm_epoch = previous.as_ref().map_or(1, |p| p.realm_epoch + 1);
                if let Some(realm) = self.realm.as_mut() {
                    realm.epoch = realm_epoch;
                }
                SimPeriod {
                    id: new_id(),
                    epoch: 1,
                    realm_epoch,
                    predecessor: previous.map(|p| p.id).unwrap_or_default(),
                    master_zonegroup,
                    master_zone,
                    zonegroups,
                }
            }
        };
        let value = self.period_json(&period);
        self.period = Some(period);
        Ok(value)
    }

    fn user_command(&mut self, verb: &str, args: &[String]) -> Reply {
        let uid = opt(args, "--uid").ok_or((EINVAL, "missing uid".to_string()))?;
        let existing = self.users.iter().position(|u| u.uid == uid);
        let idx = match (verb, existing) {
            ("create", Some(_)) => return Err((EEXIST, "user already exists".to_string())),
            ("create", None) => {
                let access_key = opt(args, "--access-key").map_or_else(new_id, str::to_string);
                let secret = opt(args, "--secret").map_or_else(new_id, str::to_string);
                self.users.push(SimUser {
                    uid: uid.to_string(),
                    display_name: opt(args, "--display-name").unwrap_or(uid).to_string(),
                    keys: vec![(access_key, secret)],
                    system: has(args, "--system"),
                });
                self.users.len() - 1
            }
            (_, None) => return Err((ENOENT, "could not fetch user info: no user info saved".to_string())),
            ("info", Some(idx)) => idx,
            ("delete", Some(idx)) => {
                self.users.remove(idx);
                return Ok(Value::Null);
            }
            _ => return Err((EINVAL, format!("unsupported: user {verb}"))),
        };

        let user = &self.users[idx];
        let keys: Vec<Value> = user
            .keys
            .iter()
            .map(|(k, s)| json!({"user": user.uid, "access_key": k, "secret_key": s}))
            .collect();
        Ok(json!({
            "user_id": user.uid,
            "display_name": user.display_name,
            "keys": keys,
            "system": user.system.to_string(),
        }))
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn opt<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn has(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn endpoints(args: &[String]) -> Vec<String> {
    opt(args, "--endpoints")
        .map(|list| list.split(',').filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(cluster: &SimulatedCluster, line: &str) -> AdminOutput {
        let args: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        cluster.admin(&args, &AdminOptions::default()).unwrap()
    }

    fn json_of(output: &AdminOutput) -> Value {
        serde_json::from_str(&output.stdout).unwrap()
    }

    #[test]
    fn test_create_topology_and_commit() {
        let c = SimulatedCluster::new("c1");
        assert!(run(&c, "realm create --rgw-realm earth").is_success());
        assert!(run(&c, "zonegroup create --rgw-zonegroup us --rgw-realm earth --master").is_success());
        let zone = json_of(&run(
            &c,
            "zone create --rgw-zone us-east --rgw-zonegroup us --rgw-realm earth --endpoints http://h1:80",
        ));

        let period = json_of(&run(&c, "period update --commit"));
        assert_eq!(period["epoch"], 1);
        assert_eq!(period["realm_epoch"], 1);
        assert_eq!(period["master_zone"], zone["id"]);
        assert_eq!(period["period_map"]["zonegroups"][0]["zones"][0]["name"], "us-east");

        let again = json_of(&run(&c, "period commit"));
        assert_eq!(again["id"], period["id"]);
        assert_eq!(again["epoch"], 2);
        assert_eq!(c.period_epoch(), Some(2));
    }

    #[test]
    fn test_staged_update_does_not_commit() {
        let c = SimulatedCluster::new("c1");
        run(&c, "realm create --rgw-realm earth");
        let staged = json_of(&run(&c, "period update"));
        assert!(staged["id"].as_str().unwrap().ends_with(":staging"));
        assert_eq!(c.period_epoch(), None);
    }

    #[test]
    fn test_errors() {
        let c = SimulatedCluster::new("c1");
        assert_eq!(run(&c, "zone get --rgw-zone nope").retcode, ENOENT);
        run(&c, "zone create --rgw-zone z1");
        assert_eq!(run(&c, "zone create --rgw-zone z1").retcode, EEXIST);
        assert_eq!(run(&c, "bogus verb").retcode, EINVAL);
    }

    #[test]
    fn test_injected_failure_has_no_effect() {
        let c = SimulatedCluster::new("c1");
        run(&c, "zonegroup create --rgw-zonegroup us");
        run(&c, "zone create --rgw-zone z1");
        c.inject_failure("zonegroup", "add", 1, "(1) Operation not permitted");

        assert_eq!(run(&c, "zonegroup add --rgw-zonegroup us --rgw-zone z1").retcode, 1);
        assert!(c.zonegroup_members("us").is_empty());

        assert!(run(&c, "zonegroup add --rgw-zonegroup us --rgw-zone z1").is_success());
        assert_eq!(c.zonegroup_members("us"), vec!["z1"]);
        assert_eq!(c.calls_to("zonegroup", "add").len(), 2);
    }

    #[test]
    fn test_pull_requires_system_credentials() {
        let master = Arc::new(SimulatedCluster::new("master"));
        run(&master, "realm create --rgw-realm earth");
        run(&master, "user create --uid sys --access-key ak --secret sk --system");

        let secondary = SimulatedCluster::new("secondary");
        secondary.add_peer("http://m:80", master.clone());

        let denied = run(&secondary, "realm pull --rgw-realm earth --url http://m:80 --access-key ak --secret bad");
        assert_eq!(denied.retcode, EACCES);

        let pulled = run(&secondary, "realm pull --rgw-realm earth --url http://m:80 --access-key ak --secret sk");
        assert!(pulled.is_success());
        assert_eq!(json_of(&pulled)["name"], "earth");
    }

    #[test]
    fn test_pull_from_self() {
        let c = Arc::new(SimulatedCluster::new("c1"));
        run(&c, "realm create --rgw-realm earth");
        run(&c, "user create --uid sys --access-key ak --secret sk --system");
        c.add_peer("http://self:80", c.clone());

        let pulled = run(&c, "realm pull --url http://self:80 --access-key ak --secret sk");
        assert!(pulled.is_success());
        assert_eq!(json_of(&pulled)["name"], "earth");
    }

    #[test]
    fn test_preamble() {
        let c = SimulatedCluster::new("c1");
        c.set_preamble("2025-01-01 warning: deprecated option\n");
        let out = run(&c, "zone create --rgw-zone z1");
        assert!(out.stdout.starts_with("2025-01-01 warning"));
    }
}
