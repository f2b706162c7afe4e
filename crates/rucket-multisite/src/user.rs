// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Users and their access keys.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::admin::AdminOptions;
use crate::error::{MultisiteError, MultisiteResult};
use crate::object::SystemObject;
use crate::zone::Zone;

/// An access key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key id.
    pub access_key: String,
    /// Secret key.
    pub secret: String,
}

impl Credentials {
    /// Create a key pair.
    pub fn new(access_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { access_key: access_key.into(), secret: secret.into() }
    }

    /// Command-line arguments that present these credentials.
    pub fn credential_args(&self) -> Vec<String> {
        vec![
            "--access-key".to_string(),
            self.access_key.clone(),
            "--secret".to_string(),
            self.secret.clone(),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct KeyInfo {
    access_key: String,
    #[serde(default)]
    secret_key: String,
}

#[derive(Deserialize)]
struct UserInfo {
    user_id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    keys: Vec<KeyInfo>,
}

/// A user of the object gateway, managed through a zone's cluster.
#[derive(Debug, Clone)]
pub struct User {
    id: String,
    display_name: String,
    credentials: Vec<Credentials>,
    data: Option<Value>,
}

impl User {
    /// Create an unloaded user.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), display_name: String::new(), credentials: Vec::new(), data: None }
    }

    /// User id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Access keys, in snapshot order.
    pub fn credentials(&self) -> &[Credentials] {
        &self.credentials
    }

    /// Creates the user on the zone's cluster.
    pub fn create(&mut self, zone: &Zone, args: &[String]) -> MultisiteResult<Value> {
        let data = self.zone_command(zone, "create", args, &AdminOptions::default())?;
        info!(user = %self.id, zone = %zone.name(), "Created user");
        Ok(data)
    }

    /// Reads the user from the zone's cluster.
    pub fn info(&mut self, zone: &Zone, args: &[String]) -> MultisiteResult<Value> {
        self.zone_command(zone, "info", args, &AdminOptions::read_only())
    }

    /// Deletes the user from the zone's cluster.
    pub fn delete(&mut self, zone: &Zone, args: &[String]) -> MultisiteResult<()> {
        let cluster = zone.require_cluster()?;
        let extra = with_zone(args, zone);
        let mut argv = self.build_command("delete");
        argv.extend_from_slice(&extra);
        self.command(cluster, "delete", &extra, &AdminOptions::default())?.check(&argv)?;
        self.data = None;
        info!(user = %self.id, zone = %zone.name(), "Deleted user");
        Ok(())
    }

    fn zone_command(
        &mut self,
        zone: &Zone,
        command: &str,
        args: &[String],
        options: &AdminOptions,
    ) -> MultisiteResult<Value> {
        let cluster = zone.require_cluster()?;
        self.json_command(cluster, command, &with_zone(args, zone), options)
    }
}

fn with_zone(args: &[String], zone: &Zone) -> Vec<String> {
    let mut argv = args.to_vec();
    argv.extend(zone.zone_args());
    argv
}

impl SystemObject for User {
    const KIND: &'static str = "user";

    fn address_args(&self) -> Vec<String> {
        vec!["--uid".to_string(), self.id.clone()]
    }

    fn load_json(&mut self, data: &Value) -> MultisiteResult<()> {
        let info: UserInfo = serde_json::from_value(data.clone())
            .map_err(|source| MultisiteError::json("user", data.to_string(), source))?;

        let mut credentials: Vec<Credentials> = Vec::with_capacity(info.keys.len());
        for key in info.keys {
            if credentials.iter().any(|c| c.access_key == key.access_key) {
                warn!(user = %info.user_id, access_key = %key.access_key, "Ignoring duplicate access key");
                continue;
            }
            credentials.push(Credentials::new(key.access_key, key.secret_key));
        }

        self.id = info.user_id;
        self.display_name = info.display_name;
        self.credentials = credentials;
        Ok(())
    }

    fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    fn set_data(&mut self, data: Option<Value>) {
        self.data = data;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::testing::ScriptedCluster;

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("AKIA", "s3cr3t");
        let printed = format!("{creds:?}");
        assert!(printed.contains("AKIA"));
        assert!(!printed.contains("s3cr3t"));
    }

    #[test]
    fn test_credential_args() {
        let creds = Credentials::new("ak", "sk");
        assert_eq!(creds.credential_args(), vec!["--access-key", "ak", "--secret", "sk"]);
    }

    #[test]
    fn test_load_drops_duplicate_keys() {
        let mut user = User::new("sys");
        user.load_json(&json!({
            "user_id": "sys",
            "display_name": "System",
            "keys": [
                {"access_key": "ak", "secret_key": "first"},
                {"access_key": "ak", "secret_key": "second"},
                {"access_key": "ak2", "secret_key": "other"}
            ]
        }))
        .unwrap();

        assert_eq!(user.display_name(), "System");
        assert_eq!(user.credentials().len(), 2);
        assert_eq!(user.credentials()[0].secret, "first");
    }

    #[test]
    fn test_create_is_addressed_through_zone() {
        let cluster = Arc::new(ScriptedCluster::new("c1"));
        cluster.push_success("{\"user_id\": \"sys\", \"keys\": [{\"access_key\": \"ak\", \"secret_key\": \"sk\"}]}");
        let zone = Zone::new("z1").with_cluster(cluster.clone());

        let mut user = User::new("sys");
        user.create(&zone, &["--system".to_string()]).unwrap();

        assert_eq!(cluster.calls()[0].args, vec!["user", "create", "--uid", "sys", "--system", "--rgw-zone", "z1"]);
        assert_eq!(user.credentials()[0], Credentials::new("ak", "sk"));
    }

    #[test]
    fn test_requires_cluster() {
        let err = User::new("sys").info(&Zone::new("z1"), &[]).unwrap_err();
        assert!(matches!(err, MultisiteError::NoCluster(_)));
    }
}
