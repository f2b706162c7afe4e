// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! Identifier types and non-owning parent keys.
//!
//! Children never own or borrow their parents. A zone refers to its
//! zonegroup, and a zonegroup to its realm, through a key that carries the
//! parent's id (for lookups) and name (for command addressing).

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier of a realm.
    RealmId
);
define_id!(
    /// Unique identifier of a period.
    PeriodId
);
define_id!(
    /// Unique identifier of a zonegroup.
    ZoneGroupId
);
define_id!(
    /// Unique identifier of a zone.
    ZoneId
);

/// Converts a snapshot id field into an optional id; empty means unset.
pub(crate) fn non_empty<T: From<String>>(id: String) -> Option<T> {
    if id.is_empty() {
        None
    } else {
        Some(T::from(id))
    }
}

/// Non-owning reference to a realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmKey {
    /// Realm id, if known.
    pub id: Option<RealmId>,
    /// Realm name.
    pub name: String,
}

impl RealmKey {
    /// Command-line arguments that select this realm.
    pub fn realm_arg(&self) -> Vec<String> {
        vec!["--rgw-realm".to_string(), self.name.clone()]
    }
}

/// Non-owning reference to a zonegroup, including its own ancestry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneGroupKey {
    /// Zonegroup id, if known.
    pub id: Option<ZoneGroupId>,
    /// Zonegroup name.
    pub name: String,
    /// Period the zonegroup was loaded from.
    pub period: Option<PeriodId>,
    /// Realm the zonegroup belongs to.
    pub realm: Option<RealmKey>,
}

impl ZoneGroupKey {
    /// Command-line arguments that select this zonegroup and its realm.
    pub fn zonegroup_args(&self) -> Vec<String> {
        let mut args = vec!["--rgw-zonegroup".to_string(), self.name.clone()];
        if let Some(realm) = &self.realm {
            args.extend(realm.realm_arg());
        }
        args
    }

    /// Returns true if both keys name the same zonegroup.
    ///
    /// Ids are compared when both are known, names otherwise.
    pub fn same_zonegroup(&self, other: &ZoneGroupKey) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.name == other.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_id_display_and_lookup() {
        let id = ZoneId::new("z1");
        assert_eq!(id.as_str(), "z1");
        assert_eq!(id.to_string(), "z1");
        assert_eq!(id, "z1");

        let mut map = HashMap::new();
        map.insert(id, 3usize);
        assert_eq!(map.get("z1"), Some(&3));
    }

    #[test]
    fn test_id_serde_transparent() {
        let id: ZoneGroupId = serde_json::from_str("\"zg1\"").unwrap();
        assert_eq!(id, ZoneGroupId::new("zg1"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"zg1\"");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty::<ZoneId>(String::new()), None);
        assert_eq!(non_empty::<ZoneId>("z1".to_string()), Some(ZoneId::new("z1")));
    }

    #[test]
    fn test_zonegroup_args_include_realm() {
        let key = ZoneGroupKey {
            id: None,
            name: "us".to_string(),
            period: None,
            realm: Some(RealmKey { id: None, name: "earth".to_string() }),
        };
        assert_eq!(key.zonegroup_args(), vec!["--rgw-zonegroup", "us", "--rgw-realm", "earth"]);
    }

    #[test]
    fn test_same_zonegroup() {
        let a = ZoneGroupKey { id: Some("zg1".into()), name: "us".to_string(), period: None, realm: None };
        let renamed = ZoneGroupKey { name: "us-renamed".to_string(), ..a.clone() };
        let other = ZoneGroupKey { id: Some("zg2".into()), ..a.clone() };
        let unloaded = ZoneGroupKey { id: None, ..a.clone() };

        assert!(a.same_zonegroup(&renamed));
        assert!(!a.same_zonegroup(&other));
        assert!(a.same_zonegroup(&unloaded));
    }
}
