// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! In-memory admin channels for tests and dry runs.
//!
//! - [`ScriptedCluster`]: replays queued outputs and records every call.
//! - [`SimulatedCluster`]: a small admin tool that keeps realm, zonegroup,
//!   zone, period and user state in memory and answers the topology
//!   commands with JSON shaped like the real tool's output. Clusters can be
//!   linked as peers so that `realm pull` works between them.
//!
//! # Example
//!
//! ```ignore
//! use rucket_multisite::testing::SimulatedCluster;
//!
//! let cluster = SimulatedCluster::new("c1");
//! cluster.inject_failure("zonegroup", "add", 1, "(1) Operation not permitted");
//! ```

mod scripted;
mod simulated;

pub use scripted::{RecordedCall, ScriptedCluster};
pub use simulated::SimulatedCluster;
