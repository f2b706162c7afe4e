// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! The addressed-object protocol.
//!
//! Every topology entity is a [`SystemObject`]: it knows its command kind,
//! how to address itself (its own tokens followed by its ancestors'), and
//! how to reload itself from a JSON snapshot. The generic execution logic
//! lives here once; entities opt into the operations they support by
//! implementing the capability traits [`Create`], [`Delete`], [`Get`],
//! [`Set`] and [`Modify`], whose methods are all provided.
//!
//! The local mirror is updated if and only if the admin command reports
//! success. A failed command leaves the entity exactly as it was; there is
//! no rollback of remote side effects.

use serde_json::Value;
use tracing::debug;

use crate::admin::{command_line, parse_json_output, AdminOptions, AdminOutput, Cluster};
use crate::error::MultisiteResult;

/// An entity that can be addressed and reloaded through admin commands.
pub trait SystemObject {
    /// Entity kind, the first token of every command (`zone`, `period`, ...).
    const KIND: &'static str;

    /// Addressing tokens for this entity, outermost ancestor last.
    fn address_args(&self) -> Vec<String>;

    /// Replaces the entity's fields from a snapshot.
    ///
    /// Implementations decode the whole snapshot before touching any field,
    /// so an error leaves the entity unchanged.
    fn load_json(&mut self, data: &Value) -> MultisiteResult<()>;

    /// The last confirmed snapshot, if any.
    fn data(&self) -> Option<&Value>;

    /// Replaces the cached snapshot.
    fn set_data(&mut self, data: Option<Value>);

    /// Builds the command line for `command`, without extra arguments.
    fn build_command(&self, command: &str) -> Vec<String> {
        let mut args = vec![Self::KIND.to_string(), command.to_string()];
        args.extend(self.address_args());
        args
    }

    /// Runs `command` with extra arguments and returns the raw output.
    fn command(
        &self,
        cluster: &dyn Cluster,
        command: &str,
        args: &[String],
        options: &AdminOptions,
    ) -> MultisiteResult<AdminOutput> {
        let mut argv = self.build_command(command);
        argv.extend_from_slice(args);
        debug!(cluster = cluster.name(), command = %command_line(&argv), "Running admin command");
        let output = cluster.admin(&argv, options)?;
        if !output.is_success() {
            debug!(cluster = cluster.name(), retcode = output.retcode, "Admin command failed");
        }
        Ok(output)
    }

    /// Runs `command`, reloads the entity from its JSON output and caches
    /// the snapshot.
    ///
    /// A non-zero return code yields [`crate::MultisiteError::CommandFailed`]
    /// and leaves the entity untouched.
    fn json_command(
        &mut self,
        cluster: &dyn Cluster,
        command: &str,
        args: &[String],
        options: &AdminOptions,
    ) -> MultisiteResult<Value> {
        let mut argv = self.build_command(command);
        argv.extend_from_slice(args);
        let output = self.command(cluster, command, args, options)?.check(&argv)?;
        let line = command_line(&argv);
        let data = parse_json_output(&line, &output.stdout).map_err(|e| e.with_output(&line, &output))?;
        self.load_json(&data).map_err(|e| e.with_output(&line, &output))?;
        self.set_data(Some(data.clone()));
        Ok(data)
    }
}

/// Entities that can be created.
pub trait Create: SystemObject {
    /// Creates the entity with the given arguments.
    fn create(&mut self, cluster: &dyn Cluster, args: &[String]) -> MultisiteResult<Value> {
        self.json_command(cluster, "create", args, &AdminOptions::default())
    }
}

/// Entities that can be deleted.
pub trait Delete: SystemObject {
    /// Deletes the entity. The command prints nothing; on success the cached
    /// snapshot is cleared.
    fn delete(&mut self, cluster: &dyn Cluster, args: &[String]) -> MultisiteResult<()> {
        let mut argv = self.build_command("delete");
        argv.extend_from_slice(args);
        self.command(cluster, "delete", args, &AdminOptions::default())?.check(&argv)?;
        self.set_data(None);
        Ok(())
    }
}

/// Entities that can be read back from storage.
pub trait Get: SystemObject {
    /// Reads the entity.
    fn get(&mut self, cluster: &dyn Cluster, args: &[String]) -> MultisiteResult<Value> {
        self.json_command(cluster, "get", args, &AdminOptions::read_only())
    }
}

/// Entities that can be overwritten from JSON.
pub trait Set: SystemObject {
    /// Sets the entity from `data`, supplied on the command's standard input.
    fn set(&mut self, cluster: &dyn Cluster, data: &Value, args: &[String]) -> MultisiteResult<Value> {
        let payload = AdminOptions::with_stdin(data.to_string());
        self.json_command(cluster, "set", args, &payload)
    }
}

/// Entities that can be modified in place.
pub trait Modify: SystemObject {
    /// Modifies the entity with the given arguments.
    fn modify(&mut self, cluster: &dyn Cluster, args: &[String]) -> MultisiteResult<Value> {
        self.json_command(cluster, "modify", args, &AdminOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::error::MultisiteError;
    use crate::testing::ScriptedCluster;

    #[derive(Debug, Default)]
    struct Widget {
        id: String,
        name: String,
        data: Option<Value>,
    }

    #[derive(Deserialize)]
    struct WidgetInfo {
        id: String,
        name: String,
    }

    impl SystemObject for Widget {
        const KIND: &'static str = "widget";

        fn address_args(&self) -> Vec<String> {
            vec!["--widget".to_string(), self.name.clone()]
        }

        fn load_json(&mut self, data: &Value) -> MultisiteResult<()> {
            let info: WidgetInfo = serde_json::from_value(data.clone())
                .map_err(|source| MultisiteError::json("widget", data.to_string(), source))?;
            self.id = info.id;
            self.name = info.name;
            Ok(())
        }

        fn data(&self) -> Option<&Value> {
            self.data.as_ref()
        }

        fn set_data(&mut self, data: Option<Value>) {
            self.data = data;
        }
    }

    impl Create for Widget {}
    impl Delete for Widget {}
    impl Get for Widget {}
    impl Set for Widget {}
    impl Modify for Widget {}

    fn widget() -> Widget {
        Widget { name: "w".to_string(), ..Default::default() }
    }

    #[test]
    fn test_build_command() {
        assert_eq!(widget().build_command("get"), vec!["widget", "get", "--widget", "w"]);
    }

    #[test]
    fn test_json_command_loads_and_caches() {
        let cluster = ScriptedCluster::new("c1");
        cluster.push_success("log line\n{\"id\": \"w1\", \"name\": \"w\"}");

        let mut w = widget();
        let data = w.create(&cluster, &["--flag".to_string()]).unwrap();

        assert_eq!(w.id, "w1");
        assert_eq!(w.data(), Some(&data));
        let calls = cluster.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec!["widget", "create", "--widget", "w", "--flag"]);
    }

    #[test]
    fn test_failure_leaves_entity_untouched() {
        let cluster = ScriptedCluster::new("c1");
        cluster.push_success("{\"id\": \"w1\", \"name\": \"w\"}");
        cluster.push_failure(1, "boom");

        let mut w = widget();
        let snapshot = w.get(&cluster, &[]).unwrap();
        let err = w.modify(&cluster, &["--rename".to_string()]).unwrap_err();

        assert_eq!(err.retcode(), Some(1));
        assert_eq!(err.stderr(), Some("boom"));
        assert_eq!(err.command(), Some("widget modify --widget w --rename"));
        assert_eq!(w.id, "w1");
        assert_eq!(w.data(), Some(&snapshot));
    }

    #[test]
    fn test_undecodable_snapshot_leaves_entity_untouched() {
        let cluster = ScriptedCluster::new("c1");
        cluster.push_success("{\"unexpected\": true}");

        let mut w = widget();
        assert!(w.get(&cluster, &[]).is_err());
        assert_eq!(w.id, "");
        assert!(w.data().is_none());
    }

    #[test]
    fn test_decode_error_keeps_command_output() {
        let cluster = ScriptedCluster::new("c1");
        cluster.push(AdminOutput {
            stdout: "note\n{\"unexpected\": true}".to_string(),
            stderr: "deprecated flag\n".to_string(),
            retcode: 0,
        });

        let err = widget().get(&cluster, &[]).unwrap_err();
        assert!(matches!(err, MultisiteError::Json { .. }));
        assert_eq!(err.command(), Some("widget get --widget w"));
        assert_eq!(err.retcode(), Some(0));
        assert_eq!(err.stdout(), Some("note\n{\"unexpected\": true}"));
        assert_eq!(err.stderr(), Some("deprecated flag\n"));
    }

    #[test]
    fn test_missing_json_keeps_command_output() {
        let cluster = ScriptedCluster::new("c1");
        cluster.push(AdminOutput { stdout: "done\n".to_string(), stderr: "warn\n".to_string(), retcode: 0 });

        let err = widget().modify(&cluster, &[]).unwrap_err();
        assert!(matches!(err, MultisiteError::MissingJson { .. }));
        assert_eq!(err.command(), Some("widget modify --widget w"));
        assert_eq!(err.stdout(), Some("done\n"));
        assert_eq!(err.stderr(), Some("warn\n"));
    }

    #[test]
    fn test_get_is_read_only() {
        let cluster = ScriptedCluster::new("c1");
        cluster.push_success("{\"id\": \"w1\", \"name\": \"w\"}");

        widget().get(&cluster, &[]).unwrap();
        assert!(cluster.calls()[0].options.read_only);
    }

    #[test]
    fn test_set_sends_payload() {
        let cluster = ScriptedCluster::new("c1");
        cluster.push_success("{\"id\": \"w2\", \"name\": \"w\"}");

        let mut w = widget();
        let payload = json!({"id": "w2", "name": "w"});
        w.set(&cluster, &payload, &[]).unwrap();

        let call = &cluster.calls()[0];
        assert_eq!(call.args[1], "set");
        let sent: Value = serde_json::from_str(call.options.stdin.as_deref().unwrap()).unwrap();
        assert_eq!(sent, payload);
        assert_eq!(w.id, "w2");
    }

    #[test]
    fn test_delete_clears_snapshot() {
        let cluster = ScriptedCluster::new("c1");
        cluster.push_success("{\"id\": \"w1\", \"name\": \"w\"}");
        cluster.push_failure(2, "busy");
        cluster.push_success("");

        let mut w = widget();
        w.get(&cluster, &[]).unwrap();

        assert!(w.delete(&cluster, &[]).is_err());
        assert!(w.data().is_some());

        w.delete(&cluster, &[]).unwrap();
        assert!(w.data().is_none());
    }
}
