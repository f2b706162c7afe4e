// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Rucket Authors

//! A cluster backed by the admin tool binary.

use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rucket_core::{AdminConfig, Config};
use tracing::{debug, warn};

use crate::admin::{command_line, AdminOptions, AdminOutput, Cluster};
use crate::error::{MultisiteError, MultisiteResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Return code reported for a child killed by a signal.
pub const SIGNALED_RETCODE: i32 = -1;

/// Runs admin commands as child processes.
///
/// Each call executes `<binary> <global args> <args>`, feeds the optional
/// payload on stdin and waits at most the configured timeout.
#[derive(Debug, Clone)]
pub struct AdminCommand {
    name: String,
    config: AdminConfig,
}

impl AdminCommand {
    /// Create a cluster handle from admin settings.
    pub fn new(name: impl Into<String>, config: AdminConfig) -> MultisiteResult<Self> {
        config.validate()?;
        Ok(Self { name: name.into(), config })
    }

    /// Create a cluster handle from a loaded configuration.
    pub fn from_config(name: impl Into<String>, config: &Config) -> MultisiteResult<Self> {
        Self::new(name, config.admin.clone())
    }

    /// The admin settings in use.
    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    /// Kills and reaps a child that is being abandoned.
    fn terminate(&self, child: &mut Child) {
        if let Err(e) = child.kill() {
            warn!(cluster = %self.name, error = %e, "Failed to kill admin command");
        }
        let _ = child.wait();
    }
}

impl Cluster for AdminCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn admin(&self, args: &[String], options: &AdminOptions) -> MultisiteResult<AdminOutput> {
        let command = command_line(args);
        let stdin = if options.stdin.is_some() { Stdio::piped() } else { Stdio::null() };
        let mut child = Command::new(&self.config.binary)
            .args(&self.config.args)
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);
        let writer = match (&options.stdin, child.stdin.take()) {
            (Some(payload), Some(pipe)) => Some(feed(pipe, payload.clone().into_bytes())),
            _ => None,
        };

        let timeout = self.config.timeout_duration();
        // No deadline when the timeout does not fit in an Instant.
        let deadline = Instant::now().checked_add(timeout);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    self.terminate(&mut child);
                    return Err(e.into());
                }
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                self.terminate(&mut child);
                warn!(cluster = %self.name, command = %command, timeout_ms = self.config.timeout_ms, "Admin command timed out");
                return Err(MultisiteError::Timeout { command, timeout_ms: self.config.timeout_ms });
            }
            thread::sleep(POLL_INTERVAL);
        };

        if let Some(writer) = writer {
            match writer.join() {
                Ok(result) => result?,
                Err(_) => warn!(cluster = %self.name, command = %command, "Stdin writer panicked"),
            }
        }

        let output = AdminOutput {
            stdout: collect(stdout),
            stderr: collect(stderr),
            retcode: status.code().unwrap_or(SIGNALED_RETCODE),
        };
        debug!(cluster = %self.name, command = %command, retcode = output.retcode, "Admin command finished");
        Ok(output)
    }
}

/// Writes the payload and closes stdin. A child that exits without reading
/// it is not an error.
fn feed(mut pipe: ChildStdin, payload: Vec<u8>) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || match pipe.write_all(&payload) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
