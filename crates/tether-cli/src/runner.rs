//! Executes script commands against a mesh and renders their output lines.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tether_common::{GroupChangedEvent, GroupingError, Identity};
use tether_config::TetherConfig;
use tether_mesh::{Mesh, MeshError, Runtime};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

use crate::script::{parse_line, Command, ParseError};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Grouping(#[from] GroupingError),

    #[error("window not open: {0}")]
    NotOpen(Identity),
}

pub struct Runner {
    mesh: Mesh,
    /// Event feed per runtime, drained in name order after every command.
    feeds: BTreeMap<String, broadcast::Receiver<GroupChangedEvent>>,
}

impl Runner {
    /// A runner with the runtimes listed in `mesh.runtimes` already started.
    pub async fn new(config: &TetherConfig) -> Self {
        let mut runner = Self {
            mesh: Mesh::new(config.engine.clone()),
            feeds: BTreeMap::new(),
        };
        for name in &config.mesh.runtimes {
            runner.add_runtime(name).await;
        }
        runner
    }

    /// Run one script line. Returns the lines to print: the events the
    /// command caused, prefixed by runtime name, then an ack or nack.
    pub async fn execute_line(&mut self, line_no: usize, line: &str) -> Vec<String> {
        let (name, outcome) = match parse_line(line) {
            Ok(None) => return Vec::new(),
            Ok(Some(command)) => {
                let name = command.name();
                debug!(line = line_no, command = name, "executing");
                (Some(name), self.execute(command).await)
            }
            Err(e) => (None, Err(e.into())),
        };

        let mut lines = self.drain_events();
        let reply = match outcome {
            Ok(extra) => {
                let mut reply = json!({ "success": true, "line": line_no, "command": name });
                if let (Some(fields), Some(Value::Object(extra))) = (reply.as_object_mut(), extra) {
                    fields.extend(extra);
                }
                reply
            }
            Err(e) => {
                warn!(line = line_no, error = %e, "command failed");
                json!({ "success": false, "line": line_no, "command": name, "reason": e.to_string() })
            }
        };
        lines.push(reply.to_string());
        lines
    }

    async fn execute(&mut self, command: Command) -> Result<Option<Value>, CommandError> {
        match command {
            Command::Runtime(name) => {
                self.add_runtime(&name).await;
            }
            Command::Open {
                runtime,
                window,
                native_key,
            } => {
                self.mesh.open_window(&runtime, window, native_key).await?;
            }
            Command::Close { runtime, window } => {
                if !self.mesh.close_window(&runtime, &window).await? {
                    return Err(CommandError::NotOpen(window));
                }
            }
            Command::Join {
                runtime,
                source,
                target,
            } => {
                self.runtime(&runtime)
                    .await?
                    .engine()
                    .join(&source, &target)
                    .await?;
            }
            Command::Merge {
                runtime,
                source,
                target,
            } => {
                self.runtime(&runtime)
                    .await?
                    .engine()
                    .merge(&source, &target)
                    .await?;
            }
            Command::Leave { runtime, window } => {
                self.runtime(&runtime).await?.engine().leave(&window).await?;
            }
            Command::Groups(runtime) => {
                let runtime = self.runtime(&runtime).await?;
                let engine = runtime.engine();
                let mut groups = Vec::new();
                for (group_id, members) in engine.all_groups().await {
                    let fingerprint = engine.fingerprint(&group_id).await;
                    groups.push(json!({
                        "groupId": group_id,
                        "members": members,
                        "fingerprint": fingerprint,
                    }));
                }
                return Ok(Some(json!({ "groups": groups })));
            }
        }
        Ok(None)
    }

    async fn add_runtime(&mut self, name: &str) {
        if self.feeds.contains_key(name) {
            return;
        }
        let runtime = self.mesh.add_runtime(name).await;
        self.feeds.insert(name.to_string(), runtime.subscribe());
    }

    async fn runtime(&self, name: &str) -> Result<Arc<Runtime>, CommandError> {
        self.mesh
            .runtime(name)
            .await
            .ok_or_else(|| MeshError::UnknownRuntime(name.to_string()).into())
    }

    fn drain_events(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        for (name, feed) in &mut self.feeds {
            loop {
                match feed.try_recv() {
                    Ok(event) => lines.push(format!("{name} {}", event.to_wire())),
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!(runtime = %name, skipped, "event feed lagged, events dropped");
                    }
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(runner: &mut Runner, script: &str) -> Vec<String> {
        let mut out = Vec::new();
        for (idx, line) in script.lines().enumerate() {
            out.extend(runner.execute_line(idx + 1, line).await);
        }
        out
    }

    fn reply(line: &str) -> Value {
        serde_json::from_str(line).unwrap()
    }

    fn replies(out: &[String]) -> Vec<Value> {
        out.iter()
            .filter(|l| l.starts_with('{'))
            .map(|l| reply(l))
            .collect()
    }

    #[tokio::test]
    async fn join_prints_event_then_ack() {
        let mut runner = Runner::new(&TetherConfig::default()).await;
        let out = run(
            &mut runner,
            "runtime a\nopen a app/main 0x1\nopen a app/side 0x2\njoin a app/side app/main",
        )
        .await;

        assert_eq!(out.len(), 5);
        let event = out[3].strip_prefix("a ").unwrap();
        let event = reply(event);
        assert_eq!(event["type"], "group-changed");
        assert_eq!(event["reason"], "join");
        assert_eq!(event["targetGroup"].as_array().unwrap().len(), 2);

        let ack = reply(&out[4]);
        assert_eq!(ack["success"], true);
        assert_eq!(ack["command"], "join");
        assert_eq!(ack["line"], 4);
    }

    #[tokio::test]
    async fn failures_are_nacks_and_do_not_stop_the_script() {
        let mut runner = Runner::new(&TetherConfig::default()).await;
        let out = run(
            &mut runner,
            "runtime a\nbogus\n# comment\n\njoin a app/main\nleave nowhere app/main\nclose a app/main\nopen a app/main 0x1",
        )
        .await;

        let replies = replies(&out);
        let success: Vec<bool> = replies
            .iter()
            .map(|r| r["success"].as_bool().unwrap())
            .collect();
        assert_eq!(success, vec![true, false, false, false, false, true]);
        assert!(replies[1]["reason"]
            .as_str()
            .unwrap()
            .contains("unknown command"));
        assert!(replies[3]["reason"]
            .as_str()
            .unwrap()
            .contains("unknown runtime"));
        assert!(replies[4]["reason"]
            .as_str()
            .unwrap()
            .contains("window not open"));
    }

    #[tokio::test]
    async fn unresolvable_join_is_a_nack() {
        let mut runner = Runner::new(&TetherConfig::default()).await;
        let out = run(
            &mut runner,
            "runtime a\nopen a app/main 0x1\njoin a app/main app/missing",
        )
        .await;
        let last = reply(out.last().unwrap());
        assert_eq!(last["success"], false);
        assert_eq!(last["command"], "join");
    }

    #[tokio::test]
    async fn configured_runtimes_start_up_front() {
        let mut config = TetherConfig::default();
        config.mesh.runtimes = vec!["x".into(), "y".into()];
        let mut runner = Runner::new(&config).await;

        let out = run(&mut runner, "open y app/main 0x1").await;
        assert_eq!(reply(&out[0])["success"], true);
    }

    #[tokio::test]
    async fn groups_lists_members_and_fingerprint() {
        let mut runner = Runner::new(&TetherConfig::default()).await;
        let out = run(
            &mut runner,
            "runtime a\nopen a app/one 0x1\nopen a app/two 0x2\njoin a app/one app/two\ngroups a",
        )
        .await;

        let listing = reply(out.last().unwrap());
        let groups = listing["groups"].as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["members"][0]["windowName"], "one");
        assert_eq!(groups[0]["fingerprint"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn cross_runtime_join_reports_events_from_both_runtimes() {
        let mut runner = Runner::new(&TetherConfig::default()).await;
        let out = run(
            &mut runner,
            "runtime a\nruntime b\nopen a alpha/main 0xa\nopen b beta/main 0xb\njoin a alpha/main beta/main",
        )
        .await;

        assert!(out.iter().any(|l| l.starts_with("a {")));
        assert!(out.iter().any(|l| l.starts_with("b {")));
        assert_eq!(reply(out.last().unwrap())["success"], true);
    }
}
