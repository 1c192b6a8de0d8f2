//! Core types, constructors, and read-only queries for GroupingEngine.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tether_common::{EventSink, GroupChangedEvent, GroupId, Identity, InvariantViolation};
use tether_config::EngineConfig;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::directory::WindowDirectory;
use crate::gateway::RemoteRuntimeGateway;
use crate::handle::WindowHandle;
use crate::registry::GroupRegistry;

/// Registration of a proxy handle with the runtime that owns the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Unregistered,
    /// A registration round-trip is in flight.
    Pending,
    Registered,
}

/// Mutable state guarded by the engine lock.
pub(super) struct EngineState {
    pub(super) registry: GroupRegistry,
    /// Registration state per proxy identity.
    pub(super) proxies: HashMap<Identity, Registration>,
    /// Subscribers, in subscription order.
    pub(super) sinks: Vec<Arc<dyn EventSink>>,
    pub(super) verify_invariants: bool,
}

impl EngineState {
    /// Deliver an event to every subscriber. Delivery failures are logged;
    /// the registry mutation that caused the event stands.
    pub(super) fn publish(&self, event: GroupChangedEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.publish(&event) {
                warn!(
                    group_id = %event.group_id,
                    reason = ?event.reason,
                    error = %e,
                    "failed to deliver group-changed event"
                );
            }
        }
    }

    pub(super) fn verify(&self) {
        if !self.verify_invariants {
            return;
        }
        if let Err(violation) = self.registry.check_invariants() {
            error!(%violation, "group registry invariant violated");
            if cfg!(debug_assertions) {
                panic!("group registry invariant violated: {violation}");
            }
        }
    }
}

/// Coordinates window groups for one runtime instance.
pub struct GroupingEngine {
    pub(super) state: RwLock<EngineState>,
    pub(super) directory: Arc<dyn WindowDirectory>,
    pub(super) gateway: Option<Arc<dyn RemoteRuntimeGateway>>,
    pub(super) resolve_timeout: Duration,
}

impl GroupingEngine {
    /// Create an engine that can only group local windows.
    pub fn new(directory: Arc<dyn WindowDirectory>) -> Self {
        Self::with_config(directory, &EngineConfig::default())
    }

    pub fn with_config(directory: Arc<dyn WindowDirectory>, config: &EngineConfig) -> Self {
        Self {
            state: RwLock::new(EngineState {
                registry: GroupRegistry::new(),
                proxies: HashMap::new(),
                sinks: Vec::new(),
                verify_invariants: config.verify_invariants,
            }),
            directory,
            gateway: None,
            resolve_timeout: config.resolve_timeout(),
        }
    }

    /// Attach a gateway for windows owned by other runtime instances.
    pub fn with_gateway(mut self, gateway: Arc<dyn RemoteRuntimeGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Add a subscriber for `group-changed` events.
    pub async fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.state.write().await.sinks.push(sink);
    }

    // -- Queries --

    /// Members of the window's group, or empty if it is ungrouped.
    pub async fn group_of(&self, identity: &Identity) -> Vec<Identity> {
        let state = self.state.read().await;
        state
            .registry
            .group_id_of(identity)
            .map(|gid| state.registry.member_ids(gid))
            .unwrap_or_default()
    }

    pub async fn group_id_of(&self, identity: &Identity) -> Option<GroupId> {
        self.state
            .read()
            .await
            .registry
            .group_id_of(identity)
            .cloned()
    }

    /// Every group with its members, ordered by group id.
    pub async fn all_groups(&self) -> Vec<(GroupId, Vec<Identity>)> {
        let state = self.state.read().await;
        state
            .registry
            .group_ids()
            .into_iter()
            .map(|gid| {
                let members = state.registry.member_ids(&gid);
                (gid, members)
            })
            .collect()
    }

    /// The cached handle for a window, local or proxy.
    pub async fn window(&self, identity: &Identity) -> Option<WindowHandle> {
        self.state.read().await.registry.handle(identity).cloned()
    }

    pub async fn fingerprint(&self, group_id: &GroupId) -> String {
        self.state.read().await.registry.fingerprint(group_id)
    }

    pub async fn has_proxy_windows(&self, group_id: &GroupId) -> bool {
        self.state.read().await.registry.has_proxy_windows(group_id)
    }

    pub async fn registration(&self, identity: &Identity) -> Option<Registration> {
        self.state.read().await.proxies.get(identity).copied()
    }

    pub async fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.state.read().await.registry.check_invariants()
    }
}
