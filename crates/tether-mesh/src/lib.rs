//! In-process mesh of runtime instances.
//!
//! Each [`Runtime`] hosts the windows of the owners bound to it and runs its
//! own [`GroupingEngine`](tether_groups::GroupingEngine). Peers reach each
//! other through a gateway that looks windows up in the owning runtime, so
//! cross-runtime groups can be exercised without a transport.

mod error;
mod gateway;
mod runtime;

pub use error::MeshError;
pub use runtime::Runtime;

use std::collections::HashMap;
use std::sync::Arc;

use tether_common::{BroadcastSink, Identity};
use tether_config::EngineConfig;
use tether_groups::{GroupingEngine, LocalWindows};
use tokio::sync::RwLock;
use tracing::info;

use crate::gateway::MeshGateway;

/// Runtimes by name, plus the permanent owner -> runtime bindings.
#[derive(Default)]
pub(crate) struct MeshState {
    pub(crate) runtimes: HashMap<String, Arc<Runtime>>,
    /// Set when an owner opens its first window; never released.
    pub(crate) owners: HashMap<String, String>,
}

/// Thread-safe set of runtimes keyed by name.
#[derive(Clone)]
pub struct Mesh {
    state: Arc<RwLock<MeshState>>,
    config: EngineConfig,
}

impl Mesh {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(MeshState::default())),
            config,
        }
    }

    /// Create a runtime, or return the existing one with that name.
    pub async fn add_runtime(&self, name: &str) -> Arc<Runtime> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.runtimes.get(name) {
            return existing.clone();
        }

        let windows = Arc::new(LocalWindows::new());
        let gateway = MeshGateway::new(Arc::downgrade(&self.state), name);
        let engine =
            GroupingEngine::with_config(windows.clone(), &self.config).with_gateway(Arc::new(gateway));
        let events = Arc::new(BroadcastSink::new(self.config.event_buffer as usize));
        engine.subscribe(events.clone()).await;

        let runtime = Arc::new(Runtime::new(name.to_string(), windows, engine, events));
        state.runtimes.insert(name.to_string(), runtime.clone());
        info!(runtime = name, "runtime started");
        runtime
    }

    pub async fn runtime(&self, name: &str) -> Option<Arc<Runtime>> {
        self.state.read().await.runtimes.get(name).cloned()
    }

    /// Runtime names, sorted.
    pub async fn runtime_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().await.runtimes.keys().cloned().collect();
        names.sort();
        names
    }

    /// The runtime an owner is bound to, if it ever opened a window.
    pub async fn owner_runtime(&self, owner_id: &str) -> Option<String> {
        self.state.read().await.owners.get(owner_id).cloned()
    }

    /// Open a window in `runtime`. An owner stays bound to the runtime
    /// where it first opened a window, even after all of them close.
    pub async fn open_window(
        &self,
        runtime: &str,
        identity: Identity,
        native_key: impl Into<String>,
    ) -> Result<Arc<Runtime>, MeshError> {
        let mut state = self.state.write().await;
        let target = state
            .runtimes
            .get(runtime)
            .cloned()
            .ok_or_else(|| MeshError::UnknownRuntime(runtime.to_string()))?;
        match state.owners.get(&identity.owner_id) {
            Some(bound) if bound != runtime => {
                return Err(MeshError::OwnerBound {
                    owner: identity.owner_id.clone(),
                    runtime: bound.clone(),
                });
            }
            Some(_) => {}
            None => {
                info!(owner = %identity.owner_id, runtime, "owner bound");
                state
                    .owners
                    .insert(identity.owner_id.clone(), runtime.to_string());
            }
        }
        target.windows().open(identity, native_key);
        Ok(target)
    }

    /// Close a window in `runtime` and drop it from every peer's groups.
    /// Returns `false` if it was not open there.
    pub async fn close_window(&self, runtime: &str, identity: &Identity) -> Result<bool, MeshError> {
        let (target, peers) = {
            let state = self.state.read().await;
            let target = state
                .runtimes
                .get(runtime)
                .cloned()
                .ok_or_else(|| MeshError::UnknownRuntime(runtime.to_string()))?;
            let peers: Vec<Arc<Runtime>> = state
                .runtimes
                .iter()
                .filter(|(name, _)| *name != runtime)
                .map(|(_, rt)| rt.clone())
                .collect();
            (target, peers)
        };

        if !target.close_window(identity).await {
            return Ok(false);
        }
        for peer in peers {
            peer.engine().window_closed(identity).await;
        }
        Ok(true)
    }
}
