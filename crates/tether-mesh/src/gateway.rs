//! Gateway from one runtime to its peers in the same mesh.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tether_common::{GroupingError, Identity, ResolutionError};
use tether_groups::{RemoteRuntimeGateway, WindowDirectory, WindowHandle};
use tokio::sync::RwLock;
use tracing::debug;

use crate::runtime::Runtime;
use crate::MeshState;

/// Routes remote calls to the peer runtime the window's owner is bound to.
pub(crate) struct MeshGateway {
    mesh: Weak<RwLock<MeshState>>,
    local: String,
}

impl MeshGateway {
    pub(crate) fn new(mesh: Weak<RwLock<MeshState>>, local: impl Into<String>) -> Self {
        Self {
            mesh,
            local: local.into(),
        }
    }

    async fn owner_runtime(&self, identity: &Identity) -> Result<Arc<Runtime>, ResolutionError> {
        let unreachable = || ResolutionError::RuntimeUnreachable(identity.owner_id.clone());
        let mesh = self.mesh.upgrade().ok_or_else(unreachable)?;
        let state = mesh.read().await;
        let owner = match state.owners.get(&identity.owner_id) {
            None => return Err(unreachable()),
            // Our own owner: the local directory already missed it.
            Some(bound) if *bound == self.local => {
                return Err(ResolutionError::NotFound(identity.clone()));
            }
            Some(bound) => state.runtimes.get(bound).cloned(),
        };
        owner.ok_or_else(unreachable)
    }
}

#[async_trait]
impl RemoteRuntimeGateway for MeshGateway {
    async fn resolve_remote_window(
        &self,
        identity: &Identity,
    ) -> Result<WindowHandle, ResolutionError> {
        let runtime = self.owner_runtime(identity).await?;
        let info = runtime
            .windows()
            .lookup(identity)
            .ok_or_else(|| ResolutionError::NotFound(identity.clone()))?;
        debug!(from = %self.local, to = runtime.name(), window = %identity, "resolved remote window");
        Ok(WindowHandle::proxy(info.identity, info.native_key))
    }

    async fn list_group_members(
        &self,
        proxy: &WindowHandle,
    ) -> Result<Vec<WindowHandle>, ResolutionError> {
        let runtime = self.owner_runtime(&proxy.identity).await?;
        let engine = runtime.engine();
        let mut members = Vec::new();
        for identity in engine.group_of(&proxy.identity).await {
            if identity == proxy.identity {
                continue;
            }
            if let Some(handle) = engine.window(&identity).await {
                members.push(WindowHandle::proxy(handle.identity, handle.native_key));
            }
        }
        Ok(members)
    }

    async fn register_proxy(
        &self,
        source: &WindowHandle,
        proxy: &WindowHandle,
    ) -> Result<(), ResolutionError> {
        let runtime = self.owner_runtime(&proxy.identity).await?;
        runtime
            .engine()
            .accept_remote_join(source.clone(), &proxy.identity)
            .await
            .map_err(|e| match e {
                GroupingError::Resolution(e) => e,
            })
    }

    async fn release_proxy(
        &self,
        window: &Identity,
        proxy: &WindowHandle,
    ) -> Result<(), ResolutionError> {
        let runtime = self.owner_runtime(&proxy.identity).await?;
        runtime
            .engine()
            .accept_remote_leave(window, &proxy.identity)
            .await;
        Ok(())
    }
}
