//! Identity resolution: the local directory first, then the owning runtime.

use std::future::Future;

use tether_common::{Identity, ResolutionError};
use tracing::debug;

use crate::handle::WindowHandle;

use super::GroupingEngine;

impl GroupingEngine {
    fn resolve_local(&self, identity: &Identity) -> Option<WindowHandle> {
        self.directory.lookup(identity).map(WindowHandle::local)
    }

    async fn is_cached_proxy(&self, identity: &Identity) -> bool {
        self.state
            .read()
            .await
            .registry
            .handle(identity)
            .is_some_and(|h| h.is_proxy)
    }

    /// Ask the owning runtime for the window. Cached proxies are never
    /// trusted on their own: the remote window may have closed since.
    async fn resolve_remote(&self, identity: &Identity) -> Result<WindowHandle, ResolutionError> {
        let Some(gateway) = &self.gateway else {
            return Err(ResolutionError::NotFound(identity.clone()));
        };

        let remote = self
            .remote_call(identity, gateway.resolve_remote_window(identity))
            .await?;
        debug!(window = %identity, "resolved remote window");
        Ok(WindowHandle::proxy(identity.clone(), remote.native_key))
    }

    /// A local window, or a remote one this engine already holds a proxy for.
    pub(super) async fn resolve_source(
        &self,
        identity: &Identity,
    ) -> Result<WindowHandle, ResolutionError> {
        if let Some(handle) = self.resolve_local(identity) {
            return Ok(handle);
        }
        if self.is_cached_proxy(identity).await {
            return self.resolve_remote(identity).await;
        }
        Err(ResolutionError::NotFound(identity.clone()))
    }

    /// A local window, or any window the gateway can reach.
    pub(super) async fn resolve_target(
        &self,
        identity: &Identity,
    ) -> Result<WindowHandle, ResolutionError> {
        match self.resolve_local(identity) {
            Some(handle) => Ok(handle),
            None => self.resolve_remote(identity).await,
        }
    }

    /// Bound a gateway round-trip by the configured resolve timeout.
    pub(super) async fn remote_call<T>(
        &self,
        identity: &Identity,
        call: impl Future<Output = Result<T, ResolutionError>>,
    ) -> Result<T, ResolutionError> {
        tokio::time::timeout(self.resolve_timeout, call)
            .await
            .map_err(|_| ResolutionError::Timeout(identity.clone()))?
    }
}
