//! Public grouping operations: join, merge, leave, and lifecycle hooks.

use tether_common::{GroupingError, Identity, ResolutionError};
use tracing::{debug, info, warn};

use crate::handle::WindowHandle;

use super::types::EngineState;
use super::{GroupingEngine, Registration};

#[derive(Debug, Clone, Copy)]
enum Kind {
    Join,
    Merge,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::Join => "join",
            Kind::Merge => "merge",
        }
    }
}

impl GroupingEngine {
    /// Place `source` into the group of `target`, creating a group if
    /// `target` has none. Only `source` is ever relocated.
    pub async fn join(&self, source: &Identity, target: &Identity) -> Result<(), GroupingError> {
        self.pairwise(Kind::Join, source, target).await
    }

    /// Fold the whole group of `source` into the group of `target`.
    /// The target's group id survives.
    pub async fn merge(&self, source: &Identity, target: &Identity) -> Result<(), GroupingError> {
        self.pairwise(Kind::Merge, source, target).await
    }

    /// Remove `window` from its group, disbanding the group if one member remains.
    pub async fn leave(&self, window: &Identity) -> Result<(), GroupingError> {
        let peers = {
            let mut state = self.state.write().await;
            let peers = Self::hosted_peers(&state, window);
            if !state.apply_leave(window) {
                return Ok(());
            }
            state.verify();
            peers
        };
        self.release(window, &peers).await;
        Ok(())
    }

    /// The window is gone: leave its group and drop any cached handle.
    pub async fn window_closed(&self, window: &Identity) {
        let peers = {
            let mut state = self.state.write().await;
            let peers = Self::hosted_peers(&state, window);
            state.apply_leave(window);
            state.registry.forget(window);
            state.proxies.remove(window);
            state.verify();
            peers
        };
        self.release(window, &peers).await;
    }

    /// Receiving side of proxy registration: a window owned by another
    /// runtime joined the group of our local window `target`.
    pub async fn accept_remote_join(
        &self,
        source: WindowHandle,
        target: &Identity,
    ) -> Result<(), GroupingError> {
        let Some(target_info) = self.directory.lookup(target) else {
            let err = ResolutionError::NotFound(target.clone());
            warn!(source = %source.identity, target = %target, error = %err, "remote join rejected");
            return Err(err.into());
        };
        if self.directory.lookup(&source.identity).is_some() {
            debug!(source = %source.identity, "remote join names a local window, ignoring");
            return Ok(());
        }

        let source_id = source.identity.clone();
        let mut state = self.state.write().await;
        state.admit(WindowHandle::proxy(source.identity, source.native_key));
        state
            .proxies
            .insert(source_id.clone(), Registration::Registered);
        state.admit(WindowHandle::local(target_info));
        if state.apply_join(&source_id, target) {
            info!(source = %source_id, target = %target, "accepted remote join");
            state.verify();
        }
        Ok(())
    }

    /// Receiving side of proxy release: `window`, owned by another runtime,
    /// is no longer grouped with our local window `target`.
    pub async fn accept_remote_leave(&self, window: &Identity, target: &Identity) {
        if self.directory.lookup(window).is_some() {
            debug!(window = %window, "remote leave names a local window, ignoring");
            return;
        }
        let mut state = self.state.write().await;
        let shared = state.registry.group_id_of(window);
        if shared.is_none() || shared != state.registry.group_id_of(target) {
            return;
        }
        state.apply_leave(window);
        info!(window = %window, target = %target, "accepted remote leave");
        state.verify();
    }

    async fn pairwise(
        &self,
        kind: Kind,
        source: &Identity,
        target: &Identity,
    ) -> Result<(), GroupingError> {
        if source == target {
            return Ok(());
        }

        // All suspension happens here, before the registry is touched.
        let (source_handle, target_handle) = match self.resolve_pair(source, target).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(
                    operation = kind.name(),
                    source = %source,
                    target = %target,
                    error = %e,
                    "grouping request abandoned"
                );
                if let ResolutionError::NotFound(gone) = &e {
                    self.evict_proxy(gone).await;
                }
                return Err(e.into());
            }
        };

        let (claimed, departed) = {
            let mut state = self.state.write().await;
            state.admit(source_handle);
            state.admit(target_handle);
            let departed = match kind {
                Kind::Join => state.departure_peers(source, target),
                Kind::Merge => Vec::new(),
            };
            let changed = match kind {
                Kind::Join => state.apply_join(source, target),
                Kind::Merge => state.apply_merge(source, target),
            };
            if !changed {
                return Ok(());
            }
            state.verify();
            (state.claim_registration(target), departed)
        };

        self.propagate(source, target, claimed, departed).await;
        Ok(())
    }

    /// Proxies to release when hosted `window` leaves its group.
    fn hosted_peers(state: &EngineState, window: &Identity) -> Vec<WindowHandle> {
        if state.hosts(window) {
            state.proxy_peers(window)
        } else {
            Vec::new()
        }
    }

    /// Drop a cached proxy whose window its owner no longer knows.
    async fn evict_proxy(&self, gone: &Identity) {
        let mut state = self.state.write().await;
        if !state.registry.handle(gone).is_some_and(|h| h.is_proxy) {
            return;
        }
        state.apply_leave(gone);
        state.registry.forget(gone);
        state.proxies.remove(gone);
        info!(window = %gone, "evicted proxy for closed remote window");
        state.verify();
    }

    async fn resolve_pair(
        &self,
        source: &Identity,
        target: &Identity,
    ) -> Result<(WindowHandle, WindowHandle), ResolutionError> {
        let source_handle = self.resolve_source(source).await?;
        let target_handle = self.resolve_target(target).await?;
        Ok((source_handle, target_handle))
    }
}
