//! Keeping owning runtimes in step with groups that contain their windows.

use tether_common::Identity;
use tracing::{debug, info, warn};

use crate::handle::WindowHandle;

use super::types::{EngineState, Registration};
use super::GroupingEngine;

impl EngineState {
    /// Claim the one remote group listing for `proxy`, if it is a proxy
    /// nobody has listed or started listing yet.
    pub(super) fn claim_registration(&mut self, proxy: &Identity) -> Option<WindowHandle> {
        let handle = self.registry.handle(proxy).filter(|h| h.is_proxy)?.clone();
        if self.proxies.get(proxy) != Some(&Registration::Unregistered) {
            return None;
        }
        self.proxies.insert(proxy.clone(), Registration::Pending);
        Some(handle)
    }

    fn set_registration(&mut self, proxy: &Identity, registered: bool) {
        // The proxy may have been forgotten while the round-trip was in flight.
        if let Some(entry) = self.proxies.get_mut(proxy) {
            *entry = if registered {
                Registration::Registered
            } else {
                Registration::Unregistered
            };
        }
    }
}

impl GroupingEngine {
    /// Runs after a grouping change around `anchor` has been applied.
    ///
    /// A freshly `claimed` proxy first has its remote group folded in. Then
    /// the proxies `source` left behind are released, and every proxy in
    /// `anchor`'s group is told the full membership. Failures are logged and
    /// leave the affected proxies unregistered for the next operation.
    pub(super) async fn propagate(
        &self,
        source: &Identity,
        anchor: &Identity,
        claimed: Option<WindowHandle>,
        departed: Vec<WindowHandle>,
    ) {
        if self.gateway.is_none() {
            if let Some(proxy) = claimed {
                self.state
                    .write()
                    .await
                    .set_registration(&proxy.identity, false);
            }
            return;
        }

        let mut unlisted = None;
        if let Some(proxy) = claimed {
            if !self.adopt_remote_group(anchor, &proxy).await {
                unlisted = Some(proxy.identity);
            }
        }
        self.release(source, &departed).await;
        self.push_membership(anchor, unlisted.as_ref()).await;
    }

    /// Fold the windows already grouped with `proxy` on its owning runtime
    /// into `anchor`'s group. Returns whether the listing succeeded.
    async fn adopt_remote_group(&self, anchor: &Identity, proxy: &WindowHandle) -> bool {
        let Some(gateway) = &self.gateway else {
            return false;
        };
        let listed = self
            .remote_call(&proxy.identity, gateway.list_group_members(proxy))
            .await;

        let mut state = self.state.write().await;
        match listed {
            Ok(members) => {
                state.adopt_remote_members(anchor, &proxy.identity, members, self.directory.as_ref());
                state.verify();
                true
            }
            Err(e) => {
                warn!(proxy = %proxy.identity, error = %e, "could not list remote group members");
                false
            }
        }
    }

    /// Tell the owners of `peers` that hosted `window` is no longer grouped with them.
    pub(super) async fn release(&self, window: &Identity, peers: &[WindowHandle]) {
        let Some(gateway) = &self.gateway else {
            return;
        };
        for peer in peers {
            match self
                .remote_call(&peer.identity, gateway.release_proxy(window, peer))
                .await
            {
                Ok(()) => debug!(window = %window, proxy = %peer.identity, "released proxy"),
                Err(e) => {
                    warn!(window = %window, proxy = %peer.identity, error = %e, "proxy release failed");
                }
            }
        }
    }

    /// Register every other member of `anchor`'s group with each proxy's
    /// owning runtime, so both sides hold the same membership.
    async fn push_membership(&self, anchor: &Identity, unlisted: Option<&Identity>) {
        let Some(gateway) = &self.gateway else {
            return;
        };
        let members: Vec<WindowHandle> = {
            let state = self.state.read().await;
            match state.registry.group_id_of(anchor) {
                Some(gid) => state.registry.members(gid).into_iter().cloned().collect(),
                None => {
                    debug!(anchor = %anchor, "group dissolved before propagation");
                    return;
                }
            }
        };

        let mut outcomes = Vec::new();
        for proxy in members.iter().filter(|h| h.is_proxy) {
            let mut delivered = true;
            for member in members.iter().filter(|m| m.identity != proxy.identity) {
                if let Err(e) = self
                    .remote_call(&proxy.identity, gateway.register_proxy(member, proxy))
                    .await
                {
                    warn!(
                        source = %member.identity,
                        proxy = %proxy.identity,
                        error = %e,
                        "proxy registration failed"
                    );
                    delivered = false;
                    break;
                }
            }
            if delivered {
                info!(proxy = %proxy.identity, members = members.len(), "registered group with proxy owner");
            }
            outcomes.push((proxy.identity.clone(), delivered));
        }

        let mut state = self.state.write().await;
        for (proxy, delivered) in outcomes {
            state.set_registration(&proxy, delivered && unlisted != Some(&proxy));
        }
    }
}
