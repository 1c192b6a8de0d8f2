//! Synchronous state transitions. Callers hold the engine lock; each
//! transition applies every registry mutation and event emission of one
//! operation before returning.

use tether_common::{ChangeReason, GroupChangedEvent, GroupId, GroupSide, Identity};
use tracing::{debug, warn};

use crate::directory::WindowDirectory;
use crate::handle::WindowHandle;

use super::types::{EngineState, Registration};

/// The parts of a `group-changed` payload shared by every event of one operation.
struct Payload {
    reason: ChangeReason,
    source_group: Vec<Identity>,
    source_window: Identity,
    target_group: Vec<Identity>,
    target_window: Identity,
}

impl Payload {
    fn for_group(&self, group_id: &GroupId, side: GroupSide) -> GroupChangedEvent {
        GroupChangedEvent {
            group_id: group_id.clone(),
            reason: self.reason,
            side,
            source_group: self.source_group.clone(),
            source_window: self.source_window.clone(),
            target_group: self.target_group.clone(),
            target_window: self.target_window.clone(),
        }
    }
}

impl EngineState {
    /// Cache a resolved handle. New proxies start unregistered.
    pub(super) fn admit(&mut self, handle: WindowHandle) {
        if handle.is_proxy {
            self.proxies
                .entry(handle.identity.clone())
                .or_insert(Registration::Unregistered);
        } else {
            self.proxies.remove(&handle.identity);
        }
        self.registry.upsert_handle(handle);
    }

    fn place(&mut self, group_id: Option<&GroupId>, identity: &Identity) -> GroupId {
        let group_id = self.registry.add_member(group_id, identity);
        self.registry.set_group_id(identity, Some(group_id.clone()));
        group_id
    }

    /// Move `source` into `target`'s group. Returns `false` for no-ops.
    pub(super) fn apply_join(&mut self, source: &Identity, target: &Identity) -> bool {
        if source == target {
            return false;
        }

        let source_group = self.registry.group_id_of(source).cloned();
        let target_group = self.registry.group_id_of(target).cloned();
        if source_group.is_some() && source_group == target_group {
            return false;
        }

        if let Some(old) = &source_group {
            self.registry.remove_member(old, source);
        }

        let joined = self.place(target_group.as_ref(), source);
        if target_group.is_none() {
            self.place(Some(&joined), target);
        }
        debug!(source = %source, target = %target, group_id = %joined, "window joined group");

        let payload = Payload {
            reason: ChangeReason::Join,
            source_group: source_group
                .as_ref()
                .map(|g| self.registry.member_ids(g))
                .unwrap_or_default(),
            source_window: source.clone(),
            target_group: self.registry.member_ids(&joined),
            target_window: target.clone(),
        };
        if let Some(old) = &source_group {
            self.publish(payload.for_group(old, GroupSide::Source));
        }
        self.publish(payload.for_group(&joined, GroupSide::Target));

        if let Some(old) = &source_group {
            self.disband_if_undersized(old);
        }
        true
    }

    /// Fold `source`'s whole group into `target`'s. Returns `false` for no-ops.
    pub(super) fn apply_merge(&mut self, source: &Identity, target: &Identity) -> bool {
        if source == target {
            return false;
        }

        let source_group = self.registry.group_id_of(source).cloned();
        let target_group = self.registry.group_id_of(target).cloned();
        if source_group.is_some() && source_group == target_group {
            return false;
        }

        // Pre-merge membership, for clients animating the transition.
        let before = Payload {
            reason: ChangeReason::Merge,
            source_group: source_group
                .as_ref()
                .map(|g| self.registry.member_ids(g))
                .unwrap_or_default(),
            source_window: source.clone(),
            target_group: target_group
                .as_ref()
                .map(|g| self.registry.member_ids(g))
                .unwrap_or_default(),
            target_window: target.clone(),
        };
        if let Some(g) = &source_group {
            self.publish(before.for_group(g, GroupSide::Source));
        }
        if let Some(g) = &target_group {
            self.publish(before.for_group(g, GroupSide::Target));
        }

        let surviving = match &target_group {
            Some(g) => g.clone(),
            None => self.place(None, target),
        };
        let folded = match &source_group {
            Some(g) => g.clone(),
            None => self.registry.add_member(None, source),
        };

        for member in self.registry.delete_group(&folded) {
            self.place(Some(&surviving), &member);
        }
        debug!(
            source = %source,
            target = %target,
            folded = %folded,
            group_id = %surviving,
            "groups merged"
        );

        let after = Payload {
            reason: ChangeReason::Merge,
            source_group: Vec::new(),
            source_window: source.clone(),
            target_group: self.registry.member_ids(&surviving),
            target_window: target.clone(),
        };
        if source_group.is_some() {
            self.publish(after.for_group(&folded, GroupSide::Source));
        }
        self.publish(after.for_group(&surviving, GroupSide::Target));
        true
    }

    /// Remove `window` from its group. Returns `false` if it had none.
    pub(super) fn apply_leave(&mut self, window: &Identity) -> bool {
        let Some(group_id) = self.registry.group_id_of(window).cloned() else {
            return false;
        };

        self.registry.remove_member(&group_id, window);
        let payload = Payload {
            reason: ChangeReason::Leave,
            source_group: self.registry.member_ids(&group_id),
            source_window: window.clone(),
            target_group: Vec::new(),
            target_window: window.clone(),
        };
        self.publish(payload.for_group(&group_id, GroupSide::Source));
        // Cleared only after the departure event is out.
        self.registry.set_group_id(window, None);
        self.drop_ungrouped_proxy(window);
        debug!(window = %window, group_id = %group_id, "window left group");

        self.disband_if_undersized(&group_id);
        true
    }

    /// Proxy members of `window`'s group, other than `window` itself.
    pub(super) fn proxy_peers(&self, window: &Identity) -> Vec<WindowHandle> {
        let Some(group_id) = self.registry.group_id_of(window) else {
            return Vec::new();
        };
        self.registry
            .members(group_id)
            .into_iter()
            .filter(|h| h.is_proxy && h.identity != *window)
            .cloned()
            .collect()
    }

    /// Whether `window` is hosted by this runtime rather than proxied.
    pub(super) fn hosts(&self, window: &Identity) -> bool {
        self.registry.handle(window).is_some_and(|h| !h.is_proxy)
    }

    /// Proxies that must hear that a hosted `source` is leaving its current
    /// group to join `target`'s.
    pub(super) fn departure_peers(&self, source: &Identity, target: &Identity) -> Vec<WindowHandle> {
        let current = self.registry.group_id_of(source);
        if !self.hosts(source) || current.is_none() || current == self.registry.group_id_of(target) {
            return Vec::new();
        }
        self.proxy_peers(source)
    }

    /// Ungrouped proxies are not kept: the next operation resolves afresh.
    pub(super) fn drop_ungrouped_proxy(&mut self, identity: &Identity) {
        if self
            .registry
            .handle(identity)
            .is_some_and(|h| h.is_proxy && h.group_id.is_none())
        {
            self.registry.forget(identity);
            self.proxies.remove(identity);
        }
    }

    /// Disband a group left with one member, or with no window hosted here.
    fn disband_if_undersized(&mut self, group_id: &GroupId) {
        let remaining = self.registry.member_ids(group_id);
        let hosted = remaining.iter().any(|m| self.hosts(m));
        match remaining.as_slice() {
            [] => {
                self.registry.delete_group(group_id);
            }
            [first, rest @ ..] if rest.is_empty() || !hosted => {
                let payload = Payload {
                    reason: ChangeReason::Disband,
                    source_group: Vec::new(),
                    source_window: first.clone(),
                    target_group: Vec::new(),
                    target_window: first.clone(),
                };
                self.publish(payload.for_group(group_id, GroupSide::Source));
                for member in self.registry.delete_group(group_id) {
                    self.registry.set_group_id(&member, None);
                    self.drop_ungrouped_proxy(&member);
                }
                debug!(group_id = %group_id, last = %first, "group disbanded");
            }
            _ => {}
        }
    }

    /// Mirror windows already grouped with `proxy_target` on its owning
    /// runtime into the local group that `source` shares with it.
    pub(super) fn adopt_remote_members(
        &mut self,
        source: &Identity,
        proxy_target: &Identity,
        listed: Vec<WindowHandle>,
        directory: &dyn WindowDirectory,
    ) {
        let Some(group_id) = self.registry.group_id_of(proxy_target).cloned() else {
            debug!(target = %proxy_target, "proxy left its group before propagation");
            return;
        };
        if self.registry.group_id_of(source) != Some(&group_id) {
            debug!(source = %source, "source left the proxy's group before propagation");
            return;
        }

        for member in listed {
            let identity = member.identity.clone();
            if identity == *source || identity == *proxy_target {
                continue;
            }
            // Windows hosted here are grouped by local operations only.
            if directory.lookup(&identity).is_some() {
                continue;
            }
            match self.registry.group_id_of(&identity) {
                Some(g) if *g == group_id => continue,
                Some(other) => {
                    warn!(
                        window = %identity,
                        group_id = %other,
                        "remote group member already grouped locally, not adopting"
                    );
                    continue;
                }
                None => {}
            }

            self.admit(WindowHandle::proxy(identity.clone(), member.native_key));
            self.proxies
                .insert(identity.clone(), Registration::Registered);
            self.place(Some(&group_id), &identity);

            let payload = Payload {
                reason: ChangeReason::Join,
                source_group: Vec::new(),
                source_window: identity,
                target_group: self.registry.member_ids(&group_id),
                target_window: proxy_target.clone(),
            };
            self.publish(payload.for_group(&group_id, GroupSide::Target));
        }
    }
}
