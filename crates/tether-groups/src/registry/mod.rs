//! Group membership arena.
//!
//! Groups are records addressed by `GroupId`; window handles refer to their
//! group by id only. The registry stores membership but applies no policy:
//! disbanding undersized groups is the engine's job, so bulk operations can
//! pass through one-member states before the final check.

mod fingerprint;
mod invariants;

use std::collections::{BTreeSet, HashMap};

use tether_common::{GroupId, Identity};

use crate::handle::WindowHandle;

pub use fingerprint::fingerprint_keys;

#[derive(Debug, Default)]
pub struct GroupRegistry {
    /// Group records by id.
    groups: HashMap<GroupId, BTreeSet<Identity>>,
    /// Every handle the engine has resolved, grouped or not.
    windows: HashMap<Identity, WindowHandle>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Handles --

    pub fn handle(&self, identity: &Identity) -> Option<&WindowHandle> {
        self.windows.get(identity)
    }

    /// Insert a freshly resolved handle, or refresh the cached one.
    ///
    /// Group membership of an existing handle is preserved.
    pub fn upsert_handle(&mut self, handle: WindowHandle) {
        match self.windows.get_mut(&handle.identity) {
            Some(existing) => {
                existing.native_key = handle.native_key;
                existing.is_proxy = handle.is_proxy;
            }
            None => {
                let mut handle = handle;
                handle.group_id = None;
                self.windows.insert(handle.identity.clone(), handle);
            }
        }
    }

    /// Drop a cached handle. Grouped handles are kept.
    pub fn forget(&mut self, identity: &Identity) -> bool {
        match self.windows.get(identity) {
            Some(handle) if handle.group_id.is_none() => {
                self.windows.remove(identity);
                true
            }
            _ => false,
        }
    }

    pub fn group_id_of(&self, identity: &Identity) -> Option<&GroupId> {
        self.windows.get(identity).and_then(|h| h.group_id.as_ref())
    }

    pub fn set_group_id(&mut self, identity: &Identity, group_id: Option<GroupId>) {
        if let Some(handle) = self.windows.get_mut(identity) {
            handle.group_id = group_id;
        }
    }

    // -- Groups --

    /// Members of a group in identity order; empty for unknown ids.
    pub fn members(&self, group_id: &GroupId) -> Vec<&WindowHandle> {
        self.groups
            .get(group_id)
            .map(|ids| ids.iter().filter_map(|id| self.windows.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn member_ids(&self, group_id: &GroupId) -> Vec<Identity> {
        self.groups
            .get(group_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, group_id: &GroupId) -> usize {
        self.groups.get(group_id).map_or(0, BTreeSet::len)
    }

    pub fn contains_group(&self, group_id: &GroupId) -> bool {
        self.groups.contains_key(group_id)
    }

    /// Add `identity` to `group_id`, allocating a fresh group when `None`.
    /// Adding an existing member is a no-op.
    pub fn add_member(&mut self, group_id: Option<&GroupId>, identity: &Identity) -> GroupId {
        let group_id = group_id.cloned().unwrap_or_else(GroupId::generate);
        self.groups
            .entry(group_id.clone())
            .or_default()
            .insert(identity.clone());
        group_id
    }

    /// Remove `identity` from the group record. Never disbands.
    pub fn remove_member(&mut self, group_id: &GroupId, identity: &Identity) -> bool {
        self.groups
            .get_mut(group_id)
            .is_some_and(|ids| ids.remove(identity))
    }

    /// Delete a group record outright, returning its former members.
    pub fn delete_group(&mut self, group_id: &GroupId) -> Vec<Identity> {
        self.groups
            .remove(group_id)
            .map(|ids| ids.into_iter().collect())
            .unwrap_or_default()
    }

    /// All group ids, sorted.
    pub fn group_ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self.groups.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn has_proxy_windows(&self, group_id: &GroupId) -> bool {
        self.members(group_id).iter().any(|h| h.is_proxy)
    }

    /// Order-independent digest of the group's native keys.
    pub fn fingerprint(&self, group_id: &GroupId) -> String {
        fingerprint_keys(self.members(group_id).iter().map(|h| h.native_key.as_str()))
    }
}
