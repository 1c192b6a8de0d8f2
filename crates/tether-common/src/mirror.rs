//! Subscriber-side reconstruction of group membership from events.

use std::collections::{BTreeMap, BTreeSet};

use crate::events::GroupChangedEvent;
use crate::id::GroupId;
use crate::identity::Identity;

/// Membership view rebuilt by replaying `group-changed` events in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GroupMirror {
    groups: BTreeMap<GroupId, BTreeSet<Identity>>,
}

impl GroupMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. An empty membership deletes the group.
    pub fn apply(&mut self, event: &GroupChangedEvent) {
        let members = event.members();
        if members.is_empty() {
            self.groups.remove(&event.group_id);
        } else {
            self.groups
                .insert(event.group_id.clone(), members.iter().cloned().collect());
        }
    }

    pub fn replay<'a>(events: impl IntoIterator<Item = &'a GroupChangedEvent>) -> Self {
        let mut mirror = Self::new();
        for event in events {
            mirror.apply(event);
        }
        mirror
    }

    pub fn groups(&self) -> &BTreeMap<GroupId, BTreeSet<Identity>> {
        &self.groups
    }

    pub fn group_of(&self, identity: &Identity) -> Option<&GroupId> {
        self.groups
            .iter()
            .find(|(_, members)| members.contains(identity))
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChangeReason, GroupSide};

    fn id(name: &str) -> Identity {
        Identity::new("app", name)
    }

    fn event(
        group: &str,
        reason: ChangeReason,
        side: GroupSide,
        members: &[&str],
    ) -> GroupChangedEvent {
        let list: Vec<Identity> = members.iter().map(|m| id(m)).collect();
        let (source_group, target_group) = match side {
            GroupSide::Source => (list, Vec::new()),
            GroupSide::Target => (Vec::new(), list),
        };
        GroupChangedEvent {
            group_id: GroupId::from_raw(group),
            reason,
            side,
            source_group,
            source_window: id("x"),
            target_group,
            target_window: id("y"),
        }
    }

    #[test]
    fn join_then_disband() {
        let events = vec![
            event("g1", ChangeReason::Join, GroupSide::Target, &["a", "b"]),
            event("g1", ChangeReason::Leave, GroupSide::Source, &["b"]),
            event("g1", ChangeReason::Disband, GroupSide::Source, &[]),
        ];
        let mirror = GroupMirror::replay(&events);
        assert!(mirror.is_empty());
        assert_eq!(mirror.group_of(&id("b")), None);
    }

    #[test]
    fn later_event_replaces_membership() {
        let mut mirror = GroupMirror::new();
        mirror.apply(&event("g1", ChangeReason::Join, GroupSide::Target, &["a", "b"]));
        mirror.apply(&event(
            "g1",
            ChangeReason::Join,
            GroupSide::Target,
            &["a", "b", "c"],
        ));
        assert_eq!(mirror.len(), 1);
        assert_eq!(mirror.group_of(&id("c")), Some(&GroupId::from_raw("g1")));
        assert_eq!(mirror.groups()[&GroupId::from_raw("g1")].len(), 3);
    }
}
