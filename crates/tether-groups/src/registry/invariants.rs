use std::collections::HashMap;

use tether_common::{GroupId, Identity, InvariantViolation};

use super::GroupRegistry;

impl GroupRegistry {
    /// Verify the membership invariants:
    /// every group has at least two members, no window is in two groups,
    /// and a handle carries a group id exactly when it is a member of that group.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut seen: HashMap<&Identity, &GroupId> = HashMap::new();

        let mut group_ids: Vec<&GroupId> = self.groups.keys().collect();
        group_ids.sort();

        for group_id in group_ids {
            let members = &self.groups[group_id];
            if members.len() < 2 {
                return Err(InvariantViolation::UndersizedGroup {
                    group: group_id.clone(),
                    size: members.len(),
                });
            }

            for identity in members {
                if let Some(first) = seen.insert(identity, group_id) {
                    return Err(InvariantViolation::DuplicateMembership {
                        window: identity.clone(),
                        first: first.clone(),
                        second: group_id.clone(),
                    });
                }

                let carried = self.windows.get(identity).and_then(|h| h.group_id.as_ref());
                if carried != Some(group_id) {
                    return Err(InvariantViolation::MissingGroupId {
                        window: identity.clone(),
                        group: group_id.clone(),
                    });
                }
            }
        }

        for handle in self.windows.values() {
            if let Some(group_id) = &handle.group_id {
                if seen.get(&handle.identity) != Some(&group_id) {
                    return Err(InvariantViolation::DanglingGroupId {
                        window: handle.identity.clone(),
                        group: group_id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
