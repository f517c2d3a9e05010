//! Secondary index from group id to member report keys.

use crate::models::report::GroupListing;
use std::collections::{BTreeSet, HashMap};

/// Group membership for batch-uploaded reports.
///
/// Invariant: no group is empty, and every member key exists in the
/// registry. The second half is upheld by callers invoking
/// [`GroupIndex::remove_key_everywhere`] on every deletion path.
#[derive(Debug, Default)]
pub struct GroupIndex {
    groups: HashMap<String, BTreeSet<String>>,
}

impl GroupIndex {
    /// Add `key` to `group_id`, creating the group if needed. Idempotent.
    pub fn add_member(&mut self, group_id: &str, key: &str) {
        self.groups
            .entry(group_id.to_string())
            .or_default()
            .insert(key.to_string());
    }

    /// Members of `group_id`, sorted. Empty when the group does not exist.
    pub fn members(&self, group_id: &str) -> Vec<String> {
        self.groups
            .get(group_id)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop `key` from every group and delete groups left empty.
    ///
    /// # Returns
    /// Ids of the groups that were deleted.
    pub fn remove_key_everywhere(&mut self, key: &str) -> Vec<String> {
        let mut emptied = Vec::new();
        self.groups.retain(|group_id, keys| {
            keys.remove(key);
            if keys.is_empty() {
                emptied.push(group_id.clone());
                false
            } else {
                true
            }
        });
        emptied
    }

    /// All groups with their members, ordered by group id.
    pub fn list_groups(&self) -> Vec<GroupListing> {
        let mut listings: Vec<GroupListing> = self
            .groups
            .iter()
            .map(|(group_id, keys)| GroupListing {
                group_id: group_id.clone(),
                keys: keys.iter().cloned().collect(),
            })
            .collect();
        listings.sort_by(|a, b| a.group_id.cmp(&b.group_id));
        listings
    }
}
