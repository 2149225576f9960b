//! Which record of a duplicate group survives.

use std::cmp::Ordering;

use serde::Serialize;

use crate::record::{DuplicateGroup, GroupKeyValue, RecordRef};

/// Outcome of planning one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Retention {
    pub key_value: GroupKeyValue,
    pub keep: RecordRef,
    pub discard: Vec<RecordRef>,
}

/// Newest first; equal timestamps put the greatest identity first.
fn newest_first(a: &RecordRef, b: &RecordRef) -> Ordering {
    b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id))
}

/// Keep the record with the greatest timestamp, discard the rest.
///
/// Returns `None` for groups with fewer than two members. The result does not
/// depend on member order.
#[must_use]
pub fn plan_retention(group: &DuplicateGroup) -> Option<Retention> {
    if !group.is_duplicate() {
        return None;
    }
    let mut members = group.members.clone();
    members.sort_by(newest_first);
    let mut members = members.into_iter();
    let keep = members.next()?;
    Some(Retention { key_value: group.key_value.clone(), keep, discard: members.collect() })
}

/// Plan every group, skipping singletons.
#[must_use]
pub fn plan_all(groups: &[DuplicateGroup]) -> Vec<Retention> {
    groups.iter().filter_map(plan_retention).collect()
}
