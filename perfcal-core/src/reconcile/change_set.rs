use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::event::{Event, EventKey, EventStatus};

/// Events that differ between the current and old schedules, keyed and
/// ordered like an [`EventCollection`](crate::collection::EventCollection).
///
/// An event without a status is an addition.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changes: BTreeMap<EventKey, Event>,
}

/// How many changes of each kind a set holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeCounts {
    pub added: usize,
    pub modified: usize,
    pub cancelled: usize,
}

impl ChangeSet {
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn get(&self, key: &EventKey) -> Option<&Event> {
        self.changes.get(key)
    }

    pub fn contains_key(&self, key: &EventKey) -> bool {
        self.changes.contains_key(key)
    }

    /// Changes in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, EventKey, Event> {
        self.changes.iter()
    }

    pub fn counts(&self) -> ChangeCounts {
        let mut counts = ChangeCounts::default();
        for event in self.changes.values() {
            match event.status {
                None => counts.added += 1,
                Some(EventStatus::Modified(_)) => counts.modified += 1,
                Some(EventStatus::Cancelled) => counts.cancelled += 1,
            }
        }
        counts
    }

    pub(crate) fn record(&mut self, key: EventKey, event: Event) {
        self.changes.insert(key, event);
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = (&'a EventKey, &'a Event);
    type IntoIter = btree_map::Iter<'a, EventKey, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}
