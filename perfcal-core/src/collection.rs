//! Keyed event collections.

use std::collections::BTreeMap;
use std::collections::btree_map;

use log::warn;

use crate::event::{Event, EventKey};

/// Events keyed by (start, end), iterated in key order.
///
/// Keys are unique: inserting a second event under an existing key is
/// rejected and the first one is kept.
#[derive(Debug, Clone, Default)]
pub struct EventCollection {
    events: BTreeMap<EventKey, Event>,
}

/// Result of checking a new key against the events already collected.
#[derive(Debug)]
pub enum Overlap<'a> {
    /// Same start and end as an existing event
    Exact(&'a Event),
    /// Partially intersects an existing event
    Partial(&'a EventKey, &'a Event),
}

impl EventCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, key: &EventKey) -> Option<&Event> {
        self.events.get(key)
    }

    pub fn contains_key(&self, key: &EventKey) -> bool {
        self.events.contains_key(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, EventKey, Event> {
        self.events.iter()
    }

    /// Insert an event. Returns false (and logs) if the key is already taken.
    pub fn insert(&mut self, key: EventKey, event: Event) -> bool {
        if let Some(existing) = self.events.get(&key) {
            warn!(
                "duplicate event start/end {}: keeping '{}', discarding '{}'",
                key, existing.title, event.title
            );
            return false;
        }
        self.events.insert(key, event);
        true
    }

    /// Find an existing event that collides with `key`.
    ///
    /// Linear in the size of the collection, which stays in the low hundreds.
    pub fn find_overlap(&self, key: &EventKey) -> Option<Overlap<'_>> {
        if let Some(existing) = self.events.get(key) {
            return Some(Overlap::Exact(existing));
        }
        self.events
            .iter()
            .find(|(other, _)| key.overlaps(other))
            .map(|(other, event)| Overlap::Partial(other, event))
    }
}

impl<'a> IntoIterator for &'a EventCollection {
    type Item = (&'a EventKey, &'a Event);
    type IntoIter = btree_map::Iter<'a, EventKey, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl FromIterator<(EventKey, Event)> for EventCollection {
    fn from_iter<I: IntoIterator<Item = (EventKey, Event)>>(iter: I) -> Self {
        let mut collection = EventCollection::new();
        for (key, event) in iter {
            collection.insert(key, event);
        }
        collection
    }
}
