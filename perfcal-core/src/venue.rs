//! Venue address lookup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Two-line postal address of a venue.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    /// "City, ST 98101" line. `None` when the venue is open or not yet assigned.
    pub locality: Option<String>,
}

impl Address {
    pub fn new(street: impl Into<String>, locality: Option<String>) -> Self {
        Address {
            street: street.into(),
            locality: locality.filter(|l| !l.trim().is_empty()),
        }
    }

    /// Location text for a calendar feed: venue name, then the address lines.
    pub fn location_for(&self, venue: &str) -> String {
        match &self.locality {
            Some(locality) => format!("{}\n{}\n{}", venue, self.street, locality),
            None => format!("{}\n{}", venue, self.street),
        }
    }
}

/// Venue name to address.
#[derive(Debug, Clone, Default)]
pub struct VenueTable {
    venues: BTreeMap<String, Address>,
}

impl VenueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, venue: impl Into<String>, address: Address) {
        self.venues.insert(venue.into(), address);
    }

    pub fn get(&self, venue: &str) -> Option<&Address> {
        self.venues.get(venue)
    }

    pub fn contains(&self, venue: &str) -> bool {
        self.venues.contains_key(venue)
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    /// Add every venue from `other`, replacing entries with the same name.
    pub fn extend(&mut self, other: &VenueTable) {
        for (venue, address) in &other.venues {
            self.venues.insert(venue.clone(), address.clone());
        }
    }
}
