//! Schedule normalization.
//!
//! Loaders feed raw rows into a [`ScheduleBuilder`], which applies the rules
//! every source shares: conversion to the organization timezone, the
//! exclusive end of absences, date-range and event-type filtering, venue
//! validation and overlap detection. Bad rows are logged and skipped; the
//! builder never fails.

use chrono::{Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use log::{debug, warn};

use crate::collection::{EventCollection, Overlap};
use crate::date_range::DateRange;
use crate::event::{Event, EventKey, EventType, local_midnight, localize};
use crate::venue::VenueTable;

/// A loaded source: its events plus the venue addresses it knows about.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub events: EventCollection,
    pub venues: VenueTable,
}

/// Which kinds of events to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTypes {
    pub absences: bool,
    pub board: bool,
    pub performances: bool,
    pub rehearsals: bool,
}

impl Default for EventTypes {
    fn default() -> Self {
        EventTypes {
            absences: true,
            board: true,
            performances: true,
            rehearsals: true,
        }
    }
}

impl EventTypes {
    pub fn any(&self) -> bool {
        self.absences || self.board || self.performances || self.rehearsals
    }

    pub fn includes(&self, kind: EventType) -> bool {
        match kind {
            EventType::Rehearsal => self.rehearsals,
            EventType::Performance | EventType::Other | EventType::Social => self.performances,
            EventType::Meeting => self.board,
            EventType::Absence => self.absences,
        }
    }
}

/// A timed booking row: one event on one date.
#[derive(Debug, Clone, Default)]
pub struct BookingRow {
    pub title: Option<String>,
    pub venue: Option<String>,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub uniform: Option<String>,
    pub kind: Option<String>,
}

/// An absence row. `end` is the last day absent, inclusive.
#[derive(Debug, Clone)]
pub struct AbsenceRow {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub description: Option<String>,
}

pub struct ScheduleBuilder<'a> {
    tz: Tz,
    range: &'a DateRange,
    types: EventTypes,
    schedule: Schedule,
}

impl<'a> ScheduleBuilder<'a> {
    pub fn new(tz: Tz, range: &'a DateRange, types: EventTypes) -> Self {
        ScheduleBuilder {
            tz,
            range,
            types,
            schedule: Schedule::default(),
        }
    }

    pub fn with_venues(mut self, venues: VenueTable) -> Self {
        self.schedule.venues = venues;
        self
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn venues_mut(&mut self) -> &mut VenueTable {
        &mut self.schedule.venues
    }

    pub fn event_count(&self) -> usize {
        self.schedule.events.len()
    }

    /// Add a booking row from a workbook sheet. Returns true if an event was stored.
    pub fn add_booking(&mut self, row: BookingRow) -> bool {
        let Some(date) = row.date else {
            return false;
        };

        let kind = match row.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(label) => EventType::from_label(label).unwrap_or_else(|| {
                warn!("unknown event type '{}' on {}, treating it as Other", label, date);
                EventType::Other
            }),
            None => EventType::Other,
        };

        let venue = row.venue.unwrap_or_default().trim().to_string();
        if !kind.is_absence() && !self.schedule.venues.contains(&venue) {
            warn!("didn't recognize '{}' as a valid venue on {}", venue, date);
            return false;
        }

        // A date with no title is an open slot, not an event
        let Some(title) = row.title.filter(|t| !t.trim().is_empty()) else {
            return false;
        };

        if !self.types.includes(kind) {
            debug!("skipping {} '{}' on {}", kind, title, date);
            return false;
        }

        let start = localize(&self.tz, date.and_time(row.start.unwrap_or(NaiveTime::MIN)));
        let end = localize(&self.tz, date.and_time(row.end.unwrap_or(NaiveTime::MIN)));
        let (Some(start), Some(end)) = (start, end) else {
            warn!("'{}' on {} falls in a daylight-saving gap, skipping", title, date);
            return false;
        };

        if end < start {
            warn!("ignoring '{}' on {}: end is before start", title, date);
            return false;
        }

        let key = EventKey::new(start, end);
        match self.schedule.events.find_overlap(&key) {
            Some(Overlap::Exact(existing)) => {
                warn!(
                    "event overlap at {}: '{}' and '{}', second event discarded",
                    key, existing.title, title
                );
                return false;
            }
            Some(Overlap::Partial(other, existing)) => {
                warn!(
                    "event overlap: '{}' ({}) and '{}' ({})",
                    existing.title, other, title, key
                );
            }
            None => {}
        }

        if !self.range.contains(&key) {
            return false;
        }

        let event = Event::new(title.trim(), venue, kind).with_uniform(row.uniform);
        self.schedule.events.insert(key, event)
    }

    /// Add an absence row. The stored end is the midnight after the last day,
    /// making the interval half-open.
    pub fn add_absence(&mut self, row: AbsenceRow) -> bool {
        let Some(description) = row.description.filter(|d| !d.trim().is_empty()) else {
            return false;
        };

        if !self.types.absences {
            return false;
        }

        let last_day = row.end.unwrap_or(row.start);
        if last_day < row.start {
            warn!(
                "ignoring '{}' absence: end ({}) is before start ({})",
                description, last_day, row.start
            );
            return false;
        }

        let start = local_midnight(&self.tz, row.start);
        let end = local_midnight(&self.tz, last_day + Duration::days(1));
        let (Some(start), Some(end)) = (start, end) else {
            warn!("'{}' absence has no local midnight, skipping", description);
            return false;
        };

        let key = EventKey::new(start, end);
        // Filtered on the stored exclusive end, same as feed absences: an
        // absence whose last day is the day before the range still touches it
        if !self.range.contains(&key) {
            return false;
        }

        let event = Event::new(description.trim(), "", EventType::Absence);
        self.schedule.events.insert(key, event)
    }

    /// Add an event already read from a calendar feed.
    pub fn add_feed_event(&mut self, key: EventKey, event: Event) -> bool {
        if !self.range.contains(&key) {
            return false;
        }

        if !self.types.includes(event.kind) {
            debug!("skipping {} '{}' at {}", event.kind, event.title, key);
            return false;
        }

        self.schedule.events.insert(key, event)
    }

    pub fn finish(self) -> Schedule {
        self.schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue::Address;
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;

    fn january() -> DateRange {
        DateRange::from_months(
            Some("2024:1"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Los_Angeles,
        )
        .unwrap()
    }

    fn venues() -> VenueTable {
        let mut venues = VenueTable::new();
        venues.insert(
            "Hall",
            Address::new("100 Main St", Some("Seattle, WA 98101".to_string())),
        );
        venues
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn booking(title: &str, day: u32, start: u32, end: u32) -> BookingRow {
        BookingRow {
            title: Some(title.to_string()),
            venue: Some("Hall".to_string()),
            date: Some(date(day)),
            start: Some(time(start, 0)),
            end: Some(time(end, 0)),
            uniform: None,
            kind: Some("Rehearsal".to_string()),
        }
    }

    #[test]
    fn test_booking_is_localized() {
        let range = january();
        let mut builder =
            ScheduleBuilder::new(Los_Angeles, &range, EventTypes::default()).with_venues(venues());
        assert!(builder.add_booking(booking("Rehearsal", 2, 18, 20)));

        let schedule = builder.finish();
        let (key, event) = schedule.events.iter().next().unwrap();
        assert_eq!(key.start, Los_Angeles.with_ymd_and_hms(2024, 1, 2, 18, 0, 0).unwrap());
        assert_eq!(key.end, Los_Angeles.with_ymd_and_hms(2024, 1, 2, 20, 0, 0).unwrap());
        assert_eq!(event.kind, EventType::Rehearsal);
        assert_eq!(event.venue, "Hall");
    }

    #[test]
    fn test_exact_overlap_discards_second_partial_keeps_both() {
        let range = january();
        let mut builder =
            ScheduleBuilder::new(Los_Angeles, &range, EventTypes::default()).with_venues(venues());

        assert!(builder.add_booking(booking("Rehearsal", 2, 18, 20)));
        assert!(!builder.add_booking(booking("Practice", 2, 18, 20)));
        assert!(builder.add_booking(booking("Sectional", 2, 19, 21)));

        let schedule = builder.finish();
        let titles: Vec<_> = schedule.events.iter().map(|(_, e)| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Rehearsal", "Sectional"]);
    }

    #[test]
    fn test_unknown_venue_is_rejected() {
        let range = january();
        let mut builder =
            ScheduleBuilder::new(Los_Angeles, &range, EventTypes::default()).with_venues(venues());
        let mut row = booking("Singout", 4, 18, 19);
        row.venue = Some("Nowhere".to_string());
        row.kind = Some("Performance".to_string());

        assert!(!builder.add_booking(row));
        assert_eq!(builder.event_count(), 0);
    }

    #[test]
    fn test_untitled_row_is_skipped() {
        let range = january();
        let mut builder =
            ScheduleBuilder::new(Los_Angeles, &range, EventTypes::default()).with_venues(venues());
        let mut row = booking("", 4, 18, 19);
        row.title = None;
        assert!(!builder.add_booking(row));
    }

    #[test]
    fn test_disabled_type_is_skipped() {
        let range = january();
        let types = EventTypes {
            rehearsals: false,
            ..EventTypes::default()
        };
        let mut builder = ScheduleBuilder::new(Los_Angeles, &range, types).with_venues(venues());
        assert!(!builder.add_booking(booking("Rehearsal", 2, 18, 20)));
    }

    #[test]
    fn test_out_of_range_booking_is_dropped() {
        let range = january();
        let mut builder =
            ScheduleBuilder::new(Los_Angeles, &range, EventTypes::default()).with_venues(venues());
        let mut row = booking("Rehearsal", 2, 18, 20);
        row.date = NaiveDate::from_ymd_opt(2024, 2, 6);
        assert!(!builder.add_booking(row));
    }

    #[test]
    fn test_absence_end_is_exclusive() {
        let range = january();
        let mut builder = ScheduleBuilder::new(Los_Angeles, &range, EventTypes::default());
        assert!(builder.add_absence(AbsenceRow {
            start: date(10),
            end: Some(date(12)),
            description: Some("Bob away".to_string()),
        }));

        let schedule = builder.finish();
        let (key, event) = schedule.events.iter().next().unwrap();
        assert_eq!(key.start, Los_Angeles.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
        assert_eq!(key.end, Los_Angeles.with_ymd_and_hms(2024, 1, 13, 0, 0, 0).unwrap());
        assert!(key.is_all_day());
        assert_eq!(event.venue, "");
        assert_eq!(event.kind, EventType::Absence);
    }

    #[test]
    fn test_one_day_absence_and_reversed_absence() {
        let range = january();
        let mut builder = ScheduleBuilder::new(Los_Angeles, &range, EventTypes::default());
        assert!(builder.add_absence(AbsenceRow {
            start: date(20),
            end: None,
            description: Some("Ann away".to_string()),
        }));
        assert!(!builder.add_absence(AbsenceRow {
            start: date(25),
            end: Some(date(22)),
            description: Some("Backwards".to_string()),
        }));

        let schedule = builder.finish();
        let (key, _) = schedule.events.iter().next().unwrap();
        assert_eq!(key.duration(), Duration::days(1));
        assert_eq!(schedule.events.len(), 1);
    }

    #[test]
    fn test_absence_overlapping_range_start_is_kept() {
        let range = january();
        let mut builder = ScheduleBuilder::new(Los_Angeles, &range, EventTypes::default());
        assert!(builder.add_absence(AbsenceRow {
            start: NaiveDate::from_ymd_opt(2023, 12, 28).unwrap(),
            end: Some(date(2)),
            description: Some("Holiday".to_string()),
        }));
    }

    #[test]
    fn test_absence_ending_day_before_range_touches_it() {
        let range = january();
        let mut builder = ScheduleBuilder::new(Los_Angeles, &range, EventTypes::default());
        // Exclusive end is Jan 1 midnight, which is the range's first instant
        assert!(builder.add_absence(AbsenceRow {
            start: NaiveDate::from_ymd_opt(2023, 12, 30).unwrap(),
            end: Some(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()),
            description: Some("New Year's Eve".to_string()),
        }));
        assert!(!builder.add_absence(AbsenceRow {
            start: NaiveDate::from_ymd_opt(2023, 12, 20).unwrap(),
            end: Some(NaiveDate::from_ymd_opt(2023, 12, 22).unwrap()),
            description: Some("Before".to_string()),
        }));
    }
}
