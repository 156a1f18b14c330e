//! Calendar feed (.ics) generation.
//!
//! Built with the icalendar crate. The import target rejects CRLF, so the
//! rendered document is rewritten with bare `\n` line endings.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property, ValueType};
use uuid::Uuid;

use crate::event::{EventKey, EventStatus};
use crate::reconcile::ChangeSet;
use crate::venue::VenueTable;

/// Builds a [`FeedDocument`] from a change set.
pub struct FeedWriter<'a> {
    venues: &'a VenueTable,
    prodid: &'a str,
    domain: &'a str,
    stamp: DateTime<Utc>,
}

impl<'a> FeedWriter<'a> {
    /// `domain` namespaces the UIDs generated for events that have none.
    pub fn new(venues: &'a VenueTable, prodid: &'a str, domain: &'a str) -> Self {
        FeedWriter {
            venues,
            prodid,
            domain,
            stamp: Utc::now(),
        }
    }

    /// Override the DTSTAMP shared by every event in the batch.
    pub fn with_stamp(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamp = stamp;
        self
    }

    pub fn document(&self, changes: &ChangeSet) -> FeedDocument {
        let mut calendar = Calendar::new();
        let dtstamp = self.stamp.format("%Y%m%dT%H%M%SZ").to_string();

        for (key, event) in changes.iter() {
            let mut ics_event = icalendar::Event::new();

            // Events without a UID get a fresh one, so a modified workbook
            // event reaches the importer as a new entry
            let uid = event
                .uid
                .clone()
                .unwrap_or_else(|| format!("{}@{}", Uuid::new_v4(), self.domain));
            ics_event.uid(&uid);
            ics_event.summary(&event.title);
            ics_event.add_property("DTSTAMP", &dtstamp);
            add_time_properties(&mut ics_event, key);

            match event.status {
                Some(EventStatus::Cancelled) => {
                    ics_event.add_property("STATUS", "CANCELLED");
                }
                Some(EventStatus::Modified(_)) => {
                    ics_event.add_property("STATUS", "CONFIRMED");
                }
                None => {}
            }

            if let Some(address) = self.venues.get(&event.venue) {
                ics_event.location(&address.location_for(&event.venue));
            }

            let mut description = Vec::new();
            if let Some(uniform) = &event.uniform {
                description.push(format!("UNIFORM:{}", uniform));
            }
            description.push(format!("EVENT_TYPE:{}", event.kind.label()));
            ics_event.description(&description.join("\n"));

            calendar.push(ics_event.done());
        }

        FeedDocument {
            calendar: calendar.done(),
            prodid: self.prodid.to_string(),
            len: changes.len(),
        }
    }
}

/// DTSTART and DTEND, degraded to dates when the key spans whole days.
fn add_time_properties(ics_event: &mut icalendar::Event, key: &EventKey) {
    if key.is_all_day() {
        for (name, time) in [("DTSTART", &key.start), ("DTEND", &key.end)] {
            let mut prop = Property::new(name, time.date_naive().format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
        }
    } else {
        for (name, time) in [("DTSTART", &key.start), ("DTEND", &key.end)] {
            ics_event.append_property(zoned_property(name, time));
        }
    }
}

fn zoned_property(name: &str, time: &DateTime<Tz>) -> Property {
    let mut prop = Property::new(name, time.format("%Y%m%dT%H%M%S").to_string());
    prop.add_parameter("TZID", time.timezone().name());
    prop
}

/// A VCALENDAR holding one VEVENT per change.
#[derive(Debug, Clone)]
pub struct FeedDocument {
    calendar: Calendar,
    prodid: String,
    len: usize,
}

impl FeedDocument {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for FeedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The crate writes its own PRODID and a default CALSCALE
        for line in self.calendar.to_string().lines() {
            if line.starts_with("PRODID:") {
                writeln!(f, "PRODID:{}", self.prodid)?;
                continue;
            }
            if line == "CALSCALE:GREGORIAN" {
                continue;
            }
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::EventCollection;
    use crate::event::{Event, EventField, EventType};
    use crate::reconcile::reconcile;
    use crate::venue::Address;
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn venues() -> VenueTable {
        let mut venues = VenueTable::new();
        venues.insert(
            "Hall",
            Address::new("100 Main St", Some("Seattle, WA 98101".to_string())),
        );
        venues
    }

    fn evening() -> EventKey {
        EventKey::new(
            Los_Angeles.with_ymd_and_hms(2024, 1, 2, 18, 0, 0).unwrap(),
            Los_Angeles.with_ymd_and_hms(2024, 1, 2, 20, 0, 0).unwrap(),
        )
    }

    fn render(changes: &ChangeSet) -> String {
        let venues = venues();
        FeedWriter::new(&venues, "-//Test//EN", "example.org")
            .with_stamp(stamp())
            .document(changes)
            .to_string()
    }

    #[test]
    fn test_added_event_has_no_status_and_generated_uid() {
        let current: EventCollection = vec![(
            evening(),
            Event::new("Rehearsal", "Hall", EventType::Rehearsal),
        )]
        .into_iter()
        .collect();
        let ics = render(&reconcile(&current, None, "google.com"));

        assert!(!ics.contains("STATUS:"), "Added events carry no status. ICS:\n{}", ics);
        assert!(ics.contains("DTSTART;TZID=America/Los_Angeles:20240102T180000"));
        assert!(ics.contains("DTEND;TZID=America/Los_Angeles:20240102T200000"));
        assert!(ics.contains("DTSTAMP:20240101T120000Z"));
        let uid_line = ics.lines().find(|l| l.starts_with("UID:")).unwrap();
        assert!(uid_line.ends_with("@example.org"), "Got: {}", uid_line);
        assert!(ics.contains("LOCATION:Hall\\n100 Main St\\nSeattle\\, WA 98101"));
        assert!(ics.contains("DESCRIPTION:EVENT_TYPE:Rehearsal"));
    }

    #[test]
    fn test_status_mapping_and_uid_preserved() {
        let current: EventCollection = vec![(
            evening(),
            Event::new("Rehearsal", "Hall", EventType::Rehearsal).with_uid("keep-me@example.org"),
        )]
        .into_iter()
        .collect();
        let old: EventCollection = vec![
            (
                evening(),
                Event::new("Practice", "Hall", EventType::Rehearsal).with_uid("keep-me@example.org"),
            ),
            (
                EventKey::new(
                    Los_Angeles.with_ymd_and_hms(2024, 1, 9, 18, 0, 0).unwrap(),
                    Los_Angeles.with_ymd_and_hms(2024, 1, 9, 20, 0, 0).unwrap(),
                ),
                Event::new("Rehearsal", "Hall", EventType::Rehearsal).with_uid("gone@example.org"),
            ),
        ]
        .into_iter()
        .collect();

        let changes = reconcile(&current, Some(&old), "google.com");
        assert_eq!(
            changes.get(&evening()).unwrap().status,
            Some(EventStatus::Modified(EventField::Title))
        );

        let ics = render(&changes);
        let blocks: Vec<&str> = ics.split("BEGIN:VEVENT").skip(1).collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("STATUS:CONFIRMED"));
        assert!(blocks[0].contains("UID:keep-me@example.org"));
        assert!(blocks[1].contains("STATUS:CANCELLED"));
        assert!(blocks[1].contains("UID:gone@example.org"));
    }

    #[test]
    fn test_modified_event_without_uid_gets_fresh_one() {
        let current: EventCollection = vec![(
            evening(),
            Event::new("Rehearsal", "Hall", EventType::Rehearsal),
        )]
        .into_iter()
        .collect();
        let old: EventCollection = vec![(
            evening(),
            Event::new("Rehearsal", "Church", EventType::Rehearsal).with_uid("old@example.org"),
        )]
        .into_iter()
        .collect();
        let ics = render(&reconcile(&current, Some(&old), "google.com"));

        assert!(ics.contains("STATUS:CONFIRMED"));
        assert!(!ics.contains("old@example.org"), "ICS:\n{}", ics);
        let uid_line = ics.lines().find(|l| l.starts_with("UID:")).unwrap();
        assert!(uid_line.ends_with("@example.org"), "Got: {}", uid_line);
    }

    #[test]
    fn test_all_day_event_uses_dates() {
        let key = EventKey::new(
            Los_Angeles.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap(),
            Los_Angeles.with_ymd_and_hms(2024, 3, 12, 0, 0, 0).unwrap(),
        );
        let current: EventCollection = vec![(key, Event::new("Bob away", "", EventType::Absence))]
            .into_iter()
            .collect();
        let ics = render(&reconcile(&current, None, "google.com"));

        assert!(ics.contains("DTSTART;VALUE=DATE:20240310"), "ICS:\n{}", ics);
        assert!(ics.contains("DTEND;VALUE=DATE:20240312"), "ICS:\n{}", ics);
        assert!(!ics.contains("LOCATION"), "Absences have no location");
    }

    #[test]
    fn test_uniform_and_type_are_encoded_in_description() {
        let current: EventCollection = vec![(
            evening(),
            Event::new("Singout", "Hall", EventType::Performance).with_uniform(Some("singout".into())),
        )]
        .into_iter()
        .collect();
        let ics = render(&reconcile(&current, None, "google.com"));

        assert!(
            ics.contains("DESCRIPTION:UNIFORM:singout\\nEVENT_TYPE:Performance"),
            "ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_lines_end_with_bare_newline() {
        let current: EventCollection = vec![(
            evening(),
            Event::new("Rehearsal", "Hall", EventType::Rehearsal),
        )]
        .into_iter()
        .collect();
        let ics = render(&reconcile(&current, None, "google.com"));

        assert!(!ics.contains('\r'), "ICS:\n{:?}", ics);
        assert!(ics.starts_with("BEGIN:VCALENDAR\n"));
        assert!(ics.ends_with("END:VCALENDAR\n"));
        assert!(ics.lines().any(|l| l == "PRODID:-//Test//EN"));
        assert!(ics.lines().any(|l| l == "VERSION:2.0"));
        assert!(!ics.contains("CALSCALE"));
        assert_eq!(ics.lines().filter(|l| l.starts_with("PRODID")).count(), 1);
    }

    #[test]
    fn test_long_summary_is_folded_and_survives() {
        let title = "Spring singout with the visiting quartet and guest director ".repeat(3);
        let current: EventCollection = vec![(
            evening(),
            Event::new(title.trim(), "Hall", EventType::Performance),
        )]
        .into_iter()
        .collect();
        let ics = render(&reconcile(&current, None, "google.com"));

        assert!(ics.contains("\n "), "Long lines are folded. ICS:\n{}", ics);
        let unfolded = ics.replace("\n ", "");
        assert!(
            unfolded.lines().any(|l| l == format!("SUMMARY:{}", title.trim())),
            "ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_empty_change_set_has_no_events() {
        let venues = venues();
        let document = FeedWriter::new(&venues, "-//Test//EN", "example.org")
            .document(&ChangeSet::default());
        assert!(document.is_empty());
    }
}
