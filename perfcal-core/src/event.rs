//! Schedule event types.
//!
//! Every loader, whatever its source format, produces these types. Times live
//! in the [`EventKey`], which is the sole identity of an event: two events are
//! the same event if and only if their start and end instants match.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// The kind of a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Rehearsal,
    Performance,
    Meeting,
    Absence,
    Other,
    Social,
}

impl EventType {
    /// Label used in workbook cells and in the `EVENT_TYPE:` description line.
    pub fn label(&self) -> &'static str {
        match self {
            EventType::Rehearsal => "Rehearsal",
            EventType::Performance => "Performance",
            EventType::Meeting => "Meeting",
            EventType::Absence => "absences",
            EventType::Other => "Other",
            EventType::Social => "Social Event",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Rehearsal" => Some(EventType::Rehearsal),
            "Performance" => Some(EventType::Performance),
            "Meeting" | "Board Meeting" | "BoardMeeting" | "board mtgs" => Some(EventType::Meeting),
            "absences" | "Absence" | "absence" => Some(EventType::Absence),
            "Other" => Some(EventType::Other),
            "Social Event" | "Social" => Some(EventType::Social),
            _ => None,
        }
    }

    pub fn is_absence(&self) -> bool {
        *self == EventType::Absence
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fields compared when the same key exists on both sides, in comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventField {
    Title,
    Venue,
    Uniform,
}

impl EventField {
    pub const COMPARED: [EventField; 3] = [EventField::Title, EventField::Venue, EventField::Uniform];
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventField::Title => write!(f, "title"),
            EventField::Venue => write!(f, "venue"),
            EventField::Uniform => write!(f, "uniform"),
        }
    }
}

/// Change status. Only the reconciliation engine assigns one; an event with
/// no status in a change set is an addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    /// Present on both sides; the field is the first one found to differ.
    Modified(EventField),
    Cancelled,
}

/// A scheduled event (times are carried by its [`EventKey`])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    /// Empty for events without a location, such as absences
    pub venue: String,
    pub kind: EventType,
    pub uniform: Option<String>,
    /// UID when the event was read from a calendar feed
    pub uid: Option<String>,
    pub status: Option<EventStatus>,
}

impl Event {
    pub fn new(title: impl Into<String>, venue: impl Into<String>, kind: EventType) -> Self {
        Event {
            title: title.into(),
            venue: venue.into(),
            kind,
            uniform: None,
            uid: None,
            status: None,
        }
    }

    /// Set the uniform tag. Blank values are stored as no uniform.
    pub fn with_uniform(mut self, uniform: Option<String>) -> Self {
        self.uniform = uniform
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        self
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn uniform_str(&self) -> &str {
        self.uniform.as_deref().unwrap_or("")
    }

    /// Value of a compared field, with a missing uniform read as empty.
    pub fn field(&self, field: EventField) -> &str {
        match field {
            EventField::Title => &self.title,
            EventField::Venue => &self.venue,
            EventField::Uniform => self.uniform_str(),
        }
    }

    /// Whether this event was entered by hand in the target calendar, judged
    /// by the suffix of its UID.
    pub fn is_protected(&self, uid_suffix: &str) -> bool {
        !uid_suffix.is_empty()
            && self
                .uid
                .as_deref()
                .is_some_and(|uid| uid.ends_with(uid_suffix))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Identity of an event: its start and end instants in the organization timezone.
///
/// Ordering is by start, then end.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl EventKey {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        EventKey { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end.clone() - self.start.clone()
    }

    /// Both endpoints fall at local midnight.
    pub fn is_all_day(&self) -> bool {
        self.start.time() == NaiveTime::MIN && self.end.time() == NaiveTime::MIN
    }

    /// Whether the interval touches `[from, to]`.
    pub fn intersects(&self, from: &DateTime<Tz>, to: &DateTime<Tz>) -> bool {
        !(self.end < *from || self.start > *to)
    }

    /// Strict overlap: intervals that merely touch do not overlap.
    pub fn overlaps(&self, other: &EventKey) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Attach `tz` to a wall-clock time. Times skipped by a DST transition yield `None`.
pub fn localize(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest()
}

/// Local midnight starting `date`.
pub fn local_midnight(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    localize(tz, date.and_time(NaiveTime::MIN))
}
