//! Tabular (.csv) export for the website event importer.
//!
//! The importer has no notion of cancellations or absences, so this is a
//! flat dump of the changed events rather than a diff: absences are left out
//! and every other event becomes one row.

use std::io;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::warn;
use serde::Serialize;

use crate::error::{PerfcalError, PerfcalResult};
use crate::reconcile::ChangeSet;
use crate::venue::VenueTable;

const COUNTRY: &str = "United States";
const NO_UNIFORM: &str = "- none -";

/// One importer row. Field order and names match the importer's header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    #[serde(rename = "Event name")]
    pub event_name: String,
    #[serde(rename = "Date start")]
    pub date_start: String,
    #[serde(rename = "Date end")]
    pub date_end: String,
    #[serde(rename = "Event type")]
    pub event_type: String,
    #[serde(rename = "Location name")]
    pub location_name: String,
    #[serde(rename = "Street")]
    pub street: String,
    pub additional: String,
    pub city: String,
    #[serde(rename = "Province")]
    pub province: String,
    pub country: String,
    #[serde(rename = "Postal code")]
    pub postal_code: String,
    pub notes: String,
    pub internal_notes: String,
}

/// City, state and zip pulled out of an address's second line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostalParts {
    pub city: String,
    pub province: String,
    pub postal_code: String,
}

impl PostalParts {
    /// Best-effort split of a "City, ST 98101" style line.
    pub fn parse(line: &str) -> Self {
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();

        let (city, state, postal_code) = if parts.len() >= 3 {
            (parts[0].to_string(), parts[1].to_string(), parts[2].to_string())
        } else if parts.len() == 2 {
            match split_state_zip(parts[1]) {
                Some((state, zip)) => (parts[0].to_string(), state, zip),
                None => (parts[0].to_string(), parts[1].to_string(), String::new()),
            }
        } else {
            // No commas: look for trailing "ST 98101" tokens
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let n = tokens.len();
            if n >= 3 && is_state_code(tokens[n - 2]) && is_postal_code(tokens[n - 1]) {
                (
                    tokens[..n - 2].join(" "),
                    tokens[n - 2].to_string(),
                    tokens[n - 1].to_string(),
                )
            } else {
                (line.trim().to_string(), String::new(), String::new())
            }
        };

        PostalParts {
            city,
            province: expand_state(&state),
            postal_code,
        }
    }
}

/// "WA 98101" into ("WA", "98101"). Short values are a bare state.
fn split_state_zip(value: &str) -> Option<(String, String)> {
    if value.len() <= 5 {
        return None;
    }
    let (state, zip) = value.rsplit_once(char::is_whitespace)?;
    Some((state.trim().to_string(), zip.trim().to_string()))
}

fn is_state_code(token: &str) -> bool {
    token.len() == 2 && token.chars().all(|c| c.is_ascii_uppercase())
}

fn is_postal_code(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit() || c == '-')
}

fn expand_state(state: &str) -> String {
    match state {
        "WA" => "Washington".to_string(),
        s if !s.is_empty() && s.len() < 4 => {
            warn!("state abbreviation '{}' is not expanded (only WA is known)", s);
            s.to_string()
        }
        s => s.to_string(),
    }
}

/// "Jan 3 2024 - 2:00am", in UTC.
fn format_instant(instant: &DateTime<Tz>) -> String {
    instant
        .with_timezone(&Utc)
        .format("%b %-d %Y - %-I:%M%P")
        .to_string()
}

/// Rows for every non-absence change, in key order.
pub fn table_rows(changes: &ChangeSet, venues: &VenueTable) -> Vec<TableRow> {
    changes
        .iter()
        .filter(|(_, event)| !event.kind.is_absence())
        .map(|(key, event)| {
            let address = if event.venue.is_empty() {
                None
            } else {
                let address = venues.get(&event.venue);
                if address.is_none() {
                    warn!("no address for venue '{}' ('{}')", event.venue, event.title);
                }
                address
            };

            let street = address.map(|a| a.street.clone()).unwrap_or_default();
            let postal = address
                .and_then(|a| a.locality.as_deref())
                .map(PostalParts::parse)
                .unwrap_or_default();

            TableRow {
                event_name: event.title.clone(),
                date_start: format_instant(&key.start),
                date_end: format_instant(&key.end),
                event_type: event.kind.label().to_string(),
                location_name: event.venue.clone(),
                street,
                additional: String::new(),
                city: postal.city,
                province: postal.province,
                country: COUNTRY.to_string(),
                postal_code: postal.postal_code,
                notes: format!(
                    "UNIFORM:{}",
                    event.uniform.as_deref().unwrap_or(NO_UNIFORM)
                ),
                internal_notes: String::new(),
            }
        })
        .collect()
}

/// Write rows with a header line. Returns the number of rows written.
pub fn write_table<W: io::Write>(rows: &[TableRow], writer: W) -> PerfcalResult<usize> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    for row in rows {
        csv.serialize(row)
            .map_err(|e| PerfcalError::Output(e.to_string()))?;
    }
    csv.flush()?;

    Ok(rows.len())
}
