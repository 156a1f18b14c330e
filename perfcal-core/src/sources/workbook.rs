//! Singout workbook (.xlsx) loader.
//!
//! The workbook has a `venues` sheet plus four sheets per year:
//! `"<yyyy> Performances"`, `"<yyyy> Rehearsals"`, `"<yyyy> board mtgs"` and
//! `"<yyyy> absences"`. Row 1 of every sheet is a header.

use std::io::{Read, Seek};
use std::path::Path;

use calamine::{Data, DataType, Reader, Sheets, open_workbook_auto};
use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;
use log::{debug, info, warn};

use crate::date_range::DateRange;
use crate::error::{PerfcalError, PerfcalResult};
use crate::schedule::{AbsenceRow, BookingRow, EventTypes, Schedule, ScheduleBuilder};
use crate::venue::{Address, VenueTable};

const VENUES_SHEET: &str = "venues";
const EMPTY: Data = Data::Empty;

/// Per-year sheets, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Performances,
    Rehearsals,
    BoardMeetings,
    Absences,
}

impl SheetKind {
    pub const ALL: [SheetKind; 4] = [
        SheetKind::Performances,
        SheetKind::Rehearsals,
        SheetKind::BoardMeetings,
        SheetKind::Absences,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            SheetKind::Performances => "Performances",
            SheetKind::Rehearsals => "Rehearsals",
            SheetKind::BoardMeetings => "board mtgs",
            SheetKind::Absences => "absences",
        }
    }

    pub fn sheet_name(&self, year: i32) -> String {
        format!("{} {}", year, self.suffix())
    }

    fn enabled(&self, types: &EventTypes) -> bool {
        match self {
            SheetKind::Performances => types.performances,
            SheetKind::Rehearsals => types.rehearsals,
            SheetKind::BoardMeetings => types.board,
            SheetKind::Absences => types.absences,
        }
    }

    /// Type label assumed for rows whose type cell is blank.
    fn default_label(&self) -> &'static str {
        match self {
            SheetKind::Performances => "Performance",
            SheetKind::Rehearsals => "Rehearsal",
            SheetKind::BoardMeetings => "Meeting",
            SheetKind::Absences => "absences",
        }
    }
}

/// Load every enabled sheet for the years `range` touches.
pub fn load_workbook(
    path: &Path,
    tz: Tz,
    range: &DateRange,
    types: EventTypes,
) -> PerfcalResult<Schedule> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| PerfcalError::Workbook(format!("{}: {}", path.display(), e)))?;

    let schedule = read_workbook(&mut workbook, tz, range, types)?;
    info!(
        "loaded {} events and {} venues from {}",
        schedule.events.len(),
        schedule.venues.len(),
        path.display()
    );
    Ok(schedule)
}

pub fn read_workbook<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    tz: Tz,
    range: &DateRange,
    types: EventTypes,
) -> PerfcalResult<Schedule> {
    let venues = workbook
        .worksheet_range(VENUES_SHEET)
        .map_err(|e| PerfcalError::Workbook(format!("sheet '{}': {}", VENUES_SHEET, e)))?;
    let venues = read_venues(venues.rows());

    let mut builder = ScheduleBuilder::new(tz, range, types).with_venues(venues);
    let sheets = sheets_to_read(range, types, &workbook.sheet_names());

    for (name, kind) in sheets {
        let sheet = workbook
            .worksheet_range(&name)
            .map_err(|e| PerfcalError::Workbook(format!("sheet '{}': {}", name, e)))?;

        let before = builder.event_count();
        match kind {
            SheetKind::Absences => read_absences(sheet.rows(), &mut builder),
            _ => read_bookings(sheet.rows(), kind, &mut builder),
        }
        debug!("{}: {} events", name, builder.event_count() - before);
    }

    Ok(builder.finish())
}

/// Sheets to read, year by year, for the enabled event types. Sheets the
/// workbook lacks are logged and left out.
pub fn sheets_to_read(
    range: &DateRange,
    types: EventTypes,
    available: &[String],
) -> Vec<(String, SheetKind)> {
    let mut sheets = Vec::new();
    for year in range.years() {
        for kind in SheetKind::ALL {
            if !kind.enabled(&types) {
                continue;
            }

            let name = kind.sheet_name(year);
            if !available.contains(&name) {
                warn!("no such sheet: {}", name);
                continue;
            }
            sheets.push((name, kind));
        }
    }
    sheets
}

/// Venue rows are (name, street, city line). A blank name ends the table.
pub fn read_venues<'r>(rows: impl Iterator<Item = &'r [Data]>) -> VenueTable {
    let mut venues = VenueTable::new();
    for row in rows.skip(1) {
        let Some(name) = cell_text(cell(row, 0)) else {
            break;
        };
        let street = cell_text(cell(row, 1)).unwrap_or_default();
        venues.insert(name, Address::new(street, cell_text(cell(row, 2))));
    }
    venues
}

/// Timed rows are (title, venue, date, start, end, uniform, type). A blank
/// date ends the sheet.
pub fn read_bookings<'r>(
    rows: impl Iterator<Item = &'r [Data]>,
    kind: SheetKind,
    builder: &mut ScheduleBuilder<'_>,
) {
    for row in rows.skip(1) {
        let date_cell = cell(row, 2);
        if date_cell.is_empty() {
            break;
        }

        let Some(date) = cell_date(date_cell) else {
            warn!("unreadable date '{}' in {} sheet", date_cell, kind.suffix());
            continue;
        };

        builder.add_booking(BookingRow {
            title: cell_text(cell(row, 0)),
            venue: cell_text(cell(row, 1)),
            date: Some(date),
            start: cell_time(cell(row, 3)),
            end: cell_time(cell(row, 4)),
            uniform: cell_text(cell(row, 5)),
            kind: cell_text(cell(row, 6)).or_else(|| Some(kind.default_label().to_string())),
        });
    }
}

/// Absence rows are (first day, last day, description). A blank first day
/// ends the sheet.
pub fn read_absences<'r>(rows: impl Iterator<Item = &'r [Data]>, builder: &mut ScheduleBuilder<'_>) {
    for row in rows.skip(1) {
        let start_cell = cell(row, 0);
        if start_cell.is_empty() {
            break;
        }

        let Some(start) = cell_date(start_cell) else {
            warn!("unreadable absence date '{}'", start_cell);
            continue;
        };

        builder.add_absence(AbsenceRow {
            start,
            end: cell_date(cell(row, 1)),
            description: cell_text(cell(row, 2)),
        });
    }
}

fn cell(row: &[Data], index: usize) -> &Data {
    row.get(index).unwrap_or(&EMPTY)
}

fn cell_text(data: &Data) -> Option<String> {
    let text = match data {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Excel stores dates as days since 1899-12-30.
fn serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::try_days(serial.floor() as i64)?)
}

fn serial_time(serial: f64) -> Option<NaiveTime> {
    if !serial.is_finite() {
        return None;
    }
    let seconds = (serial.fract() * 86_400.0).round() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds % 86_400, 0)
}

fn cell_date(data: &Data) -> Option<NaiveDate> {
    match data {
        Data::Float(f) => serial_date(*f),
        Data::Int(i) => serial_date(*i as f64),
        Data::String(s) => parse_date_text(s),
        other => other.as_datetime().map(|dt| dt.date()),
    }
}

fn cell_time(data: &Data) -> Option<NaiveTime> {
    let time = match data {
        Data::Empty => None,
        Data::Float(f) => serial_time(*f),
        Data::String(s) => parse_time_text(s),
        other => other.as_datetime().map(|dt| dt.time()),
    }?;
    // Minute precision, as in the sheets
    time.with_second(0)
}

/// Dates typed as text rather than entered as dates.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date_part = text.split_whitespace().next().unwrap_or(text);
    // Two-digit years first: %Y would read "24" as the year 24
    ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

fn parse_time_text(text: &str) -> Option<NaiveTime> {
    let text = text.trim().to_ascii_uppercase();
    ["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M%p", "%I %p"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&text, format).ok())
}
