//! Calendar feed loader: a single `.ics` file or a `.zip` export holding one
//! feed per calendar and year.

use std::fs::{self, File};
use std::io::{Read, Seek};
use std::path::Path;

use chrono::{DateTime, Duration, NaiveTime, TimeZone};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};
use log::{debug, info, warn};
use zip::ZipArchive;

use crate::date_range::DateRange;
use crate::error::{PerfcalError, PerfcalResult};
use crate::event::{Event, EventKey, EventType, local_midnight, localize};
use crate::schedule::{EventTypes, Schedule, ScheduleBuilder};
use crate::venue::Address;

const UNIFORM_TAG: &str = "UNIFORM:";
const EVENT_TYPE_TAG: &str = "EVENT_TYPE:";

/// Which members of a bundle to read.
#[derive(Debug, Clone, Copy)]
pub struct FeedOptions<'a> {
    /// Member name prefixes given on the command line. Empty means the defaults.
    pub calendars: &'a [String],
    pub feed_prefix: &'a str,
    pub absence_feed_prefix: &'a str,
}

/// A loaded feed plus how many events each calendar contributed.
#[derive(Debug, Clone, Default)]
pub struct FeedLoad {
    pub schedule: Schedule,
    pub counts: Vec<(String, usize)>,
}

pub fn load_feed(
    path: &Path,
    tz: Tz,
    range: &DateRange,
    types: EventTypes,
    options: &FeedOptions<'_>,
) -> PerfcalResult<FeedLoad> {
    let mut builder = ScheduleBuilder::new(tz, range, types);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let counts = match extension.as_deref() {
        Some("ics") => {
            let content = fs::read_to_string(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let count = read_feed(&name, &content, &mut builder)?;
            vec![(name, count)]
        }
        Some("zip") => {
            let prefixes = member_prefixes(options, range, types);
            read_bundle(File::open(path)?, &prefixes, &mut builder)?
        }
        _ => {
            return Err(PerfcalError::UnsupportedFormat(format!(
                "{} (expected .ics or .zip)",
                path.display()
            )));
        }
    };

    for (name, count) in &counts {
        info!("{}: {} events", name, count);
    }

    Ok(FeedLoad {
        schedule: builder.finish(),
        counts,
    })
}

/// Explicit calendar names, or `<prefix><yyyy>_` for each year in range.
pub fn member_prefixes(options: &FeedOptions<'_>, range: &DateRange, types: EventTypes) -> Vec<String> {
    if !options.calendars.is_empty() {
        return options.calendars.to_vec();
    }

    let mut prefixes = Vec::new();
    for year in range.years() {
        prefixes.push(format!("{}{}_", options.feed_prefix, year));
        if types.absences {
            prefixes.push(format!("{}{}_", options.absence_feed_prefix, year));
        }
    }
    prefixes
}

/// Read the first member matching each prefix. Returns per-prefix counts.
pub fn read_bundle<R: Read + Seek>(
    reader: R,
    prefixes: &[String],
    builder: &mut ScheduleBuilder<'_>,
) -> PerfcalResult<Vec<(String, usize)>> {
    let mut archive = ZipArchive::new(reader).map_err(|e| PerfcalError::Archive(e.to_string()))?;
    let members: Vec<String> = archive.file_names().map(str::to_string).collect();

    let mut counts = Vec::new();
    for prefix in prefixes {
        let Some(member) = members.iter().find(|m| m.starts_with(prefix.as_str())) else {
            warn!("no such calendar: {}", prefix);
            continue;
        };

        let mut content = String::new();
        archive
            .by_name(member)
            .map_err(|e| PerfcalError::Archive(format!("{}: {}", member, e)))?
            .read_to_string(&mut content)?;

        debug!("reading {} for {}", member, prefix);
        let count = read_feed(prefix, &content, builder)?;
        counts.push((prefix.clone(), count));
    }

    Ok(counts)
}

/// Add every VEVENT in `content`. `name` containing "abs" marks an absences
/// calendar, whose timed entries are widened to whole days.
pub fn read_feed(name: &str, content: &str, builder: &mut ScheduleBuilder<'_>) -> PerfcalResult<usize> {
    let absences = name.contains("abs");
    let tz = builder.tz();

    // unfold() works on CRLF; exports from some tools use bare LF
    let normalized = content.replace("\r\n", "\n").replace('\n', "\r\n");
    let unfolded = unfold(&normalized);
    let calendar =
        read_calendar(&unfolded).map_err(|e| PerfcalError::FeedParse(format!("{}: {}", name, e)))?;

    let mut count = 0;
    for vevent in calendar.components.iter().filter(|c| c.name == "VEVENT") {
        let Some((key, event, address)) = parse_vevent(vevent, &tz, absences) else {
            continue;
        };

        if let Some(address) = address {
            builder.venues_mut().insert(event.venue.clone(), address);
        }

        if builder.add_feed_event(key, event) {
            count += 1;
        }
    }

    Ok(count)
}

fn parse_vevent(vevent: &Component, tz: &Tz, absences: bool) -> Option<(EventKey, Event, Option<Address>)> {
    let title = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(p.val.as_ref()))
        .unwrap_or_else(|| "(No title)".to_string());

    let Some(start) = vevent
        .find_prop("DTSTART")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
    else {
        warn!("'{}' has no usable DTSTART, skipping", title);
        return None;
    };
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok());

    let Some(mut start_at) = to_local(&start, tz) else {
        warn!("'{}' starts at a time that does not exist locally, skipping", title);
        return None;
    };
    let mut end_at = match &end {
        Some(end) => to_local(end, tz),
        // No DTEND: one day for a date, zero length for a date-time
        None => match &start {
            DatePerhapsTime::Date(d) => local_midnight(tz, *d + Duration::days(1)),
            DatePerhapsTime::DateTime(_) => Some(start_at),
        },
    }?;

    if absences {
        if matches!(start, DatePerhapsTime::DateTime(_)) && start_at.time() != NaiveTime::MIN {
            debug!("snapping '{}' start {} to midnight", title, start_at);
            start_at = local_midnight(tz, start_at.date_naive())?;
        }
        if matches!(end, Some(DatePerhapsTime::DateTime(_))) && end_at.time() != NaiveTime::MIN {
            debug!("bumping '{}' end {} to the next midnight", title, end_at);
            end_at = local_midnight(tz, end_at.date_naive() + Duration::days(1))?;
        }
    }

    let mut uniform = None;
    let mut type_label = None;
    if let Some(description) = vevent.find_prop("DESCRIPTION") {
        for line in unescape_text(description.val.as_ref()).lines() {
            if let Some(value) = line.strip_prefix(UNIFORM_TAG) {
                uniform = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix(EVENT_TYPE_TAG) {
                type_label = Some(value.trim().to_string());
            }
        }
    }

    let kind = match type_label.as_deref().filter(|l| !l.is_empty()) {
        Some(label) => EventType::from_label(label).unwrap_or_else(|| {
            warn!("unknown event type '{}' on '{}', treating it as Other", label, title);
            EventType::Other
        }),
        None if absences => EventType::Absence,
        None => EventType::Other,
    };

    let (venue, address) = match vevent.find_prop("LOCATION") {
        Some(location) => split_location(&unescape_text(location.val.as_ref())),
        None => (String::new(), None),
    };

    let mut event = Event::new(title, venue, kind).with_uniform(uniform);
    if let Some(uid) = vevent.find_prop("UID") {
        event = event.with_uid(uid.val.to_string());
    }

    Some((EventKey::new(start_at, end_at), event, address))
}

/// Date values become local midnight; date-times are converted into `tz`.
fn to_local(value: &DatePerhapsTime, tz: &Tz) -> Option<DateTime<Tz>> {
    match value {
        DatePerhapsTime::Date(d) => local_midnight(tz, *d),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(dt.with_timezone(tz)),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => localize(tz, *naive),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            match tzid.parse::<Tz>() {
                Ok(source) => source
                    .from_local_datetime(date_time)
                    .earliest()
                    .map(|dt| dt.with_timezone(tz)),
                Err(_) => {
                    warn!("unknown TZID '{}', reading {} as local time", tzid, date_time);
                    localize(tz, *date_time)
                }
            }
        }
    }
}

/// First line is the venue; the rest, if any, is its address.
fn split_location(location: &str) -> (String, Option<Address>) {
    let mut lines = location.lines();
    let venue = lines.next().unwrap_or_default().trim().to_string();
    if venue.is_empty() {
        return (venue, None);
    }

    let rest: Vec<&str> = lines.map(str::trim).collect();
    let address = Address::new(
        rest.first().copied().unwrap_or_default(),
        rest.get(1).map(|l| l.to_string()),
    );
    (venue, Some(address))
}

/// Undo RFC 5545 TEXT escaping.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
