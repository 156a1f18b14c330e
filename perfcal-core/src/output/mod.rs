//! Serializers for a [`ChangeSet`].

pub mod feed;
pub mod table;

use std::fs;
use std::io::Write;
use std::path::Path;

use log::info;

use crate::error::{PerfcalError, PerfcalResult};
use crate::reconcile::ChangeSet;
use crate::venue::VenueTable;

pub use feed::{FeedDocument, FeedWriter};
pub use table::{PostalParts, TableRow, table_rows, write_table};

/// Output format, fixed when the output target is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Calendar feed (.ics)
    Feed,
    /// Importer table (.csv)
    Table,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> PerfcalResult<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("ics") => Ok(OutputFormat::Feed),
            Some("csv") => Ok(OutputFormat::Table),
            _ => Err(PerfcalError::UnsupportedFormat(format!(
                "{} (expected .ics or .csv)",
                path.display()
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Feed => "ics",
            OutputFormat::Table => "csv",
        }
    }
}

/// Everything a serializer needs besides the changes themselves.
#[derive(Debug, Clone, Copy)]
pub struct OutputContext<'a> {
    pub venues: &'a VenueTable,
    pub prodid: &'a str,
    pub domain: &'a str,
}

/// Serialize `changes` into `writer`. Returns the number of records written,
/// which for a table excludes absences.
pub fn render<W: Write>(
    format: OutputFormat,
    changes: &ChangeSet,
    ctx: &OutputContext<'_>,
    mut writer: W,
) -> PerfcalResult<usize> {
    match format {
        OutputFormat::Feed => {
            let document = FeedWriter::new(ctx.venues, ctx.prodid, ctx.domain).document(changes);
            write!(writer, "{}", document)?;
            Ok(document.len())
        }
        OutputFormat::Table => write_table(&table_rows(changes, ctx.venues), writer),
    }
}

/// Write `changes` to `path`. Nothing is created when there is nothing to
/// write; the return value is the record count either way.
pub fn write_file(
    format: OutputFormat,
    changes: &ChangeSet,
    ctx: &OutputContext<'_>,
    path: &Path,
) -> PerfcalResult<usize> {
    let mut buffer = Vec::new();
    let count = render(format, changes, ctx, &mut buffer)?;

    if count == 0 {
        info!("no changes to write, {} not created", path.display());
        return Ok(0);
    }

    fs::write(path, buffer)?;
    info!("wrote {} events to {}", count, path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::EventCollection;
    use crate::event::{Event, EventKey, EventType};
    use crate::reconcile::reconcile;
    use crate::venue::Address;
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;
    use std::path::PathBuf;

    fn venues() -> VenueTable {
        let mut venues = VenueTable::new();
        venues.insert(
            "Hall",
            Address::new("100 Main St", Some("Seattle, WA 98101".to_string())),
        );
        venues
    }

    fn ctx(venues: &VenueTable) -> OutputContext<'_> {
        OutputContext {
            venues,
            prodid: "-//Test//EN",
            domain: "example.org",
        }
    }

    fn absence_only() -> ChangeSet {
        let current: EventCollection = vec![(
            EventKey::new(
                Los_Angeles.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
                Los_Angeles.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap(),
            ),
            Event::new("Bob away", "", EventType::Absence),
        )]
        .into_iter()
        .collect();
        reconcile(&current, None, "google.com")
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            OutputFormat::from_path(&PathBuf::from("out/events2024.ics")).unwrap(),
            OutputFormat::Feed
        );
        assert_eq!(
            OutputFormat::from_path(&PathBuf::from("events.CSV")).unwrap(),
            OutputFormat::Table
        );
        assert!(matches!(
            OutputFormat::from_path(&PathBuf::from("events.pdf")),
            Err(PerfcalError::UnsupportedFormat(_))
        ));
        assert!(OutputFormat::from_path(&PathBuf::from("events")).is_err());
    }

    #[test]
    fn test_empty_change_set_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ics");
        let venues = venues();

        let count = write_file(OutputFormat::Feed, &ChangeSet::default(), &ctx(&venues), &path).unwrap();
        assert_eq!(count, 0);
        assert!(!path.exists(), "No file should be written for zero events");
    }

    #[test]
    fn test_table_of_only_absences_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let venues = venues();

        let count = write_file(OutputFormat::Table, &absence_only(), &ctx(&venues), &path).unwrap();
        assert_eq!(count, 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_feed_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ics");
        let venues = venues();

        let count = write_file(OutputFormat::Feed, &absence_only(), &ctx(&venues), &path).unwrap();
        assert_eq!(count, 1);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("SUMMARY:Bob away"));
        assert!(written.contains("DTSTART;VALUE=DATE:20240110"));
    }
}
