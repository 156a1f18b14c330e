pub mod diff;
pub mod export;
pub mod list;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, ValueEnum};
use log::debug;
use perfcal_core::output::{OutputContext, OutputFormat};
use perfcal_core::schedule::{EventTypes, Schedule};
use perfcal_core::settings::{Settings, expand_path};
use perfcal_core::sources::{FeedOptions, load_feed, load_workbook};
use perfcal_core::{DateRange, VenueTable};

/// Where a schedule comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// The singout workbook (.xlsx)
    Workbook,
    /// A calendar export (.ics or .zip)
    Feed,
}

impl Source {
    /// Format written when this source is the one being updated.
    pub fn output_format(&self) -> OutputFormat {
        match self {
            Source::Feed => OutputFormat::Feed,
            Source::Workbook => OutputFormat::Table,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Workbook => write!(f, "workbook"),
            Source::Feed => write!(f, "feed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Ics,
    Csv,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Ics => OutputFormat::Feed,
            Format::Csv => OutputFormat::Table,
        }
    }
}

/// Options shared by every command.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Workbook path (overrides the config file)
    #[arg(short = 'e', long)]
    pub workbook: Option<PathBuf>,

    /// Calendar export path, .ics or .zip (overrides the config file)
    #[arg(short = 'i', long)]
    pub feed: Option<PathBuf>,

    /// Calendar name prefix to read from a .zip export (repeatable)
    #[arg(short = 's', long = "calendar")]
    pub calendars: Vec<String>,

    /// Months to load: 5, 3-6, 2024, 2024:3, 2024:3-6 or 2024:11-2025:2
    #[arg(short, long)]
    pub months: Option<String>,

    #[arg(short = 'a', long)]
    pub no_absences: bool,

    #[arg(short = 'b', long)]
    pub no_board: bool,

    #[arg(short = 'p', long)]
    pub no_performances: bool,

    #[arg(short = 'r', long)]
    pub no_rehearsals: bool,
}

impl SourceArgs {
    pub fn event_types(&self) -> EventTypes {
        EventTypes {
            absences: !self.no_absences,
            board: !self.no_board,
            performances: !self.no_performances,
            rehearsals: !self.no_rehearsals,
        }
    }
}

/// Settings merged with command-line overrides, validated before any
/// source is opened.
pub struct Context {
    pub settings: Settings,
    pub tz: Tz,
    pub range: DateRange,
    pub types: EventTypes,
    pub workbook: PathBuf,
    pub feed: PathBuf,
    pub calendars: Vec<String>,
}

impl Context {
    pub fn new(args: &SourceArgs) -> Result<Self> {
        let settings = Settings::load()?;
        let tz = settings.tz()?;
        let today = Utc::now().with_timezone(&tz).date_naive();
        Self::from_settings(settings, args, today)
    }

    pub fn from_settings(settings: Settings, args: &SourceArgs, today: NaiveDate) -> Result<Self> {
        let tz = settings.tz()?;

        let types = args.event_types();
        if !types.any() {
            bail!("All event types are disabled, nothing to load");
        }

        let range = DateRange::from_months(args.months.as_deref(), today, tz)?;
        debug!("loading {} through {}, {:?}", range.from, range.to, types);

        let workbook = expand_path(args.workbook.as_deref().unwrap_or(settings.workbook.as_path()));
        let feed = expand_path(args.feed.as_deref().unwrap_or(settings.feed.as_path()));

        Ok(Context {
            settings,
            tz,
            range,
            types,
            workbook,
            feed,
            calendars: args.calendars.clone(),
        })
    }

    pub fn source_path(&self, source: Source) -> &Path {
        match source {
            Source::Workbook => &self.workbook,
            Source::Feed => &self.feed,
        }
    }

    pub fn load(&self, source: Source) -> Result<Schedule> {
        let schedule = match source {
            Source::Workbook => load_workbook(&self.workbook, self.tz, &self.range, self.types)?,
            Source::Feed => {
                let options = FeedOptions {
                    calendars: &self.calendars,
                    feed_prefix: &self.settings.feed_prefix,
                    absence_feed_prefix: &self.settings.absence_feed_prefix,
                };
                load_feed(&self.feed, self.tz, &self.range, self.types, &options)?.schedule
            }
        };
        Ok(schedule)
    }

    /// Output path derived from the month range, in the working directory.
    pub fn default_output(&self, format: OutputFormat) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.range.output_stem(), format.extension()))
    }

    pub fn output_context<'a>(&'a self, venues: &'a VenueTable) -> OutputContext<'a> {
        OutputContext {
            venues,
            prodid: &self.settings.prodid,
            domain: &self.settings.domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SourceArgs {
        SourceArgs {
            workbook: None,
            feed: None,
            calendars: Vec::new(),
            months: Some("2024:3-5".to_string()),
            no_absences: false,
            no_board: false,
            no_performances: false,
            no_rehearsals: false,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    #[test]
    fn test_flags_override_settings() {
        let mut args = args();
        args.feed = Some(PathBuf::from("old.zip"));

        let ctx = Context::from_settings(Settings::default(), &args, today()).unwrap();
        assert_eq!(ctx.feed, PathBuf::from("old.zip"));
        assert_eq!(ctx.workbook, PathBuf::from("SingoutInfo.xlsx"));
        assert_eq!(ctx.default_output(OutputFormat::Feed), PathBuf::from("events20240305.ics"));
    }

    #[test]
    fn test_all_types_disabled_is_fatal() {
        let args = SourceArgs {
            no_absences: true,
            no_board: true,
            no_performances: true,
            no_rehearsals: true,
            ..args()
        };
        assert!(Context::from_settings(Settings::default(), &args, today()).is_err());
    }

    #[test]
    fn test_bad_month_range_is_fatal() {
        let args = SourceArgs {
            months: Some("13".to_string()),
            ..args()
        };
        assert!(Context::from_settings(Settings::default(), &args, today()).is_err());
    }

    #[test]
    fn test_output_format_follows_target_source() {
        assert_eq!(Source::Feed.output_format(), OutputFormat::Feed);
        assert_eq!(Source::Workbook.output_format(), OutputFormat::Table);
        assert_eq!(OutputFormat::from(Format::Csv), OutputFormat::Table);
    }
}
