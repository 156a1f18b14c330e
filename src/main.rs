mod commands;
mod render;
mod reporter;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{Context, Format, Source, SourceArgs};

#[derive(Parser)]
#[command(name = "perfcal")]
#[command(about = "Reconcile the singout workbook with the published calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two schedules and write what changed
    Diff {
        /// Schedule that is up to date
        #[arg(long, value_enum)]
        current: Source,

        /// Schedule to bring up to date; also picks the output format
        #[arg(long, value_enum)]
        against: Source,

        /// Output file (.ics or .csv). Defaults to a name derived from --months
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Write every event in a schedule as additions
    Export {
        #[arg(long, value_enum)]
        current: Source,

        #[arg(short, long, value_enum)]
        format: Format,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// List the events in a schedule by month
    List {
        #[arg(long, value_enum)]
        current: Source,

        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Diff {
            current,
            against,
            output,
            source,
        } => {
            let ctx = Context::new(&source)?;
            commands::diff::run(&ctx, current, against, output.as_deref())
        }
        Commands::Export {
            current,
            format,
            output,
            source,
        } => {
            let ctx = Context::new(&source)?;
            commands::export::run(&ctx, current, format, output.as_deref())
        }
        Commands::List { current, source } => {
            let ctx = Context::new(&source)?;
            commands::list::run(&ctx, current)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_diff_with_short_flags() {
        let cli = Cli::try_parse_from([
            "perfcal", "diff", "--current", "workbook", "--against", "feed", "-m", "2024:3-5", "-a",
            "-s", "tuners2024_", "-s", "tunersboardabs2024_",
        ])
        .unwrap();

        let Commands::Diff {
            current,
            against,
            output,
            source,
        } = cli.command
        else {
            panic!("Expected diff command");
        };
        assert_eq!(current, Source::Workbook);
        assert_eq!(against, Source::Feed);
        assert!(output.is_none());
        assert_eq!(source.months.as_deref(), Some("2024:3-5"));
        assert!(source.no_absences);
        assert!(!source.no_board);
        assert_eq!(source.calendars, vec!["tuners2024_", "tunersboardabs2024_"]);
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "perfcal", "export", "--current", "feed", "--format", "csv", "-i", "old.zip",
        ])
        .unwrap();

        let Commands::Export {
            format, source, ..
        } = cli.command
        else {
            panic!("Expected export command");
        };
        assert_eq!(format, Format::Csv);
        assert_eq!(source.feed, Some(PathBuf::from("old.zip")));
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        assert!(Cli::try_parse_from(["perfcal", "list", "--current", "pdf"]).is_err());
    }
}
