//! Terminal rendering for perfcal-core types using owo_colors.

use chrono::{DateTime, Datelike, Duration};
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use perfcal_core::reconcile::ChangeCounts;
use perfcal_core::{ChangeSet, Event, EventCollection, EventKey, EventStatus};

/// Same layout as the change log messages.
pub const TIME_FORMAT: &str = "%b %d, %Y at %I:%M%p";

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

/// "2h", "1h 30m", "3d", "1d 2h".
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    let (days, hours, minutes) = (minutes / 1440, minutes % 1440 / 60, minutes % 60);

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{}m", minutes));
    }
    parts.join(" ")
}

fn render_change(key: &EventKey, event: &Event) -> String {
    let times = format!(
        "from {} to {} ({})",
        key.start.format(TIME_FORMAT),
        key.end.format(TIME_FORMAT),
        format_duration(key.duration())
    );

    let (symbol, title) = match event.status {
        None => ("+".green().to_string(), event.title.green().to_string()),
        Some(EventStatus::Modified(_)) => ("m".yellow().to_string(), event.title.yellow().to_string()),
        Some(EventStatus::Cancelled) => ("-".red().to_string(), event.title.red().to_string()),
    };

    format!("{} {} {}", symbol, title, times.dimmed())
}

impl Render for ChangeSet {
    fn render(&self) -> String {
        if self.is_empty() {
            return "No changes".dimmed().to_string();
        }

        self.iter()
            .map(|(key, event)| render_change(key, event))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Render for ChangeCounts {
    fn render(&self) -> String {
        format!(
            "{} added, {} modified, {} cancelled",
            self.added.green(),
            self.modified.yellow(),
            self.cancelled.red()
        )
    }
}

/// Wardrobe spelled out for the uniform codes used in the workbook.
fn uniform_description(uniform: &str) -> Option<String> {
    match uniform.trim() {
        "" | "- none -" => None,
        "singout" => Some("black shirt, blue tie".to_string()),
        "contest" => Some("black shirt, blue tie, blue vest".to_string()),
        other => Some(other.to_string()),
    }
}

fn listing_name(event: &Event) -> String {
    let mut name = if event.venue.is_empty() || event.title == event.venue {
        event.title.clone()
    } else {
        format!("{} at {}", event.title, event.venue)
    };

    if let Some(uniform) = event.uniform.as_deref().and_then(uniform_description) {
        name = format!("{}, UNIFORM: {}", name, uniform);
    }
    name
}

fn listing_times(start: &DateTime<Tz>, end: &DateTime<Tz>) -> String {
    if start.date_naive() == end.date_naive() {
        format!("{} - {}", start.format("%d (%a), %I:%M %p"), end.format("%I:%M %p"))
    } else {
        format!("{} - {}", start.format("%d (%a) %I:%M %p"), end.format("%d (%a) %I:%M %p"))
    }
}

/// Events grouped under month headings.
impl Render for EventCollection {
    fn render(&self) -> String {
        let mut lines = Vec::new();
        let mut month = None;

        for (key, event) in self {
            let this_month = (key.start.year(), key.start.month());
            if month != Some(this_month) {
                month = Some(this_month);
                if !lines.is_empty() {
                    lines.push(String::new());
                }
                lines.push(key.start.format("%B %Y").bold().to_string());
            }

            if event.kind.is_absence() {
                // Stored end is the midnight after the last day
                let last_day = key.end - Duration::seconds(1);
                lines.push(format!("  {}", event.title));
                lines.push(format!(
                    "    {} - {}",
                    key.start.format("%d (%a)"),
                    last_day.format("%d (%a)")
                ));
            } else {
                lines.push(format!("  {}", listing_times(&key.start, &key.end).dimmed()));
                lines.push(format!("    {}", listing_name(event)));
            }
        }

        if lines.is_empty() {
            return "No events".dimmed().to_string();
        }
        lines.join("\n")
    }
}
