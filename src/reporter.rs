use owo_colors::OwoColorize;
use perfcal_core::{ChangeReporter, Event, EventField, EventKey};

use crate::render::TIME_FORMAT;

/// Collects the details the change listing does not show: which field
/// changed, and which manually added events were left alone.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    lines: Vec<String>,
}

impl ConsoleReporter {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl ChangeReporter for ConsoleReporter {
    fn modified(&mut self, key: &EventKey, field: EventField, old: &Event, new: &Event) {
        self.lines.push(format!(
            "{} {} changed from '{}' to '{}' on event at {}",
            "~".yellow(),
            field,
            old.field(field),
            new.field(field),
            key.start.format(TIME_FORMAT)
        ));
    }

    fn protected(&mut self, key: &EventKey, event: &Event) {
        self.lines.push(format!(
            "{} keeping manually added event '{}' at {}",
            "!".cyan(),
            event.title,
            key.start.format(TIME_FORMAT)
        ));
    }
}
