use log::debug;

use crate::event::{Event, EventField, EventKey};

/// Receives each classification as the engine makes it.
///
/// All methods default to doing nothing, so a reporter only implements the
/// notifications it cares about.
pub trait ChangeReporter {
    fn added(&mut self, _key: &EventKey, _event: &Event) {}

    /// `old` and `new` are the two sides; `field` is the first that differs.
    fn modified(&mut self, _key: &EventKey, _field: EventField, _old: &Event, _new: &Event) {}

    fn cancelled(&mut self, _key: &EventKey, _event: &Event) {}

    /// An old-side event missing from the current side that will not be cancelled.
    fn protected(&mut self, _key: &EventKey, _event: &Event) {}
}

impl<R: ChangeReporter + ?Sized> ChangeReporter for &mut R {
    fn added(&mut self, key: &EventKey, event: &Event) {
        (**self).added(key, event)
    }

    fn modified(&mut self, key: &EventKey, field: EventField, old: &Event, new: &Event) {
        (**self).modified(key, field, old, new)
    }

    fn cancelled(&mut self, key: &EventKey, event: &Event) {
        (**self).cancelled(key, event)
    }

    fn protected(&mut self, key: &EventKey, event: &Event) {
        (**self).protected(key, event)
    }
}

/// Reports changes at debug level through `log`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ChangeReporter for LogReporter {
    fn added(&mut self, key: &EventKey, event: &Event) {
        debug!("new event: '{}' {}", event.title, key);
    }

    fn modified(&mut self, key: &EventKey, field: EventField, old: &Event, new: &Event) {
        debug!(
            "{} changed from '{}' to '{}' on event at {}",
            field,
            old.field(field),
            new.field(field),
            key
        );
    }

    fn cancelled(&mut self, key: &EventKey, event: &Event) {
        debug!("cancelled event: '{}' {}", event.title, key);
    }
}
