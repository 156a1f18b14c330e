//! Reconciliation of two event collections.
//!
//! Events are matched by [`EventKey`] alone. A title, venue or uniform edit
//! on a matched key is a modification; any change to the start or end time
//! shows up as a cancellation of the old key plus an addition of the new one.

mod change_set;
mod reporter;

pub use change_set::{ChangeCounts, ChangeSet};
pub use reporter::{ChangeReporter, LogReporter};

use log::warn;

use crate::collection::EventCollection;
use crate::event::{Event, EventField, EventKey, EventStatus};

/// Computes the [`ChangeSet`] that brings `old` in line with `current`.
pub struct Reconciler<R = LogReporter> {
    protected_uid_suffix: String,
    reporter: R,
}

impl Reconciler<LogReporter> {
    /// Old-side events whose UID ends with `protected_uid_suffix` are never cancelled.
    pub fn new(protected_uid_suffix: impl Into<String>) -> Self {
        Reconciler {
            protected_uid_suffix: protected_uid_suffix.into(),
            reporter: LogReporter,
        }
    }
}

impl<R: ChangeReporter> Reconciler<R> {
    pub fn with_reporter<S: ChangeReporter>(self, reporter: S) -> Reconciler<S> {
        Reconciler {
            protected_uid_suffix: self.protected_uid_suffix,
            reporter,
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Compare `current` against `old`. With no old collection, every current
    /// event is an addition.
    pub fn reconcile(&mut self, current: &EventCollection, old: Option<&EventCollection>) -> ChangeSet {
        let mut changes = ChangeSet::default();

        for (key, event) in current {
            match old.and_then(|old| old.get(key)) {
                None => {
                    self.reporter.added(key, event);
                    changes.record(key.clone(), event.clone());
                }
                Some(previous) => {
                    if let Some(field) = first_difference(event, previous) {
                        self.reporter.modified(key, field, previous, event);
                        let mut modified = event.clone();
                        modified.status = Some(EventStatus::Modified(field));
                        changes.record(key.clone(), modified);
                    }
                }
            }
        }

        let Some(old) = old else {
            return changes;
        };

        for (key, event) in old {
            if current.contains_key(key) {
                continue;
            }

            if event.is_protected(&self.protected_uid_suffix) {
                warn!(
                    "refusing to drop manually added event: '{}' from {} to {} ({})",
                    event.title,
                    key.start.format("%b %d, %Y at %I:%M%p"),
                    key.end.format("%b %d, %Y at %I:%M%p"),
                    event.uid.as_deref().unwrap_or_default()
                );
                self.reporter.protected(key, event);
                continue;
            }

            self.reporter.cancelled(key, event);
            let mut cancelled = event.clone();
            cancelled.status = Some(EventStatus::Cancelled);
            changes.record(key.clone(), cancelled);
        }

        changes
    }
}

/// First compared field whose value differs, in title, venue, uniform order.
fn first_difference(current: &Event, old: &Event) -> Option<EventField> {
    EventField::COMPARED
        .into_iter()
        .find(|field| current.field(*field) != old.field(*field))
}

/// Reconcile with the default log reporter.
pub fn reconcile(
    current: &EventCollection,
    old: Option<&EventCollection>,
    protected_uid_suffix: &str,
) -> ChangeSet {
    Reconciler::new(protected_uid_suffix).reconcile(current, old)
}
