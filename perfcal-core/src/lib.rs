//! Core library for perfcal.
//!
//! perfcal keeps the published calendar in step with the singout workbook:
//! - `sources` load the workbook or a calendar feed export into a normalized [`Schedule`]
//! - `reconcile` compares two event collections into a [`ChangeSet`]
//! - `output` writes a change set as a calendar feed or as an importer table

pub mod collection;
pub mod date_range;
pub mod error;
pub mod event;
pub mod output;
pub mod reconcile;
pub mod schedule;
pub mod settings;
pub mod sources;
pub mod venue;

pub use collection::EventCollection;
pub use date_range::DateRange;
pub use error::{PerfcalError, PerfcalResult};
pub use event::{Event, EventField, EventKey, EventStatus, EventType};
pub use output::{OutputContext, OutputFormat};
pub use reconcile::{ChangeReporter, ChangeSet, Reconciler};
pub use schedule::{EventTypes, Schedule};
pub use settings::Settings;
pub use venue::{Address, VenueTable};
