//! Loaders that turn a workbook or a calendar feed into a [`Schedule`].
//!
//! [`Schedule`]: crate::schedule::Schedule

pub mod feed;
pub mod workbook;

pub use feed::{FeedLoad, FeedOptions, load_feed};
pub use workbook::load_workbook;
