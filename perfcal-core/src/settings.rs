//! perfcal configuration.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, File};
use serde::Deserialize;

use crate::error::{PerfcalError, PerfcalResult};

/// Settings read from `~/.config/perfcal/config.toml`, with defaults for
/// every field. Command-line flags take precedence over these.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Singout workbook (.xlsx)
    pub workbook: PathBuf,
    /// Calendar export (.ics, or .zip bundle of feeds)
    pub feed: PathBuf,
    /// IANA zone every event is normalized to
    pub timezone: String,
    /// Domain for generated UIDs
    pub domain: String,
    /// UIDs ending with this were added by hand in the calendar and are never cancelled
    pub protected_uid_suffix: String,
    pub prodid: String,
    /// Bundle member prefix for the main calendar, followed by the year
    pub feed_prefix: String,
    /// Bundle member prefix for the absences calendar, followed by the year
    pub absence_feed_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            workbook: PathBuf::from("SingoutInfo.xlsx"),
            feed: PathBuf::from("tuners.ics"),
            timezone: "America/Los_Angeles".to_string(),
            domain: "twotowntuners.org".to_string(),
            protected_uid_suffix: "google.com".to_string(),
            prodid: "-//Two Town Tuners//perfcal//EN".to_string(),
            feed_prefix: "tuners".to_string(),
            absence_feed_prefix: "tunersboardabs".to_string(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PerfcalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PerfcalError::Config("Could not determine config directory".into()))?
            .join("perfcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location. A missing file yields the defaults.
    pub fn load() -> PerfcalResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> PerfcalResult<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()
            .map_err(|e| PerfcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PerfcalError::Config(e.to_string()))?;

        Ok(settings)
    }

    pub fn tz(&self) -> PerfcalResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| PerfcalError::Config(format!("Unknown timezone '{}'", self.timezone)))
    }
}

/// Expand a leading `~` in a configured path.
pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
