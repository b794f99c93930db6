//! Defines the configuration structures for the accutime waiters.
//!
//! `AccuTimeConfig` is designed to be deserialized with `serde`, usually from a
//! TOML file layered under `ACCUTIME_*` environment variables. Every field has
//! a default, so an empty file (or no file at all) is a valid configuration.

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

/// Environment variable prefix, e.g. `ACCUTIME_COMPENSATION_MS=-2`.
pub const ENV_PREFIX: &str = "ACCUTIME";

/// The top-level configuration for a `Waiter`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccuTimeConfig {
    /// Initial compensation offset in milliseconds. A wait resolves once
    /// `now + compensation >= target`: positive values resolve early, negative
    /// values late. The `-1` default lands just past the whole-second boundary.
    #[serde(default = "default_compensation_ms")]
    pub compensation_ms: i64,

    /// Remaining distance (ms) above which the waiter sleeps instead of
    /// yielding. `0` keeps the waiter in yield-and-recheck mode the whole time.
    #[serde(default = "default_coarse_threshold_ms")]
    pub coarse_threshold_ms: u64,

    /// How strictly time-of-day components are range checked.
    #[serde(default)]
    pub range_check: RangeCheck,

    /// Capacity of the broadcast channel carrying `SchedulerEvent`s.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Range validation applied when parsing `HH:mm:ss` strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeCheck {
    /// Hour in `[0,24)`, minute and second in `[0,60)`.
    #[default]
    Strict,
    /// Any non-negative integer is accepted for every component.
    Relaxed,
}

impl AccuTimeConfig {
    /// Loads the configuration from an optional file, then applies
    /// `ACCUTIME_*` environment overrides.
    ///
    /// A missing file is not an error; a file that exists but cannot be
    /// parsed is.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parses a configuration from an in-memory TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from_str(text, ::config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

// --- Default value functions for serde ---

fn default_compensation_ms() -> i64 {
    -1
}

fn default_coarse_threshold_ms() -> u64 {
    20
}

fn default_event_capacity() -> usize {
    64
}

impl Default for AccuTimeConfig {
    fn default() -> Self {
        Self {
            compensation_ms: default_compensation_ms(),
            coarse_threshold_ms: default_coarse_threshold_ms(),
            range_check: RangeCheck::default(),
            event_capacity: default_event_capacity(),
        }
    }
}
