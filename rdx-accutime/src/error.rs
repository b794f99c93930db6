//! Error types surfaced by the library.

use thiserror::Error;

/// Convenience alias used by every fallible operation in the crate.
pub type Result<T, E = AccuTimeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AccuTimeError {
    /// A time-of-day string was malformed or out of range.
    #[error("invalid time-of-day `{input}`: {reason}")]
    InvalidFormat { input: String, reason: String },

    /// A reference timestamp cannot be represented as a local calendar date.
    #[error("timestamp {0} ms is outside the representable calendar range")]
    TimestampOutOfRange(i64),

    /// The configuration sources could not be read or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// A periodic callback failed; the loop stopped after this tick.
    #[error("periodic callback failed on tick {tick}: {source}")]
    CallbackFailed {
        tick: u64,
        #[source]
        source: anyhow::Error,
    },

    /// The periodic task ended without reporting a result (panic or runtime shutdown).
    #[error("periodic task aborted: {0}")]
    Aborted(String),
}

impl AccuTimeError {
    pub(crate) fn invalid_format(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
