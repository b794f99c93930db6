//! Contains common, primitive types shared across the crate.
//!
//! Timestamps are plain `i64` milliseconds since the Unix epoch, the unit the
//! system clock collaborator reports in. Durations handed to callers (elapsed
//! wait times) use the same unit so they can be compared directly.

/// Milliseconds since the Unix epoch, or a millisecond span.
pub type Millis = i64;

pub const MILLIS_PER_SECOND: Millis = 1_000;
pub const MILLIS_PER_MINUTE: Millis = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: Millis = 60 * MILLIS_PER_MINUTE;
