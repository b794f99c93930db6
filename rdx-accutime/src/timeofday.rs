//! `HH:mm:ss` parsing, component-wise arithmetic, and conversion of a
//! time-of-day into absolute epoch milliseconds.
//!
//! A time-of-day string is interpreted two ways:
//! - as a wall-clock anchor on the local calendar day of a reference instant
//!   ([`TimeOfDay::resolve_on`], [`resolve_time_of_day`]);
//! - as a plain duration added to a reference instant
//!   ([`TimeOfDay::offset_from`], [`add_offset`]).

use crate::common::{Millis, MILLIS_PER_HOUR, MILLIS_PER_MINUTE, MILLIS_PER_SECOND};
use crate::config::RangeCheck;
use crate::error::{AccuTimeError, Result};
use chrono::{LocalResult, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

/// Signed `(hours, minutes, seconds)` produced by the string arithmetic.
///
/// Components are not fully normalized; see [`TimeOfDay::add_components`].
pub type Hms = (i64, i64, i64);

/// A parsed `HH:mm:ss` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimeOfDay {
    pub const fn new(hour: u32, minute: u32, second: u32) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }

    /// Parses `text` with the given range policy.
    ///
    /// The input must be exactly three `:`-separated, non-empty runs of ASCII
    /// digits. No sign, fraction or zone suffix is accepted. Under
    /// [`RangeCheck::Strict`] the hour must be below 24 and minute/second below 60.
    pub fn parse_with(text: &str, check: RangeCheck) -> Result<Self> {
        let mut parts = text.split(':');
        let (Some(h), Some(m), Some(s), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AccuTimeError::invalid_format(
                text,
                "expected exactly three `:`-separated components",
            ));
        };

        let parsed = Self::new(
            parse_component(text, h, "hour")?,
            parse_component(text, m, "minute")?,
            parse_component(text, s, "second")?,
        );

        if check == RangeCheck::Strict {
            if parsed.hour >= 24 {
                return Err(AccuTimeError::invalid_format(text, "hour must be in [0, 24)"));
            }
            if parsed.minute >= 60 {
                return Err(AccuTimeError::invalid_format(text, "minute must be in [0, 60)"));
            }
            if parsed.second >= 60 {
                return Err(AccuTimeError::invalid_format(text, "second must be in [0, 60)"));
            }
        }
        Ok(parsed)
    }

    pub fn as_tuple(&self) -> (u32, u32, u32) {
        (self.hour, self.minute, self.second)
    }

    fn signed(&self) -> Hms {
        (
            i64::from(self.hour),
            i64::from(self.minute),
            i64::from(self.second),
        )
    }

    /// Total length in milliseconds when read as a duration.
    pub fn as_millis(&self) -> Millis {
        let (h, m, s) = self.signed();
        h * MILLIS_PER_HOUR + m * MILLIS_PER_MINUTE + s * MILLIS_PER_SECOND
    }

    /// Component-wise sum with a single carry step per component.
    ///
    /// A component is carried only when it exceeds 60; a value of exactly 60
    /// is left as is (`00:00:30 + 00:00:30` is `(0, 0, 60)`).
    pub fn add_components(&self, other: &TimeOfDay) -> Hms {
        let (h1, m1, s1) = self.signed();
        let (h2, m2, s2) = other.signed();
        let (mut h, mut m, mut s) = (h1 + h2, m1 + m2, s1 + s2);
        if s > 60 {
            m += 1;
            s -= 60;
        }
        if m > 60 {
            h += 1;
            m -= 60;
        }
        (h, m, s)
    }

    /// Component-wise difference `self - other` with a single borrow step per
    /// component. The hour may end up negative when `other` is later.
    pub fn subtract_components(&self, other: &TimeOfDay) -> Hms {
        let (h1, m1, s1) = self.signed();
        let (h2, m2, s2) = other.signed();
        let (mut h, mut m, mut s) = (h1 - h2, m1 - m2, s1 - s2);
        if s < 0 {
            m -= 1;
            s += 60;
        }
        if m < 0 {
            h -= 1;
            m += 60;
        }
        (h, m, s)
    }

    /// `reference + self` with `self` read as a duration.
    pub fn offset_from(&self, reference: Millis) -> Millis {
        reference + self.as_millis()
    }

    /// Absolute timestamp of this time-of-day on the local calendar day
    /// containing `reference`.
    ///
    /// Ambiguous local times (clocks turned back) resolve to the earlier
    /// instant. Local times skipped by a forward transition are mapped with the
    /// UTC offset in force at `reference`.
    pub fn resolve_on(&self, reference: Millis) -> Result<Millis> {
        let anchor = match chrono::Local.timestamp_millis_opt(reference) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => return Err(AccuTimeError::TimestampOutOfRange(reference)),
        };

        let midnight = anchor.date_naive().and_time(NaiveTime::MIN);
        let target = TimeDelta::try_seconds(self.as_millis() / MILLIS_PER_SECOND)
            .and_then(|delta| midnight.checked_add_signed(delta))
            .ok_or(AccuTimeError::TimestampOutOfRange(reference))?;

        let resolved = match chrono::Local.from_local_datetime(&target) {
            LocalResult::Single(dt) => dt.timestamp_millis(),
            LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
            LocalResult::None => {
                let offset = i64::from(anchor.offset().fix().local_minus_utc());
                let utc = TimeDelta::try_seconds(offset)
                    .and_then(|delta| target.checked_sub_signed(delta))
                    .ok_or(AccuTimeError::TimestampOutOfRange(reference))?;
                Utc.from_utc_datetime(&utc).timestamp_millis()
            }
        };
        Ok(resolved)
    }
}

fn parse_component(input: &str, part: &str, name: &str) -> Result<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AccuTimeError::invalid_format(
            input,
            format!("{name} component `{part}` is not a non-negative integer"),
        ));
    }
    part.parse::<u32>().map_err(|_| {
        AccuTimeError::invalid_format(input, format!("{name} component `{part}` is too large"))
    })
}

impl FromStr for TimeOfDay {
    type Err = AccuTimeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_with(s, RangeCheck::Strict)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Parses a strict `HH:mm:ss` string.
pub fn parse_time_string(text: &str) -> Result<TimeOfDay> {
    text.parse()
}

/// `a + b`, see [`TimeOfDay::add_components`].
pub fn add_time_string(a: &str, b: &str) -> Result<Hms> {
    Ok(parse_time_string(a)?.add_components(&parse_time_string(b)?))
}

/// `a - b`, see [`TimeOfDay::subtract_components`].
pub fn subtract_time_string(a: &str, b: &str) -> Result<Hms> {
    Ok(parse_time_string(a)?.subtract_components(&parse_time_string(b)?))
}

/// Absolute timestamp of `time_of_day` on the local day of `reference`.
pub fn resolve_time_of_day(time_of_day: &str, reference: Millis) -> Result<Millis> {
    parse_time_string(time_of_day)?.resolve_on(reference)
}

/// `reference` plus `time_of_day` read as a duration.
pub fn add_offset(time_of_day: &str, reference: Millis) -> Result<Millis> {
    Ok(parse_time_string(time_of_day)?.offset_from(reference))
}
