//! Resolution of the selected time range into absolute instants.
//!
//! The resolver never validates or reorders a custom range. Keeping
//! `start <= end` is the job of the picker pair ([`DateRangePicker`]) that
//! feeds it, which clamps each side against the other as it changes.

use anyhow::{bail, Context, Result};
use std::str::FromStr;
use time::{Duration, OffsetDateTime};

use crate::models::TimeRange;
use crate::timeutils::{now_utc, parse_instant, parse_range};

/// Earliest instant the custom pickers accept, relative to now.
pub const PICKER_FLOOR: Duration = Duration::weeks(2);
/// Span the pickers are seeded with when custom mode is selected.
pub const CUSTOM_SEED_SPAN: Duration = Duration::hours(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    /// The last `n` seconds, ending at resolution time.
    Relative(i64),
    Custom {
        start: OffsetDateTime,
        end: OffsetDateTime,
    },
}

impl RangeMode {
    pub fn relative(duration: Duration) -> Self {
        RangeMode::Relative(duration.whole_seconds())
    }

    pub fn custom(start: &str, end: &str) -> Result<Self> {
        Ok(RangeMode::Custom {
            start: parse_instant(start).context("parsing custom start")?,
            end: parse_instant(end).context("parsing custom end")?,
        })
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, RangeMode::Custom { .. })
    }
}

/// Parses a relative mode: a bare integer is seconds, anything else a human
/// duration such as `1h`. `custom` needs picker values and is rejected here.
impl FromStr for RangeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("custom") {
            bail!("custom range needs explicit start and end instants");
        }
        let seconds = match s.parse::<i64>() {
            Ok(seconds) => seconds,
            Err(_) => parse_range(s)?.whole_seconds(),
        };
        if seconds < 0 {
            bail!("relative range must not be negative: {s}");
        }
        if now_utc().checked_sub(Duration::seconds(seconds)).is_none() {
            bail!("relative range reaches past the earliest representable instant: {s}");
        }
        Ok(RangeMode::Relative(seconds))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRangeResolver;

impl TimeRangeResolver {
    /// Resolves against the wall clock. Not memoized: two calls in a row may
    /// differ by the time elapsed between them.
    pub fn resolve(&self, mode: &RangeMode) -> TimeRange {
        self.resolve_at(mode, now_utc())
    }

    pub fn resolve_at(&self, mode: &RangeMode, now: OffsetDateTime) -> TimeRange {
        match *mode {
            RangeMode::Relative(seconds) => TimeRange {
                start: now
                    .checked_sub(Duration::seconds(seconds))
                    .unwrap_or(OffsetDateTime::UNIX_EPOCH),
                end: now,
            },
            RangeMode::Custom { start, end } => TimeRange { start, end },
        }
    }
}

/// The two custom-range pickers with their reactive min/max constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangePicker {
    floor: OffsetDateTime,
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl DateRangePicker {
    /// Pickers as seeded on switching to custom mode: the last hour.
    pub fn seeded_at(now: OffsetDateTime) -> Self {
        Self {
            floor: now - PICKER_FLOOR,
            start: now - CUSTOM_SEED_SPAN,
            end: now,
        }
    }

    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn end(&self) -> OffsetDateTime {
        self.end
    }

    /// Sets the start, clamped into `[floor, end]`.
    pub fn set_start(&mut self, start: OffsetDateTime) {
        self.start = start.max(self.floor).min(self.end);
    }

    /// Sets the end, clamped to be no earlier than the start.
    pub fn set_end(&mut self, end: OffsetDateTime) {
        self.end = end.max(self.start);
    }

    pub fn mode(&self) -> RangeMode {
        RangeMode::Custom {
            start: self.start,
            end: self.end,
        }
    }
}
