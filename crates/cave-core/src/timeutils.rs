use anyhow::{Context, Result};
use std::time::Duration as StdDuration;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub fn parse_range(spec: &str) -> Result<Duration> {
    let std = humantime::parse_duration(spec).context("invalid duration format")?;
    Ok(duration_from_std(std))
}

pub fn duration_from_std(std: StdDuration) -> Duration {
    Duration::new(
        i64::try_from(std.as_secs()).unwrap_or(i64::MAX),
        std.subsec_nanos() as i32,
    )
}

/// Renders an instant as UTC ISO-8601 with millisecond precision and a `Z`
/// marker, the form both the metrics API and the page URL expect.
pub fn format_instant(instant: OffsetDateTime) -> String {
    let utc = instant.to_offset(UtcOffset::UTC);
    utc.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ))
    .unwrap_or_else(|_| utc.unix_timestamp().to_string())
}

pub fn parse_instant(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .with_context(|| format!("invalid RFC 3339 instant: {raw}"))
}
