use time::{Duration, OffsetDateTime};

use crate::models::{ConditionSample, Region};

/// Margin added on both sides of a run so the highlight covers the whole
/// sampling period.
pub const REGION_PADDING: Duration = Duration::seconds(30);
pub const ALERT_REGION_CLASS: &str = "alertRegion";

/// Collapses time-ordered condition samples into one padded region per
/// maximal run of samples where the condition held.
///
/// Single pass, sequential access only. Runs that end up overlapping after
/// padding are left as separate regions; the renderer draws them on top of
/// each other.
pub fn merge_regions<'a, I>(samples: I) -> Vec<Region>
where
    I: IntoIterator<Item = &'a ConditionSample>,
{
    let mut regions = Vec::new();
    let mut run: Option<(OffsetDateTime, OffsetDateTime)> = None;

    for sample in samples {
        if sample.holds() {
            run = Some(match run {
                Some((first, _)) => (first, sample.ts),
                None => (sample.ts, sample.ts),
            });
        } else if let Some((first, last)) = run.take() {
            regions.push(padded(first, last));
        }
    }
    if let Some((first, last)) = run {
        regions.push(padded(first, last));
    }
    regions
}

fn padded(first: OffsetDateTime, last: OffsetDateTime) -> Region {
    Region {
        start: first - REGION_PADDING,
        end: last + REGION_PADDING,
        class: ALERT_REGION_CLASS.to_string(),
    }
}
