use cave_core::regions::{ALERT_REGION_CLASS, REGION_PADDING};
use cave_core::{merge_regions, ConditionSample};
use serde_json::json;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const T0: OffsetDateTime = datetime!(2024-05-01 00:00:00 UTC);

fn samples(values: &[u8]) -> Vec<ConditionSample> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| ConditionSample::new(T0 + Duration::seconds(10 * i as i64), *v == 1))
        .collect()
}

fn at(secs: i64) -> OffsetDateTime {
    T0 + Duration::seconds(secs)
}

#[test]
fn two_runs_yield_two_padded_regions() {
    let regions = merge_regions(&samples(&[0, 1, 1, 0, 1]));
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].start, at(10 - 30));
    assert_eq!(regions[0].end, at(20 + 30));
    assert_eq!(regions[1].start, at(40 - 30));
    assert_eq!(regions[1].end, at(40 + 30));
    assert!(regions.iter().all(|r| r.class == ALERT_REGION_CLASS));
}

#[test]
fn no_breach_yields_nothing() {
    assert!(merge_regions(&samples(&[0, 0, 0])).is_empty());
    assert!(merge_regions(&Vec::<ConditionSample>::new()).is_empty());
}

#[test]
fn all_breach_yields_one_region_over_everything() {
    let input = samples(&[1, 1, 1, 1]);
    let regions = merge_regions(&input);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].start, at(0) - REGION_PADDING);
    assert_eq!(regions[0].end, at(30) + REGION_PADDING);
}

#[test]
fn isolated_breaches_overlap_without_being_merged() {
    let regions = merge_regions(&samples(&[1, 0, 1]));
    assert_eq!(regions.len(), 2);
    for r in &regions {
        assert_eq!(r.end - r.start, REGION_PADDING * 2);
    }
    assert!(regions[0].end > regions[1].start);
}

#[test]
fn region_count_matches_runs_and_order_is_kept() {
    let pattern = [1, 0, 1, 1, 0, 0, 1, 0, 1, 1, 1];
    let regions = merge_regions(&samples(&pattern));
    assert_eq!(regions.len(), 4);
    assert!(regions.windows(2).all(|w| w[0].start <= w[1].start));
}

#[test]
fn only_exact_one_counts_as_breach() {
    let raw = json!([
        {"ts": "2024-05-01T00:00:00Z", "value": 1},
        {"ts": "2024-05-01T00:00:10Z", "value": null},
        {"ts": "2024-05-01T00:00:20Z"},
        {"ts": "2024-05-01T00:00:30Z", "value": 2},
        {"ts": "2024-05-01T00:00:40Z", "value": true},
        {"ts": "2024-05-01T00:00:50Z", "value": 1.0}
    ]);
    let input: Vec<ConditionSample> = serde_json::from_value(raw).unwrap();
    let regions = merge_regions(&input);
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].start, at(-30));
    assert_eq!(regions[0].end, at(30));
    assert_eq!(regions[1].start, at(20));
    assert_eq!(regions[1].end, at(80));
}

#[test]
fn boolean_true_is_not_a_breach() {
    let input: Vec<ConditionSample> =
        serde_json::from_value(json!([{"ts": "2024-05-01T00:00:00Z", "value": true}])).unwrap();
    assert!(merge_regions(&input).is_empty());
}
