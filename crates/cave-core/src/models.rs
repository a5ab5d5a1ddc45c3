use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

/// One `{ts, value}` point of a metric series. A `None` value means the
/// server had no data for that period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    #[serde(default)]
    pub value: Option<f64>,
}

/// One `{ts, value}` point of a condition evaluation. The value is kept raw
/// because the server may send `0`/`1`, a boolean, `null` or omit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSample {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    #[serde(default)]
    pub value: Option<Value>,
}

impl ConditionSample {
    pub fn new(ts: OffsetDateTime, holds: bool) -> Self {
        Self {
            ts,
            value: Some(Value::from(u8::from(holds))),
        }
    }

    /// Whether the alert condition held at `ts`. Only a numeric 1 counts;
    /// `true`, `null` and other numbers do not.
    pub fn holds(&self) -> bool {
        matches!(&self.value, Some(Value::Number(n)) if n.as_f64() == Some(1.0))
    }
}

/// A highlighted interval handed to the chart renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub name: String,
    pub points: Vec<Sample>,
}

impl MetricSeries {
    pub fn new<N: Into<String>>(name: N, points: Vec<Sample>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// True when no point carries a value, including the empty series.
    pub fn is_all_null(&self) -> bool {
        self.points.iter().all(|p| p.value.is_none())
    }
}
