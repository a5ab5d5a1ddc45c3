//! Pure string construction of metrics API and page URLs. Nothing here
//! touches the network.

use itertools::Itertools;
use std::collections::HashMap;

use crate::context::GraphContext;
use crate::models::TimeRange;
use crate::range::RangeMode;
use crate::timeutils::format_instant;

pub const ALERT_CONDITION_FIELD: &str = "alertCondition";
pub const INTERVAL_FIELD: &str = "interval";
pub const AGGREGATOR_FIELD: &str = "aggregator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Tag filters in form-field order. Repeated names are kept as separate
/// pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(Vec<Tag>);

impl TagSet {
    /// Builds the set from `(field name, field value)` pairs, skipping fields
    /// left empty.
    pub fn from_fields<I, N, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        Self(
            fields
                .into_iter()
                .map(|(n, v)| Tag::new(n, v))
                .filter(|t| !t.value.is_empty())
                .collect(),
        )
    }

    /// Parses `name:value,name:value`. Entries without a colon are ignored.
    pub fn parse(raw: &str) -> Self {
        Self::from_fields(raw.split(',').filter_map(|pair| {
            let (name, value) = pair.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        }))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn serialize(&self) -> String {
        self.0
            .iter()
            .map(|t| format!("{}:{}", t.name, t.value))
            .join(",")
    }

    /// `&tags=...` or nothing at all when there are no tags.
    fn query_fragment(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("&tags={}", self.serialize())
        }
    }
}

/// Everything the graph form holds at the moment a fetch is triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphForm {
    pub interval: String,
    pub aggregator: String,
    pub tags: TagSet,
    pub condition: String,
    pub interval_for_test: String,
    pub range: RangeMode,
}

impl GraphForm {
    pub fn has_condition(&self) -> bool {
        !self.condition.trim().is_empty()
    }

    /// Fields whose values feed the autosuggest history: each tag field and
    /// the alert condition.
    pub fn autocomplete_fields(&self) -> Vec<(&str, &str)> {
        self.tags
            .iter()
            .map(|t| (t.name.as_str(), t.value.as_str()))
            .chain(std::iter::once((
                ALERT_CONDITION_FIELD,
                self.condition.as_str(),
            )))
            .collect()
    }

    /// Overrides interval and aggregator with remembered page defaults.
    pub fn apply_defaults(&mut self, defaults: &HashMap<String, String>) {
        if let Some(aggregator) = defaults.get(AGGREGATOR_FIELD).filter(|v| !v.is_empty()) {
            self.aggregator = aggregator.clone();
        }
        if let Some(interval) = defaults.get(INTERVAL_FIELD).filter(|v| !v.is_empty()) {
            self.interval = interval.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub url: String,
}

impl QueryDescriptor {
    pub fn new<U: Into<String>>(url: U) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    context: GraphContext,
}

impl QueryBuilder {
    pub fn new(context: GraphContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &GraphContext {
        &self.context
    }

    pub fn metric_data_url(
        &self,
        tags: &TagSet,
        interval: &str,
        aggregator: &str,
        range: &TimeRange,
    ) -> QueryDescriptor {
        QueryDescriptor::new(format!(
            "{}/metrics/data?metric={}{}&period={}&aggregator={}&end={}&start={}",
            self.context.scope.api_prefix(),
            self.context.metric,
            tags.query_fragment(),
            interval,
            aggregator,
            format_instant(range.end),
            format_instant(range.start),
        ))
    }

    pub fn condition_check_url(
        &self,
        condition: &str,
        interval_for_test: &str,
        range: &TimeRange,
    ) -> QueryDescriptor {
        QueryDescriptor::new(format!(
            "{}/metrics/check?metric={}&condition={}&period={}&end={}&start={}",
            self.context.scope.api_prefix(),
            self.context.metric,
            urlencoding::encode(condition),
            interval_for_test,
            format_instant(range.end),
            format_instant(range.start),
        ))
    }

    /// Link back to the graph page reproducing the current view. `page_url`
    /// is the page's origin and path without a query string.
    pub fn shareable_url(&self, page_url: &str, form: &GraphForm, range: &TimeRange) -> String {
        format!(
            "{}?period={}&aggregator={}{}&condition={}&intervalForTest={}&end={}&start={}",
            page_url,
            form.interval,
            form.aggregator,
            form.tags.query_fragment(),
            urlencoding::encode(&form.condition),
            form.interval_for_test,
            format_instant(range.end),
            format_instant(range.start),
        )
    }
}
