//! Per-field history of previously entered values, used to feed
//! autocomplete suggestions. History is scoped by organization, team, metric
//! and field so it never leaks across unrelated metrics.

use anyhow::Result;
use regex::RegexBuilder;
use std::collections::HashMap;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::context::GraphContext;
use crate::store::KeyValueStore;
use crate::timeutils::{format_instant, now_utc, parse_instant};

#[derive(Debug)]
pub struct AutosuggestStore<S> {
    store: S,
    max_entries_per_key: Option<usize>,
}

impl<S: KeyValueStore> AutosuggestStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_entries_per_key: None,
        }
    }

    /// Caps each field's history; the least recently used values go first.
    pub fn with_max_entries(mut self, max: Option<usize>) -> Self {
        self.max_entries_per_key = max.filter(|m| *m > 0);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn record(&self, ctx: &GraphContext, field_id: &str, value: &str) -> Result<()> {
        self.record_at(ctx, field_id, value, now_utc())
    }

    pub fn record_at(
        &self,
        ctx: &GraphContext,
        field_id: &str,
        value: &str,
        at: OffsetDateTime,
    ) -> Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        let key = ctx.storage_key(field_id);
        let mut history = self.load(&key);
        history.insert(value.to_string(), at);
        if let Some(max) = self.max_entries_per_key {
            evict_oldest(&mut history, max);
        }
        let blob: HashMap<&str, String> = history
            .iter()
            .map(|(v, ts)| (v.as_str(), format_instant(*ts)))
            .collect();
        self.store.set(&key, &serde_json::to_string(&blob)?)?;
        debug!(key = %key, entries = history.len(), "recorded autosuggest value");
        Ok(())
    }

    /// Records every non-empty field value in one go.
    pub fn record_fields<'a, I>(&self, ctx: &GraphContext, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let now = now_utc();
        for (field_id, value) in fields {
            self.record_at(ctx, field_id, value, now)?;
        }
        Ok(())
    }

    /// Values recorded for the field containing `query`, compared as a
    /// literal, case-insensitive substring. Most recently used first.
    pub fn suggest(&self, ctx: &GraphContext, field_id: &str, query: &str) -> Vec<String> {
        let Ok(matcher) = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
        else {
            return Vec::new();
        };
        let mut matches: Vec<(String, OffsetDateTime)> = self
            .load(&ctx.storage_key(field_id))
            .into_iter()
            .filter(|(value, _)| matcher.is_match(value))
            .collect();
        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        matches.into_iter().map(|(value, _)| value).collect()
    }

    /// Reads a field's history. Missing or unreadable blobs yield an empty
    /// history.
    fn load(&self, key: &str) -> HashMap<String, OffsetDateTime> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return HashMap::new(),
            Err(err) => {
                warn!(key = %key, "failed to read autosuggest history: {err:#}");
                return HashMap::new();
            }
        };
        match serde_json::from_str::<HashMap<String, serde_json::Value>>(&raw) {
            Ok(entries) => entries
                .into_iter()
                .map(|(value, ts)| {
                    let ts = ts
                        .as_str()
                        .and_then(|s| parse_instant(s).ok())
                        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
                    (value, ts)
                })
                .collect(),
            Err(err) => {
                warn!(key = %key, "discarding corrupt autosuggest history: {err}");
                HashMap::new()
            }
        }
    }
}

fn evict_oldest(history: &mut HashMap<String, OffsetDateTime>, max: usize) {
    if history.len() <= max {
        return;
    }
    let mut by_age: Vec<(OffsetDateTime, String)> =
        history.iter().map(|(v, ts)| (*ts, v.clone())).collect();
    by_age.sort();
    for (_, value) in by_age.into_iter().take(history.len() - max) {
        history.remove(&value);
    }
}
