use anyhow::Result;
use std::collections::HashMap;
use tracing::warn;

use crate::store::KeyValueStore;

pub const FORM_DEFAULTS_KEY: &str = "caveFormDefaults";

type PageDefaults = HashMap<String, HashMap<String, String>>;

/// Remembered form values (aggregator, interval, ...) keyed by page name.
#[derive(Debug)]
pub struct FormDefaults<S> {
    store: S,
}

impl<S: KeyValueStore> FormDefaults<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn load(&self, page: &str) -> HashMap<String, String> {
        self.read_all().remove(page).unwrap_or_default()
    }

    pub fn remember(&self, page: &str, field: &str, value: &str) -> Result<()> {
        let mut all = self.read_all();
        all.entry(page.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        self.store
            .set(FORM_DEFAULTS_KEY, &serde_json::to_string(&all)?)
    }

    fn read_all(&self) -> PageDefaults {
        match self.store.get(FORM_DEFAULTS_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!("failure to parse form defaults, starting over: {err}");
                PageDefaults::new()
            }),
            Ok(None) => PageDefaults::new(),
            Err(err) => {
                warn!("failed to read form defaults: {err:#}");
                PageDefaults::new()
            }
        }
    }
}
