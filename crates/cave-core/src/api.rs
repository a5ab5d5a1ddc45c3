//! Client side of the metrics API.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::FetchError;
use crate::models::{ConditionSample, Sample};
use crate::query::QueryDescriptor;

/// Source of metric series and condition evaluations.
pub trait MetricsApi {
    fn fetch_series(&self, query: &QueryDescriptor) -> Result<Vec<Sample>, FetchError>;
    fn fetch_condition(&self, query: &QueryDescriptor)
        -> Result<Vec<ConditionSample>, FetchError>;
}

impl<A: MetricsApi + ?Sized> MetricsApi for &A {
    fn fetch_series(&self, query: &QueryDescriptor) -> Result<Vec<Sample>, FetchError> {
        (**self).fetch_series(query)
    }

    fn fetch_condition(
        &self,
        query: &QueryDescriptor,
    ) -> Result<Vec<ConditionSample>, FetchError> {
        (**self).fetch_condition(query)
    }
}

/// Blocking HTTP client for the metrics API. Query descriptors carry paths;
/// the base URL is prepended here.
#[derive(Debug, Clone)]
pub struct HttpMetricsApi {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpMetricsApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(&self, query: &QueryDescriptor) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, query.url);
        debug!(url = %url, "fetching");
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = match response.text() {
                Ok(body) if !body.trim().is_empty() => body,
                Ok(_) => status.to_string(),
                Err(e) => e.to_string(),
            };
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }
        let body = response.text().map_err(|e| FetchError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

impl MetricsApi for HttpMetricsApi {
    fn fetch_series(&self, query: &QueryDescriptor) -> Result<Vec<Sample>, FetchError> {
        self.get_json(query)
    }

    fn fetch_condition(
        &self,
        query: &QueryDescriptor,
    ) -> Result<Vec<ConditionSample>, FetchError> {
        self.get_json(query)
    }
}

impl<A: MetricsApi + ?Sized> MetricsApi for std::sync::Arc<A> {
    fn fetch_series(&self, query: &QueryDescriptor) -> Result<Vec<Sample>, FetchError> {
        (**self).fetch_series(query)
    }

    fn fetch_condition(
        &self,
        query: &QueryDescriptor,
    ) -> Result<Vec<ConditionSample>, FetchError> {
        (**self).fetch_condition(query)
    }
}
