pub mod api;
pub mod autosuggest;
pub mod config;
pub mod context;
pub mod controller;
pub mod defaults;
pub mod error;
pub mod models;
pub mod query;
pub mod range;
pub mod regions;
pub mod store;
pub mod timeutils;

pub use api::{HttpMetricsApi, MetricsApi};
pub use autosuggest::AutosuggestStore;
pub use config::{ApiConfig, Config, GraphConfig, LoggingConfig, StoreConfig};
pub use context::{GraphContext, Scope};
pub use controller::{Chart, ChartData, GraphController, GraphView, Operation, Outcome, Ticket};
pub use defaults::FormDefaults;
pub use error::{ErrorDialog, FetchError, GraphError};
pub use models::{ConditionSample, MetricSeries, Region, Sample, TimeRange};
pub use query::{GraphForm, QueryBuilder, QueryDescriptor, Tag, TagSet};
pub use range::{DateRangePicker, RangeMode, TimeRangeResolver};
pub use regions::merge_regions;
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use timeutils::{format_instant, now_utc, parse_instant, parse_range};
