//! Orchestration of the Plot and Evaluate operations.
//!
//! Every operation goes through three steps: [`GraphController::begin`]
//! issues a [`Ticket`] tagged with a fresh generation number,
//! [`Ticket::run`] performs the fetches (possibly on another thread), and
//! [`GraphController::finish`] renders the result. Only the ticket carrying
//! the latest generation is rendered; answers to older requests are dropped.

use tracing::{debug, info, warn};

use crate::api::MetricsApi;
use crate::autosuggest::AutosuggestStore;
use crate::context::GraphContext;
use crate::error::{ErrorDialog, GraphError};
use crate::models::{MetricSeries, Region, Sample};
use crate::query::{GraphForm, QueryBuilder, QueryDescriptor};
use crate::range::TimeRangeResolver;
use crate::regions::merge_regions;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Plot,
    Evaluate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Series(Vec<Sample>),
    /// Every value was null; shown as "No Data Available".
    NoData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub series_name: String,
    pub y_label: String,
    pub data: ChartData,
    pub regions: Vec<Region>,
}

/// Presentation boundary: chart rendering, loading indicator, error dialog
/// and the page location.
pub trait GraphView {
    fn set_loading(&mut self, loading: bool);
    fn render(&mut self, chart: &Chart);
    fn show_error(&mut self, dialog: &ErrorDialog);
    /// Replaces the current location with a link reproducing the view,
    /// without navigating.
    fn replace_location(&mut self, url: &str);
}

/// A triggered operation whose fetches have not run yet.
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    operation: Operation,
    metric_query: QueryDescriptor,
    condition_query: Option<QueryDescriptor>,
    shareable_url: String,
    series_name: String,
    y_label: String,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn metric_query(&self) -> &QueryDescriptor {
        &self.metric_query
    }

    pub fn condition_query(&self) -> Option<&QueryDescriptor> {
        self.condition_query.as_ref()
    }

    /// Runs the fetch pipeline. The condition is only evaluated once the
    /// metric data arrived.
    pub fn run<A: MetricsApi>(self, api: &A) -> Completed {
        let result = self.fetch(api);
        Completed {
            ticket: self,
            result,
        }
    }

    fn fetch<A: MetricsApi>(&self, api: &A) -> Result<Fetched, GraphError> {
        let points = api
            .fetch_series(&self.metric_query)
            .map_err(GraphError::MetricData)?;
        let regions = match &self.condition_query {
            Some(query) => {
                let evaluation = api
                    .fetch_condition(query)
                    .map_err(GraphError::ConditionEvaluation)?;
                merge_regions(&evaluation)
            }
            None => Vec::new(),
        };
        Ok(Fetched { points, regions })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub points: Vec<Sample>,
    pub regions: Vec<Region>,
}

#[derive(Debug)]
pub struct Completed {
    ticket: Ticket,
    result: Result<Fetched, GraphError>,
}

impl Completed {
    pub fn generation(&self) -> u64 {
        self.ticket.generation
    }

    pub fn result(&self) -> &Result<Fetched, GraphError> {
        &self.result
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rendered { regions: usize },
    Failed(ErrorDialog),
    /// A newer operation was triggered before this one finished.
    Superseded,
    /// Evaluate was triggered without a condition.
    Skipped,
}

pub struct GraphController<A, V, S> {
    api: A,
    view: V,
    builder: QueryBuilder,
    resolver: TimeRangeResolver,
    autosuggest: AutosuggestStore<S>,
    page_url: String,
    latest_generation: u64,
}

impl<A, V, S> GraphController<A, V, S>
where
    A: MetricsApi,
    V: GraphView,
    S: KeyValueStore,
{
    pub fn new<P: Into<String>>(
        context: GraphContext,
        api: A,
        view: V,
        autosuggest: AutosuggestStore<S>,
        page_url: P,
    ) -> Self {
        Self {
            api,
            view,
            builder: QueryBuilder::new(context),
            resolver: TimeRangeResolver,
            autosuggest,
            page_url: page_url.into(),
            latest_generation: 0,
        }
    }

    pub fn context(&self) -> &GraphContext {
        self.builder.context()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn autosuggest(&self) -> &AutosuggestStore<S> {
        &self.autosuggest
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    /// Initial load: evaluate when a condition is already filled in,
    /// plot otherwise.
    pub fn start(&mut self, form: &GraphForm) -> Outcome {
        if form.has_condition() {
            self.evaluate(form)
        } else {
            self.plot(form)
        }
    }

    pub fn plot(&mut self, form: &GraphForm) -> Outcome {
        self.run(Operation::Plot, form)
    }

    pub fn evaluate(&mut self, form: &GraphForm) -> Outcome {
        self.run(Operation::Evaluate, form)
    }

    fn run(&mut self, operation: Operation, form: &GraphForm) -> Outcome {
        match self.begin(operation, form) {
            Some(ticket) => {
                let completed = ticket.run(&self.api);
                self.finish(completed)
            }
            None => Outcome::Skipped,
        }
    }

    /// Records the form's field values, resolves the range, builds the
    /// queries and raises the loading indicator. Returns `None` for an
    /// Evaluate without a condition.
    pub fn begin(&mut self, operation: Operation, form: &GraphForm) -> Option<Ticket> {
        if operation == Operation::Evaluate && !form.has_condition() {
            debug!("evaluate triggered without a condition");
            return None;
        }
        let ctx = self.builder.context().clone();
        if let Err(err) = self
            .autosuggest
            .record_fields(&ctx, form.autocomplete_fields())
        {
            warn!("failed to record autosuggest values: {err:#}");
        }

        let range = self.resolver.resolve(&form.range);
        let metric_query =
            self.builder
                .metric_data_url(&form.tags, &form.interval, &form.aggregator, &range);
        let condition_query = (operation == Operation::Evaluate).then(|| {
            self.builder
                .condition_check_url(&form.condition, &form.interval_for_test, &range)
        });

        self.latest_generation += 1;
        self.view.set_loading(true);
        info!(
            generation = self.latest_generation,
            ?operation,
            metric = %ctx.metric,
            "graph request issued"
        );
        Some(Ticket {
            generation: self.latest_generation,
            operation,
            metric_query,
            condition_query,
            shareable_url: self.builder.shareable_url(&self.page_url, form, &range),
            y_label: format!("{}({})", form.aggregator, ctx.metric),
            series_name: ctx.metric,
        })
    }

    pub fn finish(&mut self, completed: Completed) -> Outcome {
        let Completed { ticket, result } = completed;
        if ticket.generation != self.latest_generation {
            debug!(
                generation = ticket.generation,
                latest = self.latest_generation,
                "dropping response to superseded request"
            );
            return Outcome::Superseded;
        }
        self.view.set_loading(false);

        match result {
            Ok(fetched) => {
                let series = MetricSeries::new(ticket.series_name, fetched.points);
                let data = if series.is_all_null() {
                    ChartData::NoData
                } else {
                    ChartData::Series(series.points)
                };
                let regions = fetched.regions.len();
                let chart = Chart {
                    series_name: series.name,
                    y_label: ticket.y_label,
                    data,
                    regions: fetched.regions,
                };
                self.view.replace_location(&ticket.shareable_url);
                self.view.render(&chart);
                Outcome::Rendered { regions }
            }
            Err(err) => {
                warn!(generation = ticket.generation, "{err}");
                let dialog = err.dialog();
                self.view.show_error(&dialog);
                Outcome::Failed(dialog)
            }
        }
    }
}
