use anyhow::{bail, Context, Result};
use cave_core::query::{AGGREGATOR_FIELD, ALERT_CONDITION_FIELD, INTERVAL_FIELD};
use cave_core::timeutils::duration_from_std;
use cave_core::{
    format_instant, now_utc, AutosuggestStore, Chart, ChartData, Config, DateRangePicker,
    ErrorDialog, FormDefaults, GraphContext, GraphController, GraphForm, GraphView,
    HttpMetricsApi, Operation, Outcome, RangeMode, Scope, SqliteStore, TagSet,
};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::OnceCell;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{
    Axis, Block, Borders, Chart as ChartWidget, Dataset, GraphType, List, ListItem, Paragraph,
    Wrap,
};
use ratatui::Terminal;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

const AGGREGATORS: &[&str] = &["mean", "sum", "min", "max", "count", "median", "p99"];
const INTERVALS: &[&str] = &["minute", "hour", "day"];

#[derive(Parser, Debug)]
#[command(author, version, about = "cave-graph: metric graph and alert condition viewer")]
struct Args {
    /// Path to config TOML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the persisted state database path
    #[arg(long)]
    store: Option<PathBuf>,
    /// Override the metrics API base URL
    #[arg(long)]
    api: Option<String>,
    #[arg(long)]
    organization: String,
    #[arg(long)]
    team: Option<String>,
    #[arg(long)]
    metric: String,
    /// Seconds, a duration such as `1h`, or `custom` with --start/--end
    #[arg(long)]
    range: Option<String>,
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    end: Option<String>,
    /// Comma separated `name:value` tag filters
    #[arg(long)]
    tags: Option<String>,
    #[arg(long)]
    interval: Option<String>,
    #[arg(long)]
    aggregator: Option<String>,
    /// Alert condition to evaluate over the range
    #[arg(long)]
    condition: Option<String>,
    #[arg(long)]
    interval_for_test: Option<String>,
    /// Write the series as CSV to stdout instead of opening the viewer
    #[arg(long)]
    csv: bool,
}

/// State the terminal viewer draws from.
#[derive(Debug, Default)]
struct TuiView {
    loading: bool,
    chart: Option<Chart>,
    error: Option<ErrorDialog>,
    location: String,
}

impl GraphView for TuiView {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn render(&mut self, chart: &Chart) {
        self.error = None;
        self.chart = Some(chart.clone());
    }

    fn show_error(&mut self, dialog: &ErrorDialog) {
        self.error = Some(dialog.clone());
    }

    fn replace_location(&mut self, url: &str) {
        self.location = url.to_string();
    }
}

/// Headless view: spinner while fetching, keeps the last chart for export.
#[derive(Debug, Default)]
struct CsvView {
    spinner: Option<ProgressBar>,
    chart: Option<Chart>,
}

impl GraphView for CsvView {
    fn set_loading(&mut self, loading: bool) {
        if loading {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message("please wait");
            spinner.enable_steady_tick(Duration::from_millis(100));
            self.spinner = Some(spinner);
        } else if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn render(&mut self, chart: &Chart) {
        self.chart = Some(chart.clone());
    }

    fn show_error(&mut self, dialog: &ErrorDialog) {
        warn!(title = %dialog.title, "{}", dialog.api_message);
    }

    fn replace_location(&mut self, url: &str) {
        info!(url = %url, "shareable graph url");
    }
}

type Controller<V> = GraphController<Arc<HttpMetricsApi>, V, SqliteStore>;

struct App {
    controller: Controller<TuiView>,
    defaults: FormDefaults<SqliteStore>,
    page: String,
    form: GraphForm,
    editing: bool,
    suggestions: Vec<String>,
    status: String,
    results_tx: Sender<cave_core::controller::Completed>,
    results_rx: Receiver<cave_core::controller::Completed>,
}

impl App {
    fn new(
        controller: Controller<TuiView>,
        defaults: FormDefaults<SqliteStore>,
        page: String,
        form: GraphForm,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            controller,
            defaults,
            page,
            form,
            editing: false,
            suggestions: Vec::new(),
            status: String::from(
                "q quit | p plot | e evaluate | / edit condition | a aggregator | i interval",
            ),
            results_tx,
            results_rx,
        }
    }

    /// Issues the operation and runs its fetches on a worker thread.
    fn trigger(&mut self, operation: Operation) {
        let Some(ticket) = self.controller.begin(operation, &self.form) else {
            self.status = "enter an alert condition first (/)".into();
            return;
        };
        let api = Arc::clone(self.controller.api());
        let tx = self.results_tx.clone();
        thread::spawn(move || {
            let _ = tx.send(ticket.run(&api));
        });
    }

    fn start(&mut self) {
        let operation = if self.form.has_condition() {
            Operation::Evaluate
        } else {
            Operation::Plot
        };
        self.trigger(operation);
    }

    fn drain_results(&mut self) {
        while let Ok(done) = self.results_rx.try_recv() {
            match self.controller.finish(done) {
                Outcome::Rendered { regions } => {
                    self.status = format!("rendered with {regions} alert region(s)");
                }
                Outcome::Failed(dialog) => self.status = dialog.title,
                Outcome::Superseded | Outcome::Skipped => {}
            }
        }
    }

    fn refresh_suggestions(&mut self) {
        let ctx = self.controller.context().clone();
        self.suggestions =
            self.controller
                .autosuggest()
                .suggest(&ctx, ALERT_CONDITION_FIELD, &self.form.condition);
    }

    fn cycle_aggregator(&mut self) {
        let aggregator = next_choice(AGGREGATORS, &self.form.aggregator);
        self.remember(AGGREGATOR_FIELD, &aggregator);
        self.form.aggregator = aggregator;
    }

    fn cycle_interval(&mut self) {
        let interval = next_choice(INTERVALS, &self.form.interval);
        self.remember(INTERVAL_FIELD, &interval);
        self.form.interval = interval;
    }

    fn remember(&mut self, field: &str, value: &str) {
        match self.defaults.remember(&self.page, field, value) {
            Ok(()) => self.status = format!("{field} set to {value}, press p to plot"),
            Err(err) => {
                warn!("failed to remember {field}: {err:#}");
                self.status = format!("{field} set to {value} (not remembered)");
            }
        }
    }

    /// Returns false when the viewer should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing {
            match code {
                KeyCode::Enter => {
                    self.editing = false;
                    self.trigger(Operation::Evaluate);
                }
                KeyCode::Esc => self.editing = false,
                KeyCode::Tab => {
                    if let Some(first) = self.suggestions.first().cloned() {
                        self.form.condition = first;
                        self.refresh_suggestions();
                    }
                }
                KeyCode::Backspace => {
                    self.form.condition.pop();
                    self.refresh_suggestions();
                }
                KeyCode::Char(c) => {
                    self.form.condition.push(c);
                    self.refresh_suggestions();
                }
                _ => {}
            }
            return true;
        }

        match code {
            KeyCode::Char('q') => return false,
            KeyCode::Char('p') => self.trigger(Operation::Plot),
            KeyCode::Char('e') => self.trigger(Operation::Evaluate),
            KeyCode::Char('a') => self.cycle_aggregator(),
            KeyCode::Char('i') => self.cycle_interval(),
            KeyCode::Char('s') => {
                self.status = self.controller.view().location.clone();
            }
            KeyCode::Char('/') => {
                self.editing = true;
                self.refresh_suggestions();
                self.status = "condition: type, Tab to complete, Enter to evaluate".into();
            }
            _ => {}
        }
        true
    }
}

fn next_choice(choices: &[&str], current: &str) -> String {
    let idx = choices.iter().position(|c| *c == current);
    let next = idx.map(|i| (i + 1) % choices.len()).unwrap_or(0);
    choices[next].to_string()
}

fn build_form(config: &Config, args: &Args) -> Result<GraphForm> {
    let range = match args.range.as_deref() {
        Some(r) if r.eq_ignore_ascii_case("custom") => {
            let (Some(start), Some(end)) = (&args.start, &args.end) else {
                bail!("a custom range needs both --start and --end");
            };
            custom_range(RangeMode::custom(start, end)?, now_utc())
        }
        Some(r) => r.parse()?,
        None => RangeMode::relative(duration_from_std(config.graph.default_range)),
    };
    Ok(GraphForm {
        interval: args
            .interval
            .clone()
            .unwrap_or_else(|| config.graph.default_interval.clone()),
        aggregator: args
            .aggregator
            .clone()
            .unwrap_or_else(|| config.graph.default_aggregator.clone()),
        tags: args.tags.as_deref().map(TagSet::parse).unwrap_or_default(),
        condition: args.condition.clone().unwrap_or_default(),
        interval_for_test: args
            .interval_for_test
            .clone()
            .unwrap_or_else(|| config.graph.default_interval_for_test.clone()),
        range,
    })
}

/// Passes an explicit range through the picker constraints: no earlier than
/// the picker floor, start never after end.
fn custom_range(requested: RangeMode, now: OffsetDateTime) -> RangeMode {
    let mut picker = DateRangePicker::seeded_at(now);
    if let RangeMode::Custom { start, end } = requested {
        // Each setter clamps against the other bound, so move the one that
        // widens the window first.
        if end > picker.end() {
            picker.set_end(end);
            picker.set_start(start);
        } else {
            picker.set_start(start);
            picker.set_end(end);
        }
    }
    let clamped = picker.mode();
    if clamped != requested {
        warn!("custom range adjusted to the picker limits");
    }
    clamped
}

fn export_csv<W: Write>(chart: &Chart, mut writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(&mut writer);
    csv_writer.write_record(["metric", "timestamp", "value", "alert"])?;
    if let ChartData::Series(points) = &chart.data {
        for p in points {
            let alert = chart
                .regions
                .iter()
                .any(|r| r.start <= p.ts && p.ts <= r.end);
            csv_writer.write_record([
                chart.series_name.as_str(),
                &format_instant(p.ts),
                &p.value.map(|v| format!("{v:.2}")).unwrap_or_default(),
                if alert { "1" } else { "0" },
            ])?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

fn draw_ui(frame: &mut ratatui::Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.size());

    let ctx = app.controller.context();
    let range = match app.form.range {
        RangeMode::Relative(secs) => {
            humantime::format_duration(Duration::from_secs(secs.max(0) as u64)).to_string()
        }
        RangeMode::Custom { start, end } => {
            format!("{} .. {}", format_instant(start), format_instant(end))
        }
    };
    let header_text = format!(
        "{} @ {} | range: {} | {}({}) per {} | tags: {}\ncondition: {}{}",
        ctx.scope.team_name().unwrap_or("-"),
        ctx.scope.organization,
        range,
        app.form.aggregator,
        ctx.metric,
        app.form.interval,
        app.form.tags.serialize(),
        app.form.condition,
        if app.editing { "_" } else { "" },
    );
    let header = Paragraph::new(header_text)
        .block(Block::default().borders(Borders::ALL).title("cave-graph"));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(chunks[1]);

    draw_side_panel(frame, app, body[0]);
    draw_chart(frame, app.controller.view(), body[1]);

    let view = app.controller.view();
    let (text, style) = if view.loading {
        ("please wait...".to_string(), Style::default().fg(Color::Yellow))
    } else if let Some(err) = &view.error {
        (
            format!("{} {} API message: {}", err.title, err.body, err.api_message),
            Style::default().fg(Color::Red),
        )
    } else {
        (app.status.clone(), Style::default().fg(Color::White))
    };
    let footer = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    frame.render_widget(footer, chunks[2]);
}

fn draw_side_panel(frame: &mut ratatui::Frame<'_>, app: &App, area: Rect) {
    let (title, items): (&str, Vec<ListItem>) = if app.editing {
        (
            "Suggestions",
            app.suggestions
                .iter()
                .enumerate()
                .map(|(idx, s)| {
                    let item = ListItem::new(s.clone());
                    if idx == 0 {
                        item.style(Style::default().add_modifier(Modifier::BOLD))
                    } else {
                        item
                    }
                })
                .collect(),
        )
    } else {
        let regions = app
            .controller
            .view()
            .chart
            .as_ref()
            .map(|c| c.regions.as_slice())
            .unwrap_or_default();
        (
            "Alert regions",
            regions
                .iter()
                .map(|r| {
                    ListItem::new(format!(
                        "{} .. {}",
                        format_clock(r.start),
                        format_clock(r.end)
                    ))
                    .style(Style::default().fg(Color::Red))
                })
                .collect(),
        )
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

fn draw_chart(frame: &mut ratatui::Frame<'_>, view: &TuiView, area: Rect) {
    let Some(chart) = &view.chart else {
        let empty = Paragraph::new("nothing plotted yet")
            .block(Block::default().borders(Borders::ALL).title("Graph"));
        frame.render_widget(empty, area);
        return;
    };
    let ChartData::Series(samples) = &chart.data else {
        let empty = Paragraph::new("No Data Available").block(
            Block::default()
                .borders(Borders::ALL)
                .title(chart.series_name.clone()),
        );
        frame.render_widget(empty, area);
        return;
    };

    let points: Vec<(f64, f64)> = samples
        .iter()
        .filter_map(|s| s.value.map(|v| (s.ts.unix_timestamp() as f64, v)))
        .collect();
    let (x_min, x_max) = bounds(points.iter().map(|p| p.0));
    let (y_min, y_max) = bounds(points.iter().map(|p| p.1));
    let region_lines: Vec<Vec<(f64, f64)>> = chart
        .regions
        .iter()
        .map(|r| {
            vec![
                ((r.start.unix_timestamp() as f64).max(x_min), y_max),
                ((r.end.unix_timestamp() as f64).min(x_max), y_max),
            ]
        })
        .collect();

    let mut datasets = vec![Dataset::default()
        .name(chart.series_name.clone())
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points)];
    datasets.extend(region_lines.iter().map(|line| {
        Dataset::default()
            .marker(Marker::Block)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(line)
    }));

    let widget = ChartWidget::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(chart.series_name.clone()),
        )
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format_clock_secs(x_min)),
                    Span::raw(format_clock_secs(x_max)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(chart.y_label.clone())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{y_min:.1}")),
                    Span::raw(format!("{y_max:.1}")),
                ]),
        );
    frame.render_widget(widget, area);
}

fn bounds<I: Iterator<Item = f64>>(values: I) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() {
        (0.0, 1.0)
    } else if min == max {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

fn format_clock(ts: OffsetDateTime) -> String {
    ts.format(&time::macros::format_description!(
        "[hour]:[minute]:[second] [day] [month repr:short]"
    ))
    .unwrap_or_default()
}

fn format_clock_secs(secs: f64) -> String {
    OffsetDateTime::from_unix_timestamp(secs as i64)
        .map(format_clock)
        .unwrap_or_default()
}

fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    app.start();

    loop {
        app.drain_results();
        terminal.draw(|f| draw_ui(f, &app))?;
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.handle_key(key.code) {
                    break;
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_csv(mut controller: Controller<CsvView>, form: &GraphForm) -> Result<()> {
    match controller.start(form) {
        Outcome::Failed(dialog) => {
            bail!(
                "{} {}\nAPI message: {}",
                dialog.title,
                dialog.body,
                dialog.api_message
            )
        }
        Outcome::Rendered { .. } => {}
        Outcome::Superseded | Outcome::Skipped => bail!("nothing was rendered"),
    }
    let chart = controller
        .view()
        .chart
        .as_ref()
        .context("no chart rendered")?;
    let stdout = io::stdout();
    export_csv(chart, stdout.lock())
}

fn init_logging(config: &Config, to_stderr: bool) -> Result<()> {
    let writer: BoxMakeWriter = match &config.logging.file {
        Some(path) if !to_stderr => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file at {:?}", path))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            static LOG_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> =
                OnceCell::new();
            let _ = LOG_GUARD.set(guard);
            BoxMakeWriter::new(writer)
        }
        _ => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.clone())
        .with_ansi(to_stderr && atty::is(atty::Stream::Stderr))
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(writer)
        .finish()
        .try_init()
        .ok();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(store) = &args.store {
        config.store.path = store.clone();
    }
    if let Some(api) = &args.api {
        config.api.base_url = api.clone();
    }
    init_logging(&config, args.csv)?;

    let context = GraphContext::new(
        Scope {
            organization: args.organization.clone(),
            team: args.team.clone(),
        },
        args.metric.clone(),
    );
    let page = args.metric.clone();
    let defaults = FormDefaults::new(SqliteStore::connect(&config.store.path)?);

    let mut form = build_form(&config, &args)?;
    let mut remembered = defaults.load(&page);
    // Explicit flags win over remembered defaults and become the new ones.
    for (field, value) in [
        (AGGREGATOR_FIELD, &args.aggregator),
        (INTERVAL_FIELD, &args.interval),
    ] {
        if let Some(value) = value {
            defaults.remember(&page, field, value)?;
            remembered.remove(field);
        }
    }
    form.apply_defaults(&remembered);

    let api = Arc::new(HttpMetricsApi::new(
        &config.api.base_url,
        config.api.timeout,
    )?);
    let autosuggest = AutosuggestStore::new(SqliteStore::connect(&config.store.path)?)
        .with_max_entries(config.store.max_suggestions_per_field);
    info!(metric = %context.metric, api = %api.base_url(), "starting cave-graph");

    if args.csv {
        let controller = GraphController::new(
            context,
            api,
            CsvView::default(),
            autosuggest,
            config.graph.page_url.clone(),
        );
        return run_csv(controller, &form);
    }

    let controller = GraphController::new(
        context,
        api,
        TuiView::default(),
        autosuggest,
        config.graph.page_url.clone(),
    );
    run_tui(App::new(controller, defaults, page, form))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cave_core::{Region, Sample};
    use time::macros::datetime;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["cave-graph", "--organization", "acme", "--metric", "orders"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn form_uses_config_defaults() {
        let form = build_form(&Config::default(), &args(&[])).unwrap();
        assert_eq!(form.range, RangeMode::Relative(3600));
        assert_eq!(form.aggregator, "mean");
        assert!(form.tags.is_empty());
        assert!(!form.has_condition());
    }

    #[test]
    fn form_reads_flags() {
        let form = build_form(
            &Config::default(),
            &args(&["--range", "15m", "--tags", "host:web1", "--condition", "orders > 3"]),
        )
        .unwrap();
        assert_eq!(form.range, RangeMode::Relative(900));
        assert_eq!(form.tags.serialize(), "host:web1");
        assert!(form.has_condition());
    }

    #[test]
    fn custom_range_requires_both_ends() {
        let err = build_form(
            &Config::default(),
            &args(&["--range", "custom", "--start", "2024-05-01T00:00:00Z"]),
        );
        assert!(err.is_err());

        let form = build_form(
            &Config::default(),
            &args(&[
                "--range",
                "custom",
                "--start",
                "2024-05-01T00:00:00Z",
                "--end",
                "2024-05-01T01:00:00Z",
            ]),
        )
        .unwrap();
        assert!(form.range.is_custom());
    }

    #[test]
    fn custom_range_is_clamped_to_picker_limits() {
        let now = datetime!(2024-05-15 12:00:00 UTC);
        let requested = RangeMode::Custom {
            start: datetime!(2024-05-15 11:00:00 UTC),
            end: datetime!(2024-05-15 10:00:00 UTC),
        };
        assert_eq!(
            custom_range(requested, now),
            RangeMode::Custom {
                start: datetime!(2024-05-15 11:00:00 UTC),
                end: datetime!(2024-05-15 11:00:00 UTC),
            }
        );

        let ancient = RangeMode::Custom {
            start: datetime!(2024-01-01 00:00:00 UTC),
            end: datetime!(2024-05-15 11:30:00 UTC),
        };
        let RangeMode::Custom { start, end } = custom_range(ancient, now) else {
            panic!("expected a custom range");
        };
        assert_eq!(start, datetime!(2024-05-01 12:00:00 UTC));
        assert_eq!(end, datetime!(2024-05-15 11:30:00 UTC));
    }

    #[test]
    fn future_custom_range_is_kept() {
        let now = datetime!(2024-05-15 12:00:00 UTC);
        let requested = RangeMode::Custom {
            start: datetime!(2024-05-15 14:00:00 UTC),
            end: datetime!(2024-05-15 15:00:00 UTC),
        };
        assert_eq!(custom_range(requested, now), requested);
    }

    #[test]
    fn choices_cycle() {
        assert_eq!(next_choice(AGGREGATORS, "mean"), "sum");
        assert_eq!(next_choice(AGGREGATORS, "p99"), "mean");
        assert_eq!(next_choice(INTERVALS, "unknown"), "minute");
    }

    #[test]
    fn csv_export_flags_points_inside_regions() {
        let t0 = datetime!(2024-05-01 00:00:00 UTC);
        let chart = Chart {
            series_name: "orders".into(),
            y_label: "mean(orders)".into(),
            data: ChartData::Series(vec![
                Sample {
                    ts: t0,
                    value: Some(12.3),
                },
                Sample {
                    ts: t0 + time::Duration::minutes(5),
                    value: None,
                },
            ]),
            regions: vec![Region {
                start: t0 - time::Duration::seconds(30),
                end: t0 + time::Duration::seconds(30),
                class: "alertRegion".into(),
            }],
        };

        let mut buf = Vec::new();
        export_csv(&chart, &mut buf).unwrap();
        let content = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "metric,timestamp,value,alert");
        assert_eq!(lines[1], "orders,2024-05-01T00:00:00.000Z,12.30,1");
        assert_eq!(lines[2], "orders,2024-05-01T00:05:00.000Z,,0");
    }
}
