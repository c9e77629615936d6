//! Headless WindFeed dashboard
//!
//! Runs the demo wind feed, attaches a feed monitor to it, and logs both
//! dashboard tabs every time the derived state changes. Lines typed on
//! stdin select a look-back range (`6`, `12h`, ...) or quit (`q`).

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use windfeed_core::config::DashboardConfig;
use windfeed_core::demo::run_demo_feed;
use windfeed_core::prelude::*;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn init_logging(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("Invalid log level '{default_level}'"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

/// Load configuration from `WINDFEED_CONFIG`, else the default location
///
/// A missing file at the default location means defaults; a missing file
/// named explicitly is an error.
pub fn load_config() -> Result<DashboardConfig> {
    if let Some(path) = std::env::var_os("WINDFEED_CONFIG") {
        return DashboardConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.to_string_lossy()));
    }

    match DashboardConfig::default_path() {
        Some(path) => DashboardConfig::load_or_default(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(DashboardConfig::default()),
    }
}

/// A line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SelectRange(TimeRange),
    Quit,
    Unknown(String),
}

/// Parse a stdin line; blank lines yield `None`
///
/// Only ranges listed in `options` can be selected.
pub fn parse_command(line: &str, options: &[TimeRange]) -> Option<Command> {
    let input = line.trim();
    if input.is_empty() {
        return None;
    }
    if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
        return Some(Command::Quit);
    }

    let hours = input.trim_end_matches(['h', 'H']).parse::<u32>().ok();
    let selected = hours.and_then(|h| options.iter().copied().find(|r| r.hours() == h));
    Some(match selected {
        Some(range) => Command::SelectRange(range),
        None => Command::Unknown(input.to_string()),
    })
}

/// One-line rendering of the history tab
pub fn render_history(view: &HistoryView) -> String {
    let slices: Vec<String> = view
        .slices
        .iter()
        .map(|s| format!("{}: {}", s.name, s.count))
        .collect();
    let stats: Vec<String> = view
        .stats
        .iter()
        .map(|s| format!("{}: {}", s.label, s.value))
        .collect();
    format!("{} [{}] {}", view.title, slices.join(", "), stats.join(", "))
}

/// One-line rendering of the wind tab
pub fn render_wind(view: &WindView) -> String {
    let ranges: Vec<String> = view
        .range_options
        .iter()
        .map(|o| {
            if o.active {
                format!("[{}]", o.label)
            } else {
                o.label.clone()
            }
        })
        .collect();

    let chart = match &view.chart {
        Some(series) => {
            let values: Vec<String> = series.values.iter().map(|v| format!("{:.1}", v)).collect();
            format!("{}: {} (step {})", view.chart_title, values.join(" "), series.y_axis_step)
        }
        None => view.chart_placeholder().unwrap_or_default().to_string(),
    };

    format!(
        "Current Wind {} {} | Time Range: {} | {}",
        view.current_speed,
        view.category_label,
        ranges.join(" "),
        chart
    )
}

/// A running dashboard: demo feed plus the monitor watching it
pub struct Dashboard {
    config: DashboardConfig,
    token: CancellationToken,
    demo_task: JoinHandle<Result<u64, FeedError>>,
    monitor: MonitorHandle,
}

impl Dashboard {
    /// Start the demo feed and attach a monitor to it
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: DashboardConfig) -> Result<Self> {
        let feed = MemoryFeed::new();
        let token = CancellationToken::new();

        let monitor = FeedMonitor::new(
            FeedAggregator::new(config.default_time_range),
            config.record_policy,
        )
        .attach(&feed, &config.feed_path)?;

        let demo_task = tokio::spawn(run_demo_feed(
            feed,
            config.feed_path.clone(),
            config.demo.clone(),
            token.child_token(),
        ));

        Ok(Self {
            config,
            token,
            demo_task,
            monitor,
        })
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DerivedState> {
        self.monitor.subscribe_state()
    }

    pub fn select_range(&self, range: TimeRange) {
        tracing::info!("Selected time range {}", range);
        self.monitor.select_range(range);
    }

    pub fn history_view(&self, state: &DerivedState) -> HistoryView {
        HistoryView::from_state(state)
    }

    pub fn wind_view(&self, state: &DerivedState) -> WindView {
        WindView::from_state(state, &self.config.time_range_options)
    }

    /// Log both tabs for a state
    pub fn log_state(&self, state: &DerivedState) -> Result<()> {
        let wind = self.wind_view(state);
        let history = self.history_view(state);

        tracing::info!("{}", render_wind(&wind));
        tracing::info!("{}", render_history(&history));
        tracing::debug!("wind view: {}", serde_json::to_string(&wind)?);
        tracing::debug!("history view: {}", serde_json::to_string(&history)?);

        let status = self.monitor.status();
        if status.error_count > 0 {
            tracing::warn!(
                "{} feed errors so far, last: {}",
                status.error_count,
                status.last_error.as_deref().unwrap_or("unknown")
            );
        }
        Ok(())
    }

    /// Stop the demo feed and the monitor; returns readings pushed
    pub async fn stop(self) -> Result<u64> {
        self.token.cancel();
        self.monitor.shutdown().await;
        let pushed = self.demo_task.await.context("Demo feed task failed")??;
        Ok(pushed)
    }
}

/// Run until Ctrl-C or a quit command
pub async fn run(config: DashboardConfig) -> Result<()> {
    let options = config.time_range_options.clone();
    let dashboard = Dashboard::start(config)?;
    let mut states = dashboard.subscribe_state();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    tracing::warn!("Monitor stopped");
                    break;
                }
                let state = states.borrow_and_update().clone();
                dashboard.log_state(&state)?;
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                match parse_command(&line, &options) {
                    Some(Command::SelectRange(range)) => dashboard.select_range(range),
                    Some(Command::Quit) => break,
                    Some(Command::Unknown(input)) => {
                        let labels: Vec<String> = options.iter().map(|r| r.label()).collect();
                        tracing::warn!("Unknown command '{}', expected one of {} or q", input, labels.join(", "));
                    }
                    None => {}
                }
            }
        }
    }

    let pushed = dashboard.stop().await?;
    tracing::info!("Dashboard stopped, {} demo readings pushed", pushed);
    Ok(())
}
