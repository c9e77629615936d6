//! Dashboard view models
//!
//! Presentation-ready values for the two dashboard tabs. Views are built
//! from a [`DerivedState`] and hold no references back into it, so they can
//! be serialized and handed to any renderer.

use serde::Serialize;

use crate::aggregate::{ChartSeries, DerivedState, TimeRange};

/// Chart title on the history tab
pub const DISTRIBUTION_TITLE: &str = "Wind Speed Distribution";

/// Shown in place of the line chart before any reading arrives
/// Shown in place of the chart until the window has readings
pub const LOADING_TEXT: &str = "Loading data...";

/// One slice of the distribution pie chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    /// Legend text, e.g. `"> 60 m/s"`
    pub name: &'static str,
    /// Readings in the bucket
    pub count: usize,
    /// Slice color
    pub color: &'static str,
}

/// One of the avg/max/min tiles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatTile {
    /// e.g. `"Avg Speed (m/s)"`
    pub label: &'static str,
    /// Formatted value, `"0"` when there is no data
    pub value: String,
    /// Tile color
    pub color: &'static str,
}

/// The "History" tab: distribution and summary statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    /// Chart heading
    pub title: &'static str,
    /// One slice per distribution bucket
    pub slices: Vec<PieSlice>,
    /// Avg, max and min tiles
    pub stats: Vec<StatTile>,
}

impl HistoryView {
    /// Build the view from derived state
    pub fn from_state(state: &DerivedState) -> Self {
        let slices = state
            .distribution
            .iter()
            .map(|bucket| PieSlice {
                name: bucket.range.label(),
                count: bucket.count,
                color: bucket.range.color(),
            })
            .collect();

        let empty = state.history.is_empty();
        let summary = state.summary;
        let stats = vec![
            StatTile {
                label: "Avg Speed (m/s)",
                value: format_stat(summary.avg, empty),
                color: "#007BFF",
            },
            StatTile {
                label: "Max Speed (m/s)",
                value: format_stat(summary.max, empty),
                color: "#DC3545",
            },
            StatTile {
                label: "Min Speed (m/s)",
                value: format_stat(summary.min, empty),
                color: "#28A745",
            },
        ];

        Self {
            title: DISTRIBUTION_TITLE,
            slices,
            stats,
        }
    }
}

/// Stats show a bare "0" until there is data
fn format_stat(value: f64, empty: bool) -> String {
    if empty {
        "0".to_string()
    } else {
        format!("{:.2}", value)
    }
}

/// A button in the range selector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeOption {
    /// Button text, e.g. `"12h"`
    pub label: String,
    /// Range selected by the button
    pub range: TimeRange,
    /// Whether this is the selected range
    pub active: bool,
}

/// The "Wind Dashboard" tab: current reading, range selector and line chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindView {
    /// e.g. `"12.40 m/s"`
    pub current_speed: String,
    /// Label of the current speed category
    pub category_label: &'static str,
    /// Color of the current speed category
    pub category_color: &'static str,
    /// Range selector buttons
    pub range_options: Vec<RangeOption>,
    /// e.g. `"WINDSPEED (Last 6 hours)"`
    pub chart_title: String,
    /// `None` while the window is empty
    pub chart: Option<ChartSeries>,
}

impl WindView {
    /// Build the view; `options` are the ranges offered by the selector
    pub fn from_state(state: &DerivedState, options: &[TimeRange]) -> Self {
        let speed = state.current_speed();
        // Before the first reading the category reflects a speed of 0
        let category = state
            .current
            .map(|c| c.category)
            .unwrap_or_else(|| crate::aggregate::classify(speed));

        let range_options = options
            .iter()
            .map(|&range| RangeOption {
                label: range.label(),
                range,
                active: range == state.time_range,
            })
            .collect();

        let chart = (!state.window.is_empty()).then(|| state.series.clone());

        Self {
            current_speed: format!("{:.2} m/s", speed),
            category_label: category.label(),
            category_color: category.color(),
            range_options,
            chart_title: format!("WINDSPEED (Last {} hours)", state.time_range.hours()),
            chart,
        }
    }

    /// Text for the chart area
    pub fn chart_placeholder(&self) -> Option<&'static str> {
        self.chart.is_none().then_some(LOADING_TEXT)
    }
}
