//! Feed Aggregation
//!
//! Turns a snapshot of readings into every view the dashboard shows:
//! sorted history, summary statistics, the three-bucket distribution, the
//! current reading with its category, and the windowed chart series.
//!
//! Everything here is synchronous and pure. Feeding the same snapshot twice
//! produces identical output.

mod distribution;
mod stats;
mod window;

pub use distribution::{
    classify, distribute, BucketRange, DistributionBucket, SpeedCategory, HIGH_SPEED_THRESHOLD,
    MEDIUM_SPEED_THRESHOLD,
};
pub use stats::{round2, summarize, Summary};
pub use window::{build_series, window, window_since, ChartSeries, TimeRange};

use serde::Serialize;

use crate::reading::{History, Reading};

/// Sort a snapshot of readings into a newest-first history
pub fn ingest<I>(snapshot: I) -> History
where
    I: IntoIterator<Item = Reading>,
{
    History::from_readings(snapshot)
}

/// The newest reading and how it classifies
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrentReading {
    /// Newest reading in the history
    pub reading: Reading,
    /// Its display category
    pub category: SpeedCategory,
}

/// Everything derived from one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedState {
    /// All readings, newest first
    pub history: History,
    /// Statistics over the whole history
    pub summary: Summary,
    /// Bucket counts in High, Medium, Low order
    pub distribution: [DistributionBucket; 3],
    /// `None` until the feed has delivered at least one reading
    pub current: Option<CurrentReading>,
    /// Range the window and series were derived for
    pub time_range: TimeRange,
    /// The most recent `time_range.count()` readings, newest first
    pub window: Vec<Reading>,
    /// Chart data for the window
    pub series: ChartSeries,
}

impl DerivedState {
    /// Derive every view from a history
    pub fn from_history(history: History, time_range: TimeRange) -> Self {
        let summary = summarize(&history);
        let distribution = distribute(&history);
        let current = history.newest().map(|reading| CurrentReading {
            reading: *reading,
            category: classify(reading.speed),
        });
        let recent = window(&history, time_range.count()).to_vec();
        let series = build_series(&recent);

        Self {
            history,
            summary,
            distribution,
            current,
            time_range,
            window: recent,
            series,
        }
    }

    /// Recompute the window and series for a different range
    ///
    /// History-wide values are left as they are.
    pub fn with_range(mut self, time_range: TimeRange) -> Self {
        if time_range == self.time_range {
            return self;
        }
        self.window = window(&self.history, time_range.count()).to_vec();
        self.series = build_series(&self.window);
        self.time_range = time_range;
        self
    }

    /// Speed of the newest reading, or 0 with no readings
    pub fn current_speed(&self) -> f64 {
        self.current.map(|c| c.reading.speed).unwrap_or(0.0)
    }
}

impl Default for DerivedState {
    fn default() -> Self {
        Self::from_history(History::default(), TimeRange::default())
    }
}

/// Reducer from snapshots to derived dashboard state
#[derive(Debug, Clone, Default)]
pub struct FeedAggregator {
    time_range: TimeRange,
}

impl FeedAggregator {
    /// Create an aggregator with an initial range selection
    pub fn new(time_range: TimeRange) -> Self {
        Self { time_range }
    }

    /// Currently selected range
    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Change the selected range
    pub fn select_range(&mut self, time_range: TimeRange) {
        self.time_range = time_range;
    }

    /// Ingest a snapshot and derive all views from it
    pub fn reduce<I>(&self, snapshot: I) -> DerivedState
    where
        I: IntoIterator<Item = Reading>,
    {
        DerivedState::from_history(ingest(snapshot), self.time_range)
    }

    /// Bring a previously derived state in line with the selected range
    pub fn rederive(&self, state: DerivedState) -> DerivedState {
        state.with_range(self.time_range)
    }
}
