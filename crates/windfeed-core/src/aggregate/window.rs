//! Recent-reading windows and chart series

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::reading::Reading;

/// Look-back size selected on the wind chart
///
/// Shown to users as hours ("6h", "12h", "24h") but it selects a number of
/// readings, not an elapsed time. Always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TimeRange(u32);

impl TimeRange {
    /// The range options offered by default
    pub const DEFAULT_OPTIONS: [TimeRange; 3] = [TimeRange(6), TimeRange(12), TimeRange(24)];

    /// Create a range; returns `None` for zero
    pub fn new(count: u32) -> Option<Self> {
        (count > 0).then_some(Self(count))
    }

    /// Number of readings this range selects
    pub fn count(&self) -> usize {
        self.0 as usize
    }

    /// The nominal hours shown on the selector button
    pub fn hours(&self) -> u32 {
        self.0
    }

    /// Short label, e.g. `"6h"`
    pub fn label(&self) -> String {
        format!("{}h", self.0)
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange(6)
    }
}

impl TryFrom<u32> for TimeRange {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        TimeRange::new(value).ok_or_else(|| "time range must be greater than zero".to_string())
    }
}

impl From<TimeRange> for u32 {
    fn from(range: TimeRange) -> u32 {
        range.0
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.0)
    }
}

/// The most recent `count` readings of a newest-first history
///
/// Returns the whole history when it is shorter than `count`.
pub fn window(history: &[Reading], count: usize) -> &[Reading] {
    &history[..count.min(history.len())]
}

/// Readings of a newest-first history with `timestamp >= cutoff`
///
/// This is a true elapsed-time window and is never used in place of
/// [`window`]; callers opt into it explicitly.
pub fn window_since(history: &[Reading], cutoff: i64) -> &[Reading] {
    let end = history.partition_point(|r| r.timestamp >= cutoff);
    &history[..end]
}

/// Chart-ready data for a line chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// 1-based positions, not timestamps
    pub labels: Vec<usize>,
    /// Speeds, newest first
    pub values: Vec<f64>,
    /// Y-axis tick spacing; never zero
    pub y_axis_step: u64,
}

/// Build a chart series from a window of readings
///
/// The axis step is `ceil(max / 5)`, or 1 when no speed is positive. Steps
/// beyond `u64::MAX` (speeds above roughly 9.2e19) are clamped to it.
pub fn build_series(window: &[Reading]) -> ChartSeries {
    let labels = (1..=window.len()).collect();
    let values: Vec<f64> = window.iter().map(|r| r.speed).collect();

    let max = values.iter().copied().fold(0.0_f64, f64::max);
    let y_axis_step = if max > 0.0 {
        axis_step(max)
    } else {
        1
    };

    ChartSeries {
        labels,
        values,
        y_axis_step,
    }
}

fn axis_step(max: f64) -> u64 {
    let step = (max / 5.0).ceil();
    if step >= u64::MAX as f64 {
        u64::MAX
    } else {
        step as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(len: usize) -> Vec<Reading> {
        (0..len)
            .rev()
            .map(|i| Reading::new(i as f64, i as i64 * 100))
            .collect()
    }

    #[test]
    fn test_time_range_rejects_zero() {
        assert!(TimeRange::new(0).is_none());
        assert_eq!(TimeRange::new(12).unwrap().count(), 12);
        assert_eq!(TimeRange::default().label(), "6h");
    }

    #[test]
    fn test_time_range_serde() {
        let range: TimeRange = serde_json::from_str("24").unwrap();
        assert_eq!(range.hours(), 24);
        assert!(serde_json::from_str::<TimeRange>("0").is_err());
        assert_eq!(serde_json::to_string(&range).unwrap(), "24");
    }

    #[test]
    fn test_window_zero_count_is_empty() {
        assert!(window(&history(4), 0).is_empty());
    }

    #[test]
    fn test_window_since_uses_timestamps() {
        let h = history(10); // timestamps 900, 800, ..., 0
        let recent = window_since(&h, 650);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[2].timestamp, 700);
        assert!(window_since(&h, 1000).is_empty());
        assert_eq!(window_since(&h, 0).len(), 10);
    }

    #[test]
    fn test_series_labels_are_positions() {
        let series = build_series(&history(3));
        assert_eq!(series.labels, vec![1, 2, 3]);
        assert_eq!(series.values, vec![2.0, 1.0, 0.0]);
        assert_eq!(series.y_axis_step, 1);
    }

    #[test]
    fn test_series_axis_step() {
        let window = [Reading::new(47.0, 2), Reading::new(12.0, 1)];
        assert_eq!(build_series(&window).y_axis_step, 10);
        assert_eq!(build_series(&[]).y_axis_step, 1);
    }

    #[test]
    fn test_series_axis_step_for_large_speeds() {
        let window = [Reading::new(3.0e10, 1)];
        assert_eq!(build_series(&window).y_axis_step, 6_000_000_000);

        let window = [Reading::new(f64::MAX, 1)];
        assert_eq!(build_series(&window).y_axis_step, u64::MAX);
    }
}
