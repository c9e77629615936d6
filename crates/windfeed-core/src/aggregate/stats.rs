//! Summary statistics

use serde::{Deserialize, Serialize};

use crate::reading::Reading;

/// Average, maximum and minimum speed, rounded to 2 decimals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Mean speed
    pub avg: f64,
    /// Highest speed
    pub max: f64,
    /// Lowest speed
    pub min: f64,
}

/// Compute summary statistics over a set of readings
///
/// An empty set yields all zeros rather than NaN or infinities.
pub fn summarize(readings: &[Reading]) -> Summary {
    if readings.is_empty() {
        return Summary::default();
    }

    // Each speed is scaled before summing so the mean of huge speeds stays finite
    let n = readings.len() as f64;
    let (mean, max, min) = readings.iter().fold(
        (0.0, f64::NEG_INFINITY, f64::INFINITY),
        |(mean, max, min), r| (mean + r.speed / n, max.max(r.speed), min.min(r.speed)),
    );

    Summary {
        avg: round2(mean),
        max: round2(max),
        min: round2(min),
    }
}

/// Round half away from zero to 2 decimal places
///
/// For the non-negative speeds the feed carries this is half-up rounding.
/// Values too large to scale by 100 have no fractional digits left and are
/// returned unchanged.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}
