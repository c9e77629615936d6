//! Speed distribution buckets and current-speed categories
//!
//! The two classifications use different rules at 30 m/s: a distribution
//! bucket treats 30 as Medium (inclusive lower bound), the current-speed
//! category treats 30 as Low (exclusive lower bound). Both agree at 60,
//! which is Medium, and anything above 60 is High. Outside the non-negative
//! range they part ways again: a bucket counts negative and NaN speeds as
//! Low while the category reports them as High.

use serde::{Deserialize, Serialize};

use crate::reading::Reading;

/// Speeds above this are High in both classifications
pub const HIGH_SPEED_THRESHOLD: f64 = 60.0;

/// Lower edge of the Medium range
pub const MEDIUM_SPEED_THRESHOLD: f64 = 30.0;

/// One of the three fixed distribution ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketRange {
    /// speed > 60
    High,
    /// 30 <= speed <= 60
    Medium,
    /// speed < 30
    Low,
}

impl BucketRange {
    /// All ranges in display order
    pub const ALL: [BucketRange; 3] = [BucketRange::High, BucketRange::Medium, BucketRange::Low];

    /// The range a speed falls into
    ///
    /// Total over every `f64`; anything below 30 (including NaN) is Low.
    pub fn for_speed(speed: f64) -> Self {
        if speed > HIGH_SPEED_THRESHOLD {
            BucketRange::High
        } else if speed >= MEDIUM_SPEED_THRESHOLD {
            BucketRange::Medium
        } else {
            BucketRange::Low
        }
    }

    /// Legend text for the pie chart
    pub fn label(&self) -> &'static str {
        match self {
            BucketRange::High => "> 60 m/s",
            BucketRange::Medium => "30-60 m/s",
            BucketRange::Low => "< 30 m/s",
        }
    }

    /// Slice color as a hex string
    pub fn color(&self) -> &'static str {
        match self {
            BucketRange::High => "#FF4444",
            BucketRange::Medium => "#FFD700",
            BucketRange::Low => "#32CD32",
        }
    }
}

/// Count of readings falling in one range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionBucket {
    /// Which range this bucket covers
    pub range: BucketRange,
    /// Number of readings in the range
    pub count: usize,
}

/// Count readings per range, in [`BucketRange::ALL`] order
///
/// Every reading lands in exactly one bucket, so the counts sum to
/// `readings.len()`.
pub fn distribute(readings: &[Reading]) -> [DistributionBucket; 3] {
    let mut buckets = BucketRange::ALL.map(|range| DistributionBucket { range, count: 0 });

    for reading in readings {
        let idx = match BucketRange::for_speed(reading.speed) {
            BucketRange::High => 0,
            BucketRange::Medium => 1,
            BucketRange::Low => 2,
        };
        buckets[idx].count += 1;
    }

    buckets
}

/// Classification of a single speed value for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedCategory {
    /// 0 to 30 m/s
    Low,
    /// Above 30 up to 60 m/s
    Medium,
    /// Above 60 m/s, or outside the valid range
    High,
}

impl SpeedCategory {
    /// Text shown under the current speed, e.g. `"Speed (Low)"`
    pub fn label(&self) -> &'static str {
        match self {
            SpeedCategory::Low => "Speed (Low)",
            SpeedCategory::Medium => "Speed (Medium)",
            SpeedCategory::High => "Speed (High)",
        }
    }

    /// Display color as a hex string
    pub fn color(&self) -> &'static str {
        match self {
            SpeedCategory::Low => "#00FF00",
            SpeedCategory::Medium => "#FFA500",
            SpeedCategory::High => "#FF0000",
        }
    }
}

/// Classify a speed: `[0, 30]` Low, `(30, 60]` Medium, anything else High
///
/// Negative speeds and NaN fall through to High along with speeds above
/// 60. Decoded feed readings are never negative or NaN.
pub fn classify(speed: f64) -> SpeedCategory {
    if (0.0..=MEDIUM_SPEED_THRESHOLD).contains(&speed) {
        SpeedCategory::Low
    } else if speed > MEDIUM_SPEED_THRESHOLD && speed <= HIGH_SPEED_THRESHOLD {
        SpeedCategory::Medium
    } else {
        SpeedCategory::High
    }
}
