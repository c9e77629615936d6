//! Demo Mode - Simulated wind feed for testing
//!
//! Generates plausible wind-speed readings without a live data store.
//! Simulates a steady breeze around 18 m/s with random gusts that build,
//! peak and ease off again.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::DemoSettings;
use crate::error::FeedError;
use crate::feed::MemoryFeed;
use crate::reading::Reading;

const BASELINE_SPEED: f64 = 18.0;
const BUILD_MS: u64 = 4_000;
const PEAK_MS: u64 = 3_000;
const EASE_MS: u64 = 6_000;

/// Wind simulator producing gusting speeds
pub struct WindSimulator {
    /// Time when simulation started (ms)
    start_time_ms: Option<u64>,
    /// Time of next gust (ms from start)
    next_gust_at_ms: u64,
    gust_state: GustState,
    /// Peak speed of the current gust
    gust_peak: f64,
    rng: StdRng,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GustState {
    /// Steady breeze
    Calm,
    /// Speed rising towards the gust peak
    Building { start_ms: u64 },
    /// Holding near the peak
    Peak { start_ms: u64 },
    /// Speed falling back to the baseline
    Easing { start_ms: u64 },
}

impl Default for WindSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl WindSimulator {
    /// Create a simulator seeded from entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a reproducible simulator
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let first_gust = rng.gen_range(10_000..30_000);
        Self {
            start_time_ms: None,
            next_gust_at_ms: first_gust,
            gust_state: GustState::Calm,
            gust_peak: BASELINE_SPEED,
            rng,
        }
    }

    /// Produce the wind speed at `elapsed_ms`
    ///
    /// The first call fixes the simulation start. Speeds are never negative.
    pub fn sample(&mut self, elapsed_ms: u64) -> f64 {
        let start = *self.start_time_ms.get_or_insert(elapsed_ms);
        let sim_time = elapsed_ms.saturating_sub(start);

        self.update_gust_state(sim_time);

        let t = sim_time as f64 / 1000.0;
        let turbulence = 2.5 * (t * 0.9).sin() + 1.2 * (t * 3.1).sin();
        let jitter = self.rng.gen_range(-1.0..1.0);

        (self.target_speed(sim_time) + turbulence + jitter).max(0.0)
    }

    /// Produce a reading stamped with `timestamp`
    pub fn reading(&mut self, elapsed_ms: u64, timestamp: i64) -> Reading {
        Reading::new(self.sample(elapsed_ms), timestamp)
    }

    fn update_gust_state(&mut self, sim_time: u64) {
        match self.gust_state {
            GustState::Calm => {
                if sim_time >= self.next_gust_at_ms {
                    // Occasionally a gust pushes into the High band
                    self.gust_peak = self.rng.gen_range(35.0..75.0);
                    self.gust_state = GustState::Building { start_ms: sim_time };
                }
            }
            GustState::Building { start_ms } => {
                if sim_time >= start_ms + BUILD_MS {
                    self.gust_state = GustState::Peak { start_ms: sim_time };
                }
            }
            GustState::Peak { start_ms } => {
                if sim_time >= start_ms + PEAK_MS {
                    self.gust_state = GustState::Easing { start_ms: sim_time };
                }
            }
            GustState::Easing { start_ms } => {
                if sim_time >= start_ms + EASE_MS {
                    self.gust_state = GustState::Calm;
                    self.next_gust_at_ms = sim_time + self.rng.gen_range(10_000..30_000);
                }
            }
        }
    }

    fn target_speed(&self, sim_time: u64) -> f64 {
        match self.gust_state {
            GustState::Calm => BASELINE_SPEED,
            GustState::Building { start_ms } => {
                let progress = (sim_time.saturating_sub(start_ms) as f64 / BUILD_MS as f64).min(1.0);
                BASELINE_SPEED + (self.gust_peak - BASELINE_SPEED) * progress
            }
            GustState::Peak { .. } => self.gust_peak,
            GustState::Easing { start_ms } => {
                let progress = (sim_time.saturating_sub(start_ms) as f64 / EASE_MS as f64).min(1.0);
                self.gust_peak + (BASELINE_SPEED - self.gust_peak) * progress
            }
        }
    }
}

/// Push simulated readings into `feed` at `path` until cancelled
///
/// Readings are stamped with the current epoch time in milliseconds. When
/// `settings.max_readings` is set, older records are trimmed after every
/// push. Returns the number of readings pushed.
pub async fn run_demo_feed(
    feed: MemoryFeed,
    path: String,
    settings: DemoSettings,
    token: CancellationToken,
) -> Result<u64, FeedError> {
    let mut sim = match settings.seed {
        Some(seed) => WindSimulator::with_seed(seed),
        None => WindSimulator::new(),
    };
    let mut ticker = tokio::time::interval(Duration::from_millis(settings.interval_ms.max(1)));
    let started = tokio::time::Instant::now();
    let mut pushed = 0u64;

    tracing::info!(
        "Demo feed writing to '{}' every {} ms",
        path,
        settings.interval_ms
    );

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let reading = sim.reading(elapsed_ms, Utc::now().timestamp_millis());
                feed.push(&path, json!({
                    "speed": reading.speed,
                    "timestamp": reading.timestamp,
                }))?;
                pushed += 1;

                if let Some(max) = settings.max_readings {
                    feed.retain_latest(&path, max)?;
                }
            }
        }
    }

    tracing::info!("Demo feed stopped after {pushed} readings");
    Ok(pushed)
}
