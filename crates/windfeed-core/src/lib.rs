//! # WindFeed Core Library
//!
//! Core functionality for the WindFeed wind-speed dashboard.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//!
//! This library provides:
//! - Snapshot decoding for realtime wind-speed feeds
//! - Aggregation: sorted history, summary statistics, speed distribution,
//!   current-speed classification, and windowed chart series
//! - An owned, scoped subscription model and an in-memory realtime store
//! - A feed monitor that republishes derived state on every change
//! - View models for the dashboard tabs
//! - A gusting-wind simulator for demo mode
//!
//! ## Example
//!
//! ```rust,ignore
//! use windfeed_core::prelude::*;
//!
//! let feed = MemoryFeed::new();
//! let monitor = FeedMonitor::new(FeedAggregator::default(), RecordPolicy::Skip)
//!     .attach(&feed, "windSpeed")?;
//!
//! feed.push("windSpeed", serde_json::json!({ "speed": 12.4, "timestamp": 1 }))?;
//!
//! let state = monitor.current();
//! println!("Avg: {:.2} m/s", state.summary.avg);
//! ```

pub mod aggregate;
pub mod config;
pub mod demo;
pub mod error;
pub mod feed;
pub mod monitor;
pub mod reading;
pub mod views;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::aggregate::{
        build_series, classify, distribute, ingest, summarize, window, ChartSeries,
        DerivedState, DistributionBucket, FeedAggregator, SpeedCategory, Summary, TimeRange,
    };
    pub use crate::config::{DashboardConfig, DemoSettings};
    pub use crate::demo::WindSimulator;
    pub use crate::error::FeedError;
    pub use crate::feed::{FeedEvent, FeedSource, MemoryFeed, Subscription};
    pub use crate::monitor::{FeedMonitor, MonitorHandle, MonitorStatus};
    pub use crate::reading::{History, Reading, RecordPolicy};
    pub use crate::views::{HistoryView, WindView};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
