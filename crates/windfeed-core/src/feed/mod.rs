//! Realtime Feed
//!
//! Subscription transport for snapshot feeds. A subscriber receives the full
//! value at a path once on subscribe and again every time it changes.
//!
//! A [`Subscription`] is an owned handle: the listener is unregistered when
//! the handle is released or dropped, whichever happens first.

mod memory;

pub use memory::MemoryFeed;

use serde_json::Value;
use std::fmt;
use tokio::sync::mpsc;

use crate::error::FeedError;

/// Event delivered to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Full value at the subscribed path (`Value::Null` when empty)
    Snapshot(Value),
    /// The feed reported an error for this path
    Error(String),
}

/// A source of realtime snapshot feeds
pub trait FeedSource: Send + Sync {
    /// Start listening to a path
    fn subscribe(&self, path: &str) -> Result<Subscription, FeedError>;
}

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Live subscription to one feed path
pub struct Subscription {
    path: String,
    events: mpsc::UnboundedReceiver<FeedEvent>,
    release: Option<ReleaseFn>,
}

impl Subscription {
    /// Wrap an event receiver; `release` runs exactly once when the
    /// subscription ends
    pub fn new<F>(
        path: impl Into<String>,
        events: mpsc::UnboundedReceiver<FeedEvent>,
        release: F,
    ) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            path: path.into(),
            events,
            release: Some(Box::new(release)),
        }
    }

    /// Path this subscription listens to
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wait for the next event
    ///
    /// Returns `None` once the feed has closed the subscription or it has
    /// been released.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        self.events.recv().await
    }

    /// Take the next event if one is already queued
    pub fn try_next(&mut self) -> Option<FeedEvent> {
        self.events.try_recv().ok()
    }

    /// Whether the listener is still registered
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Stop listening
    pub fn release(mut self) {
        self.release_listener();
    }

    fn release_listener(&mut self) {
        if let Some(release) = self.release.take() {
            release();
            self.events.close();
            tracing::debug!("Released subscription to '{}'", self.path);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_listener();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Normalize a feed path, trimming whitespace and surrounding slashes
pub fn normalize_path(path: &str) -> Result<String, FeedError> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(FeedError::InvalidPath(path.to_string()));
    }
    Ok(trimmed.to_string())
}
