//! Feed Monitor
//!
//! Owns one subscription for the lifetime of a view, reduces every snapshot
//! into [`DerivedState`], and publishes the result through a `watch`
//! channel so views always see a complete state.
//!
//! Feed errors are logged and counted; the last good state stays published.
//! The subscription is released when the monitor stops for any reason:
//! shutdown, cancellation, the feed closing, or the handle being dropped.

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::aggregate::{DerivedState, FeedAggregator, TimeRange};
use crate::error::FeedError;
use crate::feed::{FeedEvent, FeedSource, Subscription};
use crate::reading::{decode_snapshot, RecordPolicy};

/// Counters describing the health of a monitored feed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorStatus {
    /// Snapshots successfully reduced
    pub snapshots: u64,
    /// Records dropped under [`RecordPolicy::Skip`]
    pub skipped_records: u64,
    /// Feed errors and rejected snapshots
    pub error_count: u64,
    /// Message of the most recent error
    pub last_error: Option<String>,
    /// The feed closed the subscription
    pub closed: bool,
}

impl MonitorStatus {
    fn record_error(&mut self, err: &FeedError) {
        self.error_count += 1;
        self.last_error = Some(err.to_string());
    }
}

/// Applies feed events to derived state
pub struct FeedMonitor {
    aggregator: FeedAggregator,
    policy: RecordPolicy,
    state: DerivedState,
    status: MonitorStatus,
}

impl FeedMonitor {
    /// Create a monitor with an empty state
    pub fn new(aggregator: FeedAggregator, policy: RecordPolicy) -> Self {
        let state = DerivedState::from_history(Default::default(), aggregator.time_range());
        Self {
            aggregator,
            policy,
            state,
            status: MonitorStatus::default(),
        }
    }

    /// Latest derived state
    pub fn state(&self) -> &DerivedState {
        &self.state
    }

    /// Counters so far
    pub fn status(&self) -> &MonitorStatus {
        &self.status
    }

    /// Apply one event; returns `true` when the derived state changed
    pub fn handle_event(&mut self, event: FeedEvent) -> bool {
        match event {
            FeedEvent::Snapshot(value) => match decode_snapshot(&value, self.policy) {
                Ok(decoded) => {
                    self.status.snapshots += 1;
                    self.status.skipped_records += decoded.skipped.len() as u64;
                    self.state = self.aggregator.reduce(decoded.readings);
                    tracing::debug!(
                        "Reduced snapshot: {} readings, {} skipped",
                        self.state.history.len(),
                        decoded.skipped.len()
                    );
                    true
                }
                Err(err) => {
                    tracing::error!("Discarding snapshot, keeping last known state: {err}");
                    self.status.record_error(&err);
                    false
                }
            },
            FeedEvent::Error(reason) => {
                let err = FeedError::Unavailable(reason);
                tracing::error!("{err}");
                self.status.record_error(&err);
                false
            }
        }
    }

    /// Change the selected range; returns `true` when the state changed
    pub fn select_range(&mut self, time_range: TimeRange) -> bool {
        if time_range == self.aggregator.time_range() {
            return false;
        }
        self.aggregator.select_range(time_range);
        self.state = self.aggregator.rederive(std::mem::take(&mut self.state));
        true
    }

    /// Subscribe to `path` on `source` and start monitoring it
    pub fn attach(
        self,
        source: &dyn FeedSource,
        path: &str,
    ) -> Result<MonitorHandle, FeedError> {
        let subscription = source.subscribe(path)?;
        Ok(self.spawn(subscription))
    }

    /// Run the monitor on its own task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self, subscription: Subscription) -> MonitorHandle {
        let (state_tx, state_rx) = watch::channel(self.state.clone());
        let (status_tx, status_rx) = watch::channel(self.status.clone());
        let (range_tx, range_rx) = watch::channel(self.aggregator.time_range());
        let token = CancellationToken::new();

        let task = tokio::spawn(self.run(
            subscription,
            state_tx,
            status_tx,
            range_rx,
            token.clone(),
        ));

        MonitorHandle {
            state: state_rx,
            status: status_rx,
            range: range_tx,
            token,
            task,
        }
    }

    async fn run(
        mut self,
        mut subscription: Subscription,
        state_tx: watch::Sender<DerivedState>,
        status_tx: watch::Sender<MonitorStatus>,
        mut range_rx: watch::Receiver<TimeRange>,
        token: CancellationToken,
    ) {
        tracing::info!("Monitoring feed '{}'", subscription.path());

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                changed = range_rx.changed() => {
                    // Handle dropped: the view is gone
                    if changed.is_err() {
                        break;
                    }
                    let range = *range_rx.borrow_and_update();
                    if self.select_range(range) {
                        state_tx.send_replace(self.state.clone());
                    }
                }
                event = subscription.next() => {
                    let Some(event) = event else {
                        tracing::warn!("Feed closed subscription to '{}'", subscription.path());
                        self.status.closed = true;
                        status_tx.send_replace(self.status.clone());
                        break;
                    };
                    if self.handle_event(event) {
                        state_tx.send_replace(self.state.clone());
                    }
                    status_tx.send_replace(self.status.clone());
                }
            }
        }

        tracing::info!("Stopped monitoring feed '{}'", subscription.path());
        subscription.release();
    }
}

/// Handle to a running monitor
///
/// Dropping the handle stops the monitor and releases its subscription.
pub struct MonitorHandle {
    state: watch::Receiver<DerivedState>,
    status: watch::Receiver<MonitorStatus>,
    range: watch::Sender<TimeRange>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// A receiver that observes every published state
    pub fn subscribe_state(&self) -> watch::Receiver<DerivedState> {
        self.state.clone()
    }

    /// Copy of the latest published state
    pub fn current(&self) -> DerivedState {
        self.state.borrow().clone()
    }

    /// Copy of the latest status
    pub fn status(&self) -> MonitorStatus {
        self.status.borrow().clone()
    }

    /// A receiver that observes every status update
    pub fn subscribe_status(&self) -> watch::Receiver<MonitorStatus> {
        self.status.clone()
    }

    /// Select a different look-back range
    pub fn select_range(&self, time_range: TimeRange) {
        self.range.send_replace(time_range);
    }

    /// Whether the monitor task has stopped
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the monitor and wait for it to release its subscription
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Monitor task failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn monitor(policy: RecordPolicy) -> FeedMonitor {
        FeedMonitor::new(FeedAggregator::default(), policy)
    }

    #[test]
    fn test_snapshot_replaces_state() {
        let mut m = monitor(RecordPolicy::Skip);
        assert!(m.handle_event(FeedEvent::Snapshot(json!({
            "a": { "speed": 10.0, "timestamp": 1 },
            "b": { "speed": 20.0, "timestamp": 2 },
        }))));
        assert_eq!(m.state().history.len(), 2);
        assert_eq!(m.state().current_speed(), 20.0);

        assert!(m.handle_event(FeedEvent::Snapshot(json!(null))));
        assert!(m.state().history.is_empty());
        assert_eq!(m.status().snapshots, 2);
    }

    #[test]
    fn test_feed_error_keeps_last_state() {
        let mut m = monitor(RecordPolicy::Skip);
        m.handle_event(FeedEvent::Snapshot(json!({ "a": { "speed": 10.0, "timestamp": 1 } })));
        let before = m.state().clone();

        assert!(!m.handle_event(FeedEvent::Error("permission denied".into())));
        assert_eq!(m.state(), &before);
        assert_eq!(m.status().error_count, 1);
        assert_eq!(
            m.status().last_error.as_deref(),
            Some("Feed unavailable: permission denied")
        );
    }

    #[test]
    fn test_rejected_snapshot_keeps_last_state() {
        let mut m = monitor(RecordPolicy::Reject);
        m.handle_event(FeedEvent::Snapshot(json!({ "a": { "speed": 10.0, "timestamp": 1 } })));
        assert!(!m.handle_event(FeedEvent::Snapshot(json!({ "a": { "speed": 10.0 } }))));
        assert_eq!(m.state().history.len(), 1);
        assert_eq!(m.status().error_count, 1);
    }

    #[test]
    fn test_select_same_range_is_noop() {
        let mut m = monitor(RecordPolicy::Skip);
        assert!(!m.select_range(TimeRange::default()));
        assert!(m.select_range(TimeRange::new(12).unwrap()));
        assert_eq!(m.state().time_range.hours(), 12);
    }
}
