use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use windfeed_core::prelude::*;

const PATH: &str = "windSpeed";
const WAIT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("windfeed_core=debug")
        .with_test_writer()
        .try_init();
}

fn attach(feed: &MemoryFeed, policy: RecordPolicy) -> MonitorHandle {
    FeedMonitor::new(FeedAggregator::default(), policy)
        .attach(feed, PATH)
        .unwrap()
}

async fn wait_for<T, F>(rx: &mut watch::Receiver<T>, pred: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for monitor")
        .expect("monitor stopped")
        .clone()
}

async fn wait_until_released(feed: &MemoryFeed) {
    timeout(WAIT, async {
        while feed.subscriber_count(PATH) > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("subscription was not released");
}

#[tokio::test]
async fn test_monitor_reduces_pushed_readings() {
    let feed = MemoryFeed::new();
    let monitor = attach(&feed, RecordPolicy::Skip);
    let mut states = monitor.subscribe_state();

    feed.push(PATH, json!({ "speed": 20.0, "timestamp": 2 })).unwrap();
    feed.push(PATH, json!({ "speed": 10.0, "timestamp": 1 })).unwrap();
    feed.push(PATH, json!({ "speed": 30.0, "timestamp": 3 })).unwrap();

    let state = wait_for(&mut states, |s| s.history.len() == 3).await;
    assert_eq!(state.summary.avg, 20.0);
    assert_eq!(state.current_speed(), 30.0);
    assert_eq!(
        state.history.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
        vec![3, 2, 1]
    );

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_existing_data_delivered_on_attach() {
    let feed = MemoryFeed::new();
    feed.set(
        PATH,
        json!({
            "a": { "speed": 44.0, "timestamp": 10 },
            "b": { "speed": 12.0, "timestamp": 11 },
        }),
    )
    .unwrap();

    let monitor = attach(&feed, RecordPolicy::Skip);
    let mut states = monitor.subscribe_state();
    let state = wait_for(&mut states, |s| s.history.len() == 2).await;
    assert_eq!(state.current.unwrap().category, SpeedCategory::Low);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_feed_error_keeps_last_known_state() {
    init_tracing();
    let feed = MemoryFeed::new();
    let monitor = attach(&feed, RecordPolicy::Skip);
    let mut states = monitor.subscribe_state();
    let mut status = monitor.subscribe_status();

    feed.push(PATH, json!({ "speed": 5.0, "timestamp": 1 })).unwrap();
    let before = wait_for(&mut states, |s| s.history.len() == 1).await;

    feed.fail(PATH, "permission denied").unwrap();
    let status = wait_for(&mut status, |s| s.error_count == 1).await;
    assert_eq!(
        status.last_error.as_deref(),
        Some("Feed unavailable: permission denied")
    );
    assert_eq!(monitor.current(), before);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_skipped_records_are_counted() {
    init_tracing();
    let feed = MemoryFeed::new();
    let monitor = attach(&feed, RecordPolicy::Skip);
    let mut status = monitor.subscribe_status();

    feed.set(
        PATH,
        json!({
            "good": { "speed": 5.0, "timestamp": 1 },
            "bad": { "speed": 5.0 },
        }),
    )
    .unwrap();

    let status = wait_for(&mut status, |s| s.skipped_records == 1).await;
    assert_eq!(status.error_count, 0);
    assert_eq!(monitor.current().history.len(), 1);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_range_change_rederives_window() {
    let feed = MemoryFeed::new();
    let records: serde_json::Map<String, serde_json::Value> = (0..30)
        .map(|i| (format!("k{i:02}"), json!({ "speed": i as f64, "timestamp": i })))
        .collect();
    feed.set(PATH, serde_json::Value::Object(records)).unwrap();

    let monitor = attach(&feed, RecordPolicy::Skip);
    let mut states = monitor.subscribe_state();
    let state = wait_for(&mut states, |s| s.history.len() == 30).await;
    assert_eq!(state.window.len(), 6);

    monitor.select_range(TimeRange::new(24).unwrap());
    let state = wait_for(&mut states, |s| s.time_range.hours() == 24).await;
    assert_eq!(state.window.len(), 24);
    assert_eq!(state.window[0].timestamp, 29);
    assert_eq!(state.series.labels.last(), Some(&24));

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_releases_subscription() {
    let feed = MemoryFeed::new();
    let monitor = attach(&feed, RecordPolicy::Skip);
    assert_eq!(feed.subscriber_count(PATH), 1);

    monitor.shutdown().await;
    assert_eq!(feed.subscriber_count(PATH), 0);
}

#[tokio::test]
async fn test_dropping_handle_releases_subscription() {
    let feed = MemoryFeed::new();
    let monitor = attach(&feed, RecordPolicy::Skip);
    assert_eq!(feed.subscriber_count(PATH), 1);

    drop(monitor);
    wait_until_released(&feed).await;
}

#[tokio::test]
async fn test_feed_disconnect_stops_monitor() {
    let feed = MemoryFeed::new();
    let monitor = attach(&feed, RecordPolicy::Skip);
    let mut status = monitor.subscribe_status();

    feed.disconnect_all();
    let status = wait_for(&mut status, |s| s.closed).await;
    assert!(status.closed);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_attach_rejects_empty_path() {
    let feed = MemoryFeed::new();
    let result = FeedMonitor::new(FeedAggregator::default(), RecordPolicy::Skip).attach(&feed, " / ");
    assert!(matches!(result, Err(FeedError::InvalidPath(_))));
}
