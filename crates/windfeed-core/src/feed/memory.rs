//! In-memory realtime store
//!
//! Holds one JSON value per path and pushes the full value to every
//! listener on that path whenever it changes.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard, Weak};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{normalize_path, FeedEvent, FeedSource, Subscription};
use crate::error::FeedError;

struct Listener {
    id: u64,
    tx: mpsc::UnboundedSender<FeedEvent>,
}

#[derive(Default)]
struct Store {
    /// Current value per path
    values: HashMap<String, Value>,
    /// Live listeners per path
    listeners: HashMap<String, Vec<Listener>>,
    next_listener_id: u64,
}

impl Store {
    fn value(&self, path: &str) -> Value {
        self.values.get(path).cloned().unwrap_or(Value::Null)
    }

    fn broadcast(&mut self, path: &str, event: FeedEvent) {
        if let Some(listeners) = self.listeners.get_mut(path) {
            // Listeners whose receiver is gone are pruned here
            listeners.retain(|l| l.tx.send(event.clone()).is_ok());
        }
    }

    fn notify(&mut self, path: &str) {
        let snapshot = FeedEvent::Snapshot(self.value(path));
        self.broadcast(path, snapshot);
    }

    fn remove_listener(&mut self, path: &str, id: u64) {
        if let Some(listeners) = self.listeners.get_mut(path) {
            listeners.retain(|l| l.id != id);
            if listeners.is_empty() {
                self.listeners.remove(path);
            }
        }
    }
}

/// Cloneable handle to an in-process realtime store
#[derive(Clone, Default)]
pub struct MemoryFeed {
    store: Arc<RwLock<Store>>,
}

impl MemoryFeed {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current value at a path (`Value::Null` when nothing is stored)
    pub fn get(&self, path: &str) -> Result<Value, FeedError> {
        let path = normalize_path(path)?;
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        Ok(store.value(&path))
    }

    /// Replace the value at a path and notify its listeners
    pub fn set(&self, path: &str, value: Value) -> Result<(), FeedError> {
        let path = normalize_path(path)?;
        let mut store = self.store();
        if value.is_null() {
            store.values.remove(&path);
        } else {
            store.values.insert(path.clone(), value);
        }
        store.notify(&path);
        Ok(())
    }

    /// Clear a path
    pub fn remove(&self, path: &str) -> Result<(), FeedError> {
        self.set(path, Value::Null)
    }

    /// Append a record under a freshly generated key
    ///
    /// Keys are time-ordered v7 UUIDs, so sorting keys reproduces push
    /// order. Returns the new key. Fails if the path holds something other
    /// than an object of records.
    pub fn push(&self, path: &str, record: Value) -> Result<String, FeedError> {
        let path = normalize_path(path)?;
        let key = Uuid::now_v7().simple().to_string();

        let mut store = self.store();
        let entry = store
            .values
            .entry(path.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        let records = entry.as_object_mut().ok_or_else(|| {
            FeedError::InvalidSnapshot(format!("'{path}' does not hold a collection of records"))
        })?;
        records.insert(key.clone(), record);
        store.notify(&path);

        Ok(key)
    }

    /// Keep only the `max` records with the highest `timestamp` field
    ///
    /// Records without a numeric timestamp are treated as oldest. Returns
    /// the number of records removed; listeners are only notified when
    /// something was removed.
    pub fn retain_latest(&self, path: &str, max: usize) -> Result<usize, FeedError> {
        let path = normalize_path(path)?;
        let mut store = self.store();
        let Some(records) = store.values.get_mut(&path).and_then(Value::as_object_mut) else {
            return Ok(0);
        };
        if records.len() <= max {
            return Ok(0);
        }

        let mut by_age: Vec<(i64, String)> = records
            .iter()
            .map(|(key, record)| {
                let ts = record
                    .get("timestamp")
                    .and_then(Value::as_i64)
                    .unwrap_or(i64::MIN);
                (ts, key.clone())
            })
            .collect();
        by_age.sort();

        let excess = records.len() - max;
        for (_, key) in by_age.into_iter().take(excess) {
            records.remove(&key);
        }
        store.notify(&path);

        Ok(excess)
    }

    /// Report an error to every listener on a path
    pub fn fail(&self, path: &str, reason: impl Into<String>) -> Result<(), FeedError> {
        let path = normalize_path(path)?;
        self.store().broadcast(&path, FeedEvent::Error(reason.into()));
        Ok(())
    }

    /// Drop every listener; their subscriptions see the feed close
    pub fn disconnect_all(&self) {
        self.store().listeners.clear();
    }

    /// Number of live listeners on a path
    pub fn subscriber_count(&self, path: &str) -> usize {
        let Ok(path) = normalize_path(path) else {
            return 0;
        };
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        store
            .listeners
            .get(&path)
            .map(|l| l.iter().filter(|l| !l.tx.is_closed()).count())
            .unwrap_or(0)
    }
}

impl FeedSource for MemoryFeed {
    fn subscribe(&self, path: &str) -> Result<Subscription, FeedError> {
        let path = normalize_path(path)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let id = {
            let mut store = self.store();
            let id = store.next_listener_id;
            store.next_listener_id += 1;

            // Deliver the current value straight away, as a live store would
            let _ = tx.send(FeedEvent::Snapshot(store.value(&path)));
            store
                .listeners
                .entry(path.clone())
                .or_default()
                .push(Listener { id, tx });
            id
        };
        tracing::debug!("Subscribed listener {id} to '{path}'");

        let weak: Weak<RwLock<Store>> = Arc::downgrade(&self.store);
        let release_path = path.clone();
        Ok(Subscription::new(path, rx, move || {
            if let Some(store) = weak.upgrade() {
                store
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove_listener(&release_path, id);
            }
        }))
    }
}
