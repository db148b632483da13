//! Listing preferences: persistence and change notification.
//!
//! The two flags (`sort`, `size`) live in a [`PreferenceStore`]. Every write
//! is published on a broadcast channel; open listing views hold a
//! [`PreferenceSubscription`] and re-list when something arrives.

use std::collections::HashMap;
use std::sync::Mutex;

use model::{ListingPreferences, PreferenceKey};
use storage::{Database, DatabaseError};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// Capacity of the change channel. Slow subscribers skip to the newest events.
const EVENT_CAPACITY: usize = 16;

/// Errors from preference persistence.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("preference storage failed: {0}")]
    Storage(#[from] DatabaseError),
}

/// Named text values that survive restarts.
pub trait PreferenceStore {
    fn load(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    fn store(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

impl PreferenceStore for Database {
    fn load(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.get_setting(key)?)
    }

    fn store(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        Ok(self.set_setting(key, value)?)
    }
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        (**self).load(key)
    }

    fn store(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        (**self).store(key, value)
    }
}

/// In-process store for tests and `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Published after every successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceEvent {
    /// The key that was written.
    pub key: PreferenceKey,
    /// Its new value.
    pub value: bool,
    /// Full preferences after the write.
    pub snapshot: ListingPreferences,
}

/// Reads, writes and broadcasts the listing preferences.
pub struct PreferenceBridge<S: PreferenceStore> {
    store: S,
    events: broadcast::Sender<PreferenceEvent>,
}

impl<S: PreferenceStore> PreferenceBridge<S> {
    pub fn new(store: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { store, events }
    }

    /// Current value of `key`. Unset or unreadable keys use the default.
    pub fn get(&self, key: PreferenceKey) -> bool {
        match self.store.load(key.as_str()) {
            Ok(Some(raw)) => PreferenceKey::decode(&raw),
            Ok(None) => key.default_value(),
            Err(e) => {
                tracing::warn!("Failed to read preference {}: {}", key, e);
                key.default_value()
            }
        }
    }

    /// Persist `value` for `key` and notify subscribers.
    pub fn set(&self, key: PreferenceKey, value: bool) -> Result<(), PreferenceError> {
        self.store.store(key.as_str(), PreferenceKey::encode(value))?;
        tracing::info!("Preference {} set to {}", key, value);

        let event = PreferenceEvent {
            key,
            value,
            snapshot: self.snapshot(),
        };
        // No subscribers is fine.
        let _ = self.events.send(event);
        Ok(())
    }

    /// Flip `key` and return its new value.
    pub fn toggle(&self, key: PreferenceKey) -> Result<bool, PreferenceError> {
        let value = !self.get(key);
        self.set(key, value)?;
        Ok(value)
    }

    /// Write defaults for keys that have never been stored.
    pub fn ensure_defaults(&self) -> Result<(), PreferenceError> {
        for key in PreferenceKey::ALL {
            if self.store.load(key.as_str())?.is_none() {
                self.store
                    .store(key.as_str(), PreferenceKey::encode(key.default_value()))?;
            }
        }
        Ok(())
    }

    /// Both flags as a listing configuration.
    pub fn snapshot(&self) -> ListingPreferences {
        ListingPreferences::from_flags(self.get(PreferenceKey::Sort), self.get(PreferenceKey::Size))
    }

    /// Register a new listener.
    pub fn subscribe(&self) -> PreferenceSubscription {
        PreferenceSubscription {
            receiver: self.events.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

/// A listener's end of the change channel. Polled without blocking.
pub struct PreferenceSubscription {
    receiver: broadcast::Receiver<PreferenceEvent>,
}

impl PreferenceSubscription {
    /// Drain pending events and return the newest snapshot, if any arrived.
    pub fn latest(&mut self) -> Option<ListingPreferences> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(event) => latest = Some(event.snapshot),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!("Preference subscriber skipped {} events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        latest
    }
}
