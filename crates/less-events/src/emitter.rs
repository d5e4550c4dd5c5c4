//! EventEmitter<T>: named, synchronous pub/sub.
//!
//! Listeners are stored per event name as `Listener<T>` handles, so snapshots
//! are just ref-count bumps. Snapshot-on-emit semantics mean:
//!   - A listener removed *during* emission is still called in that round.
//!   - A listener added *during* emission is NOT called until the next emit.
//!   - A fired `once` listener is pruned when the snapshot is taken, before
//!     any callback runs, so neither a failing callback nor a nested emit of
//!     the same name can bring it back or fire it twice.
//!
//! Listener failures (`Err` returns, and panics when
//! [`EmitterConfig::catch_panics`] is set) are isolated: the remaining
//! listeners still run and every failure is reported in one
//! [`EmitError::ListenersFailed`].
//!
//! All methods take `&self` (interior mutability via `parking_lot::Mutex`).
//! The lock is never held during callbacks, so listeners may call `on()`,
//! `remove()`, `emit()` and friends reentrantly.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use crate::config::EmitterConfig;
use crate::error::{EmitError, ListenerFailure, Result};
use crate::listener::{invoke, Listener, ListenerId};

struct ListenerRecord<T> {
    id: ListenerId,
    listener: Listener<T>,
    once: bool,
}

impl<T> Clone for ListenerRecord<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: self.listener.clone(),
            once: self.once,
        }
    }
}

/// Named event emitter.
///
/// `T` is the argument type; an emission forwards a `&[T]` to every listener.
/// It defaults to `serde_json::Value` so listeners of arbitrary arity and
/// mixed argument types can share one emitter.
pub struct EventEmitter<T = Value> {
    events: Mutex<HashMap<String, Vec<ListenerRecord<T>>>>,
    next_id: AtomicU64,
    config: EmitterConfig,
}

impl<T> EventEmitter<T> {
    /// Create a new, empty emitter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Append `listener` to the end of `event`'s sequence and return its
    /// registration handle. Registering the same listener twice yields two
    /// independent records.
    pub fn register(
        &self,
        event: &str,
        listener: impl Into<Listener<T>>,
        once: bool,
    ) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let count = {
            let mut events = self.events.lock();
            let records = events.entry(event.to_string()).or_default();
            records.push(ListenerRecord {
                id,
                listener: listener.into(),
                once,
            });
            records.len()
        };

        tracing::trace!(event_name = event, listener_id = id, once, "listener registered");
        if let Some(threshold) = self.config.leak_warning_threshold {
            if threshold.checked_add(1) == Some(count) {
                tracing::warn!(
                    event_name = event,
                    listeners = count,
                    threshold,
                    "possible listener leak: more listeners than the configured threshold"
                );
            }
        }
        id
    }

    /// Register a listener that fires on every emission of `event`.
    pub fn on(&self, event: &str, listener: impl Into<Listener<T>>) -> ListenerId {
        self.register(event, listener, false)
    }

    /// Register a listener that fires on the next emission of `event` only.
    pub fn once(&self, event: &str, listener: impl Into<Listener<T>>) -> ListenerId {
        self.register(event, listener, true)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Listeners currently registered for `event`, in registration order.
    ///
    /// The returned handles are a copy; later registry changes do not affect
    /// it.
    pub fn listeners(&self, event: &str) -> Vec<Listener<T>> {
        self.events
            .lock()
            .get(event)
            .map(|records| records.iter().map(|r| r.listener.clone()).collect())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.events.lock().get(event).map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }

    /// Names with at least one listener, sorted.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .events
            .lock()
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    // -----------------------------------------------------------------------
    // Emission
    // -----------------------------------------------------------------------

    /// Call every listener registered for `event` with `args`, in order.
    ///
    /// Emitting a name with no listeners is a no-op. If any listener fails,
    /// the others still run and the failures are returned together once all
    /// listeners have been attempted.
    pub fn emit(&self, event: &str, args: &[T]) -> Result<()> {
        // Snapshot, and prune fired `once` records, under the lock. Every
        // record currently stored is in the snapshot, so dropping the stored
        // `once` records removes exactly the ones this emission fires.
        let snapshot: Vec<ListenerRecord<T>> = {
            let mut events = self.events.lock();
            let Some(records) = events.get_mut(event) else {
                return Ok(());
            };
            let snapshot = records.clone();
            records.retain(|r| !r.once);
            if records.is_empty() {
                events.remove(event);
            }
            snapshot
        };

        tracing::trace!(event_name = event, listeners = snapshot.len(), "emitting event");

        // Lock is released, so callbacks can safely call back into the emitter.
        let mut failures = Vec::new();
        for record in &snapshot {
            if let Err(message) = invoke(&record.listener, args, self.config.catch_panics) {
                tracing::warn!(
                    event_name = event,
                    listener_id = record.id,
                    error = %message,
                    "listener failed"
                );
                failures.push(ListenerFailure {
                    id: record.id,
                    message,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EmitError::ListenersFailed {
                event: event.to_string(),
                failures,
            })
        }
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Remove the first registration of `listener` (by identity) for `event`.
    ///
    /// Other registrations of the same listener are left in place. Does
    /// nothing if there is no match.
    pub fn remove(&self, event: &str, listener: &Listener<T>) {
        let mut events = self.events.lock();
        let Some(records) = events.get_mut(event) else {
            return;
        };
        if let Some(pos) = records
            .iter()
            .position(|r| Listener::ptr_eq(&r.listener, listener))
        {
            let removed = records.remove(pos);
            tracing::debug!(event_name = event, listener_id = removed.id, "listener removed");
        }
        if records.is_empty() {
            events.remove(event);
        }
    }

    /// Remove the registration identified by `id`, whatever its event name.
    ///
    /// Does nothing if `id` is not present (safe to call multiple times).
    pub fn off(&self, id: ListenerId) {
        let mut events = self.events.lock();
        let mut emptied = None;
        for (name, records) in events.iter_mut() {
            if let Some(pos) = records.iter().position(|r| r.id == id) {
                records.remove(pos);
                tracing::debug!(event_name = %name, listener_id = id, "listener removed");
                if records.is_empty() {
                    emptied = Some(name.clone());
                }
                break;
            }
        }
        if let Some(name) = emptied {
            events.remove(&name);
        }
    }

    /// Drop every listener registered for `event`. Other names are untouched.
    pub fn remove_all_for(&self, event: &str) {
        if let Some(records) = self.events.lock().remove(event) {
            tracing::debug!(event_name = event, removed = records.len(), "listeners cleared");
        }
    }

    /// Drop every listener for every event name.
    pub fn remove_all(&self) {
        let mut events = self.events.lock();
        let removed: usize = events.values().map(Vec::len).sum();
        events.clear();
        tracing::debug!(removed, "all listeners cleared");
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventEmitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<String, usize> = self
            .events
            .lock()
            .iter()
            .map(|(name, records)| (name.clone(), records.len()))
            .collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .field("config", &self.config)
            .finish()
    }
}
