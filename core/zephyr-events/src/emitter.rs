//! Core emitter implementation

use crate::config::EmitterConfig;
use crate::error::{EmitterError, Result};
use crate::handler::{Listener, Unsubscribe, WeakListener};
use crate::key::EventKey;
use crate::set::HandlerSet;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Ordered listener lists per key, as exposed by [`Emitter::all`]
pub type HandlerMap<T> = HashMap<EventKey, Vec<Listener<T>>>;

/// Synchronous publish/subscribe registry
///
/// # Design
/// - Per key: an ordered [`HandlerSet`] plus a shared, immutable view of it
/// - The view is rebuilt after every mutation; `emit` clones it and iterates
///   the clone, so handlers may call `on`/`off`/`emit` on the same emitter
/// - No lock is held while a handler runs
///
/// Clones share the same registry.
pub struct Emitter<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    /// Handler sets and their views, one entry lock per key
    slots: DashMap<EventKey, Slot<T>>,

    /// Emission counters, `None` when disabled
    stats: Option<StatsTable>,
}

/// Counters are kept per key only for keys that have a slot, so emitting on
/// arbitrary unsubscribed keys cannot grow the table.
struct StatsTable {
    per_key: DashMap<EventKey, EmitStats>,

    /// Emissions on keys that never had a listener
    unkeyed: Mutex<EmitStats>,
}

impl StatsTable {
    fn new(capacity: usize) -> Self {
        Self {
            per_key: DashMap::with_capacity(capacity),
            unkeyed: Mutex::new(EmitStats::default()),
        }
    }

    /// `None` addresses the unkeyed bucket
    fn update(&self, key: Option<&EventKey>, f: impl FnOnce(&mut EmitStats)) {
        match key {
            Some(key) => f(&mut *self.per_key.entry(key.clone()).or_default()),
            None => f(&mut *self.unkeyed.lock()),
        }
    }
}

struct Slot<T> {
    set: HandlerSet<T>,

    /// Registration-ordered copy of `set`
    view: Arc<[Listener<T>]>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            set: HandlerSet::new(),
            view: Arc::from(Vec::new()),
        }
    }

    fn from_set(set: HandlerSet<T>) -> Self {
        let mut slot = Self { set, view: Arc::from(Vec::new()) };
        slot.sync();
        slot
    }

    fn sync(&mut self) {
        self.view = self.set.iter().cloned().collect();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitStats {
    /// `emit` calls on the key
    pub emitted: u64,
    /// Handler invocations, keyed and wildcard
    pub delivered: u64,
    /// Emissions that reached no handler
    pub unmatched: u64,
}

impl<T: 'static> Emitter<T> {
    /// Create an empty emitter
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        let stats = config
            .track_stats
            .then(|| StatsTable::new(config.initial_capacity));

        Self {
            inner: Arc::new(Inner {
                slots: DashMap::with_capacity(config.initial_capacity),
                stats,
            }),
        }
    }

    /// Create an emitter seeded from an existing handler map
    ///
    /// Duplicate entries in a list collapse to one registration. Fails if a
    /// listener's signature does not fit its key.
    pub fn with_handlers(handlers: HandlerMap<T>) -> Result<Self> {
        Self::with_config_and_handlers(EmitterConfig::default(), handlers)
    }

    /// Like [`Emitter::with_handlers`], with explicit settings
    pub fn with_config_and_handlers(
        config: EmitterConfig,
        handlers: HandlerMap<T>,
    ) -> Result<Self> {
        let emitter = Self::with_config(config);

        for (key, listeners) in handlers {
            if let Some(bad) = listeners.iter().find(|l| !l.accepts(&key)) {
                warn!(key = %key, listener = ?bad, "Rejecting seed listener with mismatched signature");
                return Err(EmitterError::SignatureMismatch { key });
            }

            let set: HandlerSet<T> = listeners.into_iter().collect();
            debug!(key = %key, listeners = set.len(), "Seeding handler set");
            emitter.inner.slots.insert(key, Slot::from_set(set));
        }

        Ok(emitter)
    }

    /// Register `listener` under `key`
    ///
    /// Registering the same listener twice keeps a single entry, but each
    /// call returns its own [`Unsubscribe`]; whichever runs first removes
    /// the entry.
    pub fn on(
        &self,
        key: impl Into<EventKey>,
        listener: impl Into<Listener<T>>,
    ) -> Result<Unsubscribe> {
        let key = key.into();
        let listener = listener.into();

        if !listener.accepts(&key) {
            warn!(key = %key, listener = ?listener, "Rejecting listener with mismatched signature");
            return Err(EmitterError::SignatureMismatch { key });
        }

        let count = {
            let mut slot = self.inner.slots.entry(key.clone()).or_insert_with(|| {
                debug!("Creating handler set for key: {}", key);
                Slot::new()
            });
            slot.set.insert(listener.clone());
            slot.sync();
            slot.set.len()
        };
        trace!(key = %key, listeners = count, "Listener registered");

        // Weak on both sides: a stored Unsubscribe keeps neither the
        // registry nor the handler alive
        let registry = Arc::downgrade(&self.inner);
        let listener: WeakListener<T> = listener.downgrade();
        Ok(Unsubscribe::new(move || {
            if !listener.is_live() {
                return;
            }
            if let Some(inner) = registry.upgrade() {
                inner.remove(&key, &listener);
            }
        }))
    }

    /// Remove one listener from `key`. Unknown keys and absent listeners are ignored.
    pub fn off(&self, key: impl Into<EventKey>, listener: impl Into<Listener<T>>) {
        let listener: Listener<T> = listener.into();
        self.inner.remove(&key.into(), &listener.downgrade());
    }

    /// Remove every listener registered under `key`
    pub fn off_all(&self, key: impl Into<EventKey>) {
        let key = key.into();
        if let Some(mut slot) = self.inner.slots.get_mut(&key) {
            let cleared = slot.set.len();
            slot.set.clear();
            slot.sync();
            debug!(key = %key, cleared, "Cleared handler set");
        }
    }

    /// Invoke every listener of `key`, then every wildcard listener
    ///
    /// Both listener lists are captured before the first call. Listeners
    /// added during this emission are not invoked; listeners removed during
    /// it still are. A panicking handler unwinds out of `emit` and the
    /// remaining handlers are skipped.
    ///
    /// Emitting on the wildcard key itself calls each wildcard listener once.
    pub fn emit(&self, key: impl Into<EventKey>, payload: &T) {
        let key = key.into();

        let keyed = self.inner.snapshot(&key);
        let wildcards = if key.is_wildcard() {
            None
        } else {
            self.inner.snapshot(&EventKey::Wildcard)
        };

        // Counted before dispatch so a panicking handler still registers the call
        let tally = self.inner.begin(&key);

        let keyed_count = keyed.as_ref().map_or(0, |v| v.len());
        let wildcard_count = wildcards.as_ref().map_or(0, |v| v.len());
        trace!(
            key = %key,
            keyed = keyed_count,
            wildcard = wildcard_count,
            "Emitting event"
        );

        for listener in keyed.iter().chain(wildcards.iter()).flat_map(|v| v.iter()) {
            listener.dispatch(&key, payload);
        }

        self.inner.finish(tally, (keyed_count + wildcard_count) as u64);
    }

    /// Snapshot of every key's listener list
    ///
    /// The returned map is a copy; changing it has no effect on dispatch.
    /// Keys cleared with [`Emitter::off_all`] appear with an empty list.
    pub fn all(&self) -> HandlerMap<T> {
        self.inner
            .slots
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().view.to_vec()))
            .collect()
    }

    /// Listeners under `key` in registration order
    pub fn handlers(&self, key: impl Into<EventKey>) -> Vec<Listener<T>> {
        self.inner
            .snapshot(&key.into())
            .map(|view| view.to_vec())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, key: impl Into<EventKey>) -> usize {
        let key = key.into();
        self.inner.slots.get(&key).map_or(0, |slot| slot.set.len())
    }

    pub fn has_listeners(&self, key: impl Into<EventKey>) -> bool {
        self.listener_count(key) > 0
    }

    /// Keys that currently have at least one listener
    pub fn keys(&self) -> Vec<EventKey> {
        self.inner
            .slots
            .iter()
            .filter(|entry| !entry.value().set.is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Get per-key statistics for keys that have had listeners
    /// (empty when tracking is disabled)
    pub fn stats(&self) -> Vec<(EventKey, EmitStats)> {
        self.inner
            .stats
            .iter()
            .flat_map(|stats| stats.per_key.iter())
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn stats_for(&self, key: impl Into<EventKey>) -> Option<EmitStats> {
        let key = key.into();
        let stats = self.inner.stats.as_ref()?;
        stats.per_key.get(&key).map(|s| *s)
    }

    /// Combined counters for emissions on keys that never had a listener
    pub fn unkeyed_stats(&self) -> Option<EmitStats> {
        self.inner.stats.as_ref().map(|stats| *stats.unkeyed.lock())
    }

    /// Total `emit` calls across all keys
    pub fn total_emitted(&self) -> u64 {
        let Some(stats) = &self.inner.stats else {
            return 0;
        };
        let keyed: u64 = stats.per_key.iter().map(|s| s.emitted).sum();
        keyed + stats.unkeyed.lock().emitted
    }
}

impl Emitter<()> {
    /// Emit an event that carries no payload
    pub fn notify(&self, key: impl Into<EventKey>) {
        self.emit(key, &())
    }
}

impl<T> Inner<T> {
    fn snapshot(&self, key: &EventKey) -> Option<Arc<[Listener<T>]>> {
        self.slots
            .get(key)
            .filter(|slot| !slot.view.is_empty())
            .map(|slot| Arc::clone(&slot.view))
    }

    fn remove(&self, key: &EventKey, listener: &WeakListener<T>) {
        let Some(mut slot) = self.slots.get_mut(key) else {
            return;
        };

        if slot.set.remove_id(listener.id()) {
            slot.sync();
            trace!(key = %key, listeners = slot.set.len(), "Listener removed");
        }
    }

    /// Count one emission and pick the bucket its results go to.
    /// The bucket is fixed here, before any handler can create a slot.
    fn begin(&self, key: &EventKey) -> Option<(&StatsTable, Option<EventKey>)> {
        let stats = self.stats.as_ref()?;
        let bucket = self.slots.contains_key(key).then(|| key.clone());
        stats.update(bucket.as_ref(), |s| s.emitted += 1);
        Some((stats, bucket))
    }

    fn finish(&self, tally: Option<(&StatsTable, Option<EventKey>)>, delivered: u64) {
        let Some((stats, bucket)) = tally else {
            return;
        };

        stats.update(bucket.as_ref(), |s| {
            s.delivered += delivered;
            if delivered == 0 {
                s.unmatched += 1;
            }
        });
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("keys", &self.inner.slots.len())
            .field("track_stats", &self.inner.stats.is_some())
            .finish()
    }
}
