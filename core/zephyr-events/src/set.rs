//! Insertion-ordered listener set

use crate::handler::{Listener, ListenerId};
use std::collections::HashMap;

/// Listeners registered under one key
///
/// Entries live in a vector in registration order, with a hash index from
/// listener identity to position. Removal leaves a tombstone; the vector is
/// compacted once tombstones outnumber live entries, so insert, remove and
/// contains are O(1) amortized. Re-inserting a listener that is already
/// present keeps its first position.
pub struct HandlerSet<T> {
    /// Listener identity -> position in `entries`
    index: HashMap<ListenerId, usize>,

    /// Registration order, `None` for removed entries
    entries: Vec<Option<Listener<T>>>,
}

impl<T> HandlerSet<T> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Add a listener. Returns `false` if it was already a member.
    pub fn insert(&mut self, listener: Listener<T>) -> bool {
        let id = listener.id();
        if self.index.contains_key(&id) {
            return false;
        }

        self.index.insert(id, self.entries.len());
        self.entries.push(Some(listener));
        true
    }

    /// Remove a listener. Returns `false` if it was not a member.
    pub fn remove(&mut self, listener: &Listener<T>) -> bool {
        self.remove_id(listener.id())
    }

    /// Remove by identity. Returns `false` if no member has `id`.
    pub fn remove_id(&mut self, id: ListenerId) -> bool {
        let Some(pos) = self.index.remove(&id) else {
            return false;
        };

        self.entries[pos] = None;
        if self.entries.len() - self.index.len() > self.index.len() {
            self.compact();
        }
        true
    }

    pub fn contains(&self, listener: &Listener<T>) -> bool {
        self.index.contains_key(&listener.id())
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Listeners in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Listener<T>> {
        self.entries.iter().flatten()
    }

    pub fn to_vec(&self) -> Vec<Listener<T>> {
        self.iter().cloned().collect()
    }

    fn compact(&mut self) {
        self.entries.retain(Option::is_some);
        for (pos, listener) in self.entries.iter().flatten().enumerate() {
            self.index.insert(listener.id(), pos);
        }
    }
}

impl<T> Default for HandlerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<Listener<T>> for HandlerSet<T> {
    fn from_iter<I: IntoIterator<Item = Listener<T>>>(iter: I) -> Self {
        let mut set = Self::new();
        for listener in iter {
            set.insert(listener);
        }
        set
    }
}
