//! Observable values and signals.
//!
//! This module provides:
//! - `Observable<T>`: a value holder that notifies subscribers only on actual change
//! - `Signal<T>`: a fire-every-time event stream
//! - Explicit, deterministic unsubscription by `SubscriptionId`
//!
//! Subscribers run synchronously inside `set`/`emit`, in subscription order.
//! Owners call `clear_subscribers` from their own teardown.

use std::fmt;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

type Callback<T> = Box<dyn FnMut(&T) + Send>;

/// Ordered list of callbacks shared by `Observable` and `Signal`.
struct Subscribers<T> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }
}

impl<T> Subscribers<T> {
    fn add(&mut self, callback: Callback<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let len = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != len
    }

    fn notify(&mut self, value: &T) {
        for (_, callback) in &mut self.entries {
            callback(value);
        }
    }
}

// ============================================================================
// Observable
// ============================================================================

/// A value holder that notifies subscribers when the value changes.
pub struct Observable<T> {
    value: T,
    subscribers: Subscribers<T>,
}

impl<T: Clone + PartialEq> Observable<T> {
    /// Create an observable with an initial value.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            subscribers: Subscribers::default(),
        }
    }

    /// Get the current value.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Set the value. Subscribers run only if it differs from the current one.
    ///
    /// Returns true if the value changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.subscribers.notify(&self.value);
        true
    }

    /// Register a change callback.
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + Send + 'static) -> SubscriptionId {
        self.subscribers.add(Box::new(callback))
    }

    /// Remove a callback. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Drop every subscriber.
    pub fn clear_subscribers(&mut self) {
        self.subscribers.entries.clear();
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.entries.len()
    }
}

impl<T: Clone + PartialEq + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("subscribers", &self.subscribers.entries.len())
            .finish()
    }
}

// ============================================================================
// Signal
// ============================================================================

/// An event stream. Every `emit` reaches every subscriber.
pub struct Signal<T> {
    subscribers: Subscribers<T>,
}

impl<T> Signal<T> {
    /// Create a signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Subscribers::default(),
        }
    }

    /// Deliver a value to every subscriber.
    pub fn emit(&mut self, value: &T) {
        self.subscribers.notify(value);
    }

    /// Register a callback.
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + Send + 'static) -> SubscriptionId {
        self.subscribers.add(Box::new(callback))
    }

    /// Remove a callback. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Drop every subscriber.
    pub fn clear_subscribers(&mut self) {
        self.subscribers.entries.clear();
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.entries.len()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.entries.len())
            .finish()
    }
}
