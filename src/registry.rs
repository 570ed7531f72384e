//! Bounded FIFO registry of notifications awaiting a callback.
//!
//! [`NotificationRegistry`] maps notification identifiers to their pending
//! callback state. Insertion order is tracked so that, once the registry
//! grows past its capacity, the oldest unresolved entries are evicted first
//! (without invoking their callbacks). The registry is shared between the
//! manager (producer) and the drain thread (consumer); a single mutex covers
//! both internal structures so they never tear.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Default maximum number of pending notifications to track.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Callback invoked when the user clicks a notification's action button.
pub type ActionCallback = Box<dyn FnOnce() + Send>;

/// Callback invoked with the typed text when the user submits a reply.
pub type ReplyCallback = Box<dyn FnOnce(String) + Send>;

/// Caller-side state for a notification whose interaction outcome is still
/// pending. Exists only for notifications that carry at least one callback;
/// fire-and-forget notifications are never registered.
pub struct PendingNotification {
    /// Identifier matching the wire config sent to the listener process.
    pub uid: String,
    /// Display title, kept for diagnostics only.
    pub title: String,
    /// Callback for the main action button.
    pub on_action: Option<ActionCallback>,
    /// Callback for the reply button.
    pub on_reply: Option<ReplyCallback>,
}

impl PendingNotification {
    /// Whether any callback is attached.
    pub fn has_callbacks(&self) -> bool {
        self.on_action.is_some() || self.on_reply.is_some()
    }
}

impl fmt::Debug for PendingNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingNotification")
            .field("uid", &self.uid)
            .field("title", &self.title)
            .field("on_action", &self.on_action.is_some())
            .field("on_reply", &self.on_reply.is_some())
            .finish()
    }
}

/// FIFO order and uid -> pending state, kept in lock-step on every
/// insert/remove.
struct Inner {
    order: VecDeque<String>,
    pending: HashMap<String, PendingNotification>,
}

/// Thread-safe bounded registry of pending notifications.
pub struct NotificationRegistry {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl NotificationRegistry {
    /// Create a registry with the default capacity of [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a registry bounded to `capacity` pending entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                order: VecDeque::new(),
                pending: HashMap::new(),
            }),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| {
            log::warn!("registry mutex poisoned, recovering");
            e.into_inner()
        })
    }

    /// Insert a pending notification, appending it to the FIFO order.
    ///
    /// While the registry holds more than its capacity, the oldest entries
    /// are evicted without their callbacks being invoked. Returns the number
    /// of entries evicted by this insertion.
    pub fn insert(&self, pending: PendingNotification) -> usize {
        let mut inner = self.lock();
        let uid = pending.uid.clone();
        if inner.pending.insert(uid.clone(), pending).is_some() {
            // Re-registered uid: drop its stale position so order and map
            // stay in lock-step.
            inner.order.retain(|u| u != &uid);
        }
        inner.order.push_back(uid);

        let mut evicted = 0;
        while inner.pending.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    // Entries claimed by `take` leave a stale slot in the
                    // order queue; popping one is not an eviction.
                    if inner.pending.remove(&oldest).is_some() {
                        evicted += 1;
                    }
                }
                None => break,
            }
        }
        evicted
    }

    /// Pop the pending state for `uid`, leaving its FIFO slot behind.
    ///
    /// The drain thread uses this to claim a notification for callback
    /// invocation; [`remove`](Self::remove) afterwards clears the FIFO slot.
    pub fn take(&self, uid: &str) -> Option<PendingNotification> {
        self.lock().pending.remove(uid)
    }

    /// Whether `uid` currently has pending state.
    pub fn contains(&self, uid: &str) -> bool {
        self.lock().pending.contains_key(uid)
    }

    /// Remove all records of `uid` from both structures. No-op if the uid is
    /// unknown; safe to call repeatedly.
    pub fn remove(&self, uid: &str) {
        let mut inner = self.lock();
        inner.pending.remove(uid);
        inner.order.retain(|u| u != uid);
    }

    /// Number of pending notifications currently tracked.
    ///
    /// This is a best-effort count: notifications the user dismisses or
    /// snoozes outside this system are invisible to it.
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// Maximum number of pending entries before FIFO eviction kicks in.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all pending entries without invoking their callbacks.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.pending.clear();
        inner.order.clear();
    }
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
