//! Cancellable delayed actions.
//!
//! Every auto-dismiss and periodic timer in the kiosk is owned by a handle;
//! dropping the handle aborts the pending action, so tearing down a
//! component never leaves timers firing into a dead view.

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;

/// A delayed action that is aborted when the handle is dropped.
#[derive(Debug)]
pub struct ScopedTimer {
    handle: Option<JoinHandle<()>>,
}

impl ScopedTimer {
    /// Run `action` after `delay` on the current runtime.
    pub fn after<F>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn cancel(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Timers keyed by the element they belong to.
///
/// Scheduling a key that already has a timer replaces (aborts) the old one.
/// After [`close`](Self::close) nothing new is scheduled.
#[derive(Debug)]
pub struct TimerSet<K: Eq + Hash> {
    timers: DashMap<K, ScopedTimer>,
    closed: AtomicBool,
}

impl<K: Eq + Hash> Default for TimerSet<K> {
    fn default() -> Self {
        Self {
            timers: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }
}

impl<K: Eq + Hash> TimerSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&self, key: K, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_closed() {
            return;
        }
        self.timers.retain(|_, timer| !timer.is_finished());
        self.timers.insert(key, ScopedTimer::after(delay, action));
        // Lost a race with `close`.
        if self.is_closed() {
            self.timers.clear();
        }
    }

    /// Abort the timer for `key`. Returns whether one was pending.
    pub fn cancel(&self, key: &K) -> bool {
        match self.timers.remove(key) {
            Some((_, timer)) => {
                let pending = !timer.is_finished();
                timer.cancel();
                pending
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        self.timers.clear();
    }

    /// Cancel everything and refuse later `schedule` calls.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.cancel_all();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of timers that have not fired yet.
    pub fn pending(&self) -> usize {
        self.timers
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }
}
