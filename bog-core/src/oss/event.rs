//! Edge-triggered `Event` flag (§3, §9 Design Notes).
//!
//! Built on `tokio::sync::Notify` plus an `AtomicBool`: `Notify` alone is
//! edge-triggered on wake but forgets state once no task is waiting, so a
//! late-arriving `wait()` would block forever after a `set()` nobody
//! observed. The bool answers `is_set()`/lets a late `wait()` return
//! immediately, matching the source's "does not auto-reset on wait"
//! semantics (§3: "wait returns when the flag is set and does not auto-reset").

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct Event {
    flag: AtomicBool,
    notify: Notify,
}

impl Event {
    pub fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Producers must mutate the intent map *before* calling `set()` (§5
    /// ordering guarantee: "a flag is never observed set without a matching
    /// pending mutation visible in the intent map").
    pub fn set(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns once the flag is set. Does not clear it — the consumer must
    /// drain the intent map fully and call `clear()` itself.
    pub async fn wait(&self) {
        loop {
            if self.is_set() {
                return;
            }
            let notified = self.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}
