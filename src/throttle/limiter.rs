//! Core throttle implementation.

use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::Result;

use super::entry::WindowEntry;
use super::policies::Policy;

/// The outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Requests left in the current window after this call
    pub remaining: u32,
    /// Unix-epoch milliseconds at which the current window ends
    pub reset_at_ms: i64,
}

impl Decision {
    /// Time until the window resets, for Retry-After style headers.
    pub fn retry_after(&self, now_ms: i64) -> Duration {
        if self.reset_at_ms <= now_ms {
            Duration::ZERO
        } else {
            Duration::from_millis((self.reset_at_ms - now_ms) as u64)
        }
    }
}

/// The core request throttle tracking per-identifier windows.
///
/// The backing store is a concurrent map, so checks for distinct
/// identifiers do not serialize against each other while the
/// read-modify-write for a single identifier stays atomic under its shard
/// lock. The struct is thread-safe and is shared across tasks behind an
/// `Arc`.
///
/// Identifiers are opaque strings. Callers namespace them (for example
/// `"financial:user:123"`) so unrelated policies do not collide on the
/// same window.
pub struct RequestThrottle {
    /// Window entries indexed by identifier
    entries: DashMap<String, WindowEntry>,
}

impl RequestThrottle {
    /// Create a new throttle with an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Decide whether a request for `identifier` may proceed under `policy`.
    ///
    /// The first request for an identifier (or the first after its window
    /// expired) opens a fresh window and is always allowed. Later requests
    /// are counted against the window until the limit is reached; a blocked
    /// call leaves the window untouched. Returns an error only for an
    /// invalid policy.
    pub fn check(&self, identifier: &str, policy: &Policy) -> Result<Decision> {
        self.check_at(identifier, policy, Utc::now().timestamp_millis())
    }

    /// Clock-explicit variant of [`check`](Self::check), used by tests to
    /// drive window rollover without sleeping.
    pub(crate) fn check_at(
        &self,
        identifier: &str,
        policy: &Policy,
        now_ms: i64,
    ) -> Result<Decision> {
        policy.validate()?;

        trace!(
            identifier = %identifier,
            limit = policy.limit,
            window_secs = policy.window_secs,
            "Checking throttle"
        );

        let decision = match self.entries.entry(identifier.to_string()) {
            Entry::Vacant(slot) => {
                let entry = WindowEntry::open(now_ms, policy.window_secs);
                debug!(
                    identifier = %identifier,
                    reset_at_ms = entry.reset_at_ms(),
                    "Opening new throttle window"
                );
                let decision = Decision {
                    allowed: true,
                    remaining: policy.limit - 1,
                    reset_at_ms: entry.reset_at_ms(),
                };
                slot.insert(entry);
                decision
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if entry.is_expired(now_ms) {
                    *entry = WindowEntry::open(now_ms, policy.window_secs);
                    debug!(
                        identifier = %identifier,
                        reset_at_ms = entry.reset_at_ms(),
                        "Throttle window rolled over"
                    );
                    Decision {
                        allowed: true,
                        remaining: policy.limit - 1,
                        reset_at_ms: entry.reset_at_ms(),
                    }
                } else if entry.count() < policy.limit {
                    entry.increment();
                    Decision {
                        allowed: true,
                        remaining: policy.limit - entry.count(),
                        reset_at_ms: entry.reset_at_ms(),
                    }
                } else {
                    debug!(identifier = %identifier, "Throttle limit exceeded");
                    Decision {
                        allowed: false,
                        remaining: 0,
                        reset_at_ms: entry.reset_at_ms(),
                    }
                }
            }
        };

        Ok(decision)
    }

    /// Remove entries whose window ended at or before `now_ms`.
    ///
    /// Returns the number of entries removed. This is purely a memory
    /// bound: `check` treats expired entries as absent whether or not they
    /// have been swept.
    pub fn sweep(&self, now_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now_ms));
        before.saturating_sub(self.entries.len())
    }

    /// Current count for an identifier's live window.
    ///
    /// Returns `None` if no entry exists or the entry has expired.
    pub fn current_count(&self, identifier: &str) -> Option<u32> {
        let now_ms = Utc::now().timestamp_millis();
        self.entries.get(identifier).and_then(|entry| {
            if entry.is_expired(now_ms) {
                None
            } else {
                Some(entry.count())
            }
        })
    }

    /// Number of entries in the store, including not-yet-swept expired ones.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Clear all windows.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new()
    }
}
