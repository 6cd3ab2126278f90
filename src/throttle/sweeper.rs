//! Periodic collection of expired throttle windows.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use super::limiter::RequestThrottle;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically removes expired windows from a shared throttle.
///
/// The sweep bounds memory growth from identifiers that stop sending
/// requests. Decision correctness never depends on it: `check` treats
/// expired entries as absent whether or not a sweep has run.
pub struct Sweeper {
    /// The throttle whose store is swept
    throttle: Arc<RequestThrottle>,
    /// Interval between sweeps
    interval: Duration,
}

impl Sweeper {
    /// Create a sweeper for `throttle` using the default interval.
    pub fn new(throttle: Arc<RequestThrottle>) -> Self {
        Self::with_interval(throttle, DEFAULT_SWEEP_INTERVAL)
    }

    /// Create a sweeper with a custom interval.
    pub fn with_interval(throttle: Arc<RequestThrottle>, interval: Duration) -> Self {
        Self { throttle, interval }
    }

    /// Spawn the sweep loop onto the current tokio runtime.
    ///
    /// The loop runs for the life of the process; abort the returned handle
    /// to stop it during shutdown.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the sweep loop on the current task.
    pub async fn run(self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; sweeping a fresh store is a no-op.
        loop {
            ticker.tick().await;
            let removed = self.throttle.sweep(Utc::now().timestamp_millis());
            if removed > 0 {
                debug!(
                    removed = removed,
                    remaining_entries = self.throttle.entry_count(),
                    "Swept expired throttle windows"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throttle::Policy;

    #[tokio::test]
    async fn test_sweeper_removes_expired_windows() {
        let throttle = Arc::new(RequestThrottle::new());
        let policy = Policy::new(5, 1).unwrap();

        // Entries opened far enough in the past to be long expired.
        let past_ms = Utc::now().timestamp_millis() - 10_000;
        throttle.check_at("stale-a", &policy, past_ms).unwrap();
        throttle.check_at("stale-b", &policy, past_ms).unwrap();
        assert_eq!(throttle.entry_count(), 2);

        let handle =
            Sweeper::with_interval(Arc::clone(&throttle), Duration::from_millis(20)).spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(throttle.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_sweeper_keeps_live_windows() {
        let throttle = Arc::new(RequestThrottle::new());
        let policy = Policy::new(5, 3600).unwrap();

        throttle.check("live", &policy).unwrap();

        let handle =
            Sweeper::with_interval(Arc::clone(&throttle), Duration::from_millis(20)).spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(throttle.entry_count(), 1);
        assert_eq!(throttle.current_count("live"), Some(1));
    }
}
