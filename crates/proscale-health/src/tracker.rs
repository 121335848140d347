//! Poll outcome tracking.
//!
//! Holds the last poll error and the count of consecutive failed polls.
//! Written by the reconciliation loop, read by the HTTP transport.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

/// Error type stored for the last failed poll.
pub type PollError = Arc<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Default)]
struct HealthState {
    last_error: Option<PollError>,
    consecutive_failures: u32,
}

/// Health of the poll loop, shared between the loop and its readers.
///
/// The lock is held only to copy values in or out.
#[derive(Debug, Default)]
pub struct HealthInfo {
    state: Mutex<HealthState>,
}

/// Point-in-time copy of the health state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl HealthInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one poll and return the consecutive failure
    /// count after it. `None` means success and resets the count.
    pub fn record_outcome(&self, err: Option<PollError>) -> u32 {
        let mut state = self.lock();
        match &err {
            None => {
                if state.consecutive_failures > 0 {
                    debug!(
                        after = state.consecutive_failures,
                        "poll succeeded, failure count reset"
                    );
                }
                state.consecutive_failures = 0;
            }
            Some(e) => {
                state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                warn!(
                    failures = state.consecutive_failures,
                    error = %e,
                    "poll failed"
                );
            }
        }
        state.last_error = err;
        state.consecutive_failures
    }

    /// Error of the most recent poll, if it failed.
    pub fn last_error(&self) -> Option<PollError> {
        self.lock().last_error.clone()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let state = self.lock();
        HealthSnapshot {
            consecutive_failures: state.consecutive_failures,
            last_error: state.last_error.as_ref().map(ToString::to_string),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HealthState> {
        // Plain data: still consistent after a poisoning panic.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Debug, thiserror::Error)]
    #[error("cluster status unavailable: {0}")]
    struct TestError(&'static str);

    fn err(msg: &'static str) -> Option<PollError> {
        Some(Arc::new(TestError(msg)))
    }

    #[test]
    fn starts_healthy() {
        let health = HealthInfo::new();
        assert!(health.last_error().is_none());
        assert_eq!(health.consecutive_failures(), 0);
    }

    #[test]
    fn failures_increment_monotonically() {
        let health = HealthInfo::new();
        assert_eq!(health.record_outcome(err("a")), 1);
        assert_eq!(health.record_outcome(err("b")), 2);
        assert_eq!(health.record_outcome(err("c")), 3);
        assert_eq!(
            health.last_error().unwrap().to_string(),
            "cluster status unavailable: c"
        );
    }

    #[test]
    fn success_resets_count_and_clears_error() {
        let health = HealthInfo::new();
        health.record_outcome(err("a"));
        health.record_outcome(err("b"));
        assert_eq!(health.record_outcome(None), 0);
        assert!(health.last_error().is_none());

        assert_eq!(health.record_outcome(err("c")), 1);
    }

    #[test]
    fn snapshot_renders_error() {
        let health = HealthInfo::new();
        health.record_outcome(err("boom"));
        assert_eq!(
            health.snapshot(),
            HealthSnapshot {
                consecutive_failures: 1,
                last_error: Some("cluster status unavailable: boom".to_string()),
            }
        );
    }

    #[test]
    fn concurrent_readers_see_whole_outcomes() {
        let health = Arc::new(HealthInfo::new());

        let writer = {
            let health = Arc::clone(&health);
            thread::spawn(move || {
                for i in 0..1000 {
                    if i % 2 == 0 {
                        health.record_outcome(err("odd"));
                    } else {
                        health.record_outcome(None);
                    }
                }
            })
        };

        for _ in 0..1000 {
            let snap = health.snapshot();
            // An error is present exactly when the count is non-zero.
            assert_eq!(snap.last_error.is_some(), snap.consecutive_failures > 0);
        }
        writer.join().unwrap();
    }
}
