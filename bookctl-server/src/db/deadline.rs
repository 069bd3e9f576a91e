//! Request-scoped deadline passed into every repository call
//!
//! The repository never waits past `min(caller deadline, now + ceiling)`.
//! When the deadline elapses the in-flight store future is dropped, which
//! aborts the statement, and the call fails with `DbError::Timeout`.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use super::repos::DbError;

/// Ceiling applied to every store operation, regardless of the caller's
/// own deadline.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(3);

/// Stand-in for "no deadline" when `now + timeout` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Point in time after which a store operation is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now, saturating at a far-future instant.
    pub fn after(timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            at: now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE),
        }
    }

    /// Deadline at a fixed instant.
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    /// Default per-request deadline.
    pub fn request() -> Self {
        Self::after(STORE_TIMEOUT)
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// The earlier of this deadline and `now + ceiling`.
    pub fn capped(self, ceiling: Duration) -> Self {
        self.min(Self::after(ceiling))
    }

    /// Drive `op` to completion or fail with `DbError::Timeout`.
    pub async fn run<T, F>(self, operation: &'static str, op: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        let started = Instant::now();
        match tokio::time::timeout_at(self.at, op).await {
            Ok(result) => result,
            Err(_) => {
                let after = started.elapsed();
                tracing::warn!(
                    operation,
                    elapsed_ms = after.as_millis() as u64,
                    "store operation exceeded deadline"
                );
                Err(DbError::Timeout { operation, after })
            }
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::request()
    }
}
