//! Pool Settings and Checkout Accounting
//!
//! Both engines delegate pooling to their driver's pool (`mysql_async::Pool`,
//! `deadpool_sqlite::Pool`). This module holds what they share: the sizing
//! settings and a [`Tally`] of checkouts, so `/health` reports the same
//! counters for either store.
//!
//! Every checkout ends in exactly one of release or discard. A connection
//! dropped without either (a cancelled request) is counted as discarded.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Pool sizing and admission settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of connections checked out at once
    pub max_connections: usize,

    /// How long `acquire()` waits for a free connection before failing
    pub acquire_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_connections: 10, acquire_timeout_ms: 10_000 }
    }
}

impl PoolConfig {
    /// Acquire timeout as a `Duration`
    #[must_use]
    pub const fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

/// Lifetime checkout counters
///
/// Every acquisition is eventually counted once as released or discarded,
/// so `acquired - released - discarded` is the number checked out right now.
#[derive(Debug, Default)]
pub struct Tally {
    acquired: AtomicU64,
    released: AtomicU64,
    discarded: AtomicU64,
}

impl Tally {
    pub fn record_acquire(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_discard(&self) {
        self.discarded.fetch_add(1, Ordering::SeqCst);
    }

    /// Snapshot the counters into a status report
    #[must_use]
    pub fn status(&self, max_size: usize, idle: Option<usize>) -> PoolStatus {
        let acquired = self.acquired.load(Ordering::SeqCst);
        let released = self.released.load(Ordering::SeqCst);
        let discarded = self.discarded.load(Ordering::SeqCst);
        let in_use = acquired.saturating_sub(released + discarded);

        PoolStatus {
            max_size,
            in_use: usize::try_from(in_use).unwrap_or(usize::MAX),
            idle,
            acquired,
            released,
            discarded,
        }
    }
}

/// Point-in-time pool report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PoolStatus {
    /// Configured upper bound on checked-out connections
    pub max_size: usize,

    /// Connections currently checked out
    pub in_use: usize,

    /// Idle connections ready for reuse (None when the driver does not report it)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle: Option<usize>,

    /// Lifetime checkouts
    pub acquired: u64,

    /// Lifetime checkouts returned to the pool
    pub released: u64,

    /// Lifetime checkouts closed instead of returned
    pub discarded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_pool_config_keeps_defaults() {
        let config: PoolConfig = serde_json::from_str(r#"{"max_connections": 3}"#).unwrap();
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.acquire_timeout_ms, 10_000);
    }

    #[test]
    fn test_tally_counts_checked_out_connections() {
        let tally = Tally::default();
        for _ in 0..4 {
            tally.record_acquire();
        }
        tally.record_release();
        tally.record_discard();

        let status = tally.status(10, Some(1));
        assert_eq!(status.in_use, 2);
        assert_eq!(status.acquired, 4);
        assert_eq!(status.released, 1);
        assert_eq!(status.discarded, 1);
        assert_eq!(status.idle, Some(1));
    }

    #[test]
    fn test_unknown_idle_is_omitted() {
        let status = Tally::default().status(5, None);
        let json = serde_json::to_value(status).unwrap();
        assert!(json.get("idle").is_none());
        assert_eq!(json["max_size"], 5);
        assert_eq!(json["in_use"], 0);
    }
}
