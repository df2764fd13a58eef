//! Sync engine configuration.

use std::time::Duration;

/// How long the engine waits after a failed poll, a failed height, or while
/// fully synced, before asking the upstream node for its tip again.
pub const DEFAULT_RETRY_PERIOD: Duration = Duration::from_secs(30);

/// Sync configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Wait between tip polls and between retries of a failed height.
    pub retry_period: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_period: DEFAULT_RETRY_PERIOD,
        }
    }
}
