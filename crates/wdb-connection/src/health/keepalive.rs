//! Periodic keepalive pings

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use wdb_core::WdbError;

use crate::guardian::{Guardian, wait_closed};

/// Ping deadline and keepalive cadence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    /// How long a ping may take before the connection counts as lost
    pub ping_timeout_ms: u64,
    /// Suggested keepalive interval for [`Guardian::spawn_keepalive`]
    pub interval_ms: u64,
}

impl KeepaliveConfig {
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            ping_timeout_ms: 5_000,
            interval_ms: 30_000,
        }
    }
}

/// Ping `guardian` every `interval` until it is closed or dropped.
///
/// The task only holds a weak reference, so it never keeps the guardian
/// alive on its own.
pub fn spawn_keepalive(guardian: &Arc<Guardian>, interval: Duration) -> JoinHandle<()> {
    let weak = Arc::downgrade(guardian);
    let mut state = guardian.watch_state();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = wait_closed(&mut state) => break,
            }

            let Some(guardian) = weak.upgrade() else {
                break;
            };
            match guardian.ping().await {
                Ok(latency) => tracing::debug!(?latency, "keepalive ping"),
                Err(WdbError::Closed) => break,
                Err(e) => tracing::warn!(error = %e, "keepalive ping failed"),
            }
        }
        tracing::debug!("keepalive stopped");
    })
}
