//! Connection guardian
//!
//! A [`Guardian`] owns one live database connection for an [`Endpoint`] and
//! replaces it when the driver reports the transport as lost. Reconnects are
//! single flight: however many operations fail at once, one task redials
//! while the others either wait for it or fail fast.
//!
//! ```ignore
//! use std::sync::Arc;
//! use wdb_connection::{Guardian, GuardianConfig};
//! use wdb_drivers::DriverRegistry;
//! use wdb_core::Endpoint;
//!
//! let endpoint = Endpoint::new_mysql("db.internal", 3306, "posts", "app").with_password("secret");
//! let guardian = Guardian::connect(endpoint, Arc::new(DriverRegistry::with_defaults()), GuardianConfig::default()).await?;
//! let titles: Vec<(i64, String)> = guardian.select("SELECT id, title FROM posts WHERE author = ?", &["ann".into()]).await?;
//! ```

mod ops;
mod recover;
mod state;


use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use wdb_core::{Connection, Endpoint, Result, WdbError};
use wdb_drivers::DriverRegistry;

use crate::health::{KeepaliveConfig, ping_database, spawn_keepalive};
use crate::reconnect::{ReconnectEvent, ReconnectPolicy, WhileReconnecting};

pub use state::GuardianState;
pub(crate) use state::wait_closed;

const EVENT_CAPACITY: usize = 64;

/// Behavior of a [`Guardian`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    pub reconnect: ReconnectPolicy,
    pub while_reconnecting: WhileReconnecting,
    pub keepalive: KeepaliveConfig,
}

impl GuardianConfig {
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_while_reconnecting(mut self, mode: WhileReconnecting) -> Self {
        self.while_reconnecting = mode;
        self
    }

    pub fn with_keepalive(mut self, keepalive: KeepaliveConfig) -> Self {
        self.keepalive = keepalive;
        self
    }
}

/// The installed connection and the generation it was installed as
#[derive(Clone)]
struct Live {
    conn: Arc<dyn Connection>,
    generation: u64,
}

/// Self-healing owner of one database connection
pub struct Guardian {
    endpoint: Endpoint,
    drivers: Arc<DriverRegistry>,
    config: GuardianConfig,
    slot: RwLock<Option<Live>>,
    state: watch::Sender<GuardianState>,
    generation: AtomicU64,
    closed: AtomicBool,
    events: broadcast::Sender<ReconnectEvent>,
}

impl Guardian {
    fn build(endpoint: Endpoint, drivers: Arc<DriverRegistry>, config: GuardianConfig) -> Self {
        let (state, _) = watch::channel(GuardianState::Idle);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            endpoint,
            drivers,
            config,
            slot: RwLock::new(None),
            state,
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            events,
        }
    }

    /// Dial `endpoint` under the configured reconnect policy and guard the
    /// resulting connection.
    ///
    /// An unknown driver kind fails with [`WdbError::Configuration`] before
    /// anything is dialed.
    pub async fn connect(
        endpoint: Endpoint,
        drivers: Arc<DriverRegistry>,
        config: GuardianConfig,
    ) -> Result<Arc<Self>> {
        drivers.resolve(&endpoint.driver)?;
        let guardian = Arc::new(Self::build(endpoint, drivers, config));
        let conn = guardian.dial_until_connected().await?;
        if let Err(conn) = guardian.install(conn) {
            let _ = conn.close().await;
            return Err(WdbError::Closed);
        }
        Ok(guardian)
    }

    /// Guard an already-open connection. Reconnects dial `endpoint` through
    /// `drivers`.
    pub fn with_connection(
        endpoint: Endpoint,
        drivers: Arc<DriverRegistry>,
        config: GuardianConfig,
        conn: Arc<dyn Connection>,
    ) -> Arc<Self> {
        let guardian = Self::build(endpoint, drivers, config);
        let generation = guardian.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *guardian.slot.write() = Some(Live { conn, generation });
        Arc::new(guardian)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &GuardianConfig {
        &self.config
    }

    pub fn state(&self) -> GuardianState {
        *self.state.borrow()
    }

    /// Generation of the installed connection; bumped on every install
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Observe reconnect attempts
    pub fn subscribe(&self) -> broadcast::Receiver<ReconnectEvent> {
        self.events.subscribe()
    }

    pub(crate) fn watch_state(&self) -> watch::Receiver<GuardianState> {
        self.state.subscribe()
    }

    /// Ping the current connection under the keepalive timeout.
    ///
    /// Any failure, including a timeout, replaces the connection; the ping
    /// error is still returned.
    pub async fn ping(&self) -> Result<Duration> {
        let live = self.current().await?;
        let timeout = self.config.keepalive.ping_timeout();
        match ping_database(live.conn.as_ref(), timeout).await {
            Ok(latency) => Ok(latency),
            Err(e) => {
                tracing::error!(error = %e, generation = live.generation, "ping failed; reconnecting");
                if let Err(reconnect_err) = self.recover(Some(live.generation)).await {
                    tracing::error!(error = %reconnect_err, "reconnect after failed ping did not succeed");
                }
                Err(e)
            }
        }
    }

    /// Ping every `interval` on a background task until closed
    pub fn spawn_keepalive(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        spawn_keepalive(self, interval)
    }

    /// Close the guardian and its connection. Running reconnects stop before
    /// their next dial and later operations fail with [`WdbError::Closed`].
    pub async fn close(&self) -> Result<()> {
        let live = {
            let mut slot = self.slot.write();
            if self.closed.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            slot.take()
        };
        self.state.send_replace(GuardianState::Closed);
        tracing::info!(driver = %self.endpoint.driver, "closing database guardian");

        match live {
            Some(live) => live.conn.close().await,
            None => Ok(()),
        }
    }

    /// Install a freshly dialed connection. Hands the connection back if
    /// the guardian was closed meanwhile.
    fn install(
        &self,
        conn: Arc<dyn Connection>,
    ) -> std::result::Result<u64, Arc<dyn Connection>> {
        let mut slot = self.slot.write();
        if self.closed.load(Ordering::SeqCst) {
            return Err(conn);
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *slot = Some(Live { conn, generation });
        Ok(generation)
    }

    fn emit(&self, event: ReconnectEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
