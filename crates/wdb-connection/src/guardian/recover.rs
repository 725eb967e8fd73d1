//! Single-flight reconnect

use std::sync::Arc;
use wdb_core::{Connection, Result, WdbError};

use super::state::wait_closed;
use super::{Guardian, GuardianState};
use crate::reconnect::ReconnectEvent;

impl Guardian {
    /// Replace the connection that failed as generation `failed`, or fill
    /// an empty slot when `failed` is `None`.
    ///
    /// Returns at once if another task is already reconnecting, or if the
    /// failed connection has been replaced already.
    pub(super) async fn recover(&self, failed: Option<u64>) -> Result<()> {
        let started = self.state.send_if_modified(|state| {
            if *state == GuardianState::Idle {
                *state = GuardianState::Reconnecting;
                true
            } else {
                false
            }
        });
        if !started {
            if self.is_closed() {
                return Err(WdbError::Closed);
            }
            tracing::debug!("reconnect already in flight");
            return Ok(());
        }

        let result = self.replace(failed).await;

        self.state.send_if_modified(|state| {
            if *state == GuardianState::Reconnecting {
                *state = GuardianState::Idle;
                true
            } else {
                false
            }
        });
        result
    }

    async fn replace(&self, failed: Option<u64>) -> Result<()> {
        let stale = {
            let mut slot = self.slot.write();
            let current = slot.as_ref().map(|live| live.generation);
            match (current, failed) {
                (Some(current), Some(failed)) if current != failed => {
                    tracing::debug!(failed, current, "connection already replaced");
                    return Ok(());
                }
                (Some(_), None) => return Ok(()),
                _ => slot.take(),
            }
        };

        if let Some(stale) = stale {
            tracing::info!(generation = stale.generation, "closing lost database connection");
            if let Err(e) = stale.conn.close().await {
                tracing::error!(error = %e, generation = stale.generation, "failed to close lost connection");
            }
        }

        let conn = self.dial_until_connected().await?;
        match self.install(conn) {
            Ok(generation) => {
                tracing::info!(generation, "database connection replaced");
                Ok(())
            }
            Err(conn) => {
                let _ = conn.close().await;
                Err(WdbError::Closed)
            }
        }
    }

    /// Dial under the reconnect policy until a connection opens, the
    /// policy gives up, a fatal error occurs or the guardian is closed.
    pub(super) async fn dial_until_connected(&self) -> Result<Arc<dyn Connection>> {
        let policy = &self.config.reconnect;
        let mut closed = self.watch_state();
        let mut attempt: u32 = 0;

        loop {
            if self.is_closed() {
                return Err(WdbError::Closed);
            }
            attempt += 1;
            self.emit(ReconnectEvent::Attempting {
                attempt,
                max_attempts: policy.max_attempts,
            });
            tracing::info!(
                attempt,
                driver = %self.endpoint.driver,
                host = %self.endpoint.host_or_default(),
                "connecting to database"
            );

            let outcome = tokio::select! {
                outcome = self.dial() => outcome,
                _ = wait_closed(&mut closed) => return Err(WdbError::Closed),
            };

            let error = match outcome {
                Ok(conn) => {
                    tracing::info!(attempt, "database connection established");
                    self.emit(ReconnectEvent::Succeeded {
                        attempts_taken: attempt,
                    });
                    return Ok(conn);
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!(error = %e, "cannot connect with this configuration");
                    return Err(e);
                }
                Err(e) => e,
            };

            tracing::error!(attempt, error = %error, "failed to connect to database");
            self.emit(ReconnectEvent::Failed {
                attempt,
                error: error.to_string(),
            });

            if policy.is_exhausted(attempt) {
                self.emit(ReconnectEvent::Exhausted {
                    total_attempts: attempt,
                });
                return Err(WdbError::ReconnectExhausted {
                    attempts: attempt,
                    last_error: error.to_string(),
                });
            }

            let delay = policy.backoff.calculate_delay(attempt - 1);
            if delay.is_zero() {
                tokio::task::yield_now().await;
                continue;
            }
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_closed(&mut closed) => return Err(WdbError::Closed),
            }
        }
    }

    /// Resolve the endpoint's driver and open one connection
    async fn dial(&self) -> Result<Arc<dyn Connection>> {
        let driver = self.drivers.resolve(&self.endpoint.driver)?;
        driver.connect(&self.endpoint).await
    }
}
