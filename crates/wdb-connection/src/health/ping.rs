//! Database ping implementation
//!
//! Runs the driver's cheapest query under a deadline and measures the
//! round-trip time.

use std::time::Duration;
use wdb_core::{Connection, Result, WdbError};

/// Ping a database connection to check if it's alive.
///
/// A handle that already reports itself closed counts as lost without a
/// round-trip. A ping that outlives `timeout` fails with
/// [`WdbError::Timeout`].
///
/// ```ignore
/// use wdb_connection::health::ping_database;
///
/// let latency = ping_database(conn.as_ref(), Duration::from_secs(5)).await?;
/// ```
pub async fn ping_database(conn: &dyn Connection, timeout: Duration) -> Result<Duration> {
    if conn.is_closed() {
        return Err(WdbError::ConnectionLost("connection is closed".into()));
    }

    match tokio::time::timeout(timeout, conn.ping()).await {
        Ok(result) => result,
        Err(_) => Err(WdbError::Timeout(format!(
            "ping did not answer within {:?}",
            timeout
        ))),
    }
}
