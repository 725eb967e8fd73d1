//! Connection trait

use crate::{QueryResult, Result, Row, StatementResult, Value};
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// An open database session
///
/// Drivers report a dead transport as [`crate::WdbError::ConnectionLost`];
/// every other failure keeps its own variant so that callers can tell a
/// broken handle apart from a bad query.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "postgresql", "mysql")
    fn driver_name(&self) -> &str;

    /// Execute a statement that modifies data (INSERT/UPDATE/DELETE)
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;

    /// Execute a query that returns rows (SELECT)
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Execute a query and keep only its first row
    async fn query_row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, params).await?.into_first())
    }

    /// Round-trip a trivial query and report its latency
    async fn ping(&self) -> Result<Duration> {
        let start = Instant::now();
        self.query(ping_query(self.driver_name()), &[]).await?;
        Ok(start.elapsed())
    }

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

/// Get the cheapest liveness query for a given driver.
pub fn ping_query(driver_name: &str) -> &'static str {
    match driver_name {
        "mysql" => "DO 1",
        "oracle" => "SELECT 1 FROM DUAL",
        _ => "SELECT 1",
    }
}
