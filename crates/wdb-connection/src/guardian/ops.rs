//! Query operations routed through the current connection

use std::future::Future;
use std::sync::Arc;
use wdb_core::{
    BindStyle, Connection, FromRow, QueryResult, Result, Row, StatementResult, Value, WdbError,
    rebind,
};

use super::state::wait_settled;
use super::{Guardian, GuardianState, Live};
use crate::reconnect::WhileReconnecting;

impl Guardian {
    /// Run `sql` and decode every row
    pub async fn select<T: FromRow>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>> {
        let result = self.query(sql, params).await?;
        result.rows.iter().map(T::from_row).collect()
    }

    /// Run `sql` and decode the first row; [`WdbError::NotFound`] if there
    /// is none
    pub async fn get<T: FromRow>(&self, sql: &str, params: &[Value]) -> Result<T> {
        let row = self.query_row(sql, params).await?;
        T::from_row(&row)
    }

    /// Execute a statement that modifies data
    pub async fn exec(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        self.run(|conn| async move { conn.execute(sql, params).await })
            .await
    }

    /// Run `sql` and return all rows with column metadata
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.run(|conn| async move { conn.query(sql, params).await })
            .await
    }

    /// Run `sql` and return the first row; [`WdbError::NotFound`] if there
    /// is none
    pub async fn query_row(&self, sql: &str, params: &[Value]) -> Result<Row> {
        self.run(|conn| async move { conn.query_row(sql, params).await })
            .await?
            .ok_or_else(|| WdbError::NotFound("query returned no rows".into()))
    }

    /// Rewrite `?` placeholders into the endpoint driver's bind style
    pub fn rebind(&self, sql: &str) -> String {
        let kind = &self.endpoint.driver;
        let style = if self.drivers.has(kind) {
            self.drivers.get(kind).map(|driver| driver.bind_style())
        } else {
            None
        };
        rebind(style.unwrap_or_else(|| BindStyle::for_driver(kind)), sql)
    }

    /// Run `op` on the current connection. A lost connection is replaced
    /// before the error is handed back.
    async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce(Arc<dyn Connection>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let live = self.current().await?;
        let generation = live.generation;

        match op(live.conn).await {
            Err(e) if e.is_connection_lost() => {
                tracing::error!(error = %e, generation, "database connection lost; reconnecting");
                if let Err(reconnect_err) = self.recover(Some(generation)).await {
                    tracing::error!(error = %reconnect_err, "reconnect did not succeed");
                }
                Err(e)
            }
            other => other,
        }
    }

    /// The connection to run the next operation on
    pub(super) async fn current(&self) -> Result<Live> {
        // The second pass picks up a connection installed by a reconnect
        // that another task was already running
        for _ in 0..2 {
            if self.is_closed() {
                return Err(WdbError::Closed);
            }

            if self.state() == GuardianState::Reconnecting {
                match self.config.while_reconnecting {
                    WhileReconnecting::FailFast => return Err(WdbError::Reconnecting),
                    WhileReconnecting::Wait => {
                        let mut state = self.watch_state();
                        if !wait_settled(&mut state).await {
                            return Err(WdbError::Closed);
                        }
                        if self.is_closed() {
                            return Err(WdbError::Closed);
                        }
                    }
                }
            }

            let installed = self.slot.read().clone();
            if let Some(live) = installed {
                return Ok(live);
            }

            // An earlier reconnect gave up and left the slot empty
            self.recover(None).await?;
        }

        Err(WdbError::ConnectionLost(
            "no database connection available".into(),
        ))
    }
}
