//! PostgreSQL connection implementation

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, Config, NoTls, types::ToSql};
use wdb_core::{ColumnMeta, Connection, QueryResult, Result, Row, StatementResult, Value, WdbError};

use crate::error::{format_postgres_error, map_error};
use crate::values::{PgValue, postgres_to_value};

/// PostgreSQL connection wrapper
pub struct PostgresConnection {
    client: Client,
    driver_task: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl PostgresConnection {
    /// Connect using a libpq-style `key=value` string
    pub async fn connect(conn_str: &str) -> Result<Self> {
        let config: Config = conn_str.parse().map_err(|e| {
            WdbError::Configuration(format!("invalid PostgreSQL connection string: {}", e))
        })?;
        tracing::info!(
            hosts = ?config.get_hosts(),
            database = ?config.get_dbname(),
            "connecting to PostgreSQL database"
        );

        let (client, connection) = config.connect(NoTls).await.map_err(|e| {
            WdbError::Connection(format!(
                "Failed to connect to PostgreSQL: {}",
                format_postgres_error(&e)
            ))
        })?;

        let driver_task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        tracing::info!("PostgreSQL connection established");
        Ok(Self {
            client,
            driver_task: Mutex::new(Some(driver_task)),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(WdbError::ConnectionLost(
                "PostgreSQL connection is closed".into(),
            ));
        }
        Ok(())
    }

    /// Prepare `sql` and convert `params` to the types the server inferred
    async fn prepare(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<(tokio_postgres::Statement, Vec<PgValue>)> {
        self.ensure_open()?;
        let statement = self
            .client
            .prepare(sql)
            .await
            .map_err(|e| map_error(e, "failed to prepare statement"))?;

        if statement.params().len() != params.len() {
            return Err(WdbError::Query(format!(
                "statement expects {} parameters, got {}",
                statement.params().len(),
                params.len()
            )));
        }

        let pg_params = params
            .iter()
            .zip(statement.params())
            .map(|(value, target)| PgValue::for_type(value, target))
            .collect();
        Ok((statement, pg_params))
    }
}

fn as_sql_refs(params: &[PgValue]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

#[async_trait]
impl Connection for PostgresConnection {
    fn driver_name(&self) -> &str {
        "postgresql"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let (statement, pg_params) = self.prepare(sql, params).await?;
        let affected_rows = self
            .client
            .execute(&statement, &as_sql_refs(&pg_params))
            .await
            .map_err(|e| map_error(e, "failed to execute statement"))?;

        tracing::debug!(affected_rows, "statement executed");
        Ok(StatementResult::new(affected_rows))
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();
        let (statement, pg_params) = self.prepare(sql, params).await?;
        let pg_rows = self
            .client
            .query(&statement, &as_sql_refs(&pg_params))
            .await
            .map_err(|e| map_error(e, "failed to execute query"))?;

        // Columns come from the statement so empty results still carry them
        let columns: Vec<ColumnMeta> = statement
            .columns()
            .iter()
            .enumerate()
            .map(|(ordinal, col)| ColumnMeta {
                name: col.name().to_string(),
                data_type: col.type_().name().to_string(),
                ordinal,
            })
            .collect();
        let names: Arc<[String]> = columns.iter().map(|c| c.name.clone()).collect();

        let rows: Vec<Row> = pg_rows
            .iter()
            .map(|pg_row| {
                let values = (0..columns.len())
                    .map(|idx| postgres_to_value(pg_row, idx))
                    .collect();
                Row::new(names.clone(), values)
            })
            .collect();

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(row_count = rows.len(), execution_time_ms, "query executed");

        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms,
        })
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("closing PostgreSQL connection");
        if let Some(task) = self.driver_task.lock().take() {
            task.abort();
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.client.is_closed()
    }
}
