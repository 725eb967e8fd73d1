//! MySQL connection implementation

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Timelike};
use mysql_async::{
    Conn, Opts, Params, Pool, Row as MySqlRow, consts::ColumnType, prelude::*,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use wdb_core::{ColumnMeta, Connection, QueryResult, Result, Row, StatementResult, Value, WdbError};

use crate::error::{map_connect_error, map_error};

/// MySQL connection backed by a small `mysql_async` pool
pub struct MySqlConnection {
    pool: Pool,
    closed: AtomicBool,
}

impl MySqlConnection {
    /// Open a pool from a `mysql://` URL and check out one connection to
    /// prove the server is reachable.
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = Opts::from_url(url).map_err(|e| map_connect_error(e.into()))?;
        tracing::info!(
            host = %opts.ip_or_hostname(),
            port = opts.tcp_port(),
            database = ?opts.db_name(),
            "connecting to MySQL database"
        );

        let pool = Pool::new(opts);
        match pool.get_conn().await {
            Ok(conn) => drop(conn),
            Err(e) => {
                let _ = pool.disconnect().await;
                return Err(map_connect_error(e));
            }
        }

        Ok(Self {
            pool,
            closed: AtomicBool::new(false),
        })
    }

    async fn get_conn(&self) -> Result<Conn> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(WdbError::ConnectionLost("MySQL connection is closed".into()));
        }
        self.pool
            .get_conn()
            .await
            .map_err(|e| map_error(e, "failed to get MySQL connection"))
    }
}

/// Convert our Value into a positional mysql_async parameter
pub(crate) fn value_to_mysql(value: &Value) -> mysql_async::Value {
    use mysql_async::Value as My;
    match value {
        Value::Null => My::NULL,
        Value::Bool(v) => My::Int(*v as i64),
        Value::Int8(v) => My::Int(*v as i64),
        Value::Int16(v) => My::Int(*v as i64),
        Value::Int32(v) => My::Int(*v as i64),
        Value::Int64(v) => My::Int(*v),
        Value::UInt64(v) => My::UInt(*v),
        Value::Float32(v) => My::Float(*v),
        Value::Float64(v) => My::Double(*v),
        Value::Decimal(v) | Value::String(v) => My::Bytes(v.clone().into_bytes()),
        Value::Bytes(v) => My::Bytes(v.clone()),
        Value::Uuid(v) => My::Bytes(v.to_string().into_bytes()),
        Value::Json(v) => My::Bytes(v.to_string().into_bytes()),
        Value::Date(d) => My::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0),
        Value::Time(t) => My::Time(
            false,
            0,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1_000,
        ),
        Value::DateTime(dt) => naive_datetime_to_mysql(dt),
        Value::DateTimeUtc(dt) => naive_datetime_to_mysql(&dt.naive_utc()),
        // No native arrays; store them as JSON text
        Value::Array(arr) => {
            let json = serde_json::to_string(arr).unwrap_or_else(|_| "[]".to_string());
            My::Bytes(json.into_bytes())
        }
    }
}

fn naive_datetime_to_mysql(dt: &chrono::NaiveDateTime) -> mysql_async::Value {
    mysql_async::Value::Date(
        dt.year() as u16,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8,
        dt.minute() as u8,
        dt.second() as u8,
        dt.nanosecond() / 1_000,
    )
}

/// Convert a mysql_async value to ours. The text protocol delivers every
/// column as bytes, so the column type decides how to read them back.
pub(crate) fn mysql_value_to_value(val: mysql_async::Value, col_type: ColumnType) -> Value {
    match val {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => match col_type {
                ColumnType::MYSQL_TYPE_TINY
                | ColumnType::MYSQL_TYPE_SHORT
                | ColumnType::MYSQL_TYPE_LONG
                | ColumnType::MYSQL_TYPE_LONGLONG
                | ColumnType::MYSQL_TYPE_INT24
                | ColumnType::MYSQL_TYPE_YEAR => s
                    .parse::<i64>()
                    .map(Value::Int64)
                    .or_else(|_| s.parse::<u64>().map(Value::UInt64))
                    .unwrap_or(Value::String(s)),
                ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
                    s.parse::<f64>().map(Value::Float64).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                    Value::Decimal(s)
                }
                ColumnType::MYSQL_TYPE_JSON => serde_json::from_str(&s)
                    .map(Value::Json)
                    .unwrap_or(Value::String(s)),
                _ => Value::String(s),
            },
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql_async::Value::Int(i) => Value::Int64(i),
        mysql_async::Value::UInt(u) => Value::UInt64(u),
        mysql_async::Value::Float(f) => Value::Float32(f),
        mysql_async::Value::Double(d) => Value::Float64(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
            let is_date_only = matches!(
                col_type,
                ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
            );
            match date {
                Some(d) if is_date_only => Value::Date(d),
                Some(d) => d
                    .and_hms_micro_opt(hour as u32, min as u32, sec as u32, micro)
                    .map(Value::DateTime)
                    .unwrap_or(Value::Null),
                // Zero dates ('0000-00-00') have no chrono representation
                None => Value::String(format!("{:04}-{:02}-{:02}", year, month, day)),
            }
        }
        mysql_async::Value::Time(negative, days, hours, mins, secs, micros) => {
            let total_hours = days * 24 + hours as u32;
            let sign = if negative { "-" } else { "" };
            Value::String(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                sign, total_hours, mins, secs, micros
            ))
        }
    }
}

fn rows_to_result(mysql_rows: Vec<MySqlRow>) -> (Vec<ColumnMeta>, Vec<Row>) {
    let Some(first) = mysql_rows.first() else {
        return (Vec::new(), Vec::new());
    };

    let columns: Vec<ColumnMeta> = first
        .columns_ref()
        .iter()
        .enumerate()
        .map(|(ordinal, col)| ColumnMeta {
            name: col.name_str().to_string(),
            data_type: format!("{:?}", col.column_type()),
            ordinal,
        })
        .collect();
    let column_types: Vec<ColumnType> = first
        .columns_ref()
        .iter()
        .map(|col| col.column_type())
        .collect();
    let names: Arc<[String]> = columns.iter().map(|c| c.name.clone()).collect();

    let rows = mysql_rows
        .into_iter()
        .map(|mysql_row| {
            let values = column_types
                .iter()
                .enumerate()
                .map(|(idx, col_type)| {
                    let raw: mysql_async::Value =
                        mysql_row.get(idx).unwrap_or(mysql_async::Value::NULL);
                    mysql_value_to_value(raw, *col_type)
                })
                .collect();
            Row::new(names.clone(), values)
        })
        .collect();

    (columns, rows)
}

#[async_trait]
impl Connection for MySqlConnection {
    fn driver_name(&self) -> &str {
        "mysql"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let mut conn = self.get_conn().await?;

        let outcome = if params.is_empty() {
            conn.query_drop(sql).await
        } else {
            let params = Params::Positional(params.iter().map(value_to_mysql).collect());
            conn.exec_drop(sql, params).await
        };
        outcome.map_err(|e| map_error(e, "failed to execute statement"))?;

        let result = StatementResult::new(conn.affected_rows())
            .with_last_insert_id(conn.last_insert_id().filter(|id| *id > 0));
        tracing::debug!(affected_rows = result.affected_rows, "statement executed");
        Ok(result)
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();
        let mut conn = self.get_conn().await?;

        let mysql_rows: Vec<MySqlRow> = if params.is_empty() {
            conn.query(sql).await
        } else {
            let params = Params::Positional(params.iter().map(value_to_mysql).collect());
            conn.exec(sql, params).await
        }
        .map_err(|e| map_error(e, "failed to execute query"))?;

        let (columns, rows) = rows_to_result(mysql_rows);
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
        tracing::info!("closing MySQL connection pool");
        self.pool
            .clone()
            .disconnect()
            .await
            .map_err(|e| WdbError::Connection(format!("Failed to close MySQL connection: {}", e)))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
