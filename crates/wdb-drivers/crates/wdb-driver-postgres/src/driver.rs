//! PostgreSQL driver implementation

use async_trait::async_trait;
use std::sync::Arc;
use wdb_core::{Connection, DatabaseDriver, Endpoint, Result, WdbError};

use crate::PostgresConnection;

/// Parameters consumed by the driver itself rather than forwarded
const SSLMODE: &str = "sslmode";
const IGNORED_PARAMS: [&str; 1] = ["max_open_conns"];

/// PostgreSQL database driver
pub struct PostgresDriver;

impl PostgresDriver {
    /// Create a new PostgreSQL driver instance
    pub fn new() -> Self {
        tracing::debug!("PostgreSQL driver initialized");
        Self
    }
}

impl Default for PostgresDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Quote a libpq value when it is empty or holds whitespace, quotes or
/// backslashes.
pub(crate) fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

#[async_trait]
impl DatabaseDriver for PostgresDriver {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["postgres", "pgx"]
    }

    fn display_name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn default_port(&self) -> Option<u16> {
        Some(5432)
    }

    fn connection_string_help(&self) -> &'static str {
        "host=localhost port=5432 user=postgres password=secret dbname=mydb sslmode=disable"
    }

    fn build_connection_string(&self, endpoint: &Endpoint) -> Result<String> {
        let sslmode = endpoint.param(SSLMODE).unwrap_or("disable");
        if !matches!(sslmode, "disable" | "prefer") {
            return Err(WdbError::Configuration(format!(
                "unsupported sslmode {:?}: only disable and prefer are available",
                sslmode
            )));
        }

        let mut parts = vec![
            format!("host={}", quote_value(endpoint.host_or_default())),
            format!("port={}", endpoint.port_or(5432)),
        ];
        if let Some(username) = &endpoint.username {
            parts.push(format!("user={}", quote_value(username)));
        }
        if let Some(password) = &endpoint.password {
            parts.push(format!("password={}", quote_value(password)));
        }
        if let Some(database) = &endpoint.database {
            parts.push(format!("dbname={}", quote_value(database)));
        }
        parts.push(format!("sslmode={}", sslmode));

        let mut extra: Vec<(&String, &String)> = endpoint
            .params
            .iter()
            .filter(|(key, _)| key.as_str() != SSLMODE && !IGNORED_PARAMS.contains(&key.as_str()))
            .collect();
        extra.sort();
        for (key, value) in extra {
            parts.push(format!("{}={}", key, quote_value(value)));
        }

        Ok(parts.join(" "))
    }

    #[tracing::instrument(skip(self, endpoint), fields(host = %endpoint.host_or_default(), database = endpoint.database.as_deref()))]
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn Connection>> {
        let conn_str = self.build_connection_string(endpoint)?;
        let conn = PostgresConnection::connect(&conn_str).await.map_err(|e| {
            tracing::error!(error = %e, "PostgreSQL connection failed");
            e
        })?;
        Ok(Arc::new(conn))
    }
}
