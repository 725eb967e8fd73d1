//! Database driver trait and endpoint description

use crate::{BindStyle, Connection, Result, WdbError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Driver kind as used in [`Endpoint::driver`] (e.g., "postgresql", "mysql")
    fn name(&self) -> &'static str;

    /// Alternative driver kinds resolving to this driver
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Display name for logs
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Default connection port
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Placeholder syntax accepted by this driver
    fn bind_style(&self) -> BindStyle {
        BindStyle::for_driver(self.name())
    }

    /// Connection string format help text
    fn connection_string_help(&self) -> &'static str {
        ""
    }

    /// Build the connection string for an endpoint
    fn build_connection_string(&self, endpoint: &Endpoint) -> Result<String>;

    /// Open a new connection
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn Connection>>;
}

/// Where and how to reach a database.
///
/// Credentials live here for the whole life of a guardian because every
/// reconnect needs them again.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Driver kind (e.g., "mysql", "postgresql")
    pub driver: String,
    #[serde(default)]
    pub host: String,
    /// Port number (0 for the driver default)
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default, alias = "user")]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Additional driver parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Endpoint {
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            host: String::new(),
            port: 0,
            database: None,
            username: None,
            password: None,
            params: HashMap::new(),
        }
    }

    /// Create a MySQL endpoint
    pub fn new_mysql(host: &str, port: u16, database: &str, username: &str) -> Self {
        Self::new("mysql")
            .with_host(host, port)
            .with_database(database)
            .with_username(username)
    }

    /// Create a PostgreSQL endpoint
    pub fn new_postgres(host: &str, port: u16, database: &str, username: &str) -> Self {
        Self::new("postgresql")
            .with_host(host, port)
            .with_database(database)
            .with_username(username)
    }

    /// Parse an endpoint from a TOML table
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|e| WdbError::Configuration(format!("invalid endpoint: {}", e)))
    }

    pub fn with_host(mut self, host: &str, port: u16) -> Self {
        self.host = host.to_string();
        self.port = port;
        self
    }

    pub fn with_database(mut self, database: &str) -> Self {
        self.database = Some(database.to_string());
        self
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Set a driver parameter
    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parse a numeric driver parameter, failing on malformed values
    pub fn param_parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>> {
        self.param(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| {
                    WdbError::Configuration(format!("invalid value {:?} for {}", raw, key))
                })
            })
            .transpose()
    }

    /// Host, or `localhost` when unset
    pub fn host_or_default(&self) -> &str {
        if self.host.is_empty() {
            "localhost"
        } else {
            &self.host
        }
    }

    /// Port, or `default` when unset
    pub fn port_or(&self, default: u16) -> u16 {
        if self.port > 0 { self.port } else { default }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_endpoint_builders() {
        let endpoint = Endpoint::new_mysql("db", 3306, "posts", "app")
            .with_password("secret")
            .with_param("max_open_conns", 4);
        assert_eq!(endpoint.driver, "mysql");
        assert_eq!(endpoint.host_or_default(), "db");
        assert_eq!(endpoint.port_or(1), 3306);
        assert_eq!(endpoint.param("max_open_conns"), Some("4"));
        assert_eq!(endpoint.param_parsed::<usize>("max_open_conns").unwrap(), Some(4));
    }

    #[test]
    fn test_endpoint_defaults() {
        let endpoint = Endpoint::new("postgresql");
        assert_eq!(endpoint.host_or_default(), "localhost");
        assert_eq!(endpoint.port_or(5432), 5432);
        assert_eq!(endpoint.param_parsed::<u32>("missing").unwrap(), None);
    }

    #[test]
    fn test_malformed_param_is_configuration_error() {
        let endpoint = Endpoint::new("mysql").with_param("max_open_conns", "ten");
        let err = endpoint.param_parsed::<usize>("max_open_conns").unwrap_err();
        assert!(matches!(err, WdbError::Configuration(_)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let endpoint = Endpoint::new("mysql").with_password("hunter2");
        let debug = format!("{:?}", endpoint);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_endpoint_from_toml() {
        let endpoint = Endpoint::from_toml_str(
            r#"
            driver = "postgresql"
            host = "pg.internal"
            port = 5433
            user = "reader"
            database = "app"

            [params]
            sslmode = "disable"
            "#,
        )
        .unwrap();
        assert_eq!(endpoint.username.as_deref(), Some("reader"));
        assert_eq!(endpoint.port, 5433);
        assert_eq!(endpoint.param("sslmode"), Some("disable"));
        assert!(endpoint.password.is_none());
    }

    #[test]
    fn test_endpoint_from_toml_requires_driver() {
        let err = Endpoint::from_toml_str("host = \"db\"").unwrap_err();
        assert!(matches!(err, WdbError::Configuration(_)));
    }
}
