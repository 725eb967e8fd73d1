//! Driver registry for resolving driver kinds to implementations

use std::collections::HashMap;
use std::sync::Arc;
use wdb_core::{DatabaseDriver, Result, WdbError};

/// Registry of available database drivers.
///
/// Names and aliases are matched case-insensitively.
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
    aliases: HashMap<String, String>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "postgres")]
        registry.register(Arc::new(crate::postgres::PostgresDriver::new()));
        #[cfg(feature = "mysql")]
        registry.register(Arc::new(crate::mysql::MySqlDriver::new()));

        registry
    }

    /// Register a driver under its name and aliases, replacing any driver
    /// previously registered under them.
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let name = driver.name().to_lowercase();
        tracing::info!(driver = %name, aliases = ?driver.aliases(), "registering database driver");
        for alias in driver.aliases() {
            self.aliases.insert(alias.to_lowercase(), name.clone());
        }
        self.aliases.remove(&name);
        self.drivers.insert(name, driver);
    }

    fn canonical(&self, name: &str) -> String {
        let lowered = name.to_lowercase();
        match self.aliases.get(&lowered) {
            Some(target) if !self.drivers.contains_key(&lowered) => target.clone(),
            _ => lowered,
        }
    }

    /// Get a driver by name or alias
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(&self.canonical(name)).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// Get a driver by name or alias, failing with a configuration error
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn DatabaseDriver>> {
        self.get(name).ok_or_else(|| {
            WdbError::Configuration(format!("unsupported database driver: {:?}", name))
        })
    }

    /// List all registered driver names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if a driver is registered under this name or alias
    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(&self.canonical(name))
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use wdb_core::{Connection, Endpoint};

    struct FakeDriver(&'static str, &'static [&'static str]);

    #[async_trait]
    impl DatabaseDriver for FakeDriver {
        fn name(&self) -> &'static str {
            self.0
        }

        fn aliases(&self) -> &'static [&'static str] {
            self.1
        }

        fn build_connection_string(&self, _endpoint: &Endpoint) -> Result<String> {
            Ok(format!("{}://", self.0))
        }

        async fn connect(&self, _endpoint: &Endpoint) -> Result<Arc<dyn Connection>> {
            Err(WdbError::Connection("fake".into()))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(FakeDriver("fakedb", &["fdb"])));

        assert!(registry.has("fakedb"));
        assert!(registry.has("FDB"));
        assert_eq!(registry.get("FakeDB").unwrap().name(), "fakedb");
        assert_eq!(registry.get("fdb").unwrap().name(), "fakedb");
        assert!(registry.get("other").is_none());
        assert_eq!(registry.list(), vec!["fakedb"]);
    }

    #[test]
    fn test_resolve_unknown_is_configuration_error() {
        let registry = DriverRegistry::new();
        let err = registry.resolve("cassandra").err().unwrap();
        assert!(matches!(err, WdbError::Configuration(_)), "{:?}", err);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_name_wins_over_alias() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(FakeDriver("alpha", &["beta"])));
        registry.register(Arc::new(FakeDriver("beta", &[])));
        assert_eq!(registry.get("beta").unwrap().name(), "beta");
        assert_eq!(registry.get("alpha").unwrap().name(), "alpha");
    }

    #[cfg(all(feature = "mysql", feature = "postgres"))]
    #[test]
    fn test_defaults_resolve_aliases() {
        let registry = DriverRegistry::with_defaults();
        assert_eq!(registry.list(), vec!["mysql", "postgresql"]);
        assert_eq!(registry.resolve("postgres").unwrap().name(), "postgresql");
        assert_eq!(registry.resolve("MariaDB").unwrap().name(), "mysql");
        assert_eq!(registry.resolve("mysql").unwrap().default_port(), Some(3306));
    }
}
