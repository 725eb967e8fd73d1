//! Settings file for a guarded endpoint

use serde::{Deserialize, Serialize};
use std::path::Path;
use wdb_core::{Endpoint, Result, WdbError};

use crate::GuardianConfig;

/// An endpoint plus the guardian behavior for it, as read from TOML
///
/// ```
/// use wdb_connection::Settings;
///
/// let settings = Settings::from_toml_str(r#"
///     [endpoint]
///     driver = "mysql"
///     host = "db.internal"
///     database = "posts"
///
///     [guardian.reconnect]
///     max_attempts = 20
/// "#).unwrap();
/// assert_eq!(settings.guardian.reconnect.max_attempts, Some(20));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub endpoint: Endpoint,
    #[serde(default)]
    pub guardian: GuardianConfig,
}

impl Settings {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|e| WdbError::Configuration(format!("invalid settings: {}", e)))
    }

    /// Read settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded settings file");
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconnect::WhileReconnecting;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const FULL: &str = r#"
        [endpoint]
        driver = "mysql"
        host = "db.internal"
        port = 3306
        username = "app"
        password = "secret"
        database = "posts"

        [endpoint.params]
        max_open_conns = "10"

        [guardian]
        while_reconnecting = "fail_fast"

        [guardian.reconnect]
        max_attempts = 20

        [guardian.reconnect.backoff]
        initial_ms = 100
        max_ms = 5000

        [guardian.keepalive]
        ping_timeout_ms = 250
    "#;

    #[test]
    fn test_full_settings() {
        let settings = Settings::from_toml_str(FULL).unwrap();
        assert_eq!(settings.endpoint.host, "db.internal");
        assert_eq!(settings.endpoint.param("max_open_conns"), Some("10"));
        assert_eq!(settings.guardian.while_reconnecting, WhileReconnecting::FailFast);
        assert_eq!(settings.guardian.reconnect.max_attempts, Some(20));
        assert_eq!(
            settings.guardian.reconnect.backoff.max_delay(),
            Duration::from_millis(5000)
        );
        assert_eq!(
            settings.guardian.keepalive.ping_timeout(),
            Duration::from_millis(250)
        );
        assert_eq!(settings.guardian.keepalive.interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_guardian_section_is_optional() {
        let settings = Settings::from_toml_str("[endpoint]\ndriver = \"postgresql\"").unwrap();
        assert_eq!(settings.guardian, GuardianConfig::default());
        assert_eq!(settings.guardian.reconnect.max_attempts, None);
    }

    #[test]
    fn test_invalid_settings() {
        let err = Settings::from_toml_str("[guardian]\nwhile_reconnecting = \"panic\"").unwrap_err();
        assert!(matches!(err, WdbError::Configuration(_)), "{:?}", err);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Settings::load("/definitely/not/here/wdb.toml").unwrap_err();
        assert!(matches!(err, WdbError::Io(_)), "{:?}", err);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("wdb-settings-{}.toml", std::process::id()));
        std::fs::write(&path, FULL).unwrap();
        let settings = Settings::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(settings.endpoint.database.as_deref(), Some("posts"));
    }
}
