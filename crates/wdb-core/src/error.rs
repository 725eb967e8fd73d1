//! Error types for WDB

use thiserror::Error;

/// Core error type for WDB operations
#[derive(Error, Debug)]
pub enum WdbError {
    /// The transport under a live handle is gone. Raised by drivers when the
    /// client library reports a broken connection; the guardian reacts to it
    /// by replacing the handle.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Reconnect gave up after {attempts} attempts: {last_error}")]
    ReconnectExhausted { attempts: u32, last_error: String },

    #[error("Reconnect in progress")]
    Reconnecting,

    #[error("Connection closed")]
    Closed,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl WdbError {
    /// Whether this error means the handle that produced it is unusable.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, WdbError::ConnectionLost(_))
    }

    /// Whether retrying can never succeed without changing the configuration.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WdbError::Configuration(_) | WdbError::Closed)
    }
}

/// Result type alias for WDB operations
pub type Result<T> = std::result::Result<T, WdbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_lost_classification() {
        assert!(WdbError::ConnectionLost("broken pipe".into()).is_connection_lost());
        assert!(!WdbError::Connection("refused".into()).is_connection_lost());
        assert!(!WdbError::Query("syntax".into()).is_connection_lost());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(WdbError::Configuration("set db driver first".into()).is_fatal());
        assert!(WdbError::Closed.is_fatal());
        assert!(!WdbError::Connection("refused".into()).is_fatal());
        assert!(!WdbError::Reconnecting.is_fatal());
    }

    #[test]
    fn test_exhausted_message() {
        let err = WdbError::ReconnectExhausted {
            attempts: 3,
            last_error: "Connection error: refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "Reconnect gave up after 3 attempts: Connection error: refused"
        );
    }
}
