//! Mapping of mysql_async errors onto `WdbError`

use mysql_async::{DriverError, Error as MySqlError};
use wdb_core::WdbError;

/// Server and client codes that mean the session is gone:
/// 1053 server shutdown, 1927 connection killed,
/// 2006 server has gone away, 2013 lost connection during query.
const LOST_CONNECTION_CODES: [u16; 4] = [1053, 1927, 2006, 2013];

/// Whether the error leaves the connection unusable
pub(crate) fn is_bad_connection(error: &MySqlError) -> bool {
    match error {
        MySqlError::Io(_) => true,
        MySqlError::Driver(DriverError::ConnectionClosed | DriverError::PoolDisconnected) => true,
        MySqlError::Server(server) => LOST_CONNECTION_CODES.contains(&server.code),
        _ => false,
    }
}

/// Map an error raised on an established connection
pub(crate) fn map_error(error: MySqlError, context: &str) -> WdbError {
    if is_bad_connection(&error) {
        WdbError::ConnectionLost(format!("{}: {}", context, error))
    } else {
        WdbError::Query(format!("{}: {}", context, error))
    }
}

/// Map an error raised while dialing
pub(crate) fn map_connect_error(error: MySqlError) -> WdbError {
    match error {
        MySqlError::Url(e) => {
            WdbError::Configuration(format!("invalid MySQL connection string: {}", e))
        }
        other => WdbError::Connection(format!("Failed to connect to MySQL: {}", other)),
    }
}
