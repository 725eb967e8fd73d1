//! Mapping of tokio-postgres errors onto `WdbError`

use tokio_postgres::Error as PgError;
use wdb_core::WdbError;

/// SQLSTATE codes meaning the session cannot be used any more: the whole
/// `08` connection-exception class, plus admin/crash shutdown and
/// cannot-connect-now.
pub(crate) fn is_lost_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03")
}

/// Whether the error leaves the connection unusable
pub(crate) fn is_bad_connection(error: &PgError) -> bool {
    if error.is_closed() {
        return true;
    }
    if let Some(state) = error.code() {
        return is_lost_sqlstate(state.code());
    }
    std::error::Error::source(error).is_some_and(|source| source.is::<std::io::Error>())
}

/// Server message with detail and hint appended when present
pub(crate) fn format_postgres_error(error: &PgError) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut message = db_error.message().to_string();
    if let Some(detail) = db_error.detail().filter(|d| !d.trim().is_empty()) {
        message.push_str(&format!(" (detail: {})", detail));
    }
    if let Some(hint) = db_error.hint().filter(|h| !h.trim().is_empty()) {
        message.push_str(&format!(" (hint: {})", hint));
    }
    format!("{} (code: {})", message, db_error.code().code())
}

/// Map an error raised on an established connection
pub(crate) fn map_error(error: PgError, context: &str) -> WdbError {
    let message = format!("{}: {}", context, format_postgres_error(&error));
    if is_bad_connection(&error) {
        WdbError::ConnectionLost(message)
    } else {
        WdbError::Query(message)
    }
}
