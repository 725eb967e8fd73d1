//! PostgreSQL driver
//!
//! Plain-TCP sessions through `tokio-postgres`. The connection task is
//! spawned on the caller's tokio runtime and aborted on close.

mod connection;
mod driver;
mod error;
mod values;

pub use connection::PostgresConnection;
pub use driver::PostgresDriver;

#[cfg(test)]
mod driver_tests;
