//! MySQL/MariaDB driver
//!
//! Talks to the server through `mysql_async`. Each connection owns a small
//! pool sized by the `max_open_conns` endpoint parameter.

mod connection;
mod driver;
mod error;

pub use connection::MySqlConnection;
pub use driver::MySqlDriver;

#[cfg(test)]
mod driver_tests;
