//! WDB Drivers - Database driver implementations
//!
//! This crate bundles the concrete drivers behind cargo features and a
//! registry that resolves an endpoint's driver kind to one of them.

#[cfg(feature = "mysql")]
pub use wdb_driver_mysql as mysql;
#[cfg(feature = "postgres")]
pub use wdb_driver_postgres as postgres;

mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from wdb-core
pub use wdb_core::{
    Connection, DatabaseDriver, Endpoint, QueryResult, Result, Row, StatementResult, Value,
    WdbError,
};
