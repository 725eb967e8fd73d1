//! WDB Core - Shared abstractions for guarded database access
//!
//! This crate provides the traits and types that the driver crates and the
//! connection guardian depend on. It defines:
//!
//! - `DatabaseDriver` - Trait for database driver implementations
//! - `Connection` - Trait for an open database session
//! - `Endpoint` - Where and how to reach a database
//! - `FromValue` / `FromRow` - Decoding results into Rust types
//! - `BindStyle` / `rebind` - Placeholder rewriting per driver
//! - Common types like `Value`, `Row`, `QueryResult`, etc.

mod bind;
mod connection;
mod decode;
mod driver;
mod error;
mod types;

pub use bind::*;
pub use connection::*;
pub use decode::*;
pub use driver::*;
pub use error::*;
pub use types::*;
