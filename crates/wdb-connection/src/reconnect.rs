//! Reconnect policy for the connection guardian
//!
//! Describes how many times to dial, how long to wait between dials and
//! what callers do while a reconnect is running.
//!
//! # Example
//!
//! ```
//! use wdb_connection::reconnect::{BackoffStrategy, ReconnectPolicy};
//!
//! // Give up after 5 dials, waiting 100ms, 200ms, 400ms, ... in between
//! let policy = ReconnectPolicy::bounded(5, BackoffStrategy::new(100, 5_000));
//! assert_eq!(policy.max_attempts, Some(5));
//! ```

mod backoff;
mod policy;


pub use backoff::BackoffStrategy;
pub use policy::{ReconnectEvent, ReconnectPolicy, WhileReconnecting};
