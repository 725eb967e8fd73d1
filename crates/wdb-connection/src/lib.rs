//! WDB Connection - Self-healing database connections
//!
//! This crate wraps a driver connection in a [`Guardian`] that notices lost
//! connections and redials them under a [`reconnect::ReconnectPolicy`].

mod config;
mod guardian;
pub mod health;
pub mod reconnect;

pub use config::Settings;
pub use guardian::{Guardian, GuardianConfig, GuardianState};
pub use health::{KeepaliveConfig, ping_database};
pub use reconnect::{BackoffStrategy, ReconnectEvent, ReconnectPolicy, WhileReconnecting};
