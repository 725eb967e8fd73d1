//! Connection health: timed pings and the keepalive task

mod keepalive;
mod ping;

pub use keepalive::{KeepaliveConfig, spawn_keepalive};
pub use ping::ping_database;
