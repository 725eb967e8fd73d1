//! Reconnect policy and the events a reconnect emits

use serde::{Deserialize, Serialize};

use super::BackoffStrategy;

/// How the guardian redials after losing its connection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Dials before giving up; `None` keeps dialing until it succeeds or
    /// the guardian is closed. Every reconnect makes at least one dial.
    pub max_attempts: Option<u32>,
    /// Delay between failed dials
    pub backoff: BackoffStrategy,
}

impl ReconnectPolicy {
    /// Keep dialing until a connection is established
    pub fn unbounded(backoff: BackoffStrategy) -> Self {
        Self {
            max_attempts: None,
            backoff,
        }
    }

    /// Give up after `max_attempts` failed dials
    pub fn bounded(max_attempts: u32, backoff: BackoffStrategy) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether `attempts` failed dials use up the budget
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// What an operation does when it arrives during a reconnect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhileReconnecting {
    /// Wait for the reconnect to finish, then use the new connection
    #[default]
    Wait,
    /// Fail at once with `WdbError::Reconnecting`
    FailFast,
}

/// Reconnection event for monitoring
#[derive(Debug, Clone, PartialEq)]
pub enum ReconnectEvent {
    /// A dial is starting
    Attempting {
        attempt: u32,
        max_attempts: Option<u32>,
    },
    /// A dial succeeded and the new connection is about to be installed
    Succeeded { attempts_taken: u32 },
    /// A dial failed
    Failed { attempt: u32, error: String },
    /// The bounded policy ran out of attempts
    Exhausted { total_attempts: u32 },
}
