//! Guardian lifecycle state

use tokio::sync::watch;

/// Where the guardian is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardianState {
    /// A connection is installed, or the last reconnect gave up
    Idle,
    /// Exactly one task is replacing the connection
    Reconnecting,
    /// Closed for good
    Closed,
}

/// Resolve once the guardian is closed or dropped
pub(crate) async fn wait_closed(state: &mut watch::Receiver<GuardianState>) {
    // A dropped sender means the guardian is gone, which counts as closed
    let _ = state.wait_for(|state| *state == GuardianState::Closed).await;
}

/// Resolve once no reconnect is running. `false` if the guardian was
/// dropped while waiting.
pub(crate) async fn wait_settled(state: &mut watch::Receiver<GuardianState>) -> bool {
    state
        .wait_for(|state| *state != GuardianState::Reconnecting)
        .await
        .is_ok()
}
