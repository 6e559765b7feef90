//! Remote call error types

use thiserror::Error;

/// A failed remote call.
///
/// These never escape the store boundary as hard failures; the store
/// folds them into soft outcome fields. The variant matters for one
/// decision only: transport failures demote the remote for the rest of
/// the session, rejections do not (the remote is reachable, it just
/// said no).
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network unreachable, connection refused, or timed out
    #[error("Transport failure: {0}")]
    Transport(String),

    /// HTTP non-2xx, unreadable payload, or remote-reported failure
    #[error("Remote rejected: {0}")]
    Rejected(String),
}

impl RemoteError {
    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }
}
