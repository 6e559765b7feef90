//! Remote datastore gateway
//!
//! Everything that touches the network lives behind [`RemoteChannel`]
//! so the store core can be driven against a scripted remote in tests.

pub mod channel;
pub mod error;
pub mod gateway;

pub use error::RemoteError;
pub use gateway::RemoteGateway;

use async_trait::async_trait;
use shared::Order;
use shared::cloud::RemoteAction;

/// Outcome of a connectivity probe
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub reachable: bool,
    pub message: String,
}

/// The two remote capabilities the store depends on: mirroring a
/// mutation and reading the full remote list.
///
/// Implementations fold transport failure, non-2xx status, and
/// remote-reported failure into [`RemoteError`]; nothing here ever
/// panics or hangs indefinitely.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Lightweight connectivity check
    async fn probe(&self) -> ProbeOutcome;

    /// Mirror one mutating action to the remote
    async fn submit(&self, action: RemoteAction) -> Result<(), RemoteError>;

    /// Retrieve the full remote order list; soft-fails to empty
    async fn fetch_all(&self) -> Vec<Order>;
}
