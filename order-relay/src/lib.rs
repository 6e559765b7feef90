//! Order Relay — resilient local order store with opportunistic cloud
//! mirroring
//!
//! Keeps an authoritative local copy of an order list in embedded
//! storage and best-effort mirrors every mutation to a remote
//! datastore over HTTP. The remote may be unreachable, misconfigured,
//! or slow; the local copy never waits on it and never fails because
//! of it.
//!
//! The application entry point constructs one [`OrderStore`] and
//! passes it by handle to consumers; there is no process-wide
//! singleton. Call [`OrderStore::init`] to settle remote reachability
//! before the first mutation and [`OrderStore::shutdown`] when done.

pub mod cloud;
pub mod core;
pub mod export;
pub mod store;
pub mod utils;

pub use crate::cloud::{ProbeOutcome, RemoteChannel, RemoteError, RemoteGateway};
pub use crate::core::config::Config;
pub use crate::store::{LocalStore, OrderStore, StorageError, StorageResult};
