//! Shared types for the order relay
//!
//! Wire-contract types used by both sides of the remote protocol:
//! the order record itself, the remote endpoint actions and response
//! envelopes, and small time utilities.

pub mod cloud;
pub mod models;
pub mod util;

// Re-exports
pub use models::Order;
pub use serde::{Deserialize, Serialize};
