//! Local storage and the orchestrating order store

pub mod local;
pub mod orders;

pub use local::{LocalStore, StorageError, StorageResult};
pub use orders::{
    ClearOutcome, MutationOutcome, OrderStore, StatusReport, SyncOutcome, merge,
};
