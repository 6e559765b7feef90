//! Remote datastore wire protocol

mod protocol;

pub use protocol::{FetchResponse, MutationResponse, ProbeResponse, RemoteAction};
