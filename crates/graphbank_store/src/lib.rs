//! In-memory reference store for GraphBank.
//!
//! [`MemStore`] implements the full RPC surface the client speaks:
//! schema installation, term-match queries, buffered mutations, and
//! timestamp-based optimistic commits. It backs integration tests and
//! the demo CLI, either called in-process through
//! [`StoreRpc`](graphbank_client::StoreRpc) or reached through the
//! JSON-over-HTTP loopback transport.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod query;
mod rpc;
mod schema;
mod store;

pub use error::{StoreError, StoreResult};
pub use schema::{FieldDecl, FieldType, StoreSchema, TypeDecl};
pub use store::MemStore;
