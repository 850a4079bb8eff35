//! # GraphBank Client
//!
//! Store gateway and transactional toggle workflow for a remote
//! graph-structured, schema-on-write store.
//!
//! This crate provides:
//! - The [`StoreRpc`] transport seam (with a scriptable [`MockRpc`] and a
//!   JSON-over-HTTP [`HttpTransport`])
//! - [`StoreGateway`]: schema installation and transaction creation
//! - [`Txn`]: one unit-of-work supporting query, mutate, commit, discard
//! - [`ToggleWorkflow`]: the read-decide-write cycle that creates a record
//!   when the predicate has no match and deletes the first match otherwise
//!
//! ## Architecture
//!
//! The workflow runs on one logical thread: one query, one decision, one
//! mutation, sequentially. Conflict detection is delegated entirely to the
//! store's optimistic concurrency control; a conflicting concurrent commit
//! surfaces as a mutation rejection. No retry is attempted anywhere:
//! every error propagates to a single top-level handler that decides
//! termination.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod gateway;
mod http;
mod transport;
mod txn;
mod workflow;

pub use config::StoreConfig;
pub use error::{ClientError, ClientResult};
pub use gateway::StoreGateway;
pub use http::{HttpClient, HttpEnvelope, HttpTransport, LoopbackClient, LoopbackServer, WireError, WireErrorKind};
pub use transport::{MockRpc, StoreRpc};
pub use txn::{Txn, TxnState};
pub use workflow::{Decision, ToggleOutcome, TogglePhase, ToggleSpec, ToggleWorkflow};
