//! # GraphBank Model
//!
//! Record model and wire types shared by the GraphBank client and store.
//!
//! This crate provides:
//! - The [`Record`] entity shape and its sparse JSON encoding
//! - [`RecordId`] (store-assigned uid or client-chosen placeholder)
//! - Query text building and [`QueryResult`] decoding
//! - [`Mutation`] documents (create-with-placeholder or delete-by-id)
//! - The schema declaration sent to the store at startup
//! - Request/response envelopes exchanged over the store RPC surface
//!
//! ## Key Invariants
//!
//! - Empty/zero fields are omitted on serialization; absent fields decode
//!   to zero values
//! - A record with a placeholder id has no durable identity until a commit
//!   resolves it
//! - Records are read-only projections; state changes travel as mutation
//!   documents, never as in-place edits

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod mutation;
mod query;
mod record;
mod schema;
mod wire;

pub use error::{ModelError, ModelResult};
pub use mutation::Mutation;
pub use query::{by_name_terms, QueryResult, RESULT_ALIAS};
pub use record::{Record, RecordId};
pub use schema::{Schema, ACCOUNT_SCHEMA};
pub use wire::{AlterRequest, MutateRequest, MutateResponse, QueryRequest, QueryResponse, TxnContext};
