//! Request/response envelopes exchanged over the store RPC surface.

use crate::mutation::Mutation;
use crate::record::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Client-side view of one unit-of-work at the store.
///
/// A fresh handle starts unbound (`start_ts == 0`); the store assigns the
/// snapshot timestamp on the first query or mutate and echoes it back in
/// every response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnContext {
    /// Snapshot timestamp; zero until the store binds the transaction.
    pub start_ts: u64,
}

impl TxnContext {
    /// Creates a context bound to the given snapshot timestamp.
    #[must_use]
    pub fn bound(start_ts: u64) -> Self {
        Self { start_ts }
    }

    /// Returns true if the store has assigned a snapshot timestamp.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.start_ts != 0
    }
}

/// Schema installation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterRequest {
    /// Schema declaration text.
    pub schema: String,
}

impl AlterRequest {
    /// Creates an alter request from schema text.
    #[must_use]
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }
}

/// Query request carried inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Transaction context (may be unbound on first use).
    pub txn: TxnContext,
    /// Whether the issuing handle is restricted to queries.
    pub read_only: bool,
    /// Query text in the store's query language.
    pub query: String,
}

impl QueryRequest {
    /// Creates a query request.
    #[must_use]
    pub fn new(txn: TxnContext, query: impl Into<String>, read_only: bool) -> Self {
        Self {
            txn,
            read_only,
            query: query.into(),
        }
    }
}

/// Query response: raw result JSON plus the total-matches metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Transaction context echoed (and possibly bound) by the store.
    pub txn: TxnContext,
    /// Result JSON, records listed under the query alias.
    pub json: Value,
    /// Total number of matching records.
    pub total_matches: u64,
}

/// Mutation request carried inside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutateRequest {
    /// Transaction context (may be unbound on first use).
    pub txn: TxnContext,
    /// The mutation document.
    pub mutation: Mutation,
}

impl MutateRequest {
    /// Creates a mutate request.
    #[must_use]
    pub fn new(txn: TxnContext, mutation: Mutation) -> Self {
        Self { txn, mutation }
    }
}

/// Mutation response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutateResponse {
    /// Transaction context echoed (and possibly bound) by the store.
    pub txn: TxnContext,
    /// Placeholder label to assigned id, for create mutations.
    ///
    /// Assigned ids become durable and queryable only once the
    /// transaction commits.
    #[serde(default)]
    pub assigned: HashMap<String, RecordId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_context_is_unbound() {
        let ctx = TxnContext::default();
        assert!(!ctx.is_bound());
        assert!(TxnContext::bound(7).is_bound());
    }

    #[test]
    fn query_request_round_trip() {
        let req = QueryRequest::new(TxnContext::bound(3), "{ all(...) }", true);
        let bytes = serde_json::to_string(&req).unwrap();
        let decoded: QueryRequest = serde_json::from_str(&bytes).unwrap();
        assert_eq!(req, decoded);
    }

    #[test]
    fn mutate_response_defaults_assigned() {
        let decoded: MutateResponse =
            serde_json::from_value(json!({"txn": {"start_ts": 5}})).unwrap();
        assert_eq!(decoded.txn.start_ts, 5);
        assert!(decoded.assigned.is_empty());
    }
}
