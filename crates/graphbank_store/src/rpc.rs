//! Client-facing adapters for [`MemStore`].
//!
//! Two surfaces are provided: a direct [`StoreRpc`] implementation for
//! in-process use, and a [`LoopbackServer`] implementation that speaks
//! the JSON-over-HTTP envelope for tests running through the full
//! transport stack.

use crate::error::{StoreError, StoreResult};
use crate::store::MemStore;
use graphbank_client::{
    ClientError, ClientResult, HttpEnvelope, LoopbackServer, StoreRpc, WireErrorKind,
};
use graphbank_model::{
    AlterRequest, MutateRequest, MutateResponse, QueryRequest, QueryResponse, TxnContext,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

fn into_client_error(err: StoreError) -> ClientError {
    match err {
        StoreError::SchemaRejected { message } => ClientError::schema(message),
        StoreError::QueryRejected { message } => ClientError::query(message),
        StoreError::MutationRejected { .. } | StoreError::Conflict { .. } => {
            ClientError::mutation(err.to_string())
        }
        StoreError::ReadOnlyTxn => ClientError::ReadOnly,
        StoreError::BadRequest { message } => ClientError::transport(message),
    }
}

fn wire_kind(err: &StoreError) -> WireErrorKind {
    match err {
        StoreError::SchemaRejected { .. } => WireErrorKind::Schema,
        StoreError::QueryRejected { .. } => WireErrorKind::Query,
        StoreError::MutationRejected { .. } | StoreError::Conflict { .. } => WireErrorKind::Mutation,
        StoreError::ReadOnlyTxn => WireErrorKind::ReadOnly,
        StoreError::BadRequest { .. } => WireErrorKind::Transport,
    }
}

impl StoreRpc for MemStore {
    fn alter(&self, request: &AlterRequest) -> ClientResult<()> {
        self.handle_alter(request).map_err(into_client_error)
    }

    fn query(&self, request: &QueryRequest) -> ClientResult<QueryResponse> {
        self.handle_query(request).map_err(into_client_error)
    }

    fn mutate(&self, request: &MutateRequest) -> ClientResult<MutateResponse> {
        self.handle_mutate(request).map_err(into_client_error)
    }

    fn commit(&self, txn: &TxnContext) -> ClientResult<()> {
        self.handle_commit(txn).map_err(into_client_error)
    }

    fn discard(&self, txn: &TxnContext) -> ClientResult<()> {
        self.handle_discard(txn).map_err(into_client_error)
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn close(&self) -> ClientResult<()> {
        Ok(())
    }
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, String> {
    serde_json::from_slice(body).map_err(|e| format!("bad request body: {e}"))
}

fn respond<T: Serialize>(result: StoreResult<T>) -> Result<Vec<u8>, String> {
    let envelope = match result {
        Ok(data) => HttpEnvelope::ok(data),
        Err(err) => HttpEnvelope::fail(wire_kind(&err), err.to_string()),
    };
    serde_json::to_vec(&envelope).map_err(|e| format!("failed to encode response: {e}"))
}

impl LoopbackServer for MemStore {
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        match path {
            "/alter" => respond(self.handle_alter(&decode_body(body)?).map(|()| json!({}))),
            "/query" => respond(self.handle_query(&decode_body(body)?)),
            "/mutate" => respond(self.handle_mutate(&decode_body(body)?)),
            "/commit" => respond(self.handle_commit(&decode_body(body)?).map(|()| json!({}))),
            "/discard" => respond(self.handle_discard(&decode_body(body)?).map(|()| json!({}))),
            other => Err(format!("no such endpoint: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphbank_model::{by_name_terms, Mutation, Record};

    #[test]
    fn read_only_violation_maps_to_the_client_taxonomy() {
        let store = MemStore::new();
        store
            .handle_alter(&AlterRequest::new(graphbank_model::ACCOUNT_SCHEMA))
            .unwrap();
        let ctx = StoreRpc::query(
            &store,
            &QueryRequest::new(TxnContext::default(), by_name_terms("Alice"), true),
        )
        .unwrap()
        .txn;

        let record = Record::create("Alice", 5, "user");
        let request = MutateRequest {
            txn: ctx,
            mutation: Mutation::create(&record).unwrap(),
        };
        let err = StoreRpc::mutate(&store, &request).unwrap_err();
        assert!(matches!(err, ClientError::ReadOnly));
    }

    #[test]
    fn loopback_wraps_handler_errors_in_the_envelope() {
        let store = MemStore::new();
        let request = QueryRequest::new(TxnContext::default(), "{ bad", false);
        let body = serde_json::to_vec(&request).unwrap();

        let response = store.handle_post("/query", &body).unwrap();
        let envelope: HttpEnvelope<QueryResponse> = serde_json::from_slice(&response).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert!(matches!(err, ClientError::Query { .. }));
    }

    #[test]
    fn loopback_rejects_unknown_paths_and_garbage_bodies() {
        let store = MemStore::new();
        assert!(store.handle_post("/unknown", b"{}").is_err());
        assert!(store.handle_post("/query", b"not json").is_err());
    }
}
