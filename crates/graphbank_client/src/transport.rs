//! RPC seam between the client and the remote store.

use crate::error::{ClientError, ClientResult};
use graphbank_model::{
    AlterRequest, MutateRequest, MutateResponse, QueryRequest, QueryResponse, RecordId, TxnContext,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// The remote procedure surface of the store.
///
/// This trait abstracts the transport, allowing different implementations
/// (HTTP, gRPC, an in-process store, mock for testing). Calls are
/// synchronous; retries and cancellation are not part of this contract.
pub trait StoreRpc: Send + Sync {
    /// Installs or updates the store-side schema. Idempotent.
    fn alter(&self, request: &AlterRequest) -> ClientResult<()>;

    /// Runs a query inside the given transaction context.
    fn query(&self, request: &QueryRequest) -> ClientResult<QueryResponse>;

    /// Applies a mutation inside the given transaction context.
    fn mutate(&self, request: &MutateRequest) -> ClientResult<MutateResponse>;

    /// Commits the transaction.
    fn commit(&self, txn: &TxnContext) -> ClientResult<()>;

    /// Discards the transaction, releasing its resources at the store.
    /// Safe to call for already-finished transactions.
    fn discard(&self, txn: &TxnContext) -> ClientResult<()>;

    /// Checks if the transport is connected.
    fn is_connected(&self) -> bool;

    /// Closes the transport connection.
    fn close(&self) -> ClientResult<()>;
}

/// A scriptable mock store for testing.
///
/// Query responses are served from a queue; each operation can be made to
/// fail with a store-side rejection message. Transaction contexts are bound
/// to monotonically increasing timestamps on first use, as a real store
/// would do.
#[derive(Debug, Default)]
pub struct MockRpc {
    connected: AtomicBool,
    next_ts: AtomicU64,
    query_responses: Mutex<VecDeque<QueryResponse>>,
    alter_rejection: Mutex<Option<String>>,
    query_rejection: Mutex<Option<String>>,
    mutate_rejection: Mutex<Option<String>>,
    commit_rejection: Mutex<Option<String>>,
    mutations: Mutex<Vec<MutateRequest>>,
    alters: AtomicU64,
    commits: AtomicU64,
    discards: AtomicU64,
}

impl MockRpc {
    /// Creates a new connected mock.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            next_ts: AtomicU64::new(1),
            ..Self::default()
        }
    }

    /// Queues a query response.
    pub fn push_query_response(&self, response: QueryResponse) {
        self.query_responses.lock().push_back(response);
    }

    /// Makes subsequent schema installs fail with the given reason.
    pub fn reject_alter(&self, reason: impl Into<String>) {
        *self.alter_rejection.lock() = Some(reason.into());
    }

    /// Makes subsequent queries fail with the given reason.
    pub fn reject_query(&self, reason: impl Into<String>) {
        *self.query_rejection.lock() = Some(reason.into());
    }

    /// Makes subsequent mutations fail with the given reason.
    pub fn reject_mutate(&self, reason: impl Into<String>) {
        *self.mutate_rejection.lock() = Some(reason.into());
    }

    /// Makes subsequent commits fail with the given reason.
    pub fn reject_commit(&self, reason: impl Into<String>) {
        *self.commit_rejection.lock() = Some(reason.into());
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Number of schema installs seen.
    pub fn alter_count(&self) -> u64 {
        self.alters.load(Ordering::SeqCst)
    }

    /// Number of commits seen.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of discards seen.
    pub fn discard_count(&self) -> u64 {
        self.discards.load(Ordering::SeqCst)
    }

    /// All mutation requests seen, in order.
    pub fn mutations(&self) -> Vec<MutateRequest> {
        self.mutations.lock().clone()
    }

    fn ensure_connected(&self) -> ClientResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ClientError::connection("store unreachable"))
        }
    }

    fn bind(&self, txn: &TxnContext) -> TxnContext {
        if txn.is_bound() {
            *txn
        } else {
            TxnContext::bound(self.next_ts.fetch_add(1, Ordering::SeqCst))
        }
    }
}

impl StoreRpc for MockRpc {
    fn alter(&self, _request: &AlterRequest) -> ClientResult<()> {
        self.ensure_connected()?;
        if let Some(reason) = self.alter_rejection.lock().clone() {
            return Err(ClientError::schema(reason));
        }
        self.alters.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn query(&self, request: &QueryRequest) -> ClientResult<QueryResponse> {
        self.ensure_connected()?;
        if let Some(reason) = self.query_rejection.lock().clone() {
            return Err(ClientError::query(reason));
        }
        let mut response = self
            .query_responses
            .lock()
            .pop_front()
            .ok_or_else(|| ClientError::transport("no scripted query response"))?;
        if !response.txn.is_bound() {
            response.txn = self.bind(&request.txn);
        }
        Ok(response)
    }

    fn mutate(&self, request: &MutateRequest) -> ClientResult<MutateResponse> {
        self.ensure_connected()?;
        if let Some(reason) = self.mutate_rejection.lock().clone() {
            return Err(ClientError::mutation(reason));
        }

        let mut response = MutateResponse {
            txn: self.bind(&request.txn),
            ..MutateResponse::default()
        };

        // Resolve a placeholder id in the create document, as the store would.
        if let Some(id) = request
            .mutation
            .set
            .as_ref()
            .and_then(|doc| doc.get("id"))
            .and_then(|id| id.as_str())
        {
            let id = RecordId::from(id);
            if let Some(label) = id.placeholder_label() {
                let uid = self.next_ts.fetch_add(1, Ordering::SeqCst);
                response
                    .assigned
                    .insert(label.to_string(), RecordId::assigned(format!("{uid:#x}")));
            }
        }

        self.mutations.lock().push(request.clone());
        Ok(response)
    }

    fn commit(&self, _txn: &TxnContext) -> ClientResult<()> {
        self.ensure_connected()?;
        if let Some(reason) = self.commit_rejection.lock().clone() {
            return Err(ClientError::mutation(reason));
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn discard(&self, _txn: &TxnContext) -> ClientResult<()> {
        self.discards.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&self) -> ClientResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphbank_model::{Mutation, Record};
    use serde_json::json;

    fn empty_response() -> QueryResponse {
        QueryResponse {
            txn: TxnContext::default(),
            json: json!({}),
            total_matches: 0,
        }
    }

    #[test]
    fn mock_connection_state() {
        let rpc = MockRpc::new();
        assert!(rpc.is_connected());

        rpc.close().unwrap();
        assert!(!rpc.is_connected());

        let err = rpc.alter(&AlterRequest::new("name: string .")).unwrap_err();
        assert!(matches!(err, ClientError::Connection { .. }));
    }

    #[test]
    fn queries_bind_fresh_contexts() {
        let rpc = MockRpc::new();
        rpc.push_query_response(empty_response());
        rpc.push_query_response(empty_response());

        let unbound = QueryRequest::new(TxnContext::default(), "{}", false);
        let first = rpc.query(&unbound).unwrap();
        assert!(first.txn.is_bound());

        // A bound request keeps its timestamp.
        let bound = QueryRequest::new(first.txn, "{}", false);
        let second = rpc.query(&bound).unwrap();
        assert_eq!(second.txn, first.txn);
    }

    #[test]
    fn exhausted_queue_is_a_transport_error() {
        let rpc = MockRpc::new();
        let request = QueryRequest::new(TxnContext::default(), "{}", false);
        let err = rpc.query(&request).unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
    }

    #[test]
    fn mutate_resolves_placeholders() {
        let rpc = MockRpc::new();
        let record = Record::create("Alice", 100, "user");
        let label = record.id.placeholder_label().unwrap().to_string();

        let request = MutateRequest::new(TxnContext::default(), Mutation::create(&record).unwrap());
        let response = rpc.mutate(&request).unwrap();

        let assigned = response.assigned.get(&label).unwrap();
        assert!(!assigned.is_placeholder());
        assert_eq!(rpc.mutations().len(), 1);
    }

    #[test]
    fn scripted_rejections() {
        let rpc = MockRpc::new();
        rpc.reject_commit("conflict: transaction aborted");

        let err = rpc.commit(&TxnContext::bound(1)).unwrap_err();
        assert!(matches!(err, ClientError::Mutation { .. }));

        rpc.reject_query("syntax error at line 1");
        let request = QueryRequest::new(TxnContext::default(), "{ bad", false);
        assert!(matches!(
            rpc.query(&request),
            Err(ClientError::Query { .. })
        ));
    }
}
