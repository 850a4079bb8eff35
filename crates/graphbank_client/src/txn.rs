//! Transaction handles.

use crate::error::{ClientError, ClientResult};
use crate::transport::StoreRpc;
use graphbank_model::{
    MutateRequest, MutateResponse, Mutation, QueryRequest, QueryResult, TxnContext,
};
use std::sync::Arc;
use tracing::debug;

/// State of a transaction handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    /// The handle can perform operations.
    Active,
    /// The transaction has been committed.
    Committed,
    /// The transaction has been discarded.
    Discarded,
}

impl TxnState {
    fn name(&self) -> &'static str {
        match self {
            TxnState::Active => "active",
            TxnState::Committed => "committed",
            TxnState::Discarded => "discarded",
        }
    }
}

/// One unit-of-work against the store.
///
/// A fresh handle has no store-side footprint: the store binds it to a
/// snapshot timestamp on the first query or mutate. The handle observes
/// that snapshot for all reads; conflicting commits by other transactions
/// surface as a mutation rejection at commit time (optimistic concurrency,
/// entirely delegated to the store).
///
/// Handles are not shared across concurrent callers, and must be discarded
/// before being abandoned; [`Txn::discard`] is idempotent and is a no-op
/// after commit.
#[derive(Debug)]
pub struct Txn<T: StoreRpc> {
    rpc: Arc<T>,
    context: TxnContext,
    read_only: bool,
    state: TxnState,
}

impl<T: StoreRpc> Txn<T> {
    pub(crate) fn new(rpc: Arc<T>, read_only: bool) -> Self {
        Self {
            rpc,
            context: TxnContext::default(),
            read_only,
            state: TxnState::Active,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TxnState {
        self.state
    }

    /// Returns true if the handle can still perform operations.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TxnState::Active
    }

    /// Returns true if this handle is restricted to queries.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the transaction context.
    #[must_use]
    pub fn context(&self) -> TxnContext {
        self.context
    }

    /// Runs a query and decodes the result set.
    ///
    /// Reads are not mutations: no store state changes. Fails with a query
    /// rejection for malformed text, or a transport error on RPC failure.
    pub fn query(&mut self, query: &str) -> ClientResult<QueryResult> {
        self.ensure_active("query")?;

        let request = QueryRequest::new(self.context, query, self.read_only);
        let response = self.rpc.query(&request)?;
        self.merge_context(&response.txn)?;

        let result = QueryResult::from_response(&response)?;
        debug!(start_ts = self.context.start_ts, total = result.total, "query done");
        Ok(result)
    }

    /// Sends a mutation payload.
    ///
    /// Fails with [`ClientError::ReadOnly`] on a read-only handle and with
    /// a mutation rejection if the store refuses the write.
    pub fn mutate(&mut self, mutation: &Mutation) -> ClientResult<MutateResponse> {
        self.ensure_active("mutate")?;
        if self.read_only {
            return Err(ClientError::ReadOnly);
        }

        let request = MutateRequest::new(self.context, mutation.clone());
        let response = self.rpc.mutate(&request)?;
        self.merge_context(&response.txn)?;
        Ok(response)
    }

    /// Commits the transaction, making its writes durable.
    ///
    /// A conflicting concurrent commit surfaces here as a mutation
    /// rejection; the handle stays discardable.
    pub fn commit(&mut self) -> ClientResult<()> {
        self.ensure_active("commit")?;
        if self.read_only {
            return Err(ClientError::ReadOnly);
        }

        // Never used at the store; nothing to make durable.
        if !self.context.is_bound() {
            self.state = TxnState::Committed;
            return Ok(());
        }

        self.rpc.commit(&self.context)?;
        self.state = TxnState::Committed;
        debug!(start_ts = self.context.start_ts, "transaction committed");
        Ok(())
    }

    /// Releases the transaction's resources at the store without
    /// persisting changes.
    ///
    /// Idempotent: calling it after a commit or a prior discard is a
    /// no-op. Must run on every exit path before the handle is abandoned.
    pub fn discard(&mut self) -> ClientResult<()> {
        match self.state {
            TxnState::Committed | TxnState::Discarded => return Ok(()),
            TxnState::Active => {}
        }
        self.state = TxnState::Discarded;

        if !self.context.is_bound() {
            return Ok(());
        }
        self.rpc.discard(&self.context)
    }

    fn ensure_active(&self, attempted: &str) -> ClientResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(ClientError::invalid_state(self.state.name(), attempted))
        }
    }

    fn merge_context(&mut self, other: &TxnContext) -> ClientResult<()> {
        if !self.context.is_bound() {
            self.context = *other;
            return Ok(());
        }
        if other.is_bound() && other.start_ts != self.context.start_ts {
            return Err(ClientError::transport(format!(
                "transaction context mismatch: {} != {}",
                other.start_ts, self.context.start_ts
            )));
        }
        Ok(())
    }
}
