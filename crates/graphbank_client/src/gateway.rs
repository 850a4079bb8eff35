//! Gateway to the remote store.

use crate::error::{ClientError, ClientResult};
use crate::transport::StoreRpc;
use crate::txn::Txn;
use graphbank_model::{AlterRequest, Schema};
use std::sync::Arc;
use tracing::info;

/// Opaque handle to the remote store.
///
/// A thin façade over the RPC surface: schema installation plus
/// transaction creation. The gateway holds no per-transaction state and
/// can be shared freely.
#[derive(Debug)]
pub struct StoreGateway<T: StoreRpc> {
    rpc: Arc<T>,
}

impl<T: StoreRpc> StoreGateway<T> {
    /// Creates a gateway over the given transport.
    pub fn new(rpc: T) -> Self {
        Self { rpc: Arc::new(rpc) }
    }

    /// Creates a gateway over a shared transport.
    pub fn from_shared(rpc: Arc<T>) -> Self {
        Self { rpc }
    }

    /// Declares the store-side schema. Idempotent.
    ///
    /// Mutates global store schema state shared across all transactions.
    /// Fails with a connection error if the store is unreachable, or a
    /// schema rejection if the store refuses the text.
    pub fn install_schema(&self, schema: &Schema) -> ClientResult<()> {
        if !self.rpc.is_connected() {
            return Err(ClientError::connection("store unreachable"));
        }
        self.rpc.alter(&AlterRequest::new(schema.text()))?;
        info!("schema installed");
        Ok(())
    }

    /// Opens a read-write transaction handle.
    ///
    /// No side effects until the handle is used.
    #[must_use]
    pub fn new_txn(&self) -> Txn<T> {
        Txn::new(Arc::clone(&self.rpc), false)
    }

    /// Opens a transaction handle restricted to query operations.
    ///
    /// Any mutate call on the handle fails with
    /// [`ClientError::ReadOnly`](crate::ClientError::ReadOnly).
    #[must_use]
    pub fn new_read_only_txn(&self) -> Txn<T> {
        Txn::new(Arc::clone(&self.rpc), true)
    }
}
