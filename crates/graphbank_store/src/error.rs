//! Error types for the reference store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by the reference store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The schema text was rejected.
    #[error("schema rejected: {message}")]
    SchemaRejected {
        /// Rejection reason.
        message: String,
    },

    /// The query text was rejected.
    #[error("query rejected: {message}")]
    QueryRejected {
        /// Rejection reason.
        message: String,
    },

    /// A mutation was rejected (constraint violation or malformed payload).
    #[error("mutation rejected: {message}")]
    MutationRejected {
        /// Rejection reason.
        message: String,
    },

    /// A commit lost an optimistic-concurrency race.
    #[error("transaction conflict: {message}")]
    Conflict {
        /// Description of the conflicting write.
        message: String,
    },

    /// A mutation arrived on a transaction opened read-only.
    #[error("read-only transaction cannot mutate")]
    ReadOnlyTxn,

    /// The request itself was malformed.
    #[error("bad request: {message}")]
    BadRequest {
        /// Description of the problem.
        message: String,
    },
}

impl StoreError {
    /// Creates a schema rejection.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaRejected {
            message: message.into(),
        }
    }

    /// Creates a query rejection.
    pub fn query(message: impl Into<String>) -> Self {
        Self::QueryRejected {
            message: message.into(),
        }
    }

    /// Creates a mutation rejection.
    pub fn mutation(message: impl Into<String>) -> Self {
        Self::MutationRejected {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a bad-request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }
}
