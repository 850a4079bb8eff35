//! Error types for the client.

use graphbank_model::ModelError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the store.
///
/// None of these are recovered locally: every error is reported at the
/// point of detection and escalates to the caller, which decides
/// termination.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote store is unreachable.
    #[error("connection error: {message}")]
    Connection {
        /// Description of the failure.
        message: String,
    },

    /// The store rejected the schema text.
    #[error("schema rejected: {message}")]
    Schema {
        /// Store-side rejection reason.
        message: String,
    },

    /// The store rejected the query text.
    #[error("query rejected: {message}")]
    Query {
        /// Store-side rejection reason.
        message: String,
    },

    /// RPC-level failure mid-call.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// The store rejected a write, e.g. a conflicting concurrent
    /// transaction or a constraint violation.
    #[error("mutation rejected: {message}")]
    Mutation {
        /// Store-side rejection reason.
        message: String,
    },

    /// A response did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] ModelError),

    /// A mutation was attempted on a read-only transaction handle.
    #[error("mutation attempted on a read-only transaction")]
    ReadOnly,

    /// An operation was attempted on a finished transaction handle.
    #[error("invalid operation on a {state} transaction: {attempted}")]
    InvalidState {
        /// State the handle was in.
        state: String,
        /// The attempted operation.
        attempted: String,
    },
}

impl ClientError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a schema rejection error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Creates a query rejection error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a mutation rejection error.
    pub fn mutation(message: impl Into<String>) -> Self {
        Self::Mutation {
            message: message.into(),
        }
    }

    /// Creates an invalid-state error.
    pub fn invalid_state(state: impl Into<String>, attempted: impl Into<String>) -> Self {
        Self::InvalidState {
            state: state.into(),
            attempted: attempted.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ClientError::connection("dial tcp refused");
        assert_eq!(err.to_string(), "connection error: dial tcp refused");

        let err = ClientError::ReadOnly;
        assert!(err.to_string().contains("read-only"));

        let err = ClientError::invalid_state("committed", "mutate");
        assert!(err.to_string().contains("committed"));
        assert!(err.to_string().contains("mutate"));
    }

    #[test]
    fn decode_errors_convert_from_model() {
        let err: ClientError = ModelError::decode("expected object").into();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
