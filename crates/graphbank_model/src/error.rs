//! Error types for the model crate.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while encoding or decoding wire shapes.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A response did not match the expected shape.
    #[error("decode error: {message}")]
    Decode {
        /// Description of the shape mismatch.
        message: String,
    },

    /// A value could not be serialized to its wire form.
    #[error("encode error: {message}")]
    Encode {
        /// Description of the failure.
        message: String,
    },
}

impl ModelError {
    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::decode("expected object");
        assert_eq!(err.to_string(), "decode error: expected object");

        let err = ModelError::encode("unserializable");
        assert!(err.to_string().starts_with("encode error"));
    }
}
