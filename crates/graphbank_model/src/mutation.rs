//! Mutation documents sent to the store.

use crate::error::{ModelError, ModelResult};
use crate::record::{Record, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A mutation payload: either a create document (full record with a
/// placeholder id) or a delete document (only the target id).
///
/// Exactly one of the two members is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    /// Create document, if this is a create mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<Value>,

    /// Delete document, if this is a delete mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Value>,
}

impl Mutation {
    /// Builds a create mutation from a record.
    ///
    /// The record is expected to carry a placeholder id; the store resolves
    /// it to a durable id on commit.
    pub fn create(record: &Record) -> ModelResult<Self> {
        let set = serde_json::to_value(record)
            .map_err(|e| ModelError::encode(format!("record: {e}")))?;
        Ok(Self {
            set: Some(set),
            delete: None,
        })
    }

    /// Builds a delete mutation referencing only the given id.
    ///
    /// Other fields of the targeted record do not matter; only existence
    /// and identity do.
    #[must_use]
    pub fn delete(id: &RecordId) -> Self {
        Self {
            set: None,
            delete: Some(json!({ "id": id })),
        }
    }

    /// Returns true if this is a create mutation.
    #[must_use]
    pub fn is_create(&self) -> bool {
        self.set.is_some()
    }

    /// Returns true if this is a delete mutation.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.delete.is_some()
    }
}
