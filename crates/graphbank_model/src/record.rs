//! The record entity and its identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Placeholder ids carry this prefix until the store resolves them.
const PLACEHOLDER_PREFIX: &str = "_:";

/// Opaque identifier for a record.
///
/// Either a store-assigned handle (existing record) or a client-chosen
/// placeholder (new record). A placeholder has no durable identity until a
/// successful commit resolves it to a store-assigned id.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates an id from a store-assigned handle.
    #[must_use]
    pub fn assigned(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a placeholder id with the given label.
    #[must_use]
    pub fn placeholder(label: impl AsRef<str>) -> Self {
        Self(format!("{PLACEHOLDER_PREFIX}{}", label.as_ref()))
    }

    /// Creates a placeholder id with a random label.
    #[must_use]
    pub fn random_placeholder() -> Self {
        Self::placeholder(Uuid::new_v4().simple().to_string())
    }

    /// Returns true if this is a client-chosen placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    /// Returns the placeholder label, if this is a placeholder.
    #[must_use]
    pub fn placeholder_label(&self) -> Option<&str> {
        self.0.strip_prefix(PLACEHOLDER_PREFIX)
    }

    /// Returns true if the id is unset (decoded from an absent field).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

fn is_zero(balance: &i64) -> bool {
    *balance == 0
}

/// One entity exchanged with the store.
///
/// Records are read-only projections fetched per query. Empty/zero fields
/// are omitted on serialization and absent fields decode to zero values;
/// type and range checks are the store's responsibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record identifier.
    #[serde(default, skip_serializing_if = "RecordId::is_empty")]
    pub id: RecordId,

    /// Display name, term-indexed by the store.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Integer balance attribute.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub balance: i64,

    /// Type labels used by the store for schema association.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_tags: Vec<String>,
}

impl Record {
    /// Builds a new record with a random placeholder id, ready for a
    /// create mutation.
    #[must_use]
    pub fn create(name: impl Into<String>, balance: i64, type_tag: impl Into<String>) -> Self {
        Self {
            id: RecordId::random_placeholder(),
            name: name.into(),
            balance,
            type_tags: vec![type_tag.into()],
        }
    }

    /// Returns true if the record carries the given type tag.
    #[must_use]
    pub fn has_type(&self, tag: &str) -> bool {
        self.type_tags.iter().any(|t| t == tag)
    }
}
