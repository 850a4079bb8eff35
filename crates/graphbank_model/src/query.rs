//! Query text building and result decoding.

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::wire::QueryResponse;

/// Alias under which query results are returned in the response JSON.
pub const RESULT_ALIAS: &str = "all";

/// Builds the term-match query used throughout the toggle workflow:
/// match any of the given words against the indexed `name` field,
/// projecting all record fields under [`RESULT_ALIAS`].
#[must_use]
pub fn by_name_terms(terms: &str) -> String {
    format!(
        r#"{{
  {RESULT_ALIAS}(func: anyofterms(name, "{terms}")) {{
    id
    name
    balance
    type_tags
  }}
}}"#
    )
}

/// The decoded response of a query: the matching records in store order,
/// plus the total-matches metric reported by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Records matching the predicate, in store order.
    pub records: Vec<Record>,
    /// Total number of matches.
    pub total: u64,
}

impl QueryResult {
    /// Decodes a wire response into records under [`RESULT_ALIAS`].
    ///
    /// A response without the alias decodes as an empty result; anything
    /// else that fails to match the record shape is a decode error.
    pub fn from_response(response: &QueryResponse) -> ModelResult<Self> {
        let object = response
            .json
            .as_object()
            .ok_or_else(|| ModelError::decode("query response is not a JSON object"))?;

        let records = match object.get(RESULT_ALIAS) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ModelError::decode(format!("bad record list: {e}")))?,
            None => Vec::new(),
        };

        Ok(Self {
            records,
            total: response.total_matches,
        })
    }

    /// Returns true if no records matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Returns the first matching record, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::TxnContext;
    use serde_json::json;

    #[test]
    fn query_text_embeds_terms_and_alias() {
        let q = by_name_terms("Vikram Mali");
        assert!(q.contains(r#"anyofterms(name, "Vikram Mali")"#));
        assert!(q.contains("all(func:"));
        assert!(q.contains("balance"));
        assert!(q.contains("type_tags"));
    }

    #[test]
    fn decodes_records_under_alias() {
        let response = QueryResponse {
            txn: TxnContext::default(),
            json: json!({"all": [{"id": "0x17", "name": "Alice", "balance": 100}]}),
            total_matches: 1,
        };

        let result = QueryResult::from_response(&response).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.first().unwrap().name, "Alice");
        assert_eq!(result.first().unwrap().balance, 100);
    }

    #[test]
    fn missing_alias_decodes_as_empty() {
        let response = QueryResponse {
            txn: TxnContext::default(),
            json: json!({}),
            total_matches: 0,
        };

        let result = QueryResult::from_response(&response).unwrap();
        assert!(result.is_empty());
        assert!(result.first().is_none());
    }

    #[test]
    fn non_object_response_is_a_decode_error() {
        let response = QueryResponse {
            txn: TxnContext::default(),
            json: json!([1, 2, 3]),
            total_matches: 0,
        };

        let err = QueryResult::from_response(&response).unwrap_err();
        assert!(matches!(err, ModelError::Decode { .. }));
    }

    #[test]
    fn malformed_record_list_is_a_decode_error() {
        let response = QueryResponse {
            txn: TxnContext::default(),
            json: json!({"all": "not a list"}),
            total_matches: 1,
        };

        assert!(QueryResult::from_response(&response).is_err());
    }
}
