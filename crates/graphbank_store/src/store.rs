//! In-memory store state and request handlers.
//!
//! [`MemStore`] keeps all state behind one lock: the installed schema,
//! committed records, per-transaction sessions, and the last-commit
//! timestamps used for optimistic conflict detection.

use crate::error::{StoreError, StoreResult};
use crate::query;
use crate::schema::StoreSchema;
use graphbank_model::{
    AlterRequest, MutateRequest, MutateResponse, QueryRequest, QueryResponse, RecordId, TxnContext,
};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Placeholder id prefix on incoming set documents.
const PLACEHOLDER_PREFIX: &str = "_:";

enum PendingWrite {
    Create { uid: u64, doc: Map<String, Value> },
    Delete { uid: u64 },
}

struct TxnSession {
    read_only: bool,
    writes: Vec<PendingWrite>,
    conflict_keys: HashSet<String>,
}

impl TxnSession {
    fn new(read_only: bool) -> Self {
        Self {
            read_only,
            writes: Vec::new(),
            conflict_keys: HashSet::new(),
        }
    }
}

/// Committed versions of one record, in commit order. `None` is a
/// deletion tombstone.
type Versions = Vec<(u64, Option<Map<String, Value>>)>;

fn visible_at(versions: &Versions, ts: u64) -> Option<&Map<String, Value>> {
    versions
        .iter()
        .rev()
        .find(|(commit_ts, _)| *commit_ts <= ts)
        .and_then(|(_, doc)| doc.as_ref())
}

#[derive(Default)]
struct StoreInner {
    schema: Option<StoreSchema>,
    next_ts: u64,
    next_uid: u64,
    records: HashMap<u64, Versions>,
    last_commit: HashMap<String, u64>,
    sessions: HashMap<u64, TxnSession>,
}

impl StoreInner {
    fn bind(&mut self, ctx: &TxnContext, read_only: bool) -> StoreResult<u64> {
        if ctx.is_bound() {
            if !self.sessions.contains_key(&ctx.start_ts) {
                return Err(StoreError::bad_request(format!(
                    "unknown transaction {}",
                    ctx.start_ts
                )));
            }
            return Ok(ctx.start_ts);
        }
        self.next_ts += 1;
        let ts = self.next_ts;
        self.sessions.insert(ts, TxnSession::new(read_only));
        Ok(ts)
    }
}

/// In-memory reference store.
///
/// One instance serves any number of concurrent transactions. Writes are
/// buffered per session and only become visible at commit; commits are
/// checked against the conflict keys touched by the session.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<StoreInner>,
}

fn parse_uid(id: &str) -> StoreResult<u64> {
    id.strip_prefix("0x")
        .and_then(|hex| u64::from_str_radix(hex, 16).ok())
        .ok_or_else(|| StoreError::mutation(format!("bad record id: {id}")))
}

fn name_terms(doc: &Map<String, Value>) -> Vec<String> {
    doc.get("name")
        .and_then(Value::as_str)
        .map(|name| name.split_whitespace().map(str::to_lowercase).collect())
        .unwrap_or_default()
}

impl MemStore {
    /// Creates an empty store with no schema installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or replaces) the schema.
    pub fn handle_alter(&self, request: &AlterRequest) -> StoreResult<()> {
        let schema = StoreSchema::parse(&request.schema)?;
        self.inner.write().schema = Some(schema);
        debug!("schema installed");
        Ok(())
    }

    /// Runs a query, binding the transaction to a timestamp if needed.
    ///
    /// Reads observe the snapshot bound at query time: commits after the
    /// transaction's start timestamp and the session's own buffered
    /// writes are both invisible.
    pub fn handle_query(&self, request: &QueryRequest) -> StoreResult<QueryResponse> {
        let parsed = query::parse(&request.query)?;

        let mut inner = self.inner.write();
        let schema = inner
            .schema
            .as_ref()
            .ok_or_else(|| StoreError::query("no schema installed"))?;
        if !schema.is_term_indexed(&parsed.field) {
            return Err(StoreError::query(format!(
                "field {} is not term-indexed",
                parsed.field
            )));
        }

        let ts = inner.bind(&request.txn, request.read_only)?;

        let mut matches: Vec<(u64, &Map<String, Value>)> = inner
            .records
            .iter()
            .filter_map(|(uid, versions)| visible_at(versions, ts).map(|doc| (*uid, doc)))
            .filter(|(_, doc)| {
                doc.get(&parsed.field)
                    .and_then(Value::as_str)
                    .map(|value| {
                        value
                            .split_whitespace()
                            .any(|token| parsed.terms.iter().any(|t| t == &token.to_lowercase()))
                    })
                    .unwrap_or(false)
            })
            .collect();
        matches.sort_by_key(|(uid, _)| *uid);

        let rows: Vec<Value> = matches
            .iter()
            .map(|(_, doc)| {
                let projected: Map<String, Value> = parsed
                    .projection
                    .iter()
                    .filter_map(|field| doc.get(field).map(|v| (field.clone(), v.clone())))
                    .collect();
                Value::Object(projected)
            })
            .collect();

        let total = rows.len() as u64;
        let mut json = Map::new();
        json.insert(parsed.alias, Value::Array(rows));

        Ok(QueryResponse {
            txn: TxnContext::bound(ts),
            json: Value::Object(json),
            total_matches: total,
        })
    }

    /// Buffers a mutation in the transaction's session.
    ///
    /// Exactly one of `set` or `delete` must be present. Placeholder ids
    /// in a set document are assigned fresh uids, reported back via the
    /// `assigned` map keyed by placeholder label.
    pub fn handle_mutate(&self, request: &MutateRequest) -> StoreResult<MutateResponse> {
        let mut inner = self.inner.write();
        let ts = inner.bind(&request.txn, false)?;

        let session = inner.sessions.get(&ts).ok_or_else(|| {
            StoreError::bad_request(format!("unknown transaction {ts}"))
        })?;
        if session.read_only {
            return Err(StoreError::ReadOnlyTxn);
        }

        let mutation = &request.mutation;
        let mut assigned = HashMap::new();

        match (&mutation.set, &mutation.delete) {
            (Some(set), None) => {
                let doc = set
                    .as_object()
                    .ok_or_else(|| StoreError::mutation("set payload must be an object"))?;
                if let Some(schema) = inner.schema.as_ref() {
                    validate_doc(schema, doc)?;
                }

                let mut doc = doc.clone();
                let id = doc
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| StoreError::mutation("set document is missing an id"))?
                    .to_string();

                let uid = if let Some(label) = id.strip_prefix(PLACEHOLDER_PREFIX) {
                    if label.is_empty() {
                        return Err(StoreError::mutation("empty placeholder label"));
                    }
                    inner.next_uid += 1;
                    let uid = inner.next_uid;
                    let hex = format!("{uid:#x}");
                    doc.insert("id".into(), Value::String(hex.clone()));
                    assigned.insert(label.to_string(), RecordId::assigned(hex));
                    uid
                } else {
                    parse_uid(&id)?
                };

                let session = inner
                    .sessions
                    .get_mut(&ts)
                    .ok_or_else(|| StoreError::bad_request(format!("unknown transaction {ts}")))?;
                for term in name_terms(&doc) {
                    session.conflict_keys.insert(format!("name:{term}"));
                }
                session.conflict_keys.insert(format!("uid:{uid:#x}"));
                session.writes.push(PendingWrite::Create { uid, doc });
            }
            (None, Some(delete)) => {
                let id = delete
                    .as_object()
                    .and_then(|doc| doc.get("id"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| StoreError::mutation("delete payload must carry an id"))?;
                let uid = parse_uid(id)?;

                let mut keys: Vec<String> = vec![format!("uid:{uid:#x}")];
                if let Some(doc) = inner
                    .records
                    .get(&uid)
                    .and_then(|versions| visible_at(versions, u64::MAX))
                {
                    for term in name_terms(doc) {
                        keys.push(format!("name:{term}"));
                    }
                }

                let session = inner
                    .sessions
                    .get_mut(&ts)
                    .ok_or_else(|| StoreError::bad_request(format!("unknown transaction {ts}")))?;
                session.conflict_keys.extend(keys);
                session.writes.push(PendingWrite::Delete { uid });
            }
            _ => {
                return Err(StoreError::mutation(
                    "mutation must carry exactly one of set or delete",
                ))
            }
        }

        Ok(MutateResponse {
            txn: TxnContext::bound(ts),
            assigned,
        })
    }

    /// Commits the transaction's buffered writes.
    ///
    /// Fails with [`StoreError::Conflict`] if any conflict key touched by
    /// the session was committed by another transaction after this one
    /// started.
    pub fn handle_commit(&self, ctx: &TxnContext) -> StoreResult<()> {
        if !ctx.is_bound() {
            return Err(StoreError::bad_request("commit on an unbound transaction"));
        }

        let mut inner = self.inner.write();
        let session = inner.sessions.remove(&ctx.start_ts).ok_or_else(|| {
            StoreError::bad_request(format!("unknown transaction {}", ctx.start_ts))
        })?;

        for key in &session.conflict_keys {
            if let Some(&committed_at) = inner.last_commit.get(key) {
                if committed_at > ctx.start_ts {
                    debug!(key, committed_at, start_ts = ctx.start_ts, "commit conflict");
                    return Err(StoreError::conflict(format!(
                        "key {key} committed at {committed_at}, after start {}",
                        ctx.start_ts
                    )));
                }
            }
        }

        inner.next_ts += 1;
        let commit_ts = inner.next_ts;
        for write in session.writes {
            match write {
                PendingWrite::Create { uid, doc } => {
                    inner.records.entry(uid).or_default().push((commit_ts, Some(doc)));
                }
                PendingWrite::Delete { uid } => {
                    inner.records.entry(uid).or_default().push((commit_ts, None));
                }
            }
        }
        for key in session.conflict_keys {
            inner.last_commit.insert(key, commit_ts);
        }
        Ok(())
    }

    /// Discards the transaction's session. Idempotent: unknown or
    /// already-finished transactions succeed silently.
    pub fn handle_discard(&self, ctx: &TxnContext) -> StoreResult<()> {
        if ctx.is_bound() {
            self.inner.write().sessions.remove(&ctx.start_ts);
        }
        Ok(())
    }

    /// Number of live committed records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.inner
            .read()
            .records
            .values()
            .filter(|versions| visible_at(versions, u64::MAX).is_some())
            .count()
    }

    /// Number of live (undiscarded, uncommitted) transaction sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.inner.read().sessions.len()
    }
}

fn validate_doc(schema: &StoreSchema, doc: &Map<String, Value>) -> StoreResult<()> {
    use crate::schema::FieldType;

    for (key, value) in doc {
        let Some(decl) = schema.field(key) else {
            // Undeclared fields (id, tag lists) pass through untyped.
            continue;
        };
        let ok = match decl.ty {
            FieldType::Text => value.is_string(),
            FieldType::Int => value.is_i64() || value.is_u64(),
        };
        if !ok {
            return Err(StoreError::mutation(format!(
                "field {key} does not match its declared type"
            )));
        }
    }
    Ok(())
}
