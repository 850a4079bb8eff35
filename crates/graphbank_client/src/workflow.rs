//! The transactional toggle workflow.
//!
//! One run performs a single read-decide-write cycle: query the store for
//! records matching a term predicate on `name`, then either create a new
//! record (no matches) or delete the first match, commit, and confirm with
//! a verification read.
//!
//! ## Key Invariants
//!
//! - Exactly one of {create, delete} per run, decided solely by the match
//!   count
//! - The transaction is discarded on every exit path, including after a
//!   successful commit (a no-op at the store)
//! - No retry anywhere: a rejected mutation or commit aborts the run
//!
//! This is a toggle protocol, not an upsert: repeated runs against a stable
//! predicate alternate the store between "record present" and "record
//! absent" rather than converging.

use crate::error::ClientResult;
use crate::gateway::StoreGateway;
use crate::transport::StoreRpc;
use crate::txn::Txn;
use graphbank_model::{by_name_terms, ModelError, Mutation, QueryResult, Record, RecordId};
use std::fmt;
use tracing::{debug, info, warn};

/// The action a run chose after inspecting the query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No match: create a new record with a placeholder id.
    Create,
    /// One or more matches: delete the first match by id.
    Delete,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Create => f.write_str("create"),
            Decision::Delete => f.write_str("delete"),
        }
    }
}

/// Phase of a toggle run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TogglePhase {
    /// Run has not queried yet.
    Open,
    /// The query result is in.
    Queried,
    /// A create-or-delete decision has been made.
    Decided,
    /// The mutation was accepted; the commit is pending.
    Finalized,
    /// The mutation committed.
    Committed,
    /// The run aborted before any write was attempted.
    Discarded,
    /// The store rejected the mutation or the commit.
    Failed,
}

impl TogglePhase {
    /// Returns true if the run has finished.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TogglePhase::Committed | TogglePhase::Discarded | TogglePhase::Failed
        )
    }
}

/// Caller-supplied inputs for a toggle run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleSpec {
    /// Name to match (term predicate) and to give a created record.
    pub name: String,
    /// Balance for a created record.
    pub balance: i64,
    /// Type tag attached to a created record.
    pub type_tag: String,
}

impl ToggleSpec {
    /// Creates a spec with the default `user` type tag.
    pub fn new(name: impl Into<String>, balance: i64) -> Self {
        Self {
            name: name.into(),
            balance,
            type_tag: "user".into(),
        }
    }

    /// Sets the type tag.
    #[must_use]
    pub fn with_type_tag(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = tag.into();
        self
    }
}

/// Outcome of a successful toggle run.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    /// The action taken.
    pub decision: Decision,
    /// Id of the created record (store-assigned) or of the deleted one.
    pub id: RecordId,
    /// Result of the verification read, run in a fresh read-only
    /// transaction after the commit. It reflects only durably committed
    /// state and is not part of the transaction's atomicity guarantee.
    pub verification: QueryResult,
}

/// Runs toggle cycles against a store gateway.
pub struct ToggleWorkflow<'g, T: StoreRpc> {
    gateway: &'g StoreGateway<T>,
    phase: TogglePhase,
}

impl<'g, T: StoreRpc> ToggleWorkflow<'g, T> {
    /// Creates a workflow over the given gateway.
    #[must_use]
    pub fn new(gateway: &'g StoreGateway<T>) -> Self {
        Self {
            gateway,
            phase: TogglePhase::Open,
        }
    }

    /// Returns the phase the last (or current) run reached.
    #[must_use]
    pub fn phase(&self) -> TogglePhase {
        self.phase
    }

    /// Performs one read-decide-write cycle.
    ///
    /// Errors are surfaced as-is; no retry is attempted. The transaction
    /// is always discarded before this returns.
    pub fn run(&mut self, spec: &ToggleSpec) -> ClientResult<ToggleOutcome> {
        self.phase = TogglePhase::Open;
        let query = by_name_terms(&spec.name);

        let mut txn = self.gateway.new_txn();
        let decided = self.execute(&mut txn, spec, &query);

        // Runs on the success path too, where it is a no-op at the store.
        if let Err(e) = txn.discard() {
            warn!(error = %e, "transaction discard failed");
        }

        let (decision, id) = decided?;
        let verification = self.verify(&query)?;
        info!(
            decision = %decision,
            id = %id,
            remaining = verification.total,
            "toggle committed"
        );

        Ok(ToggleOutcome {
            decision,
            id,
            verification,
        })
    }

    fn execute(
        &mut self,
        txn: &mut Txn<T>,
        spec: &ToggleSpec,
        query: &str,
    ) -> ClientResult<(Decision, RecordId)> {
        let matches = match txn.query(query) {
            Ok(matches) => matches,
            Err(e) => {
                self.phase = TogglePhase::Discarded;
                return Err(e);
            }
        };
        self.phase = TogglePhase::Queried;

        let (decision, mutation, provisional) = if matches.is_empty() {
            let record = Record::create(&spec.name, spec.balance, &spec.type_tag);
            let id = record.id.clone();
            (Decision::Create, Mutation::create(&record)?, id)
        } else {
            // Only existence and identity of the match matter, not content.
            let target = match matches.first() {
                Some(target) => target,
                None => {
                    self.phase = TogglePhase::Discarded;
                    return Err(ModelError::decode(
                        "store reported matches but returned no records",
                    )
                    .into());
                }
            };
            (
                Decision::Delete,
                Mutation::delete(&target.id),
                target.id.clone(),
            )
        };
        self.phase = TogglePhase::Decided;
        debug!(decision = %decision, total = matches.total, "decision made");

        let response = match txn.mutate(&mutation) {
            Ok(response) => response,
            Err(e) => {
                self.phase = TogglePhase::Failed;
                return Err(e);
            }
        };
        self.phase = TogglePhase::Finalized;

        if let Err(e) = txn.commit() {
            self.phase = TogglePhase::Failed;
            return Err(e);
        }
        self.phase = TogglePhase::Committed;

        let assigned = provisional
            .placeholder_label()
            .and_then(|label| response.assigned.get(label))
            .cloned();
        let id = match decision {
            Decision::Create => assigned.unwrap_or(provisional),
            Decision::Delete => provisional,
        };
        Ok((decision, id))
    }

    /// Confirms the committed state with a fresh read-only query.
    fn verify(&self, query: &str) -> ClientResult<QueryResult> {
        let mut txn = self.gateway.new_read_only_txn();
        let result = txn.query(query);
        if let Err(e) = txn.discard() {
            warn!(error = %e, "verification discard failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::transport::MockRpc;
    use graphbank_model::{QueryResponse, TxnContext};
    use serde_json::json;
    use std::sync::Arc;

    fn response(json: serde_json::Value, total: u64) -> QueryResponse {
        QueryResponse {
            txn: TxnContext::default(),
            json,
            total_matches: total,
        }
    }

    fn gateway_with(rpc: &Arc<MockRpc>) -> StoreGateway<MockRpc> {
        StoreGateway::from_shared(Arc::clone(rpc))
    }

    #[test]
    fn zero_matches_creates_a_record() {
        let rpc = Arc::new(MockRpc::new());
        // Workflow query sees nothing; verification sees the new record.
        rpc.push_query_response(response(json!({}), 0));
        rpc.push_query_response(response(
            json!({"all": [{"id": "0x2", "name": "Vikram Mali", "balance": 26}]}),
            1,
        ));

        let gateway = gateway_with(&rpc);
        let mut workflow = ToggleWorkflow::new(&gateway);
        let outcome = workflow
            .run(&ToggleSpec::new("Vikram Mali", 26))
            .unwrap();

        assert_eq!(outcome.decision, Decision::Create);
        assert!(!outcome.id.is_placeholder());
        assert_eq!(outcome.verification.total, 1);
        assert_eq!(workflow.phase(), TogglePhase::Committed);
        assert_eq!(rpc.commit_count(), 1);

        let mutations = rpc.mutations();
        assert_eq!(mutations.len(), 1);
        let set = mutations[0].mutation.set.as_ref().unwrap();
        assert_eq!(set["name"], "Vikram Mali");
        assert_eq!(set["balance"], 26);
        assert_eq!(set["type_tags"][0], "user");
    }

    #[test]
    fn existing_match_deletes_by_first_id() {
        let rpc = Arc::new(MockRpc::new());
        rpc.push_query_response(response(
            json!({"all": [
                {"id": "0x17", "name": "Vikram Mali", "balance": 26},
                {"id": "0x18", "name": "Vikram Patel", "balance": 40},
            ]}),
            2,
        ));
        rpc.push_query_response(response(
            json!({"all": [{"id": "0x18", "name": "Vikram Patel", "balance": 40}]}),
            1,
        ));

        let gateway = gateway_with(&rpc);
        let mut workflow = ToggleWorkflow::new(&gateway);
        let outcome = workflow.run(&ToggleSpec::new("Vikram Mali", 26)).unwrap();

        assert_eq!(outcome.decision, Decision::Delete);
        assert_eq!(outcome.id.as_str(), "0x17");
        assert_eq!(outcome.verification.total, 1);

        let mutations = rpc.mutations();
        assert_eq!(mutations.len(), 1);
        assert!(mutations[0].mutation.is_delete());
        let delete = mutations[0].mutation.delete.as_ref().unwrap();
        assert_eq!(delete["id"], "0x17");
    }

    #[test]
    fn rejected_commit_discards_and_fails() {
        let rpc = Arc::new(MockRpc::new());
        rpc.push_query_response(response(json!({}), 0));
        rpc.reject_commit("conflict: concurrent write on name index");

        let gateway = gateway_with(&rpc);
        let mut workflow = ToggleWorkflow::new(&gateway);
        let err = workflow.run(&ToggleSpec::new("Vikram Mali", 26)).unwrap_err();

        assert!(matches!(err, ClientError::Mutation { .. }));
        assert_eq!(workflow.phase(), TogglePhase::Failed);
        // The open transaction was released; no verification read happened.
        assert_eq!(rpc.discard_count(), 1);
        assert_eq!(rpc.commit_count(), 0);
    }

    #[test]
    fn rejected_mutation_discards_and_fails() {
        let rpc = Arc::new(MockRpc::new());
        rpc.push_query_response(response(json!({}), 0));
        rpc.reject_mutate("balance must be an integer");

        let gateway = gateway_with(&rpc);
        let mut workflow = ToggleWorkflow::new(&gateway);
        let err = workflow.run(&ToggleSpec::new("Vikram Mali", 26)).unwrap_err();

        assert!(matches!(err, ClientError::Mutation { .. }));
        assert_eq!(workflow.phase(), TogglePhase::Failed);
        assert_eq!(rpc.discard_count(), 1);
    }

    #[test]
    fn rejected_query_aborts_before_any_write() {
        let rpc = Arc::new(MockRpc::new());
        rpc.reject_query("syntax error at line 1");

        let gateway = gateway_with(&rpc);
        let mut workflow = ToggleWorkflow::new(&gateway);
        let err = workflow.run(&ToggleSpec::new("Vikram Mali", 26)).unwrap_err();

        assert!(matches!(err, ClientError::Query { .. }));
        assert_eq!(workflow.phase(), TogglePhase::Discarded);
        assert!(rpc.mutations().is_empty());
    }

    #[test]
    fn inconsistent_result_set_is_a_decode_error() {
        let rpc = Arc::new(MockRpc::new());
        // Total says one match but no records came back.
        rpc.push_query_response(response(json!({"all": []}), 1));

        let gateway = gateway_with(&rpc);
        let mut workflow = ToggleWorkflow::new(&gateway);
        let err = workflow.run(&ToggleSpec::new("Vikram Mali", 26)).unwrap_err();

        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(workflow.phase(), TogglePhase::Discarded);
    }

    #[test]
    fn phase_transitions_are_terminal_aware() {
        assert!(!TogglePhase::Open.is_terminal());
        assert!(!TogglePhase::Queried.is_terminal());
        assert!(!TogglePhase::Decided.is_terminal());
        assert!(!TogglePhase::Finalized.is_terminal());
        assert!(TogglePhase::Committed.is_terminal());
        assert!(TogglePhase::Discarded.is_terminal());
        assert!(TogglePhase::Failed.is_terminal());
    }
}
