//! End-to-end toggle runs: real client workflow against the in-memory
//! store, both in-process and through the JSON-over-HTTP loopback.

use graphbank_client::{
    ClientError, ClientResult, Decision, HttpTransport, LoopbackClient, StoreConfig, StoreGateway,
    StoreRpc, TogglePhase, ToggleSpec, ToggleWorkflow,
};
use graphbank_model::{
    by_name_terms, AlterRequest, MutateRequest, MutateResponse, Mutation, QueryRequest,
    QueryResponse, Record, Schema, TxnContext,
};
use graphbank_store::MemStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn gateway_over(store: &Arc<MemStore>) -> StoreGateway<MemStore> {
    let gateway = StoreGateway::from_shared(Arc::clone(store));
    gateway.install_schema(&Schema::account()).unwrap();
    gateway
}

#[test]
fn repeated_runs_alternate_create_and_delete() {
    let store = Arc::new(MemStore::new());
    let gateway = gateway_over(&store);
    let mut workflow = ToggleWorkflow::new(&gateway);
    let spec = ToggleSpec::new("Vikram Mali", 26);

    for round in 0..4 {
        let outcome = workflow.run(&spec).unwrap();
        assert_eq!(workflow.phase(), TogglePhase::Committed);
        if round % 2 == 0 {
            assert_eq!(outcome.decision, Decision::Create);
            assert!(!outcome.id.is_placeholder());
            assert_eq!(outcome.verification.total, 1);
            assert_eq!(store.record_count(), 1);
            let created = outcome.verification.first().unwrap();
            assert_eq!(created.name, "Vikram Mali");
            assert_eq!(created.balance, 26);
        } else {
            assert_eq!(outcome.decision, Decision::Delete);
            assert_eq!(outcome.verification.total, 0);
            assert_eq!(store.record_count(), 0);
        }
    }

    // Every transaction was released, including the verification reads.
    assert_eq!(store.session_count(), 0);
}

#[test]
fn delete_round_targets_the_created_id() {
    let store = Arc::new(MemStore::new());
    let gateway = gateway_over(&store);
    let mut workflow = ToggleWorkflow::new(&gateway);
    let spec = ToggleSpec::new("Vikram Mali", 26);

    let created = workflow.run(&spec).unwrap();
    let deleted = workflow.run(&spec).unwrap();
    assert_eq!(deleted.decision, Decision::Delete);
    assert_eq!(deleted.id, created.id);
}

#[test]
fn toggle_through_the_http_loopback() {
    let store = Arc::new(MemStore::new());
    let transport = HttpTransport::new(
        StoreConfig::new("http://store.example.com"),
        LoopbackClient::new(Arc::clone(&store)),
    );
    let gateway = StoreGateway::new(transport);
    gateway.install_schema(&Schema::account()).unwrap();

    let mut workflow = ToggleWorkflow::new(&gateway);
    let spec = ToggleSpec::new("Vikram Mali", 26);

    let outcome = workflow.run(&spec).unwrap();
    assert_eq!(outcome.decision, Decision::Create);
    assert_eq!(store.record_count(), 1);

    let outcome = workflow.run(&spec).unwrap();
    assert_eq!(outcome.decision, Decision::Delete);
    assert_eq!(store.record_count(), 0);
}

#[test]
fn concurrent_creates_surface_as_a_mutation_rejection() {
    let store = Arc::new(MemStore::new());
    let gateway = gateway_over(&store);
    let query = by_name_terms("Vikram Mali");

    let mut first = gateway.new_txn();
    let mut second = gateway.new_txn();
    assert!(first.query(&query).unwrap().is_empty());
    assert!(second.query(&query).unwrap().is_empty());

    first
        .mutate(&Mutation::create(&Record::create("Vikram Mali", 26, "user")).unwrap())
        .unwrap();
    second
        .mutate(&Mutation::create(&Record::create("Vikram Mali", 26, "user")).unwrap())
        .unwrap();

    first.commit().unwrap();
    let err = second.commit().unwrap_err();
    assert!(matches!(err, ClientError::Mutation { .. }));

    first.discard().unwrap();
    second.discard().unwrap();
    assert_eq!(store.record_count(), 1);
    assert_eq!(store.session_count(), 0);
}

/// Delegates to the store, but commits a competing record right before
/// forwarding the first mutation, so the delegated transaction loses the
/// optimistic-concurrency race at commit.
struct RacingRpc {
    store: Arc<MemStore>,
    raced: AtomicBool,
}

impl RacingRpc {
    fn new(store: Arc<MemStore>) -> Self {
        Self {
            store,
            raced: AtomicBool::new(false),
        }
    }
}

impl StoreRpc for RacingRpc {
    fn alter(&self, request: &AlterRequest) -> ClientResult<()> {
        self.store.alter(request)
    }

    fn query(&self, request: &QueryRequest) -> ClientResult<QueryResponse> {
        self.store.query(request)
    }

    fn mutate(&self, request: &MutateRequest) -> ClientResult<MutateResponse> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            let interloper = Record::create("Vikram Mali", 26, "user");
            let response = self.store.mutate(&MutateRequest::new(
                TxnContext::default(),
                Mutation::create(&interloper).unwrap(),
            ))?;
            self.store.commit(&response.txn)?;
        }
        self.store.mutate(request)
    }

    fn commit(&self, txn: &TxnContext) -> ClientResult<()> {
        self.store.commit(txn)
    }

    fn discard(&self, txn: &TxnContext) -> ClientResult<()> {
        self.store.discard(txn)
    }

    fn is_connected(&self) -> bool {
        self.store.is_connected()
    }

    fn close(&self) -> ClientResult<()> {
        self.store.close()
    }
}

#[test]
fn workflow_loses_the_race_to_a_committed_writer() {
    let store = Arc::new(MemStore::new());
    let gateway = StoreGateway::new(RacingRpc::new(Arc::clone(&store)));
    gateway.install_schema(&Schema::account()).unwrap();

    let mut workflow = ToggleWorkflow::new(&gateway);
    let err = workflow.run(&ToggleSpec::new("Vikram Mali", 26)).unwrap_err();

    assert!(matches!(err, ClientError::Mutation { .. }));
    assert_eq!(workflow.phase(), TogglePhase::Failed);
    // Only the competing writer's record landed; the losing transaction
    // left nothing behind, not even a session.
    assert_eq!(store.record_count(), 1);
    assert_eq!(store.session_count(), 0);
}

#[test]
fn read_only_transactions_cannot_write() {
    let store = Arc::new(MemStore::new());
    let gateway = gateway_over(&store);

    let mut txn = gateway.new_read_only_txn();
    txn.query(&by_name_terms("Vikram Mali")).unwrap();
    let err = txn
        .mutate(&Mutation::create(&Record::create("Vikram Mali", 26, "user")).unwrap())
        .unwrap_err();
    assert!(matches!(err, ClientError::ReadOnly));
    txn.discard().unwrap();
    assert_eq!(store.record_count(), 0);
}

#[test]
fn unmatched_names_do_not_collide() {
    let store = Arc::new(MemStore::new());
    let gateway = gateway_over(&store);
    let mut workflow = ToggleWorkflow::new(&gateway);

    workflow.run(&ToggleSpec::new("Vikram Mali", 26)).unwrap();
    let outcome = workflow.run(&ToggleSpec::new("Ada Lovelace", 10)).unwrap();

    // Different terms: the second run creates rather than deleting.
    assert_eq!(outcome.decision, Decision::Create);
    assert_eq!(store.record_count(), 2);

    // A shared term matches either record, so this run deletes one.
    let outcome = workflow.run(&ToggleSpec::new("Vikram", 0)).unwrap();
    assert_eq!(outcome.decision, Decision::Delete);
    assert_eq!(store.record_count(), 1);
}
