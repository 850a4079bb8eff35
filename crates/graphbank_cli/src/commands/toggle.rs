//! Toggle command implementation.

use graphbank_client::{
    HttpTransport, LoopbackClient, StoreConfig, StoreGateway, ToggleSpec, ToggleWorkflow,
};
use graphbank_model::Schema;
use graphbank_store::MemStore;
use std::sync::Arc;

/// Runs the toggle command.
///
/// The store lives in-process and is reached through the full
/// JSON-over-HTTP transport stack via the loopback client, so every run
/// exercises the same codepaths a remote store would.
pub fn run(
    endpoint: &str,
    name: &str,
    balance: i64,
    type_tag: &str,
    runs: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemStore::new());
    let transport = HttpTransport::new(
        StoreConfig::new(endpoint),
        LoopbackClient::new(Arc::clone(&store)),
    );
    let gateway = StoreGateway::new(transport);
    gateway.install_schema(&Schema::account())?;

    let spec = ToggleSpec::new(name, balance).with_type_tag(type_tag);
    let mut workflow = ToggleWorkflow::new(&gateway);

    for round in 1..=runs {
        let outcome = workflow.run(&spec)?;
        println!("run {round}: {} {}", outcome.decision, outcome.id);
        println!(
            "  verification: {} match(es): {}",
            outcome.verification.total,
            serde_json::to_string(&outcome.verification.records)?
        );
    }

    println!();
    println!(
        "{} record(s) remain after {runs} run(s)",
        store.record_count()
    );
    Ok(())
}
