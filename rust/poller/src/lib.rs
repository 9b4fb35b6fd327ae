//! SNMP polling service: schedules per-device poll cycles, maps the
//! polled tables into stored records, and circuit-breaks endpoints that
//! keep failing.

pub mod config;
pub mod domains;
pub mod orchestrator;
pub mod reconcile;

use std::sync::Arc;

use netwatch_core::snmp::SnmpClient;
use netwatch_core::store::MemoryStore;
use tracing::info;

use crate::config::PollerConfig;
use crate::orchestrator::Orchestrator;

/// Bootstraps the poller from a loaded configuration and runs the tick
/// loop until interrupted.
pub async fn run(config: PollerConfig) -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    config.seed(&store);

    let client = Arc::new(SnmpClient::new());
    let orchestrator = Orchestrator::new(store, client.clone(), config.settings());

    info!(devices = config.devices.len(), "starting poller");
    tokio::select! {
        _ = orchestrator.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }
    client.shutdown().await;
    Ok(())
}
