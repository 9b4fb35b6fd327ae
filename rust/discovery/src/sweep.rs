//! Address-liveness sweep over an expanded seed range.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use netwatch_core::snmp::{ManagementClient, Target};
use tokio::sync::{mpsc, Semaphore};

/// Liveness scanning collaborator used to seed a discovery run.
#[async_trait]
pub trait LivenessScanner: Send + Sync {
    /// Returns the subset of candidate addresses that answered, sorted.
    async fn sweep(&self, targets: Vec<Target>, concurrency: usize) -> Vec<IpAddr>;
}

/// Probes each candidate over the management protocol with a bounded
/// worker pool.
pub struct SnmpPingScanner {
    client: Arc<dyn ManagementClient>,
}

impl SnmpPingScanner {
    pub fn new(client: Arc<dyn ManagementClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LivenessScanner for SnmpPingScanner {
    async fn sweep(&self, targets: Vec<Target>, concurrency: usize) -> Vec<IpAddr> {
        let (tx, mut rx) = mpsc::channel(targets.len().max(1));
        let pool = Arc::new(Semaphore::new(concurrency.max(1)));

        for target in targets {
            let Ok(permit) = pool.clone().acquire_owned().await else {
                break;
            };
            let client = self.client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if client.probe(&target).await {
                    let _ = tx.send(target.address).await;
                }
                drop(permit);
            });
        }
        drop(tx);

        let mut live = Vec::new();
        while let Some(address) = rx.recv().await {
            live.push(address);
        }
        live.sort();
        live
    }
}
