//! Test harness: a scripted management client and store seeding helpers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use netwatch_core::models::{Credential, Device, DeviceEndpoint, DeviceId, ProtocolVersion};
use netwatch_core::snmp::{ManagementClient, SnmpValue, Target};
use netwatch_core::store::MemoryStore;
use parking_lot::Mutex;

/// Scripted client: scalar values answer `get`, table rows answer
/// `walk`, and the probe flag gates reachability.
#[derive(Default)]
pub struct FakeClient {
    probe_ok: AtomicBool,
    pub probe_calls: AtomicUsize,
    scalars: Mutex<HashMap<String, SnmpValue>>,
    tables: Mutex<HashMap<String, Vec<(String, SnmpValue)>>>,
}

impl FakeClient {
    pub fn new() -> Self {
        let client = Self::default();
        client.probe_ok.store(true, Ordering::SeqCst);
        client
    }

    pub fn set_probe_ok(&self, ok: bool) {
        self.probe_ok.store(ok, Ordering::SeqCst);
    }

    pub fn set_scalar(&self, oid: &str, value: SnmpValue) {
        self.scalars.lock().insert(oid.to_string(), value);
    }

    pub fn set_table(&self, root: &str, rows: Vec<(String, SnmpValue)>) {
        self.tables.lock().insert(root.to_string(), rows);
    }
}

#[async_trait]
impl ManagementClient for FakeClient {
    async fn get(&self, _target: &Target, oid: &str) -> Option<SnmpValue> {
        self.scalars.lock().get(oid).cloned()
    }

    async fn get_multiple(&self, target: &Target, oids: &[&str]) -> HashMap<String, SnmpValue> {
        let mut values = HashMap::new();
        for oid in oids {
            match self.get(target, oid).await {
                Some(value) => {
                    values.insert((*oid).to_string(), value);
                }
                None => return HashMap::new(),
            }
        }
        values
    }

    async fn walk(
        &self,
        _target: &Target,
        root: &str,
        max_entries: usize,
    ) -> Vec<(String, SnmpValue)> {
        self.tables
            .lock()
            .get(root)
            .map(|rows| rows.iter().take(max_entries).cloned().collect())
            .unwrap_or_default()
    }

    async fn probe(&self, _target: &Target) -> bool {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.probe_ok.load(Ordering::SeqCst)
    }
}

/// Seeds one always-due device (zero poll interval) and returns its id.
pub fn seed_device(store: &Arc<MemoryStore>) -> DeviceId {
    let device = Device::new("lab-router", "192.0.2.1".parse().unwrap());
    let id = device.id;
    let mut endpoint = DeviceEndpoint::new(
        id,
        device.address,
        ProtocolVersion::V2c,
        Credential::Community {
            community: "public".into(),
        },
    );
    endpoint.poll_interval_secs = 0;
    store.add_device(device, endpoint);
    id
}
