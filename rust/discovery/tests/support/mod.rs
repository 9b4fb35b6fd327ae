//! Test harness: a scripted management client modelling a small
//! network, plus progress sinks for observing and cancelling runs.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use netwatch_core::sink::{ProgressSink, ProgressUpdate};
use netwatch_core::snmp::{oids, ManagementClient, SnmpValue, Target};
use netwatch_discovery::engine::RunHandle;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

pub struct FakeDevice {
    pub name: String,
    pub services: i64,
    pub l3_neighbors: Vec<IpAddr>,
}

/// Scripted network: devices keyed by address, each with a class and a
/// neighbor list served from the ARP table walk.
#[derive(Default)]
pub struct FakeClient {
    devices: Mutex<HashMap<IpAddr, FakeDevice>>,
    /// Addresses that received a detail probe, in order.
    pub probed: Mutex<Vec<IpAddr>>,
    gates: Mutex<HashMap<IpAddr, Arc<Semaphore>>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_router(&self, address: &str, neighbors: &[&str]) {
        self.devices.lock().insert(
            address.parse().unwrap(),
            FakeDevice {
                name: format!("router-{address}"),
                services: 0x4e,
                l3_neighbors: neighbors.iter().map(|n| n.parse().unwrap()).collect(),
            },
        );
    }

    pub fn add_host(&self, address: &str) {
        self.devices.lock().insert(
            address.parse().unwrap(),
            FakeDevice {
                name: format!("host-{address}"),
                services: 0x40,
                l3_neighbors: Vec::new(),
            },
        );
    }

    /// Blocks detail probes of `address` until permits are added.
    pub fn gate(&self, address: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .insert(address.parse().unwrap(), gate.clone());
        gate
    }
}

#[async_trait]
impl ManagementClient for FakeClient {
    async fn get(&self, target: &Target, oid: &str) -> Option<SnmpValue> {
        if oid == oids::SYS_UPTIME && self.devices.lock().contains_key(&target.address) {
            return Some(SnmpValue::Timeticks(1));
        }
        None
    }

    async fn get_multiple(&self, target: &Target, oids_list: &[&str]) -> HashMap<String, SnmpValue> {
        let gate = self.gates.lock().get(&target.address).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.probed.lock().push(target.address);

        let devices = self.devices.lock();
        let Some(device) = devices.get(&target.address) else {
            return HashMap::new();
        };
        let mut values = HashMap::new();
        for oid in oids_list {
            let value = match *oid {
                oids::SYS_DESCR => SnmpValue::OctetString(b"scripted device".to_vec()),
                oids::SYS_OBJECT_ID => SnmpValue::Oid("1.3.6.1.4.1.8072.3.2.10".into()),
                oids::SYS_NAME => SnmpValue::OctetString(device.name.clone().into_bytes()),
                oids::SYS_SERVICES => SnmpValue::Integer(device.services),
                _ => continue,
            };
            values.insert((*oid).to_string(), value);
        }
        values
    }

    async fn walk(
        &self,
        target: &Target,
        root: &str,
        max_entries: usize,
    ) -> Vec<(String, SnmpValue)> {
        if root != oids::IP_NET_TO_MEDIA_NET_ADDRESS {
            return Vec::new();
        }
        let devices = self.devices.lock();
        let Some(device) = devices.get(&target.address) else {
            return Vec::new();
        };
        device
            .l3_neighbors
            .iter()
            .take(max_entries)
            .filter_map(|neighbor| match neighbor {
                IpAddr::V4(v4) => Some((format!("{root}.1.{neighbor}"), SnmpValue::IpAddress(*v4))),
                IpAddr::V6(_) => None,
            })
            .collect()
    }
}

/// Records every progress update.
#[derive(Default)]
pub struct CollectingSink {
    pub updates: Mutex<Vec<ProgressUpdate>>,
}

impl ProgressSink for CollectingSink {
    fn publish(&self, update: ProgressUpdate) {
        self.updates.lock().push(update);
    }
}

/// Requests cancellation the first time a hop completes, so the next
/// hop's checkpoint observes it deterministically.
#[derive(Default)]
pub struct CancelAfterFirstHop {
    handle: Mutex<Option<RunHandle>>,
    fired: AtomicBool,
}

impl CancelAfterFirstHop {
    pub fn arm(&self, handle: RunHandle) {
        *self.handle.lock() = Some(handle);
    }
}

impl ProgressSink for CancelAfterFirstHop {
    fn publish(&self, update: ProgressUpdate) {
        if update.stage == "hop-complete" && !self.fired.swap(true, Ordering::SeqCst) {
            if let Some(handle) = self.handle.lock().as_ref() {
                handle.request_cancel();
            }
        }
    }
}
