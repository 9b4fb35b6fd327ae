//! Abstract store contracts consumed by the monitoring components, plus
//! an in-memory implementation.
//!
//! The relational persistence layer is an external collaborator; the
//! core only depends on these traits. `MemoryStore` backs the binaries
//! in standalone operation and every test.

use std::collections::HashMap;
use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    Alert, Device, DeviceEndpoint, DeviceId, DiscoveryRun, IcmpProfile, InterfaceRecord,
    IpProfile, NotificationEvent, PhysicalUnitRecord, SystemInfo, UdpProfile,
};

/// Records that are unique per (device, index) pair.
pub trait Indexed {
    fn index(&self) -> u32;
}

impl Indexed for InterfaceRecord {
    fn index(&self) -> u32 {
        self.if_index
    }
}

impl Indexed for PhysicalUnitRecord {
    fn index(&self) -> u32 {
        self.unit_index
    }
}

/// Device and endpoint configuration plus orchestrator bookkeeping.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn devices(&self) -> Result<Vec<Device>>;
    async fn device(&self, id: DeviceId) -> Result<Option<Device>>;
    async fn device_by_address(&self, address: IpAddr) -> Result<Option<Device>>;
    async fn upsert_device(&self, device: Device) -> Result<()>;

    async fn endpoints(&self) -> Result<Vec<DeviceEndpoint>>;
    async fn endpoint(&self, device_id: DeviceId) -> Result<Option<DeviceEndpoint>>;
    async fn update_endpoint(&self, endpoint: DeviceEndpoint) -> Result<()>;

    /// Stores a fresh system-group snapshot and bumps `last_seen`.
    async fn save_system_info(
        &self,
        device_id: DeviceId,
        info: SystemInfo,
        seen_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Contract shared by every indexed-record table.
#[async_trait]
pub trait IndexedRecordStore<R>: Send + Sync
where
    R: Indexed + Clone + Send + Sync + 'static,
{
    async fn find_by_device_and_index(&self, device_id: DeviceId, index: u32)
        -> Result<Option<R>>;
    async fn find_all_by_device(&self, device_id: DeviceId) -> Result<Vec<R>>;
    async fn save(&self, record: R) -> Result<()>;
    async fn delete_many(&self, device_id: DeviceId, indexes: &[u32]) -> Result<usize>;
}

/// Singleton statistics profiles, keyed by device.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn save_ip_profile(&self, device_id: DeviceId, profile: IpProfile) -> Result<()>;
    async fn ip_profile(&self, device_id: DeviceId) -> Result<Option<IpProfile>>;
    async fn save_icmp_profile(&self, device_id: DeviceId, profile: IcmpProfile) -> Result<()>;
    async fn icmp_profile(&self, device_id: DeviceId) -> Result<Option<IcmpProfile>>;
    async fn save_udp_profile(&self, device_id: DeviceId, profile: UdpProfile) -> Result<()>;
    async fn udp_profile(&self, device_id: DeviceId) -> Result<Option<UdpProfile>>;
}

/// Notification events and their derived alerts.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_event_by_hash(&self, hash_key: &str) -> Result<Option<NotificationEvent>>;
    async fn insert_event(&self, event: NotificationEvent) -> Result<()>;
    async fn update_event(&self, event: NotificationEvent) -> Result<()>;
    async fn events(&self) -> Result<Vec<NotificationEvent>>;

    async fn insert_alert(&self, alert: Alert) -> Result<()>;
    async fn alerts(&self) -> Result<Vec<Alert>>;
}

/// Discovery run persistence with a terminal-state guard.
#[async_trait]
pub trait DiscoveryStore: Send + Sync {
    async fn create_run(&self, run: DiscoveryRun) -> Result<()>;
    async fn run(&self, id: Uuid) -> Result<Option<DiscoveryRun>>;

    /// Rejects updates once the stored run reached a terminal status.
    async fn update_run(&self, run: DiscoveryRun) -> Result<()>;
}

/// Everything a full poll cycle needs from a store.
pub trait PollStore:
    DeviceStore
    + IndexedRecordStore<InterfaceRecord>
    + IndexedRecordStore<PhysicalUnitRecord>
    + ProfileStore
{
}

impl<T> PollStore for T where
    T: DeviceStore
        + IndexedRecordStore<InterfaceRecord>
        + IndexedRecordStore<PhysicalUnitRecord>
        + ProfileStore
{
}

struct IndexedTable<R> {
    rows: RwLock<HashMap<(DeviceId, u32), R>>,
}

impl<R: Indexed + Clone> IndexedTable<R> {
    fn get(&self, device_id: DeviceId, index: u32) -> Option<R> {
        self.rows.read().get(&(device_id, index)).cloned()
    }

    fn all(&self, device_id: DeviceId) -> Vec<R> {
        let mut rows: Vec<R> = self
            .rows
            .read()
            .iter()
            .filter(|((device, _), _)| *device == device_id)
            .map(|(_, row)| row.clone())
            .collect();
        rows.sort_by_key(Indexed::index);
        rows
    }

    fn save(&self, device_id: DeviceId, record: R) {
        self.rows.write().insert((device_id, record.index()), record);
    }

    fn delete_many(&self, device_id: DeviceId, indexes: &[u32]) -> usize {
        let mut rows = self.rows.write();
        indexes
            .iter()
            .filter(|index| rows.remove(&(device_id, **index)).is_some())
            .count()
    }
}

impl<R> Default for IndexedTable<R> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

/// In-memory implementation of every store contract.
#[derive(Default)]
pub struct MemoryStore {
    devices: RwLock<HashMap<DeviceId, Device>>,
    endpoints: RwLock<HashMap<DeviceId, DeviceEndpoint>>,
    interfaces: IndexedTable<InterfaceRecord>,
    units: IndexedTable<PhysicalUnitRecord>,
    ip_profiles: RwLock<HashMap<DeviceId, IpProfile>>,
    icmp_profiles: RwLock<HashMap<DeviceId, IcmpProfile>>,
    udp_profiles: RwLock<HashMap<DeviceId, UdpProfile>>,
    events: RwLock<HashMap<Uuid, NotificationEvent>>,
    alerts: RwLock<HashMap<Uuid, Alert>>,
    runs: RwLock<HashMap<Uuid, DiscoveryRun>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one device and its endpoint in a single call.
    pub fn add_device(&self, device: Device, endpoint: DeviceEndpoint) {
        self.endpoints.write().insert(device.id, endpoint);
        self.devices.write().insert(device.id, device);
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn devices(&self) -> Result<Vec<Device>> {
        Ok(self.devices.read().values().cloned().collect())
    }

    async fn device(&self, id: DeviceId) -> Result<Option<Device>> {
        Ok(self.devices.read().get(&id).cloned())
    }

    async fn device_by_address(&self, address: IpAddr) -> Result<Option<Device>> {
        Ok(self
            .devices
            .read()
            .values()
            .find(|device| device.address == address)
            .cloned())
    }

    async fn upsert_device(&self, device: Device) -> Result<()> {
        self.devices.write().insert(device.id, device);
        Ok(())
    }

    async fn endpoints(&self) -> Result<Vec<DeviceEndpoint>> {
        Ok(self.endpoints.read().values().cloned().collect())
    }

    async fn endpoint(&self, device_id: DeviceId) -> Result<Option<DeviceEndpoint>> {
        Ok(self.endpoints.read().get(&device_id).cloned())
    }

    async fn update_endpoint(&self, endpoint: DeviceEndpoint) -> Result<()> {
        self.endpoints.write().insert(endpoint.device_id, endpoint);
        Ok(())
    }

    async fn save_system_info(
        &self,
        device_id: DeviceId,
        info: SystemInfo,
        seen_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut devices = self.devices.write();
        let device = devices
            .get_mut(&device_id)
            .ok_or_else(|| Error::NotFound(format!("device {device_id}")))?;
        device.sys_info = Some(info);
        device.last_seen = Some(seen_at);
        Ok(())
    }
}

#[async_trait]
impl IndexedRecordStore<InterfaceRecord> for MemoryStore {
    async fn find_by_device_and_index(
        &self,
        device_id: DeviceId,
        index: u32,
    ) -> Result<Option<InterfaceRecord>> {
        Ok(self.interfaces.get(device_id, index))
    }

    async fn find_all_by_device(&self, device_id: DeviceId) -> Result<Vec<InterfaceRecord>> {
        Ok(self.interfaces.all(device_id))
    }

    async fn save(&self, record: InterfaceRecord) -> Result<()> {
        self.interfaces.save(record.device_id, record);
        Ok(())
    }

    async fn delete_many(&self, device_id: DeviceId, indexes: &[u32]) -> Result<usize> {
        Ok(self.interfaces.delete_many(device_id, indexes))
    }
}

#[async_trait]
impl IndexedRecordStore<PhysicalUnitRecord> for MemoryStore {
    async fn find_by_device_and_index(
        &self,
        device_id: DeviceId,
        index: u32,
    ) -> Result<Option<PhysicalUnitRecord>> {
        Ok(self.units.get(device_id, index))
    }

    async fn find_all_by_device(&self, device_id: DeviceId) -> Result<Vec<PhysicalUnitRecord>> {
        Ok(self.units.all(device_id))
    }

    async fn save(&self, record: PhysicalUnitRecord) -> Result<()> {
        self.units.save(record.device_id, record);
        Ok(())
    }

    async fn delete_many(&self, device_id: DeviceId, indexes: &[u32]) -> Result<usize> {
        Ok(self.units.delete_many(device_id, indexes))
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn save_ip_profile(&self, device_id: DeviceId, profile: IpProfile) -> Result<()> {
        self.ip_profiles.write().insert(device_id, profile);
        Ok(())
    }

    async fn ip_profile(&self, device_id: DeviceId) -> Result<Option<IpProfile>> {
        Ok(self.ip_profiles.read().get(&device_id).cloned())
    }

    async fn save_icmp_profile(&self, device_id: DeviceId, profile: IcmpProfile) -> Result<()> {
        self.icmp_profiles.write().insert(device_id, profile);
        Ok(())
    }

    async fn icmp_profile(&self, device_id: DeviceId) -> Result<Option<IcmpProfile>> {
        Ok(self.icmp_profiles.read().get(&device_id).cloned())
    }

    async fn save_udp_profile(&self, device_id: DeviceId, profile: UdpProfile) -> Result<()> {
        self.udp_profiles.write().insert(device_id, profile);
        Ok(())
    }

    async fn udp_profile(&self, device_id: DeviceId) -> Result<Option<UdpProfile>> {
        Ok(self.udp_profiles.read().get(&device_id).cloned())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn find_event_by_hash(&self, hash_key: &str) -> Result<Option<NotificationEvent>> {
        Ok(self
            .events
            .read()
            .values()
            .find(|event| event.hash_key == hash_key)
            .cloned())
    }

    async fn insert_event(&self, event: NotificationEvent) -> Result<()> {
        self.events.write().insert(event.id, event);
        Ok(())
    }

    async fn update_event(&self, event: NotificationEvent) -> Result<()> {
        let mut events = self.events.write();
        if !events.contains_key(&event.id) {
            return Err(Error::NotFound(format!("event {}", event.id)));
        }
        events.insert(event.id, event);
        Ok(())
    }

    async fn events(&self) -> Result<Vec<NotificationEvent>> {
        Ok(self.events.read().values().cloned().collect())
    }

    async fn insert_alert(&self, alert: Alert) -> Result<()> {
        self.alerts.write().insert(alert.id, alert);
        Ok(())
    }

    async fn alerts(&self) -> Result<Vec<Alert>> {
        Ok(self.alerts.read().values().cloned().collect())
    }
}

#[async_trait]
impl DiscoveryStore for MemoryStore {
    async fn create_run(&self, run: DiscoveryRun) -> Result<()> {
        self.runs.write().insert(run.id, run);
        Ok(())
    }

    async fn run(&self, id: Uuid) -> Result<Option<DiscoveryRun>> {
        Ok(self.runs.read().get(&id).cloned())
    }

    async fn update_run(&self, run: DiscoveryRun) -> Result<()> {
        let mut runs = self.runs.write();
        match runs.get(&run.id) {
            None => Err(Error::NotFound(format!("discovery run {}", run.id))),
            Some(stored) if stored.status.is_terminal() => Err(Error::TerminalRun(run.id)),
            Some(_) => {
                runs.insert(run.id, run);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credential, ProtocolVersion, RunStatus};
    use pretty_assertions::assert_eq;

    fn seeded_store() -> (MemoryStore, DeviceId) {
        let store = MemoryStore::new();
        let device = Device::new("edge-router", "192.0.2.1".parse().unwrap());
        let id = device.id;
        let endpoint = DeviceEndpoint::new(
            id,
            device.address,
            ProtocolVersion::V2c,
            Credential::Community {
                community: "public".into(),
            },
        );
        store.add_device(device, endpoint);
        (store, id)
    }

    #[tokio::test]
    async fn indexed_records_are_unique_per_device_and_index() {
        let (store, id) = seeded_store();
        let mut record = InterfaceRecord::new(id, 1);
        record.descr = Some("eth0".into());
        store.save(record.clone()).await.unwrap();
        record.descr = Some("eth0-renamed".into());
        store.save(record).await.unwrap();

        let all: Vec<InterfaceRecord> = store.find_all_by_device(id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].descr.as_deref(), Some("eth0-renamed"));
    }

    #[tokio::test]
    async fn delete_many_removes_only_named_indexes() {
        let (store, id) = seeded_store();
        for index in [1, 2, 3] {
            store.save(InterfaceRecord::new(id, index)).await.unwrap();
        }
        let deleted = IndexedRecordStore::<InterfaceRecord>::delete_many(&store, id, &[2])
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let remaining: Vec<InterfaceRecord> = store.find_all_by_device(id).await.unwrap();
        let indexes: Vec<u32> = remaining.iter().map(|r| r.if_index).collect();
        assert_eq!(indexes, vec![1, 3]);
    }

    #[tokio::test]
    async fn device_resolution_by_address() {
        let (store, id) = seeded_store();
        let hit = store
            .device_by_address("192.0.2.1".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(hit.map(|d| d.id), Some(id));
        let miss = store
            .device_by_address("192.0.2.99".parse().unwrap())
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn terminal_runs_reject_updates() {
        let store = MemoryStore::new();
        let mut run = DiscoveryRun::new();
        store.create_run(run.clone()).await.unwrap();

        run.status = RunStatus::Cancelled;
        store.update_run(run.clone()).await.unwrap();

        run.hops_completed = 99;
        let err = store.update_run(run).await.unwrap_err();
        assert!(matches!(err, Error::TerminalRun(_)));
    }
}
