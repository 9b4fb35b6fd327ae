//! Interface-table poller.

use std::collections::BTreeMap;

use chrono::Utc;
use netwatch_core::models::{
    DeviceId, InterfaceAdminStatus, InterfaceOperStatus, InterfaceRecord,
};
use netwatch_core::snmp::{oids, ManagementClient, SnmpValue, Target};
use netwatch_core::store::IndexedRecordStore;
use netwatch_core::Result;
use tracing::debug;

use super::clamp_text;
use crate::reconcile::{reconcile_indexed, ReconcileOutcome};

#[derive(Debug, Default, Clone)]
struct InterfaceFields {
    descr: Option<String>,
    if_type: Option<i64>,
    mtu: Option<i64>,
    speed: Option<u64>,
    phys_address: Option<String>,
    admin_status: Option<InterfaceAdminStatus>,
    oper_status: Option<InterfaceOperStatus>,
}

/// Walks the interface table and reconciles it into the store.
pub async fn poll<S>(
    client: &dyn ManagementClient,
    store: &S,
    device_id: DeviceId,
    target: &Target,
    max_entries: usize,
) -> Result<ReconcileOutcome>
where
    S: IndexedRecordStore<InterfaceRecord> + ?Sized,
{
    let rows = collect(client, target, max_entries).await;
    if rows.is_empty() {
        // An empty index walk is indistinguishable from an unreachable
        // table; skipping the reconcile keeps a transient fault from
        // mass-deleting records.
        debug!(%device_id, "interface table unavailable, skipping reconcile");
        return Ok(ReconcileOutcome::default());
    }
    reconcile_indexed(store, device_id, rows, InterfaceRecord::new, apply).await
}

async fn collect(
    client: &dyn ManagementClient,
    target: &Target,
    max_entries: usize,
) -> BTreeMap<u32, InterfaceFields> {
    let mut rows: BTreeMap<u32, InterfaceFields> = BTreeMap::new();
    for (oid, _) in client.walk(target, oids::IF_INDEX, max_entries).await {
        if let Some(index) = oids::index_after(oids::IF_INDEX, &oid) {
            rows.entry(index).or_default();
        }
    }
    if rows.is_empty() {
        return rows;
    }

    column(client, target, max_entries, oids::IF_DESCR, &mut rows, |f, v| {
        f.descr = v.as_text().map(|text| clamp_text("if_descr", text));
    })
    .await;
    column(client, target, max_entries, oids::IF_TYPE, &mut rows, |f, v| {
        f.if_type = v.as_i64();
    })
    .await;
    column(client, target, max_entries, oids::IF_MTU, &mut rows, |f, v| {
        f.mtu = v.as_i64();
    })
    .await;
    column(client, target, max_entries, oids::IF_SPEED, &mut rows, |f, v| {
        f.speed = v.as_u64();
    })
    .await;
    column(client, target, max_entries, oids::IF_PHYS_ADDRESS, &mut rows, |f, v| {
        f.phys_address = v.as_phys_address();
    })
    .await;
    column(client, target, max_entries, oids::IF_ADMIN_STATUS, &mut rows, |f, v| {
        f.admin_status = v.as_i64().map(InterfaceAdminStatus::from_code);
    })
    .await;
    column(client, target, max_entries, oids::IF_OPER_STATUS, &mut rows, |f, v| {
        f.oper_status = v.as_i64().map(InterfaceOperStatus::from_code);
    })
    .await;

    rows
}

async fn column<F>(
    client: &dyn ManagementClient,
    target: &Target,
    max_entries: usize,
    root: &str,
    rows: &mut BTreeMap<u32, InterfaceFields>,
    assign: F,
) where
    F: Fn(&mut InterfaceFields, &SnmpValue),
{
    for (oid, value) in client.walk(target, root, max_entries).await {
        if let Some(index) = oids::index_after(root, &oid) {
            if let Some(fields) = rows.get_mut(&index) {
                assign(fields, &value);
            }
        }
    }
}

fn apply(record: &mut InterfaceRecord, fields: InterfaceFields) {
    record.descr = fields.descr;
    record.if_type = fields.if_type;
    record.mtu = fields.mtu;
    record.speed = fields.speed;
    record.phys_address = fields.phys_address;
    record.admin_status = fields.admin_status;
    record.oper_status = fields.oper_status;
    record.updated_at = Utc::now();
}
