//! Physical-entity table poller.

use std::collections::BTreeMap;

use chrono::Utc;
use netwatch_core::models::{DeviceId, PhysicalClass, PhysicalUnitRecord};
use netwatch_core::snmp::{oids, ManagementClient, SnmpValue, Target};
use netwatch_core::store::IndexedRecordStore;
use netwatch_core::Result;
use tracing::debug;

use super::clamp_text;
use crate::reconcile::{reconcile_indexed, ReconcileOutcome};

#[derive(Debug, Default, Clone)]
struct UnitFields {
    descr: Option<String>,
    class: Option<PhysicalClass>,
    name: Option<String>,
    hardware_rev: Option<String>,
    firmware_rev: Option<String>,
    serial_number: Option<String>,
    mfg_name: Option<String>,
}

/// Walks the physical entity table and reconciles it into the store.
/// Not every agent implements the table; an empty walk is skipped.
pub async fn poll<S>(
    client: &dyn ManagementClient,
    store: &S,
    device_id: DeviceId,
    target: &Target,
    max_entries: usize,
) -> Result<ReconcileOutcome>
where
    S: IndexedRecordStore<PhysicalUnitRecord> + ?Sized,
{
    let rows = collect(client, target, max_entries).await;
    if rows.is_empty() {
        debug!(%device_id, "physical entity table unavailable, skipping reconcile");
        return Ok(ReconcileOutcome::default());
    }
    reconcile_indexed(store, device_id, rows, PhysicalUnitRecord::new, apply).await
}

async fn collect(
    client: &dyn ManagementClient,
    target: &Target,
    max_entries: usize,
) -> BTreeMap<u32, UnitFields> {
    let mut rows: BTreeMap<u32, UnitFields> = BTreeMap::new();
    // The description column doubles as the index walk.
    for (oid, value) in client.walk(target, oids::ENT_PHYSICAL_DESCR, max_entries).await {
        if let Some(index) = oids::index_after(oids::ENT_PHYSICAL_DESCR, &oid) {
            rows.entry(index).or_default().descr =
                value.as_text().map(|text| clamp_text("unit_descr", text));
        }
    }
    if rows.is_empty() {
        return rows;
    }

    column(client, target, max_entries, oids::ENT_PHYSICAL_CLASS, &mut rows, |f, v| {
        f.class = v.as_i64().map(PhysicalClass::from_code);
    })
    .await;
    column(client, target, max_entries, oids::ENT_PHYSICAL_NAME, &mut rows, |f, v| {
        f.name = v.as_text().map(|text| clamp_text("unit_name", text));
    })
    .await;
    column(client, target, max_entries, oids::ENT_PHYSICAL_HARDWARE_REV, &mut rows, |f, v| {
        f.hardware_rev = v.as_text();
    })
    .await;
    column(client, target, max_entries, oids::ENT_PHYSICAL_FIRMWARE_REV, &mut rows, |f, v| {
        f.firmware_rev = v.as_text();
    })
    .await;
    column(client, target, max_entries, oids::ENT_PHYSICAL_SERIAL_NUM, &mut rows, |f, v| {
        f.serial_number = v.as_text();
    })
    .await;
    column(client, target, max_entries, oids::ENT_PHYSICAL_MFG_NAME, &mut rows, |f, v| {
        f.mfg_name = v.as_text();
    })
    .await;

    rows
}

async fn column<F>(
    client: &dyn ManagementClient,
    target: &Target,
    max_entries: usize,
    root: &str,
    rows: &mut BTreeMap<u32, UnitFields>,
    assign: F,
) where
    F: Fn(&mut UnitFields, &SnmpValue),
{
    for (oid, value) in client.walk(target, root, max_entries).await {
        if let Some(index) = oids::index_after(root, &oid) {
            if let Some(fields) = rows.get_mut(&index) {
                assign(fields, &value);
            }
        }
    }
}

fn apply(record: &mut PhysicalUnitRecord, fields: UnitFields) {
    record.descr = fields.descr;
    record.class = fields.class;
    record.name = fields.name;
    record.hardware_rev = fields.hardware_rev;
    record.firmware_rev = fields.firmware_rev;
    record.serial_number = fields.serial_number;
    record.mfg_name = fields.mfg_name;
    record.updated_at = Utc::now();
}
