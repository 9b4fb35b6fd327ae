//! Generic reconciliation of a freshly walked table against the store:
//! one upsert pass, then one stale-delete pass. Shared by every indexed
//! table poller so the create/update/delete semantics exist exactly once.

use std::collections::{BTreeMap, BTreeSet};

use netwatch_core::models::DeviceId;
use netwatch_core::store::{Indexed, IndexedRecordStore};
use netwatch_core::Result;

/// Counts of what one reconciliation pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Applies a freshly walked table to the store.
///
/// Phase one upserts every index present in `fresh`: the record is
/// fetched or created via `new_record`, the poller's `apply` mapping is
/// written onto it, and the result saved. Phase two deletes the indexes
/// the device no longer reports. Together they hold the invariant of at
/// most one record per (device, index) with no stale indexes retained.
///
/// Singleton profiles have no index set and bypass this path entirely;
/// their absence is not observable from a scalar poll, so they are never
/// stale-deleted.
pub async fn reconcile_indexed<R, S, F, New, Apply>(
    store: &S,
    device_id: DeviceId,
    fresh: BTreeMap<u32, F>,
    new_record: New,
    apply: Apply,
) -> Result<ReconcileOutcome>
where
    R: Indexed + Clone + Send + Sync + 'static,
    S: IndexedRecordStore<R> + ?Sized,
    New: Fn(DeviceId, u32) -> R,
    Apply: Fn(&mut R, F),
{
    let existing: BTreeSet<u32> = store
        .find_all_by_device(device_id)
        .await?
        .iter()
        .map(Indexed::index)
        .collect();
    let fresh_indexes: BTreeSet<u32> = fresh.keys().copied().collect();

    let mut outcome = ReconcileOutcome::default();
    for (index, fields) in fresh {
        let mut record = match store.find_by_device_and_index(device_id, index).await? {
            Some(record) => {
                outcome.updated += 1;
                record
            }
            None => {
                outcome.created += 1;
                new_record(device_id, index)
            }
        };
        apply(&mut record, fields);
        store.save(record).await?;
    }

    let stale: Vec<u32> = existing.difference(&fresh_indexes).copied().collect();
    if !stale.is_empty() {
        outcome.deleted = store.delete_many(device_id, &stale).await?;
    }
    Ok(outcome)
}
