//! Event processing: windowed dedup, the severity cutoff for alert
//! creation, and device linking.

mod support;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use netwatch_core::models::{AlertKind, Device, EventType, Severity};
use netwatch_core::store::{DeviceStore, EventStore, MemoryStore};
use netwatch_trapd::listener::RawNotification;
use netwatch_trapd::processor::EventProcessor;
use pretty_assertions::assert_eq;
use support::CollectingNotifier;

const COLD_START: &str = "1.3.6.1.6.3.1.1.5.1";

fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn raw_modern(trap_oid: &str) -> RawNotification {
    RawNotification {
        source_addr: "192.0.2.9".parse().unwrap(),
        source_port: 29000,
        community: "public".into(),
        trap_oid: trap_oid.into(),
        enterprise_oid: None,
        generic_code: None,
        specific_code: None,
        uptime_ticks: Some(42),
        fields: BTreeMap::new(),
    }
}

fn raw_legacy(generic: i64) -> RawNotification {
    let mut raw = raw_modern("1.3.6.1.4.1.9.0.1");
    raw.generic_code = Some(generic);
    raw.specific_code = Some(0);
    raw.enterprise_oid = Some("1.3.6.1.4.1.9".into());
    raw
}

fn processor() -> (Arc<MemoryStore>, Arc<CollectingNotifier>, EventProcessor<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(CollectingNotifier::default());
    let processor = EventProcessor::new(store.clone(), notifier.clone());
    (store, notifier, processor)
}

#[tokio::test]
async fn duplicates_in_one_bucket_collapse_to_one_event() {
    let (store, notifier, processor) = processor();
    let now = fixed_now();

    let first = processor.process_at(raw_modern(COLD_START), now).await.unwrap();
    assert_eq!(first.duplicate_count, 1);

    let second = processor
        .process_at(raw_modern(COLD_START), now + Duration::seconds(90))
        .await
        .unwrap();
    assert_eq!(second.id, first.id, "same row is mutated, not a new one");
    assert_eq!(second.duplicate_count, 2);

    assert_eq!(store.events().await.unwrap().len(), 1);
    // The duplicate raised no second alert.
    assert_eq!(store.alerts().await.unwrap().len(), 1);
    assert_eq!(notifier.alerts.lock().len(), 1);

    // A new time bucket starts a new row with its own counter.
    let third = processor
        .process_at(raw_modern(COLD_START), now + Duration::seconds(301))
        .await
        .unwrap();
    assert_ne!(third.id, first.id);
    assert_eq!(third.duplicate_count, 1);
    assert_eq!(store.events().await.unwrap().len(), 2);
}

#[tokio::test]
async fn concurrent_deliveries_of_one_notification_stay_deduplicated() {
    let (store, _notifier, processor) = processor();
    let processor = Arc::new(processor);
    let now = fixed_now();

    let (a, b) = tokio::join!(
        processor.process_at(raw_modern(COLD_START), now),
        processor.process_at(raw_modern(COLD_START), now),
    );
    a.unwrap();
    b.unwrap();

    let events = store.events().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].duplicate_count, 2);
}

#[tokio::test]
async fn cold_start_is_critical_and_raises_an_alert() {
    let (store, notifier, processor) = processor();
    let event = processor
        .process_at(raw_modern(COLD_START), fixed_now())
        .await
        .unwrap();

    assert_eq!(event.event_type, EventType::ColdStart);
    assert_eq!(event.severity, Severity::Critical);
    assert!(event.processed);

    let alerts = store.alerts().await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Availability);
    assert_eq!(alerts[0].severity, Severity::Critical);
    assert_eq!(event.alert_id, Some(alerts[0].id));
    assert_eq!(notifier.alerts.lock().len(), 1);
}

#[tokio::test]
async fn link_up_is_warning_and_still_raises_an_alert() {
    let (store, _notifier, processor) = processor();
    // legacy generic code 3 = link-up
    let event = processor.process_at(raw_legacy(3), fixed_now()).await.unwrap();

    assert_eq!(event.event_type, EventType::LinkUp);
    assert_eq!(event.severity, Severity::Warning);
    // The alert cutoff excludes only INFO, so WARNING still alerts.
    assert_eq!(store.alerts().await.unwrap().len(), 1);
    assert!(event.alert_id.is_some());
}

#[tokio::test]
async fn vendor_specific_info_events_do_not_alert() {
    let (store, notifier, processor) = processor();
    let event = processor.process_at(raw_legacy(6), fixed_now()).await.unwrap();

    assert_eq!(event.event_type, EventType::VendorSpecific);
    assert_eq!(event.severity, Severity::Info);
    assert!(event.processed);
    assert_eq!(event.alert_id, None);
    assert!(store.alerts().await.unwrap().is_empty());
    assert!(notifier.alerts.lock().is_empty());
}

#[tokio::test]
async fn events_link_to_the_owning_device_when_known() {
    let (store, _notifier, processor) = processor();
    let device = Device::new("lab-router", "192.0.2.9".parse().unwrap());
    let device_id = device.id;
    store.upsert_device(device).await.unwrap();

    let event = processor
        .process_at(raw_modern(COLD_START), fixed_now())
        .await
        .unwrap();
    assert_eq!(event.device_id, Some(device_id));

    let alerts = store.alerts().await.unwrap();
    assert_eq!(alerts[0].device_id, Some(device_id));
}

#[tokio::test]
async fn unknown_sources_leave_the_device_link_empty() {
    let (_store, _notifier, processor) = processor();
    let event = processor
        .process_at(raw_modern(COLD_START), fixed_now())
        .await
        .unwrap();
    assert_eq!(event.device_id, None);
}
