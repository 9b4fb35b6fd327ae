/*
 * Copyright 2025 Carver Automation Corporation.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Event processing: windowed deduplication, classification, device
//! resolution, persistence and alert derivation.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use netwatch_core::models::{Alert, NotificationEvent};
use netwatch_core::sink::AlertNotifier;
use netwatch_core::store::{DeviceStore, EventStore};
use netwatch_core::Result;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::classify;
use crate::listener::RawNotification;

/// Width of the dedup time bucket.
pub const DEDUP_WINDOW_SECS: i64 = 300;

/// Dedup key: digest of source address, notification identity and the
/// coarse time bucket the notification arrived in.
pub fn hash_key(source: IpAddr, trap_oid: &str, at: DateTime<Utc>) -> String {
    let bucket = at.timestamp().div_euclid(DEDUP_WINDOW_SECS);
    let mut hasher = Sha256::new();
    hasher.update(source.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(trap_oid.as_bytes());
    hasher.update(b"|");
    hasher.update(bucket.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Turns raw notifications into stored events and derived alerts.
pub struct EventProcessor<S> {
    store: Arc<S>,
    notifier: Arc<dyn AlertNotifier>,
    /// The hash lookup followed by the insert is a check-then-act;
    /// serializing it keeps concurrent deliveries of the same
    /// notification from creating duplicate rows.
    dedup_gate: Mutex<()>,
}

impl<S> EventProcessor<S>
where
    S: EventStore + DeviceStore,
{
    pub fn new(store: Arc<S>, notifier: Arc<dyn AlertNotifier>) -> Self {
        Self {
            store,
            notifier,
            dedup_gate: Mutex::new(()),
        }
    }

    pub async fn process(&self, raw: RawNotification) -> Result<NotificationEvent> {
        self.process_at(raw, Utc::now()).await
    }

    /// Explicit-clock variant of `process`.
    pub async fn process_at(
        &self,
        raw: RawNotification,
        now: DateTime<Utc>,
    ) -> Result<NotificationEvent> {
        let key = hash_key(raw.source_addr, &raw.trap_oid, now);
        let _gate = self.dedup_gate.lock().await;

        if let Some(mut existing) = self.store.find_event_by_hash(&key).await? {
            existing.duplicate_count += 1;
            existing.last_seen = now;
            self.store.update_event(existing.clone()).await?;
            debug!(
                hash_key = %key,
                duplicates = existing.duplicate_count,
                "suppressed duplicate notification"
            );
            return Ok(existing);
        }

        let event_type = match raw.generic_code {
            Some(code) => classify::classify_generic(code),
            None => classify::classify_identifier(&raw.trap_oid),
        };
        let severity = classify::severity_of(event_type);
        let device = self.store.device_by_address(raw.source_addr).await?;

        let mut event = NotificationEvent {
            id: Uuid::new_v4(),
            source_addr: raw.source_addr,
            source_port: raw.source_port,
            community: raw.community,
            trap_oid: raw.trap_oid,
            enterprise_oid: raw.enterprise_oid,
            generic_code: raw.generic_code,
            specific_code: raw.specific_code,
            uptime_ticks: raw.uptime_ticks,
            fields: raw.fields,
            hash_key: key,
            duplicate_count: 1,
            first_seen: now,
            last_seen: now,
            event_type,
            severity,
            processed: false,
            alert_id: None,
            device_id: device.as_ref().map(|d| d.id),
        };
        self.store.insert_event(event.clone()).await?;

        if severity.alert_worthy() {
            let alert = Alert {
                id: Uuid::new_v4(),
                device_id: event.device_id,
                kind: classify::alert_kind_of(event_type),
                severity,
                message: format!("{} notification from {}", event_type, event.source_addr),
                event_id: event.id,
                created_at: now,
                acknowledged: false,
            };
            self.store.insert_alert(alert.clone()).await?;
            self.notifier.notify(&alert);
            event.alert_id = Some(alert.id);
        }

        event.processed = true;
        self.store.update_event(event.clone()).await?;
        Ok(event)
    }
}
