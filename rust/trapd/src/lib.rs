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

//! SNMP trap receiver: decodes inbound notification datagrams,
//! deduplicates them inside a time window, classifies type and severity,
//! and raises derived alerts.

pub mod classify;
pub mod config;
pub mod listener;
pub mod processor;

use std::sync::Arc;

use anyhow::{Context, Result};
use netwatch_core::sink::LogAlertNotifier;
use netwatch_core::store::{DeviceStore, EventStore, MemoryStore};
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::TrapdConfig;
use crate::processor::EventProcessor;

/// Bootstraps the receiver with the default in-memory store and log
/// notifier, then serves until the process is stopped.
pub async fn run(config: TrapdConfig) -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let processor = Arc::new(EventProcessor::new(store, Arc::new(LogAlertNotifier)));
    serve(config, processor).await
}

/// Binds the datagram listener and feeds decoded notifications to the
/// processor on a small worker pool. Malformed datagrams never stop the
/// loop.
pub async fn serve<S>(config: TrapdConfig, processor: Arc<EventProcessor<S>>) -> Result<()>
where
    S: EventStore + DeviceStore + 'static,
{
    let socket = UdpSocket::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("listening for notifications on {}", config.listen_addr);

    let workers = Arc::new(Semaphore::new(config.workers.max(1)));
    let mut buf = vec![0u8; 65535];
    loop {
        let (len, source) = socket.recv_from(&mut buf).await?;
        let Some(raw) = listener::decode_datagram(&buf[..len], source, &config.community) else {
            continue;
        };
        let permit = workers.clone().acquire_owned().await?;
        let processor = processor.clone();
        tokio::spawn(async move {
            if let Err(e) = processor.process(raw).await {
                warn!(error = %e, "failed to process notification");
            }
            drop(permit);
        });
    }
}
