//! Fixed-rate polling orchestrator with per-device circuit breaking.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use netwatch_core::models::{Device, DeviceEndpoint, DeviceId, PollStatus, PollerStats};
use netwatch_core::snmp::ManagementClient;
use netwatch_core::store::PollStore;
use netwatch_core::Result;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::domains;

/// Consecutive failures after which an endpoint is disabled. Once the
/// breaker trips an operator must re-enable the endpoint manually.
pub const FAILURE_THRESHOLD: u32 = 5;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub tick_interval: Duration,
    pub walk_max_entries: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(30),
            walk_max_entries: 1000,
        }
    }
}

/// Why a device was not polled this attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotDue,
    EndpointDisabled,
    MonitoringDisabled,
    UnknownDevice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Polled(PollStatus),
    Skipped(SkipReason),
}

/// Schedules poll cycles across the configured devices.
pub struct Orchestrator<S, C> {
    store: Arc<S>,
    client: Arc<C>,
    settings: OrchestratorSettings,
}

impl<S, C> Orchestrator<S, C>
where
    S: PollStore,
    C: ManagementClient,
{
    pub fn new(store: Arc<S>, client: Arc<C>, settings: OrchestratorSettings) -> Self {
        Self {
            store,
            client,
            settings,
        }
    }

    /// Runs the fixed-rate tick loop forever. A tick that overruns the
    /// interval delays the next one instead of stacking.
    pub async fn run(&self) {
        let mut ticker = interval(self.settings.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.tick().await {
                warn!(error = %e, "poll tick failed");
            }
        }
    }

    /// One scheduler tick. Devices are polled one at a time so writes to
    /// a device's records never interleave.
    pub async fn tick(&self) -> Result<()> {
        for endpoint in self.store.endpoints().await? {
            let device_id = endpoint.device_id;
            let outcome = self.poll_endpoint(endpoint).await?;
            debug!(%device_id, ?outcome, "tick outcome");
        }
        Ok(())
    }

    /// On-demand poll of a single device. Goes through the same due and
    /// eligibility gates as the scheduled path, so a manual trigger
    /// inside the poll interval is skipped rather than forced.
    pub async fn poll_device(&self, device_id: DeviceId) -> Result<PollOutcome> {
        match self.store.endpoint(device_id).await? {
            None => Ok(PollOutcome::Skipped(SkipReason::UnknownDevice)),
            Some(endpoint) => self.poll_endpoint(endpoint).await,
        }
    }

    /// On-demand poll of a list of devices, in order.
    pub async fn poll_devices(&self, device_ids: &[DeviceId]) -> Result<Vec<(DeviceId, PollOutcome)>> {
        let mut outcomes = Vec::with_capacity(device_ids.len());
        for id in device_ids {
            outcomes.push((*id, self.poll_device(*id).await?));
        }
        Ok(outcomes)
    }

    /// Read-only aggregate over the current endpoint state.
    pub async fn stats(&self) -> Result<PollerStats> {
        let mut stats = PollerStats {
            total_devices: self.store.devices().await?.len(),
            ..Default::default()
        };
        for endpoint in self.store.endpoints().await? {
            if endpoint.enabled {
                stats.enabled_endpoints += 1;
            } else {
                stats.disabled_endpoints += 1;
            }
            match endpoint.last_poll_status {
                Some(PollStatus::Success) => stats.last_poll_successes += 1,
                Some(PollStatus::Failure) => stats.last_poll_failures += 1,
                None => stats.never_polled += 1,
            }
        }
        Ok(stats)
    }

    async fn poll_endpoint(&self, mut endpoint: DeviceEndpoint) -> Result<PollOutcome> {
        if !endpoint.enabled {
            return Ok(PollOutcome::Skipped(SkipReason::EndpointDisabled));
        }
        let Some(device) = self.store.device(endpoint.device_id).await? else {
            return Ok(PollOutcome::Skipped(SkipReason::UnknownDevice));
        };
        if !device.monitoring_enabled {
            return Ok(PollOutcome::Skipped(SkipReason::MonitoringDisabled));
        }
        if !endpoint.is_due(Utc::now()) {
            return Ok(PollOutcome::Skipped(SkipReason::NotDue));
        }

        let result = self.poll_cycle(&device, &endpoint).await;
        endpoint.last_poll_at = Some(Utc::now());
        let status = match result {
            Ok(()) => {
                endpoint.consecutive_failures = 0;
                endpoint.last_error = None;
                PollStatus::Success
            }
            Err(message) => {
                endpoint.consecutive_failures += 1;
                endpoint.last_error = Some(message.clone());
                warn!(
                    device = %device.name,
                    failures = endpoint.consecutive_failures,
                    %message,
                    "device poll failed"
                );
                if endpoint.consecutive_failures >= FAILURE_THRESHOLD {
                    endpoint.enabled = false;
                    warn!(
                        device = %device.name,
                        "circuit breaker tripped, endpoint disabled until re-enabled manually"
                    );
                }
                PollStatus::Failure
            }
        };
        endpoint.last_poll_status = Some(status);
        self.store.update_endpoint(endpoint).await?;
        Ok(PollOutcome::Polled(status))
    }

    /// Liveness gate plus the fixed domain sequence. A domain failure is
    /// logged and the remaining domains still run; only an unreachable
    /// device fails the cycle.
    async fn poll_cycle(
        &self,
        device: &Device,
        endpoint: &DeviceEndpoint,
    ) -> std::result::Result<(), String> {
        let target = endpoint.target();
        if !self.client.probe(&target).await {
            return Err("liveness probe failed".to_string());
        }

        let client: &C = self.client.as_ref();
        let store: &S = self.store.as_ref();
        let max = self.settings.walk_max_entries;

        if let Err(e) = domains::system::poll(client, store, device.id, &target).await {
            warn!(device = %device.name, error = %e, "system poll failed");
        }
        if let Err(e) = domains::interfaces::poll(client, store, device.id, &target, max).await {
            warn!(device = %device.name, error = %e, "interface poll failed");
        }
        if let Err(e) = domains::units::poll(client, store, device.id, &target, max).await {
            warn!(device = %device.name, error = %e, "physical unit poll failed");
        }
        if let Err(e) = domains::ip::poll(client, store, device.id, &target).await {
            warn!(device = %device.name, error = %e, "ip profile poll failed");
        }
        if let Err(e) = domains::icmp::poll(client, store, device.id, &target).await {
            warn!(device = %device.name, error = %e, "icmp profile poll failed");
        }
        if let Err(e) = domains::udp::poll(client, store, device.id, &target).await {
            warn!(device = %device.name, error = %e, "udp profile poll failed");
        }
        Ok(())
    }
}
