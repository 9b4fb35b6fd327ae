//! Poller configuration: a JSON file naming the managed device
//! endpoints and the scheduler parameters.

use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use netwatch_core::models::{Credential, Device, DeviceEndpoint, ProtocolVersion};
use netwatch_core::store::MemoryStore;
use serde::{Deserialize, Serialize};

use crate::orchestrator::OrchestratorSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_walk_max_entries")]
    pub walk_max_entries: usize,
    pub devices: Vec<DeviceSeed>,
}

/// One managed device as it appears in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSeed {
    pub name: String,
    pub address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    pub version: ProtocolVersion,
    pub credential: Credential,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub monitoring_enabled: bool,
}

const fn default_tick_interval_secs() -> u64 {
    30
}

const fn default_walk_max_entries() -> usize {
    1000
}

const fn default_port() -> u16 {
    161
}

const fn default_timeout_secs() -> u64 {
    5
}

const fn default_retries() -> u32 {
    1
}

const fn default_poll_interval_secs() -> u64 {
    300
}

const fn default_true() -> bool {
    true
}

impl PollerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let cfg: PollerConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_secs == 0 {
            anyhow::bail!("tick_interval_secs must be greater than zero");
        }
        if self.walk_max_entries == 0 {
            anyhow::bail!("walk_max_entries must be greater than zero");
        }
        if self.devices.is_empty() {
            anyhow::bail!("at least one device is required");
        }
        for seed in &self.devices {
            if seed.name.is_empty() {
                anyhow::bail!("device name cannot be empty");
            }
            if seed.timeout_secs == 0 {
                anyhow::bail!("device {} timeout_secs must be greater than zero", seed.name);
            }
        }
        Ok(())
    }

    /// Loads the configured devices into the store.
    pub fn seed(&self, store: &MemoryStore) {
        for seed in &self.devices {
            let mut device = Device::new(seed.name.clone(), seed.address);
            device.monitoring_enabled = seed.monitoring_enabled;
            let mut endpoint = DeviceEndpoint::new(
                device.id,
                seed.address,
                seed.version,
                seed.credential.clone(),
            );
            endpoint.port = seed.port;
            endpoint.timeout_secs = seed.timeout_secs;
            endpoint.retries = seed.retries;
            endpoint.poll_interval_secs = seed.poll_interval_secs;
            endpoint.enabled = seed.enabled;
            store.add_device(device, endpoint);
        }
    }

    pub fn settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            tick_interval: Duration::from_secs(self.tick_interval_secs),
            walk_max_entries: self.walk_max_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> PollerConfig {
        PollerConfig {
            tick_interval_secs: 30,
            walk_max_entries: 1000,
            devices: vec![DeviceSeed {
                name: "core-switch".into(),
                address: "192.0.2.20".parse().unwrap(),
                port: 161,
                version: ProtocolVersion::V2c,
                credential: Credential::Community {
                    community: "public".into(),
                },
                timeout_secs: 5,
                retries: 1,
                poll_interval_secs: 300,
                enabled: true,
                monitoring_enabled: true,
            }],
        }
    }

    #[test]
    fn valid_configuration_passes() {
        base_config().validate().expect("expected configuration to validate");
    }

    #[test]
    fn empty_device_list_is_rejected() {
        let mut cfg = base_config();
        cfg.devices.clear();
        let err = cfg.validate().expect_err("expected validation error");
        assert!(err.to_string().contains("at least one device"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = base_config();
        cfg.devices[0].timeout_secs = 0;
        let err = cfg.validate().expect_err("expected validation error");
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn config_json_round_trips() {
        let json = r#"{
            "devices": [{
                "name": "edge",
                "address": "198.51.100.7",
                "version": "v3",
                "credential": {
                    "type": "usm",
                    "security_name": "operator",
                    "auth": {"algorithm": "sha256", "passphrase": "authpass"},
                    "privacy": {"cipher": "aes128", "passphrase": "privpass"}
                }
            }]
        }"#;
        let cfg: PollerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.tick_interval_secs, 30);
        assert_eq!(cfg.devices[0].poll_interval_secs, 300);
        assert!(matches!(cfg.devices[0].credential, Credential::Usm { .. }));
    }
}
