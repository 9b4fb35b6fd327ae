//! Discovery run parameters.

use std::net::IpAddr;
use std::time::Duration;

use ipnet::IpNet;
use netwatch_core::models::{Credential, ProtocolVersion};
use netwatch_core::snmp::Target;
use netwatch_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest host count a seed range may expand to.
const MAX_RANGE_HOSTS: u32 = 4096;

/// Seed of a discovery run: one address or a CIDR range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedTarget {
    Address(IpAddr),
    Range(IpNet),
}

/// Which exploration methods a run uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MethodFlags {
    #[serde(default = "default_true")]
    pub liveness_sweep: bool,
    #[serde(default = "default_true")]
    pub snmp_probe: bool,
    #[serde(default = "default_true")]
    pub l2_neighbors: bool,
    #[serde(default = "default_true")]
    pub l3_neighbors: bool,
}

impl Default for MethodFlags {
    fn default() -> Self {
        Self {
            liveness_sweep: true,
            snmp_probe: true,
            l2_neighbors: true,
            l3_neighbors: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_max_hops() -> u32 {
    3
}

const fn default_concurrency() -> usize {
    16
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

const fn default_walk_max_entries() -> usize {
    1000
}

/// Full parameter set for one discovery run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySpec {
    pub seed: SeedTarget,
    #[serde(default)]
    pub methods: MethodFlags,
    #[serde(default = "default_max_hops")]
    pub max_hops: u32,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    pub version: ProtocolVersion,
    pub credential: Credential,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_walk_max_entries")]
    pub walk_max_entries: usize,
}

impl DiscoverySpec {
    pub fn validate(&self) -> Result<()> {
        if self.max_hops == 0 {
            return Err(Error::InvalidConfig("max_hops must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig("timeout_secs must be at least 1".into()));
        }
        if let SeedTarget::Range(net) = &self.seed {
            let host_bits = match net {
                IpNet::V4(net) => 32 - u32::from(net.prefix_len()),
                IpNet::V6(net) => 128 - u32::from(net.prefix_len()),
            };
            if host_bits > MAX_RANGE_HOSTS.trailing_zeros() {
                return Err(Error::InvalidConfig(format!(
                    "seed range {net} expands past {MAX_RANGE_HOSTS} hosts"
                )));
            }
        }
        Ok(())
    }

    /// Protocol target for one candidate address, sharing the run's
    /// credential and timing parameters.
    pub fn target_for(&self, address: IpAddr) -> Target {
        Target {
            address,
            port: self.port,
            version: self.version,
            credential: self.credential.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            retries: self.retries,
        }
    }

    /// Expands the seed into candidate addresses.
    pub fn seed_addresses(&self) -> Vec<IpAddr> {
        match &self.seed {
            SeedTarget::Address(address) => vec![*address],
            SeedTarget::Range(net) => net.hosts().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(seed: SeedTarget) -> DiscoverySpec {
        DiscoverySpec {
            seed,
            methods: MethodFlags::default(),
            max_hops: 3,
            concurrency: 8,
            version: ProtocolVersion::V2c,
            credential: Credential::Community {
                community: "public".into(),
            },
            port: 161,
            timeout_secs: 2,
            retries: 1,
            walk_max_entries: 1000,
        }
    }

    #[test]
    fn single_address_seed_expands_to_itself() {
        let spec = spec(SeedTarget::Address("10.0.0.1".parse().unwrap()));
        assert_eq!(spec.seed_addresses(), vec!["10.0.0.1".parse::<IpAddr>().unwrap()]);
    }

    #[test]
    fn range_seed_skips_network_and_broadcast() {
        let spec = spec(SeedTarget::Range("192.0.2.0/30".parse().unwrap()));
        let hosts = spec.seed_addresses();
        assert_eq!(hosts.len(), 2);
        assert!(hosts.contains(&"192.0.2.1".parse().unwrap()));
        assert!(hosts.contains(&"192.0.2.2".parse().unwrap()));
    }

    #[test]
    fn oversized_ranges_are_rejected() {
        let spec = spec(SeedTarget::Range("10.0.0.0/8".parse().unwrap()));
        assert!(spec.validate().is_err());
    }

    #[test]
    fn zero_hops_are_rejected() {
        let mut spec = spec(SeedTarget::Address("10.0.0.1".parse().unwrap()));
        spec.max_hops = 0;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn seed_deserializes_from_plain_strings() {
        let spec: DiscoverySpec = serde_json::from_str(
            r#"{
                "seed": "192.0.2.0/24",
                "version": "v2c",
                "credential": {"type": "community", "community": "public"}
            }"#,
        )
        .unwrap();
        assert!(matches!(spec.seed, SeedTarget::Range(_)));
        assert_eq!(spec.max_hops, 3);
    }
}
