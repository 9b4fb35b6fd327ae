//! SNMP protocol client: cached sessions, typed values, and the
//! operations the pollers and the discovery engine build on.

mod client;
pub mod oids;
mod session;
mod value;

pub use client::SnmpClient;
pub use session::{SessionKey, SessionRegistry};
pub use value::SnmpValue;

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{Credential, ProtocolVersion};

/// Protocol-level description of an agent to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub address: IpAddr,
    pub port: u16,
    pub version: ProtocolVersion,
    pub credential: Credential,
    pub timeout: Duration,
    pub retries: u32,
}

impl Target {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// Same protocol parameters pointed at a different address. Used by
    /// discovery to probe neighbor candidates.
    pub fn with_address(&self, address: IpAddr) -> Self {
        Self {
            address,
            ..self.clone()
        }
    }
}

/// Operations the monitoring core needs from a management-protocol
/// client.
///
/// Unavailability is an empty result, never an error: transport
/// failures, timeouts and agent-reported error statuses all collapse to
/// `None` or an empty collection once the configured retries are spent.
#[async_trait]
pub trait ManagementClient: Send + Sync {
    /// Single-value fetch.
    async fn get(&self, target: &Target, oid: &str) -> Option<SnmpValue>;

    /// Batched fetch. All-or-nothing: if any requested value is
    /// unavailable the whole map comes back empty, so callers must
    /// tolerate an empty result and continue.
    async fn get_multiple(&self, target: &Target, oids: &[&str]) -> HashMap<String, SnmpValue>;

    /// Enumerates the subtree under `root` with repeated GETNEXT calls,
    /// stopping at `max_entries` to bound misbehaving agents.
    async fn walk(&self, target: &Target, root: &str, max_entries: usize)
        -> Vec<(String, SnmpValue)>;

    /// Lightweight reachability check used to gate poll cycles.
    async fn probe(&self, target: &Target) -> bool {
        self.get(target, oids::SYS_UPTIME).await.is_some()
    }
}
