//! Data model for the NetWatch monitoring core.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::snmp::Target;

pub type DeviceId = Uuid;

/// SNMP protocol version spoken by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    V1,
    V2c,
    V3,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V1 => write!(f, "v1"),
            ProtocolVersion::V2c => write!(f, "v2c"),
            ProtocolVersion::V3 => write!(f, "v3"),
        }
    }
}

/// Authentication digest for SNMPv3 user-based security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

/// Privacy cipher for SNMPv3 user-based security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyCipher {
    Des,
    Aes128,
    Aes192,
    Aes256,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsmAuth {
    pub algorithm: AuthAlgorithm,
    pub passphrase: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsmPrivacy {
    pub cipher: PrivacyCipher,
    pub passphrase: String,
}

/// Credential attached to a device endpoint.
///
/// v1/v2c endpoints carry a community string; v3 endpoints carry a
/// security name with optional authentication and privacy settings.
/// Privacy without authentication is not a valid USM level and is
/// rejected when a session is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    Community { community: String },
    Usm {
        security_name: String,
        #[serde(default)]
        auth: Option<UsmAuth>,
        #[serde(default)]
        privacy: Option<UsmPrivacy>,
    },
}

impl Credential {
    /// Short identity string used in log output. Never includes passphrases.
    pub fn identity(&self) -> String {
        match self {
            Credential::Community { community } => format!("community:{community}"),
            Credential::Usm { security_name, .. } => format!("usm:{security_name}"),
        }
    }
}

/// Outcome of the most recent poll cycle for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PollStatus {
    Success,
    Failure,
}

/// Management endpoint of a device.
///
/// Configuration fields are owned by external configuration management;
/// the orchestrator only mutates the bookkeeping fields (last poll time
/// and status, consecutive failures) and flips `enabled` when the
/// circuit breaker trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub device_id: DeviceId,
    pub address: IpAddr,
    #[serde(default = "default_snmp_port")]
    pub port: u16,
    pub version: ProtocolVersion,
    pub credential: Credential,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub last_poll_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_poll_status: Option<PollStatus>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub consecutive_failures: u32,
}

const fn default_snmp_port() -> u16 {
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

const fn default_enabled() -> bool {
    true
}

impl DeviceEndpoint {
    pub fn new(device_id: DeviceId, address: IpAddr, version: ProtocolVersion, credential: Credential) -> Self {
        Self {
            device_id,
            address,
            port: default_snmp_port(),
            version,
            credential,
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            poll_interval_secs: default_poll_interval_secs(),
            enabled: true,
            last_poll_at: None,
            last_poll_status: None,
            last_error: None,
            consecutive_failures: 0,
        }
    }

    /// Protocol-level view of this endpoint for the SNMP client.
    pub fn target(&self) -> Target {
        Target {
            address: self.address,
            port: self.port,
            version: self.version,
            credential: self.credential.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            retries: self.retries,
        }
    }

    /// A device is due when it has never been polled or its interval has
    /// elapsed since the last attempt.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_poll_at {
            None => true,
            Some(last) => now >= last + chrono::Duration::seconds(self.poll_interval_secs as i64),
        }
    }
}

/// System-group snapshot collected by the system poller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub descr: Option<String>,
    pub object_id: Option<String>,
    pub uptime_ticks: Option<u32>,
    pub contact: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub services: Option<i64>,
}

/// A monitored network device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub address: IpAddr,
    pub monitoring_enabled: bool,
    #[serde(default)]
    pub sys_info: Option<SystemInfo>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Device {
    pub fn new(name: impl Into<String>, address: IpAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address,
            monitoring_enabled: true,
            sys_info: None,
            last_seen: None,
        }
    }
}

/// ifAdminStatus codes. Unrecognized codes are preserved as raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceAdminStatus {
    Up,
    Down,
    Testing,
    Other(i64),
}

impl InterfaceAdminStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Up,
            2 => Self::Down,
            3 => Self::Testing,
            other => Self::Other(other),
        }
    }
}

/// ifOperStatus codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceOperStatus {
    Up,
    Down,
    Testing,
    Unknown,
    Dormant,
    NotPresent,
    LowerLayerDown,
    Other(i64),
}

impl InterfaceOperStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Up,
            2 => Self::Down,
            3 => Self::Testing,
            4 => Self::Unknown,
            5 => Self::Dormant,
            6 => Self::NotPresent,
            7 => Self::LowerLayerDown,
            other => Self::Other(other),
        }
    }
}

/// One row of the interface table, mirrored from the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub device_id: DeviceId,
    pub if_index: u32,
    pub descr: Option<String>,
    pub if_type: Option<i64>,
    pub mtu: Option<i64>,
    pub speed: Option<u64>,
    pub phys_address: Option<String>,
    pub admin_status: Option<InterfaceAdminStatus>,
    pub oper_status: Option<InterfaceOperStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterfaceRecord {
    pub fn new(device_id: DeviceId, if_index: u32) -> Self {
        let now = Utc::now();
        Self {
            device_id,
            if_index,
            descr: None,
            if_type: None,
            mtu: None,
            speed: None,
            phys_address: None,
            admin_status: None,
            oper_status: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// entPhysicalClass codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhysicalClass {
    Other,
    Unknown,
    Chassis,
    Backplane,
    Container,
    PowerSupply,
    Fan,
    Sensor,
    Module,
    Port,
    Stack,
    Cpu,
    Unrecognized(i64),
}

impl PhysicalClass {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Other,
            2 => Self::Unknown,
            3 => Self::Chassis,
            4 => Self::Backplane,
            5 => Self::Container,
            6 => Self::PowerSupply,
            7 => Self::Fan,
            8 => Self::Sensor,
            9 => Self::Module,
            10 => Self::Port,
            11 => Self::Stack,
            12 => Self::Cpu,
            other => Self::Unrecognized(other),
        }
    }
}

/// One row of the physical entity table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalUnitRecord {
    pub device_id: DeviceId,
    pub unit_index: u32,
    pub descr: Option<String>,
    pub class: Option<PhysicalClass>,
    pub name: Option<String>,
    pub hardware_rev: Option<String>,
    pub firmware_rev: Option<String>,
    pub serial_number: Option<String>,
    pub mfg_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PhysicalUnitRecord {
    pub fn new(device_id: DeviceId, unit_index: u32) -> Self {
        let now = Utc::now();
        Self {
            device_id,
            unit_index,
            descr: None,
            class: None,
            name: None,
            hardware_rev: None,
            firmware_rev: None,
            serial_number: None,
            mfg_name: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Network-layer statistics profile. One row per device, overwritten on
/// every successful poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpProfile {
    pub forwarding: Option<bool>,
    pub default_ttl: Option<i64>,
    pub in_receives: Option<u64>,
    pub in_delivers: Option<u64>,
    pub out_requests: Option<u64>,
    pub in_discards: Option<u64>,
    pub out_discards: Option<u64>,
}

/// Control-message statistics profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IcmpProfile {
    pub in_msgs: Option<u64>,
    pub in_errors: Option<u64>,
    pub in_dest_unreachs: Option<u64>,
    pub in_echos: Option<u64>,
    pub in_echo_reps: Option<u64>,
    pub out_msgs: Option<u64>,
    pub out_errors: Option<u64>,
    pub out_dest_unreachs: Option<u64>,
    pub out_echos: Option<u64>,
    pub out_echo_reps: Option<u64>,
}

/// Datagram statistics profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UdpProfile {
    pub in_datagrams: Option<u64>,
    pub out_datagrams: Option<u64>,
    pub in_errors: Option<u64>,
    pub no_ports: Option<u64>,
}

/// Classified kind of an inbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ColdStart,
    WarmStart,
    LinkDown,
    LinkUp,
    AuthenticationFailure,
    NeighborLoss,
    VendorSpecific,
    DeviceDown,
    PowerFailure,
    FanFailure,
    TemperatureAlarm,
    CpuAlarm,
    MemoryAlarm,
    DiskAlarm,
    InterfaceDown,
    InterfaceUp,
    Restart,
    ConfigChange,
    ThresholdExceeded,
    Unknown,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventType::ColdStart => "cold-start",
            EventType::WarmStart => "warm-start",
            EventType::LinkDown => "link-down",
            EventType::LinkUp => "link-up",
            EventType::AuthenticationFailure => "authentication-failure",
            EventType::NeighborLoss => "neighbor-loss",
            EventType::VendorSpecific => "vendor-specific",
            EventType::DeviceDown => "device-down",
            EventType::PowerFailure => "power-failure",
            EventType::FanFailure => "fan-failure",
            EventType::TemperatureAlarm => "temperature-alarm",
            EventType::CpuAlarm => "cpu-alarm",
            EventType::MemoryAlarm => "memory-alarm",
            EventType::DiskAlarm => "disk-alarm",
            EventType::InterfaceDown => "interface-down",
            EventType::InterfaceUp => "interface-up",
            EventType::Restart => "restart",
            EventType::ConfigChange => "config-change",
            EventType::ThresholdExceeded => "threshold-exceeded",
            EventType::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Severity ladder, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Warning,
    Info,
}

impl Severity {
    /// Everything except INFO produces an alert.
    pub fn alert_worthy(self) -> bool {
        !matches!(self, Severity::Info)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Critical => "CRITICAL",
            Severity::Major => "MAJOR",
            Severity::Minor => "MINOR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        f.write_str(label)
    }
}

/// Alert taxonomy derived from the event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    Availability,
    Connectivity,
    Hardware,
    Environment,
    Performance,
    Security,
    Configuration,
    Other,
}

/// A normalized, deduplicated notification received from a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub source_addr: IpAddr,
    pub source_port: u16,
    pub community: String,
    pub trap_oid: String,
    pub enterprise_oid: Option<String>,
    pub generic_code: Option<i64>,
    pub specific_code: Option<i64>,
    pub uptime_ticks: Option<u32>,
    pub fields: BTreeMap<String, String>,
    pub hash_key: String,
    pub duplicate_count: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub event_type: EventType,
    pub severity: Severity,
    pub processed: bool,
    pub alert_id: Option<Uuid>,
    pub device_id: Option<DeviceId>,
}

/// Alert raised from an alert-worthy notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub device_id: Option<DeviceId>,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
}

/// Lifecycle of a discovery run. COMPLETE, FAILED and CANCELLED are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    InProgress,
    Complete,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Complete | RunStatus::Failed | RunStatus::Cancelled)
    }
}

/// Rough device classification used to decide whether to expand neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Router,
    Switch,
    Host,
    Unknown,
}

impl DeviceClass {
    /// sysServices is a bitmask of the OSI layers the device implements:
    /// bit 2 (value 2) marks layer-2 forwarding, bit 3 (value 4) marks
    /// layer-3 routing.
    pub fn from_sys_services(services: i64) -> Self {
        if services & 0x4 != 0 {
            DeviceClass::Router
        } else if services & 0x2 != 0 {
            DeviceClass::Switch
        } else if services & 0x40 != 0 {
            DeviceClass::Host
        } else {
            DeviceClass::Unknown
        }
    }

    pub fn expands_neighbors(self) -> bool {
        matches!(self, DeviceClass::Router | DeviceClass::Switch)
    }
}

/// One node of a discovered topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyNode {
    pub id: String,
    pub address: Option<IpAddr>,
    pub mac: Option<String>,
    pub hostname: Option<String>,
    pub sys_descr: Option<String>,
    pub sys_object_id: Option<String>,
    pub class: DeviceClass,
    pub reachable: bool,
    pub hop: u32,
}

impl TopologyNode {
    /// Node identity: address first, then link-layer address, then a
    /// generated id.
    pub fn identity(address: Option<IpAddr>, mac: Option<&str>) -> String {
        if let Some(addr) = address {
            addr.to_string()
        } else if let Some(mac) = mac {
            mac.to_string()
        } else {
            format!("node-{}", Uuid::new_v4())
        }
    }

    /// Minimal node for an address that answered nothing beyond liveness.
    pub fn minimal(address: IpAddr, hop: u32) -> Self {
        Self {
            id: address.to_string(),
            address: Some(address),
            mac: None,
            hostname: None,
            sys_descr: None,
            sys_object_id: None,
            class: DeviceClass::Unknown,
            reachable: true,
            hop,
        }
    }

    /// True when the node carries nothing beyond its address.
    pub fn is_minimal(&self) -> bool {
        self.hostname.is_none() && self.sys_descr.is_none() && self.sys_object_id.is_none()
    }
}

/// Relation expressed by a topology edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeRelation {
    Layer2,
    Layer3NextHop,
    Arp,
}

/// An undirected edge between two topology nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyEdge {
    pub a: String,
    pub b: String,
    pub relation: EdgeRelation,
}

impl TopologyEdge {
    pub fn new(a: impl Into<String>, b: impl Into<String>, relation: EdgeRelation) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            relation,
        }
    }

    /// Order-independent identity of the endpoint pair.
    pub fn key(&self) -> (String, String) {
        if self.a <= self.b {
            (self.a.clone(), self.b.clone())
        } else {
            (self.b.clone(), self.a.clone())
        }
    }
}

/// State of one discovery run, mutated incrementally as batches complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRun {
    pub id: Uuid,
    pub status: RunStatus,
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
    pub hops_completed: u32,
    pub progress_percent: u8,
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DiscoveryRun {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: RunStatus::Pending,
            nodes: Vec::new(),
            edges: Vec::new(),
            hops_completed: 0,
            progress_percent: 0,
            warnings: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

impl Default for DiscoveryRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only aggregate over the current endpoint state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerStats {
    pub total_devices: usize,
    pub enabled_endpoints: usize,
    pub disabled_endpoints: usize,
    pub last_poll_successes: usize,
    pub last_poll_failures: usize,
    pub never_polled: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn admin_status_codes_decode() {
        assert_eq!(InterfaceAdminStatus::from_code(1), InterfaceAdminStatus::Up);
        assert_eq!(InterfaceAdminStatus::from_code(2), InterfaceAdminStatus::Down);
        assert_eq!(InterfaceAdminStatus::from_code(9), InterfaceAdminStatus::Other(9));
    }

    #[test]
    fn oper_status_codes_decode() {
        assert_eq!(InterfaceOperStatus::from_code(5), InterfaceOperStatus::Dormant);
        assert_eq!(InterfaceOperStatus::from_code(7), InterfaceOperStatus::LowerLayerDown);
        assert_eq!(InterfaceOperStatus::from_code(0), InterfaceOperStatus::Other(0));
    }

    #[test]
    fn physical_class_codes_decode() {
        assert_eq!(PhysicalClass::from_code(6), PhysicalClass::PowerSupply);
        assert_eq!(PhysicalClass::from_code(7), PhysicalClass::Fan);
        assert_eq!(PhysicalClass::from_code(99), PhysicalClass::Unrecognized(99));
    }

    #[test]
    fn device_class_from_sys_services() {
        assert_eq!(DeviceClass::from_sys_services(0x4e), DeviceClass::Router);
        assert_eq!(DeviceClass::from_sys_services(0x2), DeviceClass::Switch);
        assert_eq!(DeviceClass::from_sys_services(0x48), DeviceClass::Host);
        assert_eq!(DeviceClass::from_sys_services(0x1), DeviceClass::Unknown);
    }

    #[test]
    fn edge_key_is_order_independent() {
        let ab = TopologyEdge::new("10.0.0.1", "10.0.0.2", EdgeRelation::Layer3NextHop);
        let ba = TopologyEdge::new("10.0.0.2", "10.0.0.1", EdgeRelation::Layer3NextHop);
        assert_eq!(ab.key(), ba.key());
    }

    #[test]
    fn due_check_honours_interval() {
        let mut ep = DeviceEndpoint::new(
            Uuid::new_v4(),
            "192.0.2.10".parse().unwrap(),
            ProtocolVersion::V2c,
            Credential::Community {
                community: "public".into(),
            },
        );
        let now = Utc::now();
        assert!(ep.is_due(now), "never-polled endpoints are always due");

        ep.poll_interval_secs = 60;
        ep.last_poll_at = Some(now);
        assert!(!ep.is_due(now + chrono::Duration::seconds(30)));
        assert!(ep.is_due(now + chrono::Duration::seconds(60)));
    }

    #[test]
    fn severity_alert_cutoff_excludes_only_info() {
        assert!(Severity::Critical.alert_worthy());
        assert!(Severity::Major.alert_worthy());
        assert!(Severity::Minor.alert_worthy());
        assert!(Severity::Warning.alert_worthy());
        assert!(!Severity::Info.alert_worthy());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
        assert!(RunStatus::Complete.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
    }
}
