//! Well-known OIDs used by the pollers, the trap pipeline and discovery.

// system group (RFC 1213)
pub const SYS_DESCR: &str = "1.3.6.1.2.1.1.1.0";
pub const SYS_OBJECT_ID: &str = "1.3.6.1.2.1.1.2.0";
pub const SYS_UPTIME: &str = "1.3.6.1.2.1.1.3.0";
pub const SYS_CONTACT: &str = "1.3.6.1.2.1.1.4.0";
pub const SYS_NAME: &str = "1.3.6.1.2.1.1.5.0";
pub const SYS_LOCATION: &str = "1.3.6.1.2.1.1.6.0";
pub const SYS_SERVICES: &str = "1.3.6.1.2.1.1.7.0";

// interface table columns
pub const IF_INDEX: &str = "1.3.6.1.2.1.2.2.1.1";
pub const IF_DESCR: &str = "1.3.6.1.2.1.2.2.1.2";
pub const IF_TYPE: &str = "1.3.6.1.2.1.2.2.1.3";
pub const IF_MTU: &str = "1.3.6.1.2.1.2.2.1.4";
pub const IF_SPEED: &str = "1.3.6.1.2.1.2.2.1.5";
pub const IF_PHYS_ADDRESS: &str = "1.3.6.1.2.1.2.2.1.6";
pub const IF_ADMIN_STATUS: &str = "1.3.6.1.2.1.2.2.1.7";
pub const IF_OPER_STATUS: &str = "1.3.6.1.2.1.2.2.1.8";

// physical entity table columns (ENTITY-MIB)
pub const ENT_PHYSICAL_DESCR: &str = "1.3.6.1.2.1.47.1.1.1.1.2";
pub const ENT_PHYSICAL_CLASS: &str = "1.3.6.1.2.1.47.1.1.1.1.5";
pub const ENT_PHYSICAL_NAME: &str = "1.3.6.1.2.1.47.1.1.1.1.7";
pub const ENT_PHYSICAL_HARDWARE_REV: &str = "1.3.6.1.2.1.47.1.1.1.1.8";
pub const ENT_PHYSICAL_FIRMWARE_REV: &str = "1.3.6.1.2.1.47.1.1.1.1.9";
pub const ENT_PHYSICAL_SERIAL_NUM: &str = "1.3.6.1.2.1.47.1.1.1.1.11";
pub const ENT_PHYSICAL_MFG_NAME: &str = "1.3.6.1.2.1.47.1.1.1.1.12";

// ip group scalars
pub const IP_FORWARDING: &str = "1.3.6.1.2.1.4.1.0";
pub const IP_DEFAULT_TTL: &str = "1.3.6.1.2.1.4.2.0";
pub const IP_IN_RECEIVES: &str = "1.3.6.1.2.1.4.3.0";
pub const IP_IN_DISCARDS: &str = "1.3.6.1.2.1.4.8.0";
pub const IP_IN_DELIVERS: &str = "1.3.6.1.2.1.4.9.0";
pub const IP_OUT_REQUESTS: &str = "1.3.6.1.2.1.4.10.0";
pub const IP_OUT_DISCARDS: &str = "1.3.6.1.2.1.4.11.0";

// icmp group scalars
pub const ICMP_IN_MSGS: &str = "1.3.6.1.2.1.5.1.0";
pub const ICMP_IN_ERRORS: &str = "1.3.6.1.2.1.5.2.0";
pub const ICMP_IN_DEST_UNREACHS: &str = "1.3.6.1.2.1.5.3.0";
pub const ICMP_IN_ECHOS: &str = "1.3.6.1.2.1.5.8.0";
pub const ICMP_IN_ECHO_REPS: &str = "1.3.6.1.2.1.5.9.0";
pub const ICMP_OUT_MSGS: &str = "1.3.6.1.2.1.5.14.0";
pub const ICMP_OUT_ERRORS: &str = "1.3.6.1.2.1.5.15.0";
pub const ICMP_OUT_DEST_UNREACHS: &str = "1.3.6.1.2.1.5.16.0";
pub const ICMP_OUT_ECHOS: &str = "1.3.6.1.2.1.5.21.0";
pub const ICMP_OUT_ECHO_REPS: &str = "1.3.6.1.2.1.5.22.0";

// udp group scalars
pub const UDP_IN_DATAGRAMS: &str = "1.3.6.1.2.1.7.1.0";
pub const UDP_NO_PORTS: &str = "1.3.6.1.2.1.7.2.0";
pub const UDP_IN_ERRORS: &str = "1.3.6.1.2.1.7.3.0";
pub const UDP_OUT_DATAGRAMS: &str = "1.3.6.1.2.1.7.4.0";

// notification plumbing (SNMPv2 trap conventions)
pub const SNMP_TRAP_OID: &str = "1.3.6.1.6.3.1.1.4.1.0";
pub const SNMP_TRAP_ENTERPRISE: &str = "1.3.6.1.6.3.1.1.4.3.0";
pub const STANDARD_TRAP_PREFIX: &str = "1.3.6.1.6.3.1.1.5";

// neighbor tables used by discovery
pub const IP_NET_TO_MEDIA_PHYS_ADDRESS: &str = "1.3.6.1.2.1.4.22.1.2";
pub const IP_NET_TO_MEDIA_NET_ADDRESS: &str = "1.3.6.1.2.1.4.22.1.3";
pub const IP_ROUTE_NEXT_HOP: &str = "1.3.6.1.2.1.4.21.1.7";
pub const LLDP_REM_MAN_ADDR_IF_SUBTYPE: &str = "1.0.8802.1.1.2.1.4.2.1.3";

/// Strips `root` plus the separating dot from `oid`.
pub fn strip_root<'a>(root: &str, oid: &'a str) -> Option<&'a str> {
    oid.strip_prefix(root)?.strip_prefix('.')
}

/// The single trailing index of a column instance, e.g. ifDescr.3.
pub fn index_after(root: &str, oid: &str) -> Option<u32> {
    strip_root(root, oid)?.parse().ok()
}

/// The numeric components following a column root, for tables with
/// composite indexes.
pub fn suffix_components(root: &str, oid: &str) -> Option<Vec<u64>> {
    strip_root(root, oid)?
        .split('.')
        .map(|part| part.parse().ok())
        .collect()
}
