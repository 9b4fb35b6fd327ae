use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};
use snmp2::Value;

/// Owned, transport-independent view of an SNMP value.
///
/// The wire values borrow from the receive buffer, so everything the
/// rest of the system touches is copied out into this enum first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SnmpValue {
    Integer(i64),
    Counter32(u32),
    Unsigned32(u32),
    Counter64(u64),
    Timeticks(u32),
    OctetString(Vec<u8>),
    Oid(String),
    IpAddress(Ipv4Addr),
    Boolean(bool),
    Null,
}

impl SnmpValue {
    /// Decodes a wire value. The exception values (noSuchObject,
    /// noSuchInstance, endOfMibView) decode to `None`; unhandled
    /// constructed types collapse to `Null`.
    pub fn decode(value: &Value<'_>) -> Option<Self> {
        Some(match value {
            Value::Integer(i) => Self::Integer(*i),
            Value::Counter32(c) => Self::Counter32(*c),
            Value::Unsigned32(u) => Self::Unsigned32(*u),
            Value::Counter64(c) => Self::Counter64(*c),
            Value::Timeticks(t) => Self::Timeticks(*t),
            Value::OctetString(bytes) => Self::OctetString(bytes.to_vec()),
            Value::ObjectIdentifier(oid) => Self::Oid(oid.to_string()),
            Value::IpAddress(octets) => Self::IpAddress(Ipv4Addr::from(*octets)),
            Value::Boolean(b) => Self::Boolean(*b),
            Value::Null => Self::Null,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => return None,
            _ => Self::Null,
        })
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Counter32(c) => Some(i64::from(*c)),
            Self::Unsigned32(u) => Some(i64::from(*u)),
            Self::Timeticks(t) => Some(i64::from(*t)),
            Self::Counter64(c) => i64::try_from(*c).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(i) => u64::try_from(*i).ok(),
            Self::Counter32(c) => Some(u64::from(*c)),
            Self::Unsigned32(u) => Some(u64::from(*u)),
            Self::Timeticks(t) => Some(u64::from(*t)),
            Self::Counter64(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_u64().and_then(|v| u32::try_from(v).ok())
    }

    /// Text view of an octet-string or OID value. Trailing NULs that some
    /// agents pad fixed-width fields with are dropped.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::OctetString(bytes) => Some(
                String::from_utf8_lossy(bytes)
                    .trim_end_matches('\0')
                    .to_string(),
            ),
            Self::Oid(oid) => Some(oid.clone()),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<IpAddr> {
        match self {
            Self::IpAddress(ip) => Some(IpAddr::V4(*ip)),
            _ => None,
        }
    }

    /// Colon-separated hex rendering of a link-layer address.
    pub fn as_phys_address(&self) -> Option<String> {
        match self {
            Self::OctetString(bytes) if !bytes.is_empty() => Some(
                bytes
                    .iter()
                    .map(|b| format!("{b:02x}"))
                    .collect::<Vec<_>>()
                    .join(":"),
            ),
            _ => None,
        }
    }
}
