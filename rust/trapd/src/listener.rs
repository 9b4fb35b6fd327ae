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

//! Datagram decoding: both notification wire shapes are normalized into
//! one `RawNotification` for the processor.

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

use netwatch_core::snmp::{oids, SnmpValue};
use serde::{Deserialize, Serialize};
use snmp2::{MessageType, Pdu};
use tracing::{debug, warn};

/// One decoded notification, independent of the wire shape it arrived
/// in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNotification {
    pub source_addr: IpAddr,
    pub source_port: u16,
    pub community: String,
    /// Trap identity. For the legacy shape this is the standard trap
    /// identifier derived from the generic code, or
    /// `<enterprise>.0.<specific>` for enterprise-specific traps.
    pub trap_oid: String,
    pub enterprise_oid: Option<String>,
    pub generic_code: Option<i64>,
    pub specific_code: Option<i64>,
    pub uptime_ticks: Option<u32>,
    pub fields: BTreeMap<String, String>,
}

/// Decodes one inbound datagram. Returns `None` for anything that must
/// be dropped: undecodable bytes, a community mismatch (silent), or a
/// shape that carries no notification identity.
pub fn decode_datagram(
    data: &[u8],
    source: SocketAddr,
    expected_community: &str,
) -> Option<RawNotification> {
    let pdu = match Pdu::from_bytes(data) {
        Ok(pdu) => pdu,
        Err(e) => {
            warn!(%source, error = %e, "failed to parse notification datagram");
            return None;
        }
    };

    let community = String::from_utf8_lossy(pdu.community).into_owned();
    if community != expected_community {
        // Wrong shared secret: dropped without a response on purpose.
        debug!(%source, "community mismatch, dropping notification");
        return None;
    }

    match pdu.message_type {
        MessageType::TrapV1 => normalize_legacy(&pdu, source, community),
        MessageType::Trap | MessageType::InformRequest => normalize_modern(&pdu, source, community),
        other => {
            warn!(%source, message_type = ?other, "unexpected message type on notification port");
            None
        }
    }
}

/// Legacy shape: enterprise oid, agent address, generic and specific
/// codes, uptime, then varbinds.
fn normalize_legacy(
    pdu: &Pdu<'_>,
    source: SocketAddr,
    community: String,
) -> Option<RawNotification> {
    let Some(info) = pdu.v1_trap_info.as_ref() else {
        warn!(%source, "legacy notification without trap header");
        return None;
    };

    let enterprise = info.enterprise.to_string();
    // Generic codes 0..=5 are the standard traps; 6 means the identity
    // lives in <enterprise>.0.<specific>.
    let trap_oid = if (0..=5).contains(&info.generic_trap) {
        format!("{}.{}", oids::STANDARD_TRAP_PREFIX, info.generic_trap + 1)
    } else {
        format!("{}.0.{}", enterprise, info.specific_trap)
    };

    Some(RawNotification {
        source_addr: source.ip(),
        source_port: source.port(),
        community,
        trap_oid,
        enterprise_oid: Some(enterprise),
        generic_code: Some(info.generic_trap),
        specific_code: Some(info.specific_trap),
        uptime_ticks: Some(info.timestamp),
        fields: collect_fields(pdu),
    })
}

/// Modern shape: a field map where one well-known field carries the
/// notification identity and another the uptime.
fn normalize_modern(
    pdu: &Pdu<'_>,
    source: SocketAddr,
    community: String,
) -> Option<RawNotification> {
    let mut trap_oid = None;
    let mut enterprise_oid = None;
    let mut uptime_ticks = None;
    let mut fields = BTreeMap::new();

    for (oid, value) in pdu.varbinds.clone() {
        let name = oid.to_string();
        let Some(value) = SnmpValue::decode(&value) else {
            continue;
        };
        match name.as_str() {
            oids::SNMP_TRAP_OID => trap_oid = value.as_text(),
            oids::SYS_UPTIME => uptime_ticks = value.as_u32(),
            oids::SNMP_TRAP_ENTERPRISE => enterprise_oid = value.as_text(),
            _ => {
                fields.insert(name, render_value(&value));
            }
        }
    }

    let Some(trap_oid) = trap_oid else {
        warn!(%source, "notification without a notification-type field");
        return None;
    };

    Some(RawNotification {
        source_addr: source.ip(),
        source_port: source.port(),
        community,
        trap_oid,
        enterprise_oid,
        generic_code: None,
        specific_code: None,
        uptime_ticks,
        fields,
    })
}

fn collect_fields(pdu: &Pdu<'_>) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for (oid, value) in pdu.varbinds.clone() {
        if let Some(value) = SnmpValue::decode(&value) {
            fields.insert(oid.to_string(), render_value(&value));
        }
    }
    fields
}

fn render_value(value: &SnmpValue) -> String {
    match value {
        SnmpValue::Integer(i) => i.to_string(),
        SnmpValue::Counter32(c) => c.to_string(),
        SnmpValue::Unsigned32(u) => u.to_string(),
        SnmpValue::Counter64(c) => c.to_string(),
        SnmpValue::Timeticks(t) => t.to_string(),
        SnmpValue::OctetString(_) => value.as_text().unwrap_or_default(),
        SnmpValue::Oid(oid) => oid.clone(),
        SnmpValue::IpAddress(ip) => ip.to_string(),
        SnmpValue::Boolean(b) => b.to_string(),
        SnmpValue::Null => String::new(),
    }
}
