//! Test harness: a minimal BER encoder for crafting notification
//! datagrams, plus a collecting alert notifier.

// Not every test binary uses every helper.
#![allow(dead_code)]

use netwatch_core::models::Alert;
use netwatch_core::sink::AlertNotifier;
use parking_lot::Mutex;

/// BER/DER primitives, enough to assemble trap messages byte for byte.
pub mod ber {
    pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        let len = content.len();
        if len < 128 {
            out.push(len as u8);
        } else {
            let len_bytes: Vec<u8> = len
                .to_be_bytes()
                .iter()
                .copied()
                .skip_while(|b| *b == 0)
                .collect();
            out.push(0x80 | len_bytes.len() as u8);
            out.extend(len_bytes);
        }
        out.extend_from_slice(content);
        out
    }

    pub fn int(value: i64) -> Vec<u8> {
        let mut bytes = value.to_be_bytes().to_vec();
        while bytes.len() > 1
            && ((bytes[0] == 0x00 && bytes[1] & 0x80 == 0)
                || (bytes[0] == 0xff && bytes[1] & 0x80 != 0))
        {
            bytes.remove(0);
        }
        tlv(0x02, &bytes)
    }

    pub fn octet_string(bytes: &[u8]) -> Vec<u8> {
        tlv(0x04, bytes)
    }

    fn unsigned_bytes(value: u64) -> Vec<u8> {
        let mut bytes: Vec<u8> = value
            .to_be_bytes()
            .iter()
            .copied()
            .skip_while(|b| *b == 0)
            .collect();
        if bytes.is_empty() {
            bytes.push(0);
        }
        if bytes[0] & 0x80 != 0 {
            bytes.insert(0, 0);
        }
        bytes
    }

    pub fn timeticks(value: u32) -> Vec<u8> {
        tlv(0x43, &unsigned_bytes(u64::from(value)))
    }

    fn encode_subid(mut value: u64) -> Vec<u8> {
        let mut out = vec![(value & 0x7f) as u8];
        value >>= 7;
        while value > 0 {
            out.push((value & 0x7f) as u8 | 0x80);
            value >>= 7;
        }
        out.reverse();
        out
    }

    pub fn oid(components: &[u64]) -> Vec<u8> {
        assert!(components.len() >= 2, "an OID needs at least two arcs");
        let mut content = encode_subid(components[0] * 40 + components[1]);
        for component in &components[2..] {
            content.extend(encode_subid(*component));
        }
        tlv(0x06, &content)
    }

    pub fn ip_address(octets: [u8; 4]) -> Vec<u8> {
        tlv(0x40, &octets)
    }

    pub fn seq_of(children: Vec<Vec<u8>>) -> Vec<u8> {
        tlv(0x30, &children.concat())
    }
}

pub fn varbind(oid_components: &[u64], value: Vec<u8>) -> Vec<u8> {
    ber::tlv(0x30, &[ber::oid(oid_components), value].concat())
}

pub fn uptime_varbind(ticks: u32) -> Vec<u8> {
    varbind(&[1, 3, 6, 1, 2, 1, 1, 3, 0], ber::timeticks(ticks))
}

pub fn trap_oid_varbind(trap_oid: &[u64]) -> Vec<u8> {
    varbind(&[1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0], ber::oid(trap_oid))
}

/// Legacy shape: version 0, community, then the trap header and
/// varbinds inside a context tag 4 PDU.
pub fn v1_trap_packet(
    community: &str,
    enterprise: &[u64],
    agent: [u8; 4],
    generic: i64,
    specific: i64,
    uptime: u32,
    varbinds: Vec<Vec<u8>>,
) -> Vec<u8> {
    let trap_content = [
        ber::oid(enterprise),
        ber::ip_address(agent),
        ber::int(generic),
        ber::int(specific),
        ber::timeticks(uptime),
        ber::seq_of(varbinds),
    ]
    .concat();
    let pdu = ber::tlv(0xa4, &trap_content);
    ber::tlv(
        0x30,
        &[ber::int(0), ber::octet_string(community.as_bytes()), pdu].concat(),
    )
}

/// Modern shape: version 1, community, then request id, error fields
/// and the varbind list inside a context tag 7 PDU.
pub fn v2c_trap_packet(community: &str, varbinds: Vec<Vec<u8>>) -> Vec<u8> {
    let pdu_content = [ber::int(1), ber::int(0), ber::int(0), ber::seq_of(varbinds)].concat();
    let pdu = ber::tlv(0xa7, &pdu_content);
    ber::tlv(
        0x30,
        &[ber::int(1), ber::octet_string(community.as_bytes()), pdu].concat(),
    )
}

/// Notifier that records every alert it is handed.
#[derive(Default)]
pub struct CollectingNotifier {
    pub alerts: Mutex<Vec<Alert>>,
}

impl AlertNotifier for CollectingNotifier {
    fn notify(&self, alert: &Alert) {
        self.alerts.lock().push(alert.clone());
    }
}
