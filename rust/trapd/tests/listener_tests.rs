//! Datagram decoding: both wire shapes, the shared-secret check, and
//! malformed input handling.

mod support;

use std::net::SocketAddr;

use netwatch_trapd::listener::decode_datagram;
use pretty_assertions::assert_eq;
use support::*;

fn source() -> SocketAddr {
    "192.0.2.9:29000".parse().unwrap()
}

#[test]
fn legacy_standard_trap_decodes() {
    let packet = v1_trap_packet(
        "public",
        &[1, 3, 6, 1, 4, 1, 9],
        [192, 0, 2, 9],
        2, // linkDown
        0,
        123_456,
        vec![varbind(&[1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 3], ber::int(3))],
    );

    let raw = decode_datagram(&packet, source(), "public").expect("expected a notification");
    assert_eq!(raw.trap_oid, "1.3.6.1.6.3.1.1.5.3");
    assert_eq!(raw.enterprise_oid.as_deref(), Some("1.3.6.1.4.1.9"));
    assert_eq!(raw.generic_code, Some(2));
    assert_eq!(raw.specific_code, Some(0));
    assert_eq!(raw.uptime_ticks, Some(123_456));
    assert_eq!(raw.source_addr, source().ip());
    assert_eq!(raw.source_port, 29000);
    assert_eq!(
        raw.fields.get("1.3.6.1.2.1.2.2.1.1.3").map(String::as_str),
        Some("3")
    );
}

#[test]
fn legacy_enterprise_trap_derives_identity_from_specific_code() {
    let packet = v1_trap_packet(
        "public",
        &[1, 3, 6, 1, 4, 1, 9],
        [192, 0, 2, 9],
        6, // enterpriseSpecific
        7,
        10,
        Vec::new(),
    );

    let raw = decode_datagram(&packet, source(), "public").expect("expected a notification");
    assert_eq!(raw.trap_oid, "1.3.6.1.4.1.9.0.7");
    assert_eq!(raw.generic_code, Some(6));
    assert_eq!(raw.specific_code, Some(7));
}

#[test]
fn modern_trap_decodes_field_map() {
    let packet = v2c_trap_packet(
        "public",
        vec![
            uptime_varbind(42),
            trap_oid_varbind(&[1, 3, 6, 1, 6, 3, 1, 1, 5, 1]),
            varbind(
                &[1, 3, 6, 1, 4, 1, 9, 2, 1, 3, 0],
                ber::octet_string(b"lab-router"),
            ),
        ],
    );

    let raw = decode_datagram(&packet, source(), "public").expect("expected a notification");
    assert_eq!(raw.trap_oid, "1.3.6.1.6.3.1.1.5.1");
    assert_eq!(raw.uptime_ticks, Some(42));
    assert_eq!(raw.generic_code, None);
    // The identity and uptime varbinds are lifted out of the field map.
    assert_eq!(raw.fields.len(), 1);
    assert_eq!(
        raw.fields.get("1.3.6.1.4.1.9.2.1.3.0").map(String::as_str),
        Some("lab-router")
    );
}

#[test]
fn community_mismatch_is_dropped_silently() {
    let packet = v2c_trap_packet(
        "guessed",
        vec![uptime_varbind(1), trap_oid_varbind(&[1, 3, 6, 1, 6, 3, 1, 1, 5, 1])],
    );
    assert!(decode_datagram(&packet, source(), "secret").is_none());
}

#[test]
fn modern_trap_without_identity_is_dropped() {
    let packet = v2c_trap_packet("public", vec![uptime_varbind(1)]);
    assert!(decode_datagram(&packet, source(), "public").is_none());
}

#[test]
fn malformed_datagrams_are_dropped() {
    assert!(decode_datagram(&[0xde, 0xad, 0xbe, 0xef], source(), "public").is_none());
    assert!(decode_datagram(&[], source(), "public").is_none());
}
