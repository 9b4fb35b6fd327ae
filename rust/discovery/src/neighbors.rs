//! Neighbor harvesting from the standard layer-3 tables and the LLDP
//! remote management address table.

use std::net::{IpAddr, Ipv4Addr};

use netwatch_core::models::EdgeRelation;
use netwatch_core::snmp::{oids, ManagementClient, SnmpValue, Target};

/// One discovered adjacency candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub address: IpAddr,
    pub relation: EdgeRelation,
}

/// ARP entries and route next-hops reported by the agent.
pub async fn l3_neighbors(
    client: &dyn ManagementClient,
    target: &Target,
    max_entries: usize,
) -> Vec<Neighbor> {
    let mut neighbors = Vec::new();
    for (_, value) in client
        .walk(target, oids::IP_NET_TO_MEDIA_NET_ADDRESS, max_entries)
        .await
    {
        if let Some(address) = value.as_ip() {
            push_neighbor(&mut neighbors, target, address, EdgeRelation::Arp);
        }
    }
    for (_, value) in client.walk(target, oids::IP_ROUTE_NEXT_HOP, max_entries).await {
        if let Some(address) = value.as_ip() {
            push_neighbor(&mut neighbors, target, address, EdgeRelation::Layer3NextHop);
        }
    }
    neighbors
}

/// LLDP remote management addresses. The address is part of the table
/// index rather than the value.
pub async fn l2_neighbors(
    client: &dyn ManagementClient,
    target: &Target,
    max_entries: usize,
) -> Vec<Neighbor> {
    let mut neighbors = Vec::new();
    for (oid, _) in client
        .walk(target, oids::LLDP_REM_MAN_ADDR_IF_SUBTYPE, max_entries)
        .await
    {
        let Some(suffix) = oids::suffix_components(oids::LLDP_REM_MAN_ADDR_IF_SUBTYPE, &oid) else {
            continue;
        };
        if let Some(address) = parse_lldp_mgmt_addr(&suffix) {
            push_neighbor(&mut neighbors, target, address, EdgeRelation::Layer2);
        }
    }
    neighbors
}

/// Index layout: timeMark, localPortNum, remIndex, addrSubtype, then
/// the length-prefixed address octets. Subtype 1 is IPv4.
fn parse_lldp_mgmt_addr(suffix: &[u64]) -> Option<IpAddr> {
    if suffix.len() < 5 {
        return None;
    }
    let subtype = suffix[3];
    let len = suffix[4] as usize;
    let addr = &suffix[5..];
    if subtype != 1 || len != 4 || addr.len() != 4 {
        return None;
    }
    let octets: Vec<u8> = addr
        .iter()
        .map(|component| u8::try_from(*component).ok())
        .collect::<Option<_>>()?;
    Some(IpAddr::V4(Ipv4Addr::new(
        octets[0], octets[1], octets[2], octets[3],
    )))
}

fn push_neighbor(
    neighbors: &mut Vec<Neighbor>,
    target: &Target,
    address: IpAddr,
    relation: EdgeRelation,
) {
    // The device's own address, unspecified next-hops for connected
    // routes, and loopbacks are not adjacencies.
    if address == target.address || address.is_unspecified() || address.is_loopback() {
        return;
    }
    let neighbor = Neighbor { address, relation };
    if !neighbors.contains(&neighbor) {
        neighbors.push(neighbor);
    }
}
