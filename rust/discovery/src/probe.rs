//! Per-address device detail probe.

use netwatch_core::models::{DeviceClass, TopologyNode};
use netwatch_core::snmp::{oids, ManagementClient, SnmpValue, Target};

const DETAIL_OIDS: [&str; 4] = [
    oids::SYS_DESCR,
    oids::SYS_OBJECT_ID,
    oids::SYS_NAME,
    oids::SYS_SERVICES,
];

/// Probes one address for device details. An address that answers
/// nothing degrades to a minimal reachable node instead of failing its
/// batch.
pub async fn probe_device(client: &dyn ManagementClient, target: &Target, hop: u32) -> TopologyNode {
    let values = client.get_multiple(target, &DETAIL_OIDS).await;
    if values.is_empty() {
        return TopologyNode::minimal(target.address, hop);
    }

    let class = values
        .get(oids::SYS_SERVICES)
        .and_then(SnmpValue::as_i64)
        .map(DeviceClass::from_sys_services)
        .unwrap_or(DeviceClass::Unknown);

    TopologyNode {
        id: TopologyNode::identity(Some(target.address), None),
        address: Some(target.address),
        mac: None,
        hostname: values.get(oids::SYS_NAME).and_then(SnmpValue::as_text),
        sys_descr: values.get(oids::SYS_DESCR).and_then(SnmpValue::as_text),
        sys_object_id: values.get(oids::SYS_OBJECT_ID).and_then(SnmpValue::as_text),
        class,
        reachable: true,
        hop,
    }
}
