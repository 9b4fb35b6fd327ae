//! System-group poller.

use std::collections::HashMap;

use chrono::Utc;
use netwatch_core::models::{DeviceId, SystemInfo};
use netwatch_core::snmp::{oids, ManagementClient, SnmpValue, Target};
use netwatch_core::store::DeviceStore;
use netwatch_core::Result;
use tracing::debug;

use super::clamp_text;

const SYSTEM_OIDS: [&str; 7] = [
    oids::SYS_DESCR,
    oids::SYS_OBJECT_ID,
    oids::SYS_UPTIME,
    oids::SYS_CONTACT,
    oids::SYS_NAME,
    oids::SYS_LOCATION,
    oids::SYS_SERVICES,
];

/// Fetches the system group in one batch and stores the snapshot.
pub async fn poll(
    client: &dyn ManagementClient,
    store: &dyn DeviceStore,
    device_id: DeviceId,
    target: &Target,
) -> Result<()> {
    let values = client.get_multiple(target, &SYSTEM_OIDS).await;
    if values.is_empty() {
        debug!(%device_id, "system group unavailable");
        return Ok(());
    }
    store
        .save_system_info(device_id, map_system_info(&values), Utc::now())
        .await
}

fn map_system_info(values: &HashMap<String, SnmpValue>) -> SystemInfo {
    let text = |oid: &str, field: &'static str| {
        values
            .get(oid)
            .and_then(SnmpValue::as_text)
            .map(|value| clamp_text(field, value))
    };
    SystemInfo {
        descr: text(oids::SYS_DESCR, "sys_descr"),
        object_id: values.get(oids::SYS_OBJECT_ID).and_then(SnmpValue::as_text),
        uptime_ticks: values.get(oids::SYS_UPTIME).and_then(SnmpValue::as_u32),
        contact: text(oids::SYS_CONTACT, "sys_contact"),
        name: text(oids::SYS_NAME, "sys_name"),
        location: text(oids::SYS_LOCATION, "sys_location"),
        services: values.get(oids::SYS_SERVICES).and_then(SnmpValue::as_i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_maps_typed_fields() {
        let mut values = HashMap::new();
        values.insert(
            oids::SYS_DESCR.to_string(),
            SnmpValue::OctetString(b"NetOS 4.2".to_vec()),
        );
        values.insert(oids::SYS_UPTIME.to_string(), SnmpValue::Timeticks(123_456));
        values.insert(oids::SYS_SERVICES.to_string(), SnmpValue::Integer(78));

        let info = map_system_info(&values);
        assert_eq!(info.descr.as_deref(), Some("NetOS 4.2"));
        assert_eq!(info.uptime_ticks, Some(123_456));
        assert_eq!(info.services, Some(78));
        assert_eq!(info.contact, None);
    }
}
