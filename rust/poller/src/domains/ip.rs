//! Network-layer statistics profile poller.

use netwatch_core::models::{DeviceId, IpProfile};
use netwatch_core::snmp::{oids, ManagementClient, SnmpValue, Target};
use netwatch_core::store::ProfileStore;
use netwatch_core::Result;
use tracing::debug;

const IP_OIDS: [&str; 7] = [
    oids::IP_FORWARDING,
    oids::IP_DEFAULT_TTL,
    oids::IP_IN_RECEIVES,
    oids::IP_IN_DISCARDS,
    oids::IP_IN_DELIVERS,
    oids::IP_OUT_REQUESTS,
    oids::IP_OUT_DISCARDS,
];

/// Fetches the ip group scalars and overwrites the device's profile.
pub async fn poll(
    client: &dyn ManagementClient,
    store: &dyn ProfileStore,
    device_id: DeviceId,
    target: &Target,
) -> Result<()> {
    let values = client.get_multiple(target, &IP_OIDS).await;
    if values.is_empty() {
        debug!(%device_id, "ip group unavailable");
        return Ok(());
    }
    let profile = IpProfile {
        // ipForwarding: 1 = forwarding, 2 = not-forwarding
        forwarding: values
            .get(oids::IP_FORWARDING)
            .and_then(SnmpValue::as_i64)
            .map(|code| code == 1),
        default_ttl: values.get(oids::IP_DEFAULT_TTL).and_then(SnmpValue::as_i64),
        in_receives: values.get(oids::IP_IN_RECEIVES).and_then(SnmpValue::as_u64),
        in_delivers: values.get(oids::IP_IN_DELIVERS).and_then(SnmpValue::as_u64),
        out_requests: values.get(oids::IP_OUT_REQUESTS).and_then(SnmpValue::as_u64),
        in_discards: values.get(oids::IP_IN_DISCARDS).and_then(SnmpValue::as_u64),
        out_discards: values.get(oids::IP_OUT_DISCARDS).and_then(SnmpValue::as_u64),
    };
    store.save_ip_profile(device_id, profile).await
}
