//! Datagram statistics profile poller.

use netwatch_core::models::{DeviceId, UdpProfile};
use netwatch_core::snmp::{oids, ManagementClient, SnmpValue, Target};
use netwatch_core::store::ProfileStore;
use netwatch_core::Result;
use tracing::debug;

const UDP_OIDS: [&str; 4] = [
    oids::UDP_IN_DATAGRAMS,
    oids::UDP_NO_PORTS,
    oids::UDP_IN_ERRORS,
    oids::UDP_OUT_DATAGRAMS,
];

/// Fetches the udp group scalars and overwrites the device's profile.
pub async fn poll(
    client: &dyn ManagementClient,
    store: &dyn ProfileStore,
    device_id: DeviceId,
    target: &Target,
) -> Result<()> {
    let values = client.get_multiple(target, &UDP_OIDS).await;
    if values.is_empty() {
        debug!(%device_id, "udp group unavailable");
        return Ok(());
    }
    let counter = |oid: &str| values.get(oid).and_then(SnmpValue::as_u64);
    let profile = UdpProfile {
        in_datagrams: counter(oids::UDP_IN_DATAGRAMS),
        out_datagrams: counter(oids::UDP_OUT_DATAGRAMS),
        in_errors: counter(oids::UDP_IN_ERRORS),
        no_ports: counter(oids::UDP_NO_PORTS),
    };
    store.save_udp_profile(device_id, profile).await
}
