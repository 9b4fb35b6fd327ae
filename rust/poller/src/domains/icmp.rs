//! Control-message statistics profile poller.

use netwatch_core::models::{DeviceId, IcmpProfile};
use netwatch_core::snmp::{oids, ManagementClient, SnmpValue, Target};
use netwatch_core::store::ProfileStore;
use netwatch_core::Result;
use tracing::debug;

const ICMP_OIDS: [&str; 10] = [
    oids::ICMP_IN_MSGS,
    oids::ICMP_IN_ERRORS,
    oids::ICMP_IN_DEST_UNREACHS,
    oids::ICMP_IN_ECHOS,
    oids::ICMP_IN_ECHO_REPS,
    oids::ICMP_OUT_MSGS,
    oids::ICMP_OUT_ERRORS,
    oids::ICMP_OUT_DEST_UNREACHS,
    oids::ICMP_OUT_ECHOS,
    oids::ICMP_OUT_ECHO_REPS,
];

/// Fetches the icmp group scalars and overwrites the device's profile.
pub async fn poll(
    client: &dyn ManagementClient,
    store: &dyn ProfileStore,
    device_id: DeviceId,
    target: &Target,
) -> Result<()> {
    let values = client.get_multiple(target, &ICMP_OIDS).await;
    if values.is_empty() {
        debug!(%device_id, "icmp group unavailable");
        return Ok(());
    }
    let counter = |oid: &str| values.get(oid).and_then(SnmpValue::as_u64);
    let profile = IcmpProfile {
        in_msgs: counter(oids::ICMP_IN_MSGS),
        in_errors: counter(oids::ICMP_IN_ERRORS),
        in_dest_unreachs: counter(oids::ICMP_IN_DEST_UNREACHS),
        in_echos: counter(oids::ICMP_IN_ECHOS),
        in_echo_reps: counter(oids::ICMP_IN_ECHO_REPS),
        out_msgs: counter(oids::ICMP_OUT_MSGS),
        out_errors: counter(oids::ICMP_OUT_ERRORS),
        out_dest_unreachs: counter(oids::ICMP_OUT_DEST_UNREACHS),
        out_echos: counter(oids::ICMP_OUT_ECHOS),
        out_echo_reps: counter(oids::ICMP_OUT_ECHO_REPS),
    };
    store.save_icmp_profile(device_id, profile).await
}
