//! Per-domain pollers. Each domain defines its own OID set and field
//! mapping and isolates its failures from the rest of the poll cycle.

pub mod icmp;
pub mod interfaces;
pub mod ip;
pub mod system;
pub mod udp;
pub mod units;

use tracing::warn;

/// Store column limit for text fields mirrored from agents.
const TEXT_LIMIT: usize = 255;

/// Clamps oversized agent text to the store's column limit. Truncation
/// is logged, never a failure.
fn clamp_text(field: &'static str, value: String) -> String {
    let length = value.chars().count();
    if length > TEXT_LIMIT {
        warn!(field, length, limit = TEXT_LIMIT, "truncating oversized text field");
        value.chars().take(TEXT_LIMIT).collect()
    } else {
        value
    }
}
