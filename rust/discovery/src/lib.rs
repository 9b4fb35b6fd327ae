//! Topology discovery: bounded-hop, concurrent exploration of the
//! management network combining a liveness sweep with SNMP detail and
//! neighbor probing.

pub mod engine;
pub mod neighbors;
pub mod probe;
pub mod spec;
pub mod sweep;
