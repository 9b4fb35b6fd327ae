//! Shared building blocks for the NetWatch monitoring services: the data
//! model, the abstract store contracts with an in-memory implementation,
//! the SNMP client with its session registry, and telemetry bootstrap.

pub mod error;
pub mod models;
pub mod sink;
pub mod snmp;
pub mod store;
pub mod telemetry;

pub use error::{Error, Result};
