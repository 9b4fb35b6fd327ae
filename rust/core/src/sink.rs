//! Outbound sinks: discovery progress and alert notifications.
//!
//! Delivery is at-most-once and best-effort. The push transport that
//! fans these out to clients lives outside the core; the default
//! implementations only log.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::models::Alert;

/// Progress snapshot published while a discovery run executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub run_id: Uuid,
    pub percent: u8,
    pub stage: String,
    pub current_target: Option<String>,
    pub nodes_found: usize,
    pub edges_found: usize,
}

/// Receives progress updates keyed by discovery run id.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, update: ProgressUpdate);
}

/// Default sink: structured log lines only.
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn publish(&self, update: ProgressUpdate) {
        info!(
            run_id = %update.run_id,
            percent = update.percent,
            stage = %update.stage,
            nodes = update.nodes_found,
            edges = update.edges_found,
            "discovery progress"
        );
    }
}

/// Dispatches a freshly raised alert towards the owning device's
/// subscribers.
pub trait AlertNotifier: Send + Sync {
    fn notify(&self, alert: &Alert);
}

/// Default notifier: structured log lines only.
pub struct LogAlertNotifier;

impl AlertNotifier for LogAlertNotifier {
    fn notify(&self, alert: &Alert) {
        info!(
            alert_id = %alert.id,
            severity = %alert.severity,
            message = %alert.message,
            "alert raised"
        );
    }
}
