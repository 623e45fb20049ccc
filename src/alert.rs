use serde::{Serialize, Deserialize};

use crate::config::MODULE_NAME;
use crate::report::Report;

/// Suppression window requested for queue-depth alerts
pub const LOCAL_OPS_ALERT_SUPPRESS_MS: u64 = 5 * 1000;

/// Alert body handed to the alert sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// Module raising the alert
    pub module: String,
    /// Human-readable description including observed and threshold values
    pub message: String,
}

impl AlertPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            module: MODULE_NAME.to_string(),
            message: message.into(),
        }
    }
}

/// Stable alert key scoped to this module and one metric
pub fn alert_key(metric: &str) -> String {
    format!("{}:{}", MODULE_NAME, metric)
}

/// Outbound alert delivery
///
/// Fire-and-forget. `suppress_ms` is part of the sink's contract: repeated
/// alerts with the same key inside that window are coalesced by the sink,
/// the monitor raises on every cycle the threshold is exceeded.
pub trait AlertSink: Send + Sync {
    fn raise_alert(&self, key: &str, payload: AlertPayload, suppress_ms: u64);
}

impl<F> AlertSink for F
where
    F: Fn(&str, AlertPayload, u64) + Send + Sync,
{
    fn raise_alert(&self, key: &str, payload: AlertPayload, suppress_ms: u64) {
        self(key, payload, suppress_ms)
    }
}

/// Cooldown subsystem view used for the `cooldownAlertSize` metric
pub trait CooldownRegistry: Send + Sync {
    /// Number of alerts currently held in cooldown
    fn size(&self) -> usize;
}

/// Threshold checks run against the store gatherer's results
///
/// The outstanding-event thresholds are currently disabled, so the default
/// policy is [`InertStoreAlerts`]. Integrators that want those alerts back
/// install their own policy on the store gatherer.
pub trait StoreAlertPolicy: Send + Sync {
    fn check(&self, results: &Report, sink: &dyn AlertSink);
}

/// Store alert policy that never raises
#[derive(Debug, Clone, Copy, Default)]
pub struct InertStoreAlerts;

impl StoreAlertPolicy for InertStoreAlerts {
    fn check(&self, _results: &Report, _sink: &dyn AlertSink) {
        tracing::trace!("store alert thresholds disabled");
    }
}
