//! # Continuity Stats Monitor
//!
//! Gathers operational statistics of a ledger node running continuity
//! consensus, once per report cycle, into a [`Report`] consumed by the stats
//! storage. On cooldown-check cycles the same gathering can raise alerts
//! through an [`AlertSink`].
//!
//! ```rust,ignore
//! use continuity_stats_monitor::{MonitorConfig, Report, StatsMonitor};
//!
//! let monitor = StatsMonitor::new(MonitorConfig::from_env()?, cache_client)?;
//! let mut monitors = Report::new();
//! monitor.report_consensus(&ledger_node, &mut monitors).await?;
//! ```

pub mod alert;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod node;
pub mod report;

// Re-exports
pub use alert::{AlertPayload, AlertSink, CooldownRegistry, InertStoreAlerts, StoreAlertPolicy};
pub use config::{MetricCategory, MonitorConfig, MODULE_NAME};
pub use crate::metrics::{CacheMetrics, MetricsCollector, MetricsUtils, StoreMetrics};
pub use monitor::StatsMonitor;
pub use node::LedgerNode;
pub use report::Report;

// Core types
pub type Result<T> = std::result::Result<T, MonitorError>;
pub use error::MonitorError;

pub mod error;
