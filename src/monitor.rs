//! # Report Entry Point
//!
//! [`StatsMonitor`] is invoked by the node's scheduler on two occasions:
//!
//! 1. **Consensus stats report**: [`StatsMonitor::report_consensus`] fills the
//!    `continuity` section of the node's monitor report.
//! 2. **Cooldown check**: [`StatsMonitor::cooldown_check`] gathers the same
//!    metrics into a scratch report and lets the gatherers raise alerts.
//!
//! Both go through [`StatsMonitor::on_report`], which runs every enabled
//! metric category concurrently and only returns once all of them finished.
//! Each category writes into its own partial report; the partials are merged
//! into the caller's report only when every category succeeded.

use futures::future::try_join_all;
use metrics::gauge;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::alert::{AlertSink, InertStoreAlerts, StoreAlertPolicy};
use crate::config::{MetricCategory, MonitorConfig};
use crate::metrics::{CacheMetrics, MetricsCollector, StoreMetrics};
use crate::node::{CacheClient, Clock, LedgerNode, SystemClock};
use crate::report::{keys, Report};
use crate::Result;

/// Continuity stats monitor
pub struct StatsMonitor {
    config: MonitorConfig,
    cache: Arc<dyn CacheClient>,
    clock: Arc<dyn Clock>,
    store_alerts: Arc<dyn StoreAlertPolicy>,
    collectors: Vec<Box<dyn MetricsCollector>>,
}

impl StatsMonitor {
    /// Create a monitor reading the consensus cache through `cache`
    pub fn new(config: MonitorConfig, cache: Arc<dyn CacheClient>) -> Result<Self> {
        config.validate()?;
        let mut monitor = Self {
            config,
            cache,
            clock: Arc::new(SystemClock),
            store_alerts: Arc::new(InertStoreAlerts),
            collectors: Vec::new(),
        };
        monitor.build_collectors();
        Ok(monitor)
    }

    /// Replace the clock placing the operation-count window
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.build_collectors();
        self
    }

    /// Install threshold checks for the store metrics
    pub fn with_store_alert_policy(mut self, policy: Arc<dyn StoreAlertPolicy>) -> Self {
        self.store_alerts = policy;
        self.build_collectors();
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn build_collectors(&mut self) {
        self.collectors = self
            .config
            .enabled_categories()
            .into_iter()
            .map(|category| -> Box<dyn MetricsCollector> {
                match category {
                    MetricCategory::Cache => Box::new(
                        CacheMetrics::new(&self.config, self.cache.clone())
                            .with_clock(self.clock.clone()),
                    ),
                    MetricCategory::Store => Box::new(
                        StoreMetrics::new().with_alert_policy(self.store_alerts.clone()),
                    ),
                }
            })
            .collect();
    }

    /// Gather every enabled metric category of `node` into `report`
    ///
    /// Fails as soon as one category fails; `report` is then left untouched.
    pub async fn on_report(
        &self,
        node: &LedgerNode,
        report: &mut Report,
        alert: Option<&dyn AlertSink>,
    ) -> Result<()> {
        let started = Instant::now();
        let gatherers = self.collectors.iter().map(|collector| async move {
            let category = collector.category();
            let mut partial = Report::new();
            match collector.collect(node, &mut partial, alert).await {
                Ok(()) => Ok(partial),
                Err(e) => {
                    warn!(
                        ledger_node = %node.id,
                        category = %category,
                        error_kind = e.category(),
                        error = %e,
                        "metric category failed"
                    );
                    Err(e)
                }
            }
        });
        let partials = try_join_all(gatherers).await?;

        for partial in partials {
            report.merge(partial);
        }
        publish_gauges(&node.id, report);

        debug!(
            ledger_node = %node.id,
            categories = self.collectors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "report cycle complete"
        );
        Ok(())
    }

    /// Fill the `continuity` section of a node's monitor report
    pub async fn report_consensus(&self, node: &LedgerNode, monitors: &mut Report) -> Result<()> {
        let mut continuity = Report::new();
        self.on_report(node, &mut continuity, None).await?;
        monitors.set(keys::CONTINUITY, continuity.into_value());
        Ok(())
    }

    /// Run the cooldown checks; the gathered values are returned and not stored
    pub async fn cooldown_check(&self, node: &LedgerNode, sink: &dyn AlertSink) -> Result<Report> {
        let mut continuity = Report::new();
        self.on_report(node, &mut continuity, Some(sink)).await?;
        Ok(continuity)
    }
}

/// Publish numeric report values as `continuity.<key>` gauges
fn publish_gauges(ledger_node_id: &str, report: &Report) {
    for (key, value) in report.iter() {
        if let Some(n) = value.as_f64() {
            gauge!(
                format!("continuity.{}", key),
                n,
                "ledger_node" => ledger_node_id.to_string()
            );
        }
    }
}
