use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::alert::{AlertSink, InertStoreAlerts, StoreAlertPolicy};
use crate::config::MetricCategory;
use crate::node::{EventFilter, LedgerNode};
use crate::report::{keys, Report};
use crate::{MonitorError, Result};

use super::fetcher::{resolve_all, Pending, PendingSet};
use super::MetricsCollector;

/// Metrics read from the node's durable event and block storage
pub struct StoreMetrics {
    alert_policy: Arc<dyn StoreAlertPolicy>,
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self {
            alert_policy: Arc::new(InertStoreAlerts),
        }
    }

    /// Install the threshold checks run on cooldown-check cycles
    pub fn with_alert_policy(mut self, policy: Arc<dyn StoreAlertPolicy>) -> Self {
        self.alert_policy = policy;
        self
    }

    /// Read the storage metrics of `node` into `report`
    pub async fn gather(
        &self,
        node: &LedgerNode,
        report: &mut Report,
        alert: Option<&dyn AlertSink>,
    ) -> Result<()> {
        let started = Instant::now();
        let creator = node
            .identity
            .voter_id(&node.id)
            .await
            .map_err(|source| MonitorError::Identity {
                ledger_node_id: node.id.clone(),
                source,
            })?;

        let mut lookups = PendingSet::new();
        lookups.insert(
            keys::AVG_CONSENSUS_TIME,
            Pending::projected(
                async {
                    node.consensus_timing
                        .avg_consensus_time(&creator)
                        .await
                        .map_err(MonitorError::Storage)
                },
                [keys::AVG_CONSENSUS_TIME],
            ),
        );
        lookups.insert(
            keys::EVENTS_OUTSTANDING,
            Pending::direct(count_events(node, EventFilter::outstanding())),
        );
        lookups.insert(
            keys::LATEST_SUMMARY,
            Pending::direct(async {
                node.blocks.latest_summary().await.map_err(MonitorError::Storage)
            }),
        );
        lookups.insert(
            keys::MERGE_EVENTS_OUTSTANDING,
            Pending::direct(count_events(node, EventFilter::outstanding_merge())),
        );
        lookups.insert(
            keys::MERGE_EVENTS_TOTAL,
            Pending::direct(count_events(node, EventFilter::merge())),
        );
        lookups.insert(
            keys::EVENTS_TOTAL,
            Pending::direct(count_events(node, EventFilter::all())),
        );

        let results: Report = resolve_all(lookups).await?.into_iter().collect();

        if let Some(sink) = alert {
            self.alert_policy.check(&results, sink);
        }

        report.merge(results);
        debug!(
            ledger_node = %node.id,
            creator = %creator,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "store metrics gathered"
        );
        Ok(())
    }
}

async fn count_events(node: &LedgerNode, filter: EventFilter) -> Result<Value> {
    node.events
        .count(filter)
        .await
        .map(Value::from)
        .map_err(MonitorError::Storage)
}

#[async_trait]
impl MetricsCollector for StoreMetrics {
    fn category(&self) -> MetricCategory {
        MetricCategory::Store
    }

    async fn collect(
        &self,
        node: &LedgerNode,
        report: &mut Report,
        alert: Option<&dyn AlertSink>,
    ) -> Result<()> {
        self.gather(node, report, alert).await
    }
}
