use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::alert::{alert_key, AlertPayload, AlertSink, LOCAL_OPS_ALERT_SUPPRESS_MS};
use crate::config::{MetricCategory, MonitorConfig};
use crate::node::{CacheBatch, CacheClient, CacheReply, Clock, LedgerNode, SystemClock};
use crate::report::{keys, Report};
use crate::{MonitorError, Result};

use super::window::derive_window_keys;
use super::{MetricsCollector, MetricsUtils};

/// Timers read from the consensus cache, in batch order
const TIMERS: [&str; 3] = [
    keys::AGGREGATE,
    keys::FIND_CONSENSUS,
    keys::RECENT_HISTORY_MERGE_ONLY,
];

const LOCAL_OPS_ALERT_METRIC: &str = "local-ops-list-length";

/// Metrics read from the node's consensus cache
///
/// Every cycle issues one transaction of four commands: the timers, both
/// operation-count windows and the length of the local operation list.
pub struct CacheMetrics {
    cache: Arc<dyn CacheClient>,
    clock: Arc<dyn Clock>,
    sliding_window_seconds: u32,
    max_list_length: u64,
}

impl CacheMetrics {
    pub fn new(config: &MonitorConfig, cache: Arc<dyn CacheClient>) -> Self {
        Self {
            cache,
            clock: Arc::new(SystemClock),
            sliding_window_seconds: config.sliding_window_seconds(),
            max_list_length: config.max_list_length(),
        }
    }

    /// Replace the wall clock used to place the sliding window
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Read the cache metrics of `node` into `report`
    pub async fn gather(
        &self,
        node: &LedgerNode,
        report: &mut Report,
        alert: Option<&dyn AlertSink>,
    ) -> Result<()> {
        let started = Instant::now();
        let cache_keys = node.cache_keys.as_ref();
        let timer_keys: Vec<String> = TIMERS
            .iter()
            .map(|name| cache_keys.timer(&node.id, name))
            .collect();
        // local operations waiting to be included into a regular event
        let operation_list_key = cache_keys.operation_list(&node.id);
        let window = derive_window_keys(
            cache_keys,
            &node.id,
            self.sliding_window_seconds,
            self.clock.now_epoch_seconds(),
        );

        let batch = CacheBatch::new()
            .mget(timer_keys)
            .mget(window.local)
            .mget(window.peer)
            .llen(operation_list_key);
        let replies = self.cache.exec(batch).await.map_err(MonitorError::Cache)?;
        let [timers, local, peer, list_length]: [CacheReply; 4] =
            replies.try_into().map_err(|replies: Vec<CacheReply>| {
                MonitorError::UnexpectedReply(format!(
                    "expected 4 replies, got {}",
                    replies.len()
                ))
            })?;

        let timers = values(timers, "timers")?;
        for (i, name) in TIMERS.iter().enumerate() {
            let raw = timers.get(i).and_then(|v| v.as_deref());
            report.set(*name, MetricsUtils::parse_sample(raw));
        }
        report.set(
            keys::LOCAL_OPS_PER_SECOND,
            MetricsUtils::average_samples(&values(local, "local op counts")?),
        );
        report.set(
            keys::PEER_OPS_PER_SECOND,
            MetricsUtils::average_samples(&values(peer, "peer op counts")?),
        );
        let list_length = integer(list_length)?;
        report.set(keys::LOCAL_OPS_LIST_LENGTH, list_length);
        if let Some(cooldown) = &node.cooldown {
            report.set(keys::COOLDOWN_ALERT_SIZE, cooldown.size() as u64);
        }

        if let Some(sink) = alert {
            self.check_list_length(&node.id, list_length, sink);
        }

        debug!(
            ledger_node = %node.id,
            local_ops_list_length = list_length,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "cache metrics gathered"
        );
        Ok(())
    }

    fn check_list_length(&self, ledger_node_id: &str, list_length: i64, sink: &dyn AlertSink) {
        let max = i64::try_from(self.max_list_length).unwrap_or(i64::MAX);
        if list_length <= max {
            return;
        }
        info!(
            ledger_node = %ledger_node_id,
            list_length,
            max_list_length = self.max_list_length,
            "local operation list over limit"
        );
        sink.raise_alert(
            &alert_key(LOCAL_OPS_ALERT_METRIC),
            AlertPayload::new(format!(
                "Current continuity local operations list length \"{} ops\" \
                 exceeded maximum \"{}\" ops.",
                list_length, self.max_list_length
            )),
            LOCAL_OPS_ALERT_SUPPRESS_MS,
        );
    }
}

#[async_trait]
impl MetricsCollector for CacheMetrics {
    fn category(&self) -> MetricCategory {
        MetricCategory::Cache
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

fn values(reply: CacheReply, what: &str) -> Result<Vec<Option<String>>> {
    match reply {
        CacheReply::Values(values) => Ok(values),
        other => Err(MonitorError::UnexpectedReply(format!(
            "{} should be a multi-value reply, got {:?}",
            what, other
        ))),
    }
}

fn integer(reply: CacheReply) -> Result<i64> {
    match reply {
        CacheReply::Integer(n) => Ok(n),
        CacheReply::Bulk(raw) => Ok(MetricsUtils::parse_sample(raw.as_deref())),
        other => Err(MonitorError::UnexpectedReply(format!(
            "list length should be an integer reply, got {:?}",
            other
        ))),
    }
}
