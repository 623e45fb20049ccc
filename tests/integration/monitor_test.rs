use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

use continuity_stats_monitor::{
    node::{CacheBatch, CacheClient, CacheReply, FixedClock, IdentityResolver, LedgerNode, VoterId},
    report::keys,
    MetricCategory,
    MonitorConfig,
    MonitorError,
    Report,
    StatsMonitor,
};

use crate::common::{
    cache_replies,
    test_node,
    MockStorage,
    RecordingSink,
    ScriptedCache,
    TestKeys,
    NODE_ID,
    NOW,
    VOTER_ID,
};

const ALL_KEYS: [&str; 12] = [
    keys::AGGREGATE,
    keys::FIND_CONSENSUS,
    keys::RECENT_HISTORY_MERGE_ONLY,
    keys::LOCAL_OPS_PER_SECOND,
    keys::PEER_OPS_PER_SECOND,
    keys::LOCAL_OPS_LIST_LENGTH,
    keys::AVG_CONSENSUS_TIME,
    keys::EVENTS_OUTSTANDING,
    keys::LATEST_SUMMARY,
    keys::MERGE_EVENTS_OUTSTANDING,
    keys::MERGE_EVENTS_TOTAL,
    keys::EVENTS_TOTAL,
];

fn replies(list_length: i64) -> Vec<CacheReply> {
    cache_replies(
        &[Some("3"), Some("7"), Some("11")],
        &[Some("5"), Some("6")],
        &[Some("2"), Some("2")],
        CacheReply::Integer(list_length),
    )
}

fn monitor(config: MonitorConfig, cache: Arc<dyn CacheClient>) -> StatsMonitor {
    StatsMonitor::new(config, cache)
        .unwrap()
        .with_clock(Arc::new(FixedClock(NOW)))
}

#[test_log::test(tokio::test)]
async fn test_consensus_report_has_every_metric() {
    let monitor = monitor(MonitorConfig::default(), Arc::new(ScriptedCache::new(replies(4))));
    let node = test_node(Arc::new(MockStorage::default()));
    let mut monitors = Report::new();

    monitor.report_consensus(&node, &mut monitors).await.unwrap();

    let continuity = monitors
        .get(keys::CONTINUITY)
        .and_then(|v| v.as_object())
        .expect("continuity section");
    for key in ALL_KEYS {
        assert!(continuity.contains_key(key), "missing {}", key);
    }
    assert_eq!(continuity[keys::RECENT_HISTORY_MERGE_ONLY], json!(11));
    assert_eq!(continuity[keys::LOCAL_OPS_PER_SECOND], json!(6));
    assert_eq!(continuity[keys::PEER_OPS_PER_SECOND], json!(2));
    assert_eq!(continuity[keys::EVENTS_TOTAL], json!(450));
}

#[tokio::test]
async fn test_disabled_categories_are_skipped() {
    let cache = Arc::new(ScriptedCache::new(replies(4)));
    let storage = Arc::new(MockStorage::default());
    let config = MonitorConfig::default().with_categories([MetricCategory::Store]);
    let monitor = monitor(config, cache.clone());
    let mut report = Report::new();

    monitor
        .on_report(&test_node(storage), &mut report, None)
        .await
        .unwrap();

    assert!(cache.batches().is_empty());
    assert!(report.contains_key(keys::EVENTS_TOTAL));
    assert!(!report.contains_key(keys::AGGREGATE));
}

#[tokio::test]
async fn test_no_categories_is_a_no_op() {
    let config = MonitorConfig::default().with_categories([]);
    let monitor = monitor(config, Arc::new(ScriptedCache::failing()));
    let mut report = Report::new();

    monitor
        .on_report(&test_node(Arc::new(MockStorage::default())), &mut report, None)
        .await
        .unwrap();
    assert!(report.is_empty());
}

#[tokio::test]
async fn test_failed_category_fails_cycle() {
    let monitor = monitor(MonitorConfig::default(), Arc::new(ScriptedCache::failing()));
    let node = test_node(Arc::new(MockStorage::default()));
    let mut monitors = Report::new();

    let err = monitor.report_consensus(&node, &mut monitors).await.unwrap_err();
    assert!(matches!(err, MonitorError::Cache(_)));
    // the store metrics succeeded but are not reported on their own
    assert!(monitors.is_empty());
}

#[tokio::test]
async fn test_cooldown_check_raises_alert() {
    let mut config = MonitorConfig::default();
    config.operations.local.max_list_length = 200;
    let monitor = monitor(config, Arc::new(ScriptedCache::new(replies(250))));
    let node = test_node(Arc::new(MockStorage::default()));
    let sink = RecordingSink::default();

    let report = monitor.cooldown_check(&node, &sink).await.unwrap();

    assert_eq!(report.get_i64(keys::LOCAL_OPS_LIST_LENGTH), Some(250));
    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].0.ends_with(":local-ops-list-length"));
}

#[tokio::test]
async fn test_consensus_report_never_alerts() {
    let monitor = monitor(MonitorConfig::default(), Arc::new(ScriptedCache::new(replies(5_000))));
    let node = test_node(Arc::new(MockStorage::default()));
    let mut monitors = Report::new();

    // no sink on this path; over-limit queues are only reported
    monitor.report_consensus(&node, &mut monitors).await.unwrap();
    assert_eq!(
        monitors.get(keys::CONTINUITY).unwrap()[keys::LOCAL_OPS_LIST_LENGTH],
        json!(5_000)
    );
}

#[tokio::test]
async fn test_closure_as_alert_sink() {
    let monitor = monitor(MonitorConfig::default(), Arc::new(ScriptedCache::new(replies(300))));
    let node = test_node(Arc::new(MockStorage::default()));
    let raised = std::sync::Mutex::new(Vec::new());
    let sink = |key: &str, _payload: continuity_stats_monitor::AlertPayload, suppress_ms: u64| {
        raised.lock().unwrap().push((key.to_string(), suppress_ms));
    };

    monitor.cooldown_check(&node, &sink).await.unwrap();
    assert_eq!(raised.lock().unwrap().len(), 1);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = MonitorConfig::default();
    config.operations.sliding_window_seconds = 0;
    let result = StatsMonitor::new(config, Arc::new(ScriptedCache::default()));
    assert!(matches!(result, Err(MonitorError::Config(_))));
}

/// Cache that only answers once the identity lookup is in flight too
struct RendezvousCache {
    barrier: Arc<Barrier>,
}

#[async_trait]
impl CacheClient for RendezvousCache {
    async fn exec(&self, _batch: CacheBatch) -> anyhow::Result<Vec<CacheReply>> {
        self.barrier.wait().await;
        Ok(replies(1))
    }
}

struct RendezvousIdentity {
    barrier: Arc<Barrier>,
}

#[async_trait]
impl IdentityResolver for RendezvousIdentity {
    async fn voter_id(&self, _ledger_node_id: &str) -> anyhow::Result<VoterId> {
        self.barrier.wait().await;
        Ok(VoterId::new(VOTER_ID))
    }
}

#[tokio::test]
async fn test_categories_run_concurrently() {
    let barrier = Arc::new(Barrier::new(2));
    let storage = Arc::new(MockStorage::default());
    let node = LedgerNode::new(
        NODE_ID,
        Arc::new(TestKeys),
        Arc::new(RendezvousIdentity { barrier: barrier.clone() }),
        storage.clone(),
        storage.clone(),
        storage,
    );
    let monitor = monitor(MonitorConfig::default(), Arc::new(RendezvousCache { barrier }));
    let mut report = Report::new();

    tokio::time::timeout(Duration::from_secs(5), monitor.on_report(&node, &mut report, None))
        .await
        .expect("categories were gathered one after another")
        .unwrap();
    assert!(report.contains_key(keys::AGGREGATE));
    assert!(report.contains_key(keys::AVG_CONSENSUS_TIME));
}

#[tokio::test]
async fn test_report_cycles_are_independent() {
    let storage = Arc::new(MockStorage::default());
    let node = test_node(storage.clone());
    let monitor = monitor(MonitorConfig::default(), Arc::new(ScriptedCache::new(replies(4))));

    let mut first = Report::new();
    monitor.report_consensus(&node, &mut first).await.unwrap();
    let mut second = Report::new();
    monitor.report_consensus(&node, &mut second).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(storage.event_queries.load(Ordering::SeqCst), 8);
}
