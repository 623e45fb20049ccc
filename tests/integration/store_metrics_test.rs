use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use continuity_stats_monitor::{
    alert::{AlertSink, StoreAlertPolicy},
    metrics::StoreMetrics,
    node::VoterId,
    report::keys,
    MonitorError,
    Report,
};

use crate::common::{test_node, MockStorage, RecordingSink, NODE_ID, VOTER_ID};

#[derive(Default)]
struct CountingPolicy {
    checks: AtomicUsize,
}

impl StoreAlertPolicy for CountingPolicy {
    fn check(&self, results: &Report, _sink: &dyn AlertSink) {
        assert!(results.contains_key(keys::EVENTS_OUTSTANDING));
        self.checks.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_store_metrics() {
    let storage = Arc::new(MockStorage::default());
    let node = test_node(storage.clone());
    let mut report = Report::new();

    StoreMetrics::new().gather(&node, &mut report, None).await.unwrap();

    assert_eq!(
        report.into_value(),
        json!({
            "avgConsensusTime": 1250,
            "eventsOutstanding": 17,
            "latestSummary": {
                "eventBlock": {
                    "block": {"blockHeight": 12},
                    "meta": {"blockHash": "zQmBlock12", "consensus": true}
                }
            },
            "mergeEventsOutstanding": 5,
            "mergeEventsTotal": 120,
            "eventsTotal": 450
        })
    );
    assert_eq!(
        storage.creators.lock().unwrap().clone(),
        vec![VoterId::new(VOTER_ID)]
    );
    assert_eq!(storage.event_queries.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_missing_consensus_time_is_null() {
    let storage = MockStorage {
        avg_consensus_time: json!({}),
        ..Default::default()
    };
    let node = test_node(Arc::new(storage));
    let mut report = Report::new();

    StoreMetrics::new().gather(&node, &mut report, None).await.unwrap();
    assert_eq!(report.get(keys::AVG_CONSENSUS_TIME), Some(&Value::Null));
}

#[tokio::test]
async fn test_repeated_gathering_is_identical() {
    let node = test_node(Arc::new(MockStorage::default()));
    let gatherer = StoreMetrics::new();

    let mut first = Report::new();
    gatherer.gather(&node, &mut first, None).await.unwrap();
    let mut second = Report::new();
    gatherer.gather(&node, &mut second, None).await.unwrap();

    assert_eq!(
        first.to_json_string().unwrap(),
        second.to_json_string().unwrap()
    );
}

#[tokio::test]
async fn test_identity_failure_propagates() {
    let storage = Arc::new(MockStorage::default());
    storage.fail_identity.store(true, Ordering::SeqCst);
    let node = test_node(storage.clone());
    let mut report = Report::new();

    let err = StoreMetrics::new()
        .gather(&node, &mut report, None)
        .await
        .unwrap_err();
    match err {
        MonitorError::Identity { ledger_node_id, .. } => assert_eq!(ledger_node_id, NODE_ID),
        other => panic!("unexpected error {:?}", other),
    }
    // nothing is queried without an identity
    assert_eq!(storage.event_queries.load(Ordering::SeqCst), 0);
    assert!(report.is_empty());
}

#[tokio::test]
async fn test_storage_failure_leaves_report_untouched() {
    let storage = Arc::new(MockStorage::default());
    storage.fail_events.store(true, Ordering::SeqCst);
    let node = test_node(storage);
    let mut report = Report::new();
    report.set("existing", 1);

    let err = StoreMetrics::new()
        .gather(&node, &mut report, None)
        .await
        .unwrap_err();
    assert_eq!(err.category(), "storage");
    assert!(matches!(err.root(), MonitorError::Storage(_)));
    assert_eq!(report.len(), 1);
}

#[tokio::test]
async fn test_default_store_alerts_are_inert() {
    let storage = MockStorage::default();
    let mut counts = storage.counts.clone();
    for count in counts.values_mut() {
        *count = 1_000_000;
    }
    let node = test_node(Arc::new(MockStorage { counts, ..storage }));
    let sink = RecordingSink::default();

    StoreMetrics::new()
        .gather(&node, &mut Report::new(), Some(&sink))
        .await
        .unwrap();
    assert!(sink.alerts().is_empty());
}

#[tokio::test]
async fn test_alert_policy_runs_only_with_sink() {
    let policy = Arc::new(CountingPolicy::default());
    let gatherer = StoreMetrics::new().with_alert_policy(policy.clone());
    let node = test_node(Arc::new(MockStorage::default()));
    let sink = RecordingSink::default();

    gatherer.gather(&node, &mut Report::new(), None).await.unwrap();
    assert_eq!(policy.checks.load(Ordering::SeqCst), 0);

    gatherer
        .gather(&node, &mut Report::new(), Some(&sink))
        .await
        .unwrap();
    assert_eq!(policy.checks.load(Ordering::SeqCst), 1);
}
