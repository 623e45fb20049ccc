use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};

/// Report keys written by the gatherers
pub mod keys {
    pub const AGGREGATE: &str = "aggregate";
    pub const FIND_CONSENSUS: &str = "findConsensus";
    pub const RECENT_HISTORY_MERGE_ONLY: &str = "recentHistoryMergeOnly";
    pub const LOCAL_OPS_PER_SECOND: &str = "localOpsPerSecond";
    pub const PEER_OPS_PER_SECOND: &str = "peerOpsPerSecond";
    pub const LOCAL_OPS_LIST_LENGTH: &str = "localOpsListLength";
    pub const COOLDOWN_ALERT_SIZE: &str = "cooldownAlertSize";
    pub const AVG_CONSENSUS_TIME: &str = "avgConsensusTime";
    pub const EVENTS_OUTSTANDING: &str = "eventsOutstanding";
    pub const LATEST_SUMMARY: &str = "latestSummary";
    pub const MERGE_EVENTS_OUTSTANDING: &str = "mergeEventsOutstanding";
    pub const MERGE_EVENTS_TOTAL: &str = "mergeEventsTotal";
    pub const EVENTS_TOTAL: &str = "eventsTotal";

    /// Section of the stats monitor object owned by this crate
    pub const CONTINUITY: &str = "continuity";
}

/// Metric name to value mapping filled during one report cycle
///
/// Created empty by the caller, filled by the gatherers, then handed to the
/// stats storage. Keys are kept sorted so two reports over the same state
/// serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    values: Map<String, Value>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Integer value of `key`, if present and integral
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Copy every entry of `other` into this report; later writes win
    pub fn merge(&mut self, other: Report) {
        self.values.extend(other.values);
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    pub fn to_json_string(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&self.values)?)
    }
}

impl From<Map<String, Value>> for Report {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Value)> for Report {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
