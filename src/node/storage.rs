use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use serde_json::Value;

/// Voting identity of a node in the continuity consensus
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoterId(pub String);

impl VoterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VoterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger event type as recorded in event metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Regular event carrying operations
    #[serde(rename = "r")]
    Regular,
    /// Merge event joining histories
    #[serde(rename = "m")]
    Merge,
}

/// Document filter for event count queries
///
/// `None` fields match every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventFilter {
    /// Match on `meta.consensus`
    pub consensus: Option<bool>,
    /// Match on `meta.continuity2017.type`
    pub event_type: Option<EventType>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn outstanding() -> Self {
        Self {
            consensus: Some(false),
            event_type: None,
        }
    }

    pub fn merge() -> Self {
        Self {
            consensus: None,
            event_type: Some(EventType::Merge),
        }
    }

    pub fn outstanding_merge() -> Self {
        Self {
            consensus: Some(false),
            event_type: Some(EventType::Merge),
        }
    }
}

/// Resolves a ledger node's voting identity
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn voter_id(&self, ledger_node_id: &str) -> anyhow::Result<VoterId>;
}

/// Consensus-timing storage plugin
#[async_trait]
pub trait ConsensusTimingSource: Send + Sync {
    /// Average consensus time for events created by `creator`
    ///
    /// The result is a mapping carrying at least `avgConsensusTime`.
    async fn avg_consensus_time(&self, creator: &VoterId) -> anyhow::Result<Value>;
}

/// Durable event storage
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn count(&self, filter: EventFilter) -> anyhow::Result<u64>;
}

/// Durable block storage
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Summary of the most recent block
    async fn latest_summary(&self) -> anyhow::Result<Value>;
}
