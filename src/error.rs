/*!
# Error Module

Error type shared by the gatherers and the report entry point.

## Error Categories

| Variant           | Source                                   | Handling      |
|-------------------|------------------------------------------|---------------|
| `Cache`           | cache batch failed or timed out          | propagated    |
| `UnexpectedReply` | cache answered with the wrong shape      | propagated    |
| `Storage`         | event/block/consensus-timing lookup      | propagated    |
| `Identity`        | voter identity could not be resolved     | propagated    |
| `Lookup`          | one entry of a concurrent fetch failed   | propagated    |
| `Config`          | invalid monitor configuration            | at load time  |

Unparseable samples and missing projected fields are not errors: they are
recovered where they occur (zero and null respectively).

None of these errors are retried inside the crate. A reporting cycle either
produces a complete report or fails as a whole, and the scheduler decides
what to do with the failure.
*/

use thiserror::Error;

/// Core monitor error type
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Cache error
    #[error("Cache error: {0:#}")]
    Cache(anyhow::Error),

    /// Cache reply did not match the submitted batch
    #[error("Unexpected cache reply: {0}")]
    UnexpectedReply(String),

    /// Storage error
    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),

    /// Identity resolution error
    #[error("Identity resolution failed for ledger node {ledger_node_id}: {source:#}")]
    Identity {
        ledger_node_id: String,
        source: anyhow::Error,
    },

    /// A single entry of a concurrent lookup failed
    #[error("Lookup {key} failed: {source}")]
    Lookup {
        key: String,
        source: Box<MonitorError>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MonitorError {
    /// Short stable name used as a logging field
    pub fn category(&self) -> &'static str {
        match self {
            MonitorError::Cache(_) | MonitorError::UnexpectedReply(_) => "cache",
            MonitorError::Storage(_) => "storage",
            MonitorError::Identity { .. } => "identity",
            MonitorError::Lookup { source, .. } => source.category(),
            MonitorError::Config(_) => "config",
            MonitorError::Serialization(_) => "serialization",
        }
    }

    /// Error that caused a failed lookup, with lookup wrappers removed
    pub fn root(&self) -> &MonitorError {
        match self {
            MonitorError::Lookup { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<&str> for MonitorError {
    fn from(s: &str) -> Self {
        MonitorError::Config(s.to_string())
    }
}
