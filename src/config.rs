/*!
# Monitor Configuration

Static configuration for the continuity stats monitor. The configuration is
built once and handed to [`StatsMonitor`](crate::monitor::StatsMonitor) and to
each gatherer at construction time.

```json
{
  "metrics": { "cache": true, "store": true },
  "operations": {
    "sliding_window_seconds": 600,
    "local": { "max_list_length": 200 }
  }
}
```

The `metrics` flags also accept the historical backend names `redis` (cache)
and `mongodb` (store).
*/

use serde::{Serialize, Deserialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::{MonitorError, Result};

/// Name under which alerts and report sections are published
pub const MODULE_NAME: &str = "ledger-consensus-continuity-stats-monitor";

/// Environment variable naming a JSON configuration file
pub const CONFIG_ENV_VAR: &str = "CONTINUITY_STATS_MONITOR_CONFIG";

const DEFAULT_SLIDING_WINDOW_SECONDS: u32 = 600;
const DEFAULT_MAX_LIST_LENGTH: u64 = 200;

/// Metric category gathered on every report cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    /// Consensus cache timers, op windows and the local operation queue
    Cache,
    /// Durable event/block storage counts
    Store,
}

impl MetricCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Cache => "cache",
            MetricCategory::Store => "store",
        }
    }
}

impl std::fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Enabled metric categories
    pub metrics: MetricsConfig,
    /// Operation window and queue settings
    pub operations: OperationsConfig,
}

/// Per-category enable flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    #[serde(alias = "redis")]
    pub cache: bool,
    #[serde(alias = "mongodb")]
    pub store: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            cache: true,
            store: true,
        }
    }
}

/// Operation counter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationsConfig {
    /// Sliding window size for localOpsPerSecond and peerOpsPerSecond
    pub sliding_window_seconds: u32,
    /// Local operation queue settings
    pub local: LocalOperationsConfig,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            sliding_window_seconds: DEFAULT_SLIDING_WINDOW_SECONDS,
            local: LocalOperationsConfig::default(),
        }
    }
}

/// Local operation queue settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalOperationsConfig {
    /// Queue depth above which the cooldown alert is raised
    pub max_list_length: u64,
}

impl Default for LocalOperationsConfig {
    fn default() -> Self {
        Self {
            max_list_length: DEFAULT_MAX_LIST_LENGTH,
        }
    }
}

impl MonitorConfig {
    /// Enabled categories in gathering order
    pub fn enabled_categories(&self) -> BTreeSet<MetricCategory> {
        let mut categories = BTreeSet::new();
        if self.metrics.cache {
            categories.insert(MetricCategory::Cache);
        }
        if self.metrics.store {
            categories.insert(MetricCategory::Store);
        }
        categories
    }

    /// Builder-style override of the enabled categories
    pub fn with_categories<I>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = MetricCategory>,
    {
        self.metrics.cache = false;
        self.metrics.store = false;
        for category in categories {
            match category {
                MetricCategory::Cache => self.metrics.cache = true,
                MetricCategory::Store => self.metrics.store = true,
            }
        }
        self
    }

    pub fn sliding_window_seconds(&self) -> u32 {
        self.operations.sliding_window_seconds
    }

    pub fn max_list_length(&self) -> u64 {
        self.operations.local.max_list_length
    }

    /// Check the configuration for values the gatherers cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.operations.sliding_window_seconds == 0 {
            return Err("operations.sliding_window_seconds must be at least 1".into());
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MonitorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Load from the file named by `CONTINUITY_STATS_MONITOR_CONFIG`, or defaults
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
