//! # Ledger Node Capabilities
//!
//! Narrow interfaces onto the ledger node being monitored. The monitor never
//! reaches into the node directly: everything it reads goes through one of
//! the traits re-exported here, bundled per node in a [`LedgerNode`].
//!
//! - [`CacheKeyDeriver`]: key names used by the node's consensus cache
//! - [`CacheClient`]: atomic multi-command reads against that cache
//! - [`IdentityResolver`]: the node's voting identity
//! - [`ConsensusTimingSource`]: average consensus time per creator
//! - [`EventStore`] and [`BlockStore`]: durable ledger storage

use std::sync::Arc;

pub mod cache;
pub mod storage;
#[cfg(feature = "redis-cache")]
pub mod redis;

pub use cache::{
    CacheBatch,
    CacheClient,
    CacheCommand,
    CacheKeyDeriver,
    CacheReply,
    Clock,
    FixedClock,
    SystemClock,
};
pub use storage::{
    BlockStore,
    ConsensusTimingSource,
    EventFilter,
    EventStore,
    EventType,
    IdentityResolver,
    VoterId,
};

use crate::alert::CooldownRegistry;

/// Handle onto one ledger node, as seen by the gatherers
#[derive(Clone)]
pub struct LedgerNode {
    /// Ledger node identifier
    pub id: String,
    pub cache_keys: Arc<dyn CacheKeyDeriver>,
    pub identity: Arc<dyn IdentityResolver>,
    pub consensus_timing: Arc<dyn ConsensusTimingSource>,
    pub events: Arc<dyn EventStore>,
    pub blocks: Arc<dyn BlockStore>,
    /// Cooldown subsystem, when one is running next to the node
    pub cooldown: Option<Arc<dyn CooldownRegistry>>,
}

impl LedgerNode {
    pub fn new(
        id: impl Into<String>,
        cache_keys: Arc<dyn CacheKeyDeriver>,
        identity: Arc<dyn IdentityResolver>,
        consensus_timing: Arc<dyn ConsensusTimingSource>,
        events: Arc<dyn EventStore>,
        blocks: Arc<dyn BlockStore>,
    ) -> Self {
        Self {
            id: id.into(),
            cache_keys,
            identity,
            consensus_timing,
            events,
            blocks,
            cooldown: None,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Arc<dyn CooldownRegistry>) -> Self {
        self.cooldown = Some(cooldown);
        self
    }
}

impl std::fmt::Debug for LedgerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerNode")
            .field("id", &self.id)
            .field("cooldown", &self.cooldown.is_some())
            .finish_non_exhaustive()
    }
}
