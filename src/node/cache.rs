use async_trait::async_trait;
use std::time::{SystemTime, UNIX_EPOCH};

/// Key naming scheme of the node's consensus cache
///
/// Supplied by the consensus cache subsystem. Implementations must be pure:
/// the same inputs always name the same key.
pub trait CacheKeyDeriver: Send + Sync {
    /// Key of a named consensus timer
    fn timer(&self, ledger_node_id: &str, name: &str) -> String;

    /// Key of the list of local operations waiting for a regular event
    fn operation_list(&self, ledger_node_id: &str) -> String;

    /// Key of the local-origin operation counter for one epoch second
    fn op_count_local(&self, ledger_node_id: &str, second: i64) -> String;

    /// Key of the peer-origin operation counter for one epoch second
    fn op_count_peer(&self, ledger_node_id: &str, second: i64) -> String;
}

/// Single command inside an atomic cache batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCommand {
    /// Fetch several keys at once
    MGet(Vec<String>),
    /// Length of a list
    LLen(String),
}

/// Reply to one [`CacheCommand`], in submission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheReply {
    /// Values of an `MGet`, `None` for missing keys
    Values(Vec<Option<String>>),
    /// Integer reply
    Integer(i64),
    /// Single raw string reply
    Bulk(Option<String>),
}

/// Commands executed together as one cache transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheBatch {
    commands: Vec<CacheCommand>,
}

impl CacheBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mget<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands
            .push(CacheCommand::MGet(keys.into_iter().map(Into::into).collect()));
        self
    }

    pub fn llen(mut self, key: impl Into<String>) -> Self {
        self.commands.push(CacheCommand::LLen(key.into()));
        self
    }

    pub fn commands(&self) -> &[CacheCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn into_commands(self) -> Vec<CacheCommand> {
        self.commands
    }
}

/// Cache client able to run a [`CacheBatch`] as a single transaction
///
/// Returns exactly one reply per command, in submission order. The client is
/// long-lived and shared across report cycles.
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn exec(&self, batch: CacheBatch) -> anyhow::Result<Vec<CacheReply>>;
}

/// Source of the current wall-clock second
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> i64;
}

/// Wall clock rounded to the nearest second
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> i64 {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        (millis + 500) / 1000
    }
}

/// Clock pinned to one second, for deterministic key windows
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> i64 {
        self.0
    }
}
