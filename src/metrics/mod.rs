//! # Continuity Metrics
//!
//! Gatherers that fill a [`Report`] with operational statistics of one ledger
//! node on every report cycle.
//!
//! - [`CacheMetrics`]: consensus timers, operation rates over a sliding
//!   window and the local operation queue depth, read in a single cache
//!   transaction
//! - [`StoreMetrics`]: consensus time and event/block counts from durable
//!   storage, fetched concurrently through [`resolve_all`]
//!
//! Both implement [`MetricsCollector`], which is what the
//! [`StatsMonitor`](crate::monitor::StatsMonitor) drives.

use async_trait::async_trait;

use crate::alert::AlertSink;
use crate::config::MetricCategory;
use crate::node::LedgerNode;
use crate::report::Report;
use crate::Result;

pub mod cache_metrics;
pub mod fetcher;
pub mod store_metrics;
pub mod window;

pub use cache_metrics::CacheMetrics;
pub use fetcher::{resolve_all, Pending, PendingSet, Project};
pub use store_metrics::StoreMetrics;
pub use window::{derive_window_keys, WindowKeys};

/// One metric category gathered per report cycle
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    /// Category this collector fills
    fn category(&self) -> MetricCategory;

    /// Write this category's metrics into `report`
    ///
    /// `alert` is only supplied on cooldown-check cycles.
    async fn collect(
        &self,
        node: &LedgerNode,
        report: &mut Report,
        alert: Option<&dyn AlertSink>,
    ) -> Result<()>;
}

/// Common metrics collection utilities
pub struct MetricsUtils;

impl MetricsUtils {
    /// Parse a raw cache sample as a base-10 integer
    ///
    /// Leading whitespace, an optional sign and the leading digits are used;
    /// anything after the digits is ignored. Missing or non-numeric samples
    /// count as zero.
    pub fn parse_sample(raw: Option<&str>) -> i64 {
        let Some(raw) = raw else {
            return 0;
        };
        let s = raw.trim_start();
        let (negative, digits) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let mut value: i64 = 0;
        for b in digits.bytes().take_while(u8::is_ascii_digit) {
            value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
        }
        if negative {
            -value
        } else {
            value
        }
    }

    /// Rounded arithmetic mean of raw samples
    ///
    /// Unparseable samples contribute zero to the sum and one to the count.
    /// An empty window averages to zero.
    pub fn average_samples<S: AsRef<str>>(samples: &[Option<S>]) -> i64 {
        if samples.is_empty() {
            return 0;
        }
        let sum: i128 = samples
            .iter()
            .map(|s| i128::from(Self::parse_sample(s.as_ref().map(|v| v.as_ref()))))
            .sum();
        Self::round_half_up(sum, samples.len() as i128)
    }

    /// `numerator / denominator` rounded to the nearest integer, halves
    /// towards positive infinity
    ///
    /// `denominator` must be positive.
    pub fn round_half_up(numerator: i128, denominator: i128) -> i64 {
        let rounded = (2 * numerator + denominator).div_euclid(2 * denominator);
        i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX })
    }
}
