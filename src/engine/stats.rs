// src/engine/stats.rs
//! Per-pass conversion statistics.
//!
//! The sink is written concurrently while sibling macros process (hence
//! `DashMap` and atomics) and folded into an ordered, immutable snapshot
//! when the pass completes.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Aggregated numbers for one macro type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeStats {
    pub count: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub min_latency: Duration,
    pub avg_latency: Duration,
    pub max_latency: Duration,
}

/// Snapshot of a completed pass.
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Unknown macros preserved verbatim rather than processed.
    pub skipped: usize,
    /// Per-type breakdown, ordered by type name for stable reporting.
    pub per_type: BTreeMap<String, TypeStats>,
}

#[derive(Debug, Default)]
struct TypeAccumulator {
    count: usize,
    succeeded: usize,
    failed: usize,
    total_latency: Duration,
    min_latency: Option<Duration>,
    max_latency: Duration,
}

impl TypeAccumulator {
    fn record(&mut self, latency: Duration, succeeded: bool) {
        self.count += 1;
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.total_latency += latency;
        self.min_latency = Some(self.min_latency.map_or(latency, |m| m.min(latency)));
        self.max_latency = self.max_latency.max(latency);
    }

    fn snapshot(&self) -> TypeStats {
        let avg = if self.count == 0 {
            Duration::ZERO
        } else {
            self.total_latency / self.count as u32
        };
        TypeStats {
            count: self.count,
            succeeded: self.succeeded,
            failed: self.failed,
            min_latency: self.min_latency.unwrap_or(Duration::ZERO),
            avg_latency: avg,
            max_latency: self.max_latency,
        }
    }
}

/// Concurrent statistics sink for one document pass.
#[derive(Debug, Default)]
pub struct StatsSink {
    per_type: DashMap<String, TypeAccumulator>,
    skipped: AtomicUsize,
}

impl StatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed node's outcome and latency.
    pub fn record(&self, macro_type: &str, latency: Duration, succeeded: bool) {
        self.per_type
            .entry(macro_type.to_string())
            .or_default()
            .record(latency, succeeded);
    }

    /// Record an unknown macro that was preserved rather than processed.
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold the sink into an ordered snapshot.
    pub fn snapshot(&self) -> ProcessingStats {
        let mut per_type = BTreeMap::new();
        let mut succeeded = 0;
        let mut failed = 0;
        for entry in self.per_type.iter() {
            let stats = entry.value().snapshot();
            succeeded += stats.succeeded;
            failed += stats.failed;
            per_type.insert(entry.key().clone(), stats);
        }
        let skipped = self.skipped.load(Ordering::Relaxed);
        ProcessingStats {
            total: succeeded + failed + skipped,
            succeeded,
            failed,
            skipped,
            per_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn aggregates_latency_bounds() {
        let sink = StatsSink::new();
        sink.record("code", Duration::from_millis(10), true);
        sink.record("code", Duration::from_millis(30), true);
        sink.record("code", Duration::from_millis(20), false);

        let stats = sink.snapshot();
        let code = &stats.per_type["code"];
        assert_eq!(code.count, 3);
        assert_eq!(code.succeeded, 2);
        assert_eq!(code.failed, 1);
        assert_eq!(code.min_latency, Duration::from_millis(10));
        assert_eq!(code.avg_latency, Duration::from_millis(20));
        assert_eq!(code.max_latency, Duration::from_millis(30));
    }

    #[test]
    fn totals_include_skipped() {
        let sink = StatsSink::new();
        sink.record("info", Duration::from_millis(1), true);
        sink.record_skipped();
        sink.record_skipped();

        let stats = sink.snapshot();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.skipped, 2);
    }
}
