//! Render counters shared by the coordinator and its workers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters, updated with relaxed atomics.
#[derive(Debug, Default)]
pub struct RenderStats {
    submitted: AtomicU64,
    committed: AtomicU64,
    stale: AtomicU64,
    already_cached: AtomicU64,
    duplicates: AtomicU64,
    cancelled: AtomicU64,
    failed: AtomicU64,
    drains: AtomicU64,
    render_nanos: AtomicU64,
}

impl RenderStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_submitted(&self, count: u64) {
        self.submitted.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_committed(&self, duration: Duration) {
        self.committed.fetch_add(1, Ordering::Relaxed);
        self.render_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cached(&self) {
        self.already_cached.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_drain(&self) {
        self.drains.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RenderStatsSnapshot {
        RenderStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            already_cached: self.already_cached.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            drains: self.drains.load(Ordering::Relaxed),
            total_render_time: Duration::from_nanos(self.render_nanos.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time copy of [`RenderStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStatsSnapshot {
    /// Commands pushed onto the queue
    pub submitted: u64,
    /// Tiles added to the cache
    pub committed: u64,
    /// Commands dropped because the viewport moved on
    pub stale: u64,
    /// Commands dropped because the tile was already cached
    pub already_cached: u64,
    /// Commands parked behind a render of the same tile
    pub duplicates: u64,
    /// Renders abandoned through a cancel token
    pub cancelled: u64,
    /// Renders whose drawing routine panicked
    pub failed: u64,
    /// Times the queue ran empty with listeners notified
    pub drains: u64,
    /// Drawing time summed over committed tiles
    pub total_render_time: Duration,
}

impl RenderStatsSnapshot {
    /// Commands a worker finished with, whatever the outcome.
    pub fn processed(&self) -> u64 {
        self.committed
            + self.stale
            + self.already_cached
            + self.duplicates
            + self.cancelled
            + self.failed
    }

    pub fn average_render_time(&self) -> Duration {
        if self.committed == 0 {
            Duration::ZERO
        } else {
            self.total_render_time / self.committed as u32
        }
    }

    pub fn format(&self) -> String {
        format!(
            r#"RENDER QUEUE
  Submitted:    {}
  Committed:    {}
  Stale:        {}
  Cached:       {}
  Duplicates:   {}
  Cancelled:    {}
  Failed:       {}
  Avg Render:   {:.2} ms
"#,
            self.submitted,
            self.committed,
            self.stale,
            self.already_cached,
            self.duplicates,
            self.cancelled,
            self.failed,
            self.average_render_time().as_secs_f64() * 1000.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let stats = RenderStats::new();
        stats.record_submitted(5);
        stats.record_committed(Duration::from_millis(4));
        stats.record_committed(Duration::from_millis(6));
        stats.record_stale();
        stats.record_cancelled();
        stats.record_cached();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.submitted, 5);
        assert_eq!(snapshot.committed, 2);
        assert_eq!(snapshot.processed(), 5);
        assert_eq!(snapshot.average_render_time(), Duration::from_millis(5));
    }

    #[test]
    fn test_average_without_commits() {
        assert_eq!(
            RenderStatsSnapshot::default().average_render_time(),
            Duration::ZERO
        );
    }

    #[test]
    fn test_format() {
        let stats = RenderStats::new();
        stats.record_failed();
        let text = stats.snapshot().format();
        assert!(text.contains("RENDER QUEUE"));
        assert!(text.contains("Failed:       1"));
    }
}
