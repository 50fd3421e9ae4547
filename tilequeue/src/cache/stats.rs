//! Tile cache statistics.

/// Counters kept by the tile cache.
///
/// Hits and misses are counted by [`check_and_reserve`], which is the lookup
/// workers perform before rendering.
///
/// [`check_and_reserve`]: crate::cache::TileCacheGuard::check_and_reserve
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Tiles added under a new key
    pub inserts: u64,
    /// Tiles added over an existing entry for the same key
    pub replacements: u64,
    /// Entries dropped to make room or to reclaim a render target
    pub evictions: u64,
    /// Entries removed explicitly or by `clear`
    pub removals: u64,
    pub hits: u64,
    pub misses: u64,
    /// Entries currently cached
    pub entry_count: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hit rate in `0.0..=1.0`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_insert(&mut self) {
        self.inserts += 1;
    }

    pub fn record_replacement(&mut self) {
        self.replacements += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_removal(&mut self, count: u64) {
        self.removals += count;
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Format the counters as a human-readable block.
    pub fn format(&self) -> String {
        format!(
            r#"TILE CACHE
  Entries:      {}
  Inserts:      {}
  Replacements: {}
  Evictions:    {}
  Removals:     {}
  Hits:         {}
  Misses:       {}
  Hit Rate:     {:.1}%
"#,
            self.entry_count,
            self.inserts,
            self.replacements,
            self.evictions,
            self.removals,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
        )
    }
}
