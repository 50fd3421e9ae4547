//! Lockable tile cache.
//!
//! The cache is locked explicitly with [`TileCache::lock`] and every
//! operation lives on the returned [`TileCacheGuard`], so compound
//! check-then-act sequences stay atomic with respect to other workers. The
//! guard must not be held across a render.
//!
//! Lock order is always cache, then pool: releasing a tile's target while the
//! guard is held takes the pool lock briefly.

use super::CacheStats;
use crate::queue::RenderCommand;
use crate::tile::{CachedTile, TileKey};
use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeMap, HashMap};

/// Result of [`TileCacheGuard::check_and_reserve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// A rendered tile is already cached for the key.
    AlreadyCached,
    /// Another worker holds the reservation and is rendering the key.
    InFlight,
    /// The caller now owns the reservation and must either commit a tile
    /// with [`TileCacheGuard::add_tile`] or give it back with
    /// [`TileCacheGuard::cancel_reservation`].
    Reserved,
}

struct Entry {
    tile: CachedTile,
    /// Commit stamp, key into `CacheInner::order`
    stamp: u64,
}

struct CacheInner {
    tiles: HashMap<TileKey, Entry>,
    /// Commit order, oldest first
    order: BTreeMap<u64, TileKey>,
    next_stamp: u64,
    /// Reserved keys, each with the newest command that asked for the key
    /// while it was being rendered
    reserved: HashMap<TileKey, Option<RenderCommand>>,
    capacity: usize,
    stats: CacheStats,
}

impl CacheInner {
    fn evict_oldest(&mut self) -> Option<TileKey> {
        let (_, key) = self.order.pop_first()?;
        if let Some(entry) = self.tiles.remove(&key) {
            entry.tile.release();
        }
        self.stats.record_eviction();
        Some(key)
    }

    fn remove(&mut self, key: &TileKey) -> bool {
        match self.tiles.remove(key) {
            Some(entry) => {
                self.order.remove(&entry.stamp);
                entry.tile.release();
                self.stats.record_removal(1);
                true
            }
            None => false,
        }
    }
}

/// Cache of rendered tiles keyed by [`TileKey`].
///
/// Holds at most `capacity` tiles. Each cached tile owns a render target,
/// so the capacity must never exceed the number of targets in the pool.
pub struct TileCache {
    inner: Mutex<CacheInner>,
}

impl TileCache {
    /// Create an empty cache holding at most `capacity` tiles.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            inner: Mutex::new(CacheInner {
                tiles: HashMap::new(),
                order: BTreeMap::new(),
                next_stamp: 0,
                reserved: HashMap::new(),
                capacity,
                stats: CacheStats::new(),
            }),
        }
    }

    /// Acquire the cache lock. Dropping the guard releases it.
    pub fn lock(&self) -> TileCacheGuard<'_> {
        TileCacheGuard {
            inner: self.inner.lock(),
        }
    }
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("TileCache")
            .field("len", &inner.tiles.len())
            .field("capacity", &inner.capacity)
            .field("reserved", &inner.reserved.len())
            .finish()
    }
}

/// Exclusive access to a [`TileCache`].
pub struct TileCacheGuard<'a> {
    inner: MutexGuard<'a, CacheInner>,
}

impl TileCacheGuard<'_> {
    pub fn has_tile(&self, key: &TileKey) -> bool {
        self.inner.tiles.contains_key(key)
    }

    /// The cached tile for `key`, if any.
    pub fn tile(&self, key: &TileKey) -> Option<&CachedTile> {
        self.inner.tiles.get(key).map(|entry| &entry.tile)
    }

    /// Insert or overwrite the tile for `key`.
    ///
    /// Overwriting releases the previous tile's target. Inserting a new key
    /// into a full cache first evicts exactly one entry, the least recently
    /// committed, and returns its key. Any reservation held on `key` is
    /// consumed, together with a command parked on it.
    pub fn add_tile(&mut self, key: TileKey, tile: CachedTile) -> Option<TileKey> {
        debug_assert_eq!(tile.key(), &key, "tile committed under a foreign key");
        let inner = &mut *self.inner;
        inner.reserved.remove(&key);

        let stamp = inner.next_stamp;
        inner.next_stamp += 1;

        if let Some(old) = inner.tiles.remove(&key) {
            inner.order.remove(&old.stamp);
            old.tile.release();
            inner.stats.record_replacement();
            inner.order.insert(stamp, key);
            inner.tiles.insert(key, Entry { tile, stamp });
            return None;
        }

        let evicted = if inner.tiles.len() >= inner.capacity {
            inner.evict_oldest()
        } else {
            None
        };

        inner.order.insert(stamp, key);
        inner.tiles.insert(key, Entry { tile, stamp });
        inner.stats.record_insert();
        inner.stats.entry_count = inner.tiles.len();
        evicted
    }

    /// Remove the tile for `key`, returning its target to the pool.
    pub fn remove_tile(&mut self, key: &TileKey) -> bool {
        let removed = self.inner.remove(key);
        self.inner.stats.entry_count = self.inner.tiles.len();
        removed
    }

    /// Look `key` up and reserve it for rendering if nobody has it.
    pub fn check_and_reserve(&mut self, key: &TileKey) -> Reservation {
        let inner = &mut *self.inner;
        if inner.tiles.contains_key(key) {
            inner.stats.record_hit();
            return Reservation::AlreadyCached;
        }
        inner.stats.record_miss();
        if inner.reserved.contains_key(key) {
            Reservation::InFlight
        } else {
            inner.reserved.insert(*key, None);
            Reservation::Reserved
        }
    }

    /// Attach `command` to the reservation on its key.
    ///
    /// Used when a worker finds the key [`Reservation::InFlight`]. Only the
    /// command with the highest sequence is kept; the other one is handed
    /// back to be dropped. If the rendering worker later discards its result,
    /// [`TileCacheGuard::cancel_reservation`] returns the parked command so
    /// the request is not lost.
    pub fn park(&mut self, command: RenderCommand) -> Option<RenderCommand> {
        let Some(slot) = self.inner.reserved.get_mut(command.key()) else {
            return Some(command);
        };
        let parked_is_newer = slot
            .as_ref()
            .is_some_and(|parked| parked.sequence() >= command.sequence());
        if parked_is_newer {
            Some(command)
        } else {
            slot.replace(command)
        }
    }

    /// Give back a reservation without committing a tile, returning the
    /// command parked on it, if any.
    pub fn cancel_reservation(&mut self, key: &TileKey) -> Option<RenderCommand> {
        self.inner.reserved.remove(key).flatten()
    }

    pub fn is_reserved(&self, key: &TileKey) -> bool {
        self.inner.reserved.contains_key(key)
    }

    /// Number of keys currently reserved by rendering workers.
    pub fn reserved_count(&self) -> usize {
        self.inner.reserved.len()
    }

    /// Evict the least recently committed tile. Returns `false` if the cache
    /// was empty.
    pub fn evict_oldest(&mut self) -> bool {
        let evicted = self.inner.evict_oldest().is_some();
        self.inner.stats.entry_count = self.inner.tiles.len();
        evicted
    }

    /// Remove every tile, returning each target to the pool exactly once.
    ///
    /// Reservations are left alone; the workers holding them still resolve
    /// them on commit or discard.
    pub fn clear(&mut self) -> usize {
        let inner = &mut *self.inner;
        let count = inner.tiles.len();
        inner.order.clear();
        for (_, entry) in inner.tiles.drain() {
            entry.tile.release();
        }
        inner.stats.record_removal(count as u64);
        inner.stats.entry_count = 0;
        count
    }

    pub fn len(&self) -> usize {
        self.inner.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.tiles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Change the capacity, evicting the oldest tiles if the cache shrinks
    /// below its current size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn set_capacity(&mut self, capacity: usize) {
        assert!(capacity > 0, "capacity must be > 0");
        let inner = &mut *self.inner;
        inner.capacity = capacity;
        while inner.tiles.len() > capacity {
            inner.evict_oldest();
        }
        inner.stats.entry_count = inner.tiles.len();
    }

    /// Cached keys, oldest commit first.
    pub fn keys(&self) -> Vec<TileKey> {
        self.inner.order.values().copied().collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats.clone()
    }
}
