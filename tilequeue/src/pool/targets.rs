//! Bounded pool of reusable render targets.
//!
//! The host builds every target up front (they are expensive hardware
//! surfaces) and hands them to [`RenderTargetPool::new`]. Workers take a
//! target with [`RenderTargetPool::acquire`] and get a [`PooledTarget`]
//! back; the handle is move-only, so a target is returned to the pool exactly
//! once, either explicitly through [`PooledTarget::release`] or when the
//! handle is dropped.

use super::target::RenderTarget;
use crate::queue::{BlockingQueue, Popped};
use crate::worker::TILE_BORDER_PX;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct PoolShared {
    free: BlockingQueue<Box<dyn RenderTarget>>,
    capacity: usize,
    tile_size: (u32, u32),
    outstanding: AtomicUsize,
    peak_outstanding: AtomicUsize,
}

impl PoolShared {
    /// Updates the peak counter if current exceeds it.
    fn update_peak(&self, current: usize) {
        let mut peak = self.peak_outstanding.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_outstanding.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    fn give_back(&self, target: Box<dyn RenderTarget>) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
        self.free.push(target);
    }
}

/// Bounded set of render targets with blocking acquire.
///
/// Cloning the pool yields another handle to the same set of targets.
#[derive(Clone)]
pub struct RenderTargetPool {
    shared: Arc<PoolShared>,
}

impl RenderTargetPool {
    /// Creates a pool owning `targets`.
    ///
    /// # Panics
    ///
    /// Panics if `targets` is empty, the targets differ in size, or they
    /// leave no pixels inside the tile border.
    pub fn new(targets: Vec<Box<dyn RenderTarget>>) -> Self {
        assert!(!targets.is_empty(), "capacity must be > 0");
        let tile_size = targets[0].size();
        assert!(
            targets.iter().all(|t| t.size() == tile_size),
            "all render targets must share one size"
        );
        let border = 2 * TILE_BORDER_PX as u32;
        assert!(
            tile_size.0 > border && tile_size.1 > border,
            "render targets must be larger than {}px per side",
            border
        );

        let capacity = targets.len();
        let free = BlockingQueue::new();
        for target in targets {
            free.push(target);
        }

        Self {
            shared: Arc::new(PoolShared {
                free,
                capacity,
                tile_size,
                outstanding: AtomicUsize::new(0),
                peak_outstanding: AtomicUsize::new(0),
            }),
        }
    }

    /// Takes a target from the pool.
    ///
    /// With `should_wait` the call blocks until a target is returned or the
    /// pool is cancelled.
    pub fn acquire(&self, should_wait: bool) -> Popped<PooledTarget> {
        match self.shared.free.pop_front(should_wait) {
            Popped::Item(target) => {
                let current = self.shared.outstanding.fetch_add(1, Ordering::AcqRel) + 1;
                self.shared.update_peak(current);
                Popped::Item(PooledTarget {
                    target: Some(target),
                    pool: Arc::clone(&self.shared),
                })
            }
            Popped::Empty => Popped::Empty,
            Popped::Cancelled => Popped::Cancelled,
        }
    }

    /// Wake every blocked acquirer with [`Popped::Cancelled`].
    pub fn cancel(&self) {
        self.shared.free.cancel_all();
    }

    /// Allow acquisition again after [`RenderTargetPool::cancel`].
    pub fn clear_cancelled(&self) {
        self.shared.free.clear_cancelled();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.free.is_cancelled()
    }

    /// Total number of targets owned by the pool.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Number of targets currently waiting in the pool.
    pub fn available(&self) -> usize {
        self.shared.free.len()
    }

    /// Number of targets currently handed out.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::Acquire)
    }

    /// Highest number of targets handed out at the same time.
    pub fn peak_outstanding(&self) -> usize {
        self.shared.peak_outstanding.load(Ordering::Relaxed)
    }

    /// Size shared by every target, `(width, height)` in pixels.
    pub fn tile_size(&self) -> (u32, u32) {
        self.shared.tile_size
    }

    /// Change counter for [`RenderTargetPool::wait_for_change`].
    pub fn epoch(&self) -> u64 {
        self.shared.free.epoch()
    }

    /// Wake waiters because a target may have become reclaimable elsewhere.
    ///
    /// Called after a tile is committed to the cache: a worker that found
    /// both the pool and the cache empty can now evict that tile.
    pub fn notify_reclaimable(&self) {
        self.shared.free.notify();
    }

    /// Block until a target is returned, [`notify_reclaimable`] is called, or
    /// the pool is cancelled. Returns `false` on cancel.
    ///
    /// [`notify_reclaimable`]: RenderTargetPool::notify_reclaimable
    pub fn wait_for_change(&self, seen_epoch: u64) -> bool {
        self.shared.free.wait_for_change(seen_epoch)
    }
}

impl fmt::Debug for RenderTargetPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTargetPool")
            .field(
                "outstanding",
                &format_args!("{}/{}", self.outstanding(), self.capacity()),
            )
            .field("tile_size", &self.shared.tile_size)
            .finish()
    }
}

/// A render target checked out of a [`RenderTargetPool`].
///
/// While this handle lives the target counts against the pool's capacity.
pub struct PooledTarget {
    target: Option<Box<dyn RenderTarget>>,
    pool: Arc<PoolShared>,
}

impl PooledTarget {
    /// Return the target to its pool.
    pub fn release(mut self) {
        if let Some(target) = self.target.take() {
            self.pool.give_back(target);
        }
    }

    /// Identifier of the wrapped target.
    pub fn id(&self) -> usize {
        self.get().id()
    }

    pub fn get(&self) -> &dyn RenderTarget {
        // Only `release` and `drop` take the target, and both consume the handle
        match self.target.as_deref() {
            Some(target) => target,
            None => unreachable!("pooled target used after release"),
        }
    }

    pub fn get_mut(&mut self) -> &mut dyn RenderTarget {
        match self.target.as_deref_mut() {
            Some(target) => target,
            None => unreachable!("pooled target used after release"),
        }
    }
}

impl Drop for PooledTarget {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            self.pool.give_back(target);
        }
    }
}

impl fmt::Debug for PooledTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledTarget")
            .field("target", &self.target)
            .finish()
    }
}
