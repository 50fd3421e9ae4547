//! Integration tests for the render queue.
//!
//! These tests drive real worker threads and verify:
//! - Tiles are rendered, committed and announced to listeners
//! - Sequence bumps make queued and in-flight work stale
//! - The cache never holds more tiles than the pool has targets
//! - Cancellation stops in-flight renders without committing them
//! - Suspend, resume and memory pressure hooks
//! - Exactly one render per key, with parked duplicates requeued

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar};
use std::thread;
use std::time::{Duration, Instant};
use tilequeue::cache::TileCache;
use tilequeue::coordinator::{RenderQueue, RenderQueueConfig};
use tilequeue::geometry::{GeoRect, PixelRect, ScreenTransform};
use tilequeue::log::{LogLevel, MemoryLogger};
use tilequeue::pool::{MemoryTarget, RenderTarget, RenderTargetPool};
use tilequeue::render::{renderer_fn, RenderContext, Rgba, SoftwareContext, TileRenderer};
use tilequeue::tile::{CachedTile, InfoLayer, TileKey, Tiler};
use tilequeue::worker::WorkerState;

// =============================================================================
// Test Helpers
// =============================================================================

const TIMEOUT: Duration = Duration::from_secs(5);

fn pool_of(n: usize) -> RenderTargetPool {
    RenderTargetPool::new(
        (0..n)
            .map(|i| Box::new(MemoryTarget::new(i, 16, 16)) as Box<dyn RenderTarget>)
            .collect(),
    )
}

fn software_contexts(n: usize) -> (Vec<Arc<SoftwareContext>>, Vec<Arc<dyn RenderContext>>) {
    let concrete: Vec<Arc<SoftwareContext>> =
        (0..n).map(|_| Arc::new(SoftwareContext::new())).collect();
    let dynamic = concrete
        .iter()
        .map(|c| Arc::clone(c) as Arc<dyn RenderContext>)
        .collect();
    (concrete, dynamic)
}

fn contexts(n: usize) -> Vec<Arc<dyn RenderContext>> {
    software_contexts(n).1
}

fn key(col: u32) -> TileKey {
    let x = col as f64;
    TileKey::new(GeoRect::new(x, 0.0, x + 1.0, 1.0), 1)
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn fill_renderer(color: Rgba) -> Arc<dyn TileRenderer> {
    renderer_fn(move |paint, transform, _visible, _draw_scale| {
        let rect = *transform.pixel_rect();
        if let Some(target) = paint.memory_target() {
            target.fill_rect(&rect, color);
        }
    })
}

fn counting_listener(queue: &RenderQueue) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    queue.add_listener(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    count
}

/// One-shot gate a drawing routine can block on.
#[derive(Default)]
struct Latch {
    open: std::sync::Mutex<bool>,
    cond: Condvar,
}

impl Latch {
    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cond.wait(open).unwrap();
        }
    }

    fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cond.notify_all();
    }
}

/// Renderer that signals when it starts and blocks until the latch opens.
fn blocking_renderer(started: Arc<AtomicUsize>, latch: Arc<Latch>) -> Arc<dyn TileRenderer> {
    renderer_fn(move |_, _, _, _| {
        started.fetch_add(1, Ordering::SeqCst);
        latch.wait();
    })
}

/// Renderer that spins until its render is cancelled.
fn until_cancelled_renderer(started: Arc<AtomicUsize>) -> Arc<dyn TileRenderer> {
    renderer_fn(move |paint, _, _, _| {
        started.fetch_add(1, Ordering::SeqCst);
        while !paint.is_cancelled() {
            thread::sleep(Duration::from_millis(1));
        }
    })
}

// =============================================================================
// Rendering and commit
// =============================================================================

#[test]
fn test_submitted_tiles_are_committed_and_announced() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    let notified = counting_listener(&queue);
    queue.start(contexts(2), pool_of(8), 1.0).unwrap();

    let seq = queue.current_sequence();
    let red = Rgba::opaque(255, 0, 0);
    for col in 0..4 {
        queue.submit(fill_renderer(red), key(col), seq);
    }

    assert!(wait_until(|| queue.stats().committed == 4));
    assert!(notified.load(Ordering::SeqCst) >= 4);

    let cache = queue.tile_cache();
    let cache = cache.lock();
    assert_eq!(cache.len(), 4);
    for col in 0..4 {
        let tile = cache.tile(&key(col)).expect("tile should be cached");
        let pixels = tile
            .target()
            .as_any()
            .downcast_ref::<MemoryTarget>()
            .expect("memory target");
        assert_eq!(pixels.pixel(8, 8), Some(red));
        assert_eq!(pixels.pixel(0, 0), Some(Rgba::TRANSPARENT));
    }
}

#[test]
fn test_request_viewport_skips_cached_tiles() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    queue.start(contexts(2), pool_of(16), 1.0).unwrap();

    let tiler = Tiler::new(GeoRect::new(0.0, 0.0, 16.0, 16.0));
    let viewport = GeoRect::new(0.0, 0.0, 8.0, 8.0);
    let renderer = fill_renderer(Rgba::opaque(0, 0, 255));

    let first = queue.request_viewport(Arc::clone(&renderer), &tiler, &viewport, 2, 2);
    assert_eq!(queue.stats().submitted, 4);
    assert!(wait_until(|| queue.stats().committed == 4));

    let second = queue.request_viewport(renderer, &tiler, &viewport, 2, 2);
    assert_eq!(second, first + 1);
    assert_eq!(queue.stats().submitted, 4);
}

#[test]
fn test_readd_reports_newest_tile() {
    let pool = pool_of(3);
    let cache = TileCache::new(3);
    let k = key(0);
    let transform = ScreenTransform::from_rect(*k.rect(), PixelRect::from_size(16, 16));

    let first = pool.acquire(false).item().unwrap();
    let first_id = first.id();
    let mut guard = cache.lock();
    guard.add_tile(
        k,
        CachedTile::new(k, first, InfoLayer::new(), transform, Duration::ZERO),
    );
    assert!(guard.has_tile(&k));

    let second = pool.acquire(false).item().unwrap();
    let second_id = second.id();
    guard.add_tile(
        k,
        CachedTile::new(k, second, InfoLayer::new(), transform, Duration::ZERO),
    );

    assert_ne!(first_id, second_id);
    assert_eq!(guard.tile(&k).unwrap().target_id(), second_id);
    assert_eq!(guard.len(), 1);
    assert_eq!(pool.outstanding(), 1);
}

#[test]
fn test_insert_beyond_capacity_evicts_exactly_one() {
    let pool = pool_of(3);
    let cache = TileCache::new(2);
    let mut guard = cache.lock();

    for col in 0..3 {
        let k = key(col);
        let target = pool.acquire(false).item().unwrap();
        let transform = ScreenTransform::from_rect(*k.rect(), PixelRect::from_size(16, 16));
        let evicted = guard.add_tile(
            k,
            CachedTile::new(k, target, InfoLayer::new(), transform, Duration::ZERO),
        );
        if col < 2 {
            assert!(evicted.is_none());
        } else {
            assert_eq!(evicted, Some(key(0)));
        }
    }

    assert_eq!(guard.len(), 2);
    assert_eq!(guard.stats().evictions, 1);
    assert_eq!(pool.outstanding(), 2);
}

#[test]
fn test_cache_never_exceeds_pool_capacity() {
    let queue = RenderQueue::new(RenderQueueConfig::new().with_cache_capacity(100));
    let pool = pool_of(3);
    queue.start(contexts(3), pool.clone(), 1.0).unwrap();
    assert_eq!(queue.tile_cache().lock().capacity(), 3);

    let seq = queue.current_sequence();
    for col in 0..10 {
        queue.submit(fill_renderer(Rgba::WHITE), key(col), seq);
    }

    assert!(wait_until(|| queue.stats().committed == 10));
    assert!(queue.tile_cache().lock().len() <= 3);
    assert!(pool.peak_outstanding() <= pool.capacity());
}

#[test]
fn test_single_target_renders_do_not_overlap() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    let pool = pool_of(1);
    queue.start(contexts(2), pool.clone(), 1.0).unwrap();

    let intervals: Arc<Mutex<Vec<(Instant, Instant)>>> = Arc::new(Mutex::new(Vec::new()));
    let renderer = {
        let intervals = Arc::clone(&intervals);
        renderer_fn(move |_, _, _, _| {
            let start = Instant::now();
            thread::sleep(Duration::from_millis(20));
            intervals.lock().push((start, Instant::now()));
        })
    };

    let seq = queue.current_sequence();
    queue.submit(Arc::clone(&renderer), key(0), seq);
    queue.submit(renderer, key(1), seq);

    assert!(wait_until(|| queue.stats().committed == 2));
    let mut held = intervals.lock().clone();
    held.sort();
    assert_eq!(held.len(), 2);
    assert!(held[0].1 <= held[1].0, "render target held twice at once");
    assert_eq!(pool.peak_outstanding(), 1);
    assert_eq!(queue.tile_cache().lock().len(), 1);
}

// =============================================================================
// Sequencing
// =============================================================================

#[test]
fn test_bump_before_dequeue_commits_nothing() {
    let logger = Arc::new(MemoryLogger::new());
    let queue = RenderQueue::with_logger(RenderQueueConfig::new(), logger.clone());

    let seq = queue.bump_sequence();
    assert_eq!(seq, 1);
    queue.submit(fill_renderer(Rgba::WHITE), key(0), seq);
    assert_eq!(queue.bump_sequence(), 2);

    queue.start(contexts(1), pool_of(2), 1.0).unwrap();
    assert!(wait_until(|| queue.stats().stale == 1));

    assert!(!queue.tile_cache().lock().has_tile(&key(0)));
    assert_eq!(queue.stats().committed, 0);
    assert_eq!(logger.count_at_least(LogLevel::Warn), 0);
}

#[test]
fn test_bump_discards_in_flight_and_queued_work() {
    let logger = Arc::new(MemoryLogger::new());
    let queue = RenderQueue::with_logger(RenderQueueConfig::new(), logger.clone());
    queue.start(contexts(1), pool_of(8), 1.0).unwrap();

    let started = Arc::new(AtomicUsize::new(0));
    let latch = Arc::new(Latch::default());
    let renderer = blocking_renderer(Arc::clone(&started), Arc::clone(&latch));

    let seq = queue.current_sequence();
    for col in 0..5 {
        queue.submit(Arc::clone(&renderer), key(col), seq);
    }

    assert!(wait_until(|| started.load(Ordering::SeqCst) == 1));
    queue.bump_sequence();
    latch.open();

    assert!(wait_until(|| queue.stats().processed() == 5));
    let stats = queue.stats();
    assert_eq!(stats.committed, 0);
    assert_eq!(stats.stale, 5);
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert!(queue.tile_cache().lock().is_empty());
    assert_eq!(logger.count_at_least(LogLevel::Warn), 0);
}

// =============================================================================
// Duplicates
// =============================================================================

#[test]
fn test_each_key_renders_once() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    queue.start(contexts(4), pool_of(8), 1.0).unwrap();

    let renders: Arc<Mutex<HashMap<TileKey, usize>>> = Arc::new(Mutex::new(HashMap::new()));
    let renderer = {
        let renders = Arc::clone(&renders);
        renderer_fn(move |_, transform, _, _| {
            thread::sleep(Duration::from_millis(10));
            let k = TileKey::new(*transform.geo_rect(), 1);
            *renders.lock().entry(k).or_insert(0) += 1;
        })
    };

    let seq = queue.current_sequence();
    for _ in 0..8 {
        queue.submit(Arc::clone(&renderer), key(0), seq);
    }

    assert!(wait_until(|| queue.stats().processed() == 8));
    let stats = queue.stats();
    assert_eq!(stats.committed, 1);
    assert_eq!(stats.duplicates + stats.already_cached, 7);
    assert_eq!(renders.lock().values().sum::<usize>(), 1);
}

#[test]
fn test_parked_request_survives_stale_render() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    queue.start(contexts(2), pool_of(4), 1.0).unwrap();

    let started = Arc::new(AtomicUsize::new(0));
    let latch = Arc::new(Latch::default());

    let old = queue.current_sequence();
    queue.submit(
        blocking_renderer(Arc::clone(&started), Arc::clone(&latch)),
        key(0),
        old,
    );
    assert!(wait_until(|| started.load(Ordering::SeqCst) == 1));

    let new = queue.bump_sequence();
    queue.submit(fill_renderer(Rgba::BLACK), key(0), new);
    assert!(wait_until(|| queue.stats().duplicates == 1));

    latch.open();
    assert!(wait_until(|| queue.tile_cache().lock().has_tile(&key(0))));
    let stats = queue.stats();
    assert_eq!(stats.stale, 1);
    assert_eq!(stats.committed, 1);
    assert_eq!(queue.tile_cache().lock().reserved_count(), 0);
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_cancel_all_mid_render_commits_nothing() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    let (software, dynamic) = software_contexts(2);
    let pool = pool_of(4);
    queue.start(dynamic, pool.clone(), 1.0).unwrap();

    let started = Arc::new(AtomicUsize::new(0));
    queue.submit(
        until_cancelled_renderer(Arc::clone(&started)),
        key(0),
        queue.current_sequence(),
    );
    assert!(wait_until(|| started.load(Ordering::SeqCst) == 1));

    queue.cancel_all();

    assert!(!queue.is_running());
    assert!(queue.worker_states().is_empty());
    assert!(!queue.tile_cache().lock().has_tile(&key(0)));
    assert_eq!(queue.stats().cancelled, 1);
    assert_eq!(pool.outstanding(), 0);
    assert!(software.iter().all(|c| c.is_finished()));
}

#[test]
fn test_restart_after_cancel_all() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    let pool = pool_of(4);
    queue.start(contexts(1), pool.clone(), 1.0).unwrap();
    queue.cancel_all();

    queue.submit(fill_renderer(Rgba::WHITE), key(3), queue.current_sequence());
    queue.start(contexts(1), pool, 1.0).unwrap();
    assert!(wait_until(|| queue.tile_cache().lock().has_tile(&key(3))));
}

#[test]
fn test_parked_request_survives_cancel_all_and_restart() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    queue.start(contexts(2), pool_of(4), 1.0).unwrap();

    let started = Arc::new(AtomicUsize::new(0));
    let seq = queue.current_sequence();
    queue.submit(until_cancelled_renderer(Arc::clone(&started)), key(0), seq);
    assert!(wait_until(|| started.load(Ordering::SeqCst) == 1));

    queue.submit(fill_renderer(Rgba::WHITE), key(0), seq);
    assert!(wait_until(|| queue.stats().duplicates == 1));

    queue.cancel_all();
    assert_eq!(queue.stats().cancelled, 1);
    assert_eq!(queue.pending_commands(), 1);
    assert!(!queue.tile_cache().lock().has_tile(&key(0)));

    queue.start(contexts(2), pool_of(4), 1.0).unwrap();
    assert!(wait_until(|| queue.tile_cache().lock().has_tile(&key(0))));
    assert_eq!(started.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cancel_in_flight_keeps_workers_running() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    queue.start(contexts(1), pool_of(4), 1.0).unwrap();

    let started = Arc::new(AtomicUsize::new(0));
    let seq = queue.current_sequence();
    queue.submit(until_cancelled_renderer(Arc::clone(&started)), key(0), seq);
    assert!(wait_until(|| started.load(Ordering::SeqCst) == 1));

    assert_eq!(queue.cancel_in_flight(), 1);
    assert!(wait_until(|| queue.stats().cancelled == 1));

    queue.submit(fill_renderer(Rgba::WHITE), key(1), seq);
    assert!(wait_until(|| queue.tile_cache().lock().has_tile(&key(1))));
    assert!(!queue.tile_cache().lock().has_tile(&key(0)));
    assert!(queue.is_running());
}

#[test]
fn test_panicking_renderer_is_contained() {
    let logger = Arc::new(MemoryLogger::new());
    let queue = RenderQueue::with_logger(RenderQueueConfig::new(), logger.clone());
    let pool = pool_of(2);
    queue.start(contexts(1), pool.clone(), 1.0).unwrap();

    let seq = queue.current_sequence();
    queue.submit(renderer_fn(|_, _, _, _| panic!("broken style")), key(0), seq);
    queue.submit(fill_renderer(Rgba::WHITE), key(1), seq);

    assert!(wait_until(|| queue.stats().committed == 1));
    assert_eq!(queue.stats().failed, 1);
    assert_eq!(logger.count_at(LogLevel::Error), 1);
    assert!(!queue.tile_cache().lock().is_reserved(&key(0)));
    assert_eq!(pool.outstanding(), 1);
}

// =============================================================================
// Host lifecycle hooks
// =============================================================================

#[test]
fn test_suspend_blocks_rendering_until_resume() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    let (software, dynamic) = software_contexts(1);
    queue.start(dynamic, pool_of(2), 1.0).unwrap();

    queue.suspend();
    assert!(queue.is_suspended());
    assert!(software[0].is_background());

    queue.submit(fill_renderer(Rgba::WHITE), key(0), queue.current_sequence());
    thread::sleep(Duration::from_millis(50));
    assert!(queue.tile_cache().lock().is_empty());

    queue.resume();
    assert!(!software[0].is_background());
    assert!(wait_until(|| queue.tile_cache().lock().has_tile(&key(0))));
}

#[test]
fn test_memory_pressure_releases_cached_targets() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    let (software, dynamic) = software_contexts(1);
    let pool = pool_of(4);
    queue.start(dynamic, pool.clone(), 1.0).unwrap();

    let seq = queue.current_sequence();
    queue.submit(fill_renderer(Rgba::WHITE), key(0), seq);
    queue.submit(fill_renderer(Rgba::WHITE), key(1), seq);
    assert!(wait_until(|| queue.stats().committed == 2));
    assert_eq!(pool.outstanding(), 2);

    queue.on_memory_pressure();
    assert!(queue.tile_cache().lock().is_empty());
    assert_eq!(pool.available(), 4);
    assert_eq!(software[0].memory_warnings(), 1);
}

#[test]
fn test_drain_notifies_listeners() {
    let queue = RenderQueue::new(RenderQueueConfig::new().with_notify_on_drain(true));
    let notified = counting_listener(&queue);

    let seq = queue.bump_sequence();
    queue.submit(fill_renderer(Rgba::WHITE), key(0), seq - 1);
    queue.start(contexts(1), pool_of(2), 1.0).unwrap();

    assert!(wait_until(|| notified.load(Ordering::SeqCst) == 1));
    assert_eq!(queue.stats().drains, 1);
    assert_eq!(queue.stats().committed, 0);
}

#[test]
fn test_stop_drops_queue_and_cache() {
    let queue = RenderQueue::new(RenderQueueConfig::new());
    let pool = pool_of(2);
    queue.start(contexts(1), pool.clone(), 1.0).unwrap();

    queue.submit(fill_renderer(Rgba::WHITE), key(0), queue.current_sequence());
    assert!(wait_until(|| queue.stats().committed == 1));
    assert!(wait_until(|| queue.worker_states() == vec![WorkerState::Fetch]));

    queue.stop();
    assert!(queue.tile_cache().lock().is_empty());
    assert_eq!(queue.pending_commands(), 0);
    assert_eq!(pool.available(), 2);
}
