//! The render queue coordinator.
//!
//! Owns the command queue, the tile cache, the sequence counter and the
//! worker threads. The host drives it from its UI thread:
//!
//! ```text
//! viewport changes ──▶ request_viewport ──▶ bump_sequence + submit
//!                                              │
//!                         ┌────────────────────┘
//!                         ▼
//!                  CommandQueue ──▶ render-worker-0..N ──▶ TileCache
//!                                                   │
//!                              InvalidateListener ◀─┘
//! ```

use super::{
    InvalidateListener, ListenerList, RenderQueueConfig, RenderQueueError, RenderStats,
    RenderStatsSnapshot,
};
use crate::cache::TileCache;
use crate::geometry::GeoRect;
use crate::log::{Logger, TracingLogger};
use crate::pool::RenderTargetPool;
use crate::queue::{CommandQueue, RenderCommand};
use crate::render::{RenderContext, TileRenderer};
use crate::tile::{TileKey, Tiler};
use crate::worker::{RenderWorker, SuspendGate, WorkerSettings, WorkerSlot, WorkerState};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Worker threads and the resources they were started with.
struct Running {
    lifecycle: CancellationToken,
    pool: RenderTargetPool,
    contexts: Vec<Arc<dyn RenderContext>>,
    slots: Vec<Arc<WorkerSlot>>,
    handles: Vec<JoinHandle<()>>,
}

/// Schedules tile renders on a fixed set of worker threads and caches the
/// results.
///
/// Commands carry the sequence number current when they were submitted.
/// [`RenderQueue::bump_sequence`] makes every older command stale; stale
/// commands are dropped when a worker dequeues them and can never commit.
pub struct RenderQueue {
    commands: Arc<CommandQueue>,
    cache: Arc<TileCache>,
    sequence: Arc<AtomicU64>,
    listeners: Arc<ListenerList>,
    gate: Arc<SuspendGate>,
    stats: Arc<RenderStats>,
    logger: Arc<dyn Logger>,
    config: RenderQueueConfig,
    running: Mutex<Option<Running>>,
}

impl RenderQueue {
    /// Create a stopped queue that logs worker events through `tracing`.
    pub fn new(config: RenderQueueConfig) -> Self {
        Self::with_logger(config, Arc::new(TracingLogger::with_component("render-worker")))
    }

    pub fn with_logger(config: RenderQueueConfig, logger: Arc<dyn Logger>) -> Self {
        let initial_capacity = config.cache_capacity().unwrap_or(usize::MAX);
        Self {
            commands: Arc::new(CommandQueue::new()),
            cache: Arc::new(TileCache::new(initial_capacity)),
            sequence: Arc::new(AtomicU64::new(0)),
            listeners: Arc::new(RwLock::new(Vec::new())),
            gate: Arc::new(SuspendGate::new()),
            stats: Arc::new(RenderStats::new()),
            logger,
            config,
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RenderQueueConfig {
        &self.config
    }

    // =========================================================================
    // Submission and sequencing
    // =========================================================================

    /// Queue a render of `key` tagged with `sequence`.
    ///
    /// # Panics
    ///
    /// Panics if `key` does not describe a valid rectangle.
    pub fn submit(&self, renderer: Arc<dyn TileRenderer>, key: TileKey, sequence: u64) {
        assert!(key.is_valid(), "cannot render invalid tile key {}", key);
        self.commands.push(RenderCommand::new(key, renderer, sequence));
        self.stats.record_submitted(1);
    }

    /// Advance the sequence, making every queued and in-flight command with
    /// an older sequence stale. Returns the new sequence.
    ///
    /// The counter moves under the cache lock, so a worker committing at the
    /// same time either commits before the bump or sees the new value.
    pub fn bump_sequence(&self) -> u64 {
        let _cache = self.cache.lock();
        self.sequence.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Replace the current viewport.
    ///
    /// Bumps the sequence, covers `viewport` with tiles of level
    /// `tile_scale`, and submits every tile not already cached, centre
    /// first. Returns the new sequence.
    pub fn request_viewport(
        &self,
        renderer: Arc<dyn TileRenderer>,
        tiler: &Tiler,
        viewport: &GeoRect,
        tile_scale: u8,
        draw_scale: u8,
    ) -> u64 {
        let sequence = self.bump_sequence();
        let keys = tiler.cover(viewport, tile_scale, draw_scale);
        let total = keys.len();

        let missing: Vec<TileKey> = {
            let cache = self.cache.lock();
            keys.into_iter().filter(|key| !cache.has_tile(key)).collect()
        };

        for key in &missing {
            self.submit(Arc::clone(&renderer), *key, sequence);
        }

        debug!(
            sequence,
            tiles = total,
            submitted = missing.len(),
            "Viewport requested"
        );
        sequence
    }

    /// Commands waiting in the queue, stale ones included.
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawn one worker thread per render context.
    ///
    /// The cache capacity becomes the configured capacity capped at the pool
    /// capacity. Contexts are kept for the lifetime of the run.
    pub fn start(
        &self,
        contexts: Vec<Arc<dyn RenderContext>>,
        pool: RenderTargetPool,
        visual_scale: f64,
    ) -> Result<(), RenderQueueError> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(RenderQueueError::AlreadyRunning);
        }
        if contexts.is_empty() {
            return Err(RenderQueueError::NoContexts);
        }
        if !visual_scale.is_finite() || visual_scale <= 0.0 {
            return Err(RenderQueueError::InvalidVisualScale(visual_scale));
        }

        let capacity = self.config.effective_cache_capacity(pool.capacity());
        self.cache.lock().set_capacity(capacity);

        self.commands.clear_cancelled();
        pool.clear_cancelled();
        self.gate.reset();

        let lifecycle = CancellationToken::new();
        let settings = WorkerSettings {
            inflation_px: self.config.inflation_px(),
            visual_scale,
            background: self.config.background(),
            notify_on_drain: self.config.notify_on_drain(),
        };

        let mut run = Running {
            lifecycle: lifecycle.clone(),
            pool: pool.clone(),
            contexts: contexts.clone(),
            slots: Vec::with_capacity(contexts.len()),
            handles: Vec::with_capacity(contexts.len()),
        };

        for (index, context) in contexts.into_iter().enumerate() {
            let slot = Arc::new(WorkerSlot::new(index));
            let worker = RenderWorker {
                index,
                commands: Arc::clone(&self.commands),
                cache: Arc::clone(&self.cache),
                pool: pool.clone(),
                sequence: Arc::clone(&self.sequence),
                lifecycle: lifecycle.clone(),
                gate: Arc::clone(&self.gate),
                slot: Arc::clone(&slot),
                context,
                listeners: Arc::clone(&self.listeners),
                stats: Arc::clone(&self.stats),
                logger: Arc::clone(&self.logger),
                settings,
            };

            let spawned = thread::Builder::new()
                .name(format!("render-worker-{}", index))
                .spawn(move || {
                    let _span = tracing::info_span!("render_worker", worker = index).entered();
                    worker.run();
                });

            match spawned {
                Ok(handle) => {
                    run.slots.push(slot);
                    run.handles.push(handle);
                }
                Err(e) => {
                    error!(worker = index, error = %e, "Failed to spawn render worker");
                    self.shutdown(run);
                    return Err(RenderQueueError::Spawn(e));
                }
            }
        }

        info!(
            threads = run.handles.len(),
            render_targets = pool.capacity(),
            cache_capacity = capacity,
            tile_size = ?pool.tile_size(),
            "Render queue started"
        );
        *running = Some(run);
        Ok(())
    }

    /// Cancel everything and wait for every worker to exit.
    ///
    /// In-flight renders are cancelled through their tokens, blocked workers
    /// are woken, and the call returns once all worker threads have been
    /// joined. Queued commands stay in the queue until the next start or
    /// [`RenderQueue::stop`], together with any request that was parked
    /// behind a cancelled render or taken by a worker that had not started
    /// drawing it yet.
    pub fn cancel_all(&self) {
        let Some(run) = self.running.lock().take() else {
            return;
        };
        let threads = run.handles.len();
        self.shutdown(run);
        info!(threads, "Render queue cancelled");
    }

    fn shutdown(&self, run: Running) {
        run.lifecycle.cancel();
        self.commands.cancel_all();
        run.pool.cancel();
        self.gate.cancel();

        for handle in run.handles {
            let name = handle.thread().name().map(str::to_owned);
            if handle.join().is_err() {
                error!(thread = ?name, "Render worker panicked");
            }
        }
    }

    /// Stop the workers, drop queued commands and release every cached tile.
    pub fn stop(&self) {
        self.cancel_all();
        let dropped = self.commands.drain().len();
        let released = self.cache.lock().clear();
        info!(dropped, released, "Render queue stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    fn contexts(&self) -> Vec<Arc<dyn RenderContext>> {
        self.running
            .lock()
            .as_ref()
            .map(|run| run.contexts.clone())
            .unwrap_or_default()
    }

    /// Pause rendering while the application is in the background.
    ///
    /// Waits until no worker is between validation and notification, then
    /// tells every context to release the hardware. Worker threads stay
    /// alive, blocked before their next command.
    pub fn suspend(&self) {
        if !self.is_running() {
            return;
        }
        self.gate.suspend();
        for context in self.contexts() {
            context.enter_background();
        }
        info!("Render queue suspended");
    }

    pub fn resume(&self) {
        for context in self.contexts() {
            context.enter_foreground();
        }
        self.gate.resume();
        info!("Render queue resumed");
    }

    pub fn is_suspended(&self) -> bool {
        self.gate.is_suspended()
    }

    /// Drop every cached tile and ask each context to free what it can.
    pub fn on_memory_pressure(&self) {
        let released = self.cache.lock().clear();
        for context in self.contexts() {
            context.memory_warning();
        }
        warn!(released, "Memory pressure: tile cache cleared");
    }

    /// Cancel the renders currently in progress without stopping the
    /// workers. Returns how many were cancelled.
    pub fn cancel_in_flight(&self) -> usize {
        let slots: Vec<Arc<WorkerSlot>> = self
            .running
            .lock()
            .as_ref()
            .map(|run| run.slots.clone())
            .unwrap_or_default();

        let cancelled = slots.iter().filter(|slot| slot.cancel_in_flight()).count();
        debug!(cancelled, "Cancelled in-flight renders");
        cancelled
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Register a listener invoked after tiles are committed.
    pub fn add_listener<L>(&self, listener: L)
    where
        L: InvalidateListener + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    pub fn tile_cache(&self) -> Arc<TileCache> {
        Arc::clone(&self.cache)
    }

    /// The pool of the current run, if running.
    pub fn pool(&self) -> Option<RenderTargetPool> {
        self.running.lock().as_ref().map(|run| run.pool.clone())
    }

    pub fn stats(&self) -> RenderStatsSnapshot {
        self.stats.snapshot()
    }

    /// State of each worker, by index. Empty when stopped.
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.running
            .lock()
            .as_ref()
            .map(|run| run.slots.iter().map(|slot| slot.state()).collect())
            .unwrap_or_default()
    }
}

impl Drop for RenderQueue {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
