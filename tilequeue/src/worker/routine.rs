//! The render worker loop.
//!
//! ```text
//! Idle ─▶ Fetch ─▶ Validate ─▶ Acquire ─▶ Render ─▶ Commit ─▶ Notify ─▶ Idle
//!           │          │           │                   │
//!           │          └─ stale / cached / in flight ──┴─▶ (discard)
//!           └─ cancelled ─────────┴─▶ Stopped
//! ```
//!
//! One worker runs per render context. Stale and cancelled commands are
//! normal outcomes of scrolling and zooming; they are counted and logged at
//! trace or debug level, never reported as errors.

use super::{SuspendGate, WorkerSlot, WorkerState};
use crate::cache::{Reservation, TileCache};
use crate::coordinator::{ListenerList, RenderStats};
use crate::geometry::{PixelRect, ScreenTransform};
use crate::log::Logger;
use crate::pool::{PooledTarget, RenderTargetPool};
use crate::queue::{CommandQueue, Popped, RenderCommand};
use crate::render::{PaintContext, RenderContext, Rgba};
use crate::tile::{CachedTile, InfoLayer};
use crate::{log_debug, log_error, log_trace};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Transparent border left around every tile so neighbouring tiles can be
/// composited without seams.
pub const TILE_BORDER_PX: i32 = 1;

/// Drawing parameters shared by all workers of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerSettings {
    pub inflation_px: f64,
    pub visual_scale: f64,
    pub background: Rgba,
    pub notify_on_drain: bool,
}

/// What happened to one dequeued command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed { duration: Duration },
    /// Sequence fell behind, at dequeue or at commit
    Stale,
    AlreadyCached,
    /// Another worker is rendering the same key
    Duplicate,
    Cancelled,
    /// The drawing routine panicked
    Failed,
    /// The pool was cancelled while waiting for a target
    Stopped,
}

/// Everything one worker thread needs. Consumed by [`RenderWorker::run`].
pub struct RenderWorker {
    pub(crate) index: usize,
    pub(crate) commands: Arc<CommandQueue>,
    pub(crate) cache: Arc<TileCache>,
    pub(crate) pool: RenderTargetPool,
    pub(crate) sequence: Arc<AtomicU64>,
    pub(crate) lifecycle: CancellationToken,
    pub(crate) gate: Arc<SuspendGate>,
    pub(crate) slot: Arc<WorkerSlot>,
    pub(crate) context: Arc<dyn RenderContext>,
    pub(crate) listeners: Arc<ListenerList>,
    pub(crate) stats: Arc<RenderStats>,
    pub(crate) logger: Arc<dyn Logger>,
    pub(crate) settings: WorkerSettings,
}

impl RenderWorker {
    /// Run until the command queue or the gate is cancelled.
    pub fn run(self) {
        self.context.make_current();
        log_debug!(self.logger, "render worker {} started", self.index);

        loop {
            self.slot.set_state(WorkerState::Fetch);
            let command = match self.commands.pop_front(true) {
                Popped::Item(command) => command,
                Popped::Empty => continue,
                Popped::Cancelled => break,
            };

            if !self.gate.enter() {
                // Shutting down before validation; the next run takes it
                self.commands.push_front(command);
                break;
            }
            let outcome = self.process(command);
            self.record(outcome);

            if outcome == Outcome::Stopped {
                self.gate.leave();
                break;
            }

            let drained = self.settings.notify_on_drain && self.commands.is_empty();
            if matches!(outcome, Outcome::Committed { .. }) || drained {
                self.slot.set_state(WorkerState::Notify);
                if drained {
                    self.stats.record_drain();
                }
                self.notify_listeners();
            }
            self.gate.leave();
            self.slot.set_state(WorkerState::Idle);
        }

        self.slot.set_state(WorkerState::Stopped);
        self.context.end_thread_drawing();
        log_debug!(self.logger, "render worker {} stopped", self.index);
    }

    fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Validate, render and commit one command.
    fn process(&self, mut command: RenderCommand) -> Outcome {
        let key = *command.key();

        self.slot.set_state(WorkerState::Validate);
        {
            let mut cache = self.cache.lock();
            if command.sequence() < self.current_sequence() {
                return Outcome::Stale;
            }
            match cache.check_and_reserve(&key) {
                Reservation::Reserved => {}
                Reservation::AlreadyCached => return Outcome::AlreadyCached,
                Reservation::InFlight => {
                    cache.park(command);
                    return Outcome::Duplicate;
                }
            }
        }

        self.slot.set_state(WorkerState::Acquire);
        let Some(mut target) = self.acquire_target() else {
            let parked = self.cache.lock().cancel_reservation(&key);
            self.commands.push_front(command);
            if let Some(parked) = parked {
                self.requeue(parked);
            }
            return Outcome::Stopped;
        };

        self.slot.set_state(WorkerState::Render);
        let token = self.lifecycle.child_token();
        command.attach_cancel(token.clone());
        self.slot.begin_render(token.clone());
        let rendered = self.render(&command, &mut target, &token);
        self.slot.end_render();

        self.slot.set_state(WorkerState::Commit);
        let outcome = {
            let mut cache = self.cache.lock();
            let cancelled = command.is_cancelled();
            let current = command.sequence() >= self.current_sequence();
            match rendered {
                Some((info_layer, transform, duration)) if !cancelled && current => {
                    let tile = CachedTile::new(key, target, info_layer, transform, duration);
                    if let Some(evicted) = cache.add_tile(key, tile) {
                        log_trace!(self.logger, "evicted {} to make room for {}", evicted, key);
                    }
                    Outcome::Committed { duration }
                }
                rendered => {
                    if let Some(parked) = cache.cancel_reservation(&key) {
                        self.requeue(parked);
                    }
                    target.release();
                    if rendered.is_none() {
                        Outcome::Failed
                    } else if cancelled {
                        Outcome::Cancelled
                    } else {
                        Outcome::Stale
                    }
                }
            }
        };

        if matches!(outcome, Outcome::Committed { .. }) {
            // A worker waiting for a target can now reclaim this tile
            self.pool.notify_reclaimable();
        }
        outcome
    }

    /// Put back a command that asked for a key while it was being rendered
    /// by a render that is now discarded. Only stale commands are dropped;
    /// during shutdown the command waits in the queue for the next start.
    fn requeue(&self, command: RenderCommand) {
        if command.sequence() < self.current_sequence() {
            return;
        }
        log_trace!(
            self.logger,
            "worker {} requeued {} for sequence {}",
            self.index,
            command.key(),
            command.sequence()
        );
        self.commands.push(command);
    }

    /// Take a target from the pool, reclaiming the oldest cached tile when
    /// the pool is empty. Returns `None` once the pool is cancelled.
    fn acquire_target(&self) -> Option<PooledTarget> {
        loop {
            let epoch = self.pool.epoch();
            match self.pool.acquire(false) {
                Popped::Item(target) => return Some(target),
                Popped::Cancelled => return None,
                Popped::Empty => {}
            }

            if self.cache.lock().evict_oldest() {
                log_trace!(self.logger, "worker {} reclaimed a cached tile", self.index);
                continue;
            }

            if !self.pool.wait_for_change(epoch) {
                return None;
            }
        }
    }

    /// Draw the command into `target`.
    ///
    /// Returns `None` if the drawing routine panicked. A cancelled render
    /// still returns its partial result; the commit step discards it.
    fn render(
        &self,
        command: &RenderCommand,
        target: &mut PooledTarget,
        token: &CancellationToken,
    ) -> Option<(InfoLayer, ScreenTransform, Duration)> {
        let key = command.key();
        let (width, height) = target.get().size();
        let render_rect = PixelRect::from_size(width, height).shrink(TILE_BORDER_PX);
        let transform = ScreenTransform::from_rect(*key.rect(), render_rect);
        let visible =
            transform.inflated_geo_rect(self.settings.inflation_px * self.settings.visual_scale);
        let mut info_layer = InfoLayer::new();

        if token.is_cancelled() {
            return Some((info_layer, transform, Duration::ZERO));
        }

        let started = Instant::now();
        self.context
            .begin_frame(target.get_mut(), &render_rect, self.settings.background);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut paint = PaintContext::new(
                target.get_mut(),
                &mut info_layer,
                token,
                self.index,
                self.settings.visual_scale,
            );
            command
                .renderer()
                .render(&mut paint, &transform, &visible, key.draw_scale());
        }));

        self.context.end_frame(target.get_mut());
        let duration = started.elapsed();

        match result {
            Ok(()) => Some((info_layer, transform, duration)),
            Err(_) => {
                log_error!(
                    self.logger,
                    "worker {}: drawing routine panicked while rendering {}",
                    self.index,
                    key
                );
                None
            }
        }
    }

    fn record(&self, outcome: Outcome) {
        match outcome {
            Outcome::Committed { duration } => {
                self.stats.record_committed(duration);
            }
            Outcome::Stale => {
                self.stats.record_stale();
                log_trace!(self.logger, "worker {} dropped a stale command", self.index);
            }
            Outcome::AlreadyCached => self.stats.record_cached(),
            Outcome::Duplicate => self.stats.record_duplicate(),
            Outcome::Cancelled => {
                self.stats.record_cancelled();
                log_debug!(self.logger, "worker {} render cancelled", self.index);
            }
            Outcome::Failed => self.stats.record_failed(),
            Outcome::Stopped => {}
        }
    }

    fn notify_listeners(&self) {
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        for listener in listeners {
            listener.invalidate();
        }
    }
}
