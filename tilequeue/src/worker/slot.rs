//! Per-worker shared state.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio_util::sync::CancellationToken;

/// Stage of the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkerState {
    Idle = 0,
    /// Waiting for a command
    Fetch = 1,
    /// Checking sequence and cache under the cache lock
    Validate = 2,
    /// Waiting for a render target
    Acquire = 3,
    Render = 4,
    Commit = 5,
    /// Invalidating listeners
    Notify = 6,
    Stopped = 7,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Fetch,
            2 => WorkerState::Validate,
            3 => WorkerState::Acquire,
            4 => WorkerState::Render,
            5 => WorkerState::Commit,
            6 => WorkerState::Notify,
            7 => WorkerState::Stopped,
            _ => WorkerState::Idle,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Idle => "idle",
            WorkerState::Fetch => "fetch",
            WorkerState::Validate => "validate",
            WorkerState::Acquire => "acquire",
            WorkerState::Render => "render",
            WorkerState::Commit => "commit",
            WorkerState::Notify => "notify",
            WorkerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// State a worker publishes for the coordinator: its loop stage and the
/// cancel token of the command it is rendering.
#[derive(Debug)]
pub struct WorkerSlot {
    index: usize,
    state: AtomicU8,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl WorkerSlot {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            state: AtomicU8::new(WorkerState::Idle as u8),
            in_flight: Mutex::new(None),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Publish the token of the command about to be rendered.
    pub fn begin_render(&self, token: CancellationToken) {
        *self.in_flight.lock() = Some(token);
    }

    pub fn end_render(&self) {
        *self.in_flight.lock() = None;
    }

    /// Cancel the command being rendered, if any. Returns true if a render
    /// was in flight.
    pub fn cancel_in_flight(&self) -> bool {
        match self.in_flight.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_rendering(&self) -> bool {
        self.in_flight.lock().is_some()
    }
}
