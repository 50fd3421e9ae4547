//! Thread-safe FIFO with cancellable blocking pop.
//!
//! The same queue type carries render commands to workers and idle render
//! targets inside the pool. Waiters block on a condition variable until an
//! item is pushed or [`BlockingQueue::cancel_all`] broadcasts a cancel. There
//! are no timeouts anywhere.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Result of a pop or wait on a [`BlockingQueue`].
#[derive(Debug)]
pub enum Popped<T> {
    /// An item was taken from the front of the queue.
    Item(T),
    /// The queue was empty and the caller asked not to wait.
    Empty,
    /// The queue has been cancelled.
    Cancelled,
}

impl<T> Popped<T> {
    /// Returns the item, if any.
    pub fn item(self) -> Option<T> {
        match self {
            Popped::Item(item) => Some(item),
            Popped::Empty | Popped::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Popped::Cancelled)
    }
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    cancelled: bool,
    /// Bumped on every push and explicit notify
    epoch: u64,
}

/// FIFO queue whose pop can block until work arrives or a cancel fires.
#[derive(Debug)]
pub struct BlockingQueue<T> {
    state: Mutex<QueueState<T>>,
    /// Signalled when an item is pushed
    items_cond: Condvar,
    /// Signalled when the epoch moves
    change_cond: Condvar,
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingQueue<T> {
    /// Create an empty, non-cancelled queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                cancelled: false,
                epoch: 0,
            }),
            items_cond: Condvar::new(),
            change_cond: Condvar::new(),
        }
    }

    /// Append an item to the tail and wake one waiter.
    ///
    /// Items pushed while the queue is cancelled are kept and become visible
    /// once the cancel flag is cleared.
    pub fn push(&self, item: T) {
        let mut state = self.state.lock();
        state.items.push_back(item);
        state.epoch = state.epoch.wrapping_add(1);
        drop(state);
        self.items_cond.notify_one();
        self.change_cond.notify_all();
    }

    /// Put an item back at the front, ahead of everything queued.
    ///
    /// Used for an item that was taken but could not be processed. Like
    /// [`BlockingQueue::push`] this works while the queue is cancelled.
    pub fn push_front(&self, item: T) {
        let mut state = self.state.lock();
        state.items.push_front(item);
        state.epoch = state.epoch.wrapping_add(1);
        drop(state);
        self.items_cond.notify_one();
        self.change_cond.notify_all();
    }

    /// Take the item at the front of the queue.
    ///
    /// With `should_wait` the call blocks while the queue is empty. A cancel
    /// broadcast ends the wait with [`Popped::Cancelled`]; while the queue
    /// stays cancelled every pop returns `Cancelled` immediately.
    pub fn pop_front(&self, should_wait: bool) -> Popped<T> {
        let mut state = self.state.lock();
        loop {
            if state.cancelled {
                return Popped::Cancelled;
            }
            if let Some(item) = state.items.pop_front() {
                return Popped::Item(item);
            }
            if !should_wait {
                return Popped::Empty;
            }
            self.items_cond.wait(&mut state);
        }
    }

    /// Set the cancelled flag and wake every waiter.
    pub fn cancel_all(&self) {
        let mut state = self.state.lock();
        state.cancelled = true;
        drop(state);
        self.items_cond.notify_all();
        self.change_cond.notify_all();
    }

    /// Clear the cancelled flag so pops succeed again.
    pub fn clear_cancelled(&self) {
        self.state.lock().cancelled = false;
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Remove and return every queued item.
    pub fn drain(&self) -> Vec<T> {
        self.state.lock().items.drain(..).collect()
    }

    /// Current change counter.
    ///
    /// Read it before inspecting other shared state, then pass it to
    /// [`BlockingQueue::wait_for_change`] to sleep without missing a push
    /// or notify that happened in between.
    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Bump the change counter and wake every waiter without pushing.
    pub fn notify(&self) {
        let mut state = self.state.lock();
        state.epoch = state.epoch.wrapping_add(1);
        drop(state);
        self.change_cond.notify_all();
    }

    /// Block until the change counter moves past `seen` or the queue is cancelled.
    ///
    /// Returns `false` if the wait ended because of a cancel.
    pub fn wait_for_change(&self, seen: u64) -> bool {
        let mut state = self.state.lock();
        while state.epoch == seen && !state.cancelled {
            self.change_cond.wait(&mut state);
        }
        !state.cancelled
    }
}
