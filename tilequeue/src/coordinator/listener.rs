//! Screen invalidation callbacks.

use parking_lot::RwLock;
use std::sync::Arc;

/// Told to redraw the screen because new tiles are available.
///
/// Called from worker threads, outside any queue lock. Implementations
/// must be thread-safe or marshal the call to their UI thread. Any
/// `Fn()` closure implements this trait.
pub trait InvalidateListener: Send + Sync {
    fn invalidate(&self);
}

impl<F> InvalidateListener for F
where
    F: Fn() + Send + Sync,
{
    fn invalidate(&self) {
        self()
    }
}

/// Registered listeners, shared with the workers.
pub type ListenerList = RwLock<Vec<Arc<dyn InvalidateListener>>>;
