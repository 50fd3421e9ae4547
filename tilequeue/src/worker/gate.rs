//! Suspension gate between fetching a command and working on it.
//!
//! While the application is in the background no worker may touch the
//! hardware. Workers pass the gate after every fetch and leave it once the
//! command is fully handled; [`SuspendGate::suspend`] closes the gate and
//! waits for every worker inside to leave.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct GateState {
    suspended: bool,
    cancelled: bool,
    /// Workers currently past the gate
    busy: usize,
}

#[derive(Debug, Default)]
pub struct SuspendGate {
    state: Mutex<GateState>,
    cond: Condvar,
}

impl SuspendGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass the gate, blocking while it is closed.
    ///
    /// Returns `false` if the gate was cancelled; the caller must not call
    /// [`SuspendGate::leave`] in that case.
    pub fn enter(&self) -> bool {
        let mut state = self.state.lock();
        while state.suspended && !state.cancelled {
            self.cond.wait(&mut state);
        }
        if state.cancelled {
            return false;
        }
        state.busy += 1;
        true
    }

    pub fn leave(&self) {
        let mut state = self.state.lock();
        state.busy = state.busy.saturating_sub(1);
        drop(state);
        self.cond.notify_all();
    }

    /// Close the gate and wait until no worker is inside.
    pub fn suspend(&self) {
        let mut state = self.state.lock();
        state.suspended = true;
        while state.busy > 0 && !state.cancelled {
            self.cond.wait(&mut state);
        }
    }

    /// Reopen the gate.
    pub fn resume(&self) {
        self.state.lock().suspended = false;
        self.cond.notify_all();
    }

    /// Release everyone blocked on the gate; later `enter` calls fail.
    pub fn cancel(&self) {
        self.state.lock().cancelled = true;
        self.cond.notify_all();
    }

    /// Reset for a new run: open and not cancelled.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.cancelled = false;
        state.suspended = false;
        state.busy = 0;
    }

    pub fn is_suspended(&self) -> bool {
        self.state.lock().suspended
    }

    pub fn busy(&self) -> usize {
        self.state.lock().busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_open_gate_counts_busy() {
        let gate = SuspendGate::new();
        assert!(gate.enter());
        assert!(gate.enter());
        assert_eq!(gate.busy(), 2);
        gate.leave();
        gate.leave();
        assert_eq!(gate.busy(), 0);
    }

    #[test]
    fn test_suspend_waits_for_busy_workers() {
        let gate = Arc::new(SuspendGate::new());
        assert!(gate.enter());

        let suspended = Arc::new(AtomicBool::new(false));
        let suspender = {
            let gate = Arc::clone(&gate);
            let suspended = Arc::clone(&suspended);
            thread::spawn(move || {
                gate.suspend();
                suspended.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(30));
        assert!(!suspended.load(Ordering::SeqCst));

        gate.leave();
        suspender.join().unwrap();
        assert!(suspended.load(Ordering::SeqCst));
        assert!(gate.is_suspended());
    }

    #[test]
    fn test_closed_gate_blocks_until_resume() {
        let gate = Arc::new(SuspendGate::new());
        gate.suspend();

        let entered = Arc::new(AtomicBool::new(false));
        let worker = {
            let gate = Arc::clone(&gate);
            let entered = Arc::clone(&entered);
            thread::spawn(move || {
                let ok = gate.enter();
                entered.store(true, Ordering::SeqCst);
                ok
            })
        };

        thread::sleep(Duration::from_millis(30));
        assert!(!entered.load(Ordering::SeqCst));

        gate.resume();
        assert!(worker.join().unwrap());
        assert_eq!(gate.busy(), 1);
    }

    #[test]
    fn test_cancel_releases_blocked_enter() {
        let gate = Arc::new(SuspendGate::new());
        gate.suspend();

        let worker = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.enter())
        };

        thread::sleep(Duration::from_millis(20));
        gate.cancel();
        assert!(!worker.join().unwrap());

        gate.reset();
        assert!(!gate.is_suspended());
        assert!(gate.enter());
    }
}
