//! The single dispatcher thread.
//!
//! One thread per [`crate::Scheduler`] owns the due-time registry and is
//! the only thread that ever pops a due schedule and hands it off (to a
//! pool, or to a freshly spawned thread). This is what gives the
//! scheduler's ordering guarantees: the dispatcher only ever considers
//! one schedule at a time, in due-time order.
//!
//! Grounded on the mutex+condvar wait/wait_timeout loop shape used by
//! simple interval timers in the wild (wait indefinitely when idle, wait
//! with a timeout equal to the next deadline when one is armed, and
//! re-check the registry on every wakeup since it may have changed under
//! us). The REDESIGN FLAG calling for an explicit shutdown handshake
//! instead of a fixed grace sleep is implemented as `DispatcherPhase`:
//! `stop`/`free` block on `phase_cond` until the dispatcher has actually
//! observed the stop request and exited its loop, rather than sleeping a
//! fixed guess and hoping the dispatcher got there first.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use std::sync::Arc;

use crate::clock::now_ns;
use crate::registry::Registry;
use crate::schedule::Schedule;

/// Where the dispatcher currently is in its loop. Observable from
/// `stop`/`free` so they can block until shutdown has actually completed
/// instead of guessing how long it takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatcherPhase {
    /// Executing or about to execute an iteration of the loop.
    Running,
    /// Parked on the state condvar, waiting for new work, a re-arm, or a
    /// stop request.
    Idle,
    /// The loop has returned; the thread is about to terminate.
    Exited,
}

pub(crate) struct State {
    pub(crate) registry: Registry,
    pub(crate) stop_requested: bool,
}

impl State {
    pub(crate) fn new() -> State {
        State {
            registry: Registry::new(),
            stop_requested: false,
        }
    }
}

pub(crate) struct Phase {
    phase: Mutex<DispatcherPhase>,
    cond: Condvar,
}

impl Phase {
    pub(crate) fn new() -> Phase {
        Phase {
            phase: Mutex::new(DispatcherPhase::Running),
            cond: Condvar::new(),
        }
    }

    fn set(&self, phase: DispatcherPhase) {
        *self.phase.lock().unwrap() = phase;
        self.cond.notify_all();
    }

    /// Blocks until the dispatcher reports it has exited.
    pub(crate) fn wait_for_exit(&self) {
        let guard = self.phase.lock().unwrap();
        let _ = self
            .cond
            .wait_while(guard, |phase| *phase != DispatcherPhase::Exited)
            .unwrap();
    }
}

/// Runs the dispatch loop until `state.stop_requested` is observed.
/// `dispatch` is called with the due schedule; it already has whatever
/// it needs (pool, logger) via closure capture, so this loop only deals
/// with timing and registry bookkeeping.
pub(crate) fn run(
    state: &Mutex<State>,
    cond: &Condvar,
    phase: &Phase,
    mut dispatch: impl FnMut(&mut MutexGuard<'_, State>, Arc<Schedule>),
) {
    let mut guard = state.lock().unwrap();
    loop {
        if guard.stop_requested {
            phase.set(DispatcherPhase::Exited);
            return;
        }

        match guard.registry.earliest() {
            None => {
                phase.set(DispatcherPhase::Idle);
                guard = cond.wait(guard).unwrap();
                phase.set(DispatcherPhase::Running);
            }
            Some((key, schedule)) => {
                let now = now_ns();
                let due = key.due_ns();
                if due > now {
                    let timeout = Duration::from_nanos(due - now);
                    phase.set(DispatcherPhase::Idle);
                    let (g, _timed_out) = cond.wait_timeout(guard, timeout).unwrap();
                    guard = g;
                    phase.set(DispatcherPhase::Running);
                    // Re-peek regardless of whether we woke on timeout
                    // or notification: a reset/delete may have changed
                    // what's earliest while we were parked.
                } else if guard.registry.pop(key).is_some() {
                    dispatch(&mut guard, schedule);
                }
            }
        }
    }
}
