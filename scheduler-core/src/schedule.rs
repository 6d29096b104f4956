//! A [`Schedule`]: a standing intent to invoke a work function at one or
//! more future deadlines.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::pool::TaskPool;

/// The opaque argument passed to a schedule's work function, run callback
/// and abort callback. `Arc` rather than a bare `Box` because the same
/// argument is read by every occurrence of a recurring schedule, and by
/// whichever thread or pool worker ends up running a given occurrence.
pub type Arg = Arc<dyn Any + Send + Sync>;

/// The work function itself. Called with the schedule's argument on every
/// due occurrence; never consumes the argument, since a recurring
/// schedule calls it again next period.
pub type WorkFn = Arc<dyn Fn(&Arg) + Send + Sync>;

/// Invoked just before a dispatch attempt, or when a dispatch attempt was
/// dropped by the pool.
pub type Callback = Box<dyn Fn(&Arg) + Send + Sync>;

/// Invoked on `Schedule` destruction with ownership of the argument, if
/// one was supplied. This is the schedule's destructor hook: the default
/// (no `free_fn`) just lets the `Arc<dyn Any>` drop normally.
pub type FreeFn = Box<dyn FnOnce(Arg) + Send>;

/// Fields mutated only while the owning scheduler's mutex is held. See
/// `Scheduler`'s doc comment for why these live behind a per-schedule
/// `Mutex` rather than the scheduler's own lock directly: it keeps
/// `Schedule` safely `Send + Sync` without `unsafe`, at the cost of one
/// redundant (but always uncontended, since callers already hold the
/// outer lock) lock acquisition per access.
struct Mutable {
    start: u64,
    period: u64,
    repeat: u64,
    scheduled: bool,
    run_cb: Option<Callback>,
    abort_cb: Option<Callback>,
}

/// A persistent intent to invoke `function` at one or more future
/// deadlines. See the crate-level documentation for the full data model.
pub struct Schedule {
    id: u64,
    owner: u64,
    function: WorkFn,
    arg: Arg,
    free_fn: Mutex<Option<FreeFn>>,
    pool: Option<Arc<dyn TaskPool>>,
    priority: i32,
    dropped: AtomicU64,
    state: Mutex<Mutable>,
}

impl Schedule {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: u64,
        owner: u64,
        function: WorkFn,
        arg: Arg,
        free_fn: Option<FreeFn>,
        period: u64,
        start: u64,
        repeat: u64,
        pool: Option<Arc<dyn TaskPool>>,
        priority: i32,
    ) -> Arc<Schedule> {
        assert!(
            repeat == 1 || period > 0,
            "schedule period must be > 0 unless repeat == 1 (one-shot)"
        );
        Arc::new(Schedule {
            id,
            owner,
            function,
            arg,
            free_fn: Mutex::new(free_fn),
            pool,
            priority,
            dropped: AtomicU64::new(0),
            state: Mutex::new(Mutable {
                start,
                period,
                repeat,
                scheduled: false,
                run_cb: None,
                abort_cb: None,
            }),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn owner(&self) -> u64 {
        self.owner
    }

    pub fn start(&self) -> u64 {
        self.state.lock().unwrap().start
    }

    pub(crate) fn set_start(&self, start: u64) {
        self.state.lock().unwrap().start = start;
    }

    pub fn period(&self) -> u64 {
        self.state.lock().unwrap().period
    }

    pub fn repeat(&self) -> u64 {
        self.state.lock().unwrap().repeat
    }

    pub fn is_scheduled(&self) -> bool {
        self.state.lock().unwrap().scheduled
    }

    pub(crate) fn set_scheduled(&self, scheduled: bool) {
        self.state.lock().unwrap().scheduled = scheduled;
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn pool(&self) -> Option<&Arc<dyn TaskPool>> {
        self.pool.as_ref()
    }

    pub fn function(&self) -> &WorkFn {
        &self.function
    }

    pub fn arg(&self) -> &Arg {
        &self.arg
    }

    /// Number of occurrences dropped because the pool refused admission.
    /// Read without the scheduler lock, matching the spec: this is the
    /// one field observers may read lock-free.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Acquire)
    }

    pub(crate) fn record_drop(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::AcqRel)
    }

    pub fn set_run_callback(&self, cb: Callback) {
        self.state.lock().unwrap().run_cb = Some(cb);
    }

    pub fn set_abort_callback(&self, cb: Callback) {
        self.state.lock().unwrap().abort_cb = Some(cb);
    }

    pub(crate) fn invoke_run_callback(&self) {
        let guard = self.state.lock().unwrap();
        if let Some(cb) = guard.run_cb.as_ref() {
            cb(&self.arg);
        }
    }

    pub(crate) fn invoke_abort_callback(&self) {
        let guard = self.state.lock().unwrap();
        if let Some(cb) = guard.abort_cb.as_ref() {
            cb(&self.arg);
        }
    }

    /// Decrements `repeat` if finite. Returns the remaining count (0 means
    /// the schedule has just exhausted its repeats and must retire to the
    /// idle map).
    pub(crate) fn consume_repeat(&self) -> Option<u64> {
        let mut guard = self.state.lock().unwrap();
        if guard.repeat == 0 {
            None // infinite
        } else {
            guard.repeat -= 1;
            Some(guard.repeat)
        }
    }
}

impl Drop for Schedule {
    fn drop(&mut self) {
        if let Some(free_fn) = self.free_fn.lock().unwrap().take() {
            free_fn(Arc::clone(&self.arg));
        }
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedule")
            .field("id", &self.id)
            .field("start", &self.start())
            .field("period", &self.period())
            .field("repeat", &self.repeat())
            .field("scheduled", &self.is_scheduled())
            .field("dropped", &self.dropped())
            .finish()
    }
}
