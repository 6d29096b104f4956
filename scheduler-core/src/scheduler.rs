//! The public [`Scheduler`] type.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crate::dispatcher::{self, Phase, State};
use crate::logger::{Logger, NullLogger};
use crate::pool::TaskPool;
use crate::schedule::{Arg, FreeFn, Schedule, WorkFn};

static NEXT_SCHEDULER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SCHEDULE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide sequence for scheduler handles, so every `Schedule` knows
/// which scheduler created it without holding a cyclic `Arc` back to it.
fn next_scheduler_id() -> u64 {
    NEXT_SCHEDULER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Process-wide sequence for schedule ids. Per spec §3, a schedule's `id`
/// must be "unique for process lifetime" — shared across every
/// `Scheduler` in the process, not reset per scheduler, so two schedules
/// created by different schedulers can never collide.
fn next_schedule_id() -> u64 {
    NEXT_SCHEDULE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Describes a schedule to create. Constructed with [`ScheduleSpec::once`]
/// or [`ScheduleSpec::periodic`] and refined with the `with_*` builders;
/// mirrors the constructor-plus-setters shape the rest of this crate's
/// configuration types use.
pub struct ScheduleSpec {
    function: WorkFn,
    arg: Arg,
    free_fn: Option<FreeFn>,
    delay_ns: u64,
    period_ns: u64,
    repeat: u64,
    pool: Option<Arc<dyn TaskPool>>,
    priority: i32,
}

impl ScheduleSpec {
    /// A schedule that fires exactly once, `delay_ns` nanoseconds from
    /// now (0 meaning "as soon as the dispatcher gets to it").
    pub fn once(function: WorkFn, arg: Arg, delay_ns: u64) -> ScheduleSpec {
        ScheduleSpec {
            function,
            arg,
            free_fn: None,
            delay_ns,
            period_ns: 0,
            repeat: 1,
            pool: None,
            priority: 0,
        }
    }

    /// A schedule that fires every `period_ns` nanoseconds, starting
    /// `delay_ns` from now, `repeat` times (0 meaning unbounded).
    pub fn periodic(function: WorkFn, arg: Arg, delay_ns: u64, period_ns: u64, repeat: u64) -> ScheduleSpec {
        assert!(period_ns > 0, "a periodic schedule needs a positive period");
        ScheduleSpec {
            function,
            arg,
            free_fn: None,
            delay_ns,
            period_ns,
            repeat,
            pool: None,
            priority: 0,
        }
    }

    pub fn with_free_fn(mut self, free_fn: FreeFn) -> ScheduleSpec {
        self.free_fn = Some(free_fn);
        self
    }

    pub fn with_pool(mut self, pool: Arc<dyn TaskPool>) -> ScheduleSpec {
        self.pool = Some(pool);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> ScheduleSpec {
        self.priority = priority;
        self
    }
}

struct Shared {
    state: Mutex<State>,
    cond: Condvar,
    phase: Phase,
    logger: Arc<dyn Logger>,
    id: u64,
}

/// A running scheduler: a due-time registry plus the single dispatcher
/// thread that services it.
///
/// The spec's "one mutex guards both maps and the scheduler's own state"
/// requirement is realized as `Shared::state`. Each `Schedule` also keeps
/// a small internal mutex for its own mutable fields (see
/// [`crate::schedule::Schedule`]'s doc comment) — safe because every
/// access to those fields happens while `Shared::state` is already held,
/// so there is never a second lock taken out of order.
pub struct Scheduler {
    shared: Arc<Shared>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Starts a scheduler with its dispatcher thread already running.
    /// `logger` defaults to a [`NullLogger`] when `None`.
    pub fn new(logger: Option<Arc<dyn Logger>>) -> Arc<Scheduler> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::new()),
            cond: Condvar::new(),
            phase: Phase::new(),
            logger: logger.unwrap_or_else(|| Arc::new(NullLogger)),
            id: next_scheduler_id(),
        });

        let dispatch_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(format!("scheduler-{}-dispatch", shared.id))
            .spawn(move || {
                let shared = dispatch_shared;
                dispatcher::run(&shared.state, &shared.cond, &shared.phase, |guard, schedule| {
                    dispatch_one(&shared, guard, schedule);
                });
            })
            .expect("failed to spawn scheduler dispatcher thread");

        Arc::new(Scheduler {
            shared,
            dispatcher: Mutex::new(Some(handle)),
        })
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// No-op. The dispatcher thread is already servicing the registry by
    /// the time [`Scheduler::new`] returns, so the spec's
    /// INITIAL-to-RUNNING transition is collapsed into construction
    /// rather than split across `alloc` and a separate `start` call —
    /// there's no useful "allocated but not yet dispatching" state for a
    /// type whose constructor already owns a running thread. Kept as a
    /// real method so callers that wire a `Scheduler` through something
    /// generic over a start/stop lifecycle (see `component-container`)
    /// have a `start` to call.
    pub fn start(&self) {}

    /// Registers `spec` and arms it for its first due time. Returns the
    /// new schedule's handle. An `add` whose computed deadline is already
    /// in the past fires on the dispatcher's very next iteration rather
    /// than being rejected — this is deliberate, matching the documented
    /// "past-due add fires immediately" behavior.
    pub fn add(&self, spec: ScheduleSpec) -> Arc<Schedule> {
        let id = next_schedule_id();
        let due_ns = crate::clock::now_ns().saturating_add(spec.delay_ns);
        let schedule = Schedule::new(
            id,
            self.shared.id,
            spec.function,
            spec.arg,
            spec.free_fn,
            spec.period_ns,
            due_ns,
            spec.repeat,
            spec.pool,
            spec.priority,
        );

        let mut guard = self.shared.state.lock().unwrap();
        guard.registry.arm(Arc::clone(&schedule), due_ns);
        drop(guard);
        self.shared.cond.notify_all();
        schedule
    }

    /// Registers `spec` without arming it; the schedule sits idle until a
    /// caller arms it with [`Scheduler::reset`].
    pub fn create(&self, spec: ScheduleSpec) -> Arc<Schedule> {
        let id = next_schedule_id();
        let schedule = Schedule::new(
            id,
            self.shared.id,
            spec.function,
            spec.arg,
            spec.free_fn,
            spec.period_ns,
            0,
            spec.repeat,
            spec.pool,
            spec.priority,
        );
        let mut guard = self.shared.state.lock().unwrap();
        guard.registry.insert_idle(Arc::clone(&schedule));
        schedule
    }

    /// Re-arms an existing schedule `delay_ns` nanoseconds from now,
    /// whether it was idle or already waiting on an earlier deadline.
    ///
    /// Panics if `schedule` was created by a different `Scheduler` — the
    /// closest Rust analogue of the original's "programmer misuse ->
    /// fatal assertion" contract for an operation that takes a schedule
    /// handle directly rather than looking one up by id.
    pub fn reset(&self, schedule: &Arc<Schedule>, delay_ns: u64) {
        assert_eq!(
            schedule.owner(),
            self.shared.id,
            "schedule {} does not belong to scheduler {}",
            schedule.id(),
            self.shared.id
        );
        let due_ns = crate::clock::now_ns().saturating_add(delay_ns);
        schedule.set_start(due_ns);
        let mut guard = self.shared.state.lock().unwrap();
        guard.registry.arm(Arc::clone(schedule), due_ns);
        drop(guard);
        self.shared.cond.notify_all();
    }

    /// Moves an armed schedule back to idle without freeing it — the
    /// spec's `remove(sched)` (§4.4): `queue_remove` + `idle_add` under
    /// the lock. Returns `true` iff the schedule was actually armed (a
    /// transition occurred); a schedule that was already idle, or that
    /// doesn't exist, returns `false`. Distinct from [`Scheduler::delete`],
    /// which drops the schedule from the registry entirely.
    pub fn remove(&self, schedule_id: u64) -> bool {
        let mut guard = self.shared.state.lock().unwrap();
        let disarmed = guard.registry.disarm(schedule_id);
        drop(guard);
        if disarmed.is_some() {
            self.shared.cond.notify_all();
            true
        } else {
            false
        }
    }

    /// Removes a schedule entirely, whether idle or armed, and frees it.
    /// The abort callback is reserved for pool-refused occurrences (see
    /// [`dispatch_one`]); an explicit `delete` is not itself a dropped
    /// occurrence, so it does not fire here.
    pub fn delete(&self, schedule_id: u64) -> bool {
        let mut guard = self.shared.state.lock().unwrap();
        let removed = guard.registry.remove(schedule_id);
        drop(guard);
        if removed.is_some() {
            self.shared.cond.notify_all();
            true
        } else {
            false
        }
    }

    pub fn find(&self, schedule_id: u64) -> Option<Arc<Schedule>> {
        self.shared.state.lock().unwrap().registry.get(schedule_id)
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().unwrap().registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().unwrap().registry.is_empty()
    }

    /// Signals the dispatcher to stop and blocks until it has actually
    /// exited its loop. Idempotent: calling `stop` twice is harmless.
    pub fn stop(&self) {
        {
            let mut guard = self.shared.state.lock().unwrap();
            guard.stop_requested = true;
        }
        self.shared.cond.notify_all();
        self.shared.phase.wait_for_exit();

        if let Some(handle) = self.dispatcher.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
        // Dropping every remaining `Arc<Schedule>` here runs each
        // schedule's free_fn exactly once, satisfying "destroying a
        // scheduler invokes each schedule's free_fn on arg."
        let mut guard = self.shared.state.lock().unwrap();
        guard.registry.drain_all();
    }
}

/// Invoked by the dispatcher for each occurrence that comes due. Submits
/// to the schedule's pool if it has one, otherwise spawns a fresh thread
/// for the occurrence. Re-arms periodic schedules for their next
/// occurrence, or retires exhausted ones to idle.
fn dispatch_one(
    shared: &Arc<Shared>,
    guard: &mut std::sync::MutexGuard<'_, State>,
    schedule: Arc<Schedule>,
) {
    schedule.invoke_run_callback();

    let function = Arc::clone(schedule.function());
    let arg = Arc::clone(schedule.arg());
    let job_schedule = Arc::clone(&schedule);
    let job = Box::new(move || function(&arg)) as Box<dyn FnOnce() + Send>;

    let dispatched = match schedule.pool() {
        Some(pool) => pool.try_submit(job, schedule.priority()),
        None => {
            // No pool: every occurrence gets its own fresh thread rather
            // than running inline, so a slow work function never stalls
            // the dispatcher's own loop.
            thread::Builder::new()
                .name(format!("schedule-{}-run", job_schedule.id()))
                .spawn(job)
                .expect("failed to spawn schedule execution thread");
            true
        }
    };

    if !dispatched {
        job_schedule.invoke_abort_callback();
        let dropped_so_far = job_schedule.record_drop();
        if dropped_so_far == 0 {
            shared.logger.warn(&format!(
                "scheduler {}: schedule {} occurrence dropped, pool saturated",
                shared.id,
                job_schedule.id()
            ));
        }
    }

    match schedule.consume_repeat() {
        Some(0) => {
            // `schedule` was already popped out of the due map by the
            // dispatcher before calling us, so there is no due-map entry
            // left for `disarm` to find. Retire it to idle directly.
            schedule.set_scheduled(false);
            guard.registry.insert_idle(schedule);
        }
        Some(_) | None => {
            let next_due = crate::clock::now_ns().saturating_add(schedule.period());
            guard.registry.arm(Arc::clone(&schedule), next_due);
        }
    }
}
