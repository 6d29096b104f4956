//! In-process task scheduler.
//!
//! A [`Scheduler`] owns a single dispatcher thread and a registry of
//! [`Schedule`]s, each a standing intent to invoke a work function once
//! or periodically. Schedules may hand their occurrences off to a
//! [`TaskPool`] for concurrent execution, or have the dispatcher spawn a
//! fresh thread for the occurrence when no pool is attached.
//!
//! Ordering: schedules due at the same nanosecond fire in the order they
//! became due (FIFO tie-break), and the dispatcher only ever considers
//! one due schedule at a time, so occurrences from the same scheduler
//! never reorder relative to each other.

mod clock;
mod dispatcher;
mod logger;
mod pool;
mod registry;
mod schedule;
mod scheduler;

pub use clock::{monotonic_next_ns, now_ns, MonotonicClock};
pub use logger::{tracing_logger, Logger, NullLogger, TracingLogger};
pub use pool::{BoundedThreadPool, Job, TaskPool};
pub use schedule::{Arg, Callback, FreeFn, Schedule, WorkFn};
pub use scheduler::{ScheduleSpec, Scheduler};
