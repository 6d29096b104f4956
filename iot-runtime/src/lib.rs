//! Library surface behind the `iot-runtime` binary: the glue factories
//! that make `scheduler-core` reachable through `component-container`
//! configuration.

mod logger_factory;
mod scheduler_factory;

pub use logger_factory::{LoggerComponent, LoggerFactory};
pub use scheduler_factory::{SchedulerComponent, SchedulerFactory};
