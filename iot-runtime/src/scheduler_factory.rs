//! Glue factory wiring `scheduler_core::Scheduler` into the container as
//! a named component.
//!
//! Not named in the original external-interfaces table — SPEC_FULL §4.5
//! supplements it as the load-bearing piece that makes the "Scheduler
//! factory configuration" (`Logger`/`Affinity`/`Priority` keys) the spec
//! describes actually resolve to a running scheduler.

use std::any::Any;
use std::sync::Arc;

use component_container::{Component, ComponentFactory, ConfigLoader, Container, ContainerError};
use scheduler_core::{Logger, NullLogger, Scheduler};
use serde_json::Value;

use crate::logger_factory::LoggerComponent;

/// A running [`Scheduler`] wired into the container's start/stop
/// lifecycle.
pub struct SchedulerComponent {
    scheduler: Arc<Scheduler>,
}

impl SchedulerComponent {
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }
}

impl Component for SchedulerComponent {
    fn start(&self) {
        self.scheduler.start();
    }

    fn stop(&self) {
        self.scheduler.stop();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Reads the spec's "Scheduler factory configuration" keys and builds a
/// [`SchedulerComponent`] bound to the named logger component.
///
/// | key | meaning |
/// |---|---|
/// | `Logger` | name of a `Logger` component in the same container; falls back to a null logger if absent or not found |
/// | `Affinity` | accepted and parsed for forward compatibility; `std::thread` has no portable affinity API, so this has no effect today |
/// | `Priority` | accepted and parsed for forward compatibility; per-schedule priority (via `ScheduleSpec::with_priority`) is what scheduler-core actually consumes |
pub struct SchedulerFactory;

impl ComponentFactory for SchedulerFactory {
    fn type_name(&self) -> &str {
        "Scheduler"
    }

    fn config_fn(
        &self,
        container: &Container,
        loader: &dyn ConfigLoader,
        config: &Value,
    ) -> Result<Arc<dyn Component>, ContainerError> {
        let logger = resolve_logger(container, loader, config);

        // Parsed for schema completeness; see the factory's doc comment
        // for why neither currently changes scheduler behavior.
        let _priority = config.get("Priority").and_then(Value::as_i64);
        let _affinity = config.get("Affinity").and_then(Value::as_i64);

        Ok(Arc::new(SchedulerComponent {
            scheduler: Scheduler::new(Some(logger)),
        }))
    }

    fn free_fn(&self, component: &Arc<dyn Component>) {
        // Scheduler::stop is idempotent; calling it here gives teardown
        // a deterministic point instead of relying on whichever thread
        // happens to drop the last Arc<SchedulerComponent>.
        component.stop();
    }
}

fn resolve_logger(container: &Container, loader: &dyn ConfigLoader, config: &Value) -> Arc<dyn Logger> {
    let Some(name) = config.get("Logger").and_then(Value::as_str) else {
        return Arc::new(NullLogger);
    };

    match container
        .find_component(name, Some(loader))
        .and_then(|component| component.as_any().downcast_ref::<LoggerComponent>().map(LoggerComponent::logger))
    {
        Some(logger) => logger,
        None => {
            tracing::warn!(logger = name, "named logger component not found, falling back to a null logger");
            Arc::new(NullLogger)
        }
    }
}
