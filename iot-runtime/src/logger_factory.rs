//! The `Logger` component type: the named collaborator other factories
//! (chiefly [`crate::SchedulerFactory`]) resolve by name to get a
//! `scheduler_core::Logger` implementation wired through `tracing`.

use std::any::Any;
use std::sync::Arc;

use component_container::{Component, ComponentFactory, ConfigLoader, Container, ContainerError};
use scheduler_core::{tracing_logger, Logger};
use serde_json::Value;

/// Wraps a `scheduler_core::Logger` so it can sit in a container under a
/// name and be found by other components.
pub struct LoggerComponent {
    logger: Arc<dyn Logger>,
}

impl LoggerComponent {
    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::clone(&self.logger)
    }
}

impl Component for LoggerComponent {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds a `tracing`-backed [`LoggerComponent`]. Configuration:
///
/// | key | meaning |
/// |---|---|
/// | `Name` | tag attached to every event this logger emits; defaults to `"default"` |
pub struct LoggerFactory;

impl ComponentFactory for LoggerFactory {
    fn type_name(&self) -> &str {
        "Logger"
    }

    fn config_fn(
        &self,
        _container: &Container,
        _loader: &dyn ConfigLoader,
        config: &Value,
    ) -> Result<Arc<dyn Component>, ContainerError> {
        let name = config
            .get("Name")
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_string();
        Ok(Arc::new(LoggerComponent {
            logger: tracing_logger(name),
        }))
    }
}
