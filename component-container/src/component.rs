//! The two seams every container-managed object is built from: the
//! [`Component`] lifecycle a container drives, and the [`ComponentFactory`]
//! that knows how to build one from parsed configuration.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::config::ConfigLoader;
use crate::container::Container;
use crate::error::ContainerError;

/// A container-managed object with start/stop lifecycle hooks.
///
/// `as_any` is the Rust realization of "the container doesn't need to
/// know a component's concrete type, but callers who looked it up by
/// name usually do" — `find_component` hands back `Arc<dyn Component>`,
/// and a caller downcasts through `as_any` to recover (for example) the
/// concrete `Scheduler` or `Logger` it asked for by name.
pub trait Component: Send + Sync {
    /// Called once, in container insertion order, by `Container::start`.
    fn start(&self) {}

    /// Called once, in the reverse of insertion order, by
    /// `Container::stop`. Must be safe to call more than once (the
    /// container calls it again from `delete_component`/`free` if a
    /// component was removed individually before the container itself
    /// was freed).
    fn stop(&self) {}

    fn as_any(&self) -> &dyn Any;
}

/// Describes how to construct and destroy components of one named type.
///
/// Mirrors the spec's "Component factory interface": a `type` key,
/// a `config_fn` that builds a component from a parsed configuration
/// map, and a `free_fn` that releases it. `free_fn` has a default no-op
/// implementation because most components release everything they own
/// through `Drop` on the last `Arc` reference; factories that need an
/// explicit teardown step (the scheduler factory, which must call
/// `Scheduler::stop` deterministically rather than whenever the last
/// clone happens to drop) override it.
pub trait ComponentFactory: Send + Sync {
    /// The factory key this instance answers to, matching the
    /// `component_type` string in container configuration.
    fn type_name(&self) -> &str;

    /// Builds a component from its parsed configuration. `loader` is the
    /// same configuration loader the container is being populated from,
    /// so a factory whose component depends on a sibling by name (the
    /// scheduler factory depends on a named `Logger`) can call
    /// `container.find_component(name, Some(loader))` to resolve and, if
    /// necessary, chain-load it.
    fn config_fn(
        &self,
        container: &Container,
        loader: &dyn ConfigLoader,
        config: &Value,
    ) -> Result<Arc<dyn Component>, ContainerError>;

    /// Releases a component this factory built. Called once, with the
    /// component already stopped, when it is removed individually or
    /// when its owning container is freed.
    fn free_fn(&self, _component: &Arc<dyn Component>) {}
}
