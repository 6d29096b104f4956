//! The [`Container`]: a named, insertion-ordered list of components
//! sharing start/stop sequencing, plus the process-wide [`Runtime`] that
//! tracks container names and registered factories.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use serde_json::Value;

use crate::component::{Component, ComponentFactory};
use crate::config::{parse_container_config, ConfigLoader};
use crate::dynamic::{DynamicLoader, NullDynamicLoader};
use crate::error::ContainerError;

thread_local! {
    /// Names currently being loaded by chained `find_component` calls on
    /// this thread. Cycle detection per the spec: a name already on this
    /// stack when `find_component` is asked to load it again means the
    /// configuration refers to itself, directly or transitively.
    static LOAD_STACK: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

struct LoadGuard {
    pushed: bool,
}

impl LoadGuard {
    /// Pushes `name` onto this thread's load stack unless it's already
    /// there, in which case it reports a cycle and pushes nothing (so
    /// the corresponding drop is a no-op).
    fn enter(name: &str) -> Result<LoadGuard, ContainerError> {
        LOAD_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|n| n == name) {
                return Err(ContainerError::Cycle(name.to_string()));
            }
            stack.push(name.to_string());
            Ok(LoadGuard { pushed: true })
        })
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        if self.pushed {
            LOAD_STACK.with(|stack| {
                stack.borrow_mut().pop();
            });
        }
    }
}

struct ComponentHolder {
    name: String,
    component: Arc<dyn Component>,
    factory: Arc<dyn ComponentFactory>,
}

/// Process-wide state: the factory registry and the set of live
/// container names. Explicit rather than a hidden `static` so tests can
/// run several independent runtimes in one process without contending
/// on a shared global (see `SPEC_FULL.md` §9, "Global state").
pub struct Runtime {
    factories: RwLock<HashMap<String, Arc<dyn ComponentFactory>>>,
    containers: RwLock<HashMap<String, Weak<Container>>>,
    dynamic_loader: Arc<dyn DynamicLoader>,
}

impl Runtime {
    pub fn new() -> Arc<Runtime> {
        Runtime::with_dynamic_loader(Arc::new(NullDynamicLoader))
    }

    pub fn with_dynamic_loader(dynamic_loader: Arc<dyn DynamicLoader>) -> Arc<Runtime> {
        Arc::new(Runtime {
            factories: RwLock::new(HashMap::new()),
            containers: RwLock::new(HashMap::new()),
            dynamic_loader,
        })
    }

    /// Registers a factory under its `type_name`. A second registration
    /// for a type that already has one is silently ignored — first wins.
    pub fn register_factory(&self, factory: Arc<dyn ComponentFactory>) {
        let mut guard = self.factories.write().unwrap();
        guard
            .entry(factory.type_name().to_string())
            .or_insert(factory);
    }

    fn factory(&self, type_name: &str) -> Option<Arc<dyn ComponentFactory>> {
        self.factories.read().unwrap().get(type_name).cloned()
    }

    /// Allocates a new, empty container under `name`. Returns `None` if
    /// a container of this name is already registered in the process.
    pub fn alloc_container(self: &Arc<Runtime>, name: impl Into<String>) -> Option<Arc<Container>> {
        let name = name.into();
        let mut guard = self.containers.write().unwrap();
        if guard.contains_key(&name) {
            return None;
        }
        let container = Arc::new(Container {
            runtime: Arc::clone(self),
            name: name.clone(),
            holders: RwLock::new(Vec::new()),
        });
        guard.insert(name, Arc::downgrade(&container));
        Some(container)
    }

    fn unregister_container(&self, name: &str) {
        self.containers.write().unwrap().remove(name);
    }

    /// Every container currently registered in this runtime, in no
    /// particular order. Mirrors the spec's "link into a process-global
    /// list of all containers" — here that list lives on the explicit
    /// `Runtime` rather than a hidden process global.
    pub fn containers(&self) -> Vec<Arc<Container>> {
        self.containers
            .read()
            .unwrap()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

/// An ordered, named collection of components sharing start/stop
/// sequencing. Built by [`Runtime::alloc_container`]; populated by
/// [`Container::init`] from configuration, or directly via
/// [`Container::insert`] for host code that constructs components
/// without going through the JSON/factory path.
pub struct Container {
    runtime: Arc<Runtime>,
    name: String,
    holders: RwLock<Vec<ComponentHolder>>,
}

impl Container {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directly registers an already-built component under `name`,
    /// skipping the config/factory lookup. `factory` is retained only so
    /// `free_fn` can still be invoked on removal or teardown.
    pub fn insert(
        &self,
        name: impl Into<String>,
        component: Arc<dyn Component>,
        factory: Arc<dyn ComponentFactory>,
    ) {
        self.holders.write().unwrap().push(ComponentHolder {
            name: name.into(),
            component,
            factory,
        });
    }

    /// Loads this container's configuration (`component_name ->
    /// component_type`) and builds each entry's component in a single
    /// pass: a registry miss falls back to the dynamic loader before the
    /// component is given up on. (The original two-pass iteration —
    /// dynamic-load pre-pass, then load pass, both over the same
    /// iterator — left the second pass with nothing to see; see
    /// `SPEC_FULL.md` §9.)
    pub fn init(&self, loader: &dyn ConfigLoader) {
        let Some(raw) = loader.load(&self.name) else {
            tracing::warn!(container = %self.name, "no configuration found, container stays empty");
            return;
        };
        let entries = match parse_container_config(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(container = %self.name, error = %err, "failed to parse container configuration");
                return;
            }
        };

        for (component_name, component_type) in entries {
            if self.holders.read().unwrap().iter().any(|h| h.name == component_name) {
                continue;
            }
            match self.build_component(&component_name, &component_type, loader) {
                Ok((component, factory)) => {
                    self.holders.write().unwrap().push(ComponentHolder {
                        name: component_name,
                        component,
                        factory,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        container = %self.name,
                        component = %component_name,
                        error = %err,
                        "component not created"
                    );
                }
            }
        }
    }

    fn build_component(
        &self,
        component_name: &str,
        component_type: &str,
        loader: &dyn ConfigLoader,
    ) -> Result<(Arc<dyn Component>, Arc<dyn ComponentFactory>), ContainerError> {
        let raw_config = loader.load(component_name).unwrap_or_else(|| "{}".to_string());
        let config: Value = serde_json::from_str(&raw_config)
            .map_err(|err| ContainerError::ConfigParse(component_name.to_string(), err))?;

        let factory = match self.runtime.factory(component_type) {
            Some(factory) => factory,
            None => {
                let library = config.get("Library").and_then(Value::as_str);
                let symbol = config.get("Factory").and_then(Value::as_str);
                match (library, symbol) {
                    (Some(library), Some(symbol)) => self
                        .runtime
                        .dynamic_loader
                        .resolve(library, symbol)
                        .ok_or_else(|| {
                            ContainerError::DynamicLoadFailed(
                                component_name.to_string(),
                                format!("{library}::{symbol}"),
                            )
                        })?,
                    _ => return Err(ContainerError::UnknownType(component_type.to_string())),
                }
            }
        };

        let component = factory.config_fn(self, loader, &config)?;
        Ok((component, factory))
    }

    /// Looks up a component by name. If it isn't present yet and `loader`
    /// is supplied, attempts to load just that one component from
    /// configuration (with cycle detection across chained loads on this
    /// thread).
    pub fn find_component(
        &self,
        name: &str,
        loader: Option<&dyn ConfigLoader>,
    ) -> Option<Arc<dyn Component>> {
        if let Some(holder) = self.holders.read().unwrap().iter().find(|h| h.name == name) {
            return Some(Arc::clone(&holder.component));
        }
        let loader = loader?;
        let _guard = match LoadGuard::enter(name) {
            Ok(guard) => guard,
            Err(err) => {
                tracing::error!(container = %self.name, component = %name, error = %err, "load aborted");
                return None;
            }
        };

        let raw = loader.load(&self.name)?;
        let entries = parse_container_config(&raw).ok()?;
        let component_type = entries.get(name)?;

        match self.build_component(name, component_type, loader) {
            Ok((component, factory)) => {
                self.holders.write().unwrap().push(ComponentHolder {
                    name: name.to_string(),
                    component: Arc::clone(&component),
                    factory,
                });
                Some(component)
            }
            Err(err) => {
                tracing::warn!(container = %self.name, component = %name, error = %err, "component not created");
                None
            }
        }
    }

    /// Starts every component in insertion order.
    pub fn start(&self) {
        for holder in self.holders.read().unwrap().iter() {
            holder.component.start();
        }
    }

    /// Stops every component in the reverse of insertion order, so
    /// dependents (added after their dependencies, by convention) stop
    /// before the components they depend on.
    pub fn stop(&self) {
        for holder in self.holders.read().unwrap().iter().rev() {
            holder.component.stop();
        }
    }

    /// Removes one component by name: stops it, releases it through its
    /// factory, and unlinks its holder. Returns `true` iff a component
    /// was actually removed.
    pub fn delete_component(&self, name: &str) -> bool {
        let mut guard = self.holders.write().unwrap();
        let Some(index) = guard.iter().position(|h| h.name == name) else {
            return false;
        };
        let holder = guard.remove(index);
        drop(guard);
        holder.component.stop();
        holder.factory.free_fn(&holder.component);
        true
    }

    pub fn len(&self) -> usize {
        self.holders.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.read().unwrap().is_empty()
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.runtime.unregister_container(&self.name);
        // Insertion order, not reversed: the spec's `free` drains
        // holders in the order they were added, distinct from `stop`'s
        // reverse-order pass (which a caller is expected to have already
        // run before dropping the container).
        let holders: Vec<ComponentHolder> = self.holders.get_mut().unwrap().drain(..).collect();
        for holder in holders {
            holder.factory.free_fn(&holder.component);
        }
    }
}
