use std::any::Any;
use std::sync::{Arc, Mutex};

use component_container::{
    Component, ComponentFactory, ContainerError, MapConfigLoader, Runtime,
};
use serde_json::Value;

/// A component that records its start/stop calls into a shared log, so
/// tests can assert on ordering without any real side effects.
struct Recorder {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl Component for Recorder {
    fn start(&self) {
        self.log.lock().unwrap().push(format!("start:{}", self.name));
    }

    fn stop(&self) {
        self.log.lock().unwrap().push(format!("stop:{}", self.name));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct RecorderFactory {
    log: Arc<Mutex<Vec<String>>>,
}

impl ComponentFactory for RecorderFactory {
    fn type_name(&self) -> &str {
        "Recorder"
    }

    fn config_fn(
        &self,
        _container: &component_container::Container,
        _loader: &dyn component_container::ConfigLoader,
        config: &Value,
    ) -> Result<Arc<dyn Component>, ContainerError> {
        let name = config
            .get("Name")
            .and_then(Value::as_str)
            .unwrap_or("unnamed")
            .to_string();
        Ok(Arc::new(Recorder {
            name,
            log: Arc::clone(&self.log),
        }))
    }
}

/// A factory whose components depend on a named sibling, resolved via
/// `find_component` during construction — used to exercise chained loads
/// and cycle detection.
struct DependentFactory {
    log: Arc<Mutex<Vec<String>>>,
}

impl ComponentFactory for DependentFactory {
    fn type_name(&self) -> &str {
        "Dependent"
    }

    fn config_fn(
        &self,
        container: &component_container::Container,
        loader: &dyn component_container::ConfigLoader,
        config: &Value,
    ) -> Result<Arc<dyn Component>, ContainerError> {
        let depends_on = config
            .get("DependsOn")
            .and_then(Value::as_str)
            .ok_or_else(|| ContainerError::UnknownType("missing DependsOn".to_string()))?;
        container
            .find_component(depends_on, Some(loader))
            .ok_or_else(|| ContainerError::Cycle(depends_on.to_string()))?;
        Ok(Arc::new(Recorder {
            name: depends_on.to_string(),
            log: Arc::clone(&self.log),
        }))
    }
}

#[test]
fn start_then_stop_runs_in_reverse_order() {
    let runtime = Runtime::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    runtime.register_factory(Arc::new(RecorderFactory { log: Arc::clone(&log) }));

    let loader = MapConfigLoader::new()
        .with("app", r#"{"a": "Recorder", "b": "Recorder", "c": "Recorder"}"#)
        .with("a", r#"{"Name": "A"}"#)
        .with("b", r#"{"Name": "B"}"#)
        .with("c", r#"{"Name": "C"}"#);

    let container = runtime.alloc_container("app").unwrap();
    container.init(&loader);
    assert_eq!(container.len(), 3);

    container.start();
    container.stop();

    let entries = log.lock().unwrap().clone();
    assert_eq!(
        entries,
        vec!["start:A", "start:B", "start:C", "stop:C", "stop:B", "stop:A"]
    );
}

#[test]
fn duplicate_container_name_is_rejected() {
    let runtime = Runtime::new();
    let first = runtime.alloc_container("dup").unwrap();
    assert!(runtime.alloc_container("dup").is_none());
    drop(first);
    // Freed, so the name becomes available again.
    assert!(runtime.alloc_container("dup").is_some());
}

#[test]
fn unknown_component_type_is_skipped_not_fatal() {
    let runtime = Runtime::new();
    let loader = MapConfigLoader::new().with("app", r#"{"mystery": "NoSuchType"}"#);
    let container = runtime.alloc_container("app").unwrap();
    container.init(&loader);
    assert!(container.is_empty());
}

#[test]
fn config_parse_failure_is_skipped_not_fatal() {
    let runtime = Runtime::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    runtime.register_factory(Arc::new(RecorderFactory { log }));
    let loader = MapConfigLoader::new()
        .with("app", r#"{"broken": "Recorder"}"#)
        .with("broken", r#"not json"#);
    let container = runtime.alloc_container("app").unwrap();
    container.init(&loader);
    assert!(container.is_empty());
}

#[test]
fn find_component_lazily_loads_uncreated_components() {
    let runtime = Runtime::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    runtime.register_factory(Arc::new(RecorderFactory { log }));

    let loader = MapConfigLoader::new()
        .with("app", r#"{"only": "Recorder"}"#)
        .with("only", r#"{"Name": "Only"}"#);
    let container = runtime.alloc_container("app").unwrap();

    // Not yet in the holder list: lazily loaded on first lookup.
    assert!(container.find_component("only", Some(&loader)).is_some());
    assert_eq!(container.len(), 1);
    // Second lookup is served from the holder list, not reloaded.
    assert!(container.find_component("only", Some(&loader)).is_some());
    assert_eq!(container.len(), 1);

    assert!(container.find_component("missing", Some(&loader)).is_none());
}

#[test]
fn chained_find_component_resolves_a_named_dependency() {
    let runtime = Runtime::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    runtime.register_factory(Arc::new(RecorderFactory { log: Arc::clone(&log) }));
    runtime.register_factory(Arc::new(DependentFactory { log: Arc::clone(&log) }));

    let loader = MapConfigLoader::new()
        .with("app", r#"{"base": "Recorder", "top": "Dependent"}"#)
        .with("base", r#"{"Name": "Base"}"#)
        .with("top", r#"{"DependsOn": "base"}"#);
    let container = runtime.alloc_container("app").unwrap();
    container.init(&loader);

    // "top" was built during init and chain-loaded "base" through
    // find_component before "base" was reached in the main pass.
    assert_eq!(container.len(), 2);
}

#[test]
fn cyclic_component_reference_aborts_the_load() {
    let runtime = Runtime::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    runtime.register_factory(Arc::new(DependentFactory { log }));

    // "a" depends on "b", "b" depends on "a": a genuine cycle.
    let loader = MapConfigLoader::new()
        .with("app", r#"{"a": "Dependent", "b": "Dependent"}"#)
        .with("a", r#"{"DependsOn": "b"}"#)
        .with("b", r#"{"DependsOn": "a"}"#);
    let container = runtime.alloc_container("app").unwrap();
    container.init(&loader);

    // Neither side of the cycle could complete construction.
    assert!(container.is_empty());
}

#[test]
fn delete_component_stops_and_releases_it() {
    let runtime = Runtime::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    runtime.register_factory(Arc::new(RecorderFactory { log: Arc::clone(&log) }));

    let loader = MapConfigLoader::new()
        .with("app", r#"{"a": "Recorder"}"#)
        .with("a", r#"{"Name": "A"}"#);
    let container = runtime.alloc_container("app").unwrap();
    container.init(&loader);

    assert!(container.delete_component("a"));
    assert!(!container.delete_component("a"));
    assert_eq!(*log.lock().unwrap(), vec!["stop:A"]);
    assert!(container.is_empty());
}

#[test]
fn runtime_lists_live_containers() {
    let runtime = Runtime::new();
    let a = runtime.alloc_container("a").unwrap();
    let b = runtime.alloc_container("b").unwrap();

    let mut names: Vec<String> = runtime.containers().iter().map(|c| c.name().to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);

    drop(a);
    let names: Vec<String> = runtime.containers().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["b".to_string()]);
    drop(b);
}

#[test]
fn second_factory_registration_is_ignored() {
    let runtime = Runtime::new();
    let log_a = Arc::new(Mutex::new(Vec::new()));
    let log_b = Arc::new(Mutex::new(Vec::new()));
    runtime.register_factory(Arc::new(RecorderFactory { log: Arc::clone(&log_a) }));
    runtime.register_factory(Arc::new(RecorderFactory { log: Arc::clone(&log_b) }));

    let loader = MapConfigLoader::new()
        .with("app", r#"{"a": "Recorder"}"#)
        .with("a", r#"{"Name": "A"}"#);
    let container = runtime.alloc_container("app").unwrap();
    container.init(&loader);
    container.start();

    assert_eq!(*log_a.lock().unwrap(), vec!["start:A"]);
    assert!(log_b.lock().unwrap().is_empty());
}
