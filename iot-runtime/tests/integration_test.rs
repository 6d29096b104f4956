use std::sync::Arc;

use component_container::{FsConfigLoader, Runtime};
use iot_runtime::{LoggerFactory, SchedulerComponent, SchedulerFactory};

#[test]
fn container_wires_logger_into_scheduler_by_name() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("app.json"),
        r#"{"logger": "Logger", "clock": "Scheduler"}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("logger.json"), r#"{"Name": "app-logger"}"#).unwrap();
    std::fs::write(
        dir.path().join("clock.json"),
        r#"{"Logger": "logger", "Priority": 5}"#,
    )
    .unwrap();

    let loader = FsConfigLoader::new(dir.path());
    let runtime = Runtime::new();
    runtime.register_factory(Arc::new(LoggerFactory));
    runtime.register_factory(Arc::new(SchedulerFactory));

    let container = runtime.alloc_container("app").unwrap();
    container.init(&loader);
    assert_eq!(container.len(), 2);

    let scheduler_component = container.find_component("clock", None).unwrap();
    let scheduler_component = scheduler_component
        .as_any()
        .downcast_ref::<SchedulerComponent>()
        .unwrap();
    assert!(scheduler_component.scheduler().is_empty());

    container.start();
    container.stop();
}

#[test]
fn missing_named_logger_falls_back_without_failing_construction() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("app.json"),
        r#"{"clock": "Scheduler"}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("clock.json"), r#"{"Logger": "nonexistent"}"#).unwrap();

    let loader = FsConfigLoader::new(dir.path());
    let runtime = Runtime::new();
    runtime.register_factory(Arc::new(SchedulerFactory));

    let container = runtime.alloc_container("app").unwrap();
    container.init(&loader);
    // The scheduler component is still created; it just falls back to a
    // null logger since "nonexistent" resolves to nothing.
    assert_eq!(container.len(), 1);
}

#[test]
fn env_substitution_reaches_component_config() {
    std::env::set_var("IOT_RUNTIME_TEST_LOGGER_NAME", "substituted");
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.json"), r#"{"logger": "Logger"}"#).unwrap();
    std::fs::write(
        dir.path().join("logger.json"),
        r#"{"Name": "${IOT_RUNTIME_TEST_LOGGER_NAME}"}"#,
    )
    .unwrap();

    let loader = FsConfigLoader::new(dir.path());
    let runtime = Runtime::new();
    runtime.register_factory(Arc::new(LoggerFactory));

    let container = runtime.alloc_container("app").unwrap();
    container.init(&loader);
    assert_eq!(container.len(), 1);
}
