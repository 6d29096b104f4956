//! Error kinds raised while loading and wiring components.
//!
//! None of these escape [`crate::Container::init`] or
//! [`crate::Container::find_component`] as a hard failure: per the
//! container's error-handling contract, a failure to build one component
//! is logged and the caller moves on to the next (or gets back `None`),
//! it never aborts the whole container.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("failed to parse configuration for '{0}': {1}")]
    ConfigParse(String, serde_json::Error),

    #[error("no factory registered for component type '{0}'")]
    UnknownType(String),

    #[error("dynamic load failed for component '{0}': {1}")]
    DynamicLoadFailed(String, String),

    #[error("cyclic component reference while loading '{0}'")]
    Cycle(String),
}
