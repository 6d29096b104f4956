//! A named, insertion-ordered component container with JSON-driven
//! wiring.
//!
//! A [`Container`] owns a list of [`Component`]s built by
//! [`ComponentFactory`]s from configuration fetched through a
//! [`ConfigLoader`]. `start`/`stop` drive every component's lifecycle in
//! forward/reverse insertion order respectively, so dependents (added
//! after the components they depend on) shut down before their
//! dependencies do.

mod component;
mod config;
mod container;
mod dynamic;
mod error;

pub use component::{Component, ComponentFactory};
pub use config::{substitute_env, ConfigLoader, FsConfigLoader, MapConfigLoader};
pub use container::{Container, Runtime};
pub use dynamic::{DynamicLoader, NullDynamicLoader};
pub use error::ContainerError;
