//! Named interface for dynamic loading of component factories.
//!
//! The spec's container configuration schema reserves `"Library"` and
//! `"Factory"` keys for components whose type isn't statically
//! registered: the named symbol is expected to resolve to a zero-argument
//! function returning a factory descriptor. Actually loading a shared
//! library (`dlopen`/`libloading`) is out of scope here — see
//! `SPEC_FULL.md` §1 — so [`NullDynamicLoader`] always reports "not
//! found", and a host application that wants the real thing supplies its
//! own [`DynamicLoader`] to [`crate::Container::init`].

use std::sync::Arc;

use crate::component::ComponentFactory;

/// Resolves a `(library, factory symbol)` pair to a [`ComponentFactory`],
/// or reports that no such factory could be loaded.
pub trait DynamicLoader: Send + Sync {
    fn resolve(&self, library: &str, factory_symbol: &str) -> Option<Arc<dyn ComponentFactory>>;
}

/// Always refuses. Used by default so that a container with no dynamic
/// component types configured never needs a real loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDynamicLoader;

impl DynamicLoader for NullDynamicLoader {
    fn resolve(&self, _library: &str, _factory_symbol: &str) -> Option<Arc<dyn ComponentFactory>> {
        None
    }
}
