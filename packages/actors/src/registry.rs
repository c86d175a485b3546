//! Process-wide registry for the dispatcher handle.

use std::sync::{PoisonError, RwLock};

use crate::handle::DispatcherHandle;

/// Global registry for discovering the dispatcher.
///
/// This provides a way to look up the dispatcher without passing
/// references through every server function.
pub struct ActorRegistry {
    dispatcher: RwLock<Option<DispatcherHandle>>,
}

impl ActorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            dispatcher: RwLock::new(None),
        }
    }

    /// Register the dispatcher, replacing any previous one.
    pub fn register_dispatcher(&self, dispatcher: DispatcherHandle) {
        *self
            .dispatcher
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(dispatcher);
    }

    /// Get the dispatcher.
    pub fn get_dispatcher(&self) -> Option<DispatcherHandle> {
        self.dispatcher
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for ActorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global registry instance.
static REGISTRY: std::sync::LazyLock<ActorRegistry> = std::sync::LazyLock::new(ActorRegistry::new);

/// Get the global actor registry.
pub fn global_registry() -> &'static ActorRegistry {
    &REGISTRY
}
