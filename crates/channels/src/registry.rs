use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::plugin::ChannelOutbound;

/// Adapter instances that are currently able to send.
///
/// Shared behind an `Arc` and mutated through `&self`, so adapters can be
/// registered while listeners are already dispatching.
#[derive(Default)]
pub struct ChannelRegistry {
    adapters: RwLock<Vec<Arc<dyn ChannelOutbound>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any existing one with the same id.
    pub fn register(&self, adapter: Arc<dyn ChannelOutbound>) {
        let mut adapters = self.adapters.write().unwrap_or_else(|e| e.into_inner());
        adapters.retain(|a| a.id() != adapter.id());
        debug!(adapter = adapter.id(), "registered channel adapter");
        adapters.push(adapter);
    }

    /// The earliest registered adapter still available.
    pub fn first(&self) -> Option<Arc<dyn ChannelOutbound>> {
        let adapters = self.adapters.read().unwrap_or_else(|e| e.into_inner());
        adapters.first().cloned()
    }

    pub fn list(&self) -> Vec<String> {
        let adapters = self.adapters.read().unwrap_or_else(|e| e.into_inner());
        adapters.iter().map(|a| a.id().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}
