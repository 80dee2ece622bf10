use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::{config::HubConfig, namespace::NamespaceNode};

/// Named cache of hubs.
///
/// Independent call sites asking for the same name get handles to the same
/// root node. A hub is created on first request.
pub struct HubFactory {
    hubs: DashMap<Arc<str>, NamespaceNode>,
    config: HubConfig,
}

impl HubFactory {
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Factory whose hubs are created with `config`.
    pub fn with_config(config: HubConfig) -> Self {
        Self {
            hubs: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Returns the hub cached under `name`, creating it if needed.
    ///
    /// `None` selects the configured default name.
    pub fn hub(&self, name: Option<&str>) -> NamespaceNode {
        let name = name.unwrap_or(&self.config.default_hub);
        if let Some(existing) = self.hubs.get(name) {
            return existing.value().clone();
        }
        self.hubs
            .entry(Arc::from(name))
            .or_insert_with(|| {
                debug!(hub = name, "Hub created");
                NamespaceNode::with_config(self.config.clone())
            })
            .value()
            .clone()
    }

    /// Returns the hub cached under `name` without creating it.
    pub fn get(&self, name: &str) -> Option<NamespaceNode> {
        self.hubs.get(name).map(|h| h.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hubs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    /// Names of all cached hubs, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.hubs.iter().map(|e| e.key().to_string()).collect();
        names.sort();
        names
    }

    /// Drops `name` from the cache. Existing handles stay usable.
    pub fn remove(&self, name: &str) -> Option<NamespaceNode> {
        self.hubs.remove(name).map(|(_, hub)| hub)
    }

    /// Empties the cache.
    pub fn clear(&self) {
        let count = self.hubs.len();
        self.hubs.clear();
        debug!(count, "Hub cache cleared");
    }
}

impl Default for HubFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HubFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubFactory")
            .field("hubs", &self.names())
            .field("config", &self.config)
            .finish()
    }
}

static GLOBAL_FACTORY: Lazy<HubFactory> = Lazy::new(|| {
    let config = HubConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Invalid hub configuration, using defaults");
        HubConfig::default()
    });
    HubFactory::with_config(config)
});

/// The process-wide factory behind [`create_hub`].
pub fn global_factory() -> &'static HubFactory {
    &GLOBAL_FACTORY
}

/// Returns the process-wide hub cached under `name` (default name when `None`).
pub fn create_hub(name: Option<&str>) -> NamespaceNode {
    GLOBAL_FACTORY.hub(name)
}
