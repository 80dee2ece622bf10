use std::fmt;

use super::{ChannelRegistry, Listener, ListenerFailure};

/// Read-side handle on a registry owned by a namespace tree.
///
/// Exposes introspection, limits and hooks but no way to subscribe or fire:
/// those go through [`NamespaceNode`](crate::NamespaceNode), which raises the
/// generic notification for every fire. A view also cannot be passed to
/// `bind_action`/`bind_event` as a source.
///
/// ```compile_fail
/// use nshub::NamespaceNode;
///
/// let root = NamespaceNode::new_root();
/// root.actions().fire("child:go", &[]);
/// ```
#[derive(Clone)]
pub struct RegistryView {
    registry: ChannelRegistry,
}

impl RegistryView {
    pub(crate) fn new(registry: ChannelRegistry) -> Self {
        Self { registry }
    }

    pub(crate) fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn label(&self) -> &str {
        self.registry.label()
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.registry.listener_count(name)
    }

    pub fn listeners(&self, name: &str) -> Vec<Listener> {
        self.registry.listeners(name)
    }

    /// Names of all channels that currently have listeners, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        self.registry.channel_names()
    }

    pub fn on_listener_added<F>(&self, hook: F) -> &Self
    where
        F: Fn(&str, &Listener) + Send + Sync + 'static,
    {
        self.registry.on_listener_added(hook);
        self
    }

    pub fn on_listener_removed<F>(&self, hook: F) -> &Self
    where
        F: Fn(&str, &Listener) + Send + Sync + 'static,
    {
        self.registry.on_listener_removed(hook);
        self
    }

    /// See [`ChannelRegistry::on_listener_error`].
    pub fn on_listener_error<F>(&self, hook: F) -> &Self
    where
        F: Fn(&ListenerFailure) + Send + Sync + 'static,
    {
        self.registry.on_listener_error(hook);
        self
    }

    pub fn set_max_listeners(&self, max: usize) -> &Self {
        self.registry.set_max_listeners(max);
        self
    }

    pub fn max_listeners(&self) -> usize {
        self.registry.max_listeners()
    }

    /// Number of fires performed through the tree.
    pub fn fire_count(&self) -> usize {
        self.registry.fire_count()
    }

    pub fn failure_count(&self) -> usize {
        self.registry.failure_count()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.registry.ptr_eq(&other.registry)
    }
}

impl fmt::Debug for RegistryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RegistryView").field(&self.registry).finish()
    }
}
