use std::{
    fmt,
    sync::{Arc, Weak},
};

use nshub_error::{HubResult, NamespaceError, ResultExt};
use serde_json::Value;
use tracing::{debug, trace};

use super::{name, EventSource};
use crate::{
    config::HubConfig,
    propagation::{ChannelKind, MetaChannels, MetaListener, PropagatingRegistry},
    registry::{Args, Listener, RegistryView},
};

/// A node of a namespace tree.
///
/// Handles are cheap to clone and share one node. Every node of a tree shares
/// the same action and event registries, so a channel name means the same
/// thing wherever it is used; relative names (`":name"`) are a spelling
/// convenience resolved against the node's own path.
///
/// A child keeps its parent alive. Parents do not reference their children.
///
/// A node carries exactly two channel kinds, actions and events, each with
/// per-name listeners and generic (`on_any_*`) listeners. It is not a
/// general emitter: there is no channel for arbitrary custom event kinds, so
/// model those as names under the event kind (`emit_event(":custom", ..)`).
#[derive(Clone)]
pub struct NamespaceNode {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    path: String,
    depth: usize,
    parent: Option<NamespaceNode>,
    actions: PropagatingRegistry,
    events: PropagatingRegistry,
    meta: MetaChannels,
    config: Arc<HubConfig>,
}

impl NamespaceNode {
    /// Creates a root with default settings.
    pub fn new_root() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Creates a root owning a fresh pair of registries.
    pub fn with_config(config: HubConfig) -> Self {
        let node = Self {
            inner: Arc::new(NodeInner {
                path: String::new(),
                depth: 0,
                parent: None,
                actions: PropagatingRegistry::new(ChannelKind::Action, config.max_listeners),
                events: PropagatingRegistry::new(ChannelKind::Event, config.max_listeners),
                meta: MetaChannels::default(),
                config: Arc::new(config),
            }),
        };
        debug!("Namespace root created");
        node
    }

    /// Creates the child `local` of `parent`.
    ///
    /// Fails with `InvalidArgument` if `local` is empty or contains `:`, and
    /// with `DepthLimitExceeded` past a non-zero `max_depth`.
    ///
    /// A segment holding `:` would give a one-level child the same path as a
    /// two-level chain (`"a:b"` vs `"a"` then `"b"`) while having a different
    /// parent and therefore different generic listeners, so it is refused.
    /// Create the chain one segment at a time instead.
    pub fn new_child(parent: &NamespaceNode, local: &str) -> HubResult<Self> {
        name::validate_segment(local).context("new_child")?;

        let path = name::join(parent.path(), local);
        let depth = parent.depth() + 1;
        let limit = parent.inner.config.max_depth;
        if limit > 0 && depth > limit {
            return Err(NamespaceError::DepthLimitExceeded { path, limit }.into());
        }

        debug!(namespace = %path, depth, "Namespace created");
        Ok(Self {
            inner: Arc::new(NodeInner {
                path,
                depth,
                parent: Some(parent.clone()),
                actions: parent.inner.actions.clone(),
                events: parent.inner.events.clone(),
                meta: MetaChannels::default(),
                config: Arc::clone(&parent.inner.config),
            }),
        })
    }

    /// Creates a child namespace of this node.
    pub fn create_namespace(&self, local: &str) -> HubResult<Self> {
        Self::new_child(self, local)
    }

    /// Colon-joined path; empty for a root.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Number of edges between this node and its root.
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    pub fn parent(&self) -> Option<&NamespaceNode> {
        self.inner.parent.as_ref()
    }

    /// Walks up to the root of the tree.
    ///
    /// The walk is bounded by this node's depth; running past it reports
    /// `CycleDetected` instead of looping.
    pub fn root(&self) -> HubResult<NamespaceNode> {
        let mut steps = 0;
        let mut current = self;
        while let Some(parent) = current.parent() {
            steps += 1;
            if steps > self.depth() {
                return Err(NamespaceError::CycleDetected {
                    path: self.path().to_string(),
                    steps,
                }
                .into());
            }
            current = parent;
        }
        Ok(current.clone())
    }

    /// Iterates from this node up to the root, this node first.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
            remaining: self.depth() + 1,
        }
    }

    /// Resolves `name` against this node's path.
    pub fn resolve(&self, name: &str) -> String {
        name::resolve(self.path(), name)
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// The action registry shared by the whole tree.
    ///
    /// The view allows introspection and hooks only; fire through
    /// [`emit_action`](Self::emit_action).
    pub fn actions(&self) -> &RegistryView {
        self.inner.actions.view()
    }

    /// The event registry shared by the whole tree.
    pub fn events(&self) -> &RegistryView {
        self.inner.events.view()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn meta(&self) -> &MetaChannels {
        &self.inner.meta
    }

    fn channel(&self, kind: ChannelKind) -> &PropagatingRegistry {
        match kind {
            ChannelKind::Action => &self.inner.actions,
            ChannelKind::Event => &self.inner.events,
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Kind-generic operations
    ////////////////////////////////////////////////////////////////////////////

    /// Subscribes `listener` to `name` on the `kind` registry.
    pub fn on(&self, kind: ChannelKind, name: &str, listener: Listener) -> &Self {
        self.channel(kind)
            .registry()
            .subscribe(&self.resolve(name), listener);
        self
    }

    pub fn once(&self, kind: ChannelKind, name: &str, listener: Listener) -> &Self {
        self.channel(kind)
            .registry()
            .subscribe_once(&self.resolve(name), listener);
        self
    }

    /// Removes `listener`, or every listener of `name` when `None`.
    pub fn remove(&self, kind: ChannelKind, name: &str, listener: Option<&Listener>) -> &Self {
        self.channel(kind)
            .registry()
            .unsubscribe(&self.resolve(name), listener);
        self
    }

    /// Fires `name` from this node.
    pub fn emit(&self, kind: ChannelKind, name: &str, args: &[Value]) -> &Self {
        let canonical = self.resolve(name);
        self.channel(kind).fire_from(self, &canonical, args);
        self
    }

    /// Re-emits every `source_event` of `source` as `target` from this node.
    ///
    /// The bridge holds a weak reference: once every handle to this node is
    /// dropped, further source events are ignored and the node is freed even
    /// if `source` outlives it.
    pub fn bind<S>(&self, kind: ChannelKind, source: &S, source_event: &str, target: &str) -> &Self
    where
        S: EventSource + ?Sized,
    {
        let node: Weak<NodeInner> = Arc::downgrade(&self.inner);
        let canonical = self.resolve(target);
        debug!(
            kind = %kind,
            namespace = self.path(),
            source_event,
            target = %canonical,
            "Binding external source"
        );
        source.on(
            source_event,
            Listener::infallible(move |args: &Args| {
                let Some(inner) = node.upgrade() else {
                    trace!(channel = %canonical, "Bound namespace dropped, event ignored");
                    return;
                };
                let node = NamespaceNode { inner };
                node.channel(kind).fire_from(&node, &canonical, args);
            }),
        );
        self
    }

    /// Subscribes to every `kind` fire performed at this node or below it.
    pub fn on_any(&self, kind: ChannelKind, listener: MetaListener) -> &Self {
        self.inner.meta.add(kind, listener, false);
        self
    }

    pub fn once_any(&self, kind: ChannelKind, listener: MetaListener) -> &Self {
        self.inner.meta.add(kind, listener, true);
        self
    }

    pub fn remove_any(&self, kind: ChannelKind, listener: Option<&MetaListener>) -> &Self {
        self.inner.meta.remove(kind, listener);
        self
    }

    /// Number of generic `kind` listeners registered on this node.
    pub fn any_listener_count(&self, kind: ChannelKind) -> usize {
        self.inner.meta.len(kind)
    }

    ////////////////////////////////////////////////////////////////////////////
    // Actions
    ////////////////////////////////////////////////////////////////////////////

    pub fn on_action(&self, action: &str, listener: Listener) -> &Self {
        self.on(ChannelKind::Action, action, listener)
    }

    pub fn once_action(&self, action: &str, listener: Listener) -> &Self {
        self.once(ChannelKind::Action, action, listener)
    }

    pub fn remove_action(&self, action: &str, listener: Option<&Listener>) -> &Self {
        self.remove(ChannelKind::Action, action, listener)
    }

    pub fn emit_action(&self, action: &str, args: &[Value]) -> &Self {
        self.emit(ChannelKind::Action, action, args)
    }

    pub fn bind_action<S>(&self, source: &S, event: &str, to_action: &str) -> &Self
    where
        S: EventSource + ?Sized,
    {
        self.bind(ChannelKind::Action, source, event, to_action)
    }

    pub fn on_any_action(&self, listener: MetaListener) -> &Self {
        self.on_any(ChannelKind::Action, listener)
    }

    pub fn once_any_action(&self, listener: MetaListener) -> &Self {
        self.once_any(ChannelKind::Action, listener)
    }

    pub fn remove_any_action(&self, listener: Option<&MetaListener>) -> &Self {
        self.remove_any(ChannelKind::Action, listener)
    }

    ////////////////////////////////////////////////////////////////////////////
    // Events
    ////////////////////////////////////////////////////////////////////////////

    pub fn on_event(&self, event: &str, listener: Listener) -> &Self {
        self.on(ChannelKind::Event, event, listener)
    }

    pub fn once_event(&self, event: &str, listener: Listener) -> &Self {
        self.once(ChannelKind::Event, event, listener)
    }

    pub fn remove_event(&self, event: &str, listener: Option<&Listener>) -> &Self {
        self.remove(ChannelKind::Event, event, listener)
    }

    pub fn emit_event(&self, event: &str, args: &[Value]) -> &Self {
        self.emit(ChannelKind::Event, event, args)
    }

    pub fn bind_event<S>(&self, source: &S, event: &str, to_event: &str) -> &Self
    where
        S: EventSource + ?Sized,
    {
        self.bind(ChannelKind::Event, source, event, to_event)
    }

    pub fn on_any_event(&self, listener: MetaListener) -> &Self {
        self.on_any(ChannelKind::Event, listener)
    }

    pub fn once_any_event(&self, listener: MetaListener) -> &Self {
        self.once_any(ChannelKind::Event, listener)
    }

    pub fn remove_any_event(&self, listener: Option<&MetaListener>) -> &Self {
        self.remove_any(ChannelKind::Event, listener)
    }
}

impl fmt::Debug for NamespaceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceNode")
            .field("path", &self.inner.path)
            .field("depth", &self.inner.depth)
            .finish()
    }
}

/// Iterator over a node and its ancestors, see [`NamespaceNode::ancestors`].
pub struct Ancestors {
    next: Option<NamespaceNode>,
    remaining: usize,
}

impl Iterator for Ancestors {
    type Item = NamespaceNode;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next.take()?;
        self.next = current.parent().cloned();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
