//! Meta-notifications: the tree-wide "something was fired" channel.
//!
//! Every emit through a namespace node is decomposed into
//! `(target, short_name, args)` and delivered to the generic listeners of the
//! emitting node and all of its ancestors, before the ordinary listeners of
//! the canonical channel run. Siblings and their subtrees are not notified.

use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::{
    namespace::{name, NamespaceNode},
    registry::{
        list::{deliver, ListenerList},
        ChannelRegistry, Listener, ListenerFailure, RegistryView,
    },
};

/// The two parallel channel kinds of a hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Action,
    Event,
}

impl ChannelKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a generic `action`/`event` notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaNotification {
    pub kind: ChannelKind,
    /// Canonical name without its last segment; `""` for top-level names.
    pub target: String,
    /// Last segment of the canonical name.
    pub name: String,
    pub args: Vec<Value>,
}

impl MetaNotification {
    pub fn from_canonical(kind: ChannelKind, canonical: &str, args: &[Value]) -> Self {
        let (target, short) = name::decompose(canonical);
        Self {
            kind,
            target: target.to_string(),
            name: short.to_string(),
            args: args.to_vec(),
        }
    }

    /// The canonical channel name this notification was built from.
    pub fn channel(&self) -> String {
        if self.target.is_empty() {
            self.name.clone()
        } else {
            name::join(&self.target, &self.name)
        }
    }
}

/// Listener of generic notifications.
pub type MetaListener = Listener<MetaNotification>;

/// Generic listeners of one node, one list per kind.
#[derive(Default)]
pub(crate) struct MetaChannels {
    actions: Mutex<ListenerList<MetaNotification>>,
    events: Mutex<ListenerList<MetaNotification>>,
}

impl MetaChannels {
    fn list(&self, kind: ChannelKind) -> &Mutex<ListenerList<MetaNotification>> {
        match kind {
            ChannelKind::Action => &self.actions,
            ChannelKind::Event => &self.events,
        }
    }

    pub(crate) fn add(&self, kind: ChannelKind, listener: MetaListener, once: bool) {
        self.list(kind).lock().push(listener, once);
    }

    pub(crate) fn remove(&self, kind: ChannelKind, listener: Option<&MetaListener>) -> usize {
        let mut list = self.list(kind).lock();
        match listener {
            Some(l) => usize::from(list.remove(l).is_some()),
            None => list.clear().len(),
        }
    }

    pub(crate) fn len(&self, kind: ChannelKind) -> usize {
        self.list(kind).lock().len()
    }

    fn notify(
        &self,
        notification: &MetaNotification,
        on_error: impl FnMut(nshub_error::StackError),
    ) -> usize {
        let list = self.list(notification.kind);
        let snapshot = list.lock().snapshot();
        deliver(
            snapshot,
            notification,
            |id| list.lock().claim(id).is_some(),
            on_error,
        )
    }
}

/// Decorator over a shared [`ChannelRegistry`] that raises the generic
/// notification before passing the fire through.
///
/// The wrapped registry never leaves the crate; callers only get a
/// [`RegistryView`], so `fire_from` is the only way to fire it.
#[derive(Clone, Debug)]
pub struct PropagatingRegistry {
    kind: ChannelKind,
    view: RegistryView,
}

impl PropagatingRegistry {
    pub fn new(kind: ChannelKind, max_listeners: usize) -> Self {
        Self {
            kind,
            view: RegistryView::new(ChannelRegistry::with_max_listeners(
                kind.as_str(),
                max_listeners,
            )),
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Introspection handle on the shared registry.
    pub fn view(&self) -> &RegistryView {
        &self.view
    }

    pub(crate) fn registry(&self) -> &ChannelRegistry {
        self.view.registry()
    }

    /// Fires `canonical` as emitted at `origin`.
    ///
    /// Generic listeners are notified root first, `origin` last; then the
    /// channel listeners run. Returns the number of channel listeners invoked.
    pub(crate) fn fire_from(
        &self,
        origin: &NamespaceNode,
        canonical: &str,
        args: &[Value],
    ) -> usize {
        let notification = MetaNotification::from_canonical(self.kind, canonical, args);

        let mut chain: Vec<NamespaceNode> = origin.ancestors().collect();
        chain.reverse();

        let mut observers = 0;
        for node in &chain {
            observers += node.meta().notify(&notification, |error| {
                self.registry().report_failure(ListenerFailure {
                    registry: Arc::from(self.kind.as_str()),
                    channel: canonical.to_string(),
                    namespace: Some(node.path().to_string()),
                    error,
                })
            });
        }

        trace!(
            kind = %self.kind,
            origin = origin.path(),
            channel = canonical,
            target = %notification.target,
            observers,
            "Meta-notification delivered"
        );

        self.registry().fire(canonical, args)
    }
}
