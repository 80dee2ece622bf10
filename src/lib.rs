//! Hierarchical namespaced action/event hub.
//!
//! A hub is a tree of [`NamespaceNode`]s sharing one action registry and one
//! event registry. Channel names are colon-delimited paths; a leading `:`
//! makes a name relative to the node it is used on. Every fire is also
//! surfaced as a [`MetaNotification`] to the generic listeners of the firing
//! node and its ancestors.
//!
//! ```
//! use nshub::{Listener, NamespaceNode};
//! use serde_json::json;
//!
//! let root = NamespaceNode::new_root();
//! let child = root.create_namespace("child").unwrap();
//!
//! child.on_action(":deploy", Listener::infallible(|args| println!("{args:?}")));
//! root.emit_action("child:deploy", &[json!("v1")]);
//! ```

/// Hub settings loaded from defaults and the environment.
pub mod config;
/// Error types and re-exports of `nshub-error`.
pub mod error;
/// Named hub cache and the process-wide factory.
pub mod factory;
/// `tracing` subscriber setup.
pub mod logging;
/// Namespace tree and name resolution.
pub mod namespace;
/// Generic notifications raised along the ancestor chain.
pub mod propagation;
/// Named-channel listener registry.
pub mod registry;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

pub use config::HubConfig;
pub use error::{ConfigError, HubResult, NamespaceError, StackError, StatusCode};
pub use factory::{create_hub, global_factory, HubFactory};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use namespace::{EventSource, NamespaceNode};
pub use propagation::{ChannelKind, MetaListener, MetaNotification};
pub use registry::{Args, ChannelRegistry, Listener, ListenerFailure, RegistryView};
