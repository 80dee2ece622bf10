//! Namespace tree: nodes, name resolution and bridging of external sources.

pub mod bridge;
pub mod name;
pub mod node;

pub use bridge::EventSource;
pub use node::{Ancestors, NamespaceNode};
