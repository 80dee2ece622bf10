//! Channel registry: the named-listener broadcast primitive.
//!
//! - `channel`: [`ChannelRegistry`], hooks and listener failure reports.
//! - `list` (private): ordered listener lists and the delivery loop.
//! - `listener`: the cloneable [`Listener`] handle.
//! - `view`: [`RegistryView`], the introspection-only handle nodes hand out.
//!
//! Every namespace tree owns one registry per channel kind; all nodes of the
//! tree share it.

pub mod channel;
pub(crate) mod list;
pub mod listener;
pub mod view;

pub use channel::*;
pub use listener::*;
pub use view::RegistryView;
