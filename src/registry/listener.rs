use std::{fmt, sync::Arc};

use nshub_error::HubResult;
use serde_json::Value;

/// Argument list carried by a fire.
pub type Args = [Value];

type ListenerFn<T> = dyn Fn(&T) -> HubResult<()> + Send + Sync;

/// A cloneable listener handle.
///
/// Identity is the allocation behind the handle: clones of one `Listener`
/// compare equal under [`Listener::ptr_eq`], two separately built listeners
/// never do, even when wrapping the same function. Keep a clone around to
/// remove the listener later.
pub struct Listener<T: ?Sized = Args> {
    func: Arc<ListenerFn<T>>,
}

impl<T: ?Sized> Listener<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> HubResult<()> + Send + Sync + 'static,
    {
        Self { func: Arc::new(f) }
    }

    /// Wraps a listener that cannot fail.
    pub fn infallible<F>(f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::new(move |payload| {
            f(payload);
            Ok(())
        })
    }

    #[inline]
    pub fn call(&self, payload: &T) -> HubResult<()> {
        (self.func)(payload)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.func), Arc::as_ptr(&other.func))
    }
}

impl<T: ?Sized> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("addr", &Arc::as_ptr(&self.func).cast::<()>())
            .finish()
    }
}
