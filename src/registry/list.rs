use std::sync::atomic::{AtomicU64, Ordering};

use nshub_error::StackError;

use super::Listener;

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

/// One registration of a listener.
///
/// The same `Listener` may be registered several times; each registration
/// gets its own id so `once` entries can be claimed exactly once.
pub(crate) struct Entry<T: ?Sized> {
    pub(crate) id: u64,
    pub(crate) listener: Listener<T>,
    pub(crate) once: bool,
}

impl<T: ?Sized> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: self.listener.clone(),
            once: self.once,
        }
    }
}

/// Ordered listeners of a single channel.
pub(crate) struct ListenerList<T: ?Sized> {
    entries: Vec<Entry<T>>,
    /// Set once the max-listeners warning has been logged for this list.
    pub(crate) leak_warned: bool,
}

impl<T: ?Sized> Default for ListenerList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            leak_warned: false,
        }
    }
}

impl<T: ?Sized> ListenerList<T> {
    pub(crate) fn push(&mut self, listener: Listener<T>, once: bool) {
        self.entries.push(Entry {
            id: NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed),
            listener,
            once,
        });
    }

    /// Removes the most recently added registration of `listener`.
    pub(crate) fn remove(&mut self, listener: &Listener<T>) -> Option<Entry<T>> {
        let pos = self
            .entries
            .iter()
            .rposition(|e| e.listener.ptr_eq(listener))?;
        Some(self.entries.remove(pos))
    }

    pub(crate) fn clear(&mut self) -> Vec<Entry<T>> {
        std::mem::take(&mut self.entries)
    }

    /// Removes the `once` entry with `id`. Returns `None` if another fire
    /// already consumed it.
    pub(crate) fn claim(&mut self, id: u64) -> Option<Entry<T>> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    pub(crate) fn snapshot(&self) -> Vec<Entry<T>> {
        self.entries.clone()
    }

    pub(crate) fn listeners(&self) -> Vec<Listener<T>> {
        self.entries.iter().map(|e| e.listener.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Invokes every entry of `snapshot` in order.
///
/// `claim` is asked before running a `once` entry and must return `false` if
/// the entry is gone. A failing listener is handed to `on_error` and delivery
/// continues with the next entry. Returns the number of listeners invoked.
pub(crate) fn deliver<T: ?Sized>(
    snapshot: Vec<Entry<T>>,
    payload: &T,
    mut claim: impl FnMut(u64) -> bool,
    mut on_error: impl FnMut(StackError),
) -> usize {
    let mut invoked = 0;
    for entry in snapshot {
        if entry.once && !claim(entry.id) {
            continue;
        }
        invoked += 1;
        if let Err(err) = entry.listener.call(payload) {
            on_error(err);
        }
    }
    invoked
}
