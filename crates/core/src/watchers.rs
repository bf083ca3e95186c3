//! Typed watcher lists for single-threaded event broadcast.
//!
//! A `Watchers<W>` holds shared handles to watchers of one kind (usually a
//! `dyn Trait`). Every `add` returns a [`WatcherRemover`]; dropping the
//! remover does NOT unregister, call [`WatcherRemover::remove`].
//!
//! `fire` works from a snapshot, so a watcher may register or remove
//! watchers, or trigger another `fire`, while it is being notified.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

struct Entry<W: ?Sized> {
    id: u64,
    watcher: Rc<W>,
    once: bool,
}

/// Registered watchers of type `W`.
pub struct Watchers<W: ?Sized> {
    entries: Rc<RefCell<Vec<Entry<W>>>>,
    next_id: Cell<u64>,
}

impl<W: ?Sized + 'static> Watchers<W> {
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Register a watcher until its remover is used.
    pub fn add(&self, watcher: Rc<W>) -> WatcherRemover {
        self.insert(watcher, false)
    }

    /// Register a watcher that is removed right before its first notification.
    pub fn add_once(&self, watcher: Rc<W>) -> WatcherRemover {
        self.insert(watcher, true)
    }

    fn insert(&self, watcher: Rc<W>, once: bool) -> WatcherRemover {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push(Entry { id, watcher, once });

        let entries: Weak<RefCell<Vec<Entry<W>>>> = Rc::downgrade(&self.entries);
        WatcherRemover {
            remove: Some(Box::new(move || {
                if let Some(entries) = entries.upgrade() {
                    entries.borrow_mut().retain(|e| e.id != id);
                }
            })),
        }
    }

    /// Notify every watcher registered at the time of the call, in
    /// registration order.
    pub fn fire(&self, notify: impl FnMut(&W)) {
        self.fire_while(|| true, notify);
    }

    /// Like [`fire`](Self::fire), but stops before the next watcher once
    /// `proceed` returns false. Once-watchers that were not reached stay
    /// registered, and one already notified by a nested `fire` is skipped.
    pub fn fire_while(&self, proceed: impl Fn() -> bool, mut notify: impl FnMut(&W)) {
        let snapshot: Vec<(u64, bool, Rc<W>)> = self
            .entries
            .borrow()
            .iter()
            .map(|e| (e.id, e.once, Rc::clone(&e.watcher)))
            .collect();

        for (id, once, watcher) in snapshot {
            if !proceed() {
                break;
            }
            if once && !self.take(id) {
                continue;
            }
            notify(&watcher);
        }
    }

    /// Unregister `id`; false when it was already gone.
    fn take(&self, id: u64) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<W: ?Sized + 'static> Default for Watchers<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: ?Sized> fmt::Debug for Watchers<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watchers")
            .field("count", &self.entries.borrow().len())
            .finish()
    }
}

/// Handle returned by [`Watchers::add`]; call [`remove`](Self::remove) to unregister.
pub struct WatcherRemover {
    remove: Option<Box<dyn FnOnce()>>,
}

impl WatcherRemover {
    pub fn remove(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for WatcherRemover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WatcherRemover")
    }
}
