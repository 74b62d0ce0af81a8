//! Index-stable handler sequence for a single event type.
//!
//! Entries form a doubly linked list stored in a [`SlotMap`], so keys stay
//! valid while neighbours come and go. Removing an entry while a delivery
//! pass is walking the list only clears its handler (a tombstone); the node
//! stays linked until the outermost pass ends, which keeps every cursor held
//! by an in-flight pass pointing at a live node.

use super::dispatcher::Handler;
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::Rc;

new_key_type! {
    /// Stable identifier of one entry in a handler list
    pub(crate) struct EntryKey;
}

struct Entry<E: 'static> {
    /// `None` once removed during a delivery pass
    handler: Option<Handler<E>>,
    prev: Option<EntryKey>,
    next: Option<EntryKey>,
}

/// Ordered handlers registered for one event type.
pub(crate) struct HandlerList<E: 'static> {
    entries: SlotMap<EntryKey, Entry<E>>,
    head: Option<EntryKey>,
    tail: Option<EntryKey>,
    live: usize,
    tombstones: usize,
    passes: usize,
}

impl<E: 'static> HandlerList<E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            head: None,
            tail: None,
            live: 0,
            tombstones: 0,
            passes: 0,
        }
    }

    /// Number of live handlers.
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn contains(&self, handler: &Handler<E>) -> bool {
        self.find(handler).is_some()
    }

    fn find(&self, handler: &Handler<E>) -> Option<EntryKey> {
        let mut cursor = self.head;
        while let Some(key) = cursor {
            let entry = self.entries.get(key)?;
            if entry
                .handler
                .as_ref()
                .is_some_and(|registered| Rc::ptr_eq(registered, handler))
            {
                return Some(key);
            }
            cursor = entry.next;
        }
        None
    }

    pub(crate) fn push_front(&mut self, handler: Handler<E>) -> EntryKey {
        let key = self.entries.insert(Entry {
            handler: Some(handler),
            prev: None,
            next: self.head,
        });
        match self.head.and_then(|old| self.entries.get_mut(old)) {
            Some(old) => old.prev = Some(key),
            None => self.tail = Some(key),
        }
        self.head = Some(key);
        self.live += 1;
        key
    }

    pub(crate) fn push_back(&mut self, handler: Handler<E>) -> EntryKey {
        let key = self.entries.insert(Entry {
            handler: Some(handler),
            prev: self.tail,
            next: None,
        });
        match self.tail.and_then(|old| self.entries.get_mut(old)) {
            Some(old) => old.next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        self.live += 1;
        key
    }

    /// Remove the first live entry holding `handler`.
    pub(crate) fn remove(&mut self, handler: &Handler<E>) -> bool {
        let Some(key) = self.find(handler) else {
            return false;
        };
        self.live -= 1;
        if self.passes > 0 {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.handler = None;
                self.tombstones += 1;
            }
        } else {
            self.unlink(key);
        }
        true
    }

    fn unlink(&mut self, key: EntryKey) {
        let Some(entry) = self.entries.remove(key) else {
            return;
        };
        match entry.prev.and_then(|prev| self.entries.get_mut(prev)) {
            Some(prev) => prev.next = entry.next,
            None => self.head = entry.next,
        }
        match entry.next.and_then(|next| self.entries.get_mut(next)) {
            Some(next) => next.prev = entry.prev,
            None => self.tail = entry.prev,
        }
    }

    fn sweep(&mut self) {
        if self.tombstones == 0 {
            return;
        }
        let dead: Vec<EntryKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.handler.is_none())
            .map(|(key, _)| key)
            .collect();
        tracing::trace!(count = dead.len(), "sweeping removed handlers");
        for key in dead {
            self.unlink(key);
        }
        self.tombstones = 0;
    }

    /// Last entry that still holds a handler. Tombstones left by an outer
    /// pass are skipped.
    fn last_live(&self) -> Option<EntryKey> {
        let mut cursor = self.tail;
        while let Some(key) = cursor {
            let entry = self.entries.get(key)?;
            if entry.handler.is_some() {
                return Some(key);
            }
            cursor = entry.prev;
        }
        None
    }

    pub(crate) fn handler_at(&self, key: EntryKey) -> Option<Handler<E>> {
        self.entries.get(key).and_then(|entry| entry.handler.clone())
    }

    pub(crate) fn next_of(&self, key: EntryKey) -> Option<EntryKey> {
        self.entries.get(key).and_then(|entry| entry.next)
    }

    #[cfg(test)]
    fn linked_len(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.head;
        while let Some(key) = cursor {
            count += 1;
            cursor = self.next_of(key);
        }
        count
    }
}

/// Marks one delivery pass over a list.
///
/// While at least one pass is open, removals leave tombstones instead of
/// unlinking. Dropping the last open pass sweeps them, including when a
/// handler panics mid-delivery.
pub(crate) struct DeliveryPass<'a, E: 'static> {
    list: &'a RefCell<HandlerList<E>>,
    /// First entry and the entry that was last when the pass began
    bounds: Option<(EntryKey, EntryKey)>,
}

impl<'a, E: 'static> DeliveryPass<'a, E> {
    pub(crate) fn begin(list: &'a RefCell<HandlerList<E>>) -> Self {
        let mut inner = list.borrow_mut();
        inner.passes += 1;
        let bounds = inner.head.zip(inner.last_live());
        drop(inner);
        Self { list, bounds }
    }

    /// First entry and the entry that was last when the pass began, or
    /// `None` for an empty list.
    pub(crate) fn bounds(&self) -> Option<(EntryKey, EntryKey)> {
        self.bounds
    }
}

impl<E: 'static> Drop for DeliveryPass<'_, E> {
    fn drop(&mut self) {
        let mut inner = self.list.borrow_mut();
        inner.passes = inner.passes.saturating_sub(1);
        if inner.passes == 0 {
            inner.sweep();
        }
    }
}
