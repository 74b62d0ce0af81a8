//! Type-keyed publish/subscribe dispatcher.

use super::handler_list::{DeliveryPass, HandlerList};
use super::subscription::Subscription;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Callable registered for one event type.
///
/// Handlers are compared by the identity of their `Rc` allocation, so keep a
/// clone of the `Rc` around if you intend to unsubscribe it later.
pub type Handler<E> = Rc<dyn Fn(&E)>;

/// Wrap a closure into a [`Handler`].
///
/// # Example
///
/// ```rust
/// use signalbox::events::{handler, EventDispatcher};
///
/// struct Ping;
///
/// let dispatcher = EventDispatcher::new();
/// let on_ping = handler(|_: &Ping| println!("pong"));
///
/// assert!(dispatcher.subscribe(&on_ping).is_some());
/// assert!(dispatcher.subscribe(&on_ping).is_none()); // already registered
/// ```
pub fn handler<E, F>(f: F) -> Handler<E>
where
    F: Fn(&E) + 'static,
{
    Rc::new(f)
}

/// Delivery priority of a subscription
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Appended after existing handlers
    #[default]
    Normal,

    /// Inserted before existing handlers. Reserve for handlers that must
    /// observe an event before everyone else.
    High,
}

type SharedList<E> = Rc<RefCell<HandlerList<E>>>;

/// Handler lists keyed by event type.
///
/// Each value is a `SharedList<E>` erased to `Rc<dyn Any>`; [`Registry::list`]
/// is the only place it is recovered, always with the `E` it was stored under.
#[derive(Default)]
struct Registry {
    lists: RefCell<FxHashMap<TypeId, Rc<dyn Any>>>,
}

impl Registry {
    fn list<E: 'static>(&self) -> Option<SharedList<E>> {
        let erased = Rc::clone(self.lists.borrow().get(&TypeId::of::<E>())?);
        erased.downcast::<RefCell<HandlerList<E>>>().ok()
    }

    fn list_or_insert<E: 'static>(&self) -> SharedList<E> {
        if let Some(list) = self.list::<E>() {
            return list;
        }
        let list: SharedList<E> = Rc::new(RefCell::new(HandlerList::new()));
        let erased: Rc<dyn Any> = Rc::clone(&list) as Rc<dyn Any>;
        self.lists.borrow_mut().insert(TypeId::of::<E>(), erased);
        list
    }
}

/// Synchronous, single-threaded event dispatcher keyed by event type.
///
/// `EventDispatcher` is a cheap handle: clones share the same registry.
/// Handlers that need to re-enter the dispatcher should capture a
/// [`WeakDispatcher`] (see [`EventDispatcher::downgrade`]) to avoid keeping
/// the registry alive through itself.
///
/// # Delivery rules
///
/// - Handlers run in list order; [`Priority::High`] subscriptions go first.
/// - A pass delivers to the handlers present when it begins. Handlers added
///   during the pass wait for the next publish.
/// - A handler removed during a pass is skipped if the pass has not reached
///   it yet.
///
/// # Example
///
/// ```rust
/// use signalbox::events::{handler, EventDispatcher, Priority};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// struct Damage(u32);
///
/// let dispatcher = EventDispatcher::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let log = Rc::clone(&seen);
/// let normal = handler(move |d: &Damage| log.borrow_mut().push(("normal", d.0)));
/// let log = Rc::clone(&seen);
/// let shield = handler(move |d: &Damage| log.borrow_mut().push(("shield", d.0)));
///
/// let _a = dispatcher.subscribe(&normal);
/// let _b = dispatcher.subscribe_with_priority(&shield, Priority::High);
///
/// dispatcher.publish(&Damage(7));
/// assert_eq!(*seen.borrow(), vec![("shield", 7), ("normal", 7)]);
/// ```
#[derive(Clone, Default)]
pub struct EventDispatcher {
    registry: Rc<Registry>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-owning handle to this dispatcher.
    pub fn downgrade(&self) -> WeakDispatcher {
        WeakDispatcher {
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Subscribe `handler` with [`Priority::Normal`].
    ///
    /// Returns `None` if the same handler is already registered for `E`.
    pub fn subscribe<E: 'static>(&self, handler: &Handler<E>) -> Option<Subscription> {
        self.subscribe_with_priority(handler, Priority::Normal)
    }

    /// Subscribe `handler` for events of type `E`.
    ///
    /// Returns `None` (and changes nothing) if the same handler is already
    /// registered for `E`.
    pub fn subscribe_with_priority<E: 'static>(
        &self,
        handler: &Handler<E>,
        priority: Priority,
    ) -> Option<Subscription> {
        let list = self.registry.list_or_insert::<E>();
        let mut list = list.borrow_mut();
        if list.contains(handler) {
            tracing::trace!(event = type_name::<E>(), "duplicate subscription ignored");
            return None;
        }
        match priority {
            Priority::High => list.push_front(Rc::clone(handler)),
            Priority::Normal => list.push_back(Rc::clone(handler)),
        };
        drop(list);
        Some(Subscription::new(self.downgrade(), Rc::clone(handler)))
    }

    /// Subscribe a closure. A fresh closure can never be a duplicate, so a
    /// subscription is always returned.
    pub fn subscribe_fn<E, F>(&self, f: F) -> Subscription
    where
        E: 'static,
        F: Fn(&E) + 'static,
    {
        let registered = handler(f);
        self.registry
            .list_or_insert::<E>()
            .borrow_mut()
            .push_back(Rc::clone(&registered));
        Subscription::new(self.downgrade(), registered)
    }

    /// Deliver `event` to every handler registered for `E`.
    pub fn publish<E: 'static>(&self, event: &E) {
        let Some(list) = self.registry.list::<E>() else {
            tracing::trace!(event = type_name::<E>(), "published with no subscribers");
            return;
        };

        let pass = DeliveryPass::begin(&list);
        let Some((first, last)) = pass.bounds() else {
            return;
        };

        let mut cursor = Some(first);
        while let Some(key) = cursor {
            // No borrow may be held while the handler runs: it is free to
            // subscribe, unsubscribe or publish again.
            let current = list.borrow().handler_at(key);
            let delivered = current.is_some();
            if let Some(handler) = current {
                handler(event);
            }
            // A pass end removed before the cursor reached it no longer
            // bounds the pass; it then runs to the end of the list.
            if key == last && delivered {
                break;
            }
            cursor = list.borrow().next_of(key);
        }
    }

    /// Publish `E::default()`.
    pub fn publish_default<E: Default + 'static>(&self) {
        self.publish(&E::default());
    }

    /// Remove `handler` from the handlers of `E`.
    ///
    /// Returns `false` if it was not registered.
    pub fn unsubscribe<E: 'static>(&self, handler: &Handler<E>) -> bool {
        self.registry
            .list::<E>()
            .is_some_and(|list| list.borrow_mut().remove(handler))
    }

    /// Whether `handler` is currently registered for `E`.
    pub fn contains<E: 'static>(&self, handler: &Handler<E>) -> bool {
        self.registry
            .list::<E>()
            .is_some_and(|list| list.borrow().contains(handler))
    }

    /// Number of handlers currently registered for `E`.
    pub fn handler_count<E: 'static>(&self) -> usize {
        self.registry
            .list::<E>()
            .map_or(0, |list| list.borrow().len())
    }

    /// Number of event types that have ever had a subscriber.
    pub fn event_type_count(&self) -> usize {
        self.registry.lists.borrow().len()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("event_types", &self.event_type_count())
            .finish()
    }
}

/// Non-owning handle to an [`EventDispatcher`].
#[derive(Clone, Default)]
pub struct WeakDispatcher {
    registry: Weak<Registry>,
}

impl WeakDispatcher {
    /// Recover the dispatcher, or `None` once every strong handle is gone.
    pub fn upgrade(&self) -> Option<EventDispatcher> {
        self.registry
            .upgrade()
            .map(|registry| EventDispatcher { registry })
    }
}

impl fmt::Debug for WeakDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDispatcher")
            .field("alive", &(self.registry.strong_count() > 0))
            .finish()
    }
}
