//! Release tokens for registered handlers.

use super::dispatcher::{Handler, WeakDispatcher};
use std::any::type_name;
use std::fmt;

/// Token for one registered handler.
///
/// [`dispose`](Subscription::dispose) unsubscribes the exact handler the
/// token was issued for; every call after the first does nothing. The token
/// only holds a weak reference to its dispatcher, so disposing after the
/// dispatcher is gone is also a no-op.
///
/// Dropping a `Subscription` leaves the handler registered. Use
/// [`into_guard`](Subscription::into_guard) for scope-bound registrations.
#[must_use = "dropping a Subscription keeps the handler registered; call dispose() or into_guard()"]
pub struct Subscription {
    event_type: &'static str,
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new<E: 'static>(dispatcher: WeakDispatcher, handler: Handler<E>) -> Self {
        let release = move || {
            if let Some(dispatcher) = dispatcher.upgrade() {
                dispatcher.unsubscribe(&handler);
            }
        };
        Self {
            event_type: type_name::<E>(),
            release: Some(Box::new(release)),
        }
    }

    /// Unsubscribe the handler. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.release.is_none()
    }

    /// Type name of the event this subscription listens to.
    pub fn event_type_name(&self) -> &'static str {
        self.event_type
    }

    /// Bind the registration to a scope: the guard disposes on drop.
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard { subscription: self }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &self.event_type)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Subscription that unsubscribes when dropped.
#[must_use = "the handler is unsubscribed as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SubscriptionGuard {
    subscription: Subscription,
}

impl SubscriptionGuard {
    pub fn is_disposed(&self) -> bool {
        self.subscription.is_disposed()
    }

    /// Unsubscribe before the guard goes out of scope.
    pub fn dispose(&mut self) {
        self.subscription.dispose();
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.subscription.dispose();
    }
}
