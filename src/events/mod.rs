//! Type-keyed event dispatch.
//!
//! Events are plain Rust values; the channel they travel on is their type.
//! Two event types never share handlers, even if they have the same shape.
//!
//! # Key Concepts
//!
//! - **Handler**: an `Rc<dyn Fn(&E)>`, identified by its allocation
//! - **Dispatcher**: the registry of handler lists, one per event type
//! - **Subscription**: an idempotent release token for one handler
//!
//! Delivery is synchronous and runs on the publishing thread. Handlers may
//! subscribe, unsubscribe, or publish while an event is being delivered.

mod dispatcher;
mod handler_list;
mod subscription;

pub use dispatcher::{handler, EventDispatcher, Handler, Priority, WeakDispatcher};
pub use subscription::{Subscription, SubscriptionGuard};
