//! Signalbox: type-keyed event dispatch and a lifecycle-driven state machine
//!
//! Signalbox provides two small building blocks for single-threaded hosts
//! such as game loops and UI shells.
//!
//! # Core Concepts
//!
//! - **Events**: An [`EventDispatcher`] routes a published value to every
//!   handler registered for its type. Each registration yields a
//!   [`Subscription`] that can later unsubscribe exactly that handler.
//! - **States**: Host types implement [`State`] and receive `on_enter`,
//!   `on_exit` and `dispose` calls from a [`StateMachine`].
//! - **Builder**: [`StateMachineBuilder`] and the [`states!`] /
//!   [`simple_state!`] macros cut down the boilerplate.
//!
//! # Example
//!
//! ```rust
//! use signalbox::{EventDispatcher, State, StateCore, StateMachine, TransitionOutcome};
//! use std::any::Any;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! struct LevelCleared(u32);
//!
//! #[derive(Default)]
//! struct Playing {
//!     core: StateCore,
//! }
//!
//! #[derive(Default)]
//! struct Victory {
//!     core: StateCore,
//!     level: Cell<u32>,
//! }
//!
//! impl State for Playing {
//!     fn core(&self) -> &StateCore {
//!         &self.core
//!     }
//! }
//!
//! impl State for Victory {
//!     fn core(&self) -> &StateCore {
//!         &self.core
//!     }
//!
//!     fn on_enter(&self, _previous: Option<&dyn State>, arg: Option<&dyn Any>) {
//!         if let Some(level) = arg.and_then(|a| a.downcast_ref::<u32>()) {
//!             self.level.set(*level);
//!         }
//!     }
//! }
//!
//! let machine = StateMachine::new();
//! machine.configure(signalbox::states![Playing::default(), Victory::default()], true)?;
//! machine.transition_to::<Playing>()?;
//!
//! let events = EventDispatcher::new();
//! let driver = machine.downgrade();
//! let cleared = Rc::new(Cell::new(false));
//! let flag = Rc::clone(&cleared);
//! let _sub = events.subscribe_fn(move |e: &LevelCleared| {
//!     flag.set(true);
//!     let _ = driver.transition_with::<Victory, _>(e.0);
//! });
//!
//! events.publish(&LevelCleared(3));
//!
//! assert!(cleared.get());
//! assert!(machine.is_current::<Victory>());
//! assert_eq!(machine.state::<Victory>().map(|v| v.level.get()), Some(3));
//! assert_eq!(machine.transition_to::<Victory>()?, TransitionOutcome::Rejected);
//! # Ok::<(), signalbox::StateMachineError>(())
//! ```

pub mod builder;
pub mod core;
pub mod events;
pub mod machine;

// Re-export commonly used types
pub use builder::StateMachineBuilder;
pub use crate::core::{State, StateCore, TransitionLog, TransitionRecord};
pub use events::{handler, EventDispatcher, Handler, Priority, Subscription, SubscriptionGuard};
pub use machine::{
    FrameCounter, MachineOptions, MachineRef, StateMachine, StateMachineError, TickSource,
    TransitionOutcome, TransitionRequest,
};
