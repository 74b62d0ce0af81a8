//! The state machine driver.
//!
//! A [`StateMachine`] owns a fixed set of states supplied up front by
//! [`StateMachine::configure`] and moves between them by concrete type.
//!
//! # Transition order
//!
//! For `transition_to::<Next>()` with `Current` active:
//!
//! 1. `Current::on_exit(&next)` runs to completion
//! 2. the machine's current state becomes `Next`
//! 3. `Next::on_enter(Some(&current), arg)` runs
//!
//! A request for the state that is already current is rejected unless the
//! request allows self-transitions. Hooks may call back into the machine.

mod clock;
mod driver;
mod error;
mod options;

pub use clock::{FrameCounter, TickSource};
pub use driver::{MachineRef, StateMachine, TransitionOutcome, TransitionRequest};
pub use error::StateMachineError;
pub use options::{MachineOptions, DEFAULT_TRACE_CAPACITY};
