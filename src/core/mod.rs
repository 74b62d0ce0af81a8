//! Core state types.
//!
//! This module contains the pieces a host implements or inspects:
//! - The `State` trait and its embedded `StateCore` bookkeeping
//! - The diagnostic transition trace (`TransitionLog`)

mod history;
mod state;

pub use history::{TransitionLog, TransitionRecord};
pub use state::{AsAny, State, StateCore};

pub(crate) use state::short_type_name;
