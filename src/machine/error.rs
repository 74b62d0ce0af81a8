//! State machine error types.

use thiserror::Error;

/// Errors raised by [`StateMachine`](crate::machine::StateMachine) operations.
///
/// Every variant signals a programming mistake in the host (a state that was
/// never configured, a state type supplied twice). Rejected self-transitions
/// are not errors; see [`TransitionOutcome`](crate::machine::TransitionOutcome).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    /// Transition requested to a state type that was never configured
    #[error("Unknown state with type {state}")]
    UnknownState { state: String },

    /// Two states of the same concrete type passed to one `configure` call
    #[error("State type {state} was supplied more than once")]
    DuplicateState { state: String },

    /// The machine behind a back-reference has been dropped
    #[error("State machine is no longer alive")]
    Detached,
}
