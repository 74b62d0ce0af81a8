//! Builder API for ergonomic state machine construction.
//!
//! This module provides a fluent builder and macros for declaring states and
//! assembling a configured machine with minimal boilerplate.

pub mod machine;
pub mod macros;

pub use machine::StateMachineBuilder;
