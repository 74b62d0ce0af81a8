//! Builder for constructing state machines.

use crate::core::State;
use crate::machine::{MachineOptions, StateMachine, StateMachineError, TickSource};

/// Builder for constructing state machines with a fluent API.
///
/// # Example
///
/// ```rust
/// use signalbox::builder::StateMachineBuilder;
/// use signalbox::machine::FrameCounter;
/// use signalbox::simple_state;
///
/// simple_state! {
///     struct Loading;
///     struct Ready;
/// }
///
/// let frames = FrameCounter::new();
/// let machine = StateMachineBuilder::new()
///     .debug(true)
///     .tick_source(frames.clone())
///     .state(Loading::default())
///     .state(Ready::default())
///     .build()?;
///
/// frames.advance();
/// machine.transition_to::<Loading>()?;
/// assert_eq!(machine.transition_log().last().and_then(|r| r.tick), Some(1));
/// # Ok::<(), signalbox::machine::StateMachineError>(())
/// ```
pub struct StateMachineBuilder {
    options: MachineOptions,
    ticks: Option<Box<dyn TickSource>>,
    states: Vec<Box<dyn State>>,
}

impl StateMachineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            options: MachineOptions::default(),
            ticks: None,
            states: Vec::new(),
        }
    }

    /// Replace all options at once, e.g. with a table loaded from a file.
    pub fn options(mut self, options: MachineOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable transition tracing.
    pub fn debug(mut self, debug: bool) -> Self {
        self.options.debug = debug;
        self
    }

    /// Report rejected self-transitions for the states given to this builder.
    pub fn report_errors(mut self, report_errors: bool) -> Self {
        self.options.report_errors = report_errors;
        self
    }

    /// Number of transitions the debug trace retains.
    pub fn trace_capacity(mut self, capacity: usize) -> Self {
        self.options.trace_capacity = capacity;
        self
    }

    /// Stamp traced transitions with the host's tick.
    pub fn tick_source<T: TickSource + 'static>(mut self, ticks: T) -> Self {
        self.ticks = Some(Box::new(ticks));
        self
    }

    /// Add one state.
    pub fn state<S: State>(mut self, state: S) -> Self {
        self.states.push(Box::new(state));
        self
    }

    /// Add several boxed states, e.g. from [`states!`](crate::states).
    pub fn states<I>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn State>>,
    {
        self.states.extend(states);
        self
    }

    /// Build the machine and configure it with the collected states.
    ///
    /// Fails with [`StateMachineError::DuplicateState`] if two states share a
    /// concrete type.
    pub fn build(self) -> Result<StateMachine, StateMachineError> {
        let report_errors = self.options.report_errors;
        let machine = StateMachine::from_parts(self.options, self.ticks);
        if !self.states.is_empty() {
            machine.configure(self.states, report_errors)?;
        }
        Ok(machine)
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
