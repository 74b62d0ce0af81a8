//! State machine driver over a fixed, type-keyed set of states.

use crate::core::{short_type_name, State, TransitionLog, TransitionRecord};
use crate::machine::clock::TickSource;
use crate::machine::error::StateMachineError;
use crate::machine::options::MachineOptions;
use chrono::Utc;
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// What a transition request ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Hooks ran and the target is now current
    Entered,

    /// Target is already current and self-transition was not allowed;
    /// nothing ran
    Rejected,

    /// While the previous state was exiting, the machine was reconfigured,
    /// disposed, or moved to another state by a nested transition; the
    /// target was not entered
    Abandoned,
}

/// Parameters of a transition beyond its target type.
#[derive(Default)]
pub struct TransitionRequest {
    arg: Option<Box<dyn Any>>,
    allow_self: bool,
}

impl TransitionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value handed to the target's `on_enter`.
    pub fn with_arg<A: Any>(mut self, arg: A) -> Self {
        self.arg = Some(Box::new(arg));
        self
    }

    /// Run exit/enter even if the target is already current.
    pub fn allow_self(mut self) -> Self {
        self.allow_self = true;
        self
    }
}

impl fmt::Debug for TransitionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRequest")
            .field("has_arg", &self.arg.is_some())
            .field("allow_self", &self.allow_self)
            .finish()
    }
}

#[derive(Default)]
struct StateTable {
    states: IndexMap<TypeId, Rc<dyn State>>,
    current: Option<Rc<dyn State>>,
    report_errors: bool,
    /// Bumped whenever the state set is replaced or a transition commits
    generation: u64,
}

struct MachineInner {
    table: RefCell<StateTable>,
    options: MachineOptions,
    ticks: Option<Box<dyn TickSource>>,
    trace: RefCell<TransitionLog>,
}

impl Drop for MachineInner {
    fn drop(&mut self) {
        let table = std::mem::take(self.table.get_mut());
        for state in table.states.values() {
            state.core().set_active(false);
            state.dispose();
        }
    }
}

/// Drives transitions between a fixed set of states addressed by type.
///
/// `StateMachine` is a cheap handle; clones drive the same machine. States
/// reach their machine through the non-owning [`MachineRef`] stored in their
/// [`StateCore`](crate::core::StateCore).
///
/// # Example
///
/// ```rust
/// use signalbox::core::{State, StateCore};
/// use signalbox::machine::{StateMachine, TransitionOutcome};
/// use signalbox::states;
///
/// #[derive(Default)]
/// struct Idle { core: StateCore }
/// #[derive(Default)]
/// struct Walking { core: StateCore }
///
/// impl State for Idle {
///     fn core(&self) -> &StateCore { &self.core }
/// }
/// impl State for Walking {
///     fn core(&self) -> &StateCore { &self.core }
/// }
///
/// let machine = StateMachine::new();
/// machine.configure(states![Idle::default(), Walking::default()], true)?;
///
/// assert!(machine.current_state().is_none());
/// assert_eq!(machine.transition_to::<Idle>()?, TransitionOutcome::Entered);
/// assert_eq!(machine.transition_to::<Walking>()?, TransitionOutcome::Entered);
/// assert!(machine.is_current::<Walking>());
/// # Ok::<(), signalbox::machine::StateMachineError>(())
/// ```
#[derive(Clone)]
pub struct StateMachine {
    inner: Rc<MachineInner>,
}

impl StateMachine {
    /// Machine with default options and no tick source.
    pub fn new() -> Self {
        Self::from_parts(MachineOptions::default(), None)
    }

    /// Machine with transition tracing switched on or off.
    pub fn with_debug(debug: bool) -> Self {
        Self::from_parts(
            MachineOptions {
                debug,
                ..MachineOptions::default()
            },
            None,
        )
    }

    pub(crate) fn from_parts(options: MachineOptions, ticks: Option<Box<dyn TickSource>>) -> Self {
        let report_errors = options.report_errors;
        let trace = TransitionLog::with_capacity(if options.debug {
            options.trace_capacity
        } else {
            0
        });
        Self {
            inner: Rc::new(MachineInner {
                table: RefCell::new(StateTable {
                    report_errors,
                    ..StateTable::default()
                }),
                options,
                ticks,
                trace: RefCell::new(trace),
            }),
        }
    }

    /// Non-owning handle to this machine.
    pub fn downgrade(&self) -> MachineRef {
        MachineRef {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn options(&self) -> &MachineOptions {
        &self.inner.options
    }

    /// Replace the configured states.
    ///
    /// Previously configured states are disposed first. A current state is
    /// dropped without its `on_exit` running, and the machine starts over
    /// with no current state.
    ///
    /// Supplying two states of the same concrete type fails with
    /// [`StateMachineError::DuplicateState`] and leaves the previous
    /// configuration in place.
    pub fn configure<I>(&self, states: I, report_errors: bool) -> Result<(), StateMachineError>
    where
        I: IntoIterator<Item = Box<dyn State>>,
    {
        let mut incoming: IndexMap<TypeId, Rc<dyn State>> = IndexMap::new();
        for state in states {
            let state: Rc<dyn State> = Rc::from(state);
            match incoming.entry(state.type_key()) {
                Entry::Occupied(_) => {
                    return Err(StateMachineError::DuplicateState {
                        state: state.name().to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(state);
                }
            }
        }

        self.clear();

        let handle = self.downgrade();
        for state in incoming.values() {
            if !state.core().attach(handle.clone()) {
                tracing::warn!(
                    state = state.name(),
                    "state already belongs to a machine; keeping its original back-reference"
                );
            }
        }

        let mut table = self.inner.table.borrow_mut();
        table.states = incoming;
        table.report_errors = report_errors;
        Ok(())
    }

    /// Transition to `T` with no argument, rejecting self-transitions.
    pub fn transition_to<T: State>(&self) -> Result<TransitionOutcome, StateMachineError> {
        self.transition::<T>(TransitionRequest::new())
    }

    /// Transition to `T`, handing `arg` to its `on_enter`.
    pub fn transition_with<T: State, A: Any>(
        &self,
        arg: A,
    ) -> Result<TransitionOutcome, StateMachineError> {
        self.transition::<T>(TransitionRequest::new().with_arg(arg))
    }

    /// Transition to `T`.
    ///
    /// The current state's `on_exit` completes before the current state
    /// changes, and only then does the target's `on_enter` run. If `on_exit`
    /// starts another transition, or reconfigures or disposes the machine,
    /// this request yields [`TransitionOutcome::Abandoned`] and the nested
    /// change stands.
    ///
    /// # Errors
    ///
    /// [`StateMachineError::UnknownState`] if `T` was not configured; the
    /// current state is left unchanged.
    pub fn transition<T: State>(
        &self,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, StateMachineError> {
        let (target, previous, report_errors, generation) = {
            let table = self.inner.table.borrow();
            let target = table
                .states
                .get(&TypeId::of::<T>())
                .cloned()
                .ok_or_else(|| StateMachineError::UnknownState {
                    state: short_type_name(type_name::<T>()).to_string(),
                })?;
            (
                target,
                table.current.clone(),
                table.report_errors,
                table.generation,
            )
        };

        if let Some(previous) = &previous {
            if !request.allow_self && Rc::ptr_eq(previous, &target) {
                if report_errors {
                    tracing::error!(
                        state = previous.name(),
                        "trying to change state from {} to the same state",
                        previous.name()
                    );
                }
                return Ok(TransitionOutcome::Rejected);
            }

            previous.core().set_active(false);
            previous.on_exit(&*target);

            if self.inner.table.borrow().generation != generation {
                tracing::debug!(
                    from = previous.name(),
                    to = target.name(),
                    "transition abandoned, machine changed during exit"
                );
                return Ok(TransitionOutcome::Abandoned);
            }
        }

        if self.inner.options.debug {
            self.trace(previous.as_deref(), &*target);
        }

        {
            let mut table = self.inner.table.borrow_mut();
            table.current = Some(Rc::clone(&target));
            table.generation += 1;
        }
        target.on_enter(previous.as_deref(), request.arg.as_deref());

        // A nested transition from inside on_enter may already have moved on.
        if self.is_current_instance(&target) {
            target.core().set_active(true);
        }
        Ok(TransitionOutcome::Entered)
    }

    fn trace(&self, from: Option<&dyn State>, to: &dyn State) {
        let tick = self.inner.ticks.as_ref().map(|ticks| ticks.tick());
        let from = from.map(|state| state.name().to_string());
        tracing::debug!(from = from.as_deref(), to = to.name(), tick, "state transition");
        self.inner.trace.borrow_mut().record(TransitionRecord {
            from,
            to: to.name().to_string(),
            tick,
            timestamp: Utc::now(),
        });
    }

    fn is_current_instance(&self, state: &Rc<dyn State>) -> bool {
        self.inner
            .table
            .borrow()
            .current
            .as_ref()
            .is_some_and(|current| Rc::ptr_eq(current, state))
    }

    /// The current state, `None` before the first transition.
    pub fn current_state(&self) -> Option<Rc<dyn State>> {
        self.inner.table.borrow().current.clone()
    }

    pub fn current_name(&self) -> Option<String> {
        self.inner
            .table
            .borrow()
            .current
            .as_ref()
            .map(|state| state.name().to_string())
    }

    /// Whether the current state is of type `T`.
    pub fn is_current<T: State>(&self) -> bool {
        self.inner
            .table
            .borrow()
            .current
            .as_ref()
            .is_some_and(|state| state.is::<T>())
    }

    /// The configured state of type `T`.
    pub fn state<T: State>(&self) -> Option<Rc<T>> {
        let state = self
            .inner
            .table
            .borrow()
            .states
            .get(&TypeId::of::<T>())
            .cloned()?;
        state.into_any_rc().downcast::<T>().ok()
    }

    /// Whether a state of type `T` is configured.
    pub fn contains<T: State>(&self) -> bool {
        self.inner
            .table
            .borrow()
            .states
            .contains_key(&TypeId::of::<T>())
    }

    pub fn state_count(&self) -> usize {
        self.inner.table.borrow().states.len()
    }

    /// Names of the configured states, in configuration order.
    pub fn state_names(&self) -> Vec<String> {
        self.inner
            .table
            .borrow()
            .states
            .values()
            .map(|state| state.name().to_string())
            .collect()
    }

    pub fn report_errors(&self) -> bool {
        self.inner.table.borrow().report_errors
    }

    /// Snapshot of the transition trace. Empty unless the machine was built
    /// with `debug` on.
    pub fn transition_log(&self) -> TransitionLog {
        self.inner.trace.borrow().clone()
    }

    /// Dispose every configured state and forget them; equivalent to
    /// configuring an empty set.
    pub fn dispose(&self) {
        self.clear();
    }

    fn clear(&self) {
        let retired = {
            let mut table = self.inner.table.borrow_mut();
            table.generation += 1;
            table.current = None;
            std::mem::take(&mut table.states)
        };
        // Dispose with no borrow held: a state may call back into the machine.
        for state in retired.values() {
            state.core().set_active(false);
            state.dispose();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current_name())
            .field("states", &self.state_names())
            .field("debug", &self.inner.options.debug)
            .finish()
    }
}

/// Non-owning handle to a [`StateMachine`], held by its states.
#[derive(Clone)]
pub struct MachineRef {
    inner: Weak<MachineInner>,
}

impl MachineRef {
    pub fn upgrade(&self) -> Option<StateMachine> {
        self.inner.upgrade().map(|inner| StateMachine { inner })
    }

    /// Ask the owning machine to transition to `T`.
    ///
    /// # Errors
    ///
    /// [`StateMachineError::Detached`] if the machine is gone, otherwise as
    /// [`StateMachine::transition`].
    pub fn transition_to<T: State>(&self) -> Result<TransitionOutcome, StateMachineError> {
        self.transition::<T>(TransitionRequest::new())
    }

    pub fn transition_with<T: State, A: Any>(
        &self,
        arg: A,
    ) -> Result<TransitionOutcome, StateMachineError> {
        self.transition::<T>(TransitionRequest::new().with_arg(arg))
    }

    pub fn transition<T: State>(
        &self,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, StateMachineError> {
        self.upgrade()
            .ok_or(StateMachineError::Detached)?
            .transition::<T>(request)
    }
}

impl fmt::Debug for MachineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineRef")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
