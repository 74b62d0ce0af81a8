//! Core State trait for machine-driven states.
//!
//! A state is a host-defined value with lifecycle hooks. The machine owns
//! every configured state and addresses it by its concrete type, so each
//! state type may be configured at most once per machine.

use crate::machine::{MachineRef, StateMachine};
use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, OnceCell};
use std::fmt;
use std::rc::Rc;

/// Upcasting helpers so trait objects can be downcast to their concrete type.
///
/// Implemented for every `'static` type; there is no need to implement it
/// by hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Trait for states driven by a [`StateMachine`].
///
/// Hooks take `&self` because a hook may re-enter the machine (for example
/// `on_enter` requesting the next transition), which would otherwise alias a
/// mutable borrow. Keep mutable data in `Cell`/`RefCell` fields.
///
/// # Example
///
/// ```rust
/// use signalbox::core::{State, StateCore};
/// use std::any::Any;
/// use std::cell::Cell;
///
/// #[derive(Default)]
/// struct Charging {
///     core: StateCore,
///     level: Cell<u32>,
/// }
///
/// impl State for Charging {
///     fn core(&self) -> &StateCore {
///         &self.core
///     }
///
///     fn on_enter(&self, _previous: Option<&dyn State>, arg: Option<&dyn Any>) {
///         if let Some(level) = arg.and_then(|a| a.downcast_ref::<u32>()) {
///             self.level.set(*level);
///         }
///     }
/// }
///
/// let state = Charging::default();
/// assert_eq!(state.name(), "Charging");
/// assert!(!state.core().is_active());
/// ```
pub trait State: AsAny {
    /// Bookkeeping the machine maintains for this state.
    fn core(&self) -> &StateCore;

    /// Name used in diagnostics.
    ///
    /// Defaults to the concrete type name without its module path.
    fn name(&self) -> &str {
        short_type_name(type_name::<Self>())
    }

    /// Called right after this state becomes current.
    ///
    /// `previous` is `None` on the machine's first transition. `arg` is the
    /// optional value passed with the transition request.
    fn on_enter(&self, _previous: Option<&dyn State>, _arg: Option<&dyn Any>) {}

    /// Called right before this state stops being current.
    fn on_exit(&self, _next: &dyn State) {}

    /// Release held resources. Called once, when the machine drops its
    /// configured states.
    fn dispose(&self) {}
}

impl<'a> dyn State + 'a {
    /// Whether the concrete type of this state is `T`.
    pub fn is<T: State>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: State>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Key the machine files this state under.
    pub(crate) fn type_key(&self) -> TypeId {
        Any::type_id(self.as_any())
    }
}

impl fmt::Debug for dyn State + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name())
            .field("active", &self.core().is_active())
            .finish()
    }
}

/// Per-state bookkeeping: the back-reference to the owning machine and the
/// active flag.
///
/// Embed one in every state type and return it from [`State::core`].
#[derive(Default)]
pub struct StateCore {
    machine: OnceCell<MachineRef>,
    active: Cell<bool>,
}

impl StateCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True strictly between a completed `on_enter` and the start of the
    /// matching `on_exit`.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// The machine this state was configured into, while it is alive.
    pub fn machine(&self) -> Option<StateMachine> {
        self.machine.get().and_then(MachineRef::upgrade)
    }

    /// Non-owning handle to the machine; set once, at configuration.
    pub fn machine_ref(&self) -> Option<&MachineRef> {
        self.machine.get()
    }

    pub(crate) fn attach(&self, machine: MachineRef) -> bool {
        self.machine.set(machine).is_ok()
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.set(active);
    }
}

impl fmt::Debug for StateCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCore")
            .field("attached", &self.machine.get().is_some())
            .field("active", &self.active.get())
            .finish()
    }
}

/// Strip the module path from a type name, keeping generic arguments.
pub(crate) fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(at) => &full[at + 2..],
        None => full,
    }
}
