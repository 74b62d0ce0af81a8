//! Macros for ergonomic state machine construction.

/// Box a heterogeneous list of states for [`StateMachine::configure`].
///
/// [`StateMachine::configure`]: crate::machine::StateMachine::configure
///
/// # Example
///
/// ```
/// use signalbox::{simple_state, states};
/// use signalbox::machine::StateMachine;
///
/// simple_state!(struct Menu);
/// simple_state!(struct Playing);
///
/// let machine = StateMachine::new();
/// machine
///     .configure(states![Menu::default(), Playing::default()], true)
///     .unwrap();
/// assert_eq!(machine.state_count(), 2);
/// ```
#[macro_export]
macro_rules! states {
    ($($state:expr),* $(,)?) => {
        ::std::vec![
            $(::std::boxed::Box::new($state) as ::std::boxed::Box<dyn $crate::core::State>),*
        ]
    };
}

/// Declare hook-less state types.
///
/// Each generated struct holds only a [`StateCore`](crate::core::StateCore),
/// derives `Default`, and implements [`State`](crate::core::State) with the
/// default no-op hooks. Useful for marker states and tests.
///
/// # Example
///
/// ```
/// use signalbox::simple_state;
/// use signalbox::core::State;
///
/// simple_state! {
///     /// Waiting for input
///     pub struct Idle;
///     struct Busy;
/// }
///
/// assert_eq!(Idle::default().name(), "Idle");
/// assert!(!Busy::default().core().is_active());
/// ```
#[macro_export]
macro_rules! simple_state {
    ($(
        $(#[$meta:meta])*
        $vis:vis struct $name:ident
    );+ $(;)?) => {
        $(
            $(#[$meta])*
            #[derive(Default, Debug)]
            $vis struct $name {
                core: $crate::core::StateCore,
            }

            impl $crate::core::State for $name {
                fn core(&self) -> &$crate::core::StateCore {
                    &self.core
                }
            }
        )+
    };
}
