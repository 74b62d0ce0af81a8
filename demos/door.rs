//! Door State Machine
//!
//! This demo drives a door through its states from a simulated frame loop.
//!
//! Key concepts:
//! - States holding their own data in `Cell` fields
//! - States requesting the next transition through their back-reference
//! - Passing an argument to `on_enter`
//! - Transition tracing stamped with the frame number
//!
//! Run with: RUST_LOG=debug cargo run --example door

use signalbox::core::{State, StateCore};
use signalbox::machine::{FrameCounter, StateMachineError, TransitionRequest};
use signalbox::StateMachineBuilder;
use std::any::Any;
use std::cell::Cell;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Closed {
    core: StateCore,
}

/// Opens a little more every frame, then hands over to `Open`.
#[derive(Default)]
struct Opening {
    core: StateCore,
    progress: Cell<u32>,
    speed: Cell<u32>,
}

#[derive(Default)]
struct Open {
    core: StateCore,
}

/// Refuses to open until unlocked.
#[derive(Default)]
struct Locked {
    core: StateCore,
    attempts: Cell<u32>,
}

impl State for Closed {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn on_enter(&self, previous: Option<&dyn State>, _arg: Option<&dyn Any>) {
        if let Some(previous) = previous {
            println!("  door closed (was {})", previous.name());
        }
    }
}

impl Opening {
    fn update(&self) -> Result<(), StateMachineError> {
        let progress = (self.progress.get() + self.speed.get()).min(100);
        self.progress.set(progress);
        println!("  opening... {progress}%");
        if progress == 100 {
            if let Some(machine) = self.core.machine_ref() {
                machine.transition_to::<Open>()?;
            }
        }
        Ok(())
    }
}

impl State for Opening {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn on_enter(&self, _previous: Option<&dyn State>, arg: Option<&dyn Any>) {
        let speed = arg.and_then(|a| a.downcast_ref::<u32>()).copied().unwrap_or(25);
        self.speed.set(speed);
        self.progress.set(0);
    }

    fn on_exit(&self, next: &dyn State) {
        println!("  stopped opening at {}% ({})", self.progress.get(), next.name());
    }
}

impl State for Open {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn on_enter(&self, _previous: Option<&dyn State>, _arg: Option<&dyn Any>) {
        println!("  door is open");
    }
}

impl State for Locked {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn on_enter(&self, _previous: Option<&dyn State>, _arg: Option<&dyn Any>) {
        self.attempts.set(0);
    }

    fn dispose(&self) {
        println!("  lock released after {} attempts", self.attempts.get());
    }
}

fn main() -> Result<(), StateMachineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Door State Machine ===\n");

    let frames = FrameCounter::new();
    let machine = StateMachineBuilder::new()
        .debug(true)
        .tick_source(frames.clone())
        .state(Closed::default())
        .state(Opening::default())
        .state(Open::default())
        .state(Locked::default())
        .build()?;

    machine.transition_to::<Locked>()?;
    println!("Start: {:?}\n", machine.current_name());

    for frame in 1..=8 {
        frames.set(frame);
        println!("frame {frame}:");

        match frame {
            1 | 2 => {
                if let Some(locked) = machine.state::<Locked>() {
                    locked.attempts.set(locked.attempts.get() + 1);
                    println!("  locked, attempt {}", locked.attempts.get());
                }
            }
            3 => {
                machine.transition_to::<Closed>()?;
            }
            4 => {
                machine.transition_with::<Opening, _>(40_u32)?;
            }
            _ => {
                if let Some(opening) = machine.state::<Opening>() {
                    if opening.core().is_active() {
                        opening.update()?;
                    }
                }
            }
        }
    }

    // Already open: rejected and reported.
    machine.transition_to::<Open>()?;
    // Explicitly re-entering is allowed.
    machine.transition::<Open>(TransitionRequest::new().allow_self())?;

    println!("\nTransition trace:");
    for record in machine.transition_log().iter() {
        println!(
            "  frame {:>2}: {} -> {}",
            record.tick.unwrap_or_default(),
            record.from.as_deref().unwrap_or("(start)"),
            record.to
        );
    }

    machine.dispose();
    println!("\n=== Demo Complete ===");
    Ok(())
}
