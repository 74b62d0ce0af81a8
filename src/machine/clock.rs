//! Host tick source used to stamp diagnostics.

use std::cell::Cell;
use std::rc::Rc;

/// Supplies the host's current tick (frame number, simulation step, ...).
///
/// The machine only reads it for transition tracing. Any `Fn() -> u64` is a
/// tick source.
pub trait TickSource {
    fn tick(&self) -> u64;
}

impl<F> TickSource for F
where
    F: Fn() -> u64,
{
    fn tick(&self) -> u64 {
        self()
    }
}

/// Shared counter the host advances once per frame.
///
/// Clones share the same counter, so the host keeps one clone and hands
/// another to the machine.
///
/// # Example
///
/// ```rust
/// use signalbox::machine::{FrameCounter, TickSource};
///
/// let frames = FrameCounter::new();
/// let seen_by_machine = frames.clone();
///
/// frames.advance();
/// frames.advance();
/// assert_eq!(seen_by_machine.tick(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FrameCounter {
    frame: Rc<Cell<u64>>,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the next frame and return its number.
    pub fn advance(&self) -> u64 {
        let next = self.frame.get() + 1;
        self.frame.set(next);
        next
    }

    pub fn set(&self, frame: u64) {
        self.frame.set(frame);
    }
}

impl TickSource for FrameCounter {
    fn tick(&self) -> u64 {
        self.frame.get()
    }
}
