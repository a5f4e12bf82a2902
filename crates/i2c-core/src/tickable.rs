//! Trait for components that can be advanced by clock ticks.

use crate::Ticks;

/// A component that can be advanced by system clock ticks.
///
/// This is the core abstraction for cycle-accurate modelling. Exactly one
/// state-machine step occurs per tick; all next-state updates are applied
/// atomically at the tick boundary.
pub trait Tickable {
    /// Advance the component by one system clock tick.
    fn tick(&mut self);

    /// Advance the component by multiple ticks.
    ///
    /// Default implementation calls `tick()` in a loop. Components may
    /// override for efficiency, but must produce identical results.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
