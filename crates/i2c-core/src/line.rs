//! Open-drain line model.
//!
//! I2C lines are pulled high externally; a connected device may only pull a
//! line low or release it. The pad capability trait has no drive-high
//! operation, so the open-drain discipline holds by construction.

/// Capability interface for one open-drain pad.
///
/// The only operations are pulling the line low and releasing it; sampling
/// the line level is always available regardless of drive state.
pub trait OpenDrainPad {
    /// Request that the line be pulled low.
    fn drive_low(&mut self);

    /// Release the line; the external pull-up returns it high unless some
    /// other device is pulling it low.
    fn release(&mut self);

    /// Sample the line level (`true` = high).
    fn sample(&self) -> bool;
}

/// A shared open-drain wire with an external pull-up.
///
/// Each connected device attaches once and drives the wire through its own
/// slot; the wire is high exactly when no slot is pulling it low.
#[derive(Debug, Clone)]
pub struct Wire {
    pulls: Vec<bool>,
}

impl Wire {
    #[must_use]
    pub fn new() -> Self {
        Self { pulls: Vec::new() }
    }

    /// Attach a new driver, returning its slot index.
    pub fn attach(&mut self) -> usize {
        self.pulls.push(false);
        self.pulls.len() - 1
    }

    /// Current wire level (`true` = high).
    #[must_use]
    pub fn level(&self) -> bool {
        !self.pulls.iter().any(|&pull| pull)
    }

    /// Borrow a pad handle for the given driver slot.
    pub fn driver(&mut self, slot: usize) -> WireDriver<'_> {
        WireDriver { wire: self, slot }
    }
}

impl Default for Wire {
    fn default() -> Self {
        Self::new()
    }
}

/// Pad handle for one driver slot of a [`Wire`].
pub struct WireDriver<'a> {
    wire: &'a mut Wire,
    slot: usize,
}

impl OpenDrainPad for WireDriver<'_> {
    fn drive_low(&mut self) {
        self.wire.pulls[self.slot] = true;
    }

    fn release(&mut self) {
        self.wire.pulls[self.slot] = false;
    }

    fn sample(&self) -> bool {
        self.wire.level()
    }
}

/// Line-driver backend selection.
///
/// Some pad primitives expose output/enable signals natively; others need an
/// explicit tri-state buffer in front of the pad. Both drive the wire
/// identically; the choice is made at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadDriver {
    /// Route drive requests through an explicit [`TristateBuffer`].
    #[default]
    Tristate,
    /// Call the pad capability directly.
    Direct,
}

/// Registered tri-state buffer in front of an open-drain pad.
///
/// The buffered output value is fixed low; only the output enable is
/// controlled, so the buffer can never drive the line high.
#[derive(Debug, Clone, Copy, Default)]
pub struct TristateBuffer {
    oe: bool,
}

impl TristateBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self { oe: false }
    }

    /// Latch the output enable for this cycle.
    pub fn set_enable(&mut self, oe: bool) {
        self.oe = oe;
    }

    /// Whether the buffer is currently driving (pulling low).
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.oe
    }

    /// Apply the latched enable to the pad.
    pub fn apply<P: OpenDrainPad>(&self, pad: &mut P) {
        if self.oe {
            pad.drive_low();
        } else {
            pad.release();
        }
    }
}
