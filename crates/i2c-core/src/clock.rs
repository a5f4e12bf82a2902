//! System clock configuration.

/// System clock configuration for a bus instance.
///
/// The controller runs synchronously from one system clock; the bus clock is
/// divided down from it per speed mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysClock {
    /// System clock frequency in Hz (e.g. `100_000_000`).
    pub frequency_hz: u64,
}

impl SysClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }
}
