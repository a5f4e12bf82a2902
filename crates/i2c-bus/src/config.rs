//! Configuration for the composed bus controller.

use i2c_core::{PadDriver, SpeedMode, SysClock};

/// Relationship between the logical (user) clock domain and the engine's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhyDomain {
    /// One clock domain; commands cross through a plain stream register.
    #[default]
    Shared,
    /// The engine domain runs once per `divider` logical ticks; commands
    /// and responses cross through buffered ordered channels.
    Divided { divider: u32 },
}

impl PhyDomain {
    #[must_use]
    pub fn divider(self) -> u32 {
        match self {
            PhyDomain::Shared => 1,
            PhyDomain::Divided { divider } => divider.max(1),
        }
    }
}

/// Construction-time configuration for [`crate::I2cBus`].
#[derive(Debug, Clone)]
pub struct I2cBusConfig {
    /// Engine-domain clock; all bus timing derives from it.
    pub sys_clk: SysClock,
    /// Initial speed mode.
    pub speed_mode: SpeedMode,
    /// Front-end TX FIFO depth.
    pub tx_fifo_depth: usize,
    /// Front-end RX FIFO depth.
    pub rx_fifo_depth: usize,
    /// Logical/engine clock-domain relationship.
    pub phy_domain: PhyDomain,
    /// SCL line-driver backend.
    pub pad_driver: PadDriver,
}

impl Default for I2cBusConfig {
    fn default() -> Self {
        Self {
            sys_clk: SysClock::new(100_000_000),
            speed_mode: SpeedMode::Standard,
            tx_fifo_depth: 1,
            rx_fifo_depth: 1,
            phy_domain: PhyDomain::Shared,
            pad_driver: PadDriver::Tristate,
        }
    }
}
