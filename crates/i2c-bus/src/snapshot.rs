//! JSON state export for host-side inspection tooling.
//!
//! Enabled by the `inspect` feature. Snapshots are taken between ticks and
//! never affect model state.

use crate::I2cBus;
use serde::Serialize;

/// Point-in-time state of the composed bus.
#[derive(Debug, Clone, Serialize)]
pub struct BusSnapshot {
    pub ticks: u64,
    pub phy_state: String,
    pub speed_mode: String,
    pub divisor: u32,
    pub grant: Option<usize>,
    pub scl: bool,
    pub sda: bool,
    pub master: MasterSnapshot,
}

/// Front-end state within a [`BusSnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct MasterSnapshot {
    pub active: bool,
    pub tx_ready: bool,
    pub rx_ready: bool,
    pub nack: bool,
    pub tx_unfinished: bool,
    pub rx_unfinished: bool,
}

impl BusSnapshot {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl I2cBus {
    /// Capture the current state for inspection.
    #[must_use]
    pub fn snapshot(&self) -> BusSnapshot {
        let status = self.master().status();
        BusSnapshot {
            ticks: self.ticks().get(),
            phy_state: format!("{:?}", self.phy().state()),
            speed_mode: format!("{:?}", self.phy().speed_mode()),
            divisor: self.phy().divisor(),
            grant: self.crossbar().grant(),
            scl: self.scl_level(),
            sda: self.sda_level(),
            master: MasterSnapshot {
                active: self.master().active(),
                tx_ready: status.tx_ready,
                rx_ready: status.rx_ready,
                nack: status.nack,
                tx_unfinished: status.tx_unfinished,
                rx_unfinished: status.rx_unfinished,
            },
        }
    }
}
