//! Shared I2C bus controller.
//!
//! Composes the protocol engine, the round-robin crossbar and the register
//! front end over one pair of open-drain wires, and ticks them in lockstep.
//! Behavioral target models can be attached to the same wires for tests and
//! demos.
//!
//! Data flow: front end (or any direct port user) → crossbar port →
//! round-robin grant → engine → clock-timed line toggling → wires; responses
//! flow the reverse path back to the granted port.

pub mod config;
#[cfg(feature = "inspect")]
pub mod snapshot;

pub use config::{I2cBusConfig, PhyDomain};

// Re-export component crates so tests and downstream users can reach types.
pub use i2c_core;
pub use i2c_crossbar;
pub use i2c_master;
pub use i2c_phy;
pub use i2c_target;

use i2c_core::{Command, Observable, Response, Tickable, Ticks, Value};
use i2c_crossbar::{Crossbar, PortId};
use i2c_master::I2cMaster;
use i2c_phy::{ConfigError, PhyCore};
use i2c_target::I2cTarget;

/// The composed bus controller with its physical wires.
pub struct I2cBus {
    config: I2cBusConfig,
    phy: PhyCore,
    crossbar: Crossbar,
    master: I2cMaster,
    master_port: PortId,
    scl: i2c_core::Wire,
    sda: i2c_core::Wire,
    scl_phy: usize,
    sda_phy: usize,
    targets: Vec<I2cTarget>,
    target_slots: Vec<(usize, usize)>,
    divider_cnt: u32,
    ticks: Ticks,
}

impl I2cBus {
    pub fn new(config: I2cBusConfig) -> Result<Self, ConfigError> {
        let phy = PhyCore::new(config.sys_clk, config.speed_mode, config.pad_driver)?;
        let mut crossbar = match config.phy_domain {
            PhyDomain::Shared => Crossbar::new(),
            PhyDomain::Divided { .. } => Crossbar::with_bridge(),
        };
        let master = I2cMaster::new(config.tx_fifo_depth, config.rx_fifo_depth);
        let master_port = crossbar.register();

        let mut scl = i2c_core::Wire::new();
        let mut sda = i2c_core::Wire::new();
        let scl_phy = scl.attach();
        let sda_phy = sda.attach();

        Ok(Self {
            config,
            phy,
            crossbar,
            master,
            master_port,
            scl,
            sda,
            scl_phy,
            sda_phy,
            targets: Vec::new(),
            target_slots: Vec::new(),
            divider_cnt: 0,
            ticks: Ticks::ZERO,
        })
    }

    /// Attach a target model to the wires; returns its index.
    pub fn attach_target(&mut self, target: I2cTarget) -> usize {
        let slots = (self.scl.attach(), self.sda.attach());
        self.targets.push(target);
        self.target_slots.push(slots);
        self.targets.len() - 1
    }

    #[must_use]
    pub fn target(&self, index: usize) -> &I2cTarget {
        &self.targets[index]
    }

    pub fn target_mut(&mut self, index: usize) -> &mut I2cTarget {
        &mut self.targets[index]
    }

    /// The register front end (port 0).
    #[must_use]
    pub fn master(&self) -> &I2cMaster {
        &self.master
    }

    pub fn master_mut(&mut self) -> &mut I2cMaster {
        &mut self.master
    }

    /// Register an additional direct port; request follows activation.
    pub fn register_port(&mut self) -> PortId {
        self.crossbar.register()
    }

    /// Register an additional direct port with an explicit request line.
    pub fn register_port_with_request(&mut self) -> PortId {
        self.crossbar.register_with_request()
    }

    pub fn set_port_activation(&mut self, port: PortId, active: bool) {
        self.crossbar.set_activation(port, active);
    }

    pub fn set_port_request(&mut self, port: PortId, request: bool) {
        self.crossbar.set_request(port, request);
    }

    /// Present a command on a direct port; handed back while its slot is
    /// occupied (backpressure, retry next tick).
    pub fn submit(&mut self, port: PortId, cmd: Command) -> Result<(), Command> {
        self.crossbar.submit(port, cmd)
    }

    /// Collect a response delivered to a direct port.
    pub fn take_response(&mut self, port: PortId) -> Option<Response> {
        self.crossbar.take_response(port)
    }

    /// Request a speed mode; latched while the bus is inactive.
    pub fn set_speed_mode(&mut self, mode: i2c_core::SpeedMode) {
        self.phy.set_speed_mode(mode);
    }

    /// Current SCL wire level.
    #[must_use]
    pub fn scl_level(&self) -> bool {
        self.scl.level()
    }

    /// Current SDA wire level.
    #[must_use]
    pub fn sda_level(&self) -> bool {
        self.sda.level()
    }

    #[must_use]
    pub fn ticks(&self) -> Ticks {
        self.ticks
    }

    #[must_use]
    pub fn config(&self) -> &I2cBusConfig {
        &self.config
    }

    #[must_use]
    pub fn phy(&self) -> &PhyCore {
        &self.phy
    }

    #[must_use]
    pub fn crossbar(&self) -> &Crossbar {
        &self.crossbar
    }
}

impl Tickable for I2cBus {
    fn tick(&mut self) {
        // Logical-domain side: front end to port, then arbitration.
        self.crossbar
            .set_activation(self.master_port, self.master.active());
        if let Some(&cmd) = self.master.command_pending() {
            if self.crossbar.submit(self.master_port, cmd).is_ok() {
                let _ = self.master.pop_command();
            }
        }
        if self.master.response_ready() {
            if let Some(rsp) = self.crossbar.take_response(self.master_port) {
                let _ = self.master.push_response(rsp);
            }
        }
        self.crossbar.tick();

        // Engine domain, divided down from the logical domain if configured.
        self.divider_cnt += 1;
        if self.divider_cnt >= self.config.phy_domain.divider() {
            self.divider_cnt = 0;

            self.phy.set_active(self.crossbar.engine_active());
            if self.phy.sink_ready() {
                if let Some(cmd) = self.crossbar.take_engine_command() {
                    let _ = self.phy.submit(cmd);
                }
            }
            if self.crossbar.engine_response_ready() {
                if let Some(rsp) = self.phy.take_response() {
                    let _ = self.crossbar.put_engine_response(rsp);
                }
            }

            self.phy.tick(
                &mut self.scl.driver(self.scl_phy),
                &mut self.sda.driver(self.sda_phy),
            );
            for (target, &(scl_slot, sda_slot)) in
                self.targets.iter_mut().zip(&self.target_slots)
            {
                target.tick(
                    &mut self.scl.driver(scl_slot),
                    &mut self.sda.driver(sda_slot),
                );
            }
        }

        self.ticks += Ticks::new(1);
    }
}

impl Observable for I2cBus {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "phy.state" => Some(Value::Str(format!("{:?}", self.phy.state()))),
            "phy.idle" => Some(self.phy.is_idle().into()),
            "phy.divisor" => Some(self.phy.divisor().into()),
            "phy.speed_mode" => Some(Value::Str(format!("{:?}", self.phy.speed_mode()))),
            "crossbar.grant" => self.crossbar.grant().map(|g| Value::U64(g as u64)),
            "master.active" => Some(self.master.active().into()),
            "scl" => Some(self.scl.level().into()),
            "sda" => Some(self.sda.level().into()),
            "ticks" => Some(self.ticks.get().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "phy.state",
            "phy.idle",
            "phy.divisor",
            "phy.speed_mode",
            "crossbar.grant",
            "master.active",
            "scl",
            "sda",
            "ticks",
        ]
    }
}
