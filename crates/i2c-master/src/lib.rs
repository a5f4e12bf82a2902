//! Register-style command front end.
//!
//! Turns discrete register-like accesses into the command/response streams
//! of one crossbar port. The surface is a typed rendition of a small
//! register file:
//!
//! | Access                  | Effect                                      |
//! |-------------------------|---------------------------------------------|
//! | `set_active`            | enable bit; activation of the port          |
//! | `set_settings`          | transfer settings (`len_tx`, `len_rx`, `recover`) |
//! | `set_address`           | 7-bit target address                        |
//! | `write_data`            | enqueue one TX entry tagged with the held settings |
//! | `read_data`             | dequeue one RX entry's data word            |
//! | `status`                | FIFO occupancy and the front response's flags |
//!
//! The host-facing register bus (memory-mapped I/O or otherwise) is an
//! external collaborator; nothing here assumes one.

use i2c_core::{Command, Fifo, Response};

/// Held transfer settings applied to each enqueued command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferSettings {
    /// Bytes to transmit; above 4 announces a continuation.
    pub len_tx: u8,
    /// Bytes to receive; above 4 announces a continuation.
    pub len_rx: u8,
    /// Run bus recovery instead of a transfer.
    pub recover: bool,
}

/// Status flags, mirroring FIFO occupancy and the front RX entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MasterStatus {
    /// TX FIFO has room for another command.
    pub tx_ready: bool,
    /// RX FIFO holds a response to read.
    pub rx_ready: bool,
    /// Front response reported a NACK.
    pub nack: bool,
    /// Front response expects a TX continuation.
    pub tx_unfinished: bool,
    /// Front response expects an RX continuation.
    pub rx_unfinished: bool,
}

/// Command front end feeding one crossbar port.
#[derive(Debug)]
pub struct I2cMaster {
    active: bool,
    settings: TransferSettings,
    address: u8,
    tx_fifo: Fifo<Command>,
    rx_fifo: Fifo<Response>,
}

impl I2cMaster {
    /// Front end with the given TX/RX FIFO depths (clamped to at least 1).
    #[must_use]
    pub fn new(tx_fifo_depth: usize, rx_fifo_depth: usize) -> Self {
        Self {
            active: false,
            settings: TransferSettings::default(),
            address: 0,
            tx_fifo: Fifo::new(tx_fifo_depth),
            rx_fifo: Fifo::new(rx_fifo_depth),
        }
    }

    /// Enable bit; forwarded as the port's activation.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[must_use]
    pub fn active(&self) -> bool {
        self.active
    }

    /// Latch the transfer settings applied to subsequent writes.
    pub fn set_settings(&mut self, settings: TransferSettings) {
        self.settings = settings;
    }

    #[must_use]
    pub fn settings(&self) -> TransferSettings {
        self.settings
    }

    /// Latch the 7-bit target address.
    pub fn set_address(&mut self, address: u8) {
        self.address = address & 0x7F;
    }

    #[must_use]
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Write the data-exchange register: enqueue one command carrying the
    /// held settings and address. Returns `false` (entry refused) when the
    /// TX FIFO is full; check `status().tx_ready` first.
    #[must_use]
    pub fn write_data(&mut self, data: u32) -> bool {
        self.tx_fifo
            .push(Command {
                data,
                address: self.address,
                len_tx: self.settings.len_tx,
                len_rx: self.settings.len_rx,
                recover: self.settings.recover,
            })
            .is_ok()
    }

    /// Read the data-exchange register: dequeue one response's data word.
    pub fn read_data(&mut self) -> Option<u32> {
        self.rx_fifo.pop().map(|rsp| rsp.data)
    }

    /// Status flags; the response flags mirror the front RX entry, all
    /// clear while the RX FIFO is empty.
    #[must_use]
    pub fn status(&self) -> MasterStatus {
        let front = self.rx_fifo.peek();
        MasterStatus {
            tx_ready: !self.tx_fifo.is_full(),
            rx_ready: front.is_some(),
            nack: front.is_some_and(|r| r.nack),
            tx_unfinished: front.is_some_and(|r| r.unfinished_tx),
            rx_unfinished: front.is_some_and(|r| r.unfinished_rx),
        }
    }

    // Port-facing side, pumped by the composition each tick.

    /// Next command to place on the port, if any.
    #[must_use]
    pub fn command_pending(&self) -> Option<&Command> {
        self.tx_fifo.peek()
    }

    /// Consume the command just placed on the port.
    pub fn pop_command(&mut self) -> Option<Command> {
        self.tx_fifo.pop()
    }

    /// Room for another response from the port.
    #[must_use]
    pub fn response_ready(&self) -> bool {
        !self.rx_fifo.is_full()
    }

    /// Deliver a response from the port; refused when the RX FIFO is full.
    pub fn push_response(&mut self, rsp: Response) -> Result<(), Response> {
        self.rx_fifo.push(rsp)
    }
}

impl Default for I2cMaster {
    fn default() -> Self {
        Self::new(1, 1)
    }
}
