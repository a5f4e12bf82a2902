//! Clock-domain bridge.
//!
//! Two independent bounded channels, one per direction, carry commands and
//! responses across the boundary between the crossbar's logical domain and
//! the engine's domain. Each side only touches its own end on its own
//! domain's ticks. A full channel stalls the producer (the push is refused
//! and retried); nothing is ever dropped or reordered.

use i2c_core::{Command, Fifo, Response};

/// Channel depth used when the domains actually differ.
pub const BRIDGE_DEPTH: usize = 32;

/// Ordered, flow-controlled channel pair between the core and phy domains.
///
/// With depth 1 this degrades to a plain stream register for the shared
/// domain case; [`BRIDGE_DEPTH`] gives the buffered crossing.
#[derive(Debug)]
pub struct DomainBridge {
    cmd: Fifo<Command>,
    rsp: Fifo<Response>,
}

impl DomainBridge {
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self {
            cmd: Fifo::new(depth),
            rsp: Fifo::new(depth),
        }
    }

    // Core-domain side.

    /// Enqueue a command toward the engine; refused when full.
    pub fn push_command(&mut self, cmd: Command) -> Result<(), Command> {
        self.cmd.push(cmd)
    }

    /// Collect a response from the engine side.
    pub fn pop_response(&mut self) -> Option<Response> {
        self.rsp.pop()
    }

    #[must_use]
    pub fn response_pending(&self) -> Option<&Response> {
        self.rsp.peek()
    }

    // Phy-domain side.

    /// Dequeue the next command for the engine.
    pub fn pop_command(&mut self) -> Option<Command> {
        self.cmd.pop()
    }

    #[must_use]
    pub fn command_pending(&self) -> bool {
        !self.cmd.is_empty()
    }

    /// Room for another response from the engine.
    #[must_use]
    pub fn response_ready(&self) -> bool {
        !self.rsp.is_full()
    }

    /// Enqueue a response toward the core domain; refused when full.
    pub fn push_response(&mut self, rsp: Response) -> Result<(), Response> {
        self.rsp.push(rsp)
    }
}
