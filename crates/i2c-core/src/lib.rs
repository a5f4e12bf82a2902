//! Core traits and types for cycle-accurate I2C bus modelling.
//!
//! Everything ticks at the system clock frequency. All component timing
//! derives from this. The physical lines are open-drain: a component may
//! pull a line low or release it, never drive it high.

mod clock;
mod fifo;
mod line;
mod observable;
mod record;
mod tickable;
mod ticks;

pub use clock::SysClock;
pub use fifo::Fifo;
pub use line::{OpenDrainPad, PadDriver, TristateBuffer, Wire, WireDriver};
pub use observable::{Observable, Value};
pub use record::{Command, Response, SpeedMode, MAX_CHUNK_BYTES};
pub use tickable::Tickable;
pub use ticks::Ticks;
