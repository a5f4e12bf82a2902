//! Command and response records exchanged between the logical users and the
//! bus engine, and the bus speed modes.

/// Bytes the engine moves per direction per command hand-off.
///
/// A `len_tx`/`len_rx` greater than this declares that more data follows in
/// a continuation command; it is not a literal same-command length.
pub const MAX_CHUNK_BYTES: u8 = 4;

/// Bus speed mode, selecting the clock divisor at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedMode {
    /// Standard mode, 100 kHz.
    #[default]
    Standard,
    /// Fast mode, 400 kHz.
    Fast,
    /// Fast mode plus, 1000 kHz.
    FastPlus,
}

impl SpeedMode {
    /// Target bus frequency in Hz.
    #[must_use]
    pub const fn target_hz(self) -> u64 {
        match self {
            SpeedMode::Standard => 100_000,
            SpeedMode::Fast => 400_000,
            SpeedMode::FastPlus => 1_000_000,
        }
    }
}

/// One transfer command, user to engine.
///
/// Single-use: produced once, consumed once, never mutated after production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Command {
    /// TX payload, up to 4 bytes right-aligned; the first byte on the wire
    /// is the most significant byte of the `min(len_tx, 4)`-byte group.
    pub data: u32,
    /// 7-bit target address.
    pub address: u8,
    /// Bytes to transmit (0–7). Values above 4 announce a continuation.
    pub len_tx: u8,
    /// Bytes to receive (0–7). Values above 4 announce a continuation.
    pub len_rx: u8,
    /// Run the 9-pulse bus recovery sequence instead of addressing.
    pub recover: bool,
}

/// One transfer response, engine to user. Exactly one per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Response {
    /// Received bytes, up to 4, accumulated MSB-first (a 2-byte read of
    /// `b0, b1` yields `b0 << 8 | b1`).
    pub data: u32,
    /// The target failed to acknowledge an address or data byte; the
    /// transaction was terminated with STOP.
    pub nack: bool,
    /// The declared TX transfer is not complete; issue a continuation
    /// command before the bus is released.
    pub unfinished_tx: bool,
    /// The declared RX transfer is not complete; issue a continuation
    /// command before the bus is released.
    pub unfinished_rx: bool,
}
