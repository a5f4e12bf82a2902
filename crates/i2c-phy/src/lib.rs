//! I2C bus protocol engine.
//!
//! The engine drives one open-drain clock/data line pair through a
//! cycle-accurate state machine: START and STOP generation, MSB-first
//! address and data shifting, ACK/NACK sampling, multi-byte transfers with
//! continuation hand-offs, repeated starts, and 9-pulse bus recovery.
//!
//! # Command flow
//!
//! A command is accepted from the single-slot sink when the engine is idle
//! and `active` is high. Its fields stay live (peeked) for the duration of
//! the transfer; it is consumed exactly once — at transfer end, or when the
//! engine parks in a wait state after moving 4 bytes of a longer declared
//! transfer. Every command produces exactly one response; the engine stalls
//! in place while the response slot is occupied.
//!
//! # Timing
//!
//! All per-state outputs are recomputed from current state and inputs each
//! tick; next-state updates apply atomically at the tick boundary. Bit
//! timing derives from the [`ClkGen`] strobes: data advances on the
//! transmit strobe (clock low), ACK/NACK and RX data are sampled on the
//! receive strobe (clock high).

mod clkgen;

pub use clkgen::{freq_to_div, ClkGen, ConfigError};

use i2c_core::{
    Command, Fifo, OpenDrainPad, PadDriver, Response, SpeedMode, SysClock, MAX_CHUNK_BYTES,
};

/// Protocol engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhyState {
    /// Idle; waiting for an active port with a pending command.
    WaitData,
    /// Pull SDA low while the clock is high: START condition.
    Start,
    /// Shift the 7 address bits, MSB first.
    Addr,
    /// Drive the derived R/W bit.
    AddrRw,
    /// Release SDA and sample the address acknowledge.
    AddrAck,
    /// Load the output shift register for the next TX chunk.
    PreTx,
    /// Shift one TX byte.
    Tx,
    /// Release SDA and sample the data acknowledge.
    TxAck,
    /// Extra shift to bring the next byte's MSB to the drive position.
    TxBeforeNext,
    /// Consume the command; a TX continuation will follow.
    TxPreWait,
    /// Report the unfinished TX chunk while stretching the clock.
    TxWaitSendStatus,
    /// Hold the clock low until the continuation command arrives.
    TxWait,
    /// A NACK was sampled; terminate via STOP.
    NackError,
    /// First half of a repeated start (SDA released, clock low).
    RepeatedStart1,
    /// Second half of a repeated start (SDA released, clock high).
    RepeatedStart2,
    /// Clear the input shift register for the next RX chunk.
    PreRx,
    /// Shift one RX byte in on receive strobes.
    Rx,
    /// Decide between master ACK and final NACK.
    RxPreAck,
    /// Drive the master acknowledge (more bytes follow).
    RxAck,
    /// Release SDA for the final master NACK.
    RxNack,
    /// Report the unfinished RX chunk while stretching the clock.
    RxWaitSendStatus,
    /// Hold the clock low until the continuation command arrives.
    RxWait,
    /// Wait one data phase before the STOP condition.
    StopPre,
    /// Hold SDA low, then release it while the clock is high: STOP.
    Stop,
    /// Consume the command and release both lines.
    XferEnd,
    /// Emit the final response with NACK status and RX data.
    SendStatusData,
    /// Idle the bus for a receive-phase interval before going idle.
    BusFree,
    /// Clock out the recovery pulses with SDA released.
    Recover1,
    /// Re-assert SDA low so STOP can release it.
    Recover2,
}

/// I2C bus protocol engine.
pub struct PhyCore {
    state: PhyState,
    clkgen: ClkGen,
    /// Address shift register (7 bits, MSB at bit 6).
    sr_addr: u8,
    /// Bit counter within the current byte or recovery pulse train.
    sr_cnt: u8,
    /// Output shift register; bit 31 is on the wire.
    sr_out: u32,
    /// Input shift register, accumulating MSB first.
    sr_in: u32,
    /// Bytes completed in the current TX chunk.
    bytes_sent: u8,
    /// Bytes completed in the current RX chunk.
    bytes_recv: u8,
    /// TX portion of the current transaction is complete.
    tx_done: bool,
    /// A NACK was sampled during this transaction.
    nack: bool,
    /// Granted port's activation, forwarded by the crossbar.
    active: bool,
    /// Speed mode requested by the user; latched while inactive.
    pending_mode: SpeedMode,
    sink: Fifo<Command>,
    source: Fifo<Response>,
}

impl PhyCore {
    pub fn new(
        sys_clk: SysClock,
        mode: SpeedMode,
        driver: PadDriver,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            state: PhyState::WaitData,
            clkgen: ClkGen::new(sys_clk, mode, driver)?,
            sr_addr: 0,
            sr_cnt: 0,
            sr_out: 0,
            sr_in: 0,
            bytes_sent: 0,
            bytes_recv: 0,
            tx_done: false,
            nack: false,
            active: false,
            pending_mode: mode,
            sink: Fifo::new(1),
            source: Fifo::new(1),
        })
    }

    /// Forward the granted port's activation level.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Request a speed mode; takes effect while the bus is inactive.
    pub fn set_speed_mode(&mut self, mode: SpeedMode) {
        self.pending_mode = mode;
    }

    #[must_use]
    pub fn speed_mode(&self) -> SpeedMode {
        self.clkgen.mode()
    }

    /// Divisor currently in effect.
    #[must_use]
    pub fn divisor(&self) -> u32 {
        self.clkgen.divisor()
    }

    /// The command slot is free.
    #[must_use]
    pub fn sink_ready(&self) -> bool {
        !self.sink.is_full()
    }

    /// Present a command; handed back if the slot is occupied.
    pub fn submit(&mut self, cmd: Command) -> Result<(), Command> {
        self.sink.push(cmd)
    }

    /// Collect a produced response, if any.
    pub fn take_response(&mut self) -> Option<Response> {
        self.source.pop()
    }

    #[must_use]
    pub fn state(&self) -> PhyState {
        self.state
    }

    /// Idle and able to start a new transaction.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == PhyState::WaitData
    }

    /// Advance one system tick, driving the SCL and SDA pads.
    pub fn tick<S: OpenDrainPad, D: OpenDrainPad>(&mut self, scl: &mut S, sda: &mut D) {
        if !self.active {
            self.clkgen.set_mode(self.pending_mode);
        }

        let (en, keep_low, suppress) = self.clock_controls();
        self.clkgen.set_controls(en, keep_low, suppress);
        let tx = self.clkgen.tx_strobe();
        let rx = self.clkgen.rx_strobe();

        let (sda_oe, sda_o) = self.sda_drive(rx);
        if sda_oe && !sda_o {
            sda.drive_low();
        } else {
            sda.release();
        }

        self.clkgen.tick(scl);
        let sda_in = sda.sample();

        self.transition(tx, rx, sda_in);
    }

    /// The pending command's fields, live for the duration of the transfer.
    fn cmd(&self) -> Command {
        self.sink.peek().copied().unwrap_or_default()
    }

    /// Clock controls for the current state: `(en, keep_low, suppress)`.
    fn clock_controls(&self) -> (bool, bool, bool) {
        use PhyState as S;
        match self.state {
            S::WaitData | S::XferEnd | S::SendStatusData => (false, false, false),
            S::TxWaitSendStatus | S::TxWait | S::RxWaitSendStatus | S::RxWait => {
                (false, true, false)
            }
            S::BusFree => (true, false, true),
            _ => (true, false, false),
        }
    }

    /// SDA drive for the current state as `(oe, o)`; the pad is pulled low
    /// iff `oe && !o` (releasing with `o = 1` models the tri-state pair).
    fn sda_drive(&self, rx: bool) -> (bool, bool) {
        use PhyState as S;
        match self.state {
            S::Start => (true, false),
            S::Addr => (true, self.sr_addr & 0x40 != 0),
            S::AddrRw => {
                let cmd = self.cmd();
                let write = cmd.len_tx > 0 && !self.tx_done;
                let read = cmd.len_rx > 0;
                // 0 = write, 1 = read; a zero-length probe addresses as a
                // write and goes straight to STOP.
                (true, !write && read)
            }
            S::Tx => (true, self.sr_out & 0x8000_0000 != 0),
            S::RepeatedStart2 => (true, true),
            S::RxAck => (true, false),
            S::RxNack => (true, true),
            S::Stop => (true, rx),
            S::XferEnd | S::SendStatusData => (true, true),
            S::Recover1 => (true, true),
            S::Recover2 => (true, false),
            _ => (false, false),
        }
    }

    /// Apply the state transition for this tick.
    fn transition(&mut self, tx: bool, rx: bool, sda_in: bool) {
        use PhyState as S;
        match self.state {
            S::WaitData => {
                self.nack = false;
                self.tx_done = false;
                self.sr_in = 0;
                if self.active && self.sink.peek().is_some() {
                    self.state = S::Start;
                }
            }
            S::Start => {
                self.sr_addr = self.cmd().address & 0x7F;
                self.sr_cnt = 0;
                if tx {
                    self.state = if self.cmd().recover {
                        S::Recover1
                    } else {
                        S::Addr
                    };
                }
            }
            S::Addr => {
                if tx {
                    if self.sr_cnt == 6 {
                        self.state = S::AddrRw;
                    } else {
                        self.sr_addr = (self.sr_addr << 1) & 0x7F;
                        self.sr_cnt += 1;
                    }
                }
            }
            S::AddrRw => {
                if tx {
                    self.state = S::AddrAck;
                }
            }
            S::AddrAck => {
                if rx {
                    if sda_in {
                        self.state = S::NackError;
                    } else {
                        let cmd = self.cmd();
                        if cmd.len_tx > 0 && !self.tx_done {
                            self.state = S::PreTx;
                        } else if cmd.len_rx > 0 {
                            self.state = S::PreRx;
                        } else {
                            self.state = S::StopPre;
                        }
                    }
                }
            }
            S::PreTx => {
                self.sr_cnt = 0;
                self.bytes_sent = 0;
                let cmd = self.cmd();
                let cap = cmd.len_tx.min(MAX_CHUNK_BYTES);
                if cap > 0 {
                    self.sr_out = cmd.data << (32 - u32::from(cap) * 8);
                }
                if tx {
                    self.state = S::Tx;
                }
            }
            S::Tx => {
                if tx {
                    if self.sr_cnt == 7 {
                        self.sr_cnt = 0;
                        self.bytes_sent += 1;
                        self.state = S::TxAck;
                    } else {
                        self.sr_cnt += 1;
                        self.sr_out <<= 1;
                    }
                }
            }
            S::TxAck => {
                if rx {
                    if sda_in {
                        self.state = S::NackError;
                    } else {
                        let cmd = self.cmd();
                        if self.bytes_sent == MAX_CHUNK_BYTES && cmd.len_tx > MAX_CHUNK_BYTES {
                            // 4 bytes moved of a longer declared transfer:
                            // consume the command and park for continuation.
                            let _ = self.sink.pop();
                            self.state = S::TxPreWait;
                        } else if self.bytes_sent < cmd.len_tx {
                            self.state = S::TxBeforeNext;
                        } else {
                            self.tx_done = true;
                            self.state = if cmd.len_rx > 0 {
                                S::RepeatedStart1
                            } else {
                                S::StopPre
                            };
                        }
                    }
                }
            }
            S::TxBeforeNext => {
                if tx {
                    self.sr_out <<= 1;
                    self.state = S::Tx;
                }
            }
            S::TxPreWait => {
                if tx {
                    self.state = S::TxWaitSendStatus;
                }
            }
            S::TxWaitSendStatus => {
                let rsp = Response {
                    data: 0,
                    nack: false,
                    unfinished_tx: true,
                    unfinished_rx: false,
                };
                if self.source.push(rsp).is_ok() {
                    self.state = S::TxWait;
                }
            }
            S::TxWait => {
                self.tx_done = false;
                if self.active && self.sink.peek().is_some() {
                    self.state = S::PreTx;
                }
            }
            S::NackError => {
                self.nack = true;
                if tx {
                    self.state = S::Stop;
                }
            }
            S::RepeatedStart1 => {
                if tx {
                    self.state = S::RepeatedStart2;
                }
            }
            S::RepeatedStart2 => {
                if rx {
                    self.state = S::Start;
                }
            }
            S::PreRx => {
                self.sr_cnt = 0;
                self.bytes_recv = 0;
                self.sr_in = 0;
                if tx {
                    self.state = S::Rx;
                }
            }
            S::Rx => {
                if rx {
                    self.sr_in = (self.sr_in << 1) | u32::from(sda_in);
                    if self.sr_cnt == 7 {
                        self.sr_cnt = 0;
                        self.bytes_recv += 1;
                        self.state = S::RxPreAck;
                    } else {
                        self.sr_cnt += 1;
                    }
                }
            }
            S::RxPreAck => {
                if tx {
                    self.state = if self.bytes_recv < self.cmd().len_rx {
                        S::RxAck
                    } else {
                        S::RxNack
                    };
                }
            }
            S::RxAck => {
                if tx {
                    self.sr_cnt = 0;
                    if self.bytes_recv == MAX_CHUNK_BYTES {
                        // Chunk boundary of a longer declared read.
                        let _ = self.sink.pop();
                        self.state = S::RxWaitSendStatus;
                    } else {
                        self.state = S::Rx;
                    }
                }
            }
            S::RxNack => {
                if tx {
                    self.state = S::Stop;
                }
            }
            S::RxWaitSendStatus => {
                let rsp = Response {
                    data: self.sr_in,
                    nack: false,
                    unfinished_tx: false,
                    unfinished_rx: true,
                };
                if self.source.push(rsp).is_ok() {
                    self.state = S::RxWait;
                }
            }
            S::RxWait => {
                if self.active && self.sink.peek().is_some() {
                    self.state = S::PreRx;
                }
            }
            S::StopPre => {
                if tx {
                    self.state = S::Stop;
                }
            }
            S::Stop => {
                if rx {
                    self.state = S::XferEnd;
                }
            }
            S::XferEnd => {
                let _ = self.sink.pop();
                self.state = S::SendStatusData;
            }
            S::SendStatusData => {
                let rsp = Response {
                    data: self.sr_in,
                    nack: self.nack,
                    unfinished_tx: false,
                    unfinished_rx: false,
                };
                if self.source.push(rsp).is_ok() {
                    self.state = S::BusFree;
                }
            }
            S::BusFree => {
                if rx {
                    self.state = S::WaitData;
                }
            }
            S::Recover1 => {
                if self.sr_cnt < 9 {
                    if tx {
                        self.sr_cnt += 1;
                    }
                } else if rx {
                    self.state = S::Recover2;
                }
            }
            S::Recover2 => {
                if tx {
                    self.state = S::Stop;
                }
            }
        }
    }
}
