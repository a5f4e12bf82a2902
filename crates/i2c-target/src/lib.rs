//! Behavioral I2C target (slave) device model.
//!
//! The target watches the SCL/SDA wires edge by edge: START and STOP
//! conditions, MSB-first bit sampling on rising clock edges, data and
//! acknowledge driving on falling edges. It records everything it observes
//! in a bus event log, which is what protocol tests assert against.
//!
//! The model is deliberately well-behaved: no clock stretching, data only
//! changes while the clock is low. Misbehavior can be injected per test via
//! the ACK policy switches and the stuck-SDA hold.

use i2c_core::OpenDrainPad;
use std::collections::VecDeque;

/// One observed or performed bus-level event, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// START (or repeated START) condition.
    Start,
    /// STOP condition.
    Stop,
    /// Address byte received; `acked` reflects this target's response.
    AddressByte {
        address: u8,
        read: bool,
        acked: bool,
    },
    /// Data byte written to this target.
    DataByte { value: u8, acked: bool },
    /// Data byte supplied by this target; `acked` is the controller's ACK.
    ReadByte { value: u8, acked: bool },
}

/// Protocol position within the current transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetState {
    /// No transaction in progress.
    Idle,
    /// Shifting the address byte in.
    Address,
    /// Driving (or withholding) the address acknowledge.
    AckAddress,
    /// Shifting a written data byte in.
    Receive,
    /// Driving (or withholding) the data acknowledge.
    AckData,
    /// Driving a read data byte out.
    Transmit,
    /// Sampling the controller's acknowledge of a read byte.
    AckRead,
    /// Addressed elsewhere or read finished; wait for START/STOP.
    Ignore,
}

/// Behavioral I2C target.
pub struct I2cTarget {
    /// 7-bit device address.
    address: u8,
    /// Acknowledge the address byte when it matches.
    ack_address: bool,
    /// Acknowledge written data bytes.
    ack_data: bool,
    /// Bytes supplied to read transfers; exhausted reads return `0xFF`.
    read_data: VecDeque<u8>,
    /// Bytes written to this target.
    received: Vec<u8>,
    /// Observed bus events.
    events: Vec<BusEvent>,
    /// Hold SDA low unconditionally (stuck-device simulation).
    hold_sda: bool,

    state: TargetState,
    scl_prev: bool,
    sda_prev: bool,
    /// Bits sampled (in) or placed (out) for the current byte.
    bit_cnt: u8,
    /// Input shift register.
    shifter: u8,
    /// Byte currently being transmitted.
    out_byte: u8,
    /// Address byte said "read".
    reading: bool,
    /// Controller acknowledged the last read byte.
    master_acked: bool,
    /// 0 = acknowledge bit not yet started, 1 = driving it.
    ack_phase: u8,
    /// Current SDA drive request.
    pull_sda: bool,
}

impl I2cTarget {
    /// Create a target answering to the given 7-bit address, acknowledging
    /// everything, with no read data loaded.
    #[must_use]
    pub fn new(address: u8) -> Self {
        Self {
            address: address & 0x7F,
            ack_address: true,
            ack_data: true,
            read_data: VecDeque::new(),
            received: Vec::new(),
            events: Vec::new(),
            hold_sda: false,
            state: TargetState::Idle,
            scl_prev: true,
            sda_prev: true,
            bit_cnt: 0,
            shifter: 0,
            out_byte: 0,
            reading: false,
            master_acked: false,
            ack_phase: 0,
            pull_sda: false,
        }
    }

    /// Stop acknowledging the address byte (address-NACK tests).
    pub fn set_ack_address(&mut self, ack: bool) {
        self.ack_address = ack;
    }

    /// Stop acknowledging written data bytes.
    pub fn set_ack_data(&mut self, ack: bool) {
        self.ack_data = ack;
    }

    /// Hold SDA low unconditionally, as a stuck device would.
    pub fn set_hold_sda(&mut self, hold: bool) {
        self.hold_sda = hold;
    }

    /// Queue bytes to be supplied to read transfers.
    pub fn push_read_data(&mut self, bytes: &[u8]) {
        self.read_data.extend(bytes);
    }

    /// Bytes written to this target so far.
    #[must_use]
    pub fn received(&self) -> &[u8] {
        &self.received
    }

    /// The observed bus event log.
    #[must_use]
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Clear the event log (keeps received data and read queue).
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Advance one system tick: sample the wires, then update the drive.
    ///
    /// The SCL pad is only ever sampled (the model does not stretch the
    /// clock); it is taken by the same capability type for symmetry.
    pub fn tick<S: OpenDrainPad, D: OpenDrainPad>(&mut self, scl: &mut S, sda: &mut D) {
        let scl_now = scl.sample();
        let sda_now = sda.sample();

        let rising = scl_now && !self.scl_prev;
        let falling = !scl_now && self.scl_prev;

        if scl_now && self.scl_prev && self.sda_prev && !sda_now {
            self.on_start();
        } else if scl_now && self.scl_prev && !self.sda_prev && sda_now {
            self.on_stop();
        } else if rising {
            self.on_rising(sda_now);
        } else if falling {
            self.on_falling();
        }

        self.scl_prev = scl_now;
        self.sda_prev = sda_now;

        if self.pull_sda || self.hold_sda {
            sda.drive_low();
        } else {
            sda.release();
        }
    }

    fn on_start(&mut self) {
        self.events.push(BusEvent::Start);
        self.state = TargetState::Address;
        self.bit_cnt = 0;
        self.shifter = 0;
        self.ack_phase = 0;
        self.pull_sda = false;
    }

    fn on_stop(&mut self) {
        self.events.push(BusEvent::Stop);
        self.state = TargetState::Idle;
        self.pull_sda = false;
    }

    fn on_rising(&mut self, sda_now: bool) {
        match self.state {
            TargetState::Address => {
                self.shifter = (self.shifter << 1) | u8::from(sda_now);
                self.bit_cnt += 1;
                if self.bit_cnt == 8 {
                    let address = self.shifter >> 1;
                    let read = self.shifter & 1 != 0;
                    let matched = address == self.address;
                    let acked = matched && self.ack_address;
                    self.events.push(BusEvent::AddressByte {
                        address,
                        read,
                        acked,
                    });
                    self.reading = read;
                    self.ack_phase = 0;
                    self.state = if acked {
                        TargetState::AckAddress
                    } else {
                        TargetState::Ignore
                    };
                }
            }
            TargetState::Receive => {
                self.shifter = (self.shifter << 1) | u8::from(sda_now);
                self.bit_cnt += 1;
                if self.bit_cnt == 8 {
                    let acked = self.ack_data;
                    self.received.push(self.shifter);
                    self.events.push(BusEvent::DataByte {
                        value: self.shifter,
                        acked,
                    });
                    self.ack_phase = 0;
                    self.state = if acked {
                        TargetState::AckData
                    } else {
                        TargetState::Ignore
                    };
                }
            }
            TargetState::AckRead => {
                self.master_acked = !sda_now;
                self.events.push(BusEvent::ReadByte {
                    value: self.out_byte,
                    acked: self.master_acked,
                });
            }
            _ => {}
        }
    }

    fn on_falling(&mut self) {
        match self.state {
            TargetState::AckAddress => {
                if self.ack_phase == 0 {
                    // Start of the acknowledge bit: pull SDA low.
                    self.pull_sda = true;
                    self.ack_phase = 1;
                } else {
                    // End of the acknowledge bit.
                    self.pull_sda = false;
                    if self.reading {
                        self.begin_read_byte();
                    } else {
                        self.state = TargetState::Receive;
                        self.bit_cnt = 0;
                        self.shifter = 0;
                    }
                }
            }
            TargetState::AckData => {
                if self.ack_phase == 0 {
                    self.pull_sda = true;
                    self.ack_phase = 1;
                } else {
                    self.pull_sda = false;
                    self.state = TargetState::Receive;
                    self.bit_cnt = 0;
                    self.shifter = 0;
                }
            }
            TargetState::Transmit => {
                if self.bit_cnt < 8 {
                    self.place_out_bit();
                } else {
                    // Acknowledge bit belongs to the controller.
                    self.pull_sda = false;
                    self.state = TargetState::AckRead;
                }
            }
            TargetState::AckRead => {
                if self.master_acked {
                    self.begin_read_byte();
                } else {
                    // Controller signalled the last byte; await STOP or a
                    // repeated START.
                    self.pull_sda = false;
                    self.state = TargetState::Ignore;
                }
            }
            _ => {}
        }
    }

    /// Load the next read byte and place its MSB on the wire.
    fn begin_read_byte(&mut self) {
        self.out_byte = self.read_data.pop_front().unwrap_or(0xFF);
        self.bit_cnt = 0;
        self.state = TargetState::Transmit;
        self.place_out_bit();
    }

    fn place_out_bit(&mut self) {
        let bit = self.out_byte & (0x80 >> self.bit_cnt) != 0;
        self.pull_sda = !bit;
        self.bit_cnt += 1;
    }
}
