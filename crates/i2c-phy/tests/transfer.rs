//! Engine-level transfers against the behavioral target model, without the
//! crossbar or front end in the loop.

use i2c_core::{Command, PadDriver, Response, SpeedMode, SysClock, Wire};
use i2c_phy::PhyCore;
use i2c_target::{BusEvent, I2cTarget};

const TARGET_ADDR: u8 = 0x1D;

struct Bench {
    phy: PhyCore,
    target: I2cTarget,
    scl: Wire,
    sda: Wire,
    phy_slots: (usize, usize),
    target_slots: (usize, usize),
}

impl Bench {
    fn new(driver: PadDriver) -> Self {
        let mut scl = Wire::new();
        let mut sda = Wire::new();
        let phy_slots = (scl.attach(), sda.attach());
        let target_slots = (scl.attach(), sda.attach());
        let phy = PhyCore::new(SysClock::new(4_000_000), SpeedMode::Standard, driver)
            .expect("divisor fits");
        let mut target = I2cTarget::new(TARGET_ADDR);
        target.push_read_data(&[0xC4, 0x09]);
        Self {
            phy,
            target,
            scl,
            sda,
            phy_slots,
            target_slots,
        }
    }

    fn tick(&mut self) {
        self.phy.tick(
            &mut self.scl.driver(self.phy_slots.0),
            &mut self.sda.driver(self.phy_slots.1),
        );
        self.target.tick(
            &mut self.scl.driver(self.target_slots.0),
            &mut self.sda.driver(self.target_slots.1),
        );
    }

    fn run_transaction(&mut self, cmd: Command) -> Response {
        self.phy.set_active(true);
        self.phy.submit(cmd).expect("sink free");
        for _ in 0..40_000 {
            self.tick();
            if let Some(rsp) = self.phy.take_response() {
                return rsp;
            }
        }
        panic!("no response; engine in {:?}", self.phy.state());
    }
}

#[test]
fn single_byte_write_is_acknowledged() {
    let mut bench = Bench::new(PadDriver::Tristate);
    let rsp = bench.run_transaction(Command {
        data: 0x5C,
        address: TARGET_ADDR,
        len_tx: 1,
        len_rx: 0,
        recover: false,
    });
    assert_eq!(
        rsp,
        Response {
            data: 0,
            nack: false,
            unfinished_tx: false,
            unfinished_rx: false,
        }
    );
    assert_eq!(bench.target.received(), &[0x5C]);
}

#[test]
fn four_byte_write_moves_all_bytes_in_one_command() {
    let mut bench = Bench::new(PadDriver::Tristate);
    let rsp = bench.run_transaction(Command {
        data: 0x0102_0304,
        address: TARGET_ADDR,
        len_tx: 4,
        len_rx: 0,
        recover: false,
    });
    assert!(!rsp.nack);
    assert!(!rsp.unfinished_tx);
    assert_eq!(bench.target.received(), &[0x01, 0x02, 0x03, 0x04]);
}

#[test]
fn single_byte_read_returns_target_data() {
    let mut bench = Bench::new(PadDriver::Tristate);
    let rsp = bench.run_transaction(Command {
        data: 0,
        address: TARGET_ADDR,
        len_tx: 0,
        len_rx: 1,
        recover: false,
    });
    assert!(!rsp.nack);
    assert_eq!(rsp.data, 0xC4);
    assert_eq!(
        bench.target.events().last(),
        Some(&BusEvent::Stop),
        "transaction closed with STOP"
    );
}

#[test]
fn back_to_back_transactions_reuse_the_bus() {
    let mut bench = Bench::new(PadDriver::Tristate);
    let first = bench.run_transaction(Command {
        data: 0xA1,
        address: TARGET_ADDR,
        len_tx: 1,
        len_rx: 0,
        recover: false,
    });
    assert!(!first.nack);

    let second = bench.run_transaction(Command {
        data: 0,
        address: TARGET_ADDR,
        len_tx: 0,
        len_rx: 1,
        recover: false,
    });
    assert!(!second.nack);
    assert_eq!(second.data, 0xC4);
    assert_eq!(bench.target.received(), &[0xA1]);

    // Two complete transactions: two STARTs, two STOPs.
    let starts = bench
        .target
        .events()
        .iter()
        .filter(|e| **e == BusEvent::Start)
        .count();
    let stops = bench
        .target
        .events()
        .iter()
        .filter(|e| **e == BusEvent::Stop)
        .count();
    assert_eq!((starts, stops), (2, 2));
}

#[test]
fn both_pad_backends_produce_identical_transfers() {
    for driver in [PadDriver::Tristate, PadDriver::Direct] {
        let mut bench = Bench::new(driver);
        let rsp = bench.run_transaction(Command {
            data: 0xEE77,
            address: TARGET_ADDR,
            len_tx: 2,
            len_rx: 0,
            recover: false,
        });
        assert!(!rsp.nack, "{driver:?}");
        assert_eq!(bench.target.received(), &[0xEE, 0x77], "{driver:?}");
    }
}
