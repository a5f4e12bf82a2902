//! Bus clock generator.
//!
//! Divides the system clock into four quarter phases per bit cell and emits
//! the transmit/receive strobes the protocol engine advances on. The SCL pad
//! is only ever pulled low or released.

use i2c_core::{OpenDrainPad, PadDriver, SpeedMode, SysClock, TristateBuffer};
use std::fmt;

/// Clock generator configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The system clock is too slow to derive the given speed mode: the bit
    /// cell needs at least four system ticks.
    ClockTooSlow {
        sys_clk_hz: u64,
        target_hz: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ClockTooSlow {
                sys_clk_hz,
                target_hz,
            } => write!(
                f,
                "system clock {sys_clk_hz} Hz too slow for {target_hz} Hz bus clock"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Quarter-phase divisor for a target bus frequency.
///
/// `div = ceil(sys / (4 * target)) - 1`; each quarter phase then lasts
/// `div + 1` system ticks, giving a bus clock no faster than `target`.
pub fn freq_to_div(sys_clk_hz: u64, target_hz: u64) -> Result<u32, ConfigError> {
    if sys_clk_hz < 4 * target_hz {
        return Err(ConfigError::ClockTooSlow {
            sys_clk_hz,
            target_hz,
        });
    }
    Ok((sys_clk_hz.div_ceil(4 * target_hz) - 1) as u32)
}

/// I2C bus clock generator.
///
/// While enabled, a sub-cycle counter `cnt` walks `0..=div` and a quarter
/// counter `sub` walks `0..=3`; the generated clock level is bit 1 of `sub`,
/// so each bit cell is shaped 25% low / 25% low / 25% high / 25% high. The
/// transmit strobe fires on the last tick of quarter 1 (clock low, data may
/// advance); the receive strobe on the last tick of quarter 3 (clock high,
/// data is sampled).
#[derive(Debug)]
pub struct ClkGen {
    divisors: [u32; 3],
    mode: SpeedMode,
    driver: PadDriver,
    buffer: TristateBuffer,
    cnt: u32,
    sub: u8,
    clk: bool,
    en: bool,
    keep_low: bool,
    suppress: bool,
}

impl ClkGen {
    /// Build a generator for the given system clock, with all three speed
    /// mode divisors precomputed.
    pub fn new(
        sys_clk: SysClock,
        mode: SpeedMode,
        driver: PadDriver,
    ) -> Result<Self, ConfigError> {
        let divisors = [
            freq_to_div(sys_clk.frequency_hz, SpeedMode::Standard.target_hz())?,
            freq_to_div(sys_clk.frequency_hz, SpeedMode::Fast.target_hz())?,
            freq_to_div(sys_clk.frequency_hz, SpeedMode::FastPlus.target_hz())?,
        ];
        Ok(Self {
            divisors,
            mode,
            driver,
            buffer: TristateBuffer::new(),
            cnt: 0,
            sub: 0,
            clk: true,
            en: false,
            keep_low: false,
            suppress: false,
        })
    }

    /// Set the per-cycle controls before reading the strobes.
    ///
    /// `en` runs the phase counters (0 resets them); `keep_low` holds the
    /// clock low while disabled (inter-command stretch); `suppress` releases
    /// the pad regardless of phase (bus-free wait).
    pub fn set_controls(&mut self, en: bool, keep_low: bool, suppress: bool) {
        self.en = en;
        self.keep_low = keep_low;
        self.suppress = suppress;
    }

    /// Transmit-phase strobe: last tick of quarter 1.
    #[must_use]
    pub fn tx_strobe(&self) -> bool {
        self.en && self.sub == 1 && self.cnt == self.divisor()
    }

    /// Receive-phase strobe: last tick of quarter 3.
    #[must_use]
    pub fn rx_strobe(&self) -> bool {
        self.en && self.sub == 3 && self.cnt == self.divisor()
    }

    /// Advance one system tick and drive the SCL pad.
    pub fn tick<P: OpenDrainPad>(&mut self, scl: &mut P) {
        if self.en {
            if self.cnt < self.divisor() {
                self.cnt += 1;
            } else {
                self.cnt = 0;
                self.clk = self.sub & 0b10 != 0;
                self.sub = (self.sub + 1) & 0b11;
            }
        } else {
            self.clk = !self.keep_low;
            self.cnt = 0;
            self.sub = 0;
        }

        let pull = !self.clk && !self.suppress;
        match self.driver {
            PadDriver::Tristate => {
                self.buffer.set_enable(pull);
                self.buffer.apply(scl);
            }
            PadDriver::Direct => {
                if pull {
                    scl.drive_low();
                } else {
                    scl.release();
                }
            }
        }
    }

    /// Select the speed mode. Callers latch this only while the bus is
    /// inactive; the generator itself applies it immediately.
    pub fn set_mode(&mut self, mode: SpeedMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn mode(&self) -> SpeedMode {
        self.mode
    }

    /// Divisor currently in effect.
    #[must_use]
    pub fn divisor(&self) -> u32 {
        self.divisors[match self.mode {
            SpeedMode::Standard => 0,
            SpeedMode::Fast => 1,
            SpeedMode::FastPlus => 2,
        }]
    }

    /// Current generated clock level (before pad suppression).
    #[must_use]
    pub fn clk_level(&self) -> bool {
        self.clk
    }

    /// Current quarter phase (0–3).
    #[must_use]
    pub fn quarter(&self) -> u8 {
        self.sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use i2c_core::Wire;

    #[test]
    fn divisors_follow_ceiling_formula() {
        // 100 MHz system clock.
        assert_eq!(freq_to_div(100_000_000, 100_000), Ok(249));
        assert_eq!(freq_to_div(100_000_000, 400_000), Ok(62));
        assert_eq!(freq_to_div(100_000_000, 1_000_000), Ok(24));
        // Non-divisible frequency rounds up, keeping the bus at or below
        // target.
        assert_eq!(freq_to_div(10_000_000, 400_000), Ok(6));
    }

    #[test]
    fn too_slow_system_clock_is_rejected() {
        assert_eq!(
            freq_to_div(300_000, 100_000),
            Err(ConfigError::ClockTooSlow {
                sys_clk_hz: 300_000,
                target_hz: 100_000,
            })
        );
        assert!(
            ClkGen::new(SysClock::new(300_000), SpeedMode::Standard, PadDriver::Direct).is_err()
        );
    }

    fn run(ckg: &mut ClkGen, wire: &mut Wire, slot: usize, ticks: usize) -> Vec<bool> {
        let mut levels = Vec::with_capacity(ticks);
        for _ in 0..ticks {
            ckg.set_controls(true, false, false);
            ckg.tick(&mut wire.driver(slot));
            levels.push(wire.level());
        }
        levels
    }

    #[test]
    fn high_and_low_phases_last_half_a_period_each() {
        // 4 MHz system, Standard mode: div = ceil(4e6/4e5)-1 = 9, so each
        // quarter phase lasts 10 ticks.
        let mut ckg = ClkGen::new(SysClock::new(4_000_000), SpeedMode::Standard, PadDriver::Direct)
            .expect("divisor fits");
        assert_eq!(ckg.divisor(), 9);
        let quarter = ckg.divisor() as usize + 1;

        let mut wire = Wire::new();
        let slot = wire.attach();
        let levels = run(&mut ckg, &mut wire, slot, quarter * 4 * 8);

        // Skip the initial (high) alignment, then check runs of 2 quarters.
        let first_low = levels.iter().position(|&l| !l).expect("clock runs");
        let mut run_len = 0usize;
        let mut current = false;
        for &level in &levels[first_low..] {
            if level == current {
                run_len += 1;
            } else {
                if run_len > 0 {
                    assert_eq!(run_len, quarter * 2, "half-period run length");
                }
                current = level;
                run_len = 1;
            }
        }
    }

    #[test]
    fn strobes_fire_once_per_period_in_quadrature() {
        let mut ckg = ClkGen::new(SysClock::new(4_000_000), SpeedMode::Standard, PadDriver::Direct)
            .expect("divisor fits");
        let quarter = ckg.divisor() as u64 + 1;
        let period = quarter * 4;

        let mut wire = Wire::new();
        let slot = wire.attach();
        let mut tx_ticks = Vec::new();
        let mut rx_ticks = Vec::new();
        for t in 0..(period * 6) {
            ckg.set_controls(true, false, false);
            if ckg.tx_strobe() {
                tx_ticks.push(t);
            }
            if ckg.rx_strobe() {
                rx_ticks.push(t);
            }
            ckg.tick(&mut wire.driver(slot));
        }

        assert_eq!(tx_ticks.len(), rx_ticks.len());
        for pair in tx_ticks.windows(2) {
            assert_eq!(pair[1] - pair[0], period);
        }
        // Receive strobe trails the transmit strobe by half a period.
        for (&tx, &rx) in tx_ticks.iter().zip(&rx_ticks) {
            assert_eq!(rx - tx, quarter * 2);
        }
    }

    #[test]
    fn disabled_with_keep_low_holds_the_line() {
        let mut ckg = ClkGen::new(SysClock::new(4_000_000), SpeedMode::Standard, PadDriver::Direct)
            .expect("divisor fits");
        let mut wire = Wire::new();
        let slot = wire.attach();

        ckg.set_controls(false, true, false);
        ckg.tick(&mut wire.driver(slot));
        assert!(!wire.level());

        ckg.set_controls(false, false, false);
        ckg.tick(&mut wire.driver(slot));
        assert!(wire.level());
    }

    #[test]
    fn suppress_releases_the_pad_mid_phase() {
        let mut ckg = ClkGen::new(SysClock::new(4_000_000), SpeedMode::Standard, PadDriver::Direct)
            .expect("divisor fits");
        let mut wire = Wire::new();
        let slot = wire.attach();

        // Run until the generator is in a low phase.
        loop {
            ckg.set_controls(true, false, false);
            ckg.tick(&mut wire.driver(slot));
            if !wire.level() {
                break;
            }
        }
        ckg.set_controls(true, false, true);
        ckg.tick(&mut wire.driver(slot));
        assert!(wire.level(), "suppressed clock must float");
    }

    #[test]
    fn tristate_and_direct_backends_match() {
        let mut direct =
            ClkGen::new(SysClock::new(4_000_000), SpeedMode::Fast, PadDriver::Direct)
                .expect("divisor fits");
        let mut tristate =
            ClkGen::new(SysClock::new(4_000_000), SpeedMode::Fast, PadDriver::Tristate)
                .expect("divisor fits");

        let mut wire_d = Wire::new();
        let slot_d = wire_d.attach();
        let mut wire_t = Wire::new();
        let slot_t = wire_t.attach();

        for _ in 0..64 {
            direct.set_controls(true, false, false);
            tristate.set_controls(true, false, false);
            direct.tick(&mut wire_d.driver(slot_d));
            tristate.tick(&mut wire_t.driver(slot_t));
            assert_eq!(wire_d.level(), wire_t.level());
        }
    }

    #[test]
    fn disabling_resets_the_phase_counters() {
        let mut ckg = ClkGen::new(SysClock::new(4_000_000), SpeedMode::Standard, PadDriver::Direct)
            .expect("divisor fits");
        let mut wire = Wire::new();
        let slot = wire.attach();

        // Run past two quarter boundaries so the counters have advanced.
        for _ in 0..25 {
            ckg.set_controls(true, false, false);
            ckg.tick(&mut wire.driver(slot));
        }
        assert_ne!(ckg.quarter(), 0);
        ckg.set_controls(false, false, false);
        ckg.tick(&mut wire.driver(slot));
        assert_eq!(ckg.quarter(), 0);
        assert!(ckg.clk_level());
    }
}
