//! 8-bit compare-match tick timer
//!
//! The counter free-runs in normal mode through all 256 steps and the
//! compare register sits at mid-count, so the match interrupt fires once per
//! revolution: every `prescaler * 256` CPU cycles.

use isrtick_core::{Duration, TickConfig, TickSource};

#[cfg(all(feature = "timer0", feature = "timer2"))]
compile_error!("features `timer0` and `timer2` are mutually exclusive");
#[cfg(not(any(feature = "timer0", feature = "timer2")))]
compile_error!("select a tick timer with feature `timer0` or `timer2`");
#[cfg(all(feature = "channel-a", feature = "channel-b"))]
compile_error!("features `channel-a` and `channel-b` are mutually exclusive");
#[cfg(not(any(feature = "channel-a", feature = "channel-b")))]
compile_error!("select a compare channel with feature `channel-a` or `channel-b`");

/// Core clock frequency
#[cfg(feature = "cpu-8mhz")]
pub const CPU_HZ: u32 = 8_000_000;
/// Core clock frequency
#[cfg(not(feature = "cpu-8mhz"))]
pub const CPU_HZ: u32 = 16_000_000;

/// Prescaler used for the tick timer
pub const PRESCALER: u16 = 64;

/// Build-time tick configuration: 1024 us at 16 MHz, 2048 us at 8 MHz
pub const TICK: TickConfig = TickConfig::new(CPU_HZ, PRESCALER);

/// Counter value at which the compare match fires
const COMPARE_AT: u8 = 128;

// TIMSKn bits
const OCIE_A: u8 = 1 << 1;
const OCIE_B: u8 = 1 << 2;

#[cfg(feature = "channel-a")]
const OCIE: u8 = OCIE_A;
#[cfg(feature = "channel-b")]
const OCIE: u8 = OCIE_B;

/// Clock-select bits of TCCR0B for a prescaler
#[cfg(feature = "timer0")]
const fn clock_select(prescaler: u16) -> u8 {
    match prescaler {
        1 => 0b001,
        8 => 0b010,
        64 => 0b011,
        256 => 0b100,
        1024 => 0b101,
        _ => panic!("Timer0 has no such prescaler"),
    }
}

/// Clock-select bits of TCCR2B for a prescaler
#[cfg(feature = "timer2")]
const fn clock_select(prescaler: u16) -> u8 {
    match prescaler {
        1 => 0b001,
        8 => 0b010,
        32 => 0b011,
        64 => 0b100,
        128 => 0b101,
        256 => 0b110,
        1024 => 0b111,
        _ => panic!("Timer2 has no such prescaler"),
    }
}

const CLOCK_SELECT: u8 = clock_select(PRESCALER);

macro_rules! tick_registers {
    ($tc:ident, $tccra:ident, $tccrb:ident, $tcnt:ident, $ocra:ident, $ocrb:ident, $timsk:ident, $tifr:ident) => {
        use avr_device::atmega328p::$tc;

        fn program(clock_select: u8, interrupt: u8) {
            // SAFETY: the tick timer is reserved for the scheduler, and the
            // caller runs inside a critical section
            unsafe {
                let tc = &*$tc::ptr();
                tc.$timsk.write(|w| w.bits(0));
                tc.$tccra.write(|w| w.bits(0));
                tc.$tccrb.write(|w| w.bits(0));
                tc.$tcnt.write(|w| w.bits(0));
                tc.$ocra.write(|w| w.bits(COMPARE_AT));
                tc.$ocrb.write(|w| w.bits(COMPARE_AT));
                // OCFnA/OCFnB sit at the OCIE bit positions; clear stale matches
                tc.$tifr.write(|w| w.bits(OCIE_A | OCIE_B));
                tc.$timsk.write(|w| w.bits(interrupt));
                tc.$tccrb.write(|w| w.bits(clock_select));
            }
        }

        fn halt() {
            // SAFETY: as in `program`
            unsafe {
                let tc = &*$tc::ptr();
                tc.$timsk.write(|w| w.bits(0));
                tc.$tccrb.write(|w| w.bits(0));
            }
        }
    };
}

#[cfg(feature = "timer0")]
tick_registers!(TC0, tccr0a, tccr0b, tcnt0, ocr0a, ocr0b, timsk0, tifr0);
#[cfg(feature = "timer2")]
tick_registers!(TC2, tccr2a, tccr2b, tcnt2, ocr2a, ocr2b, timsk2, tifr2);

/// Tick source on the build-time timer and compare channel
#[derive(Debug)]
pub struct AvrTimer {
    quantum: Duration,
}

impl AvrTimer {
    pub const fn new() -> Self {
        Self {
            quantum: TICK.quantum(),
        }
    }
}

impl Default for AvrTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for AvrTimer {
    fn quantum(&self) -> Duration {
        self.quantum
    }

    fn start(&mut self) {
        program(CLOCK_SELECT, OCIE);
    }

    fn stop(&mut self) {
        halt();
    }
}
