//! Blink the on-board LED (PB5) at 1 Hz from a 500 ms periodic task

#![no_std]
#![no_main]

use avr_device::atmega328p::{Peripherals, PORTB};
use panic_halt as _;

const LED: u8 = 1 << 5;

fn toggle_led() {
    // Writing a one to PINx toggles the pin
    unsafe { (*PORTB::ptr()).pinb.write(|w| w.bits(LED)) };
}

static BLINK: isrtick_avr::AvrTask = isrtick_avr::deferred(500, toggle_led);

#[avr_device::entry]
fn main() -> ! {
    let Some(dp) = Peripherals::take() else {
        loop {}
    };
    dp.PORTB.ddrb.write(|w| unsafe { w.bits(LED) });

    if BLINK.begin().is_err() {
        loop {}
    }
    // SAFETY: every shared state is behind the scheduler's critical sections
    unsafe { avr_device::interrupt::enable() };

    loop {
        avr_device::asm::sleep();
    }
}
