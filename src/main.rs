//! Blinks the LED on PIO0_7 of an LPC1114 board from the SysTick interrupt.
//!
//! Build for `thumbv6m-none-eabi`.  Hosted builds compile the application
//! logic but have nothing to run.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]
#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use core::sync::atomic::{AtomicU32, Ordering};

use lpcrt::arm_m::exc::Exception;
use lpcrt::arm_m::reg::Reg;
use lpcrt::lpc11xx::irq::Bindings;

/******************************************************************************/

// Board description.

/// The internal RC oscillator.  We don't touch the PLL, so this is also the
/// core clock.
const IRC_HZ: u32 = 12_000_000;

const SYSAHBCLKCTRL: usize = 0x4004_8080;
const AHB_GPIO: u32 = 1 << 6;
const AHB_IOCON: u32 = 1 << 16;

const FLASHCFG: usize = 0x4003_C010;

const GPIO0_DIR: usize = 0x5000_8000;
/// Masked data access for PIO0_7 alone: address bits [13:2] select the pins.
const GPIO0_DATA_P7: usize = 0x5000_0000 + (LED << 2);
const LED: usize = 1 << 7;

const SYST_CSR: usize = 0xE000_E010;
const SYST_RVR: usize = 0xE000_E014;
const SYST_CVR: usize = 0xE000_E018;
const SYST_ENABLE_TICKINT_CORECLK: u32 = 0b111;

const TICK_HZ: u32 = 100;

/******************************************************************************/

// Application state.  `TICKS` lands in BSS and `HALF_PERIOD` in data, so
// both depend on the reset sequence having done its job.

static TICKS: AtomicU32 = AtomicU32::new(0);
static HALF_PERIOD: AtomicU32 = AtomicU32::new(TICK_HZ / 2);

fn reg(addr: usize) -> &'static Reg<u32> {
    unsafe { Reg::at(addr) }
}

/// Hardware bring-up, run by the reset sequence before any init hooks.
fn system_init() {
    reg(SYSAHBCLKCTRL).update(|v| v | AHB_GPIO | AHB_IOCON);
    // Zero wait states are fine up to 20 MHz.
    reg(FLASHCFG).update(|v| v & !0b11);
}

/// The application entry point.
fn app() {
    reg(GPIO0_DIR).update(|v| v | LED as u32);

    reg(SYST_RVR).set(IRC_HZ / TICK_HZ - 1);
    reg(SYST_CVR).set(0);
    reg(SYST_CSR).set(SYST_ENABLE_TICKINT_CORECLK);

    loop {
        core::hint::spin_loop()
    }
}

extern "C" fn sys_tick() {
    // The M0 has no atomic read-modify-write, but we're the only writer.
    let t = TICKS.load(Ordering::Relaxed).wrapping_add(1);
    TICKS.store(t, Ordering::Relaxed);

    if t % HALF_PERIOD.load(Ordering::Relaxed) == 0 {
        let led = reg(GPIO0_DATA_P7);
        led.set(led.get() ^ LED as u32);
    }
}

/******************************************************************************/

// Vectors.

const BINDINGS: Bindings = Bindings::DEFAULT
    .exception(Exception::SysTick, sys_tick);

#[cfg(target_os = "none")]
lpcrt::reset_handler! {
    /// Slot 1 of the vector table, and the ELF entry point.
    pub fn _reset_vector {
        system_init: system_init,
        main: app,
    }
}

/// The ROM vector table.  The linker script puts `.isr_vector` at address 0
/// and keeps it even though nothing refers to it.
///
/// Word 7 links as zero, which the boot ROM rejects.  Patch the binary with
/// `lpcrt::lpc11xx::image::patch_checksum` (or a flasher that does the same,
/// like `lpc21isp`) before writing it to flash.
#[cfg(target_os = "none")]
#[no_mangle]
#[link_section = ".isr_vector"]
#[used]
pub static ISR_VECTORS: lpcrt::lpc11xx::irq::VectorTable =
    lpcrt::lpc11xx::irq::VectorTable::new(
        unsafe { core::ptr::addr_of!(lpcrt::arm_m::startup::linker::_stack) },
        _reset_vector,
        unsafe {
            core::ptr::addr_of!(lpcrt::arm_m::startup::linker::__checksum__)
        },
        &BINDINGS);

#[cfg(not(target_os = "none"))]
fn main() {}
