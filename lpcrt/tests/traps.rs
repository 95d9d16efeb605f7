//! Vectors nobody claimed, and the places control goes to die.
//!
//! "Never returns" is checked by running the code on its own thread and
//! watching that it is still going after a while.  Those threads spin until
//! the test process exits.

use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::thread;
use std::time::Duration;

use lpcrt::arm_m::exc::{default_handler, Exception, Handler};
use lpcrt::arm_m::startup::{halt_on, Machine};
use lpcrt::lang;
use lpcrt::lpc11xx::irq::{Bindings, Interrupt, VectorTable};

extern "C" fn uart() {}

unsafe extern "C" fn no_reset() -> ! {
    lpcrt::arm_m::halt()
}

static BINDINGS: Bindings = Bindings::DEFAULT.interrupt(Interrupt::Uart0, uart);

fn assert_never_returns<F: FnOnce() + Send + 'static>(f: F) {
    let spinner = thread::spawn(f);
    thread::sleep(Duration::from_millis(200));
    assert!(!spinner.is_finished(), "control came back");
}

#[test]
fn unbound_interrupt_lands_in_default_handler_and_stays() {
    let table = VectorTable::new(ptr::null(), no_reset, ptr::null(), &BINDINGS);

    // Latch the watchdog interrupt, which the application never bound.
    let target: Handler = table.handler(Interrupt::Wdt.into());
    assert_eq!(target as usize, default_handler as usize);

    assert_never_returns(move || target());
}

#[test]
fn unbound_fault_lands_in_default_handler() {
    let table = VectorTable::new(ptr::null(), no_reset, ptr::null(), &BINDINGS);
    assert_eq!(table.handler(Exception::HardFault.into()) as usize,
               default_handler as usize);
}

#[test]
fn assertion_failure_never_returns() {
    assert_never_returns(|| {
        lang::assert_failed();
    });
}

/// Counts turns of the Halt Loop, bailing out after a few.
struct Counter(u32);

struct Stop;

impl Machine for Counter {
    unsafe fn store(&mut self, _: usize, _: u32) {
        panic!("halt loop wrote memory")
    }
    unsafe fn load(&self, _: usize) -> u32 {
        panic!("halt loop read memory")
    }
    unsafe fn load_hook(&self, _: usize) -> usize {
        panic!("halt loop read a hook")
    }
    unsafe fn call(&mut self, _: usize) {
        panic!("halt loop called out")
    }

    fn idle(&mut self) {
        self.0 += 1;
        if self.0 == 1000 {
            panic::panic_any(Stop)
        }
    }
}

#[test]
fn halt_loop_only_idles() {
    let mut m = Counter(0);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        halt_on(&mut m);
    }));
    assert!(outcome.expect_err("halt returned").is::<Stop>());
    assert_eq!(m.0, 1000);
}
