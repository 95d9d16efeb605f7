//! What happens when the program gives up: failed assertions and panics.

use crate::arm_m;

/// Stops the system after a failed assertion or a panic.  Interrupts are
/// masked first so that no handler runs on top of whatever state caused the
/// failure, then the processor spins in the Halt Loop.  A debugger attached at
/// this point will find the core here.
#[inline(never)]
pub fn assert_failed() -> ! {
    arm_m::set_primask(true);
    arm_m::halt()
}

/// This will be invoked on `panic!`.  Applications can supply their own by
/// enabling the `app-panic-handler` feature.
#[cfg(all(target_os = "none", not(feature = "app-panic-handler")))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    log::error!("{}", info);
    assert_failed()
}
