//! Support for ARMv6-M processors (the Cortex-M0 in the LPC11xx).

pub mod exc;
pub mod reg;
pub mod startup;

/// Sets the processor's `PRIMASK` register to `val`.  Setting it masks every
/// configurable-priority exception and interrupt; clearing it unmasks them.
///
/// On hosted builds there is no `PRIMASK` and this does nothing.
#[inline]
pub fn set_primask(val: bool) {
    #[cfg(target_arch = "arm")]
    unsafe {
        if val {
            core::arch::asm!("cpsid i", options(nostack, preserves_flags))
        } else {
            core::arch::asm!("cpsie i", options(nostack, preserves_flags))
        }
    }
    #[cfg(not(target_arch = "arm"))]
    let _ = val;
}

/// The Halt Loop.  Spins forever without touching memory.  This is where
/// control ends up when there is nothing left to return to.
#[inline(never)]
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop()
    }
}
