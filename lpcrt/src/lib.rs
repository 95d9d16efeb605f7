//! Bare-metal runtime for NXP LPC11xx (ARMv6-M) parts: the ROM vector table,
//! the default exception handler, and the reset sequence that establishes the
//! Rust environment before `main`.

#![no_std]

#![deny(
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_results,
    )]

#[cfg(test)]
#[macro_use]
extern crate std;

#[macro_use]
pub mod bits;

pub mod arm_m;
pub mod lang;
pub mod lpc11xx;
