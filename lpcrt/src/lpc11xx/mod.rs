//! Support for the NXP LPC11xx series of SoCs.

pub mod crp;
pub mod image;
pub mod irq;
