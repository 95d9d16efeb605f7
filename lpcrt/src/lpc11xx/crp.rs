//! Code Read Protection.
//!
//! The boot ROM reads the word at flash offset 0x2FC to decide how much access
//! to allow through SWD and the ISP bootloader.  Most values mean "no
//! protection"; only the five below are recognized.

use crate::bits::{FromBits, IntoBits};

/// Image offset of the CRP word.
pub const CRP_OFFSET: usize = 0x2FC;

bit_enums! {
    /// Protection levels understood by the LPC11xx boot ROM.
    pub bit_enum CodeProtection {
        /// No protection.
        Disabled = 0x0000_0000,
        /// Don't enter ISP on reset, even if PIO0_1 is held low.
        NoIsp = 0x4E69_7370,
        /// SWD disabled; ISP can still write sectors above 0.
        Crp1 = 0x1234_5678,
        /// SWD disabled; ISP can only erase the whole part.
        Crp2 = 0x8765_4321,
        /// SWD disabled and ISP entry from PIO0_1 disabled.  Irreversible
        /// unless the application provides its own update path.
        Crp3 = 0x4321_8765,
    }
}

impl CodeProtection {
    /// Whether this level shuts off the debugger.
    pub fn disables_swd(self) -> bool {
        matches!(self,
                 CodeProtection::Crp1 | CodeProtection::Crp2 | CodeProtection::Crp3)
    }

    /// Interprets a raw CRP word.  Unrecognized words give no protection, but
    /// are returned as an error so tooling can point them out.
    pub fn decode(word: u32) -> Result<Self, crate::bits::BadBits> {
        Self::from_bits(word)
    }

    pub fn word(self) -> u32 {
        self.into_bits()
    }
}

/// The level this build asks for, chosen by Cargo feature.
#[cfg(feature = "crp-3")]
pub const SELECTED: CodeProtection = CodeProtection::Crp3;
#[cfg(all(feature = "crp-2", not(feature = "crp-3")))]
pub const SELECTED: CodeProtection = CodeProtection::Crp2;
#[cfg(all(feature = "crp-1", not(any(feature = "crp-2", feature = "crp-3"))))]
pub const SELECTED: CodeProtection = CodeProtection::Crp1;
#[cfg(all(feature = "crp-no-isp",
          not(any(feature = "crp-1", feature = "crp-2", feature = "crp-3"))))]
pub const SELECTED: CodeProtection = CodeProtection::NoIsp;
#[cfg(not(any(feature = "crp-no-isp", feature = "crp-1", feature = "crp-2",
              feature = "crp-3")))]
pub const SELECTED: CodeProtection = CodeProtection::Disabled;

/// The CRP word itself.  The linker script places `.crp` at `CRP_OFFSET`.
#[cfg(target_os = "none")]
#[no_mangle]
#[used]
#[link_section = ".crp"]
pub static CODE_PROTECTION: u32 = SELECTED as u32;
