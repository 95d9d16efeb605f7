//! Checks on raw LPC11xx firmware images, for use by build and flashing tools.
//!
//! The boot ROM only runs an image from flash if the first eight words of the
//! vector table sum to zero (mod 2^32).  Word 7 is reserved by ARM, so NXP
//! uses it to hold the balancing value.  Addresses of the handlers aren't
//! known until link time, so the value is filled in afterwards: either by the
//! linker script through `__checksum__`, or by patching the binary with
//! `patch_checksum`.

use core::fmt;

use bitflags::bitflags;

use crate::arm_m::exc::CHECKSUM_SLOT;
use crate::arm_m::startup::WORD;
use crate::lpc11xx::crp::{CodeProtection, CRP_OFFSET};

/// Number of leading words covered by the checksum, including itself.
pub const CHECKED_WORDS: usize = CHECKSUM_SLOT + 1;

/// Why an image couldn't be examined at all.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ImageError {
    /// The image is too short to hold a vector table header.
    Truncated { len: usize, needed: usize },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ImageError::Truncated { len, needed } => {
                write!(f, "image is {} bytes, need at least {}", len, needed)
            }
        }
    }
}

bitflags! {
    /// Problems `inspect` can find in an image that would otherwise load.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Flaws: u32 {
        /// Words 0 through 7 don't sum to zero; the boot ROM will stay in ISP.
        const BAD_CHECKSUM = 1 << 0;
        /// The initial stack pointer isn't word aligned.
        const STACK_MISALIGNED = 1 << 1;
        /// The reset vector doesn't have the Thumb bit set, so the first
        /// instruction fetch would fault.
        const RESET_NOT_THUMB = 1 << 2;
        /// The word at 0x2FC isn't a CRP value the boot ROM recognizes.
        const UNKNOWN_CRP = 1 << 3;
    }
}

/// The value for word 7 that makes words 0 through 7 sum to zero.
pub fn vector_checksum(words: &[u32; CHECKSUM_SLOT]) -> u32 {
    let sum = words.iter().fold(0u32, |acc, w| acc.wrapping_add(*w));
    0u32.wrapping_sub(sum)
}

fn word_at(image: &[u8], index: usize) -> u32 {
    let at = index * WORD;
    u32::from_le_bytes([image[at], image[at + 1], image[at + 2], image[at + 3]])
}

fn header(image: &[u8]) -> Result<[u32; CHECKED_WORDS], ImageError> {
    let needed = CHECKED_WORDS * WORD;
    if image.len() < needed {
        return Err(ImageError::Truncated { len: image.len(), needed });
    }
    let mut words = [0; CHECKED_WORDS];
    for (i, w) in words.iter_mut().enumerate() {
        *w = word_at(image, i);
    }
    Ok(words)
}

/// Rewrites word 7 of a little-endian raw image so that the boot ROM accepts
/// it.  Returns the value written.
pub fn patch_checksum(image: &mut [u8]) -> Result<u32, ImageError> {
    let words = header(image)?;
    let mut covered = [0; CHECKSUM_SLOT];
    covered.copy_from_slice(&words[..CHECKSUM_SLOT]);
    let sum = vector_checksum(&covered);

    let at = CHECKSUM_SLOT * WORD;
    image[at..at + WORD].copy_from_slice(&sum.to_le_bytes());
    Ok(sum)
}

/// Examines a raw image.  An empty set of `Flaws` means the boot ROM should
/// start it.
pub fn inspect(image: &[u8]) -> Result<Flaws, ImageError> {
    let words = header(image)?;
    let mut flaws = Flaws::empty();

    let total = words.iter().fold(0u32, |acc, w| acc.wrapping_add(*w));
    if total != 0 {
        flaws |= Flaws::BAD_CHECKSUM;
    }
    if words[0] % WORD as u32 != 0 {
        flaws |= Flaws::STACK_MISALIGNED;
    }
    if words[1] & 1 == 0 {
        flaws |= Flaws::RESET_NOT_THUMB;
    }
    if image.len() >= CRP_OFFSET + WORD
        && CodeProtection::decode(word_at(image, CRP_OFFSET / WORD)).is_err() {
        flaws |= Flaws::UNKNOWN_CRP;
    }

    Ok(flaws)
}
