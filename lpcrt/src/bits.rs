//! Support for converting between Rust types and the raw words the hardware
//! (or a firmware image) stores.

#![macro_use]

use core::fmt;

/// Error type indicating that a word read from the hardware or an image wasn't
/// valid for the expected type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BadBits(pub u32);

impl fmt::Display for BadBits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unrecognized bit pattern {:#010x}", self.0)
    }
}

/// Result type for `BadBits`.
pub type BitsResult<T> = Result<T, BadBits>;

/// Construct `Self` from a bitwise representation, without assuming that
/// every possible bit pattern can be represented.
///
/// This trait is similar to `core::convert::TryFrom`, but fixed to `u32`
/// words and `BadBits`.
pub trait FromBits: Sized {
    /// Constructs `Self` from `bits`.  If `bits` is not valid (e.g. is out of
    /// range for an enum) returns `BadBits`.
    fn from_bits(bits: u32) -> BitsResult<Self>;
}

/// Converts `self` into its bitwise representation.  For C-like enumerations
/// this is equivalent to a widening cast using `as`.  It should not panic.
pub trait IntoBits {
    fn into_bits(self) -> u32;
}

/// Declares `bit_enum` types.  These are Rust enums with bidirectional mapping
/// to 32-bit patterns.
///
/// The declaration should be a simple `enum` with every value given an explicit
/// numeric equivalent, and with the keyword `enum` replaced by `bit_enum`, like
/// so:
///
/// ```ignore
/// bit_enums! {
///     pub bit_enum Mode {
///         Stun = 0,
///         Coddle = 1,
///         Blanche = 0x8000_0000,
///     }
/// }
/// ```
///
/// The enum is `#[repr(u32)]`, so values above `i32::MAX` are fine.  The macro
/// derives `Copy`, `Clone`, `Debug`, `Eq`, `PartialEq`, `IntoBits`, and
/// `FromBits`.
#[macro_export]
macro_rules! bit_enums {
    () => {};
    (
        $(#[$m:meta])*
        pub bit_enum $name:ident {
            $($(#[$em:meta])* $e_name:ident = $e_val:expr,)+
        }
        $($rest:tt)*
    ) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        #[repr(u32)]
        $(#[$m])*
        pub enum $name {
            $($(#[$em])* $e_name = $e_val),+
        }

        impl $crate::bits::IntoBits for $name {
            fn into_bits(self) -> u32 {
                self as u32
            }
        }

        impl $crate::bits::FromBits for $name {
            fn from_bits(bits: u32) -> $crate::bits::BitsResult<Self> {
                $(
                    if bits == $e_val {
                        return Ok($name::$e_name)
                    }
                )+
                Err($crate::bits::BadBits(bits))
            }
        }

        $crate::bit_enums!{$($rest)*}
    };
}
