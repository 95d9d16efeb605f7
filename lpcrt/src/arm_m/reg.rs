//! Support for volatile words: memory-mapped registers, and memory the reset
//! sequence writes before the compiler's view of it is valid.

use core::cell::UnsafeCell;
use core::ptr;

/// A word whose contents can be represented as `T`.  The contents are
/// accessed using `volatile` operations only, ensuring that apparently dead
/// loads and stores are not optimized away.
///
/// Registers (like cells) can be mutated through a shared reference `&`, and
/// a unique reference `&mut` to a register is not particularly meaningful.
#[repr(transparent)]
pub struct Reg<T: Copy> {
    value: UnsafeCell<T>,
}

impl<T: Copy> Reg<T> {
    /// Creates a register cell holding `value`, for unit tests.  Real
    /// registers are reached through `at`; a `static Reg` shared between
    /// host threads would race.
    #[cfg(test)]
    pub const fn new(value: T) -> Self {
        Reg { value: UnsafeCell::new(value) }
    }

    /// Views the word at `addr` as a register.
    ///
    /// # Safety
    ///
    /// `addr` must be suitably aligned for `T` and valid for reads and writes
    /// for `'static`.
    pub unsafe fn at(addr: usize) -> &'static Reg<T> {
        &*(addr as *const Reg<T>)
    }

    /// Reads the contents of the register using a volatile load.
    pub fn get(&self) -> T {
        unsafe { ptr::read_volatile(self.value.get()) }
    }

    /// Replaces the contents of the register using a volatile store.
    pub fn set(&self, value: T) {
        unsafe { ptr::write_volatile(self.value.get(), value) }
    }

    pub fn update<F: FnOnce(T) -> T>(&self, f: F) {
        self.set(f(self.get()))
    }
}

unsafe impl<T: Copy + Send> Sync for Reg<T> {}
