//! Rust runtime startup support for ARMv6-M bare metal targets.
//!
//! The processor loads `sp` from slot 0 of the vector table and jumps through
//! slot 1.  From there, `start` walks the fixed sequence:
//!
//! 1. zero BSS,
//! 2. copy initialized data from its load image in flash,
//! 3. call the board's `system_init` hook,
//! 4. run the init hooks (`.init_array`),
//! 5. call `main`,
//! 6. if `main` returns, run the fini hooks (`.fini_array`),
//! 7. halt.
//!
//! The sequence is written against the `Machine` trait so it can be run over a
//! simulated address space; on the target it runs over `Direct`.
//!
//! To make use of this module on the target, generate a reset handler with
//! `reset_handler!` and put it in slot 1 of your vector table:
//!
//! ```ignore
//! fn system_init() { /* clocks */ }
//! fn app() { /* code here */ }
//!
//! lpcrt::reset_handler! {
//!     pub fn _reset_vector {
//!         system_init: system_init,
//!         main: app,
//!     }
//! }
//! ```

use core::mem;

use log::debug;

use crate::arm_m::reg::Reg;

/// Granularity of the BSS and data regions.
pub const WORD: usize = mem::size_of::<u32>();

/// The startup routine calls functions after data is initialized but before
/// main, and after main returns.  Functions must be of this type.
pub type InitHook = extern "C" fn();

/// Distance between consecutive entries of an init or fini list.
pub const HOOK_STRIDE: usize = mem::size_of::<InitHook>();

/// A pair of address markers delimiting `[start, end)`.
///
/// Regions are opaque to the runtime: it doesn't check them, it only walks
/// them upward and stops when it reaches `end`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl Region {
    pub const fn new(start: usize, end: usize) -> Self {
        Region { start, end }
    }

    /// Length in bytes.  Zero if the markers are inverted.
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn contains(&self, addr: usize) -> bool {
        self.start <= addr && addr < self.end
    }
}

/// Everything the linker tells the runtime about the memory image.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Layout {
    /// Zero-initialized statics.
    pub bss: Region,
    /// Initialized statics, as seen in RAM.
    pub data: Region,
    /// Address of the read-only template for `data`.
    pub data_load: usize,
    /// Hooks to run before main.
    pub init_array: Region,
    /// Hooks to run if main returns.
    pub fini_array: Region,
}

/// The machine the reset sequence drives.
///
/// Until `zero_region` and `restore_region` finish, an implementation must
/// not depend on any static that lives in the regions being initialized.
pub trait Machine {
    /// Writes `word` at `addr`.
    unsafe fn store(&mut self, addr: usize, word: u32);

    /// Reads the word at `addr`.
    unsafe fn load(&self, addr: usize) -> u32;

    /// Reads the hook address stored in a list entry at `addr`.
    unsafe fn load_hook(&self, addr: usize) -> usize;

    /// Calls the zero-argument function at `hook`.
    unsafe fn call(&mut self, hook: usize);

    /// One turn of the Halt Loop.
    fn idle(&mut self) {
        core::hint::spin_loop()
    }
}

/// Hooks the application supplies to the reset sequence.
pub trait Application {
    /// Hardware bring-up: clocks, PLL, flash wait states.  Runs after the
    /// memory image is valid and before the init hooks.
    fn system_init(&mut self);

    /// The application entry point.
    fn main(&mut self);
}

/// An `Application` made of two plain functions.  This is what
/// `reset_handler!` builds.
#[derive(Copy, Clone)]
pub struct Entry {
    pub system_init: fn(),
    pub main: fn(),
}

impl Application for Entry {
    fn system_init(&mut self) {
        (self.system_init)()
    }

    fn main(&mut self) {
        (self.main)()
    }
}

/// `Machine` for the real thing: addresses are addresses, hooks are function
/// pointers.
#[derive(Copy, Clone, Debug, Default)]
pub struct Direct;

impl Machine for Direct {
    unsafe fn store(&mut self, addr: usize, word: u32) {
        Reg::<u32>::at(addr).set(word)
    }

    unsafe fn load(&self, addr: usize) -> u32 {
        Reg::<u32>::at(addr).get()
    }

    unsafe fn load_hook(&self, addr: usize) -> usize {
        Reg::<usize>::at(addr).get()
    }

    unsafe fn call(&mut self, hook: usize) {
        let f = mem::transmute::<usize, InitHook>(hook);
        f()
    }
}

/// Writes zero to every word of `region`, lowest address first.
///
/// # Safety
///
/// `region` must be word aligned and writable, and nothing may be reading it
/// concurrently.
pub unsafe fn zero_region<M: Machine>(machine: &mut M, region: Region) {
    let mut addr = region.start;
    while addr < region.end {
        machine.store(addr, 0);
        addr += WORD;
    }
}

/// Copies `dest.len()` bytes, a word at a time, from `load` into `dest`.  The
/// template is only read.
///
/// # Safety
///
/// As for `zero_region`, plus `load` must be readable for the same length.
pub unsafe fn restore_region<M: Machine>(machine: &mut M,
                                         dest: Region,
                                         load: usize) {
    let (mut to, mut from) = (dest.start, load);
    while to < dest.end {
        let word = machine.load(from);
        machine.store(to, word);
        to += WORD;
        from += WORD;
    }
}

/// Calls each hook listed in `list`, in increasing address order, exactly
/// once.  Returns how many were called.  An empty list is fine.
///
/// # Safety
///
/// Every entry in `list` must be the address of an `InitHook`.
pub unsafe fn run_hooks<M: Machine>(machine: &mut M, list: Region) -> usize {
    let mut count = 0;
    let mut addr = list.start;
    while addr < list.end {
        let hook = machine.load_hook(addr);
        machine.call(hook);
        count += 1;
        addr += HOOK_STRIDE;
    }
    count
}

/// Loops in the Halt Loop forever.
pub fn halt_on<M: Machine>(machine: &mut M) -> ! {
    loop {
        machine.idle()
    }
}

/// Runs the reset sequence up to, but not including, `main`: establishes the
/// memory image, brings up the hardware, and runs the init hooks.
///
/// # Safety
///
/// This is the reset path.  `layout` must describe this program's memory
/// image, and nothing else may be running: an interrupt taken halfway through
/// would observe partially initialized statics.
pub unsafe fn initialize<M, A>(machine: &mut M, layout: &Layout, app: &mut A)
    where M: Machine, A: Application
{
    zero_region(machine, layout.bss);
    restore_region(machine, layout.data, layout.data_load);

    // Statics are valid from here on, so it's safe to log.
    debug!("memory image ready: bss {:#x}..{:#x}, data {:#x}..{:#x}",
           layout.bss.start, layout.bss.end,
           layout.data.start, layout.data.end);

    app.system_init();

    let n = run_hooks(machine, layout.init_array);
    debug!("ran {} init hooks", n);
}

/// The whole reset sequence.  Never returns: if `main` does, the fini hooks
/// run and the machine halts.
///
/// # Safety
///
/// As for `initialize`.
pub unsafe fn start<M, A>(machine: &mut M, layout: &Layout, app: &mut A) -> !
    where M: Machine, A: Application
{
    initialize(machine, layout, app);

    app.main();

    debug!("main returned");
    let n = run_hooks(machine, layout.fini_array);
    debug!("ran {} fini hooks; halting", n);

    halt_on(machine)
}

/// Symbols exported by the linker script.  Only their addresses mean anything;
/// never read them.
#[cfg(target_os = "none")]
pub mod linker {
    extern "C" {
        pub static _stack: u32;
        pub static __checksum__: u32;

        pub static mut _bss_start: u32;
        pub static mut _bss_end: u32;
        pub static mut _data_start: u32;
        pub static mut _data_end: u32;
        pub static _data_src_start: u32;

        pub static _init_array_start: usize;
        pub static _init_array_end: usize;
        pub static _fini_array_start: usize;
        pub static _fini_array_end: usize;
    }
}

/// The `Layout` described by the linker script.  Only takes addresses, so it
/// is safe to call before statics are initialized.
#[cfg(target_os = "none")]
#[inline(always)]
pub fn linker_layout() -> Layout {
    use core::ptr::{addr_of, addr_of_mut};
    use self::linker::*;

    unsafe {
        Layout {
            bss: Region::new(addr_of_mut!(_bss_start) as usize,
                             addr_of_mut!(_bss_end) as usize),
            data: Region::new(addr_of_mut!(_data_start) as usize,
                              addr_of_mut!(_data_end) as usize),
            data_load: addr_of!(_data_src_start) as usize,
            init_array: Region::new(addr_of!(_init_array_start) as usize,
                                    addr_of!(_init_array_end) as usize),
            fini_array: Region::new(addr_of!(_fini_array_start) as usize,
                                    addr_of!(_fini_array_end) as usize),
        }
    }
}

/// Body of the reset handler.  Call only from the function in slot 1 of the
/// vector table, which `reset_handler!` generates for you.
///
/// None of the Rust environment exists yet: statics hold garbage.  Everything
/// here up to the end of `restore_region` works out of registers and the
/// stack, which is valid because the hardware loaded `sp` from slot 0.
///
/// # Safety
///
/// Must be entered exactly once, straight out of reset.
#[cfg(target_os = "none")]
#[inline(always)]
pub unsafe fn reset(entry: Entry) -> ! {
    let mut entry = entry;
    start(&mut Direct, &linker_layout(), &mut entry)
}

/// Generates the function to place in the reset slot of the vector table.
///
/// Syntax:
///
/// ```ignore
/// lpcrt::reset_handler! {
///     pub fn _reset_vector {
///         system_init: my_system_init,
///         main: my_main,
///     }
/// }
/// ```
///
/// The generated function is `#[no_mangle]` so the linker script can name it
/// as the program entry point.
#[macro_export]
macro_rules! reset_handler {
    (
        $(#[$m:meta])*
        pub fn $name:ident {
            system_init: $init:path,
            main: $main:path $(,)?
        }
    ) => {
        $(#[$m])*
        #[no_mangle]
        pub unsafe extern "C" fn $name() -> ! {
            $crate::arm_m::startup::reset($crate::arm_m::startup::Entry {
                system_init: $init,
                main: $main,
            })
        }
    };
}

/// Defines one or more init hooks, which are functions that will be called
/// after the memory image and `system_init` are done, but before main.  Hooks
/// run in link order.
///
/// Init hooks produce `pub static` symbols in their defining module, raising
/// the possibility that clients could call your init hooks directly.  Sorry.
///
/// Syntax:
///
/// ```ignore
/// extern "C" fn my_init_hook() {
///     activate_lasers()
/// }
///
/// lpcrt::init_hooks! {
///     pub init_hook MY_INIT_HOOK = my_init_hook;
/// }
/// ```
///
/// The hooks are only placed in `.init_array` when building for the target;
/// a hosted loader would otherwise run them itself.
#[macro_export]
macro_rules! init_hooks {
    (
        $(
            $(#[$m:meta])*
            pub init_hook $name:ident = $f:path;
        )*
    ) => {
        $(
            $(#[$m])*
            #[cfg_attr(target_os = "none", link_section = ".init_array")]
            #[used]
            #[allow(dead_code)]
            pub static $name: $crate::arm_m::startup::InitHook = $f;
        )*
    };
}

/// Like `init_hooks!`, but for hooks that run if main returns.  They go into
/// `.fini_array` and run in link order, not reversed.
#[macro_export]
macro_rules! fini_hooks {
    (
        $(
            $(#[$m:meta])*
            pub fini_hook $name:ident = $f:path;
        )*
    ) => {
        $(
            $(#[$m])*
            #[cfg_attr(target_os = "none", link_section = ".fini_array")]
            #[used]
            #[allow(dead_code)]
            pub static $name: $crate::arm_m::startup::InitHook = $f;
        )*
    };
}
