//! The ARMv6-M exception table and the handlers bound into it.

use core::mem;

/// ARMv6-M interrupt and exception handlers are merely functions conforming to
/// the C ABI.
pub type Handler = extern "C" fn();

/// The reset vector is special: it must not return.  We can model this nicely
/// in Rust's type system as a diverging function.  We additionally mark the
/// reset handler as `unsafe` because it must do scary stuff, including zeroing
/// BSS.  Allowing a safe program to call it directly would be bad.
pub type ResetHandler = unsafe extern "C" fn() -> !;

/// Number of word-sized slots in the architectural part of the table.
pub const EXCEPTION_SLOTS: usize = 16;

/// Index of the word NXP's boot ROM treats as the image checksum.  ARM
/// reserves this slot; NXP uses it anyway.
pub const CHECKSUM_SLOT: usize = 7;

/// The Default Handler, bound to every vector the application leaves alone.
///
/// Taking an exception nobody asked for means we can't trust any part of the
/// system, including whatever would report the problem, so this does not
/// attempt recovery.  It spins forever and never writes memory.
#[inline(never)]
pub extern "C" fn default_handler() {
    super::halt()
}

/// Which handler a vector ends up with: one the application supplied, or the
/// shared `default_handler`.
///
/// Bindings are resolved when the vector table is built (at compile time, for
/// a `static` table) and never change afterwards.
#[derive(Copy, Clone)]
pub enum Binding {
    Default,
    Application(Handler),
}

impl Binding {
    /// The code address this binding places in the table.
    pub const fn resolve(self) -> Handler {
        match self {
            Binding::Default => default_handler,
            Binding::Application(h) => h,
        }
    }

    pub const fn is_default(self) -> bool {
        matches!(self, Binding::Default)
    }
}

/// Architectural exceptions that applications can bind on ARMv6-M.  The
/// discriminant is the slot index in the vector table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Exception {
    /// Non-Maskable Interrupt.
    Nmi = 2,
    /// Hard Fault.  On ARMv6-M every fault escalates here.
    HardFault = 3,
    /// Supervisor Call (`SVC`).
    SvCall = 11,
    /// Pendable service request.
    PendSv = 14,
    /// SysTick timer.
    SysTick = 15,
}

impl Exception {
    pub const ALL: [Exception; 5] = [
        Exception::Nmi,
        Exception::HardFault,
        Exception::SvCall,
        Exception::PendSv,
        Exception::SysTick,
    ];

    /// Word index of this exception's vector.
    pub const fn slot(self) -> usize {
        self as usize
    }

    const fn binding_index(self) -> usize {
        match self {
            Exception::Nmi => 0,
            Exception::HardFault => 1,
            Exception::SvCall => 2,
            Exception::PendSv => 3,
            Exception::SysTick => 4,
        }
    }
}

/// Build-time registry of application handlers for the architectural
/// exceptions.  Anything not bound here gets `default_handler`.
#[derive(Copy, Clone)]
pub struct ExceptionBindings {
    slots: [Binding; 5],
}

impl ExceptionBindings {
    pub const DEFAULT: ExceptionBindings = ExceptionBindings {
        slots: [Binding::Default; 5],
    };

    /// Returns a copy of `self` with `exception` bound to `handler`.
    pub const fn bind(mut self, exception: Exception, handler: Handler)
        -> Self {
        self.slots[exception.binding_index()] = Binding::Application(handler);
        self
    }

    pub const fn get(&self, exception: Exception) -> Binding {
        self.slots[exception.binding_index()]
    }
}

/// A tagged view of one word of a vector table.
#[derive(Copy, Clone)]
pub enum Slot {
    /// Slot 0: the value loaded into `sp` at reset.
    StackTop(*const u32),
    /// Slot 1: where the processor starts executing.
    Reset(ResetHandler),
    /// An exception or interrupt vector.
    Handler(Handler),
    /// The vendor integrity word.
    Checksum(*const u32),
    /// Architecturally or vendor reserved; holds zero.
    Reserved,
}

impl Slot {
    /// The raw word this slot places in the image.
    pub fn word(self) -> usize {
        match self {
            Slot::StackTop(p) | Slot::Checksum(p) => p as usize,
            Slot::Reset(r) => r as usize,
            Slot::Handler(h) => h as usize,
            Slot::Reserved => 0,
        }
    }
}

/// Represents the ARMv6-M exception table.  This is the common table of vectors
/// used for handling interrupts and initializing the processor on -M
/// processors.
///
/// Note that processors will typically have a *two-part* vector table: first
/// come the exception vectors (described here), immediately followed by
/// vendor-specific interrupt vectors handled through the NVIC.  We model such
/// tables in two parts; see `lpc11xx::irq::VectorTable` for the whole thing.
///
/// Every field is one pointer wide, so `repr(C)` lays them out back to back
/// with no padding.
#[repr(C)]
pub struct ExceptionTable {
    /// ARMv6-M processors load their initial stack pointer from the first word
    /// of the vector table.  This will be the contents of `sp` on entry to
    /// `reset` below.
    ///
    /// Remember that ARM uses a "full descending" stack, so `sp` points to the
    /// most recently *used* cell of the stack.  Thus, the initial `sp` when the
    /// stack is empty often points just past the end of RAM.  We model it here
    /// as a `const` pointer to discourage such an invalid address from being
    /// dereferenced.
    pub initial_stack: *const u32,

    /// Reset vector.  At reset, the processor loads its stack pointer from
    /// `initial_stack` (above) and then enters this function using the ARM
    /// AAPCS C ABI.
    pub reset: ResetHandler,

    /// Non-Maskable Interrupt handler.
    pub nmi:          Handler,
    /// Hard Fault handler.
    pub hard_fault:   Handler,
    pub _reserved4:   Option<Handler>,
    pub _reserved5:   Option<Handler>,
    pub _reserved6:   Option<Handler>,
    /// Reserved by ARM.  NXP's boot ROM only starts an image from flash if
    /// words 0 through 7 sum to zero, so this holds the balancing value.
    pub checksum:     *const u32,
    pub _reserved8:   Option<Handler>,
    pub _reserved9:   Option<Handler>,
    pub _reserved10:  Option<Handler>,
    /// Supervisor Call (`SVC`) handler.
    pub sv_call:      Handler,
    pub _reserved12:  Option<Handler>,
    pub _reserved13:  Option<Handler>,
    /// PendSV handler.
    pub pend_sv:      Handler,
    /// SysTick handler.
    pub sys_tick:     Handler,
}

impl ExceptionTable {
    /// Resolves `bindings` into a table.  Reserved slots are zero.
    pub const fn new(initial_stack: *const u32,
                     reset: ResetHandler,
                     checksum: *const u32,
                     bindings: &ExceptionBindings) -> ExceptionTable {
        ExceptionTable {
            initial_stack,
            reset,

            nmi: bindings.get(Exception::Nmi).resolve(),
            hard_fault: bindings.get(Exception::HardFault).resolve(),
            _reserved4: None,
            _reserved5: None,
            _reserved6: None,
            checksum,
            _reserved8: None,
            _reserved9: None,
            _reserved10: None,
            sv_call: bindings.get(Exception::SvCall).resolve(),
            _reserved12: None,
            _reserved13: None,
            pend_sv: bindings.get(Exception::PendSv).resolve(),
            sys_tick: bindings.get(Exception::SysTick).resolve(),
        }
    }

    /// The handler the processor enters when `exception` is taken.
    pub fn handler(&self, exception: Exception) -> Handler {
        match exception {
            Exception::Nmi => self.nmi,
            Exception::HardFault => self.hard_fault,
            Exception::SvCall => self.sv_call,
            Exception::PendSv => self.pend_sv,
            Exception::SysTick => self.sys_tick,
        }
    }

    /// Reads slot `index`, or `None` past the architectural part.
    pub fn slot(&self, index: usize) -> Option<Slot> {
        let reserved = |h: Option<Handler>| match h {
            Some(h) => Slot::Handler(h),
            None => Slot::Reserved,
        };
        Some(match index {
            0 => Slot::StackTop(self.initial_stack),
            1 => Slot::Reset(self.reset),
            2 => Slot::Handler(self.nmi),
            3 => Slot::Handler(self.hard_fault),
            4 => reserved(self._reserved4),
            5 => reserved(self._reserved5),
            6 => reserved(self._reserved6),
            CHECKSUM_SLOT => Slot::Checksum(self.checksum),
            8 => reserved(self._reserved8),
            9 => reserved(self._reserved9),
            10 => reserved(self._reserved10),
            11 => Slot::Handler(self.sv_call),
            12 => reserved(self._reserved12),
            13 => reserved(self._reserved13),
            14 => Slot::Handler(self.pend_sv),
            15 => Slot::Handler(self.sys_tick),
            _ => return None,
        })
    }
}

/// Most programs will have at least one `ExceptionTable` `static`: the one that
/// gets deposited into ROM and read at processor startup.
///
/// To support a `static` `ExceptionTable`, the type must be `Sync`.  It is
/// *almost* `Sync` out of the box.  The exception: the pointers used for the
/// `initial_stack` and `checksum` items, which are never dereferenced.
unsafe impl Sync for ExceptionTable {}

const _: () = assert!(
    mem::size_of::<ExceptionTable>() == EXCEPTION_SLOTS * mem::size_of::<usize>());

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::offset_of;
    use core::ptr;

    extern "C" fn app_handler() {}

    unsafe extern "C" fn no_reset() -> ! {
        super::super::halt()
    }

    fn word_index(offset: usize) -> usize {
        offset / mem::size_of::<usize>()
    }

    #[test]
    fn fields_sit_at_hardware_slots() {
        assert_eq!(word_index(offset_of!(ExceptionTable, initial_stack)), 0);
        assert_eq!(word_index(offset_of!(ExceptionTable, reset)), 1);
        assert_eq!(word_index(offset_of!(ExceptionTable, nmi)),
                   Exception::Nmi.slot());
        assert_eq!(word_index(offset_of!(ExceptionTable, hard_fault)),
                   Exception::HardFault.slot());
        assert_eq!(word_index(offset_of!(ExceptionTable, checksum)),
                   CHECKSUM_SLOT);
        assert_eq!(word_index(offset_of!(ExceptionTable, sv_call)),
                   Exception::SvCall.slot());
        assert_eq!(word_index(offset_of!(ExceptionTable, pend_sv)),
                   Exception::PendSv.slot());
        assert_eq!(word_index(offset_of!(ExceptionTable, sys_tick)),
                   Exception::SysTick.slot());
    }

    #[test]
    fn unbound_exceptions_get_default_handler() {
        let bindings = ExceptionBindings::DEFAULT
            .bind(Exception::SysTick, app_handler);
        let table = ExceptionTable::new(ptr::null(), no_reset, ptr::null(),
                                        &bindings);

        assert!(!bindings.get(Exception::SysTick).is_default());
        assert_eq!(table.handler(Exception::SysTick) as usize,
                   app_handler as usize);
        for e in Exception::ALL.iter().filter(|&&e| e != Exception::SysTick) {
            assert!(bindings.get(*e).is_default());
            assert_eq!(table.handler(*e) as usize, default_handler as usize);
        }
    }

    #[test]
    fn slots_are_tagged() {
        let stack = 0x1000_1000 as *const u32;
        let sum = 0xDEAD_BEEF_usize as *const u32;
        let table = ExceptionTable::new(stack, no_reset, sum,
                                        &ExceptionBindings::DEFAULT);

        assert!(matches!(table.slot(0), Some(Slot::StackTop(p)) if p == stack));
        assert!(matches!(table.slot(1), Some(Slot::Reset(_))));
        assert!(matches!(table.slot(CHECKSUM_SLOT),
                         Some(Slot::Checksum(p)) if p == sum));
        for i in [4, 5, 6, 8, 9, 10, 12, 13] {
            assert!(matches!(table.slot(i), Some(Slot::Reserved)), "slot {}", i);
            assert_eq!(table.slot(i).map(Slot::word), Some(0));
        }
        assert!(table.slot(EXCEPTION_SLOTS).is_none());
    }
}
