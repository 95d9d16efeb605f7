//! Interrupt vectors for the LPC11xx.
//!
//! This module adapts the architectural exception table in `arm_m::exc` to the
//! LPC11xx line of SoCs.  It provides:
//! - `enum Interrupt`, naming the vendor interrupt sources.
//! - `struct InterruptTable`, the vendor-specific part of the vector table.
//! - `struct VectorTable`, both parts together, as the hardware reads them.
//! - `struct Bindings`, the build-time registry an application fills in to
//!   say which vectors it handles.

use core::mem;

use crate::arm_m::exc::{
    self, Binding, Exception, ExceptionBindings, ExceptionTable, Handler,
    ResetHandler, Slot,
};

/// Number of vendor interrupt slots following the exception table.
pub const INTERRUPT_SLOTS: usize = 32;

/// Total number of slots in the LPC11xx vector table.
pub const VECTOR_SLOTS: usize = exc::EXCEPTION_SLOTS + INTERRUPT_SLOTS;

/// Enumeration of the LPC11xx interrupts.  The discriminant is the NVIC
/// interrupt number; the vector lives at slot `16 + n`.
///
/// Numbers 22, 23 and 27 are reserved, as is 13 except on parts with C_CAN.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Interrupt {
    /// Start logic wakeup, PIO0_0.
    StartLogic0 = 0,
    StartLogic1 = 1,
    StartLogic2 = 2,
    StartLogic3 = 3,
    StartLogic4 = 4,
    StartLogic5 = 5,
    StartLogic6 = 6,
    StartLogic7 = 7,
    StartLogic8 = 8,
    StartLogic9 = 9,
    StartLogic10 = 10,
    /// Start logic wakeup, PIO0_11.
    StartLogic11 = 11,
    /// Start logic wakeup, PIO1_0.
    StartLogic12 = 12,
    /// C_CAN controller (LPC11Cxx only).
    #[cfg(feature = "soc-family-lpc11cxx")]
    Can = 13,
    Ssp1 = 14,
    I2c0 = 15,
    Ct16b0 = 16,
    Ct16b1 = 17,
    Ct32b0 = 18,
    Ct32b1 = 19,
    Ssp0 = 20,
    Uart0 = 21,
    Adc = 24,
    Wdt = 25,
    /// Brown-out detector.
    Bod = 26,
    /// GPIO port 3.
    Pio3 = 28,
    Pio2 = 29,
    Pio1 = 30,
    Pio0 = 31,
}

impl Interrupt {
    /// Every interrupt this part implements, in vector order.
    pub const ALL: &'static [Interrupt] = &[
        Interrupt::StartLogic0,
        Interrupt::StartLogic1,
        Interrupt::StartLogic2,
        Interrupt::StartLogic3,
        Interrupt::StartLogic4,
        Interrupt::StartLogic5,
        Interrupt::StartLogic6,
        Interrupt::StartLogic7,
        Interrupt::StartLogic8,
        Interrupt::StartLogic9,
        Interrupt::StartLogic10,
        Interrupt::StartLogic11,
        Interrupt::StartLogic12,
        #[cfg(feature = "soc-family-lpc11cxx")]
        Interrupt::Can,
        Interrupt::Ssp1,
        Interrupt::I2c0,
        Interrupt::Ct16b0,
        Interrupt::Ct16b1,
        Interrupt::Ct32b0,
        Interrupt::Ct32b1,
        Interrupt::Ssp0,
        Interrupt::Uart0,
        Interrupt::Adc,
        Interrupt::Wdt,
        Interrupt::Bod,
        Interrupt::Pio3,
        Interrupt::Pio2,
        Interrupt::Pio1,
        Interrupt::Pio0,
    ];

    /// The NVIC interrupt number.
    pub const fn number(self) -> usize {
        self as usize
    }

    /// Word index of this interrupt's vector in the full table.
    pub const fn slot(self) -> usize {
        exc::EXCEPTION_SLOTS + self.number()
    }
}

/// Whether NVIC interrupt number `n` is reserved on this part.
pub const fn is_reserved(n: usize) -> bool {
    match n {
        22 | 23 | 27 => true,
        13 => !cfg!(feature = "soc-family-lpc11cxx"),
        _ => n >= INTERRUPT_SLOTS,
    }
}

/// The LPC11xx's vendor-specific (NVIC) vector table.  This is separate from
/// the ARMv6-M Exception Table, and must be placed immediately after it in ROM.
///
/// Reserved entries hold `None`, which the null pointer optimization stores as
/// zero.
#[repr(C)]
pub struct InterruptTable {
    vectors: [Option<Handler>; INTERRUPT_SLOTS],
}

impl InterruptTable {
    /// Resolves `bindings` into a table.
    pub const fn new(bindings: &[Binding; INTERRUPT_SLOTS]) -> InterruptTable {
        let mut vectors: [Option<Handler>; INTERRUPT_SLOTS] =
            [None; INTERRUPT_SLOTS];
        let mut n = 0;
        while n < INTERRUPT_SLOTS {
            if !is_reserved(n) {
                vectors[n] = Some(bindings[n].resolve());
            }
            n += 1;
        }
        InterruptTable { vectors }
    }

    /// The handler the processor enters when `irq` is taken.
    pub fn handler(&self, irq: Interrupt) -> Handler {
        match self.vectors[irq.number()] {
            Some(h) => h,
            // Implemented interrupts are always populated by `new`.
            None => exc::default_handler,
        }
    }

    /// Reads the vector for NVIC interrupt number `n`.
    pub fn slot(&self, n: usize) -> Option<Slot> {
        self.vectors.get(n).map(|v| match *v {
            Some(h) => Slot::Handler(h),
            None => Slot::Reserved,
        })
    }
}

/// Build-time registry of application handlers.  Start from `DEFAULT` and bind
/// what you handle; everything else goes to `exc::default_handler`.
///
/// ```ignore
/// static BINDINGS: Bindings = Bindings::DEFAULT
///     .exception(Exception::SysTick, tick)
///     .interrupt(Interrupt::Uart0, uart0);
/// ```
#[derive(Copy, Clone)]
pub struct Bindings {
    exceptions: ExceptionBindings,
    interrupts: [Binding; INTERRUPT_SLOTS],
}

impl Bindings {
    pub const DEFAULT: Bindings = Bindings {
        exceptions: ExceptionBindings::DEFAULT,
        interrupts: [Binding::Default; INTERRUPT_SLOTS],
    };

    /// Returns a copy of `self` with `exception` bound to `handler`.
    pub const fn exception(mut self, exception: Exception, handler: Handler)
        -> Self {
        self.exceptions = self.exceptions.bind(exception, handler);
        self
    }

    /// Returns a copy of `self` with `irq` bound to `handler`.
    pub const fn interrupt(mut self, irq: Interrupt, handler: Handler)
        -> Self {
        self.interrupts[irq.number()] = Binding::Application(handler);
        self
    }

    pub const fn exception_binding(&self, exception: Exception) -> Binding {
        self.exceptions.get(exception)
    }

    pub const fn interrupt_binding(&self, irq: Interrupt) -> Binding {
        self.interrupts[irq.number()]
    }
}

/// The complete LPC11xx vector table: 16 architectural slots, then 32 vendor
/// slots.  Put one of these in `.isr_vector` at the start of flash:
///
/// ```ignore
/// #[no_mangle]
/// #[link_section = ".isr_vector"]
/// #[used]
/// pub static ISR_VECTORS: VectorTable = VectorTable::new(
///     unsafe { addr_of!(linker::_stack) },
///     _reset_vector,
///     unsafe { addr_of!(linker::__checksum__) },
///     &BINDINGS);
/// ```
#[repr(C)]
pub struct VectorTable {
    pub exceptions: ExceptionTable,
    pub interrupts: InterruptTable,
}

impl VectorTable {
    pub const fn new(initial_stack: *const u32,
                     reset: ResetHandler,
                     checksum: *const u32,
                     bindings: &Bindings) -> VectorTable {
        VectorTable {
            exceptions: ExceptionTable::new(initial_stack, reset, checksum,
                                            &bindings.exceptions),
            interrupts: InterruptTable::new(&bindings.interrupts),
        }
    }

    /// Reads slot `index` of the table, or `None` past the end.
    pub fn slot(&self, index: usize) -> Option<Slot> {
        if index < exc::EXCEPTION_SLOTS {
            self.exceptions.slot(index)
        } else {
            self.interrupts.slot(index - exc::EXCEPTION_SLOTS)
        }
    }

    /// Where the processor goes when `vector` is latched.
    pub fn handler(&self, vector: Vector) -> Handler {
        match vector {
            Vector::Exception(e) => self.exceptions.handler(e),
            Vector::Interrupt(i) => self.interrupts.handler(i),
        }
    }
}

/// Either kind of bindable vector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Vector {
    Exception(Exception),
    Interrupt(Interrupt),
}

impl Vector {
    pub const fn slot(self) -> usize {
        match self {
            Vector::Exception(e) => e.slot(),
            Vector::Interrupt(i) => i.slot(),
        }
    }
}

impl From<Exception> for Vector {
    fn from(e: Exception) -> Vector {
        Vector::Exception(e)
    }
}

impl From<Interrupt> for Vector {
    fn from(i: Interrupt) -> Vector {
        Vector::Interrupt(i)
    }
}

const _: () = assert!(
    mem::size_of::<VectorTable>() == VECTOR_SLOTS * mem::size_of::<usize>());
