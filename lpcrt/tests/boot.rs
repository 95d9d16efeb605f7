//! Runs the reset sequence over a simulated address space, so that the exact
//! marker addresses a linker would hand out can be used.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use lpcrt::arm_m::startup::{
    self, Application, Layout, Machine, Region, HOOK_STRIDE, WORD,
};

const GUARD: u32 = 0x5A5A_5A5A;
const GARBAGE: u32 = 0xDEAD_BEEF;

const COUNT: usize = 0x4001;
const FINI_A: usize = 0x4011;
const FINI_B: usize = 0x4021;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Event {
    SystemInit,
    Hook(usize),
    Main,
    Idle,
}

/// Payload thrown out of the Halt Loop so the test can get control back.
struct Halted;

#[derive(Default)]
struct World {
    memory: BTreeMap<usize, u32>,
    writes: Vec<usize>,
    events: Vec<Event>,
    counter: u32,
    /// (bss, data, counter) as seen on entry to main.
    at_main: Option<(Vec<u32>, Vec<u32>, u32)>,
    /// data as seen by system_init.
    at_system_init: Option<Vec<u32>>,
}

impl World {
    fn words(&self, region: Region) -> Vec<u32> {
        (region.start..region.end)
            .step_by(WORD)
            .map(|a| self.memory.get(&a).copied().unwrap_or(0))
            .collect()
    }
}

struct Sim {
    world: Rc<RefCell<World>>,
}

impl Machine for Sim {
    unsafe fn store(&mut self, addr: usize, word: u32) {
        let mut w = self.world.borrow_mut();
        w.memory.insert(addr, word);
        w.writes.push(addr);
    }

    unsafe fn load(&self, addr: usize) -> u32 {
        *self.world.borrow().memory.get(&addr).expect("read of unmapped word")
    }

    unsafe fn load_hook(&self, addr: usize) -> usize {
        self.load(addr) as usize
    }

    unsafe fn call(&mut self, hook: usize) {
        let mut w = self.world.borrow_mut();
        w.events.push(Event::Hook(hook));
        match hook {
            COUNT => w.counter += 1,
            FINI_A | FINI_B => {}
            other => panic!("jump to unknown code at {:#x}", other),
        }
    }

    fn idle(&mut self) {
        self.world.borrow_mut().events.push(Event::Idle);
        panic::panic_any(Halted)
    }
}

struct Firmware {
    world: Rc<RefCell<World>>,
    layout: Layout,
}

impl Application for Firmware {
    fn system_init(&mut self) {
        let mut w = self.world.borrow_mut();
        w.events.push(Event::SystemInit);
        let data = w.words(self.layout.data);
        w.at_system_init = Some(data);
    }

    fn main(&mut self) {
        let mut w = self.world.borrow_mut();
        w.events.push(Event::Main);
        let seen = (w.words(self.layout.bss),
                    w.words(self.layout.data),
                    w.counter);
        w.at_main = Some(seen);
    }
}

fn layout() -> Layout {
    Layout {
        bss: Region::new(0x1000, 0x1010),
        data: Region::new(0x2000, 0x2008),
        data_load: 0x9000,
        init_array: Region::new(0x3000, 0x3000 + 2 * HOOK_STRIDE),
        fini_array: Region::new(0x3100, 0x3100 + 2 * HOOK_STRIDE),
    }
}

fn world(layout: &Layout) -> World {
    let mut w = World::default();
    for a in (0x0FF0..0x1020).step_by(WORD) {
        w.memory.insert(a, if layout.bss.contains(a) { GARBAGE } else { GUARD });
    }
    for a in (0x1FF0..0x2010).step_by(WORD) {
        w.memory.insert(a, if layout.data.contains(a) { GARBAGE } else { GUARD });
    }
    w.memory.insert(0x9000, 0xAAAA_AAAA);
    w.memory.insert(0x9004, 0xBBBB_BBBB);
    w.memory.insert(0x3000, COUNT as u32);
    w.memory.insert(0x3000 + HOOK_STRIDE, COUNT as u32);
    w.memory.insert(0x3100, FINI_A as u32);
    w.memory.insert(0x3100 + HOOK_STRIDE, FINI_B as u32);
    w
}

fn boot() -> World {
    let layout = layout();
    let world = Rc::new(RefCell::new(world(&layout)));
    let mut sim = Sim { world: world.clone() };
    let mut fw = Firmware { world: world.clone(), layout };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        unsafe { startup::start(&mut sim, &layout, &mut fw); }
    }));
    let payload = outcome.expect_err("start returned");
    assert!(payload.is::<Halted>(), "sequence failed before halting");

    drop(sim);
    drop(fw);
    Rc::try_unwrap(world).ok().expect("world still shared").into_inner()
}

#[test]
fn memory_image_and_constructors_are_ready_at_main() {
    let w = boot();
    let (bss, data, counter) = w.at_main.expect("main never ran");
    assert_eq!(bss, vec![0, 0, 0, 0]);
    assert_eq!(data, vec![0xAAAA_AAAA, 0xBBBB_BBBB]);
    assert_eq!(counter, 2);
}

#[test]
fn sequence_runs_in_order_and_ends_in_halt() {
    let w = boot();
    assert_eq!(w.events, vec![
        Event::SystemInit,
        Event::Hook(COUNT),
        Event::Hook(COUNT),
        Event::Main,
        Event::Hook(FINI_A),
        Event::Hook(FINI_B),
        Event::Idle,
    ]);
}

#[test]
fn system_init_sees_restored_data() {
    let w = boot();
    assert_eq!(w.at_system_init, Some(vec![0xAAAA_AAAA, 0xBBBB_BBBB]));
}

#[test]
fn only_bss_and_data_are_written() {
    let w = boot();
    let l = layout();
    assert!(!w.writes.is_empty());
    for a in &w.writes {
        assert!(l.bss.contains(*a) || l.data.contains(*a), "stray write to {:#x}", a);
    }
    assert_eq!(w.memory[&0x0FFC], GUARD);
    assert_eq!(w.memory[&0x1010], GUARD);
    assert_eq!(w.memory[&0x1FFC], GUARD);
    assert_eq!(w.memory[&0x2008], GUARD);
    assert_eq!(w.memory[&0x9000], 0xAAAA_AAAA);
    assert_eq!(w.memory[&0x9004], 0xBBBB_BBBB);
}

#[test]
fn bss_is_cleared_before_data_is_restored() {
    let w = boot();
    let first_data = w.writes.iter().position(|a| layout().data.contains(*a));
    let last_bss = w.writes.iter().rposition(|a| layout().bss.contains(*a));
    assert!(last_bss < first_data);
    assert_eq!(w.writes.len(), 6);
}

#[test]
fn empty_lists_skip_straight_through() {
    let mut layout = layout();
    layout.init_array = Region::new(0x3000, 0x3000);
    layout.fini_array = Region::new(0x3100, 0x3100);

    let world = Rc::new(RefCell::new(world(&layout)));
    let mut sim = Sim { world: world.clone() };
    let mut fw = Firmware { world: world.clone(), layout };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        unsafe { startup::start(&mut sim, &layout, &mut fw); }
    }));
    assert!(outcome.is_err());

    let w = world.borrow();
    assert_eq!(w.events, vec![Event::SystemInit, Event::Main, Event::Idle]);
    assert_eq!(w.counter, 0);
}
