use crate::cpu::Cpu;
use crate::memory::{Bus, MemoryChunk, Ram, Rom};

use std::cell::RefCell;
use std::rc::Rc;

pub const PROGRAM_START: u16 = 0x8000;
pub const IRQ_HANDLER: u16 = 0x9000;

/// A CPU with internal RAM and a 32 KiB ROM holding `program` at $8000,
/// reset and ready to run it. Unused ROM is filled with NOP.
pub struct Fixture {
    pub cpu: Cpu,
    pub ram: Rc<RefCell<Ram>>,
}

impl Fixture {
    pub fn new(program: &[u8]) -> Fixture {
        let mut rom = vec![0xEA; 0x8000];
        rom[..program.len()].copy_from_slice(program);
        rom[0x7FFC..].copy_from_slice(&[
            PROGRAM_START as u8,
            (PROGRAM_START >> 8) as u8,
            IRQ_HANDLER as u8,
            (IRQ_HANDLER >> 8) as u8,
        ]);

        let ram = Rc::new(RefCell::new(Ram::default()));
        let chunks: Vec<Box<dyn MemoryChunk>> = vec![
            Box::new(ram.clone()),
            Box::new(Rom::new(PROGRAM_START, rom)),
        ];
        let mut cpu = Cpu::new(Bus::with_chunks(chunks));
        cpu.reset().unwrap();
        Fixture { cpu, ram }
    }

    pub fn poke(&self, address: u16, value: u8) {
        self.ram.borrow_mut().write(address as usize, value);
    }

    pub fn peek(&self, address: u16) -> u8 {
        self.ram.borrow().read(address as usize)
    }

    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.cpu.step().unwrap();
        }
    }
}
