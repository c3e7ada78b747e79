pub mod address_mode;
pub mod instruction;
pub mod opcode;
pub mod trace;

use crate::error::{Error, Result};
use crate::memory::Bus;
use crate::registers::FlagsRegister;
use address_mode::{Index, Operand};
use trace::{Registers, StepTrace, Tracer};

use log::debug;

pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;
pub const STACK_BASE: u16 = 0x0100;
pub const POWER_ON_STACK_POINTER: u8 = 0xFD;
pub const POWER_ON_STATUS: u8 = 0x24;
pub const RESET_CYCLES: u64 = 7;

pub struct Cpu {
    pub accumulator: u8,
    pub x_index: u8,
    pub y_index: u8,
    pub status: FlagsRegister,
    pub program_counter: u16,
    pub stack_pointer: u8,
    pub cycle: u64,
    pub bus: Bus,
    // Taken-branch cycles for the step in progress.
    extra_cycles: u8,
    tracer: Option<Box<dyn Tracer>>,
}

impl Cpu {
    /// Builds a CPU around `bus` without touching it. Call [`reset`](Self::reset)
    /// or set `program_counter` before stepping.
    pub fn new(bus: Bus) -> Cpu {
        let mut status = FlagsRegister::new();
        status.load(POWER_ON_STATUS);
        Cpu {
            accumulator: 0,
            x_index: 0,
            y_index: 0,
            status,
            program_counter: 0,
            stack_pointer: POWER_ON_STACK_POINTER,
            cycle: 0,
            bus,
            extra_cycles: 0,
            tracer: None,
        }
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub fn reset(&mut self) -> Result<()> {
        self.program_counter = self.read_16(RESET_VECTOR)?;
        self.stack_pointer = POWER_ON_STACK_POINTER;
        self.status.load(POWER_ON_STATUS);
        self.cycle += RESET_CYCLES;
        debug!("CPU reset, entry point {:#06x}", self.program_counter);
        Ok(())
    }

    pub fn set_tracer<T: Tracer + 'static>(&mut self, tracer: T) {
        self.tracer = Some(Box::new(tracer));
    }

    pub fn clear_tracer(&mut self) {
        self.tracer = None;
    }

    pub fn registers(&self) -> Registers {
        Registers {
            accumulator: self.accumulator,
            x_index: self.x_index,
            y_index: self.y_index,
            status: self.status.to_byte(),
            stack_pointer: self.stack_pointer,
            cycle: self.cycle,
        }
    }

    /// Executes one instruction.
    ///
    /// On error nothing after the failing bus access happens: an unknown
    /// opcode leaves the program counter on the opcode and no cycles are
    /// counted.
    pub fn step(&mut self) -> Result<StepTrace> {
        let registers = self.registers();
        let address = self.program_counter;

        let opcode = self.read_8(address)?;
        let operation = opcode::lookup(opcode).ok_or(Error::UnknownOpcode { opcode, address })?;

        let parameter = match operation.mode.parameter_size() {
            0 => 0,
            1 => self.read_8(address.wrapping_add(1))? as u16,
            _ => self.read_16(address.wrapping_add(1))?,
        };
        self.program_counter = address.wrapping_add(1 + operation.mode.parameter_size() as u16);

        let index = Index { x: self.x_index, y: self.y_index, program_counter: self.program_counter };
        let bus = &mut self.bus;
        let operand = operation.mode.resolve_with(index, parameter, |pointer| bus.read(pointer))?;
        let memory_value = match operand {
            Operand::Memory { address, .. } if !operation.instruction.is_jump() => self.bus.peek(address).ok(),
            _ => None,
        };

        self.extra_cycles = 0;
        self.execute_instruction(&operation, operand)?;

        let mut cycles = operation.cycles + self.extra_cycles;
        if operation.page_penalty && operand.page_crossed() {
            cycles += 1;
        }
        self.cycle += cycles as u64;

        let trace = StepTrace {
            program_counter: address,
            operation,
            parameter,
            operand,
            memory_value,
            registers,
            cycles,
        };
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.on_step(&trace);
        }
        Ok(trace)
    }

    fn read_8(&mut self, address: u16) -> Result<u8> {
        self.bus.read(address)
    }

    fn read_16(&mut self, address: u16) -> Result<u16> {
        self.bus.read_16(address)
    }

    fn write_8(&mut self, address: u16, value: u8) -> Result<()> {
        self.bus.write(address, value)
    }

    fn stack_push_8(&mut self, value: u8) -> Result<()> {
        self.write_8(STACK_BASE + self.stack_pointer as u16, value)?;
        self.stack_pointer = self.stack_pointer.wrapping_sub(1);
        Ok(())
    }

    fn stack_push_16(&mut self, value: u16) -> Result<()> {
        self.stack_push_8((value >> 8) as u8)?;
        self.stack_push_8((value & 0xFF) as u8)
    }

    fn stack_pop_8(&mut self) -> Result<u8> {
        self.stack_pointer = self.stack_pointer.wrapping_add(1);
        self.read_8(STACK_BASE + self.stack_pointer as u16)
    }

    fn stack_pop_16(&mut self) -> Result<u16> {
        let low = self.stack_pop_8()? as u16;
        let high = self.stack_pop_8()? as u16;
        Ok(low | (high << 8))
    }
}
