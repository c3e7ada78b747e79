use super::Cpu;
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Implicit,
    Accumulator,
    Immediate,
    ZeroPage, ZeroPageX, ZeroPageY,
    Absolute, AbsoluteX, AbsoluteY,
    Indirect, IndexedIndirectX, IndexedIndirectY,
    Relative,
}

/// What an instruction operates on once its addressing mode is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Implied,
    Accumulator,
    Immediate(u8),
    Memory { address: u16, page_crossed: bool },
}

impl Operand {
    pub fn address(&self) -> Option<u16> {
        match self {
            Operand::Memory { address, .. } => Some(*address),
            _ => None,
        }
    }

    /// True when indexing moved the address into another page, or a branch
    /// target lies in a different page than the next instruction.
    pub fn page_crossed(&self) -> bool {
        matches!(self, Operand::Memory { page_crossed: true, .. })
    }
}

/// Register values an addressing mode depends on.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Index {
    pub x: u8,
    pub y: u8,
    pub program_counter: u16,
}

fn crossing_page(address_1: u16, address_2: u16) -> bool {
    address_1 & 0xFF00 != address_2 & 0xFF00
}

fn memory(address: u16) -> Operand {
    Operand::Memory { address, page_crossed: false }
}

fn indexed(base: u16, index: u8) -> Operand {
    let address = base.wrapping_add(index as u16);
    Operand::Memory { address, page_crossed: crossing_page(base, address) }
}

impl AddressMode {
    /// Bytes following the opcode in program memory.
    pub fn parameter_size(self) -> u8 {
        use AddressMode::*;
        match self {
            Implicit | Accumulator => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndexedIndirectX | IndexedIndirectY | Relative => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }

    /// Splits a two-byte parameter into its (low, high) bytes, in the order
    /// they appear in program memory.
    pub fn split_parameter(parameter: u16) -> (u8, u8) {
        ((parameter & 0xFF) as u8, (parameter >> 8) as u8)
    }

    /// Resolves `parameter` against the current registers and memory.
    ///
    /// Nothing is mutated: pointers are fetched with [`Bus::peek`](crate::memory::Bus::peek),
    /// so this can be called again for diagnostics without disturbing emulated
    /// state. `Relative` is taken from the program counter as it stands, which
    /// during a step is the address of the next instruction.
    pub fn resolve(self, cpu: &Cpu, parameter: u16) -> Result<Operand> {
        let index = Index { x: cpu.x_index, y: cpu.y_index, program_counter: cpu.program_counter };
        self.resolve_with(index, parameter, |address| cpu.bus.peek(address))
    }

    /// Resolution with pointer bytes taken from `fetch`. A step passes a real
    /// bus read here so pointers in side-effecting chunks behave as on hardware.
    pub(crate) fn resolve_with<F>(self, index: Index, parameter: u16, mut fetch: F) -> Result<Operand>
    where
        F: FnMut(u16) -> Result<u8>,
    {
        use AddressMode::*;
        let operand = match self {
            Implicit => Operand::Implied,
            Accumulator => Operand::Accumulator,
            Immediate => Operand::Immediate(parameter as u8),
            ZeroPage => memory(parameter & 0x00FF),
            ZeroPageX => memory((parameter as u8).wrapping_add(index.x) as u16),
            ZeroPageY => memory((parameter as u8).wrapping_add(index.y) as u16),
            Absolute => memory(parameter),
            AbsoluteX => indexed(parameter, index.x),
            AbsoluteY => indexed(parameter, index.y),
            Indirect => {
                // The high byte is fetched without carrying into the next page: JMP ($10FF) reads $10FF and $1000.
                let byte_low = fetch(parameter)? as u16;
                let byte_high = fetch((parameter & 0xFF00) | (parameter.wrapping_add(1) & 0x00FF))? as u16;
                memory(byte_low | (byte_high << 8))
            }
            IndexedIndirectX => {
                let pointer = (parameter as u8).wrapping_add(index.x);
                memory(zero_page_word(&mut fetch, pointer)?)
            }
            IndexedIndirectY => {
                let base = zero_page_word(&mut fetch, parameter as u8)?;
                indexed(base, index.y)
            }
            Relative => {
                let offset = parameter as u8 as i8;
                let target = index.program_counter.wrapping_add(offset as u16);
                Operand::Memory { address: target, page_crossed: crossing_page(index.program_counter, target) }
            }
        };
        Ok(operand)
    }

    /// The memory address the mode designates. Fails for modes that operate on
    /// a register or a literal.
    pub fn effective_address(self, cpu: &Cpu, parameter: u16) -> Result<u16> {
        self.resolve(cpu, parameter)?
            .address()
            .ok_or(Error::NoEffectiveAddress(self))
    }
}

// Pointer bytes both come from the zero page; $FF wraps to $00.
fn zero_page_word<F>(fetch: &mut F, pointer: u8) -> Result<u16>
where
    F: FnMut(u16) -> Result<u8>,
{
    let low = fetch(pointer as u16)? as u16;
    let high = fetch(pointer.wrapping_add(1) as u16)? as u16;
    Ok(low | (high << 8))
}
