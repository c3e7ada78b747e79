//! Per-step diagnostics and the nestest.log line format.
//!
//! A line looks like
//!
//! ```text
//! C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD PPU:  0, 21 CYC:7
//! ```
//!
//! The PPU column is derived from the cycle count (three dots per CPU cycle,
//! rendering off), so it only matches a reference log while nothing stalls
//! the CPU. Use [`strip_ppu_column`] to compare without it.

use super::address_mode::{AddressMode, Operand};
use super::opcode::Operation;

use itertools::Itertools;
use log::trace;

const DOTS_PER_SCANLINE: u64 = 341;
const SCANLINES_PER_FRAME: u64 = 262;

/// Register state at the moment an instruction was fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    pub accumulator: u8,
    pub x_index: u8,
    pub y_index: u8,
    pub status: u8,
    pub stack_pointer: u8,
    pub cycle: u64,
}

/// Everything needed to describe one executed instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepTrace {
    pub program_counter: u16,
    pub operation: Operation,
    pub parameter: u16,
    pub operand: Operand,
    /// Byte at the effective address before the instruction ran. `None` for
    /// jumps and operands without an address.
    pub memory_value: Option<u8>,
    pub registers: Registers,
    /// Cycles this instruction took, penalties included.
    pub cycles: u8,
}

impl StepTrace {
    /// The instruction as it appears in program memory.
    pub fn bytes(&self) -> Vec<u8> {
        let (low, high) = AddressMode::split_parameter(self.parameter);
        let mut bytes = vec![self.operation.opcode, low, high];
        bytes.truncate(1 + self.operation.mode.parameter_size() as usize);
        bytes
    }
}

/// Called by [`Cpu::step`](super::Cpu::step) after every instruction.
pub trait Tracer {
    fn on_step(&mut self, step: &StepTrace);
}

impl<F> Tracer for F
where
    F: FnMut(&StepTrace),
{
    fn on_step(&mut self, step: &StepTrace) {
        self(step)
    }
}

/// Sends every step to the `log` facade at trace level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn on_step(&mut self, step: &StepTrace) {
        trace!("{}", format_nestest_line(step));
    }
}

fn value_suffix(value: Option<u8>) -> String {
    value.map(|v| format!(" = {:02X}", v)).unwrap_or_default()
}

/// Assembly text in nestest's notation, including resolved addresses and the
/// value found there.
pub fn disassemble(step: &StepTrace) -> String {
    use AddressMode::*;

    let parameter = step.parameter;
    let address = step.operand.address().unwrap_or_default();
    let value = value_suffix(step.memory_value);
    let registers = &step.registers;

    let operand = match step.operation.mode {
        Implicit => String::new(),
        Accumulator => "A".to_string(),
        Immediate => format!("#${:02X}", parameter),
        ZeroPage => format!("${:02X}{}", parameter, value),
        ZeroPageX => format!("${:02X},X @ {:02X}{}", parameter, address, value),
        ZeroPageY => format!("${:02X},Y @ {:02X}{}", parameter, address, value),
        Absolute if step.operation.instruction.is_jump() => format!("${:04X}", parameter),
        Absolute => format!("${:04X}{}", parameter, value),
        AbsoluteX => format!("${:04X},X @ {:04X}{}", parameter, address, value),
        AbsoluteY => format!("${:04X},Y @ {:04X}{}", parameter, address, value),
        Indirect => format!("(${:04X}) = {:04X}", parameter, address),
        IndexedIndirectX => format!(
            "(${:02X},X) @ {:02X} = {:04X}{}",
            parameter,
            (parameter as u8).wrapping_add(registers.x_index),
            address,
            value
        ),
        IndexedIndirectY => format!(
            "(${:02X}),Y = {:04X} @ {:04X}{}",
            parameter,
            address.wrapping_sub(registers.y_index as u16),
            address,
            value
        ),
        Relative => format!("${:04X}", address),
    };

    match step.operand {
        Operand::Implied => format!("{:?}", step.operation.instruction),
        _ => format!("{:?} {}", step.operation.instruction, operand),
    }
}

/// PPU (scanline, dot) reached after `cycle` CPU cycles from power-on.
pub fn ppu_position(cycle: u64) -> (u64, u64) {
    let dots = cycle * 3;
    ((dots / DOTS_PER_SCANLINE) % SCANLINES_PER_FRAME, dots % DOTS_PER_SCANLINE)
}

pub fn format_nestest_line(step: &StepTrace) -> String {
    let bytes = step.bytes().iter().map(|b| format!("{:02X}", b)).join(" ");
    let r = &step.registers;
    let registers = [
        format!("A:{:02X}", r.accumulator),
        format!("X:{:02X}", r.x_index),
        format!("Y:{:02X}", r.y_index),
        format!("P:{:02X}", r.status),
        format!("SP:{:02X}", r.stack_pointer),
    ]
    .iter()
    .join(" ");
    let (scanline, dot) = ppu_position(r.cycle);

    format!(
        "{:04X}  {:<10}{:<32}{} PPU:{:>3},{:>3} CYC:{}",
        step.program_counter,
        bytes,
        disassemble(step),
        registers,
        scanline,
        dot,
        r.cycle
    )
}

/// Removes the ` PPU:sss,ddd` column and trailing whitespace from a log line.
pub fn strip_ppu_column(line: &str) -> String {
    let line = line.trim_end();
    if let Some(start) = line.find(" PPU:") {
        if let Some(end) = line[start + 1..].find(" CYC:") {
            return format!("{}{}", &line[..start], &line[start + 1 + end..]);
        }
    }
    line.to_string()
}
