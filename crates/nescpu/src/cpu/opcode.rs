use super::address_mode::AddressMode;
use super::instruction::Instruction;

/// One decodable opcode: what it does, how it finds its operand, and what it costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operation {
    pub opcode: u8,
    pub instruction: Instruction,
    pub mode: AddressMode,
    pub cycles: u8,
    /// One extra cycle when indexing crosses a page.
    pub page_penalty: bool,
}

/// Decodes an opcode byte. Unofficial opcodes are not decoded.
pub fn lookup(opcode: u8) -> Option<Operation> {
    use AddressMode::*;
    use Instruction::*;

    let (instruction, mode, cycles, page_penalty) = match opcode {
        0x69 => (ADC, Immediate, 2, false),
        0x65 => (ADC, ZeroPage, 3, false),
        0x75 => (ADC, ZeroPageX, 4, false),
        0x6D => (ADC, Absolute, 4, false),
        0x7D => (ADC, AbsoluteX, 4, true),
        0x79 => (ADC, AbsoluteY, 4, true),
        0x61 => (ADC, IndexedIndirectX, 6, false),
        0x71 => (ADC, IndexedIndirectY, 5, true),

        0x29 => (AND, Immediate, 2, false),
        0x25 => (AND, ZeroPage, 3, false),
        0x35 => (AND, ZeroPageX, 4, false),
        0x2D => (AND, Absolute, 4, false),
        0x3D => (AND, AbsoluteX, 4, true),
        0x39 => (AND, AbsoluteY, 4, true),
        0x21 => (AND, IndexedIndirectX, 6, false),
        0x31 => (AND, IndexedIndirectY, 5, true),

        0x0A => (ASL, Accumulator, 2, false),
        0x06 => (ASL, ZeroPage, 5, false),
        0x16 => (ASL, ZeroPageX, 6, false),
        0x0E => (ASL, Absolute, 6, false),
        0x1E => (ASL, AbsoluteX, 7, false),

        0x90 => (BCC, Relative, 2, false),
        0xB0 => (BCS, Relative, 2, false),
        0xF0 => (BEQ, Relative, 2, false),
        0x30 => (BMI, Relative, 2, false),
        0xD0 => (BNE, Relative, 2, false),
        0x10 => (BPL, Relative, 2, false),
        0x50 => (BVC, Relative, 2, false),
        0x70 => (BVS, Relative, 2, false),

        0x24 => (BIT, ZeroPage, 3, false),
        0x2C => (BIT, Absolute, 4, false),

        0x00 => (BRK, Implicit, 7, false),

        0x18 => (CLC, Implicit, 2, false),
        0xD8 => (CLD, Implicit, 2, false),
        0x58 => (CLI, Implicit, 2, false),
        0xB8 => (CLV, Implicit, 2, false),

        0xC9 => (CMP, Immediate, 2, false),
        0xC5 => (CMP, ZeroPage, 3, false),
        0xD5 => (CMP, ZeroPageX, 4, false),
        0xCD => (CMP, Absolute, 4, false),
        0xDD => (CMP, AbsoluteX, 4, true),
        0xD9 => (CMP, AbsoluteY, 4, true),
        0xC1 => (CMP, IndexedIndirectX, 6, false),
        0xD1 => (CMP, IndexedIndirectY, 5, true),

        0xE0 => (CPX, Immediate, 2, false),
        0xE4 => (CPX, ZeroPage, 3, false),
        0xEC => (CPX, Absolute, 4, false),

        0xC0 => (CPY, Immediate, 2, false),
        0xC4 => (CPY, ZeroPage, 3, false),
        0xCC => (CPY, Absolute, 4, false),

        0xC6 => (DEC, ZeroPage, 5, false),
        0xD6 => (DEC, ZeroPageX, 6, false),
        0xCE => (DEC, Absolute, 6, false),
        0xDE => (DEC, AbsoluteX, 7, false),

        0xCA => (DEX, Implicit, 2, false),
        0x88 => (DEY, Implicit, 2, false),

        0x49 => (EOR, Immediate, 2, false),
        0x45 => (EOR, ZeroPage, 3, false),
        0x55 => (EOR, ZeroPageX, 4, false),
        0x4D => (EOR, Absolute, 4, false),
        0x5D => (EOR, AbsoluteX, 4, true),
        0x59 => (EOR, AbsoluteY, 4, true),
        0x41 => (EOR, IndexedIndirectX, 6, false),
        0x51 => (EOR, IndexedIndirectY, 5, true),

        0xE6 => (INC, ZeroPage, 5, false),
        0xF6 => (INC, ZeroPageX, 6, false),
        0xEE => (INC, Absolute, 6, false),
        0xFE => (INC, AbsoluteX, 7, false),

        0xE8 => (INX, Implicit, 2, false),
        0xC8 => (INY, Implicit, 2, false),

        0x4C => (JMP, Absolute, 3, false),
        0x6C => (JMP, Indirect, 5, false),

        0x20 => (JSR, Absolute, 6, false),

        0xA9 => (LDA, Immediate, 2, false),
        0xA5 => (LDA, ZeroPage, 3, false),
        0xB5 => (LDA, ZeroPageX, 4, false),
        0xAD => (LDA, Absolute, 4, false),
        0xBD => (LDA, AbsoluteX, 4, true),
        0xB9 => (LDA, AbsoluteY, 4, true),
        0xA1 => (LDA, IndexedIndirectX, 6, false),
        0xB1 => (LDA, IndexedIndirectY, 5, true),

        0xA2 => (LDX, Immediate, 2, false),
        0xA6 => (LDX, ZeroPage, 3, false),
        0xB6 => (LDX, ZeroPageY, 4, false),
        0xAE => (LDX, Absolute, 4, false),
        0xBE => (LDX, AbsoluteY, 4, true),

        0xA0 => (LDY, Immediate, 2, false),
        0xA4 => (LDY, ZeroPage, 3, false),
        0xB4 => (LDY, ZeroPageX, 4, false),
        0xAC => (LDY, Absolute, 4, false),
        0xBC => (LDY, AbsoluteX, 4, true),

        0x4A => (LSR, Accumulator, 2, false),
        0x46 => (LSR, ZeroPage, 5, false),
        0x56 => (LSR, ZeroPageX, 6, false),
        0x4E => (LSR, Absolute, 6, false),
        0x5E => (LSR, AbsoluteX, 7, false),

        0xEA => (NOP, Implicit, 2, false),

        0x09 => (ORA, Immediate, 2, false),
        0x05 => (ORA, ZeroPage, 3, false),
        0x15 => (ORA, ZeroPageX, 4, false),
        0x0D => (ORA, Absolute, 4, false),
        0x1D => (ORA, AbsoluteX, 4, true),
        0x19 => (ORA, AbsoluteY, 4, true),
        0x01 => (ORA, IndexedIndirectX, 6, false),
        0x11 => (ORA, IndexedIndirectY, 5, true),

        0x48 => (PHA, Implicit, 3, false),
        0x08 => (PHP, Implicit, 3, false),
        0x68 => (PLA, Implicit, 4, false),
        0x28 => (PLP, Implicit, 4, false),

        0x2A => (ROL, Accumulator, 2, false),
        0x26 => (ROL, ZeroPage, 5, false),
        0x36 => (ROL, ZeroPageX, 6, false),
        0x2E => (ROL, Absolute, 6, false),
        0x3E => (ROL, AbsoluteX, 7, false),

        0x6A => (ROR, Accumulator, 2, false),
        0x66 => (ROR, ZeroPage, 5, false),
        0x76 => (ROR, ZeroPageX, 6, false),
        0x6E => (ROR, Absolute, 6, false),
        0x7E => (ROR, AbsoluteX, 7, false),

        0x40 => (RTI, Implicit, 6, false),
        0x60 => (RTS, Implicit, 6, false),

        0xE9 => (SBC, Immediate, 2, false),
        0xE5 => (SBC, ZeroPage, 3, false),
        0xF5 => (SBC, ZeroPageX, 4, false),
        0xED => (SBC, Absolute, 4, false),
        0xFD => (SBC, AbsoluteX, 4, true),
        0xF9 => (SBC, AbsoluteY, 4, true),
        0xE1 => (SBC, IndexedIndirectX, 6, false),
        0xF1 => (SBC, IndexedIndirectY, 5, true),

        0x38 => (SEC, Implicit, 2, false),
        0xF8 => (SED, Implicit, 2, false),
        0x78 => (SEI, Implicit, 2, false),

        0x85 => (STA, ZeroPage, 3, false),
        0x95 => (STA, ZeroPageX, 4, false),
        0x8D => (STA, Absolute, 4, false),
        0x9D => (STA, AbsoluteX, 5, false),
        0x99 => (STA, AbsoluteY, 5, false),
        0x81 => (STA, IndexedIndirectX, 6, false),
        0x91 => (STA, IndexedIndirectY, 6, false),

        0x86 => (STX, ZeroPage, 3, false),
        0x96 => (STX, ZeroPageY, 4, false),
        0x8E => (STX, Absolute, 4, false),

        0x84 => (STY, ZeroPage, 3, false),
        0x94 => (STY, ZeroPageX, 4, false),
        0x8C => (STY, Absolute, 4, false),

        0xAA => (TAX, Implicit, 2, false),
        0xA8 => (TAY, Implicit, 2, false),
        0xBA => (TSX, Implicit, 2, false),
        0x8A => (TXA, Implicit, 2, false),
        0x9A => (TXS, Implicit, 2, false),
        0x98 => (TYA, Implicit, 2, false),

        _ => return None,
    };

    Some(Operation { opcode, instruction, mode, cycles, page_penalty })
}

/// Every decodable operation, in opcode order.
pub fn operations() -> impl Iterator<Item = Operation> {
    (0..=255u8).filter_map(lookup)
}
