use super::address_mode::Operand;
use super::opcode::Operation;
use super::{Cpu, IRQ_VECTOR};
use crate::error::Result;
use crate::registers::flags::BREAK_BITS;
use crate::registers::FlagsRegister;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT,
    BMI, BNE, BPL, BRK, BVC, BVS, CLC,
    CLD, CLI, CLV, CMP, CPX, CPY, DEC,
    DEX, DEY, EOR, INC, INX, INY, JMP,
    JSR, LDA, LDX, LDY, LSR, NOP, ORA,
    PHA, PHP, PLA, PLP, ROL, ROR, RTI,
    RTS, SBC, SEC, SED, SEI, STA, STX,
    STY, TAX, TAY, TSX, TXA, TXS, TYA,
}

impl Instruction {
    /// Stores and read-modify-write instructions.
    pub fn writes_memory(self) -> bool {
        use Instruction::*;
        matches!(self, STA | STX | STY | ASL | LSR | ROL | ROR | INC | DEC)
    }

    /// Jumps whose absolute operand is a destination, not data.
    pub fn is_jump(self) -> bool {
        matches!(self, Instruction::JMP | Instruction::JSR)
    }
}

fn address_of(operand: Operand) -> u16 {
    match operand {
        Operand::Memory { address, .. } => address,
        other => unreachable!("{:?} operand has no address", other),
    }
}

impl Cpu {
    pub(super) fn execute_instruction(&mut self, operation: &Operation, operand: Operand) -> Result<()> {
        use Instruction::*;
        match operation.instruction {
            ADC => self.adc(operand),
            AND => self.and(operand),
            ASL => self.asl(operand),
            BCC => self.branch(!self.status.carry, operand),
            BCS => self.branch(self.status.carry, operand),
            BEQ => self.branch(self.status.zero, operand),
            BIT => self.bit(operand),
            BMI => self.branch(self.status.negative, operand),
            BNE => self.branch(!self.status.zero, operand),
            BPL => self.branch(!self.status.negative, operand),
            BRK => self.brk(),
            BVC => self.branch(!self.status.overflow, operand),
            BVS => self.branch(self.status.overflow, operand),
            CLC => {
                self.status.carry = false;
                Ok(())
            }
            CLD => {
                self.status.decimal = false;
                Ok(())
            }
            CLI => {
                self.status.interrupt = false;
                Ok(())
            }
            CLV => {
                self.status.overflow = false;
                Ok(())
            }
            CMP => self.compare(self.accumulator, operand),
            CPX => self.compare(self.x_index, operand),
            CPY => self.compare(self.y_index, operand),
            DEC => self.modify(operand, |flags, value| {
                let result = value.wrapping_sub(1);
                flags.assign_zero_and_negative(result);
                result
            }),
            DEX => {
                self.x_index = self.x_index.wrapping_sub(1);
                self.status.assign_zero_and_negative(self.x_index);
                Ok(())
            }
            DEY => {
                self.y_index = self.y_index.wrapping_sub(1);
                self.status.assign_zero_and_negative(self.y_index);
                Ok(())
            }
            EOR => self.eor(operand),
            INC => self.modify(operand, |flags, value| {
                let result = value.wrapping_add(1);
                flags.assign_zero_and_negative(result);
                result
            }),
            INX => {
                self.x_index = self.x_index.wrapping_add(1);
                self.status.assign_zero_and_negative(self.x_index);
                Ok(())
            }
            INY => {
                self.y_index = self.y_index.wrapping_add(1);
                self.status.assign_zero_and_negative(self.y_index);
                Ok(())
            }
            JMP => {
                self.program_counter = address_of(operand);
                Ok(())
            }
            JSR => self.jsr(operand),
            LDA => {
                self.accumulator = self.load(operand)?;
                self.status.assign_zero_and_negative(self.accumulator);
                Ok(())
            }
            LDX => {
                self.x_index = self.load(operand)?;
                self.status.assign_zero_and_negative(self.x_index);
                Ok(())
            }
            LDY => {
                self.y_index = self.load(operand)?;
                self.status.assign_zero_and_negative(self.y_index);
                Ok(())
            }
            LSR => self.modify(operand, |flags, value| {
                flags.carry = value & 0x01 == 0x01;
                let result = value >> 1;
                flags.assign_zero_and_negative(result);
                result
            }),
            NOP => Ok(()),
            ORA => self.ora(operand),
            PHA => self.stack_push_8(self.accumulator),
            PHP => self.stack_push_8(self.status.to_byte() | BREAK_BITS),
            PLA => {
                self.accumulator = self.stack_pop_8()?;
                self.status.assign_zero_and_negative(self.accumulator);
                Ok(())
            }
            PLP => {
                let status = self.stack_pop_8()?;
                self.status.load_ignoring_break(status);
                Ok(())
            }
            ROL => self.modify(operand, |flags, value| {
                let result = (value << 1) | flags.carry as u8;
                flags.carry = value & 0x80 == 0x80;
                flags.assign_zero_and_negative(result);
                result
            }),
            ROR => self.modify(operand, |flags, value| {
                let result = (value >> 1) | ((flags.carry as u8) << 7);
                flags.carry = value & 0x01 == 0x01;
                flags.assign_zero_and_negative(result);
                result
            }),
            RTI => self.rti(),
            RTS => {
                self.program_counter = self.stack_pop_16()?.wrapping_add(1);
                Ok(())
            }
            SBC => {
                let value = self.load(operand)?;
                self.add_with_carry(!value);
                Ok(())
            }
            SEC => {
                self.status.carry = true;
                Ok(())
            }
            SED => {
                self.status.decimal = true;
                Ok(())
            }
            SEI => {
                self.status.interrupt = true;
                Ok(())
            }
            STA => self.write_8(address_of(operand), self.accumulator),
            STX => self.write_8(address_of(operand), self.x_index),
            STY => self.write_8(address_of(operand), self.y_index),
            TAX => {
                self.x_index = self.accumulator;
                self.status.assign_zero_and_negative(self.x_index);
                Ok(())
            }
            TAY => {
                self.y_index = self.accumulator;
                self.status.assign_zero_and_negative(self.y_index);
                Ok(())
            }
            TSX => {
                self.x_index = self.stack_pointer;
                self.status.assign_zero_and_negative(self.x_index);
                Ok(())
            }
            TXA => {
                self.accumulator = self.x_index;
                self.status.assign_zero_and_negative(self.accumulator);
                Ok(())
            }
            TXS => {
                self.stack_pointer = self.x_index;
                Ok(())
            }
            TYA => {
                self.accumulator = self.y_index;
                self.status.assign_zero_and_negative(self.accumulator);
                Ok(())
            }
        }
    }

    /// The byte an instruction reads: a literal, the accumulator, or memory.
    fn load(&mut self, operand: Operand) -> Result<u8> {
        match operand {
            Operand::Immediate(value) => Ok(value),
            Operand::Accumulator => Ok(self.accumulator),
            Operand::Memory { address, .. } => self.read_8(address),
            Operand::Implied => unreachable!("implied operand has no value"),
        }
    }

    /// Read-modify-write on the accumulator or memory. Memory targets see the
    /// unmodified value written back before the result, as on hardware.
    fn modify<F>(&mut self, operand: Operand, f: F) -> Result<()>
    where
        F: FnOnce(&mut FlagsRegister, u8) -> u8,
    {
        match operand {
            Operand::Accumulator => {
                self.accumulator = f(&mut self.status, self.accumulator);
            }
            Operand::Memory { address, .. } => {
                let value = self.read_8(address)?;
                self.write_8(address, value)?;
                let result = f(&mut self.status, value);
                self.write_8(address, result)?;
            }
            other => unreachable!("{:?} operand cannot be modified", other),
        }
        Ok(())
    }

    // Binary mode only: the 2A03 has no decimal arithmetic.
    fn add_with_carry(&mut self, value: u8) {
        let sum = self.accumulator as u16 + value as u16 + self.status.carry as u16;
        let result = sum as u8;
        self.status.carry = sum > 0xFF;
        self.status.overflow = (self.accumulator ^ result) & (value ^ result) & 0x80 != 0;
        self.accumulator = result;
        self.status.assign_zero_and_negative(result);
    }

    fn adc(&mut self, operand: Operand) -> Result<()> {
        let value = self.load(operand)?;
        self.add_with_carry(value);
        Ok(())
    }

    fn and(&mut self, operand: Operand) -> Result<()> {
        self.accumulator &= self.load(operand)?;
        self.status.assign_zero_and_negative(self.accumulator);
        Ok(())
    }

    fn eor(&mut self, operand: Operand) -> Result<()> {
        self.accumulator ^= self.load(operand)?;
        self.status.assign_zero_and_negative(self.accumulator);
        Ok(())
    }

    fn ora(&mut self, operand: Operand) -> Result<()> {
        self.accumulator |= self.load(operand)?;
        self.status.assign_zero_and_negative(self.accumulator);
        Ok(())
    }

    fn asl(&mut self, operand: Operand) -> Result<()> {
        self.modify(operand, |flags, value| {
            flags.carry = value & 0x80 == 0x80;
            let result = value << 1;
            flags.assign_zero_and_negative(result);
            result
        })
    }

    /// Z from A AND value; N and V copied from bits 7 and 6 of the value. A is unchanged.
    fn bit(&mut self, operand: Operand) -> Result<()> {
        let value = self.load(operand)?;
        self.status.zero = value & self.accumulator == 0;
        self.status.negative = value & 0x80 == 0x80;
        self.status.overflow = value & 0x40 == 0x40;
        Ok(())
    }

    fn compare(&mut self, source: u8, operand: Operand) -> Result<()> {
        let value = self.load(operand)?;
        self.status.zero = source == value;
        self.status.negative = source.wrapping_sub(value) & 0x80 == 0x80;
        self.status.carry = source >= value;
        Ok(())
    }

    fn branch(&mut self, condition: bool, operand: Operand) -> Result<()> {
        if condition {
            self.extra_cycles += if operand.page_crossed() { 2 } else { 1 };
            self.program_counter = address_of(operand);
        }
        Ok(())
    }

    fn brk(&mut self) -> Result<()> {
        // BRK is followed by a padding byte that is skipped on return.
        self.program_counter = self.program_counter.wrapping_add(1);
        self.stack_push_16(self.program_counter)?;
        self.stack_push_8(self.status.to_byte() | BREAK_BITS)?;
        self.status.interrupt = true;
        self.program_counter = self.read_16(IRQ_VECTOR)?;
        Ok(())
    }

    fn jsr(&mut self, operand: Operand) -> Result<()> {
        self.stack_push_16(self.program_counter.wrapping_sub(1))?;
        self.program_counter = address_of(operand);
        Ok(())
    }

    fn rti(&mut self) -> Result<()> {
        let status = self.stack_pop_8()?;
        self.status.load_ignoring_break(status);
        self.program_counter = self.stack_pop_16()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::fixture::Fixture;

    #[test]
    fn test_bit_takes_n_and_v_from_value() {
        // LDA #%11000000 ; BIT $10
        let mut f = Fixture::new(&[0xA9, 0b1100_0000, 0x24, 0x10]);
        f.poke(0x0010, 0b1000_0001);
        f.run(2);
        assert!(!f.cpu.status.zero);
        assert!(f.cpu.status.negative);
        assert!(!f.cpu.status.overflow);
        assert_eq!(f.cpu.accumulator, 0b1100_0000);
    }

    #[test]
    fn test_bit_sets_zero_from_mask() {
        // LDA #$01 ; BIT $10
        let mut f = Fixture::new(&[0xA9, 0x01, 0x24, 0x10]);
        f.poke(0x0010, 0b0100_0010);
        f.run(2);
        assert!(f.cpu.status.zero);
        assert!(!f.cpu.status.negative);
        assert!(f.cpu.status.overflow);
    }

    #[test]
    fn test_cmp_equal() {
        // LDA #$10 ; CMP #$10
        let mut f = Fixture::new(&[0xA9, 0x10, 0xC9, 0x10]);
        f.run(2);
        assert!(f.cpu.status.zero);
        assert!(f.cpu.status.carry);
        assert!(!f.cpu.status.negative);
    }

    #[test]
    fn test_cmp_less_than_wraps_negative() {
        // LDA #$05 ; CMP #$10
        let mut f = Fixture::new(&[0xA9, 0x05, 0xC9, 0x10]);
        f.run(2);
        assert!(!f.cpu.status.zero);
        assert!(!f.cpu.status.carry);
        assert!(f.cpu.status.negative);
    }

    #[test]
    fn test_cpx_and_cpy_clear_flags_they_do_not_hold() {
        // SEC ; LDX #$80 ; CPX #$01 ; LDY #$00 ; CPY #$00
        let mut f = Fixture::new(&[0x38, 0xA2, 0x80, 0xE0, 0x01, 0xA0, 0x00, 0xC0, 0x00]);
        f.run(3);
        assert!(!f.cpu.status.zero && f.cpu.status.carry && !f.cpu.status.negative);
        f.run(2);
        assert!(f.cpu.status.zero && f.cpu.status.carry && !f.cpu.status.negative);
    }

    #[test]
    fn test_adc_overflow_and_carry() {
        // CLC ; LDA #$50 ; ADC #$50
        let mut f = Fixture::new(&[0x18, 0xA9, 0x50, 0x69, 0x50]);
        f.run(3);
        assert_eq!(f.cpu.accumulator, 0xA0);
        assert!(f.cpu.status.overflow && f.cpu.status.negative && !f.cpu.status.carry);

        // SEC ; LDA #$FF ; ADC #$00
        let mut f = Fixture::new(&[0x38, 0xA9, 0xFF, 0x69, 0x00]);
        f.run(3);
        assert_eq!(f.cpu.accumulator, 0x00);
        assert!(f.cpu.status.carry && f.cpu.status.zero && !f.cpu.status.overflow);
    }

    #[test]
    fn test_sbc_borrow() {
        // SEC ; LDA #$50 ; SBC #$B0
        let mut f = Fixture::new(&[0x38, 0xA9, 0x50, 0xE9, 0xB0]);
        f.run(3);
        assert_eq!(f.cpu.accumulator, 0xA0);
        assert!(f.cpu.status.overflow && !f.cpu.status.carry);

        // SEC ; LDA #$05 ; SBC #$03
        let mut f = Fixture::new(&[0x38, 0xA9, 0x05, 0xE9, 0x03]);
        f.run(3);
        assert_eq!(f.cpu.accumulator, 0x02);
        assert!(f.cpu.status.carry && !f.cpu.status.overflow);
    }

    #[test]
    fn test_decimal_flag_does_not_change_arithmetic() {
        // SED ; CLC ; LDA #$09 ; ADC #$01
        let mut f = Fixture::new(&[0xF8, 0x18, 0xA9, 0x09, 0x69, 0x01]);
        f.run(4);
        assert_eq!(f.cpu.accumulator, 0x0A);
        assert!(f.cpu.status.decimal);
    }

    #[test]
    fn test_load_clears_stale_negative() {
        // LDA #$80 ; LDA #$01
        let mut f = Fixture::new(&[0xA9, 0x80, 0xA9, 0x01]);
        f.run(1);
        assert!(f.cpu.status.negative);
        f.run(1);
        assert!(!f.cpu.status.negative && !f.cpu.status.zero);
    }

    #[test]
    fn test_shifts_and_rotates() {
        // LDA #$81 ; ASL A ; ROL A ; LSR A ; ROR A
        let mut f = Fixture::new(&[0xA9, 0x81, 0x0A, 0x2A, 0x4A, 0x6A]);
        f.run(2);
        assert_eq!(f.cpu.accumulator, 0x02);
        assert!(f.cpu.status.carry);
        f.run(1);
        assert_eq!(f.cpu.accumulator, 0x05);
        assert!(!f.cpu.status.carry);
        f.run(1);
        assert_eq!(f.cpu.accumulator, 0x02);
        assert!(f.cpu.status.carry);
        f.run(1);
        assert_eq!(f.cpu.accumulator, 0x81);
        assert!(!f.cpu.status.carry && f.cpu.status.negative);
    }

    #[test]
    fn test_rotate_sets_zero() {
        // CLC ; LDA #$80 ; ROL A
        let mut f = Fixture::new(&[0x18, 0xA9, 0x80, 0x2A]);
        f.run(3);
        assert_eq!(f.cpu.accumulator, 0x00);
        assert!(f.cpu.status.zero && f.cpu.status.carry);
    }

    #[test]
    fn test_memory_increment_and_decrement() {
        // INC $20 ; DEC $21
        let mut f = Fixture::new(&[0xE6, 0x20, 0xC6, 0x21]);
        f.poke(0x0020, 0xFF);
        f.poke(0x0021, 0x00);
        f.run(1);
        assert_eq!(f.peek(0x0020), 0x00);
        assert!(f.cpu.status.zero);
        f.run(1);
        assert_eq!(f.peek(0x0021), 0xFF);
        assert!(f.cpu.status.negative && !f.cpu.status.zero);
    }

    #[test]
    fn test_stores() {
        // LDA #$11 ; LDX #$22 ; LDY #$33 ; STA $0200 ; STX $40 ; STY $41,X
        let mut f = Fixture::new(&[0xA9, 0x11, 0xA2, 0x22, 0xA0, 0x33, 0x8D, 0x00, 0x02, 0x86, 0x40, 0x94, 0x41]);
        f.run(6);
        assert_eq!(f.peek(0x0200), 0x11);
        assert_eq!(f.peek(0x0040), 0x22);
        assert_eq!(f.peek(0x0063), 0x33);
    }

    #[test]
    fn test_transfers() {
        // LDA #$80 ; TAX ; TAY ; LDX #$00 ; TXA ; TSX ; TXS
        let mut f = Fixture::new(&[0xA9, 0x80, 0xAA, 0xA8, 0xA2, 0x00, 0x8A, 0xBA, 0x9A]);
        f.run(3);
        assert_eq!((f.cpu.x_index, f.cpu.y_index), (0x80, 0x80));
        assert!(f.cpu.status.negative);
        f.run(2);
        assert_eq!(f.cpu.accumulator, 0x00);
        assert!(f.cpu.status.zero && !f.cpu.status.negative);
        f.run(1);
        assert_eq!(f.cpu.x_index, 0xFD);
        assert!(f.cpu.status.negative);
        f.cpu.x_index = 0x00;
        f.run(1);
        assert_eq!(f.cpu.stack_pointer, 0x00);
        assert!(f.cpu.status.negative, "TXS must not touch flags");
    }

    #[test]
    fn test_jsr_and_rts() {
        // JSR $8010 ; LDX #$01 ... $8010: LDA #$42 ; RTS
        let mut program = vec![0x20, 0x10, 0x80, 0xA2, 0x01];
        program.resize(0x10, 0xEA);
        program.extend_from_slice(&[0xA9, 0x42, 0x60]);
        let mut f = Fixture::new(&program);
        f.run(1);
        assert_eq!(f.cpu.program_counter, 0x8010);
        assert_eq!(f.cpu.stack_pointer, 0xFB);
        assert_eq!(f.peek(0x01FD), 0x80);
        assert_eq!(f.peek(0x01FC), 0x02);
        f.run(3);
        assert_eq!(f.cpu.program_counter, 0x8005);
        assert_eq!((f.cpu.accumulator, f.cpu.x_index), (0x42, 0x01));
        assert_eq!(f.cpu.stack_pointer, 0xFD);
    }

    #[test]
    fn test_php_and_plp() {
        // SEC ; PHP ; CLC ; PLP ; PHA ; PLA
        let mut f = Fixture::new(&[0x38, 0x08, 0x18, 0x28, 0x48, 0x68]);
        f.run(2);
        assert_eq!(f.peek(0x01FD), 0x35, "PHP pushes both break bits");
        f.run(2);
        assert!(f.cpu.status.carry);
        assert_eq!(f.cpu.status.to_byte(), 0x25, "PLP leaves the break bits alone");

        f.cpu.accumulator = 0x00;
        f.run(1);
        f.cpu.accumulator = 0x7F;
        f.run(1);
        assert_eq!(f.cpu.accumulator, 0x00);
        assert!(f.cpu.status.zero);
    }

    #[test]
    fn test_brk_and_rti() {
        // BRK ; (padding) ; INX    irq handler at $9000: RTI
        let mut program = vec![0x00, 0xFF, 0xE8];
        program.resize(0x1000, 0xEA);
        program.push(0x40);
        let mut f = Fixture::new(&program);
        f.cpu.status.carry = true;
        f.run(1);
        assert_eq!(f.cpu.program_counter, 0x9000);
        assert!(f.cpu.status.interrupt);
        assert_eq!(f.peek(0x01FB), 0x35);
        f.cpu.status.carry = false;
        f.run(1);
        assert_eq!(f.cpu.program_counter, 0x8002);
        assert!(f.cpu.status.carry);
        assert!(f.cpu.status.interrupt, "reset already set I");
        f.run(1);
        assert_eq!(f.cpu.x_index, 1);
    }

    #[test]
    fn test_jmp_indirect() {
        // JMP ($0200)
        let mut f = Fixture::new(&[0x6C, 0x00, 0x02]);
        f.poke(0x0200, 0x34);
        f.poke(0x0201, 0x92);
        f.run(1);
        assert_eq!(f.cpu.program_counter, 0x9234);
    }

    #[test]
    fn test_rmw_writes_unmodified_value_first() {
        use crate::memory::{Bus, MemoryChunk, Ram, Rom};
        use crate::Cpu;
        use std::cell::RefCell;
        use std::rc::Rc;

        struct Recorder {
            ram: Ram,
            writes: Rc<RefCell<Vec<u8>>>,
        }
        impl MemoryChunk for Recorder {
            fn start_address(&self) -> u16 { 0 }
            fn size(&self) -> u32 { 0x0800 }
            fn peek_at(&self, offset: u16) -> u8 { self.ram.read(offset as usize) }
            fn write_at(&mut self, offset: u16, value: u8) {
                self.writes.borrow_mut().push(value);
                self.ram.write(offset as usize, value);
            }
        }

        let writes = Rc::new(RefCell::new(Vec::new()));
        let mut ram = Ram::new(0x0000, 0x0800);
        ram.write(0x0010, 0x40);
        let mut rom = vec![0xEA; 0x8000];
        rom[0] = 0x06; // ASL $10
        rom[1] = 0x10;
        let chunks: Vec<Box<dyn MemoryChunk>> = vec![
            Box::new(Recorder { ram, writes: writes.clone() }),
            Box::new(Rom::new(0x8000, rom)),
        ];
        let mut cpu = Cpu::new(Bus::with_chunks(chunks));
        cpu.program_counter = 0x8000;
        cpu.step().unwrap();
        assert_eq!(*writes.borrow(), vec![0x40, 0x80]);
    }
}
