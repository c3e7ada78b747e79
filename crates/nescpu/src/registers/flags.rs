const N_BIT: u8 = 0b1000_0000;
const V_BIT: u8 = 0b0100_0000;
const B1_BIT: u8 = 0b0010_0000;
const B2_BIT: u8 = 0b0001_0000;
const D_BIT: u8 = 0b0000_1000;
const I_BIT: u8 = 0b0000_0100;
const Z_BIT: u8 = 0b0000_0010;
const C_BIT: u8 = 0b0000_0001;

/// Both break bits, as pushed by PHP and BRK.
pub const BREAK_BITS: u8 = B1_BIT | B2_BIT;

/// Processor status register (P).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlagsRegister {
    pub negative: bool,
    pub overflow: bool,
    pub break1: bool, // Bit 5. Reads back as 1 on hardware; see https://www.nesdev.org/wiki/Status_flags#The_B_flag
    pub break2: bool, // Bit 4.
    pub decimal: bool,
    pub interrupt: bool,
    pub zero: bool,
    pub carry: bool,
}

impl FlagsRegister {
    pub fn new() -> FlagsRegister {
        FlagsRegister::default()
    }

    pub fn load(&mut self, byte: u8) -> &mut Self {
        self.negative = byte & N_BIT != 0;
        self.overflow = byte & V_BIT != 0;
        self.break1 = byte & B1_BIT != 0;
        self.break2 = byte & B2_BIT != 0;
        self.decimal = byte & D_BIT != 0;
        self.interrupt = byte & I_BIT != 0;
        self.zero = byte & Z_BIT != 0;
        self.carry = byte & C_BIT != 0;
        self
    }

    pub fn to_byte(&self) -> u8 {
        [
            (self.negative, N_BIT),
            (self.overflow, V_BIT),
            (self.break1, B1_BIT),
            (self.break2, B2_BIT),
            (self.decimal, D_BIT),
            (self.interrupt, I_BIT),
            (self.zero, Z_BIT),
            (self.carry, C_BIT),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .fold(0, |byte, (_, bit)| byte | bit)
    }

    /// Loads every flag except the two break bits, which keep their value.
    /// This is what PLP and RTI do with the byte pulled from the stack.
    pub fn load_ignoring_break(&mut self, byte: u8) -> &mut Self {
        let kept = self.to_byte() & BREAK_BITS;
        self.load((byte & !BREAK_BITS) | kept)
    }

    /// Sets `zero` if `value` is zero and `negative` if bit 7 is set.
    ///
    /// Only ever sets flags; a flag whose condition does not hold keeps its
    /// previous value. Use [`assign_zero_and_negative`](Self::assign_zero_and_negative)
    /// to get the hardware behaviour of an instruction result.
    pub fn update_zero_and_negative(&mut self, value: u8) {
        if value == 0 {
            self.zero = true;
        }
        if (value as i8) < 0 {
            self.negative = true;
        }
    }

    /// Sets `zero` and `negative` to exactly reflect `value`.
    pub fn assign_zero_and_negative(&mut self, value: u8) {
        self.zero = false;
        self.negative = false;
        self.update_zero_and_negative(value);
    }
}
