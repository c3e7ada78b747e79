pub mod bit_field;
pub mod flags;

pub use bit_field::BitField;
pub use flags::FlagsRegister;
