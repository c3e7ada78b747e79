//! Byte-sized registers with named sub-bit fields.
//!
//! Registers are declared with [`bit_register!`](crate::bit_register), which
//! generates a newtype over the raw byte plus one `const fn` getter per field.
//! Field layout is checked when the crate is compiled: a register whose fields
//! overlap, or do not fit in eight bits, fails to build.

/// A run of `width` bits starting at bit `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitField {
    pub start: u8,
    pub width: u8,
}

impl BitField {
    pub const fn new(start: u8, width: u8) -> BitField {
        assert!(width > 0 && start + width <= 8);
        BitField { start, width }
    }

    /// Bits covered by the field, in register position.
    pub const fn mask(&self) -> u8 {
        (((1u16 << self.width) - 1) << self.start) as u8
    }

    /// Extracts the field from `raw`, right-aligned.
    pub const fn get(&self, raw: u8) -> u8 {
        (raw & self.mask()) >> self.start
    }

    /// Largest value the field can hold.
    pub const fn max(&self) -> u8 {
        ((1u16 << self.width) - 1) as u8
    }
}

/// True when no two fields share a bit.
pub const fn disjoint(fields: &[BitField]) -> bool {
    let mut seen = 0u8;
    let mut i = 0;
    while i < fields.len() {
        let mask = fields[i].mask();
        if seen & mask != 0 {
            return false;
        }
        seen |= mask;
        i += 1;
    }
    true
}

/// Declares a byte register with named bit fields.
///
/// ```
/// nescpu::bit_register! {
///     pub struct Example {
///         low: 0, 2;
///         flag: 7;
///     }
/// }
///
/// let r = Example(0b1000_0011);
/// assert_eq!(r.low(), 3);
/// assert_eq!(r.flag(), 1);
/// ```
#[macro_export]
macro_rules! bit_register {
    (@field $start:literal) => {
        $crate::registers::bit_field::BitField::new($start, 1)
    };
    (@field $start:literal, $width:literal) => {
        $crate::registers::bit_field::BitField::new($start, $width)
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident: $start:literal $(, $width:literal)?;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        $vis struct $name(pub u8);

        impl $name {
            /// Declared fields, in declaration order.
            pub const FIELDS: &'static [(&'static str, $crate::registers::bit_field::BitField)] = &[
                $( (stringify!($field), $crate::bit_register!(@field $start $(, $width)?)), )*
            ];

            $(
                $(#[$field_meta])*
                pub const fn $field(&self) -> u8 {
                    $crate::bit_register!(@field $start $(, $width)?).get(self.0)
                }
            )*
        }

        const _: () = assert!($crate::registers::bit_field::disjoint(&[
            $( $crate::bit_register!(@field $start $(, $width)?) ),*
        ]));

        impl From<u8> for $name {
            fn from(raw: u8) -> Self {
                $name(raw)
            }
        }

        impl From<$name> for u8 {
            fn from(register: $name) -> u8 {
                register.0
            }
        }
    };
}
