//! Error type for the CPU core and its memory bus.

use crate::cpu::address_mode::AddressMode;
use std::{io, result};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The bus was accessed before any chunks were defined on it.
    #[error("memory chunks are undefined")]
    ChunksUndefined,

    /// No chunk on the bus covers the address.
    #[error("unmapped address {0:#06x}")]
    UnmappedAddress(u16),

    /// The fetched byte does not decode to an official operation.
    #[error("unknown opcode {opcode:#04x} at {address:#06x}")]
    UnknownOpcode { opcode: u8, address: u16 },

    /// The addressing mode operates on a register or literal, not on memory.
    #[error("addressing mode {0:?} has no effective address")]
    NoEffectiveAddress(AddressMode),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

pub type Result<T> = result::Result<T, Error>;
