//! A 6502 core as found in the NES 2A03, with the memory bus it runs against.
//!
//! The CPU owns a [`Bus`](memory::Bus) assembled from [`MemoryChunk`](memory::MemoryChunk)s;
//! [`Cpu::step`] executes one instruction and reports it as a
//! [`StepTrace`](cpu::trace::StepTrace).

pub mod cpu;
pub mod error;
pub mod memory;
pub mod ppu;
pub mod registers;

#[cfg(test)]
mod fixture;

pub use cpu::Cpu;
pub use error::{Error, Result};
