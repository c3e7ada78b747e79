//! Memory chunks and the composed bus that routes CPU accesses to them.

pub mod bus;
pub mod ram;
pub mod rom;

pub use bus::Bus;
pub use ram::Ram;
pub use rom::Rom;

use std::cell::RefCell;
use std::rc::Rc;

/// A contiguous slice of the CPU address space.
///
/// Offsets passed to the accessors are relative to [`start_address`](Self::start_address)
/// and always lie in `0..size()`.
pub trait MemoryChunk {
    fn start_address(&self) -> u16;

    /// Length of the covered range. Up to 0x10000, so a chunk can end at the
    /// top of the address space.
    fn size(&self) -> u32;

    /// Reads a byte without any side effect on the chunk.
    fn peek_at(&self, offset: u16) -> u8;

    /// Reads a byte as the CPU would. Peripherals override this when a read
    /// changes their state.
    fn read_at(&mut self, offset: u16) -> u8 {
        self.peek_at(offset)
    }

    fn write_at(&mut self, offset: u16, value: u8);

    fn contains(&self, address: u16) -> bool {
        let start = self.start_address() as u32;
        let address = address as u32;
        address >= start && address < start + self.size()
    }

    fn end_address(&self) -> u32 {
        self.start_address() as u32 + self.size()
    }
}

// Lets wiring code keep a handle on a chunk after handing it to the bus.
impl<T: MemoryChunk> MemoryChunk for Rc<RefCell<T>> {
    fn start_address(&self) -> u16 {
        self.borrow().start_address()
    }

    fn size(&self) -> u32 {
        self.borrow().size()
    }

    fn peek_at(&self, offset: u16) -> u8 {
        self.borrow().peek_at(offset)
    }

    fn read_at(&mut self, offset: u16) -> u8 {
        self.borrow_mut().read_at(offset)
    }

    fn write_at(&mut self, offset: u16, value: u8) {
        self.borrow_mut().write_at(offset, value)
    }
}
