use super::MemoryChunk;
use crate::error::{Error, Result};

use itertools::Itertools;
use log::{debug, warn};

/// The CPU address space, composed from an ordered list of chunks.
///
/// Each access goes to the first chunk whose range contains the address, at an
/// offset relative to that chunk's start.
#[derive(Default)]
pub struct Bus {
    chunks: Option<Vec<Box<dyn MemoryChunk>>>,
}

impl Bus {
    /// An unconfigured bus. Every access fails until [`define_chunks`](Self::define_chunks) is called.
    pub fn new() -> Bus {
        Bus { chunks: None }
    }

    pub fn with_chunks(chunks: Vec<Box<dyn MemoryChunk>>) -> Bus {
        let mut bus = Bus::new();
        bus.define_chunks(chunks);
        bus
    }

    /// Replaces the whole memory map.
    pub fn define_chunks(&mut self, chunks: Vec<Box<dyn MemoryChunk>>) {
        debug!(
            "Defining {} memory chunks: {}",
            chunks.len(),
            chunks
                .iter()
                .map(|c| format!("{:#06x}..{:#07x}", c.start_address(), c.end_address()))
                .join(", ")
        );
        for (a, b) in chunks.iter().tuple_combinations() {
            if (a.start_address() as u32) < b.end_address() && (b.start_address() as u32) < a.end_address() {
                warn!(
                    "Memory chunks {:#06x}..{:#07x} and {:#06x}..{:#07x} overlap; the first one listed wins",
                    a.start_address(),
                    a.end_address(),
                    b.start_address(),
                    b.end_address()
                );
            }
        }
        self.chunks = Some(chunks);
    }

    pub fn is_configured(&self) -> bool {
        self.chunks.is_some()
    }

    pub fn read(&mut self, address: u16) -> Result<u8> {
        let chunk = self.chunk_for_mut(address)?;
        let offset = address - chunk.start_address();
        Ok(chunk.read_at(offset))
    }

    pub fn write(&mut self, address: u16, value: u8) -> Result<()> {
        let chunk = self.chunk_for_mut(address)?;
        let offset = address - chunk.start_address();
        chunk.write_at(offset, value);
        Ok(())
    }

    /// Reads without triggering peripheral side effects.
    pub fn peek(&self, address: u16) -> Result<u8> {
        let chunk = self.chunk_for(address)?;
        Ok(chunk.peek_at(address - chunk.start_address()))
    }

    /// Little-endian word at `address`; the high byte comes from `address + 1`
    /// wrapping at the top of the address space.
    pub fn peek_16(&self, address: u16) -> Result<u16> {
        let low = self.peek(address)? as u16;
        let high = self.peek(address.wrapping_add(1))? as u16;
        Ok(low | (high << 8))
    }

    pub fn read_16(&mut self, address: u16) -> Result<u16> {
        let low = self.read(address)? as u16;
        let high = self.read(address.wrapping_add(1))? as u16;
        Ok(low | (high << 8))
    }

    fn chunk_for(&self, address: u16) -> Result<&dyn MemoryChunk> {
        let chunks = self.chunks.as_ref().ok_or(Error::ChunksUndefined)?;
        chunks
            .iter()
            .find(|c| c.contains(address))
            .map(|c| &**c)
            .ok_or(Error::UnmappedAddress(address))
    }

    fn chunk_for_mut(&mut self, address: u16) -> Result<&mut Box<dyn MemoryChunk>> {
        let chunks = self.chunks.as_mut().ok_or(Error::ChunksUndefined)?;
        chunks
            .iter_mut()
            .find(|c| c.contains(address))
            .ok_or(Error::UnmappedAddress(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Ram, Rom};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ram_and_rom() -> (Rc<RefCell<Ram>>, Bus) {
        let ram = Rc::new(RefCell::new(Ram::new(0x0000, 0x0800)));
        let mut rom_data = vec![0; 0x8000];
        rom_data[0x1000] = 0xAB;
        let chunks: Vec<Box<dyn MemoryChunk>> = vec![Box::new(ram.clone()), Box::new(Rom::new(0x8000, rom_data))];
        (ram, Bus::with_chunks(chunks))
    }

    #[test]
    fn test_routes_to_owning_chunk() -> Result<()> {
        let (ram, mut bus) = ram_and_rom();
        ram.borrow_mut().write(0x0005, 0x77);
        assert_eq!(bus.read(0x0005)?, 0x77);
        assert_eq!(bus.read(0x9000)?, 0xAB);

        bus.write(0x0006, 0x12)?;
        assert_eq!(ram.borrow().read(0x0006), 0x12);
        Ok(())
    }

    #[test]
    fn test_unmapped_address() {
        let (_, mut bus) = ram_and_rom();
        assert_eq!(bus.read(0x3000), Err(Error::UnmappedAddress(0x3000)));
        assert_eq!(bus.write(0x0800, 0), Err(Error::UnmappedAddress(0x0800)));
        assert_eq!(bus.peek(0x7FFF), Err(Error::UnmappedAddress(0x7FFF)));
    }

    #[test]
    fn test_unconfigured_bus() {
        let mut bus = Bus::new();
        assert!(!bus.is_configured());
        assert_eq!(bus.read(0x0000), Err(Error::ChunksUndefined));
        assert_eq!(bus.write(0x0000, 1), Err(Error::ChunksUndefined));
        assert_eq!(bus.peek(0x0000), Err(Error::ChunksUndefined));
    }

    #[test]
    fn test_first_match_wins() -> Result<()> {
        let mut low = Ram::new(0x0000, 0x0100);
        low.write(0x10, 0x01);
        let mut wide = Ram::new(0x0000, 0x0200);
        wide.write(0x10, 0x02);
        wide.write(0x110, 0x03);
        let chunks: Vec<Box<dyn MemoryChunk>> = vec![Box::new(low), Box::new(wide)];
        let mut bus = Bus::with_chunks(chunks);
        assert_eq!(bus.read(0x0010)?, 0x01);
        assert_eq!(bus.read(0x0110)?, 0x03);
        Ok(())
    }

    #[test]
    fn test_define_chunks_replaces_map() -> Result<()> {
        let (_, mut bus) = ram_and_rom();
        let chunks: Vec<Box<dyn MemoryChunk>> = vec![Box::new(Ram::new(0x3000, 0x10))];
        bus.define_chunks(chunks);
        assert_eq!(bus.read(0x3000)?, 0);
        assert_eq!(bus.read(0x0005), Err(Error::UnmappedAddress(0x0005)));
        Ok(())
    }

    #[test]
    fn test_word_reads_are_little_endian() -> Result<()> {
        let mut ram = Ram::new(0x0000, 0x0800);
        ram.load(0x0010, &[0x34, 0x12]);
        let chunks: Vec<Box<dyn MemoryChunk>> = vec![Box::new(ram)];
        let mut bus = Bus::with_chunks(chunks);
        assert_eq!(bus.peek_16(0x0010)?, 0x1234);
        assert_eq!(bus.read_16(0x0010)?, 0x1234);
        Ok(())
    }
}
