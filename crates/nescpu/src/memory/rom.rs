use super::MemoryChunk;
use log::warn;

/// Read-only program memory. Writes are dropped.
///
/// A window larger than the image mirrors it, e.g. a 16 KiB PRG bank seen at
/// both $8000 and $C000.
pub struct Rom {
    start_address: u16,
    window: u32,
    data: Vec<u8>,
}

impl Rom {
    pub fn new(start_address: u16, data: Vec<u8>) -> Rom {
        let window = data.len() as u32;
        Rom::mirrored(start_address, data, window)
    }

    pub fn mirrored(start_address: u16, data: Vec<u8>, window: u32) -> Rom {
        assert!(!data.is_empty(), "ROM image must not be empty");
        assert!(start_address as u32 + window <= 0x10000, "ROM window {:#06x}+{:#x} overruns the address space", start_address, window);
        Rom { start_address, window, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl MemoryChunk for Rom {
    fn start_address(&self) -> u16 {
        self.start_address
    }

    fn size(&self) -> u32 {
        self.window
    }

    fn peek_at(&self, offset: u16) -> u8 {
        self.data[offset as usize % self.data.len()]
    }

    fn write_at(&mut self, offset: u16, value: u8) {
        warn!(
            "Ignoring write of {:#04x} to ROM at {:#06x}",
            value,
            self.start_address as u32 + offset as u32
        );
    }
}
