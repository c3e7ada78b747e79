use super::MemoryChunk;

/// Read/write storage. A window larger than the storage mirrors it, like the
/// 2 KiB of CPU RAM repeated over $0000-$1FFF.
pub struct Ram {
    pub size: usize,
    start_address: u16,
    window: u32,
    mem: Vec<u8>,
}

impl Ram {
    pub fn new(start_address: u16, size: usize) -> Ram {
        Ram::mirrored(start_address, size, size as u32)
    }

    pub fn mirrored(start_address: u16, size: usize, window: u32) -> Ram {
        assert!(size > 0, "RAM must not be empty");
        assert!(start_address as u32 + window <= 0x10000, "RAM window {:#06x}+{:#x} overruns the address space", start_address, window);
        Ram {
            size,
            start_address,
            window,
            mem: vec![0; size],
        }
    }

    pub fn read(&self, address: usize) -> u8 {
        self.mem[address % self.size]
    }

    pub fn write(&mut self, address: usize, value: u8) {
        self.mem[address % self.size] = value;
    }

    /// Copies `bytes` into storage starting at `address`.
    pub fn load(&mut self, address: usize, bytes: &[u8]) {
        for (i, byte) in bytes.iter().enumerate() {
            self.write(address + i, *byte);
        }
    }
}

impl Default for Ram {
    /// The console's internal CPU RAM.
    fn default() -> Ram {
        Ram::mirrored(0x0000, 0x0800, 0x2000)
    }
}

impl MemoryChunk for Ram {
    fn start_address(&self) -> u16 {
        self.start_address
    }

    fn size(&self) -> u32 {
        self.window
    }

    fn peek_at(&self, offset: u16) -> u8 {
        self.read(offset as usize)
    }

    fn write_at(&mut self, offset: u16, value: u8) {
        self.write(offset as usize, value);
    }
}
