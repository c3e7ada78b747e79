//! The CPU-facing side of the PPU: its eight memory-mapped registers.
//!
//! Rendering is not emulated here. The bank keeps the register state a
//! renderer would consume and applies the side effects the CPU can observe.

pub mod registers;

pub use registers::{PpuCtrl, PpuMask, PpuStatus};

use crate::memory::MemoryChunk;

const MASK_VBLANK: u8 = 0b1000_0000;

/// $2000-$2007, mirrored every 8 bytes up to $3FFF.
pub struct PpuRegisters {
    pub ctrl: PpuCtrl,
    pub mask: PpuMask,
    pub status: PpuStatus,
    pub oam_address: u8,
    pub oam: [u8; 256],
    pub scroll_x: u8,
    pub scroll_y: u8,
    pub vram_address: u16,
    /// Last byte written through PPUDATA.
    pub data: u8,
    write_toggle: bool,
    latch: u8,
}

impl PpuRegisters {
    pub const START_ADDRESS: u16 = 0x2000;
    pub const WINDOW: u32 = 0x2000;

    pub fn new() -> PpuRegisters {
        PpuRegisters {
            ctrl: PpuCtrl::default(),
            mask: PpuMask::default(),
            status: PpuStatus(0xA0),
            oam_address: 0,
            oam: [0; 256],
            scroll_x: 0,
            scroll_y: 0,
            vram_address: 0,
            data: 0,
            write_toggle: false,
            latch: 0,
        }
    }

    fn read_status(&mut self) -> u8 {
        let value = (self.status.0 & 0xE0) | (self.latch & 0x1F);
        self.status.0 &= !MASK_VBLANK;
        self.write_toggle = false;
        value
    }

    fn write_scroll(&mut self, value: u8) {
        if !self.write_toggle {
            self.scroll_x = value;
        } else {
            self.scroll_y = value;
        }
        self.write_toggle = !self.write_toggle;
    }

    fn write_address(&mut self, value: u8) {
        if !self.write_toggle {
            self.vram_address = (self.vram_address & 0x00FF) | (((value & 0x3F) as u16) << 8);
        } else {
            self.vram_address = (self.vram_address & 0xFF00) | value as u16;
        }
        self.write_toggle = !self.write_toggle;
    }

    fn advance_vram_address(&mut self) {
        self.vram_address = self.vram_address.wrapping_add(self.ctrl.vram_address_increment()) & 0x3FFF;
    }
}

impl Default for PpuRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChunk for PpuRegisters {
    fn start_address(&self) -> u16 {
        Self::START_ADDRESS
    }

    fn size(&self) -> u32 {
        Self::WINDOW
    }

    fn peek_at(&self, offset: u16) -> u8 {
        match offset % 8 {
            2 => (self.status.0 & 0xE0) | (self.latch & 0x1F),
            4 => self.oam[self.oam_address as usize],
            _ => self.latch, // Write-only registers read back the bus latch.
        }
    }

    fn read_at(&mut self, offset: u16) -> u8 {
        let value = match offset % 8 {
            2 => self.read_status(),
            7 => {
                self.advance_vram_address();
                self.latch
            }
            _ => self.peek_at(offset),
        };
        self.latch = value;
        value
    }

    fn write_at(&mut self, offset: u16, value: u8) {
        self.latch = value;
        match offset % 8 {
            0 => self.ctrl = PpuCtrl(value),
            1 => self.mask = PpuMask(value),
            2 => (), // PPUSTATUS is read-only.
            3 => self.oam_address = value,
            4 => {
                self.oam[self.oam_address as usize] = value;
                self.oam_address = self.oam_address.wrapping_add(1);
            }
            5 => self.write_scroll(value),
            6 => self.write_address(value),
            _ => {
                self.data = value;
                self.advance_vram_address();
            }
        }
    }
}
