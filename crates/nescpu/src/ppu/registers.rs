use crate::bit_register;

bit_register! {
    /// PPUCTRL, $2000.
    pub struct PpuCtrl {
        base_nametable_id: 0, 2;
        vram_increment_id: 2;
        sprite_pattern_table_id: 3;
        background_pattern_table_id: 4;
        sprite_size_id: 5;
        master_slave_select: 6;
        generate_nmi: 7;
    }
}

impl PpuCtrl {
    pub fn base_nametable_address(&self) -> u16 {
        match self.base_nametable_id() {
            1 => 0x2400,
            2 => 0x2800,
            3 => 0x2C00,
            _ => 0x2000,
        }
    }

    /// Step applied to the VRAM address after each PPUDATA access: across or down.
    pub fn vram_address_increment(&self) -> u16 {
        if self.vram_increment_id() == 0 { 1 } else { 32 }
    }

    /// Ignored when sprites are 8x16.
    pub fn sprite_pattern_table_address(&self) -> u16 {
        if self.sprite_pattern_table_id() == 0 { 0x0000 } else { 0x1000 }
    }

    pub fn background_pattern_table_address(&self) -> u16 {
        if self.background_pattern_table_id() == 0 { 0x0000 } else { 0x1000 }
    }

    pub fn sprite_width(&self) -> u8 {
        8
    }

    pub fn sprite_height(&self) -> u8 {
        if self.sprite_size_id() == 0 { 8 } else { 16 }
    }
}

bit_register! {
    /// PPUMASK, $2001.
    pub struct PpuMask {
        greyscale: 0;
        show_background_left: 1;
        show_sprites_left: 2;
        show_background: 3;
        show_sprites: 4;
        emphasize_red: 5;
        emphasize_green: 6;
        emphasize_blue: 7;
    }
}

impl PpuMask {
    pub fn rendering_enabled(&self) -> bool {
        self.show_background() == 1 || self.show_sprites() == 1
    }
}

bit_register! {
    /// PPUSTATUS, $2002. The low five bits are stale bus contents.
    pub struct PpuStatus {
        open_bus: 0, 5;
        sprite_overflow: 5;
        sprite_zero_hit: 6;
        vblank: 7;
    }
}
