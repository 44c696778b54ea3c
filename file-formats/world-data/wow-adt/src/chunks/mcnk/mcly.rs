use binrw::{BinRead, BinWrite};

/// Texture layer flags.
///
/// ```text
/// Bits  | Mask   | Description
/// ------|--------|---------------------------
/// 0-2   | 0x007  | Animation rotation
/// 3-5   | 0x038  | Animation speed
/// 6     | 0x040  | Animation enabled
/// 7     | 0x080  | Overbright
/// 8     | 0x100  | Uses an alpha map
/// 9     | 0x200  | Alpha map is compressed
/// 10    | 0x400  | Skybox reflection
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct MclyFlags {
    pub value: u32,
}

impl MclyFlags {
    pub const ANIMATION_ENABLED: u32 = 0x040;
    pub const OVERBRIGHT: u32 = 0x080;
    pub const USE_ALPHA_MAP: u32 = 0x100;
    pub const ALPHA_COMPRESSED: u32 = 0x200;
    pub const USE_CUBE_MAP_REFLECTION: u32 = 0x400;

    pub fn animation_rotation(&self) -> u8 {
        (self.value & 0x007) as u8
    }

    pub fn animation_speed(&self) -> u8 {
        ((self.value & 0x038) >> 3) as u8
    }

    pub fn animation_enabled(&self) -> bool {
        self.value & Self::ANIMATION_ENABLED != 0
    }

    pub fn overbright(&self) -> bool {
        self.value & Self::OVERBRIGHT != 0
    }

    pub fn use_alpha_map(&self) -> bool {
        self.value & Self::USE_ALPHA_MAP != 0
    }

    pub fn alpha_map_compressed(&self) -> bool {
        self.value & Self::ALPHA_COMPRESSED != 0
    }

    pub fn use_cube_map_reflection(&self) -> bool {
        self.value & Self::USE_CUBE_MAP_REFLECTION != 0
    }
}

/// One MCLY texture layer (16 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct MclyLayer {
    /// Index of the texture in MTEX
    pub texture_id: u32,
    pub flags: MclyFlags,
    /// Start of this layer's alpha map in MCAL
    pub offset_in_mcal: u32,
    /// Ground effect id, `0xFFFFFFFF` for none
    pub effect_id: u32,
}

impl MclyLayer {
    pub const SIZE: usize = 16;
    pub const NO_EFFECT: u32 = u32::MAX;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_fields() {
        let flags = MclyFlags { value: 0x3 | (5 << 3) | 0x040 | 0x100 | 0x200 };
        assert_eq!(flags.animation_rotation(), 3);
        assert_eq!(flags.animation_speed(), 5);
        assert!(flags.animation_enabled());
        assert!(flags.use_alpha_map());
        assert!(flags.alpha_map_compressed());
        assert!(!flags.overbright());
        assert!(!flags.use_cube_map_reflection());
    }
}
