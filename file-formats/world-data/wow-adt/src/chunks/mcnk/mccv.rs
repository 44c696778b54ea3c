use binrw::{BinRead, BinWrite};

/// One vertex color, BGRA. 0x7F in a color channel is neutral.
///
/// Used by MCCV (tinting, WotLK+) and MCLV (baked lighting, Cataclysm+).
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct VertexColor {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Default for VertexColor {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl VertexColor {
    pub const NEUTRAL: Self = Self {
        b: 0x7F,
        g: 0x7F,
        r: 0x7F,
        a: 0xFF,
    };

    /// Color multipliers, 1.0 for a neutral channel.
    pub fn multipliers(&self) -> [f32; 3] {
        [
            f32::from(self.r) / 127.0,
            f32::from(self.g) / 127.0,
            f32::from(self.b) / 127.0,
        ]
    }
}
