use binrw::{BinRead, BinWrite};

/// One MCNR normal, components scaled so 127 is 1.0.
///
/// Stored X, Z, Y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct VertexNormal {
    pub x: i8,
    pub z: i8,
    pub y: i8,
}

impl VertexNormal {
    pub const UP: Self = Self { x: 0, z: 127, y: 0 };

    pub fn to_unit(self) -> [f32; 3] {
        [
            f32::from(self.x) / 127.0,
            f32::from(self.y) / 127.0,
            f32::from(self.z) / 127.0,
        ]
    }
}

/// MCNR - 145 normals followed by 13 bytes of padding.
///
/// Up to WotLK the chunk header declares 435 bytes and the padding sits
/// after the chunk; later files count it in. `padding_in_size` records
/// which of the two this chunk used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McnrChunk {
    pub normals: Vec<VertexNormal>,
    pub padding: Vec<u8>,
    pub padding_in_size: bool,
}

impl Default for McnrChunk {
    fn default() -> Self {
        Self {
            normals: vec![VertexNormal::UP; super::VERTICES_PER_CHUNK],
            padding: vec![0; Self::PADDING],
            padding_in_size: false,
        }
    }
}

impl McnrChunk {
    pub const NORMALS_SIZE: usize = super::VERTICES_PER_CHUNK * 3;
    pub const PADDING: usize = 13;

    /// Size written to the chunk header.
    pub fn declared_size(&self) -> usize {
        self.normals.len() * 3 + if self.padding_in_size { self.padding.len() } else { 0 }
    }
}
