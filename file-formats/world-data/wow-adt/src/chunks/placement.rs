//! Object placements of a tile.
//!
//! - **MDDF**: M2 doodads, named through MMID into MMDX
//! - **MODF**: WMOs, named through MWID into MWMO

use binrw::{BinRead, BinWrite};
use wow_data::primitives::{BoundingBox, C3Vector};

/// Scale value stored for a factor of 1.0.
pub const SCALE_ONE: u16 = 1024;

/// M2 doodad placement (36 bytes).
///
/// ```text
/// Offset | Size | Field
/// -------|------|----------
/// 0x00   |  4   | name_id   (index into MMID)
/// 0x04   |  4   | unique_id
/// 0x08   | 12   | position
/// 0x14   | 12   | rotation  (degrees)
/// 0x20   |  2   | scale     (1024 = 1.0)
/// 0x22   |  2   | flags
/// ```
///
/// Reference: <https://wowdev.wiki/ADT/v18#MDDF_chunk>
#[derive(Debug, Clone, Copy, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct DoodadPlacement {
    pub name_id: u32,
    /// Unique across every tile the client has loaded
    pub unique_id: u32,
    pub position: C3Vector,
    pub rotation: C3Vector,
    pub scale: u16,
    pub flags: u16,
}

impl Default for DoodadPlacement {
    fn default() -> Self {
        Self {
            name_id: 0,
            unique_id: 0,
            position: C3Vector::origin(),
            rotation: C3Vector::origin(),
            scale: SCALE_ONE,
            flags: 0,
        }
    }
}

impl DoodadPlacement {
    pub const SIZE: usize = 36;
    /// `name_id` is a file data id rather than an MMID index (Legion+)
    pub const NAME_IS_FILE_ID: u16 = 0x40;

    /// Scale as a factor (1024 → 1.0).
    pub fn scale_factor(&self) -> f32 {
        f32::from(self.scale) / f32::from(SCALE_ONE)
    }

    pub fn name_is_file_id(&self) -> bool {
        self.flags & Self::NAME_IS_FILE_ID != 0
    }
}

/// WMO placement (64 bytes).
///
/// Reference: <https://wowdev.wiki/ADT/v18#MODF_chunk>
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct WmoPlacement {
    /// Index into MWID
    pub name_id: u32,
    pub unique_id: u32,
    pub position: C3Vector,
    pub rotation: C3Vector,
    /// World space bounds of the placed object
    pub extents: BoundingBox,
    pub flags: u16,
    pub doodad_set: u16,
    pub name_set: u16,
    /// Unused before Legion, where 1024 = 1.0
    pub scale: u16,
}

impl WmoPlacement {
    pub const SIZE: usize = 64;
    pub const DESTROYABLE: u16 = 0x1;
    /// `name_id` is a file data id rather than an MWID index (Legion+)
    pub const NAME_IS_FILE_ID: u16 = 0x8;

    pub fn name_is_file_id(&self) -> bool {
        self.flags & Self::NAME_IS_FILE_ID != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::BinReaderExt;
    use std::io::Cursor;
    use wow_data::chunk::brw_payload;

    #[test]
    fn doodad_layout() {
        let placement = DoodadPlacement {
            name_id: 2,
            unique_id: 0xABCD,
            position: C3Vector::new(1.0, 2.0, 3.0),
            scale: 2048,
            flags: 0x40,
            ..DoodadPlacement::default()
        };
        let bytes = brw_payload(&[placement]).unwrap();
        assert_eq!(bytes.len(), DoodadPlacement::SIZE);
        assert_eq!(&bytes[0x20..0x24], &[0x00, 0x08, 0x40, 0x00]);
        assert_eq!(placement.scale_factor(), 2.0);
        assert!(placement.name_is_file_id());

        let back: DoodadPlacement = Cursor::new(bytes).read_le().unwrap();
        assert_eq!(back, placement);
    }

    #[test]
    fn wmo_layout() {
        let placement = WmoPlacement {
            extents: BoundingBox::new(
                C3Vector::new(-1.0, -1.0, -1.0),
                C3Vector::new(1.0, 1.0, 1.0),
            ),
            doodad_set: 1,
            ..WmoPlacement::default()
        };
        let bytes = brw_payload(&[placement]).unwrap();
        assert_eq!(bytes.len(), WmoPlacement::SIZE);
        assert_eq!(&bytes[0x3A..0x3C], &[1, 0]);
    }
}
