//! MCNK header (128 bytes).
//!
//! **Offsets are relative to the start of the MCNK chunk**, i.e. they
//! include its 8-byte chunk header.

use binrw::{BinRead, BinWrite};
use wow_data::primitives::C3Vector;

/// MCNK flags, raw so bits without a name survive a round trip.
///
/// Reference: <https://wowdev.wiki/ADT/v18#MCNK_chunk>
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct McnkFlags {
    pub value: u32,
}

impl McnkFlags {
    pub const HAS_MCSH: u32 = 0x1;
    pub const IMPASS: u32 = 0x2;
    pub const LQ_RIVER: u32 = 0x4;
    pub const LQ_OCEAN: u32 = 0x8;
    pub const LQ_MAGMA: u32 = 0x10;
    pub const LQ_SLIME: u32 = 0x20;
    pub const HAS_MCCV: u32 = 0x40;
    pub const DO_NOT_FIX_ALPHA_MAP: u32 = 0x8000;
    pub const HIGH_RES_HOLES: u32 = 0x10000;

    pub const fn new(value: u32) -> Self {
        Self { value }
    }

    pub fn contains(&self, bits: u32) -> bool {
        self.value & bits == bits
    }

    /// Shadow map (MCSH) present
    pub fn has_mcsh(&self) -> bool {
        self.contains(Self::HAS_MCSH)
    }

    pub fn impassable(&self) -> bool {
        self.contains(Self::IMPASS)
    }

    /// Any of the four legacy liquid kinds.
    pub fn has_liquid(&self) -> bool {
        self.value & (Self::LQ_RIVER | Self::LQ_OCEAN | Self::LQ_MAGMA | Self::LQ_SLIME) != 0
    }

    /// Vertex colors (MCCV) present
    pub fn has_mccv(&self) -> bool {
        self.contains(Self::HAS_MCCV)
    }

    /// Alpha maps are a full 64×64 instead of 63×63 with a copied edge
    pub fn do_not_fix_alpha_map(&self) -> bool {
        self.contains(Self::DO_NOT_FIX_ALPHA_MAP)
    }

    /// The height and normal offsets hold a 64-bit hole mask instead
    pub fn high_res_holes(&self) -> bool {
        self.contains(Self::HIGH_RES_HOLES)
    }
}

/// The fixed part of a map chunk.
///
/// ```text
/// 0x00 flags          0x04 index_x        0x08 index_y       0x0C n_layers
/// 0x10 n_doodad_refs  0x14 ofs_height     0x18 ofs_normal    0x1C ofs_layer
/// 0x20 ofs_refs       0x24 ofs_alpha      0x28 size_alpha    0x2C ofs_shadow
/// 0x30 size_shadow    0x34 area_id        0x38 n_map_obj_refs
/// 0x3C holes_low_res  0x3E unknown_but_used
/// 0x40 pred_tex[16]   0x50 no_effect_doodad[8]
/// 0x58 ofs_snd_emitters 0x5C n_snd_emitters 0x60 ofs_liquid  0x64 size_liquid
/// 0x68 position       0x74 ofs_mccv       0x78 ofs_mclv      0x7C unused
/// ```
///
/// The sub-chunk offsets, `n_layers` and the alpha, shadow and liquid sizes
/// are recomputed when the chunk is written. Everything else is written as
/// stored, `unknown_but_used` included.
#[derive(Debug, Clone, Copy, Default, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct McnkHeader {
    pub flags: McnkFlags,
    pub index_x: u32,
    pub index_y: u32,
    pub n_layers: u32,
    pub n_doodad_refs: u32,
    /// `ofs_height` and `ofs_normal`, or the high resolution hole mask
    pub multipurpose_field: [u8; 8],
    pub ofs_layer: u32,
    pub ofs_refs: u32,
    pub ofs_alpha: u32,
    pub size_alpha: u32,
    pub ofs_shadow: u32,
    pub size_shadow: u32,
    pub area_id: u32,
    pub n_map_obj_refs: u32,
    pub holes_low_res: u16,
    pub unknown_but_used: u16,
    /// Low quality texture map, 8×8 two-bit layer indices
    pub pred_tex: [u8; 16],
    /// 8×8 bits, doodads disabled where set
    pub no_effect_doodad: [u8; 8],
    pub ofs_snd_emitters: u32,
    pub n_snd_emitters: u32,
    pub ofs_liquid: u32,
    /// Includes the MCLQ chunk header; 0 or 8 when there is no liquid
    pub size_liquid: u32,
    pub position: C3Vector,
    pub ofs_mccv: u32,
    /// Cataclysm+
    pub ofs_mclv: u32,
    pub unused: u32,
}

impl McnkHeader {
    pub const SIZE: usize = 128;

    pub fn ofs_height(&self) -> u32 {
        let [a, b, c, d, ..] = self.multipurpose_field;
        u32::from_le_bytes([a, b, c, d])
    }

    pub fn ofs_normal(&self) -> u32 {
        let [.., a, b, c, d] = self.multipurpose_field;
        u32::from_le_bytes([a, b, c, d])
    }

    pub fn set_sub_offsets(&mut self, ofs_height: u32, ofs_normal: u32) {
        self.multipurpose_field[..4].copy_from_slice(&ofs_height.to_le_bytes());
        self.multipurpose_field[4..].copy_from_slice(&ofs_normal.to_le_bytes());
    }

    /// The 8×8 hole mask, when [`McnkFlags::high_res_holes`] is set.
    pub fn holes_high_res(&self) -> Option<u64> {
        self.flags
            .high_res_holes()
            .then(|| u64::from_le_bytes(self.multipurpose_field))
    }

    /// Whether the 4×4 low resolution hole at (`x`, `y`) is cut.
    pub fn is_hole_low_res(&self, x: usize, y: usize) -> bool {
        x < 4 && y < 4 && self.holes_low_res & (1 << (y * 4 + x)) != 0
    }

    /// Two-bit index of the dominant layer at cell (`x`, `y`) of the 8×8 grid.
    pub fn pred_texture(&self, x: usize, y: usize) -> Option<u8> {
        if x >= 8 || y >= 8 {
            return None;
        }
        let bit = (y * 8 + x) * 2;
        Some((self.pred_tex[bit / 8] >> (bit % 8)) & 0b11)
    }

    pub fn is_no_effect_doodad(&self, x: usize, y: usize) -> bool {
        x < 8 && y < 8 && self.no_effect_doodad[y] & (1 << x) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wow_data::chunk::brw_payload;

    #[test]
    fn header_is_128_bytes() {
        let bytes = brw_payload(&[McnkHeader::default()]).unwrap();
        assert_eq!(bytes.len(), McnkHeader::SIZE);
    }

    #[test]
    fn fields_land_at_their_offsets() {
        let mut header = McnkHeader {
            index_x: 3,
            area_id: 12,
            unknown_but_used: 0xBEEF,
            size_liquid: 8,
            ofs_mclv: 0x77,
            ..McnkHeader::default()
        };
        header.set_sub_offsets(0x88, 0x2CC);
        let bytes = brw_payload(&[header]).unwrap();
        assert_eq!(&bytes[0x04..0x08], &3u32.to_le_bytes());
        assert_eq!(&bytes[0x14..0x18], &0x88u32.to_le_bytes());
        assert_eq!(&bytes[0x18..0x1C], &0x2CCu32.to_le_bytes());
        assert_eq!(&bytes[0x34..0x38], &12u32.to_le_bytes());
        assert_eq!(&bytes[0x3E..0x40], &0xBEEFu16.to_le_bytes());
        assert_eq!(&bytes[0x64..0x68], &8u32.to_le_bytes());
        assert_eq!(&bytes[0x78..0x7C], &0x77u32.to_le_bytes());
        assert_eq!(header.ofs_height(), 0x88);
        assert_eq!(header.ofs_normal(), 0x2CC);
        assert_eq!(header.holes_high_res(), None);
    }

    #[test]
    fn hole_and_texture_maps() {
        let mut header = McnkHeader {
            holes_low_res: 0b0010_0000,
            ..McnkHeader::default()
        };
        header.pred_tex[0] = 0b1110_0100;
        header.no_effect_doodad[2] = 0b1000_0000;
        assert!(header.is_hole_low_res(1, 1));
        assert!(!header.is_hole_low_res(0, 0));
        assert_eq!(header.pred_texture(1, 0), Some(1));
        assert_eq!(header.pred_texture(3, 0), Some(3));
        assert_eq!(header.pred_texture(8, 0), None);
        assert!(header.is_no_effect_doodad(7, 2));

        header.flags = McnkFlags::new(McnkFlags::HIGH_RES_HOLES);
        header.multipurpose_field = [0xFF, 0, 0, 0, 0, 0, 0, 0x80];
        assert_eq!(header.holes_high_res(), Some(0x8000_0000_0000_00FF));
    }
}
