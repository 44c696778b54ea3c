//! Fixed-layout records stored in WMO chunks.

use std::io::{Seek, Write};

use binrw::{BinRead, BinWrite};
use wow_data::chunk::{ChunkTag, ChunkWriter};
use wow_data::chunk_order::{AnchoredChunk, Anchors, anchored_after};
use wow_data::error::WowDataError;
use wow_data::primitives::{BoundingBox, C3Vector, Color, Plane, Quaternion};

use crate::flags::{WmoGroupFlags, WmoMaterialFlags, WmoRootFlags};

pub const MVER: ChunkTag = ChunkTag::new(b"MVER");
pub const MOHD: ChunkTag = ChunkTag::new(b"MOHD");
pub const MOTX: ChunkTag = ChunkTag::new(b"MOTX");
pub const MOMT: ChunkTag = ChunkTag::new(b"MOMT");
pub const MOGN: ChunkTag = ChunkTag::new(b"MOGN");
pub const MOGI: ChunkTag = ChunkTag::new(b"MOGI");
pub const MOSB: ChunkTag = ChunkTag::new(b"MOSB");
pub const MOPV: ChunkTag = ChunkTag::new(b"MOPV");
pub const MOPT: ChunkTag = ChunkTag::new(b"MOPT");
pub const MOPR: ChunkTag = ChunkTag::new(b"MOPR");
pub const MOVV: ChunkTag = ChunkTag::new(b"MOVV");
pub const MOVB: ChunkTag = ChunkTag::new(b"MOVB");
pub const MOLT: ChunkTag = ChunkTag::new(b"MOLT");
pub const MODS: ChunkTag = ChunkTag::new(b"MODS");
pub const MODN: ChunkTag = ChunkTag::new(b"MODN");
pub const MODD: ChunkTag = ChunkTag::new(b"MODD");
pub const MFOG: ChunkTag = ChunkTag::new(b"MFOG");
pub const MCVP: ChunkTag = ChunkTag::new(b"MCVP");

pub const MOGP: ChunkTag = ChunkTag::new(b"MOGP");
pub const MOPY: ChunkTag = ChunkTag::new(b"MOPY");
pub const MOVI: ChunkTag = ChunkTag::new(b"MOVI");
pub const MOVT: ChunkTag = ChunkTag::new(b"MOVT");
pub const MONR: ChunkTag = ChunkTag::new(b"MONR");
pub const MOTV: ChunkTag = ChunkTag::new(b"MOTV");
pub const MOBA: ChunkTag = ChunkTag::new(b"MOBA");
pub const MOLR: ChunkTag = ChunkTag::new(b"MOLR");
pub const MODR: ChunkTag = ChunkTag::new(b"MODR");
pub const MOBN: ChunkTag = ChunkTag::new(b"MOBN");
pub const MOBR: ChunkTag = ChunkTag::new(b"MOBR");
pub const MOCV: ChunkTag = ChunkTag::new(b"MOCV");
pub const MLIQ: ChunkTag = ChunkTag::new(b"MLIQ");

/// Root chunks this crate decodes.
pub const ROOT_CHUNKS: [ChunkTag; 18] = [
    MVER, MOHD, MOTX, MOMT, MOGN, MOGI, MOSB, MOPV, MOPT, MOPR, MOVV, MOVB, MOLT, MODS, MODN, MODD,
    MFOG, MCVP,
];

/// Group sub-chunks this crate decodes.
pub const GROUP_CHUNKS: [ChunkTag; 12] = [
    MOPY, MOVI, MOVT, MONR, MOTV, MOBA, MOLR, MODR, MOBN, MOBR, MOCV, MLIQ,
];

/// Version stored in MVER of every supported WMO file.
pub const WMO_VERSION: u32 = 17;

/// MOHD - root header
#[derive(Debug, Clone, Copy, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct Mohd {
    pub n_materials: u32,
    pub n_groups: u32,
    pub n_portals: u32,
    pub n_lights: u32,
    pub n_models: u32,
    pub n_doodads: u32,
    pub n_sets: u32,
    pub ambient_color: Color,
    /// Row in WMOAreaTable.dbc
    pub id: u32,
    pub bounding_box: BoundingBox,
    pub flags: u32,
}

impl Default for Mohd {
    fn default() -> Self {
        Self {
            n_materials: 0,
            n_groups: 0,
            n_portals: 0,
            n_lights: 0,
            n_models: 0,
            n_doodads: 0,
            n_sets: 0,
            ambient_color: Color::WHITE,
            id: 0,
            bounding_box: BoundingBox::zero(),
            flags: 0,
        }
    }
}

impl Mohd {
    pub const SIZE: usize = 64;

    pub fn root_flags(&self) -> WmoRootFlags {
        WmoRootFlags::from_bits_retain(self.flags)
    }
}

/// MOMT - material, 64 bytes
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MomtEntry {
    pub flags: u32,
    pub shader: u32,
    pub blend_mode: u32,
    /// Offset into MOTX
    pub texture_1: u32,
    pub emissive_color: Color,
    pub sidn_emissive_color: Color,
    /// Offset into MOTX
    pub texture_2: u32,
    pub diffuse_color: Color,
    /// Row in TerrainType.dbc
    pub terrain_type: u32,
    /// Offset into MOTX
    pub texture_3: u32,
    pub color_3: Color,
    pub texture_3_flags: u32,
    /// Filled in by the client at load time
    pub runtime_data: [u32; 4],
}

impl MomtEntry {
    pub const SIZE: usize = 64;

    pub fn material_flags(&self) -> WmoMaterialFlags {
        WmoMaterialFlags::from_bits_retain(self.flags)
    }
}

/// MOGI - group information, 32 bytes
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MogiEntry {
    pub flags: u32,
    pub bounding_box: BoundingBox,
    /// Offset into MOGN, -1 for none
    pub name_offset: i32,
}

impl MogiEntry {
    pub const SIZE: usize = 32;

    pub fn group_flags(&self) -> WmoGroupFlags {
        WmoGroupFlags::from_bits_retain(self.flags)
    }
}

/// MOPT - portal, 20 bytes
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MoptEntry {
    /// First vertex in MOPV
    pub start_vertex: u16,
    pub vertex_count: u16,
    pub plane: Plane,
}

impl MoptEntry {
    pub const SIZE: usize = 20;
}

/// MOPR - portal to group relation, 8 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MoprEntry {
    pub portal_index: u16,
    pub group_index: u16,
    /// -1 behind the portal plane, +1 in front
    pub side: i16,
    pub padding: u16,
}

impl MoprEntry {
    pub const SIZE: usize = 8;
}

/// MOVB - visible block, 4 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MovbEntry {
    pub start_vertex: u16,
    pub vertex_count: u16,
}

/// MOLT - light, 48 bytes
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MoltEntry {
    pub light_type: u8,
    pub light_type_2: u8,
    pub use_attenuation: u8,
    pub padding: u8,
    pub color: Color,
    pub position: C3Vector,
    pub intensity: f32,
    pub attenuation_start: f32,
    pub attenuation_end: f32,
    pub unknown: [f32; 4],
}

impl MoltEntry {
    pub const SIZE: usize = 48;
}

/// MODS - doodad set, 32 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct ModsEntry {
    pub name: [u8; 20],
    /// First doodad in MODD
    pub start_doodad: u32,
    pub doodad_count: u32,
    pub padding: u32,
}

impl ModsEntry {
    pub const SIZE: usize = 32;

    /// One past the last MODD index of the set, or the MODS lookup error
    /// when the range does not fit in 32 bits.
    pub fn end_doodad(&self, doodads: usize) -> Result<u32, WowDataError> {
        self.start_doodad
            .checked_add(self.doodad_count)
            .ok_or_else(|| WowDataError::lookup("MODS.doodads", self.start_doodad, doodads))
    }

    /// Build a set, truncating the name to 19 bytes plus terminator.
    pub fn new(name: &str, start_doodad: u32, doodad_count: u32) -> Self {
        let mut raw = [0_u8; 20];
        let len = name.len().min(19);
        raw[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self {
            name: raw,
            start_doodad,
            doodad_count,
            padding: 0,
        }
    }

    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(20);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// MODD - doodad instance, 40 bytes
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct ModdEntry {
    /// Bits 0-23 name offset into MODN, bits 24-31 flags
    pub name_and_flags: u32,
    pub position: C3Vector,
    pub rotation: Quaternion,
    pub scale: f32,
    pub color: Color,
}

impl ModdEntry {
    pub const SIZE: usize = 40;
    const NAME_MASK: u32 = 0x00FF_FFFF;

    pub fn name_offset(&self) -> u32 {
        self.name_and_flags & Self::NAME_MASK
    }

    pub fn flags(&self) -> u8 {
        (self.name_and_flags >> 24) as u8
    }

    pub fn set_name_offset(&mut self, offset: u32) {
        self.name_and_flags = (self.name_and_flags & !Self::NAME_MASK) | (offset & Self::NAME_MASK);
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.name_and_flags = (self.name_and_flags & Self::NAME_MASK) | (u32::from(flags) << 24);
    }
}

/// MFOG - fog volume, 48 bytes
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MfogEntry {
    pub flags: u32,
    pub position: C3Vector,
    pub small_radius: f32,
    pub large_radius: f32,
    pub end_dist: f32,
    pub start_factor: f32,
    pub color: Color,
    pub underwater_end_dist: f32,
    pub underwater_start_factor: f32,
    pub underwater_color: Color,
}

impl MfogEntry {
    pub const SIZE: usize = 48;
}

// Group file records

/// MOGP header, 68 bytes, followed by the group's sub-chunks
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MogpHeader {
    /// Offset into the root's MOGN
    pub group_name: u32,
    /// Offset into the root's MOGN
    pub descriptive_name: u32,
    pub flags: u32,
    pub bounding_box: BoundingBox,
    /// First relation in the root's MOPR
    pub portal_start: u16,
    pub portal_count: u16,
    pub trans_batch_count: u16,
    pub int_batch_count: u16,
    pub ext_batch_count: u16,
    pub batch_type_d: u16,
    /// Indices into the root's MFOG
    pub fog_ids: [u8; 4],
    pub liquid_type: u32,
    pub group_id: u32,
    pub unknown_1: u32,
    pub unknown_2: u32,
}

impl MogpHeader {
    pub const SIZE: usize = 68;

    pub fn group_flags(&self) -> WmoGroupFlags {
        WmoGroupFlags::from_bits_retain(self.flags)
    }
}

/// MOPY - per-triangle flags and material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MopyEntry {
    pub flags: u8,
    /// Index into MOMT, 0xFF for collision-only triangles
    pub material_id: u8,
}

impl MopyEntry {
    const NO_CAMERA_COLLIDE: u8 = 0x02;
    const DETAIL: u8 = 0x04;
    const COLLISION: u8 = 0x08;
    const RENDER: u8 = 0x20;

    /// Collision geometry that is never drawn.
    pub fn is_collision_only(&self) -> bool {
        self.material_id == 0xFF
    }

    /// Triangles the BSP tree references.
    pub fn is_collidable(&self) -> bool {
        self.flags & Self::COLLISION != 0
            || (self.flags & Self::RENDER != 0 && self.flags & Self::DETAIL == 0)
    }

    pub fn ignores_camera(&self) -> bool {
        self.flags & Self::NO_CAMERA_COLLIDE != 0
    }
}

/// MOBA - render batch, 24 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MobaEntry {
    pub bounding_box: [i16; 6],
    /// First index in MOVI
    pub start_index: u32,
    pub index_count: u16,
    pub min_index: u16,
    pub max_index: u16,
    pub flags: u8,
    /// Index into MOMT, 0xFF for collision-only batches
    pub material_id: u8,
}

impl MobaEntry {
    pub const SIZE: usize = 24;
}

/// MOBN - BSP node, 16 bytes
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MobnNode {
    pub plane_type: i16,
    /// Negative then positive child, -1 for none
    pub children: [i16; 2],
    pub face_count: u16,
    /// First entry in MOBR
    pub first_face: u32,
    pub distance: f32,
}

impl MobnNode {
    pub const SIZE: usize = 16;
}

/// Fixed part of MLIQ
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct MliqHeader {
    pub x_verts: u32,
    pub y_verts: u32,
    pub x_tiles: u32,
    pub y_tiles: u32,
    pub position: C3Vector,
    pub material_id: u16,
}

impl MliqHeader {
    pub const SIZE: usize = 30;
}

/// Write a known chunk, then every unknown chunk that followed it when read.
pub(crate) fn write_anchored<W: Write + Seek>(
    out: &mut ChunkWriter<W>,
    anchors: &mut Anchors,
    extras: &[AnchoredChunk],
    tag: ChunkTag,
    payload: &[u8],
) -> wow_data::error::Result<()> {
    out.write_chunk(tag, payload)?;
    let at = anchors.known(tag);
    for chunk in anchored_after(extras, at) {
        out.write_chunk(chunk.tag, &chunk.data)?;
    }
    Ok(())
}

/// Write the unknown chunks whose anchor never came up.
pub(crate) fn write_unplaced<W: Write + Seek>(
    out: &mut ChunkWriter<W>,
    anchors: &Anchors,
    extras: &[AnchoredChunk],
) -> wow_data::error::Result<()> {
    for extra in extras.iter().filter(|e| !anchors.placed(e)) {
        out.write_chunk(extra.chunk.tag, &extra.chunk.data)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use wow_data::chunk::brw_payload;

    fn encoded_len<T>(record: T) -> usize
    where
        T: BinWrite,
        for<'a> T::Args<'a>: Default,
    {
        brw_payload(&[record]).unwrap().len()
    }

    #[test]
    fn record_sizes() {
        assert_eq!(encoded_len(Mohd::default()), Mohd::SIZE);
        assert_eq!(encoded_len(MomtEntry::default()), MomtEntry::SIZE);
        assert_eq!(encoded_len(MogiEntry::default()), MogiEntry::SIZE);
        assert_eq!(encoded_len(MoptEntry::default()), MoptEntry::SIZE);
        assert_eq!(encoded_len(MoprEntry::default()), MoprEntry::SIZE);
        assert_eq!(encoded_len(MoltEntry::default()), MoltEntry::SIZE);
        assert_eq!(encoded_len(ModsEntry::default()), ModsEntry::SIZE);
        assert_eq!(encoded_len(ModdEntry::default()), ModdEntry::SIZE);
        assert_eq!(encoded_len(MfogEntry::default()), MfogEntry::SIZE);
        assert_eq!(encoded_len(MogpHeader::default()), MogpHeader::SIZE);
        assert_eq!(encoded_len(MobaEntry::default()), MobaEntry::SIZE);
        assert_eq!(encoded_len(MobnNode::default()), MobnNode::SIZE);
        assert_eq!(encoded_len(MliqHeader::default()), MliqHeader::SIZE);
    }

    #[test]
    fn doodad_name_and_flags_share_a_word() {
        let mut doodad = ModdEntry::default();
        doodad.set_name_offset(0x12_3456);
        doodad.set_flags(0xA5);
        assert_eq!(doodad.name_and_flags, 0xA512_3456);
        assert_eq!(doodad.name_offset(), 0x12_3456);
        assert_eq!(doodad.flags(), 0xA5);
    }

    #[test]
    fn portal_relation_layout() {
        let bytes = [0, 0, 5, 0, 0xFF, 0xFF, 0, 0];
        let relation = MoprEntry::read_le(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(relation.group_index, 5);
        assert_eq!(relation.side, -1);
    }

    #[test]
    fn doodad_set_names_are_truncated() {
        let set = ModsEntry::new("Set_$DefaultGlobal_With_A_Long_Name", 0, 3);
        assert_eq!(set.name().len(), 19);
        assert_eq!(ModsEntry::new("Set_1", 0, 0).name(), "Set_1");
    }
}
