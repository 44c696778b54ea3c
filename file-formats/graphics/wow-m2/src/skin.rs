//! Skin profiles: the level-of-detail selection of vertices, triangles and
//! draw batches.
//!
//! Up to TBC the profiles are embedded in the root file. From WotLK on each
//! lives in its own `<model>NN.skin` file that starts with `SKIN`, with
//! offsets relative to the start of that file.

use std::io::Cursor;

use log::trace;
use wow_data::error::Result as WDResult;
use wow_data::lookup::{check_index, check_u16};
use wow_data::prelude::*;
use wow_data::types::expect_magic;
use wow_data_derive::{VWowHeaderR, WowHeaderR, WowHeaderW};

use crate::M2_ALIGN;
use crate::chunks::{M2Record, TrackContext, check_layout};

pub const SKIN_MAGIC: MagicStr = *b"SKIN";

/// Sort data added to submeshes in TBC.
#[derive(Debug, Clone, Copy, PartialEq, Default, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2SkinSectionSort {
    #[default]
    None,

    #[wow_data(read_if = version >= ClientVersion::TBC)]
    Some {
        sort_center: C3Vector,
        sort_radius: f32,
    },
}

/// A submesh: a vertex and triangle range drawn with one set of bones.
#[derive(Debug, Clone, Copy, PartialEq, Default, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2SkinSection {
    pub section_id: u16,
    /// High bits of `index_start` for meshes past 65535 indices
    pub level: u16,
    pub vertex_start: u16,
    pub vertex_count: u16,
    pub index_start: u16,
    pub index_count: u16,
    pub bone_count: u16,
    pub bone_combo_index: u16,
    pub bone_influences: u16,
    pub center_bone_index: u16,
    pub center_position: C3Vector,
    #[wow_data(versioned)]
    pub sort: M2SkinSectionSort,
}

impl M2SkinSection {
    pub fn first_index(&self) -> usize {
        (usize::from(self.level) << 16) + usize::from(self.index_start)
    }
}

/// A draw call (texture unit) of a skin profile, 24 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, WowHeaderR, WowHeaderW)]
pub struct M2Batch {
    pub flags: u8,
    pub priority_plane: i8,
    pub shader_id: u16,
    pub skin_section_index: u16,
    pub geoset_index: u16,
    /// `0xFFFF` for none
    pub color_index: u16,
    pub material_index: u16,
    pub material_layer: u16,
    pub texture_count: u16,
    pub texture_combo_index: u16,
    pub texture_coord_combo_index: u16,
    pub texture_weight_combo_index: u16,
    pub texture_transform_combo_index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, WowHeaderR, WowHeaderW)]
pub struct M2ShadowBatch {
    pub flags: u8,
    pub flags2: u8,
    pub unknown: u16,
    pub submesh_id: u16,
    pub texture_id: u16,
    pub color_id: u16,
    pub transparency_id: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2ShadowBatches {
    None,

    #[wow_data(read_if = version >= ClientVersion::Cataclysm)]
    Some(WowArray<M2ShadowBatch>),
}

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2SkinProfileHeader {
    /// Indices into the model's vertex array
    pub vertices: WowArray<u16>,
    /// Triangle list, indices into `vertices`
    pub indices: WowArray<u16>,
    pub bones: WowArray<[u8; 4]>,
    pub submeshes: WowArray<M2SkinSection>,
    pub batches: WowArray<M2Batch>,
    pub bone_count_max: u32,
    #[wow_data(versioned)]
    pub shadow_batches: M2ShadowBatches,
}

impl M2SkinProfileHeader {
    /// A header with empty arrays, used to size the fixed part.
    pub fn empty(version: ClientVersion) -> Self {
        Self {
            vertices: WowArray::empty(),
            indices: WowArray::empty(),
            bones: WowArray::empty(),
            submeshes: WowArray::empty(),
            batches: WowArray::empty(),
            bone_count_max: 0,
            shadow_batches: if version >= ClientVersion::Cataclysm {
                M2ShadowBatches::Some(WowArray::empty())
            } else {
                M2ShadowBatches::None
            },
        }
    }
}

/// Sizes of the root file tables a skin profile refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkinTargets {
    pub vertices: usize,
    pub materials: usize,
    pub colors: usize,
    pub texture_lookup: usize,
    pub transparency_lookup: usize,
    pub texture_transform_lookup: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct M2SkinProfile {
    pub vertices: Vec<u16>,
    pub indices: Vec<u16>,
    pub bones: Vec<[u8; 4]>,
    pub submeshes: Vec<M2SkinSection>,
    pub batches: Vec<M2Batch>,
    pub bone_count_max: u32,
    /// Present from Cataclysm on
    pub shadow_batches: Option<Vec<M2ShadowBatch>>,
}

impl M2SkinProfile {
    pub fn new(version: ClientVersion) -> Self {
        Self {
            shadow_batches: (version >= ClientVersion::Cataclysm).then(Vec::new),
            ..Self::default()
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check every reference of the profile, internal and into the root.
    pub fn validate(&self, targets: &SkinTargets) -> WDResult<()> {
        for &vertex in &self.vertices {
            check_index("skin.vertices", u32::from(vertex), targets.vertices)?;
        }
        for &index in &self.indices {
            check_index("skin.indices", u32::from(index), self.vertices.len())?;
        }
        for section in &self.submeshes {
            let vertex_end = u32::from(section.vertex_start) + u32::from(section.vertex_count);
            if section.vertex_count > 0 {
                check_index("skin.submesh.vertices", vertex_end - 1, self.vertices.len())?;
            }
            let index_end = section.first_index() + usize::from(section.index_count);
            if section.index_count > 0 {
                check_index(
                    "skin.submesh.indices",
                    (index_end - 1) as u32,
                    self.indices.len(),
                )?;
            }
        }
        for batch in &self.batches {
            check_index(
                "skin.batch.skin_section_index",
                u32::from(batch.skin_section_index),
                self.submeshes.len(),
            )?;
            check_u16("skin.batch.material_index", batch.material_index, targets.materials)?;
            check_u16("skin.batch.color_index", batch.color_index, targets.colors)?;
            check_u16(
                "skin.batch.texture_combo_index",
                batch.texture_combo_index,
                targets.texture_lookup,
            )?;
            check_u16(
                "skin.batch.texture_weight_combo_index",
                batch.texture_weight_combo_index,
                targets.transparency_lookup,
            )?;
            check_u16(
                "skin.batch.texture_transform_combo_index",
                batch.texture_transform_combo_index,
                targets.texture_transform_lookup,
            )?;
        }
        Ok(())
    }
}

impl M2Record for M2SkinProfile {
    type Header = M2SkinProfileHeader;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2SkinProfileHeader,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        Ok(Self {
            vertices: header.vertices.wow_read_to_vec(reader)?,
            indices: header.indices.wow_read_to_vec(reader)?,
            bones: header.bones.wow_read_to_vec(reader)?,
            submeshes: header.submeshes.v_wow_read_to_vec(reader, ctx.version)?,
            batches: header.batches.wow_read_to_vec(reader)?,
            bone_count_max: header.bone_count_max,
            shadow_batches: match &header.shadow_batches {
                M2ShadowBatches::Some(array) => Some(array.wow_read_to_vec(reader)?),
                M2ShadowBatches::None => None,
            },
        })
    }

    fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<M2SkinProfileHeader> {
        let sorted = version >= ClientVersion::TBC;
        check_layout(
            self.submeshes
                .iter()
                .all(|s| matches!(s.sort, M2SkinSectionSort::Some { .. }) == sorted),
            "skin submeshes",
            version,
        )?;
        let shadow_batches = match (&self.shadow_batches, version >= ClientVersion::Cataclysm) {
            (Some(batches), true) => M2ShadowBatches::Some(section.push_array(batches, M2_ALIGN)?),
            (None, false) => M2ShadowBatches::None,
            (None, true) => M2ShadowBatches::Some(WowArray::empty()),
            (Some(_), false) => {
                check_layout(false, "skin shadow batches", version)?;
                M2ShadowBatches::None
            }
        };
        Ok(M2SkinProfileHeader {
            vertices: section.push_array(&self.vertices, M2_ALIGN)?,
            indices: section.push_array(&self.indices, M2_ALIGN)?,
            bones: section.push_array(&self.bones, M2_ALIGN)?,
            submeshes: section.push_array(&self.submeshes, M2_ALIGN)?,
            batches: section.push_array(&self.batches, M2_ALIGN)?,
            bone_count_max: self.bone_count_max,
            shadow_batches,
        })
    }
}

/// A `.skin` file (WotLK+).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct M2SkinFile {
    pub profile: M2SkinProfile,
}

impl M2SkinFile {
    pub fn new(profile: M2SkinProfile) -> Self {
        Self { profile }
    }

    pub fn read<R: Read + Seek>(reader: &mut R, version: ClientVersion) -> WDResult<Self> {
        expect_magic(reader, &SKIN_MAGIC)?;
        let header: M2SkinProfileHeader = reader.wow_read_versioned(version)?;
        trace!(
            "skin: {} vertices, {} indices, {} submeshes, {} batches",
            header.vertices.count,
            header.indices.count,
            header.submeshes.count,
            header.batches.count
        );
        let profile =
            M2SkinProfile::read_from_header(reader, &header, &TrackContext::new(version))?;
        Ok(Self { profile })
    }

    pub fn from_bytes(bytes: &[u8], version: ClientVersion) -> WDResult<Self> {
        Self::read(&mut Cursor::new(bytes), version)
    }

    pub fn write<W: Write>(&self, writer: &mut W, version: ClientVersion) -> WDResult<()> {
        let header_end = SKIN_MAGIC.len() + M2SkinProfileHeader::empty(version).wow_size();
        let mut section = DataSection::new(header_end as u64);
        let header = self.profile.write_header(&mut section, version)?;
        writer.wow_write(&SKIN_MAGIC)?;
        writer.wow_write(&header)?;
        section.write_to(writer)
    }

    pub fn to_bytes(&self, version: ClientVersion) -> WDResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out, version)?;
        Ok(out)
    }
}
