use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderR, WowHeaderW};

use crate::chunks::attachment::M2AttachmentHeader;
use crate::chunks::bone::M2BoneHeader;
use crate::chunks::camera::M2CameraHeader;
use crate::chunks::color::M2ColorHeader;
use crate::chunks::event::M2EventHeader;
use crate::chunks::light::M2LightHeader;
use crate::chunks::particle_emitter::M2ParticleEmitterHeader;
use crate::chunks::ribbon_emitter::M2RibbonEmitterHeader;
use crate::chunks::texture::M2TextureHeader;
use crate::chunks::texture_transform::M2TextureTransformHeader;
use crate::chunks::track::M2TrackHeader;
use crate::chunks::{M2Material, M2Sequence, M2Vertex};
use crate::skin::M2SkinProfileHeader;

pub const MD20_MAGIC: MagicStr = *b"MD20";

bitflags::bitflags! {
    /// Global model flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, WowHeaderR, WowHeaderW)]
    #[wow_data(bitflags = u32)]
    pub struct M2ModelFlags: u32 {
        const TILT_X = 0x0001;
        const TILT_Y = 0x0002;
        const UNKNOWN_0x04 = 0x0004;
        /// The header carries `texture_combiner_combos` (WotLK+)
        const USE_TEXTURE_COMBINER_COMBOS = 0x0008;
        const UNKNOWN_0x10 = 0x0010;
        const LOAD_PHYS_DATA = 0x0020;
        const UNKNOWN_0x40 = 0x0040;
        const UNKNOWN_0x80 = 0x0080;
        const CAMERA_RELATED = 0x0100;
        const NEW_PARTICLE_RECORD = 0x0200;
        const UNKNOWN_0x400 = 0x0400;
        const TEXTURE_TRANSFORMS_USE_BONE_SEQUENCES = 0x0800;
    }
}

/// Fallbacks for animations missing from the model, up to TBC.
#[derive(Debug, Clone, Copy, PartialEq, Default, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2PlayableAnimationLookup {
    #[default]
    None,

    #[wow_data(read_if = version <= ClientVersion::TBC)]
    Some(WowArray<(i16, i16)>),
}

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2SkinProfiles {
    Embedded(WowArray<M2SkinProfileHeader>),

    #[wow_data(read_if = version >= ClientVersion::WotLK)]
    Count(u32),
}

impl M2SkinProfiles {
    pub fn count(&self) -> u32 {
        match *self {
            Self::Embedded(array) => array.count,
            Self::Count(count) => count,
        }
    }
}

/// Texture flipbooks, up to TBC. Never seen populated; kept as raw words.
#[derive(Debug, Clone, Copy, PartialEq, Default, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2TextureFlipbooks {
    #[default]
    None,

    #[wow_data(read_if = version <= ClientVersion::TBC)]
    Some(WowArray<u32>),
}

/// Present when the model sets
/// [`M2ModelFlags::USE_TEXTURE_COMBINER_COMBOS`] from WotLK on.
#[derive(Debug, Clone, Copy, PartialEq, Default, WowHeaderW)]
pub enum M2TextureCombinerCombos {
    #[default]
    None,
    Some(WowArray<u16>),
}

/// The fixed part of an MD20 payload.
#[derive(Debug, Clone, PartialEq, WowHeaderW)]
pub struct MD20Header {
    pub magic: MagicStr,
    pub version: u32,
    pub name: WowCharArray,
    pub flags: M2ModelFlags,
    pub global_sequences: WowArray<u32>,
    pub sequences: WowArray<M2Sequence>,
    pub sequence_lookup: WowArray<u16>,
    pub playable_animation_lookup: M2PlayableAnimationLookup,
    pub bones: WowArray<M2BoneHeader>,
    pub key_bone_lookup: WowArray<u16>,
    pub vertices: WowArray<M2Vertex>,
    pub skin_profiles: M2SkinProfiles,
    pub colors: WowArray<M2ColorHeader>,
    pub textures: WowArray<M2TextureHeader>,
    pub texture_weights: WowArray<M2TrackHeader<Fixed16>>,
    pub texture_flipbooks: M2TextureFlipbooks,
    pub texture_transforms: WowArray<M2TextureTransformHeader>,
    pub replaceable_texture_lookup: WowArray<u16>,
    pub materials: WowArray<M2Material>,
    pub bone_lookup: WowArray<u16>,
    pub texture_lookup: WowArray<u16>,
    pub texture_unit_lookup: WowArray<u16>,
    pub transparency_lookup: WowArray<u16>,
    pub texture_transform_lookup: WowArray<u16>,
    pub bounding_box: BoundingBox,
    pub bounding_sphere_radius: f32,
    pub collision_box: BoundingBox,
    pub collision_sphere_radius: f32,
    pub collision_triangles: WowArray<u16>,
    pub collision_vertices: WowArray<C3Vector>,
    pub collision_normals: WowArray<C3Vector>,
    pub attachments: WowArray<M2AttachmentHeader>,
    pub attachment_lookup: WowArray<u16>,
    pub events: WowArray<M2EventHeader>,
    pub lights: WowArray<M2LightHeader>,
    pub cameras: WowArray<M2CameraHeader>,
    pub camera_lookup: WowArray<u16>,
    pub ribbon_emitters: WowArray<M2RibbonEmitterHeader>,
    pub particle_emitters: WowArray<M2ParticleEmitterHeader>,
    pub texture_combiner_combos: M2TextureCombinerCombos,
}

impl MD20Header {
    /// A header with every array empty, laid out for `version`.
    pub fn empty(version: ClientVersion, flags: M2ModelFlags) -> Self {
        let old = version.is_pre_wotlk();
        Self {
            magic: MD20_MAGIC,
            version: version.m2_version(),
            name: WowArray::empty(),
            flags,
            global_sequences: WowArray::empty(),
            sequences: WowArray::empty(),
            sequence_lookup: WowArray::empty(),
            playable_animation_lookup: if old {
                M2PlayableAnimationLookup::Some(WowArray::empty())
            } else {
                M2PlayableAnimationLookup::None
            },
            bones: WowArray::empty(),
            key_bone_lookup: WowArray::empty(),
            vertices: WowArray::empty(),
            skin_profiles: if old {
                M2SkinProfiles::Embedded(WowArray::empty())
            } else {
                M2SkinProfiles::Count(0)
            },
            colors: WowArray::empty(),
            textures: WowArray::empty(),
            texture_weights: WowArray::empty(),
            texture_flipbooks: if old {
                M2TextureFlipbooks::Some(WowArray::empty())
            } else {
                M2TextureFlipbooks::None
            },
            texture_transforms: WowArray::empty(),
            replaceable_texture_lookup: WowArray::empty(),
            materials: WowArray::empty(),
            bone_lookup: WowArray::empty(),
            texture_lookup: WowArray::empty(),
            texture_unit_lookup: WowArray::empty(),
            transparency_lookup: WowArray::empty(),
            texture_transform_lookup: WowArray::empty(),
            bounding_box: BoundingBox::zero(),
            bounding_sphere_radius: 0.0,
            collision_box: BoundingBox::zero(),
            collision_sphere_radius: 0.0,
            collision_triangles: WowArray::empty(),
            collision_vertices: WowArray::empty(),
            collision_normals: WowArray::empty(),
            attachments: WowArray::empty(),
            attachment_lookup: WowArray::empty(),
            events: WowArray::empty(),
            lights: WowArray::empty(),
            cameras: WowArray::empty(),
            camera_lookup: WowArray::empty(),
            ribbon_emitters: WowArray::empty(),
            particle_emitters: WowArray::empty(),
            texture_combiner_combos: if has_combos(version, flags) {
                M2TextureCombinerCombos::Some(WowArray::empty())
            } else {
                M2TextureCombinerCombos::None
            },
        }
    }

    pub fn client_version(&self) -> Option<ClientVersion> {
        ClientVersion::from_m2_version(self.version)
    }
}

pub(crate) fn has_combos(version: ClientVersion, flags: M2ModelFlags) -> bool {
    version >= ClientVersion::WotLK && flags.contains(M2ModelFlags::USE_TEXTURE_COMBINER_COMBOS)
}

impl VWowHeaderR<ClientVersion> for MD20Header {
    /// Fails with [`WowDataError::VersionMismatch`] before any record is
    /// read when the stored version belongs to another client.
    fn wow_read<R: Read + Seek>(reader: &mut R, version: ClientVersion) -> WDResult<Self> {
        let start = reader.stream_position()?;
        let magic: MagicStr = reader.wow_read()?;
        if magic != MD20_MAGIC {
            return Err(WowDataError::bad_magic(&MD20_MAGIC, &magic, start));
        }
        let found: u32 = reader.wow_read()?;
        if ClientVersion::from_m2_version(found) != Some(version) {
            return Err(WowDataError::version_mismatch(
                format!("M2 version {} ({version})", version.m2_version()),
                format!("M2 version {found} at offset {:#x}", start + 4),
            ));
        }
        let name = reader.wow_read()?;
        let flags: M2ModelFlags = reader.wow_read()?;
        Ok(Self {
            magic,
            version: found,
            name,
            flags,
            global_sequences: reader.wow_read()?,
            sequences: reader.wow_read()?,
            sequence_lookup: reader.wow_read()?,
            playable_animation_lookup: reader.wow_read_versioned(version)?,
            bones: reader.wow_read()?,
            key_bone_lookup: reader.wow_read()?,
            vertices: reader.wow_read()?,
            skin_profiles: reader.wow_read_versioned(version)?,
            colors: reader.wow_read()?,
            textures: reader.wow_read()?,
            texture_weights: reader.wow_read()?,
            texture_flipbooks: reader.wow_read_versioned(version)?,
            texture_transforms: reader.wow_read()?,
            replaceable_texture_lookup: reader.wow_read()?,
            materials: reader.wow_read()?,
            bone_lookup: reader.wow_read()?,
            texture_lookup: reader.wow_read()?,
            texture_unit_lookup: reader.wow_read()?,
            transparency_lookup: reader.wow_read()?,
            texture_transform_lookup: reader.wow_read()?,
            bounding_box: reader.wow_read()?,
            bounding_sphere_radius: reader.wow_read()?,
            collision_box: reader.wow_read()?,
            collision_sphere_radius: reader.wow_read()?,
            collision_triangles: reader.wow_read()?,
            collision_vertices: reader.wow_read()?,
            collision_normals: reader.wow_read()?,
            attachments: reader.wow_read()?,
            attachment_lookup: reader.wow_read()?,
            events: reader.wow_read()?,
            lights: reader.wow_read()?,
            cameras: reader.wow_read()?,
            camera_lookup: reader.wow_read()?,
            ribbon_emitters: reader.wow_read()?,
            particle_emitters: reader.wow_read()?,
            texture_combiner_combos: if has_combos(version, flags) {
                M2TextureCombinerCombos::Some(reader.wow_read()?)
            } else {
                M2TextureCombinerCombos::None
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_case::test_case;

    #[test_case(ClientVersion::Classic, 0x144)]
    #[test_case(ClientVersion::TBC, 0x144)]
    #[test_case(ClientVersion::WotLK, 0x130)]
    #[test_case(ClientVersion::Cataclysm, 0x130)]
    fn header_size(version: ClientVersion, size: usize) {
        let header = MD20Header::empty(version, M2ModelFlags::empty());
        assert_eq!(header.wow_size(), size);
    }

    #[test]
    fn combos_follow_the_flag() {
        let flags = M2ModelFlags::USE_TEXTURE_COMBINER_COMBOS;
        let header = MD20Header::empty(ClientVersion::WotLK, flags);
        assert_eq!(header.wow_size(), 0x138);

        let mut bytes = Vec::new();
        bytes.wow_write(&header).unwrap();
        let back: MD20Header = Cursor::new(bytes)
            .wow_read_versioned(ClientVersion::WotLK)
            .unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn other_client_fails_at_the_header() {
        let mut bytes = Vec::new();
        bytes
            .wow_write(&MD20Header::empty(ClientVersion::TBC, M2ModelFlags::empty()))
            .unwrap();
        let err = Cursor::new(bytes)
            .wow_read_versioned::<ClientVersion, MD20Header>(ClientVersion::WotLK)
            .unwrap_err();
        assert!(matches!(err, WowDataError::VersionMismatch { .. }));
    }

    #[test]
    fn bad_magic() {
        let err = Cursor::new(b"MD21\x08\x01\0\0".to_vec())
            .wow_read_versioned::<ClientVersion, MD20Header>(ClientVersion::WotLK)
            .unwrap_err();
        assert!(matches!(err, WowDataError::BadMagic { offset: 0, .. }));
    }
}
