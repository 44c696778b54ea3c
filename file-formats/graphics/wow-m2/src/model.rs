//! The decoded contents of an MD20 payload.

use std::io::Cursor;

use glam::Vec3;
use log::{debug, trace};
use wow_data::error::Result as WDResult;
use wow_data::lookup::{check_all_u16, check_i16, check_index, check_u16};
use wow_data::prelude::*;

use crate::M2_ALIGN;
use crate::anim::M2AnimFile;
use crate::chunks::{
    M2Attachment, M2Bone, M2Camera, M2Color, M2Event, M2Light, M2Material, M2ParticleEmitter,
    M2RibbonEmitter, M2Sequence, M2Texture, M2TextureTransform, M2Track, M2Vertex, TrackContext,
    check_layout, load_records, read_records, write_records,
};
use crate::header::{
    M2ModelFlags, M2PlayableAnimationLookup, M2SkinProfiles, M2TextureCombinerCombos,
    M2TextureFlipbooks, MD20_MAGIC, MD20Header, has_combos,
};
use crate::skin::{M2SkinProfile, SkinTargets};

/// An M2 model without its sibling files.
#[derive(Debug, Clone, PartialEq)]
pub struct M2Model {
    pub version: ClientVersion,
    /// The number stored in the header. Several numbers map to the same
    /// client; the stored one is written back when it still matches.
    pub header_version: u32,
    pub name: String,
    pub flags: M2ModelFlags,
    pub global_sequences: Vec<u32>,
    pub sequences: Vec<M2Sequence>,
    pub sequence_lookup: Vec<u16>,
    /// Up to TBC
    pub playable_animation_lookup: Option<Vec<(i16, i16)>>,
    pub bones: Vec<M2Bone>,
    pub key_bone_lookup: Vec<u16>,
    pub vertices: Vec<M2Vertex>,
    /// Skin profiles stored in the root, up to TBC
    pub embedded_skins: Vec<M2SkinProfile>,
    /// Number of `.skin` files, from WotLK on
    pub skin_count: u32,
    pub colors: Vec<M2Color>,
    pub textures: Vec<M2Texture>,
    pub texture_weights: Vec<M2Track<Fixed16>>,
    /// Up to TBC
    pub texture_flipbooks: Option<Vec<u32>>,
    pub texture_transforms: Vec<M2TextureTransform>,
    pub replaceable_texture_lookup: Vec<u16>,
    pub materials: Vec<M2Material>,
    pub bone_lookup: Vec<u16>,
    pub texture_lookup: Vec<u16>,
    pub texture_unit_lookup: Vec<u16>,
    pub transparency_lookup: Vec<u16>,
    pub texture_transform_lookup: Vec<u16>,
    pub bounding_box: BoundingBox,
    pub bounding_sphere_radius: f32,
    pub collision_box: BoundingBox,
    pub collision_sphere_radius: f32,
    pub collision_triangles: Vec<u16>,
    pub collision_vertices: Vec<C3Vector>,
    pub collision_normals: Vec<C3Vector>,
    pub attachments: Vec<M2Attachment>,
    pub attachment_lookup: Vec<u16>,
    pub events: Vec<M2Event>,
    pub lights: Vec<M2Light>,
    pub cameras: Vec<M2Camera>,
    pub camera_lookup: Vec<u16>,
    pub ribbon_emitters: Vec<M2RibbonEmitter>,
    pub particle_emitters: Vec<M2ParticleEmitter>,
    /// Present when [`M2ModelFlags::USE_TEXTURE_COMBINER_COMBOS`] is set
    /// (WotLK+)
    pub texture_combiner_combos: Option<Vec<u16>>,
}

impl M2Model {
    /// An empty model laid out for `version`.
    pub fn new(version: ClientVersion, name: &str) -> Self {
        let old = version.is_pre_wotlk();
        Self {
            version,
            header_version: version.m2_version(),
            name: name.to_string(),
            flags: M2ModelFlags::empty(),
            global_sequences: Vec::new(),
            sequences: Vec::new(),
            sequence_lookup: Vec::new(),
            playable_animation_lookup: old.then(Vec::new),
            bones: Vec::new(),
            key_bone_lookup: Vec::new(),
            vertices: Vec::new(),
            embedded_skins: Vec::new(),
            skin_count: 0,
            colors: Vec::new(),
            textures: Vec::new(),
            texture_weights: Vec::new(),
            texture_flipbooks: old.then(Vec::new),
            texture_transforms: Vec::new(),
            replaceable_texture_lookup: Vec::new(),
            materials: Vec::new(),
            bone_lookup: Vec::new(),
            texture_lookup: Vec::new(),
            texture_unit_lookup: Vec::new(),
            transparency_lookup: Vec::new(),
            texture_transform_lookup: Vec::new(),
            bounding_box: BoundingBox::zero(),
            bounding_sphere_radius: 0.0,
            collision_box: BoundingBox::zero(),
            collision_sphere_radius: 0.0,
            collision_triangles: Vec::new(),
            collision_vertices: Vec::new(),
            collision_normals: Vec::new(),
            attachments: Vec::new(),
            attachment_lookup: Vec::new(),
            events: Vec::new(),
            lights: Vec::new(),
            cameras: Vec::new(),
            camera_lookup: Vec::new(),
            ribbon_emitters: Vec::new(),
            particle_emitters: Vec::new(),
            texture_combiner_combos: None,
        }
    }

    /// Decode an MD20 payload. Offsets are relative to the position of the
    /// magic, which must be the start of `reader`.
    pub fn read<R: Read + Seek>(reader: &mut R, version: ClientVersion) -> WDResult<Self> {
        let header: MD20Header = reader.wow_read_versioned(version)?;
        debug!(
            "MD20 version {}: {} sequences, {} bones, {} vertices, {} skins",
            header.version,
            header.sequences.count,
            header.bones.count,
            header.vertices.count,
            header.skin_profiles.count()
        );

        let sequences: Vec<M2Sequence> = header.sequences.v_wow_read_to_vec(reader, version)?;
        let ctx = TrackContext::with_sequences(version, &sequences);

        let (embedded_skins, skin_count) = match &header.skin_profiles {
            M2SkinProfiles::Embedded(array) => {
                let skins = read_records::<M2SkinProfile, _>(reader, array, &ctx)?;
                let count = skins.len() as u32;
                (skins, count)
            }
            M2SkinProfiles::Count(count) => (Vec::new(), *count),
        };

        Ok(Self {
            version,
            header_version: header.version,
            name: reader.new_from_header(&header.name)?,
            flags: header.flags,
            global_sequences: header.global_sequences.wow_read_to_vec(reader)?,
            sequences,
            sequence_lookup: header.sequence_lookup.wow_read_to_vec(reader)?,
            playable_animation_lookup: match &header.playable_animation_lookup {
                M2PlayableAnimationLookup::Some(array) => Some(array.wow_read_to_vec(reader)?),
                M2PlayableAnimationLookup::None => None,
            },
            bones: read_records(reader, &header.bones, &ctx)?,
            key_bone_lookup: header.key_bone_lookup.wow_read_to_vec(reader)?,
            vertices: header.vertices.wow_read_to_vec(reader)?,
            embedded_skins,
            skin_count,
            colors: read_records(reader, &header.colors, &ctx)?,
            textures: read_records(reader, &header.textures, &ctx)?,
            texture_weights: read_records(reader, &header.texture_weights, &ctx)?,
            texture_flipbooks: match &header.texture_flipbooks {
                M2TextureFlipbooks::Some(array) => Some(array.wow_read_to_vec(reader)?),
                M2TextureFlipbooks::None => None,
            },
            texture_transforms: read_records(reader, &header.texture_transforms, &ctx)?,
            replaceable_texture_lookup: header.replaceable_texture_lookup.wow_read_to_vec(reader)?,
            materials: header.materials.wow_read_to_vec(reader)?,
            bone_lookup: header.bone_lookup.wow_read_to_vec(reader)?,
            texture_lookup: header.texture_lookup.wow_read_to_vec(reader)?,
            texture_unit_lookup: header.texture_unit_lookup.wow_read_to_vec(reader)?,
            transparency_lookup: header.transparency_lookup.wow_read_to_vec(reader)?,
            texture_transform_lookup: header.texture_transform_lookup.wow_read_to_vec(reader)?,
            bounding_box: header.bounding_box,
            bounding_sphere_radius: header.bounding_sphere_radius,
            collision_box: header.collision_box,
            collision_sphere_radius: header.collision_sphere_radius,
            collision_triangles: header.collision_triangles.wow_read_to_vec(reader)?,
            collision_vertices: header.collision_vertices.wow_read_to_vec(reader)?,
            collision_normals: header.collision_normals.wow_read_to_vec(reader)?,
            attachments: read_records(reader, &header.attachments, &ctx)?,
            attachment_lookup: header.attachment_lookup.wow_read_to_vec(reader)?,
            events: read_records(reader, &header.events, &ctx)?,
            lights: read_records(reader, &header.lights, &ctx)?,
            cameras: read_records(reader, &header.cameras, &ctx)?,
            camera_lookup: header.camera_lookup.wow_read_to_vec(reader)?,
            ribbon_emitters: read_records(reader, &header.ribbon_emitters, &ctx)?,
            particle_emitters: read_records(reader, &header.particle_emitters, &ctx)?,
            texture_combiner_combos: match &header.texture_combiner_combos {
                M2TextureCombinerCombos::Some(array) => Some(array.wow_read_to_vec(reader)?),
                M2TextureCombinerCombos::None => None,
            },
        })
    }

    pub fn from_bytes(bytes: &[u8], version: ClientVersion) -> WDResult<Self> {
        Self::read(&mut Cursor::new(bytes), version)
    }

    /// Encode as an MD20 payload laid out for `version`.
    ///
    /// Values whose layout only exists for other clients (start/end timings
    /// written for WotLK, embedded skins written for WotLK, durations
    /// written for TBC...) fail with [`WowDataError::VersionMismatch`].
    pub fn write<W: Write>(&self, writer: &mut W, version: ClientVersion) -> WDResult<()> {
        let combos = has_combos(version, self.flags);
        check_layout(
            self.sequences.iter().all(|s| s.timing.fits(version)),
            "sequence timings",
            version,
        )?;
        check_layout(
            version.is_pre_wotlk() || self.embedded_skins.is_empty(),
            "embedded skin profiles",
            version,
        )?;
        check_layout(
            version.is_pre_wotlk()
                || (self.playable_animation_lookup.is_none() && self.texture_flipbooks.is_none()),
            "playable animation lookup and texture flipbooks",
            version,
        )?;
        check_layout(
            combos || self.texture_combiner_combos.is_none(),
            "texture combiner combos",
            version,
        )?;

        let header_size = MD20Header::empty(version, self.flags).wow_size();
        let mut section = DataSection::new(header_size as u64);
        let old = version.is_pre_wotlk();

        let name = section.push_str(&self.name, M2_ALIGN);
        let global_sequences = section.push_array(&self.global_sequences, M2_ALIGN)?;
        let sequences = section.push_array(&self.sequences, M2_ALIGN)?;
        let sequence_lookup = section.push_array(&self.sequence_lookup, M2_ALIGN)?;
        let playable_animation_lookup = if old {
            let lookup = self.playable_animation_lookup.as_deref().unwrap_or_default();
            M2PlayableAnimationLookup::Some(section.push_array(lookup, M2_ALIGN)?)
        } else {
            M2PlayableAnimationLookup::None
        };
        let bones = write_records(&self.bones, &mut section, version)?;
        let key_bone_lookup = section.push_array(&self.key_bone_lookup, M2_ALIGN)?;
        let vertices = section.push_array(&self.vertices, M2_ALIGN)?;
        let skin_profiles = if old {
            M2SkinProfiles::Embedded(write_records(&self.embedded_skins, &mut section, version)?)
        } else {
            M2SkinProfiles::Count(self.skin_count)
        };
        let colors = write_records(&self.colors, &mut section, version)?;
        let textures = write_records(&self.textures, &mut section, version)?;
        let texture_weights = write_records(&self.texture_weights, &mut section, version)?;
        let texture_flipbooks = if old {
            let flipbooks = self.texture_flipbooks.as_deref().unwrap_or_default();
            M2TextureFlipbooks::Some(section.push_array(flipbooks, M2_ALIGN)?)
        } else {
            M2TextureFlipbooks::None
        };
        let texture_transforms = write_records(&self.texture_transforms, &mut section, version)?;
        let replaceable_texture_lookup =
            section.push_array(&self.replaceable_texture_lookup, M2_ALIGN)?;
        let materials = section.push_array(&self.materials, M2_ALIGN)?;
        let bone_lookup = section.push_array(&self.bone_lookup, M2_ALIGN)?;
        let texture_lookup = section.push_array(&self.texture_lookup, M2_ALIGN)?;
        let texture_unit_lookup = section.push_array(&self.texture_unit_lookup, M2_ALIGN)?;
        let transparency_lookup = section.push_array(&self.transparency_lookup, M2_ALIGN)?;
        let texture_transform_lookup =
            section.push_array(&self.texture_transform_lookup, M2_ALIGN)?;
        let collision_triangles = section.push_array(&self.collision_triangles, M2_ALIGN)?;
        let collision_vertices = section.push_array(&self.collision_vertices, M2_ALIGN)?;
        let collision_normals = section.push_array(&self.collision_normals, M2_ALIGN)?;
        let attachments = write_records(&self.attachments, &mut section, version)?;
        let attachment_lookup = section.push_array(&self.attachment_lookup, M2_ALIGN)?;
        let events = write_records(&self.events, &mut section, version)?;
        let lights = write_records(&self.lights, &mut section, version)?;
        let cameras = write_records(&self.cameras, &mut section, version)?;
        let camera_lookup = section.push_array(&self.camera_lookup, M2_ALIGN)?;
        let ribbon_emitters = write_records(&self.ribbon_emitters, &mut section, version)?;
        let particle_emitters = write_records(&self.particle_emitters, &mut section, version)?;
        let texture_combiner_combos = if combos {
            let values = self.texture_combiner_combos.as_deref().unwrap_or_default();
            M2TextureCombinerCombos::Some(section.push_array(values, M2_ALIGN)?)
        } else {
            M2TextureCombinerCombos::None
        };

        let header = MD20Header {
            magic: MD20_MAGIC,
            version: if ClientVersion::from_m2_version(self.header_version) == Some(version) {
                self.header_version
            } else {
                version.m2_version()
            },
            name,
            flags: self.flags,
            global_sequences,
            sequences,
            sequence_lookup,
            playable_animation_lookup,
            bones,
            key_bone_lookup,
            vertices,
            skin_profiles,
            colors,
            textures,
            texture_weights,
            texture_flipbooks,
            texture_transforms,
            replaceable_texture_lookup,
            materials,
            bone_lookup,
            texture_lookup,
            texture_unit_lookup,
            transparency_lookup,
            texture_transform_lookup,
            bounding_box: self.bounding_box,
            bounding_sphere_radius: self.bounding_sphere_radius,
            collision_box: self.collision_box,
            collision_sphere_radius: self.collision_sphere_radius,
            collision_triangles,
            collision_vertices,
            collision_normals,
            attachments,
            attachment_lookup,
            events,
            lights,
            cameras,
            camera_lookup,
            ribbon_emitters,
            particle_emitters,
            texture_combiner_combos,
        };
        trace!(
            "MD20 header {} bytes, data section {} bytes",
            header_size,
            section.bytes().len()
        );
        writer.wow_write(&header)?;
        section.write_to(writer)
    }

    pub fn to_bytes(&self, version: ClientVersion) -> WDResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out, version)?;
        Ok(out)
    }

    /// The root tables a skin profile of this model may refer to.
    pub fn skin_targets(&self) -> SkinTargets {
        SkinTargets {
            vertices: self.vertices.len(),
            materials: self.materials.len(),
            colors: self.colors.len(),
            texture_lookup: self.texture_lookup.len(),
            transparency_lookup: self.transparency_lookup.len(),
            texture_transform_lookup: self.texture_transform_lookup.len(),
        }
    }

    /// Check every lookup table and cross reference of the root, and of
    /// the embedded skins.
    ///
    /// `0xFFFF` (and `-1` for signed indices) means "no entry" and is
    /// always accepted.
    pub fn validate(&self) -> WDResult<()> {
        check_all_u16("sequence_lookup", &self.sequence_lookup, self.sequences.len())?;
        for sequence in &self.sequences {
            check_i16("sequence.next_variation", sequence.next_variation, self.sequences.len())?;
        }
        if let Some(lookup) = &self.playable_animation_lookup {
            for &(fallback, _) in lookup {
                check_i16("playable_animation_lookup", fallback, self.sequences.len())?;
            }
        }
        for bone in &self.bones {
            check_i16("bone.parent_bone", bone.parent_bone, self.bones.len())?;
        }
        check_all_u16("key_bone_lookup", &self.key_bone_lookup, self.bones.len())?;
        check_all_u16("bone_lookup", &self.bone_lookup, self.bones.len())?;
        for vertex in &self.vertices {
            for (&weight, &bone) in vertex.bone_weights.iter().zip(&vertex.bone_indices) {
                if weight > 0 {
                    check_index("vertex.bone_indices", u32::from(bone), self.bone_lookup.len())?;
                }
            }
        }
        check_all_u16("texture_lookup", &self.texture_lookup, self.textures.len())?;
        check_all_u16(
            "replaceable_texture_lookup",
            &self.replaceable_texture_lookup,
            self.textures.len(),
        )?;
        check_all_u16(
            "transparency_lookup",
            &self.transparency_lookup,
            self.texture_weights.len(),
        )?;
        check_all_u16(
            "texture_transform_lookup",
            &self.texture_transform_lookup,
            self.texture_transforms.len(),
        )?;
        check_all_u16("attachment_lookup", &self.attachment_lookup, self.attachments.len())?;
        for attachment in &self.attachments {
            check_u16("attachment.bone", attachment.bone, self.bones.len())?;
        }
        for event in &self.events {
            check_index("event.bone", event.bone, self.bones.len())?;
        }
        check_all_u16("camera_lookup", &self.camera_lookup, self.cameras.len())?;
        check_all_u16(
            "collision_triangles",
            &self.collision_triangles,
            self.collision_vertices.len(),
        )?;
        for emitter in &self.particle_emitters {
            check_u16("particle_emitter.bone", emitter.bone, self.bones.len())?;
            check_u16("particle_emitter.texture", emitter.texture, self.textures.len())?;
        }
        for emitter in &self.ribbon_emitters {
            check_index("ribbon_emitter.bone", emitter.bone, self.bones.len())?;
            check_all_u16(
                "ribbon_emitter.textures",
                &emitter.texture_indices,
                self.textures.len(),
            )?;
            check_all_u16(
                "ribbon_emitter.materials",
                &emitter.material_indices,
                self.materials.len(),
            )?;
        }
        let targets = self.skin_targets();
        for skin in &self.embedded_skins {
            skin.validate(&targets)?;
        }
        Ok(())
    }

    /// Fill in the keys of `sequence` from its `.anim` file, in every
    /// track of the model.
    pub fn load_sequence(&mut self, sequence: usize, anim: &M2AnimFile) -> WDResult<()> {
        check_index("sequences", sequence as u32, self.sequences.len())?;
        let mut cursor = anim.cursor();
        let cursor = &mut cursor;
        load_records(&mut self.bones, sequence, cursor)?;
        load_records(&mut self.colors, sequence, cursor)?;
        load_records(&mut self.texture_weights, sequence, cursor)?;
        load_records(&mut self.texture_transforms, sequence, cursor)?;
        load_records(&mut self.attachments, sequence, cursor)?;
        load_records(&mut self.events, sequence, cursor)?;
        load_records(&mut self.lights, sequence, cursor)?;
        load_records(&mut self.cameras, sequence, cursor)?;
        load_records(&mut self.ribbon_emitters, sequence, cursor)?;
        load_records(&mut self.particle_emitters, sequence, cursor)?;
        Ok(())
    }

    /// Recompute the bounding box and sphere from the vertex positions,
    /// and the collision bounds from the collision vertices.
    pub fn compute_bounds(&mut self) {
        let positions: Vec<Vec3> = self.vertices.iter().map(|v| v.position.to_glam()).collect();
        (self.bounding_box, self.bounding_sphere_radius) = bounds_of(&positions);
        let collision: Vec<Vec3> = self.collision_vertices.iter().map(C3Vector::to_glam).collect();
        (self.collision_box, self.collision_sphere_radius) = bounds_of(&collision);
    }
}

fn bounds_of(points: &[Vec3]) -> (BoundingBox, f32) {
    let Some(&first) = points.first() else {
        return (BoundingBox::zero(), 0.0);
    };
    let (min, max) = points
        .iter()
        .fold((first, first), |(min, max), &p| (min.min(p), max.max(p)));
    let radius = points.iter().map(|p| p.length()).fold(0.0, f32::max);
    (
        BoundingBox::new(C3Vector::from_glam(min), C3Vector::from_glam(max)),
        radius,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::M2SequenceTiming;
    use pretty_assertions::assert_eq;
    use wow_data::error::WowDataError;

    fn triangle(version: ClientVersion) -> M2Model {
        let mut model = M2Model::new(version, "Triangle");
        model.bones.push(M2Bone::new(version, C3Vector::origin()));
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
            model.vertices.push(M2Vertex::rigid(
                C3Vector::new(x, y, 2.0),
                C3Vector::new(0.0, 0.0, 1.0),
                C2Vector::new(x, y),
            ));
        }
        model.bone_lookup = vec![0];
        model.textures.push(M2Texture::new("creature/triangle/triangle.blp"));
        model.texture_lookup = vec![0];
        model.sequences.push(M2Sequence {
            timing: M2SequenceTiming::for_version(version, 1000),
            ..M2Sequence::default()
        });
        model.sequence_lookup = vec![0, 0xFFFF];
        model
    }

    #[test]
    fn wotlk_model_survives_a_write() {
        let model = triangle(ClientVersion::WotLK);
        let bytes = model.to_bytes(ClientVersion::WotLK).unwrap();
        let back = M2Model::from_bytes(&bytes, ClientVersion::WotLK).unwrap();
        assert_eq!(back, model);
        assert_eq!(back.to_bytes(ClientVersion::WotLK).unwrap(), bytes);
    }

    #[test]
    fn validate_accepts_sentinels() {
        triangle(ClientVersion::TBC).validate().unwrap();
    }

    #[test]
    fn validate_rejects_a_dangling_texture_lookup() {
        let mut model = triangle(ClientVersion::WotLK);
        model.texture_lookup = vec![3];
        let err = model.validate().unwrap_err();
        assert!(matches!(
            err,
            WowDataError::LookupOutOfRange { index: 3, len: 1, .. }
        ));
    }

    #[test]
    fn bounds_cover_every_vertex() {
        let mut model = triangle(ClientVersion::WotLK);
        model.compute_bounds();
        assert_eq!(model.bounding_box.min, C3Vector::new(0.0, 0.0, 2.0));
        assert_eq!(model.bounding_box.max, C3Vector::new(1.0, 1.0, 2.0));
        assert!((model.bounding_sphere_radius - 5.0_f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn embedded_skins_do_not_fit_wotlk() {
        let mut model = triangle(ClientVersion::WotLK);
        model.embedded_skins.push(M2SkinProfile::new(ClientVersion::WotLK));
        let err = model.to_bytes(ClientVersion::WotLK).unwrap_err();
        assert!(matches!(err, WowDataError::VersionMismatch { .. }));
    }
}
