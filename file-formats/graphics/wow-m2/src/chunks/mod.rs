//! Records stored in the MD20 data section.
//!
//! Records without array payloads are plain [`WowHeaderR`]/[`WowHeaderW`]
//! values. Records that own tracks or strings split into an on-disk header
//! and a decoded value implementing [`M2Record`].

use std::io::Cursor;

use wow_data::error::Result as WDResult;
use wow_data::prelude::*;

use crate::M2_ALIGN;

pub mod attachment;
pub mod bone;
pub mod camera;
pub mod color;
pub mod event;
pub mod file_id;
pub mod light;
pub mod material;
pub mod particle_emitter;
pub mod ribbon_emitter;
pub mod sequence;
pub mod texture;
pub mod texture_transform;
pub mod track;
pub mod vertex;

pub use attachment::M2Attachment;
pub use bone::{M2Bone, M2BoneCrc, M2BoneFlags, M2BoneRotation};
pub use camera::{M2Camera, M2CameraFov};
pub use color::M2Color;
pub use event::M2Event;
pub use file_id::{AnimationFileId, M2Sidecar, SkinFileIds};
pub use light::{M2Light, M2LightType};
pub use material::{M2BlendMode, M2Material, M2RenderFlags};
pub use particle_emitter::M2ParticleEmitter;
pub use ribbon_emitter::M2RibbonEmitter;
pub use sequence::{M2Sequence, M2SequenceFlags, M2SequenceTiming};
pub use texture::{M2Texture, M2TextureFlags, M2TextureType};
pub use texture_transform::M2TextureTransform;
pub use track::{
    M2InterpolationType, M2SplineKey, M2Track, M2TrackBase, SequenceKeys, TrackContext, TrackKeys,
};
pub use vertex::M2Vertex;

/// A record whose on-disk header refers to payloads elsewhere in the file.
pub trait M2Record: Sized {
    type Header: VWowHeaderR<ClientVersion> + WowHeaderW;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &Self::Header,
        ctx: &TrackContext,
    ) -> WDResult<Self>;

    /// Emit the payloads into `section` and build the header pointing at
    /// them.
    fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<Self::Header>;

    /// Fill in keys of `sequence` that live in its `.anim` file.
    fn load_sequence(&mut self, _sequence: usize, _anim: &mut Cursor<&[u8]>) -> WDResult<()> {
        Ok(())
    }
}

impl<T: WowHeaderR + WowHeaderW> M2Record for M2Track<T> {
    type Header = track::M2TrackHeader<T>;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &Self::Header,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        M2Track::read_from_header(reader, header, ctx)
    }

    fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<Self::Header> {
        M2Track::write_header(self, section, version)
    }

    fn load_sequence(&mut self, sequence: usize, anim: &mut Cursor<&[u8]>) -> WDResult<()> {
        M2Track::load_sequence(self, sequence, anim).map(|_| ())
    }
}

/// Read the headers referenced by `array`, then each record's payloads.
pub fn read_records<T: M2Record, R: Read + Seek>(
    reader: &mut R,
    array: &WowArray<T::Header>,
    ctx: &TrackContext,
) -> WDResult<Vec<T>> {
    let headers = array.v_wow_read_to_vec(reader, ctx.version)?;
    headers
        .iter()
        .map(|header| T::read_from_header(reader, header, ctx))
        .collect()
}

/// Emit each record's payloads, then the header table.
pub fn write_records<T: M2Record>(
    records: &[T],
    section: &mut DataSection,
    version: ClientVersion,
) -> WDResult<WowArray<T::Header>> {
    let headers = records
        .iter()
        .map(|record| record.write_header(section, version))
        .collect::<WDResult<Vec<_>>>()?;
    section.push_array(&headers, M2_ALIGN)
}

pub fn load_records<T: M2Record>(
    records: &mut [T],
    sequence: usize,
    anim: &mut Cursor<&[u8]>,
) -> WDResult<()> {
    for record in records {
        record.load_sequence(sequence, anim)?;
    }
    Ok(())
}

/// Fail with [`WowDataError::VersionMismatch`] when a value decoded for one
/// client layout is written for another.
pub(crate) fn check_layout(fits: bool, what: &str, version: ClientVersion) -> WDResult<()> {
    if fits {
        Ok(())
    } else {
        Err(WowDataError::version_mismatch(
            format!("{what} laid out for {version}"),
            format!("{what} from another client layout"),
        ))
    }
}
