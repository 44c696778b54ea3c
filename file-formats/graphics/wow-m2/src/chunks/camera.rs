use std::io::Cursor;

use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderW};

use super::track::{M2SplineKey, M2Track, M2TrackHeader, TrackContext};
use super::{M2Record, check_layout};

/// Field of view value stored ahead of the clip planes until Cataclysm.
#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2CameraFovValue {
    Some(f32),

    #[wow_data(read_if = version >= ClientVersion::Cataclysm)]
    None,
}

/// Animated field of view appended from Cataclysm on.
#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2CameraFovTrack {
    None,

    #[wow_data(read_if = version >= ClientVersion::Cataclysm)]
    Some(#[wow_data(versioned)] M2TrackHeader<M2SplineKey<f32>>),
}

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2CameraHeader {
    pub camera_type: i32,
    #[wow_data(versioned)]
    pub fov: M2CameraFovValue,
    pub far_clip: f32,
    pub near_clip: f32,
    #[wow_data(versioned)]
    pub positions: M2TrackHeader<M2SplineKey<C3Vector>>,
    pub position_base: C3Vector,
    #[wow_data(versioned)]
    pub target_positions: M2TrackHeader<M2SplineKey<C3Vector>>,
    pub target_position_base: C3Vector,
    #[wow_data(versioned)]
    pub roll: M2TrackHeader<M2SplineKey<f32>>,
    #[wow_data(versioned)]
    pub fov_track: M2CameraFovTrack,
}

#[derive(Debug, Clone, PartialEq)]
pub enum M2CameraFov {
    /// Multiply by 35 to get degrees
    Value(f32),
    /// Diagonal field of view in radians
    Track(M2Track<M2SplineKey<f32>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct M2Camera {
    /// 0 portrait, 1 character info, -1 other (fly-bys)
    pub camera_type: i32,
    pub fov: M2CameraFov,
    pub far_clip: f32,
    pub near_clip: f32,
    pub positions: M2Track<M2SplineKey<C3Vector>>,
    pub position_base: C3Vector,
    pub target_positions: M2Track<M2SplineKey<C3Vector>>,
    pub target_position_base: C3Vector,
    pub roll: M2Track<M2SplineKey<f32>>,
}

impl M2Record for M2Camera {
    type Header = M2CameraHeader;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2CameraHeader,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        let positions = M2Track::read_from_header(reader, &header.positions, ctx)?;
        let target_positions = M2Track::read_from_header(reader, &header.target_positions, ctx)?;
        let roll = M2Track::read_from_header(reader, &header.roll, ctx)?;
        let fov = match (&header.fov, &header.fov_track) {
            (_, M2CameraFovTrack::Some(track)) => {
                M2CameraFov::Track(M2Track::read_from_header(reader, track, ctx)?)
            }
            (M2CameraFovValue::Some(value), M2CameraFovTrack::None) => M2CameraFov::Value(*value),
            (M2CameraFovValue::None, M2CameraFovTrack::None) => M2CameraFov::Value(0.0),
        };
        Ok(Self {
            camera_type: header.camera_type,
            fov,
            far_clip: header.far_clip,
            near_clip: header.near_clip,
            positions,
            position_base: header.position_base,
            target_positions,
            target_position_base: header.target_position_base,
            roll,
        })
    }

    fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<M2CameraHeader> {
        let animated_fov = version >= ClientVersion::Cataclysm;
        check_layout(
            matches!(self.fov, M2CameraFov::Track(_)) == animated_fov,
            "camera field of view",
            version,
        )?;
        let positions = self.positions.write_header(section, version)?;
        let target_positions = self.target_positions.write_header(section, version)?;
        let roll = self.roll.write_header(section, version)?;
        let (fov, fov_track) = match &self.fov {
            M2CameraFov::Value(value) => (M2CameraFovValue::Some(*value), M2CameraFovTrack::None),
            M2CameraFov::Track(track) => (
                M2CameraFovValue::None,
                M2CameraFovTrack::Some(track.write_header(section, version)?),
            ),
        };
        Ok(M2CameraHeader {
            camera_type: self.camera_type,
            fov,
            far_clip: self.far_clip,
            near_clip: self.near_clip,
            positions,
            position_base: self.position_base,
            target_positions,
            target_position_base: self.target_position_base,
            roll,
            fov_track,
        })
    }

    fn load_sequence(&mut self, sequence: usize, anim: &mut Cursor<&[u8]>) -> WDResult<()> {
        self.positions.load_sequence(sequence, anim)?;
        self.target_positions.load_sequence(sequence, anim)?;
        self.roll.load_sequence(sequence, anim)?;
        if let M2CameraFov::Track(track) = &mut self.fov {
            track.load_sequence(sequence, anim)?;
        }
        Ok(())
    }
}
