use std::io::Cursor;

use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderW};

use super::M2Record;
use super::track::{M2Track, M2TrackHeader, TrackContext};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum M2LightType {
    #[default]
    Directional,
    Point,
    Other(u16),
}

impl From<u16> for M2LightType {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Directional,
            1 => Self::Point,
            other => Self::Other(other),
        }
    }
}

impl From<M2LightType> for u16 {
    fn from(value: M2LightType) -> Self {
        match value {
            M2LightType::Directional => 0,
            M2LightType::Point => 1,
            M2LightType::Other(other) => other,
        }
    }
}

impl WowHeaderR for M2LightType {
    fn wow_read<R: Read + Seek>(reader: &mut R) -> WDResult<Self> {
        Ok(reader.wow_read::<u16>()?.into())
    }
}

impl WowHeaderW for M2LightType {
    fn wow_write<W: Write>(&self, writer: &mut W) -> WDResult<()> {
        writer.wow_write(&u16::from(*self))
    }

    fn wow_size(&self) -> usize {
        2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2LightHeader {
    pub light_type: M2LightType,
    pub bone: i16,
    pub position: C3Vector,
    #[wow_data(versioned)]
    pub ambient_color: M2TrackHeader<C3Vector>,
    #[wow_data(versioned)]
    pub ambient_intensity: M2TrackHeader<f32>,
    #[wow_data(versioned)]
    pub diffuse_color: M2TrackHeader<C3Vector>,
    #[wow_data(versioned)]
    pub diffuse_intensity: M2TrackHeader<f32>,
    #[wow_data(versioned)]
    pub attenuation_start: M2TrackHeader<f32>,
    #[wow_data(versioned)]
    pub attenuation_end: M2TrackHeader<f32>,
    #[wow_data(versioned)]
    pub visibility: M2TrackHeader<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct M2Light {
    pub light_type: M2LightType,
    /// `-1` when not attached to a bone
    pub bone: i16,
    pub position: C3Vector,
    pub ambient_color: M2Track<C3Vector>,
    pub ambient_intensity: M2Track<f32>,
    pub diffuse_color: M2Track<C3Vector>,
    pub diffuse_intensity: M2Track<f32>,
    pub attenuation_start: M2Track<f32>,
    pub attenuation_end: M2Track<f32>,
    pub visibility: M2Track<u8>,
}

impl M2Record for M2Light {
    type Header = M2LightHeader;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2LightHeader,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        Ok(Self {
            light_type: header.light_type,
            bone: header.bone,
            position: header.position,
            ambient_color: M2Track::read_from_header(reader, &header.ambient_color, ctx)?,
            ambient_intensity: M2Track::read_from_header(reader, &header.ambient_intensity, ctx)?,
            diffuse_color: M2Track::read_from_header(reader, &header.diffuse_color, ctx)?,
            diffuse_intensity: M2Track::read_from_header(reader, &header.diffuse_intensity, ctx)?,
            attenuation_start: M2Track::read_from_header(reader, &header.attenuation_start, ctx)?,
            attenuation_end: M2Track::read_from_header(reader, &header.attenuation_end, ctx)?,
            visibility: M2Track::read_from_header(reader, &header.visibility, ctx)?,
        })
    }

    fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<M2LightHeader> {
        Ok(M2LightHeader {
            light_type: self.light_type,
            bone: self.bone,
            position: self.position,
            ambient_color: self.ambient_color.write_header(section, version)?,
            ambient_intensity: self.ambient_intensity.write_header(section, version)?,
            diffuse_color: self.diffuse_color.write_header(section, version)?,
            diffuse_intensity: self.diffuse_intensity.write_header(section, version)?,
            attenuation_start: self.attenuation_start.write_header(section, version)?,
            attenuation_end: self.attenuation_end.write_header(section, version)?,
            visibility: self.visibility.write_header(section, version)?,
        })
    }

    fn load_sequence(&mut self, sequence: usize, anim: &mut Cursor<&[u8]>) -> WDResult<()> {
        self.ambient_color.load_sequence(sequence, anim)?;
        self.ambient_intensity.load_sequence(sequence, anim)?;
        self.diffuse_color.load_sequence(sequence, anim)?;
        self.diffuse_intensity.load_sequence(sequence, anim)?;
        self.attenuation_start.load_sequence(sequence, anim)?;
        self.attenuation_end.load_sequence(sequence, anim)?;
        self.visibility.load_sequence(sequence, anim)?;
        Ok(())
    }
}
