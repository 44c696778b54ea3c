use std::io::Cursor;

use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderW};

use super::M2Record;
use super::track::{M2Track, M2TrackHeader, TrackContext};

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2TextureTransformHeader {
    #[wow_data(versioned)]
    pub translation: M2TrackHeader<C3Vector>,
    #[wow_data(versioned)]
    pub rotation: M2TrackHeader<Quaternion>,
    #[wow_data(versioned)]
    pub scaling: M2TrackHeader<C3Vector>,
}

/// UV animation applied to a texture unit
#[derive(Debug, Clone, PartialEq)]
pub struct M2TextureTransform {
    pub translation: M2Track<C3Vector>,
    pub rotation: M2Track<Quaternion>,
    pub scaling: M2Track<C3Vector>,
}

impl M2TextureTransform {
    pub fn new(version: ClientVersion) -> Self {
        Self {
            translation: M2Track::new(version),
            rotation: M2Track::new(version),
            scaling: M2Track::new(version),
        }
    }
}

impl M2Record for M2TextureTransform {
    type Header = M2TextureTransformHeader;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2TextureTransformHeader,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        Ok(Self {
            translation: M2Track::read_from_header(reader, &header.translation, ctx)?,
            rotation: M2Track::read_from_header(reader, &header.rotation, ctx)?,
            scaling: M2Track::read_from_header(reader, &header.scaling, ctx)?,
        })
    }

    fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<M2TextureTransformHeader> {
        Ok(M2TextureTransformHeader {
            translation: self.translation.write_header(section, version)?,
            rotation: self.rotation.write_header(section, version)?,
            scaling: self.scaling.write_header(section, version)?,
        })
    }

    fn load_sequence(&mut self, sequence: usize, anim: &mut Cursor<&[u8]>) -> WDResult<()> {
        self.translation.load_sequence(sequence, anim)?;
        self.rotation.load_sequence(sequence, anim)?;
        self.scaling.load_sequence(sequence, anim)?;
        Ok(())
    }
}
