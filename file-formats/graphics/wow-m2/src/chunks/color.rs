use std::io::Cursor;

use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderW};

use super::M2Record;
use super::track::{M2Track, M2TrackHeader, TrackContext};

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2ColorHeader {
    #[wow_data(versioned)]
    pub color: M2TrackHeader<C3Vector>,
    #[wow_data(versioned)]
    pub alpha: M2TrackHeader<Fixed16>,
}

/// Animated vertex color, RGB in `0.0..=1.0` plus alpha
#[derive(Debug, Clone, PartialEq)]
pub struct M2Color {
    pub color: M2Track<C3Vector>,
    pub alpha: M2Track<Fixed16>,
}

impl M2Color {
    pub fn constant(version: ClientVersion, color: C3Vector, alpha: f32) -> Self {
        Self {
            color: M2Track::constant(version, color),
            alpha: M2Track::constant(version, Fixed16::from_f32(alpha)),
        }
    }
}

impl M2Record for M2Color {
    type Header = M2ColorHeader;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2ColorHeader,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        Ok(Self {
            color: M2Track::read_from_header(reader, &header.color, ctx)?,
            alpha: M2Track::read_from_header(reader, &header.alpha, ctx)?,
        })
    }

    fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<M2ColorHeader> {
        Ok(M2ColorHeader {
            color: self.color.write_header(section, version)?,
            alpha: self.alpha.write_header(section, version)?,
        })
    }

    fn load_sequence(&mut self, sequence: usize, anim: &mut Cursor<&[u8]>) -> WDResult<()> {
        self.color.load_sequence(sequence, anim)?;
        self.alpha.load_sequence(sequence, anim)?;
        Ok(())
    }
}
