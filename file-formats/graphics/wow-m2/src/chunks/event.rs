use std::io::Cursor;

use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderW};

use super::M2Record;
use super::track::{M2TrackBase, M2TrackBaseHeader, TrackContext};

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2EventHeader {
    pub identifier: MagicStr,
    pub data: u32,
    pub bone: u32,
    pub position: C3Vector,
    #[wow_data(versioned)]
    pub enabled: M2TrackBaseHeader,
}

/// Timed trigger (sounds, footsteps, spell effects)
#[derive(Debug, Clone, PartialEq)]
pub struct M2Event {
    /// Four characters, e.g. `$CSD`
    pub identifier: MagicStr,
    pub data: u32,
    pub bone: u32,
    pub position: C3Vector,
    /// Times at which the event fires
    pub enabled: M2TrackBase,
}

impl M2Event {
    pub fn identifier_str(&self) -> String {
        String::from_utf8_lossy(&self.identifier).into_owned()
    }
}

impl M2Record for M2Event {
    type Header = M2EventHeader;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2EventHeader,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        Ok(Self {
            identifier: header.identifier,
            data: header.data,
            bone: header.bone,
            position: header.position,
            enabled: M2TrackBase::read_from_header(reader, &header.enabled, ctx)?,
        })
    }

    fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<M2EventHeader> {
        Ok(M2EventHeader {
            identifier: self.identifier,
            data: self.data,
            bone: self.bone,
            position: self.position,
            enabled: self.enabled.write_header(section, version)?,
        })
    }

    fn load_sequence(&mut self, sequence: usize, anim: &mut Cursor<&[u8]>) -> WDResult<()> {
        self.enabled.load_sequence(sequence, anim)?;
        Ok(())
    }
}
