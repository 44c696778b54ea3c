use std::io::Cursor;

use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderW};

use super::M2Record;
use super::track::{M2Track, M2TrackHeader, TrackContext};

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2AttachmentHeader {
    pub id: u32,
    pub bone: u16,
    pub unknown: u16,
    pub position: C3Vector,
    #[wow_data(versioned)]
    pub animate_attached: M2TrackHeader<u8>,
}

/// Mount point for items and effects (weapons, helmets, spell hands)
#[derive(Debug, Clone, PartialEq)]
pub struct M2Attachment {
    /// Attachment slot, referenced backwards through the attachment lookup
    pub id: u32,
    pub bone: u16,
    pub unknown: u16,
    /// Relative to the bone's pivot
    pub position: C3Vector,
    /// Whether whatever is attached is visible
    pub animate_attached: M2Track<u8>,
}

impl M2Attachment {
    pub fn new(version: ClientVersion, id: u32, bone: u16) -> Self {
        Self {
            id,
            bone,
            unknown: 0,
            position: C3Vector::origin(),
            animate_attached: M2Track::new(version),
        }
    }
}

impl M2Record for M2Attachment {
    type Header = M2AttachmentHeader;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2AttachmentHeader,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        Ok(Self {
            id: header.id,
            bone: header.bone,
            unknown: header.unknown,
            position: header.position,
            animate_attached: M2Track::read_from_header(reader, &header.animate_attached, ctx)?,
        })
    }

    fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<M2AttachmentHeader> {
        Ok(M2AttachmentHeader {
            id: self.id,
            bone: self.bone,
            unknown: self.unknown,
            position: self.position,
            animate_attached: self.animate_attached.write_header(section, version)?,
        })
    }

    fn load_sequence(&mut self, sequence: usize, anim: &mut Cursor<&[u8]>) -> WDResult<()> {
        self.animate_attached.load_sequence(sequence, anim)?;
        Ok(())
    }
}
