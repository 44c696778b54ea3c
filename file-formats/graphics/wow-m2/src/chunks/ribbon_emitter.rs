use std::io::Cursor;

use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderW};

use super::track::{M2Track, M2TrackHeader, TrackContext};
use super::{M2Record, check_layout};
use crate::M2_ALIGN;

/// Trailing fields added in WotLK.
#[derive(Debug, Clone, Copy, PartialEq, Default, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2RibbonEmitterRest {
    #[default]
    None,

    #[wow_data(read_if = version >= ClientVersion::WotLK)]
    Some {
        priority_plane: u16,
        ribbon_color_index: u8,
        texture_transform_lookup: u8,
    },
}

impl M2RibbonEmitterRest {
    pub fn fits(&self, version: ClientVersion) -> bool {
        matches!(self, Self::Some { .. }) == (version >= ClientVersion::WotLK)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2RibbonEmitterHeader {
    pub ribbon_id: u32,
    pub bone: u32,
    pub position: C3Vector,
    pub texture_indices: WowArray<u16>,
    pub material_indices: WowArray<u16>,
    #[wow_data(versioned)]
    pub color: M2TrackHeader<C3Vector>,
    #[wow_data(versioned)]
    pub alpha: M2TrackHeader<Fixed16>,
    #[wow_data(versioned)]
    pub height_above: M2TrackHeader<f32>,
    #[wow_data(versioned)]
    pub height_below: M2TrackHeader<f32>,
    pub edges_per_second: f32,
    pub edge_lifetime: f32,
    pub gravity: f32,
    pub texture_rows: u16,
    pub texture_cols: u16,
    #[wow_data(versioned)]
    pub texture_slot: M2TrackHeader<u16>,
    #[wow_data(versioned)]
    pub visibility: M2TrackHeader<u8>,
    #[wow_data(versioned)]
    pub rest: M2RibbonEmitterRest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct M2RibbonEmitter {
    pub ribbon_id: u32,
    pub bone: u32,
    pub position: C3Vector,
    /// Indices into the texture table
    pub texture_indices: Vec<u16>,
    /// Indices into the material table
    pub material_indices: Vec<u16>,
    pub color: M2Track<C3Vector>,
    pub alpha: M2Track<Fixed16>,
    pub height_above: M2Track<f32>,
    pub height_below: M2Track<f32>,
    pub edges_per_second: f32,
    pub edge_lifetime: f32,
    pub gravity: f32,
    pub texture_rows: u16,
    pub texture_cols: u16,
    pub texture_slot: M2Track<u16>,
    pub visibility: M2Track<u8>,
    pub rest: M2RibbonEmitterRest,
}

impl M2Record for M2RibbonEmitter {
    type Header = M2RibbonEmitterHeader;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2RibbonEmitterHeader,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        Ok(Self {
            ribbon_id: header.ribbon_id,
            bone: header.bone,
            position: header.position,
            texture_indices: header.texture_indices.wow_read_to_vec(reader)?,
            material_indices: header.material_indices.wow_read_to_vec(reader)?,
            color: M2Track::read_from_header(reader, &header.color, ctx)?,
            alpha: M2Track::read_from_header(reader, &header.alpha, ctx)?,
            height_above: M2Track::read_from_header(reader, &header.height_above, ctx)?,
            height_below: M2Track::read_from_header(reader, &header.height_below, ctx)?,
            edges_per_second: header.edges_per_second,
            edge_lifetime: header.edge_lifetime,
            gravity: header.gravity,
            texture_rows: header.texture_rows,
            texture_cols: header.texture_cols,
            texture_slot: M2Track::read_from_header(reader, &header.texture_slot, ctx)?,
            visibility: M2Track::read_from_header(reader, &header.visibility, ctx)?,
            rest: header.rest,
        })
    }

    fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<M2RibbonEmitterHeader> {
        check_layout(self.rest.fits(version), "ribbon emitter", version)?;
        Ok(M2RibbonEmitterHeader {
            ribbon_id: self.ribbon_id,
            bone: self.bone,
            position: self.position,
            texture_indices: section.push_array(&self.texture_indices, M2_ALIGN)?,
            material_indices: section.push_array(&self.material_indices, M2_ALIGN)?,
            color: self.color.write_header(section, version)?,
            alpha: self.alpha.write_header(section, version)?,
            height_above: self.height_above.write_header(section, version)?,
            height_below: self.height_below.write_header(section, version)?,
            edges_per_second: self.edges_per_second,
            edge_lifetime: self.edge_lifetime,
            gravity: self.gravity,
            texture_rows: self.texture_rows,
            texture_cols: self.texture_cols,
            texture_slot: self.texture_slot.write_header(section, version)?,
            visibility: self.visibility.write_header(section, version)?,
            rest: self.rest,
        })
    }

    fn load_sequence(&mut self, sequence: usize, anim: &mut Cursor<&[u8]>) -> WDResult<()> {
        self.color.load_sequence(sequence, anim)?;
        self.alpha.load_sequence(sequence, anim)?;
        self.height_above.load_sequence(sequence, anim)?;
        self.height_below.load_sequence(sequence, anim)?;
        self.texture_slot.load_sequence(sequence, anim)?;
        self.visibility.load_sequence(sequence, anim)?;
        Ok(())
    }
}
