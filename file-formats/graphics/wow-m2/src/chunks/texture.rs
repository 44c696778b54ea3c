use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderR, WowHeaderW};

use super::M2Record;
use super::track::TrackContext;
use crate::M2_ALIGN;

/// Texture type as defined in the M2 format. Types the client replaces at
/// runtime carry no filename.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum M2TextureType {
    /// Texture defined in filename
    #[default]
    Hardcoded,
    /// Body + clothes
    Body,
    /// Item, capes
    Item,
    WeaponBlade,
    WeaponHandle,
    Environment,
    /// Hair, beard
    Hair,
    FacialHair,
    SkinExtra,
    UiSkin,
    TaurenMane,
    Monster1,
    Monster2,
    Monster3,
    ItemIcon,
    Other(u32),
}

impl From<u32> for M2TextureType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Hardcoded,
            1 => Self::Body,
            2 => Self::Item,
            3 => Self::WeaponBlade,
            4 => Self::WeaponHandle,
            5 => Self::Environment,
            6 => Self::Hair,
            7 => Self::FacialHair,
            8 => Self::SkinExtra,
            9 => Self::UiSkin,
            10 => Self::TaurenMane,
            11 => Self::Monster1,
            12 => Self::Monster2,
            13 => Self::Monster3,
            14 => Self::ItemIcon,
            other => Self::Other(other),
        }
    }
}

impl From<M2TextureType> for u32 {
    fn from(value: M2TextureType) -> Self {
        match value {
            M2TextureType::Hardcoded => 0,
            M2TextureType::Body => 1,
            M2TextureType::Item => 2,
            M2TextureType::WeaponBlade => 3,
            M2TextureType::WeaponHandle => 4,
            M2TextureType::Environment => 5,
            M2TextureType::Hair => 6,
            M2TextureType::FacialHair => 7,
            M2TextureType::SkinExtra => 8,
            M2TextureType::UiSkin => 9,
            M2TextureType::TaurenMane => 10,
            M2TextureType::Monster1 => 11,
            M2TextureType::Monster2 => 12,
            M2TextureType::Monster3 => 13,
            M2TextureType::ItemIcon => 14,
            M2TextureType::Other(other) => other,
        }
    }
}

impl WowHeaderR for M2TextureType {
    fn wow_read<R: Read + Seek>(reader: &mut R) -> WDResult<Self> {
        Ok(reader.wow_read::<u32>()?.into())
    }
}

impl WowHeaderW for M2TextureType {
    fn wow_write<W: Write>(&self, writer: &mut W) -> WDResult<()> {
        writer.wow_write(&u32::from(*self))
    }

    fn wow_size(&self) -> usize {
        4
    }
}

bitflags::bitflags! {
    /// Texture flags as defined in the M2 format
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, WowHeaderR, WowHeaderW)]
    #[wow_data(bitflags = u32)]
    pub struct M2TextureFlags: u32 {
        /// Texture is wrapped horizontally
        const WRAP_X = 0x01;
        /// Texture is wrapped vertically
        const WRAP_Y = 0x02;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, WowHeaderR, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2TextureHeader {
    pub texture_type: M2TextureType,
    pub flags: M2TextureFlags,
    pub filename: WowCharArray,
}

/// Represents a texture in an M2 model
#[derive(Debug, Clone, PartialEq, Default)]
pub struct M2Texture {
    pub texture_type: M2TextureType,
    pub flags: M2TextureFlags,
    /// Empty for runtime replaced textures
    pub filename: String,
}

impl M2Texture {
    pub fn new(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            ..Self::default()
        }
    }
}

impl M2Record for M2Texture {
    type Header = M2TextureHeader;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2TextureHeader,
        _ctx: &TrackContext,
    ) -> WDResult<Self> {
        Ok(Self {
            texture_type: header.texture_type,
            flags: header.flags,
            filename: reader.new_from_header(&header.filename)?,
        })
    }

    fn write_header(
        &self,
        section: &mut DataSection,
        _version: ClientVersion,
    ) -> WDResult<M2TextureHeader> {
        Ok(M2TextureHeader {
            texture_type: self.texture_type,
            flags: self.flags,
            filename: section.push_str(&self.filename, M2_ALIGN),
        })
    }
}
