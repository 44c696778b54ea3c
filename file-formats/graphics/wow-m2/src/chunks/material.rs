use wow_data::prelude::*;
use wow_data_derive::{WowHeaderR, WowHeaderW};

bitflags::bitflags! {
    /// Render flags as defined in the M2 format
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, WowHeaderR, WowHeaderW)]
    #[wow_data(bitflags = u16)]
    pub struct M2RenderFlags: u16 {
        const UNLIT = 0x01;
        const UNFOGGED = 0x02;
        const TWO_SIDED = 0x04;
        const BILLBOARDED = 0x08;
        const NO_ZBUFFER = 0x10;
        const UNKNOWN_0x20 = 0x20;
        const SHADOW_BATCH_1 = 0x40;
        const SHADOW_BATCH_2 = 0x80;
        const UNKNOWN_0x400 = 0x400;
        /// Prevents alpha from being written to the framebuffer
        const PREVENT_ALPHA = 0x800;
    }
}

/// Blending mode, an index into the client's blend state table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum M2BlendMode {
    #[default]
    Opaque,
    AlphaKey,
    Alpha,
    NoAlphaAdd,
    Add,
    Mod,
    Mod2x,
    BlendAdd,
    Other(u16),
}

impl From<u16> for M2BlendMode {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Opaque,
            1 => Self::AlphaKey,
            2 => Self::Alpha,
            3 => Self::NoAlphaAdd,
            4 => Self::Add,
            5 => Self::Mod,
            6 => Self::Mod2x,
            7 => Self::BlendAdd,
            other => Self::Other(other),
        }
    }
}

impl From<M2BlendMode> for u16 {
    fn from(value: M2BlendMode) -> Self {
        match value {
            M2BlendMode::Opaque => 0,
            M2BlendMode::AlphaKey => 1,
            M2BlendMode::Alpha => 2,
            M2BlendMode::NoAlphaAdd => 3,
            M2BlendMode::Add => 4,
            M2BlendMode::Mod => 5,
            M2BlendMode::Mod2x => 6,
            M2BlendMode::BlendAdd => 7,
            M2BlendMode::Other(other) => other,
        }
    }
}

impl WowHeaderR for M2BlendMode {
    fn wow_read<R: Read + Seek>(reader: &mut R) -> WowResult<Self> {
        Ok(reader.wow_read::<u16>()?.into())
    }
}

impl WowHeaderW for M2BlendMode {
    fn wow_write<W: Write>(&self, writer: &mut W) -> WowResult<()> {
        writer.wow_write(&u16::from(*self))
    }

    fn wow_size(&self) -> usize {
        2
    }
}

/// Render flags and blending of a batch
#[derive(Debug, Clone, Copy, PartialEq, Default, WowHeaderR, WowHeaderW)]
pub struct M2Material {
    pub flags: M2RenderFlags,
    pub blend_mode: M2BlendMode,
}

impl M2Material {
    pub fn new(blend_mode: M2BlendMode) -> Self {
        Self {
            flags: M2RenderFlags::empty(),
            blend_mode,
        }
    }

    pub fn is_transparent(&self) -> bool {
        !matches!(self.blend_mode, M2BlendMode::Opaque | M2BlendMode::AlphaKey)
    }
}
