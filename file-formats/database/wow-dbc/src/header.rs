//! DBC header structure.

use binrw::{BinRead, BinWrite};
use wow_data::schema::{FieldType, LangString, Layout};

/// The magic signature at the beginning of a DBC file
pub const DBC_MAGIC: [u8; 4] = *b"WDBC";

/// Represents a DBC file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(little, magic = b"WDBC")]
pub struct DbcHeader {
    /// Number of records in the file
    pub record_count: u32,
    /// Number of four-byte columns in each record
    pub field_count: u32,
    /// Size of each record in bytes
    pub record_size: u32,
    /// Size of the string block in bytes
    pub string_block_size: u32,
}

impl DbcHeader {
    /// The size of a DBC header in bytes, magic included
    pub const SIZE: usize = 20;

    /// Header describing `record_count` rows of `layout`.
    pub fn for_layout(layout: &Layout, record_count: u32, string_block_size: u32) -> Self {
        Self {
            record_count,
            field_count: column_count(layout),
            record_size: layout.size() as u32,
            string_block_size,
        }
    }

    /// Calculates the offset to the string block
    pub fn string_block_offset(&self) -> u64 {
        Self::SIZE as u64 + u64::from(self.record_count) * u64::from(self.record_size)
    }

    /// Calculates the total size of the DBC file
    pub fn total_size(&self) -> u64 {
        self.string_block_offset() + u64::from(self.string_block_size)
    }
}

/// Number of header columns a layout occupies. Vectors and arrays count one
/// column per component and a localized string one per locale plus flags.
pub fn column_count(layout: &Layout) -> u32 {
    let locales = LangString::empty(layout.context().version).locales.len();
    layout
        .fields()
        .iter()
        .map(|field| columns(&field.ty, locales))
        .sum::<usize>() as u32
}

fn columns(ty: &FieldType, locales: usize) -> usize {
    match ty {
        FieldType::Vec2 | FieldType::ArrayRef(_) => 2,
        FieldType::Vec3 => 3,
        FieldType::Quat | FieldType::CompQuat => 4,
        FieldType::BoundingBox => 6,
        FieldType::DbcLangString => locales + 1,
        FieldType::Fixed(element, count) => columns(element, locales) * count,
        _ => 1,
    }
}
