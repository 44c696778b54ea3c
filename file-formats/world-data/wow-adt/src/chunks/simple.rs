//! Fixed-size records of the tile header chunks.

use binrw::{BinRead, BinWrite};

/// MVER value of every v18 tile, Classic through Cataclysm.
pub const ADT_VERSION: u32 = 18;

/// Number of map chunks in a tile (16×16).
pub const CHUNKS_PER_TILE: usize = 256;

/// MHDR - offsets to the top level chunks (64 bytes).
///
/// Offsets count from the start of the MHDR payload, which sits at file
/// offset 0x14 in every v18 tile. Zero means the chunk is absent. They are
/// recomputed on every write; `flags` and the trailing words are kept as
/// stored.
///
/// Reference: <https://wowdev.wiki/ADT/v18#MHDR_chunk>
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct MhdrChunk {
    /// 0x01: MFBO present
    pub flags: u32,
    pub mcin: u32,
    pub mtex: u32,
    pub mmdx: u32,
    pub mmid: u32,
    pub mwmo: u32,
    pub mwid: u32,
    pub mddf: u32,
    pub modf: u32,
    /// Flight bounds (TBC+)
    pub mfbo: u32,
    /// New-style liquids (WotLK+)
    pub mh2o: u32,
    pub mtxf: u32,
    pub unused: [u32; 4],
}

impl MhdrChunk {
    pub const SIZE: usize = 64;
    pub const HAS_MFBO: u32 = 0x1;

    pub fn has_flight_bounds(&self) -> bool {
        self.flags & Self::HAS_MFBO != 0
    }
}

/// MCIN entry - where one MCNK lives in the file (16 bytes).
///
/// `offset` is absolute and points at the MCNK chunk header; `size`
/// includes that header. `flags` and `async_id` are runtime fields the
/// client fills in; they are preserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct McinEntry {
    pub offset: u32,
    pub size: u32,
    pub flags: u32,
    pub async_id: u32,
}

impl McinEntry {
    pub const SIZE: usize = 16;
}

/// MFBO - flight ceiling and floor planes, 3×3 heights each (36 bytes, TBC+).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct MfboChunk {
    pub maximum: [[i16; 3]; 3],
    pub minimum: [[i16; 3]; 3],
}

impl MfboChunk {
    pub const SIZE: usize = 36;
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::BinWriterExt;
    use std::io::Cursor;

    fn encoded_len<T: for<'a> BinWrite<Args<'a> = ()>>(value: &T) -> usize {
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_le(value).unwrap();
        cursor.into_inner().len()
    }

    #[test]
    fn record_sizes() {
        assert_eq!(encoded_len(&MhdrChunk::default()), MhdrChunk::SIZE);
        assert_eq!(encoded_len(&McinEntry::default()), McinEntry::SIZE);
        assert_eq!(encoded_len(&MfboChunk::default()), MfboChunk::SIZE);
    }

    #[test]
    fn mfbo_flag() {
        let header = MhdrChunk {
            flags: MhdrChunk::HAS_MFBO,
            ..MhdrChunk::default()
        };
        assert!(header.has_flight_bounds());
        assert!(!MhdrChunk::default().has_flight_bounds());
    }
}
