//! Chunk tags and record layouts of an ADT tile.
//!
//! Tags are written in their logical spelling; the reader and writer
//! reverse them on the wire.

use wow_data::chunk::ChunkTag;

pub mod mcnk;
pub mod placement;
pub mod simple;

pub use mcnk::*;
pub use wow_data::chunk_order::ChunkOrder;
pub use placement::*;
pub use simple::*;

pub const MVER: ChunkTag = ChunkTag::new(b"MVER");
pub const MHDR: ChunkTag = ChunkTag::new(b"MHDR");
pub const MCIN: ChunkTag = ChunkTag::new(b"MCIN");
pub const MTEX: ChunkTag = ChunkTag::new(b"MTEX");
pub const MMDX: ChunkTag = ChunkTag::new(b"MMDX");
pub const MMID: ChunkTag = ChunkTag::new(b"MMID");
pub const MWMO: ChunkTag = ChunkTag::new(b"MWMO");
pub const MWID: ChunkTag = ChunkTag::new(b"MWID");
pub const MDDF: ChunkTag = ChunkTag::new(b"MDDF");
pub const MODF: ChunkTag = ChunkTag::new(b"MODF");
pub const MH2O: ChunkTag = ChunkTag::new(b"MH2O");
pub const MCNK: ChunkTag = ChunkTag::new(b"MCNK");
pub const MFBO: ChunkTag = ChunkTag::new(b"MFBO");
pub const MTXF: ChunkTag = ChunkTag::new(b"MTXF");

// MCNK sub-chunks
pub const MCVT: ChunkTag = ChunkTag::new(b"MCVT");
pub const MCCV: ChunkTag = ChunkTag::new(b"MCCV");
pub const MCLV: ChunkTag = ChunkTag::new(b"MCLV");
pub const MCNR: ChunkTag = ChunkTag::new(b"MCNR");
pub const MCLY: ChunkTag = ChunkTag::new(b"MCLY");
pub const MCRF: ChunkTag = ChunkTag::new(b"MCRF");
pub const MCSH: ChunkTag = ChunkTag::new(b"MCSH");
pub const MCAL: ChunkTag = ChunkTag::new(b"MCAL");
pub const MCLQ: ChunkTag = ChunkTag::new(b"MCLQ");
pub const MCSE: ChunkTag = ChunkTag::new(b"MCSE");

/// Top level chunks in the order a v18 tile stores them.
pub const ROOT_ORDER: [ChunkTag; 14] = [
    MVER, MHDR, MCIN, MTEX, MMDX, MMID, MWMO, MWID, MDDF, MODF, MH2O, MCNK, MFBO, MTXF,
];

/// MCNK sub-chunks in the order the client writes them.
pub const MCNK_ORDER: [ChunkTag; 10] = [MCVT, MCCV, MCLV, MCNR, MCLY, MCRF, MCSH, MCAL, MCLQ, MCSE];
