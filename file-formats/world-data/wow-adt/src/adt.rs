//! A whole v18 terrain tile.

use std::fs::{self, File};
use std::io::{BufReader, Cursor};
use std::path::Path;

use log::{debug, info, trace, warn};
use wow_data::chunk::{
    Chunk, ChunkHeader, ChunkReader, ChunkTag, TagOrder, brw_payload, chunk_bytes,
};
use wow_data::error::WowDataError;
use wow_data::lookup;
use wow_data::prelude::{Read, Seek, Write};
use wow_data::string_block::{StringBlock, StringPadding};

use wow_data::chunk_order::PendingExtras;
use crate::chunks::*;
use crate::error::{AdtError, Result};

/// A decoded ADT tile.
///
/// String blocks are kept as read, so MMID and MWID offsets stay valid. The
/// MHDR offsets, the MCIN entries and every MCNK header offset are derived
/// from the layout when the tile is written.
#[derive(Debug, Clone, PartialEq)]
pub struct Adt {
    pub version: u32,
    pub header: MhdrChunk,
    /// MCIN, one entry per map chunk
    pub chunk_index: Vec<McinEntry>,
    /// MTEX, ground texture paths
    pub textures: StringBlock,
    /// MMDX, doodad model paths
    pub doodad_names: StringBlock,
    /// MMID, offsets into MMDX
    pub doodad_name_offsets: Vec<u32>,
    /// MWMO, WMO paths
    pub wmo_names: StringBlock,
    /// MWID, offsets into MWMO
    pub wmo_name_offsets: Vec<u32>,
    pub doodads: Vec<DoodadPlacement>,
    pub wmos: Vec<WmoPlacement>,
    /// MH2O payload, kept opaque
    pub water: Option<Vec<u8>>,
    pub chunks: Vec<McnkChunk>,
    pub flight_bounds: Option<MfboChunk>,
    /// MTXF, per texture flags
    pub texture_flags: Option<Vec<u32>>,
    /// Top level chunks this crate does not decode
    pub extra_chunks: Vec<Chunk>,
    pub order: ChunkOrder,
}

impl Default for Adt {
    fn default() -> Self {
        Self::new()
    }
}

impl Adt {
    /// A tile with no chunks.
    pub fn new() -> Self {
        Self {
            version: ADT_VERSION,
            header: MhdrChunk::default(),
            chunk_index: Vec::new(),
            textures: StringBlock::new(StringPadding::None),
            doodad_names: StringBlock::new(StringPadding::None),
            doodad_name_offsets: Vec::new(),
            wmo_names: StringBlock::new(StringPadding::None),
            wmo_name_offsets: Vec::new(),
            doodads: Vec::new(),
            wmos: Vec::new(),
            water: None,
            chunks: Vec::new(),
            flight_bounds: None,
            texture_flags: None,
            extra_chunks: Vec::new(),
            order: ChunkOrder::default(),
        }
    }

    /// A tile with all 256 map chunks, flat and untextured.
    pub fn flat() -> Self {
        let chunks = (0..CHUNKS_PER_TILE as u32)
            .map(|i| McnkChunk::new(i % 16, i / 16))
            .collect();
        Self {
            chunks,
            ..Self::new()
        }
    }

    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut reader = ChunkReader::new(reader, TagOrder::Reversed)?;

        let version: u32 = reader.expect(MVER)?.read_brw_one()?;
        if version != ADT_VERSION {
            return Err(WowDataError::version_mismatch(ADT_VERSION, version).into());
        }
        let mut adt = Self::new();
        adt.order.record(MVER);

        for chunk in reader {
            let chunk = chunk?;
            trace!("{} at {:#x}, {} bytes", chunk.tag, chunk.offset, chunk.data.len());
            adt.order.record(chunk.tag);
            match chunk.tag {
                MHDR => adt.header = chunk.read_brw_one()?,
                MCIN => adt.chunk_index = chunk.read_brw(McinEntry::SIZE)?,
                MTEX => adt.textures = StringBlock::from_bytes(chunk.data, StringPadding::None),
                MMDX => adt.doodad_names = StringBlock::from_bytes(chunk.data, StringPadding::None),
                MMID => adt.doodad_name_offsets = chunk.read_records(4)?,
                MWMO => adt.wmo_names = StringBlock::from_bytes(chunk.data, StringPadding::None),
                MWID => adt.wmo_name_offsets = chunk.read_records(4)?,
                MDDF => adt.doodads = chunk.read_brw(DoodadPlacement::SIZE)?,
                MODF => adt.wmos = chunk.read_brw(WmoPlacement::SIZE)?,
                MH2O => adt.water = Some(chunk.data),
                MCNK => adt.chunks.push(McnkChunk::from_chunk(&chunk)?),
                MFBO => adt.flight_bounds = Some(chunk.read_brw_one()?),
                MTXF => adt.texture_flags = Some(chunk.read_records(4)?),
                _ => {
                    warn!("keeping unknown tile chunk {} at {:#x}", chunk.tag, chunk.offset);
                    adt.extra_chunks.push(chunk);
                }
            }
        }

        debug!(
            "ADT: {} map chunks, {} textures, {} doodads, {} WMOs",
            adt.chunks.len(),
            adt.textures.iter().count(),
            adt.doodads.len(),
            adt.wmos.len()
        );
        if adt.chunks.len() != CHUNKS_PER_TILE {
            warn!("tile has {} map chunks instead of {CHUNKS_PER_TILE}", adt.chunks.len());
        }
        adt.validate()?;
        Ok(adt)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(&mut Cursor::new(bytes))
    }

    /// Read a tile from disk; failures carry the path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| AdtError::from(e).in_file(path))?;
        let adt = Self::read(&mut BufReader::new(file)).map_err(|e| e.in_file(path))?;
        info!("loaded {} with {} map chunks", path.display(), adt.chunks.len());
        Ok(adt)
    }

    /// Write the tile to `path`, replacing any file there.
    ///
    /// Writers targeting the same path concurrently are not supported.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes().map_err(|e| e.in_file(path))?;
        fs::write(path, bytes).map_err(|e| AdtError::from(e).in_file(path))?;
        Ok(())
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// Encode the tile, chunks in their read order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut at: Vec<(ChunkTag, u64)> = Vec::new();
        let mut mcnk_at: Vec<(u64, u64)> = Vec::with_capacity(self.chunks.len());
        let mut written: Vec<ChunkTag> = Vec::new();
        let mut pending = PendingExtras::new(&self.extra_chunks);

        let plan = self.order.plan(&ROOT_ORDER);
        let last_mcnk = plan.iter().rposition(|t| *t == MCNK);
        for (slot, tag) in plan.iter().copied().enumerate() {
            if tag != MCNK && written.contains(&tag) {
                continue;
            }
            let start = out.len() as u64;
            let payload = match tag {
                MVER => Some(self.version.to_le_bytes().to_vec()),
                // patched once every offset is known
                MHDR => Some(vec![0; MhdrChunk::SIZE]),
                MCIN => (!self.chunks.is_empty() || !self.chunk_index.is_empty())
                    .then(|| vec![0; McinEntry::SIZE * CHUNKS_PER_TILE]),
                MTEX => Some(self.textures.as_bytes().to_vec()),
                MMDX => Some(self.doodad_names.as_bytes().to_vec()),
                MMID => Some(words(&self.doodad_name_offsets)),
                MWMO => Some(self.wmo_names.as_bytes().to_vec()),
                MWID => Some(words(&self.wmo_name_offsets)),
                MDDF => Some(brw_payload(&self.doodads)?),
                MODF => Some(brw_payload(&self.wmos)?),
                MH2O => self.water.clone(),
                MCNK => {
                    // the last MCNK slot also takes chunks added after reading
                    let upto = if Some(slot) == last_mcnk {
                        self.chunks.len()
                    } else {
                        (mcnk_at.len() + 1).min(self.chunks.len())
                    };
                    for mcnk in &self.chunks[mcnk_at.len()..upto] {
                        let offset = out.len() as u64;
                        out.extend(chunk_bytes(MCNK, &mcnk.to_payload()?, TagOrder::Reversed));
                        mcnk_at.push((offset, out.len() as u64 - offset));
                    }
                    None
                }
                MFBO => self.flight_bounds.map(|b| brw_payload(&[b])).transpose()?,
                MTXF => self.texture_flags.as_deref().map(words),
                other => {
                    if let Some(chunk) = pending.take(other) {
                        out.extend(chunk_bytes(chunk.tag, &chunk.data, TagOrder::Reversed));
                    }
                    None
                }
            };
            if let Some(payload) = payload {
                out.extend(chunk_bytes(tag, &payload, TagOrder::Reversed));
                at.push((tag, start));
                written.push(tag);
            }
        }
        for chunk in pending.rest() {
            out.extend(chunk_bytes(chunk.tag, &chunk.data, TagOrder::Reversed));
        }

        let Some(mhdr_at) = find(&at, MHDR) else {
            return Ok(out);
        };
        let data_start = mhdr_at + ChunkHeader::SIZE;
        let relative = |tag| find(&at, tag).map_or(0, |o| o.saturating_sub(data_start) as u32);
        let header = MhdrChunk {
            mcin: relative(MCIN),
            mtex: relative(MTEX),
            mmdx: relative(MMDX),
            mmid: relative(MMID),
            mwmo: relative(MWMO),
            mwid: relative(MWID),
            mddf: relative(MDDF),
            modf: relative(MODF),
            mfbo: relative(MFBO),
            mh2o: relative(MH2O),
            mtxf: relative(MTXF),
            ..self.header
        };
        patch(&mut out, data_start, &brw_payload(&[header])?);

        if let Some(mcin_at) = find(&at, MCIN) {
            let index = self.synced_index(&mcnk_at);
            patch(&mut out, mcin_at + ChunkHeader::SIZE, &brw_payload(&index)?);
        }
        Ok(out)
    }

    /// MCIN as it will be written: stored flags and async ids, new
    /// positions.
    fn synced_index(&self, mcnk_at: &[(u64, u64)]) -> Vec<McinEntry> {
        (0..CHUNKS_PER_TILE)
            .map(|i| {
                let stored = self.chunk_index.get(i).copied().unwrap_or_default();
                let (offset, size) = mcnk_at.get(i).copied().unwrap_or_default();
                McinEntry {
                    offset: offset as u32,
                    size: size as u32,
                    ..stored
                }
            })
            .collect()
    }

    /// Check every index that stays within the tile.
    pub fn validate(&self) -> Result<()> {
        for &offset in &self.doodad_name_offsets {
            if !self.doodad_names.is_string_start(offset) {
                return Err(WowDataError::lookup("MMID", offset, self.doodad_names.len()).into());
            }
        }
        for &offset in &self.wmo_name_offsets {
            if !self.wmo_names.is_string_start(offset) {
                return Err(WowDataError::lookup("MWID", offset, self.wmo_names.len()).into());
            }
        }
        for doodad in self.doodads.iter().filter(|d| !d.name_is_file_id()) {
            lookup::check_index("MDDF.name_id", doodad.name_id, self.doodad_name_offsets.len())?;
        }
        for wmo in self.wmos.iter().filter(|w| !w.name_is_file_id()) {
            lookup::check_index("MODF.name_id", wmo.name_id, self.wmo_name_offsets.len())?;
        }

        let textures = self.textures.iter().count();
        for mcnk in &self.chunks {
            lookup::check_index("MCNK.index_x", mcnk.header.index_x, 16)?;
            lookup::check_index("MCNK.index_y", mcnk.header.index_y, 16)?;
            for layer in mcnk.layers.iter().flatten() {
                lookup::check_index("MCLY.texture_id", layer.texture_id, textures)?;
            }
            for &doodad in mcnk.doodad_refs() {
                lookup::check_index("MCRF.doodads", doodad, self.doodads.len())?;
            }
            for &wmo in mcnk.map_object_refs() {
                lookup::check_index("MCRF.map_objects", wmo, self.wmos.len())?;
            }
        }
        Ok(())
    }

    /// Texture paths in MTEX order, as indexed by `MclyLayer::texture_id`.
    pub fn texture_names(&self) -> Vec<String> {
        self.textures.iter().map(|(_, name)| name).collect()
    }

    pub fn texture_name(&self, texture_id: u32) -> Result<String> {
        self.textures
            .iter()
            .nth(texture_id as usize)
            .map(|(_, name)| name)
            .ok_or_else(|| {
                WowDataError::lookup("MTEX", texture_id, self.textures.iter().count()).into()
            })
    }

    /// Add a texture path, returning its `texture_id`.
    pub fn add_texture(&mut self, path: &str) -> u32 {
        let id = self.textures.iter().count() as u32;
        self.textures.add(path);
        id
    }

    pub fn doodad_name(&self, doodad: &DoodadPlacement) -> Result<String> {
        let index =
            lookup::check_index("MDDF.name_id", doodad.name_id, self.doodad_name_offsets.len())?;
        let offset = self.doodad_name_offsets[index];
        Ok(self.doodad_names.get(offset)?)
    }

    pub fn wmo_name(&self, wmo: &WmoPlacement) -> Result<String> {
        let offset = lookup::check_index("MODF.name_id", wmo.name_id, self.wmo_name_offsets.len())
            .map(|i| self.wmo_name_offsets[i])?;
        Ok(self.wmo_names.get(offset)?)
    }

    /// Add a doodad model path, returning the `name_id` placements use.
    pub fn add_doodad_name(&mut self, path: &str) -> u32 {
        self.doodad_name_offsets.push(self.doodad_names.add(path));
        self.doodad_name_offsets.len() as u32 - 1
    }

    /// Add a WMO path, returning the `name_id` placements use.
    pub fn add_wmo_name(&mut self, path: &str) -> u32 {
        self.wmo_name_offsets.push(self.wmo_names.add(path));
        self.wmo_name_offsets.len() as u32 - 1
    }

    /// The map chunk at grid cell (`x`, `y`).
    pub fn chunk_at(&self, x: u32, y: u32) -> Option<&McnkChunk> {
        self.chunks
            .iter()
            .find(|c| c.header.index_x == x && c.header.index_y == y)
    }
}

fn find(at: &[(ChunkTag, u64)], tag: ChunkTag) -> Option<u64> {
    at.iter().find(|(t, _)| *t == tag).map(|(_, o)| *o)
}

fn patch(out: &mut [u8], at: u64, bytes: &[u8]) {
    let at = at as usize;
    out[at..at + bytes.len()].copy_from_slice(bytes);
}

fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wow_data::chunk::read_chunks;
    use wow_data::primitives::C3Vector;

    fn populated() -> Adt {
        let mut adt = Adt::flat();
        let grass = adt.add_texture("tileset/elwynn/elwynngrass01.blp");
        let tree = adt.add_doodad_name("world/generic/tree01.m2");
        let tower = adt.add_wmo_name("world/wmo/tower.wmo");
        adt.doodads.push(DoodadPlacement {
            name_id: tree,
            unique_id: 7,
            position: C3Vector::new(100.0, 50.0, 200.0),
            ..DoodadPlacement::default()
        });
        adt.wmos.push(WmoPlacement {
            name_id: tower,
            unique_id: 8,
            ..WmoPlacement::default()
        });
        let first = &mut adt.chunks[0];
        first.layers = Some(vec![MclyLayer {
            texture_id: grass,
            ..MclyLayer::default()
        }]);
        first.refs = Some(vec![0, 0]);
        first.header.n_doodad_refs = 1;
        first.header.n_map_obj_refs = 1;
        adt.flight_bounds = Some(MfboChunk::default());
        adt.header.flags = MhdrChunk::HAS_MFBO;
        adt
    }

    #[test]
    fn header_offsets_point_at_their_chunks() {
        let bytes = populated().to_bytes().unwrap();
        let chunks = read_chunks(&bytes, TagOrder::Reversed).unwrap();
        assert_eq!(chunks[0].tag, MVER);
        assert_eq!(chunks[1].tag, MHDR);
        assert_eq!(chunks[1].offset, 0x0C);

        let header: MhdrChunk = chunks[1].read_brw_one().unwrap();
        let tag_at = |rel: u32| {
            let abs = 0x14 + rel as u64;
            chunks.iter().find(|c| c.offset == abs).map(|c| c.tag)
        };
        assert_eq!(header.mcin, 0x40);
        assert_eq!(tag_at(header.mcin), Some(MCIN));
        assert_eq!(tag_at(header.mtex), Some(MTEX));
        assert_eq!(tag_at(header.mmdx), Some(MMDX));
        assert_eq!(tag_at(header.mmid), Some(MMID));
        assert_eq!(tag_at(header.mwmo), Some(MWMO));
        assert_eq!(tag_at(header.mwid), Some(MWID));
        assert_eq!(tag_at(header.mddf), Some(MDDF));
        assert_eq!(tag_at(header.modf), Some(MODF));
        assert_eq!(tag_at(header.mfbo), Some(MFBO));
        assert_eq!(header.mh2o, 0);
        assert_eq!(header.mtxf, 0);
        assert_eq!(header.flags, MhdrChunk::HAS_MFBO);
    }

    #[test]
    fn chunk_index_follows_the_map_chunks() {
        let mut adt = populated();
        adt.chunk_index = vec![McinEntry {
            flags: 1,
            async_id: 99,
            ..McinEntry::default()
        }];
        let bytes = adt.to_bytes().unwrap();
        let chunks = read_chunks(&bytes, TagOrder::Reversed).unwrap();
        let index: Vec<McinEntry> = chunks[2].read_brw(McinEntry::SIZE).unwrap();
        assert_eq!(index.len(), CHUNKS_PER_TILE);

        let mcnks: Vec<&Chunk> = chunks.iter().filter(|c| c.tag == MCNK).collect();
        assert_eq!(mcnks.len(), CHUNKS_PER_TILE);
        for (entry, chunk) in index.iter().zip(&mcnks) {
            assert_eq!(u64::from(entry.offset), chunk.offset);
            assert_eq!(entry.size as usize, chunk.data.len() + 8);
        }
        assert_eq!((index[0].flags, index[0].async_id), (1, 99));
        assert_eq!((index[1].flags, index[1].async_id), (0, 0));
    }

    #[test]
    fn tile_survives_a_write() {
        let adt = populated();
        let bytes = adt.to_bytes().unwrap();
        let back = Adt::from_bytes(&bytes).unwrap();
        assert_eq!(back.to_bytes().unwrap(), bytes);
        assert_eq!(back.doodad_name(&back.doodads[0]).unwrap(), "world/generic/tree01.m2");
        assert_eq!(back.wmo_name(&back.wmos[0]).unwrap(), "world/wmo/tower.wmo");
        assert_eq!(back.texture_names(), vec!["tileset/elwynn/elwynngrass01.blp"]);
        assert_eq!(back.chunk_at(15, 15).map(|c| c.header.index_x), Some(15));
    }

    #[test]
    fn unknown_chunks_keep_their_place() {
        let mut adt = populated();
        let bytes = adt.to_bytes().unwrap();
        let mut chunks = read_chunks(&bytes, TagOrder::Reversed).unwrap();
        let tag = ChunkTag::new(b"MAMP");
        chunks.insert(3, Chunk::new(tag, vec![0; 4]));
        let mut rebuilt = Vec::new();
        for chunk in &chunks {
            rebuilt.extend(chunk_bytes(chunk.tag, &chunk.data, TagOrder::Reversed));
        }

        adt = Adt::from_bytes(&rebuilt).unwrap();
        assert_eq!(adt.extra_chunks.len(), 1);
        let again = read_chunks(&adt.to_bytes().unwrap(), TagOrder::Reversed).unwrap();
        assert_eq!(again[3].tag, tag);
        let header: MhdrChunk = again[1].read_brw_one().unwrap();
        assert_eq!(header.mtex, 0x40 + 8 + 4096 + 8 + 4);
    }

    #[test]
    fn wrong_version() {
        let mut bytes = Adt::new().to_bytes().unwrap();
        bytes[8] = 17;
        let err = Adt::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err.kind(), WowDataError::VersionMismatch { .. }));
    }

    #[test]
    fn layer_pointing_past_mtex() {
        let mut adt = populated();
        if let Some(layers) = adt.chunks[3].layers.as_mut() {
            layers.push(MclyLayer {
                texture_id: 4,
                ..MclyLayer::default()
            });
        }
        let err = Adt::from_bytes(&adt.to_bytes().unwrap()).unwrap_err();
        match err.kind() {
            WowDataError::LookupOutOfRange { table, index, len } => {
                assert_eq!(table, "MCLY.texture_id");
                assert_eq!((*index, *len), (4, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mmid_must_start_a_string() {
        let mut adt = populated();
        adt.doodad_name_offsets[0] = 3;
        assert!(matches!(
            adt.validate().unwrap_err().kind(),
            WowDataError::LookupOutOfRange { index: 3, .. }
        ));
    }
}
