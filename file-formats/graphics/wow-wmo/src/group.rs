//! WMO group files (`<name>_NNN.wmo`).

use std::io::{Cursor, Read, Seek, Write};

use tracing::{debug, trace, warn};
use wow_data::chunk::{Chunk, ChunkReader, ChunkWriter, TagOrder, brw_payload, read_chunks};
use wow_data::chunk_order::{AnchoredChunk, Anchors};
use wow_data::error::WowDataError;
use wow_data::lookup;
use wow_data::primitives::{C2Vector, C3Vector, Color};
use wow_data::types::{WowHeaderW, WowReaderForHeader, WowWriterForHeader};

use crate::bsp::BspTree;
use crate::chunks::*;
use crate::error::Result;
use crate::flags::{WmoGroupFlags, is_magma_liquid};

/// One MLIQ vertex. Which form applies depends on the group's liquid type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiquidVertex {
    Water {
        flow_1: u8,
        flow_2: u8,
        flow_1_pct: u8,
        filler: u8,
        height: f32,
    },
    Magma {
        u: i16,
        v: i16,
        height: f32,
    },
}

impl LiquidVertex {
    pub fn height(&self) -> f32 {
        match *self {
            Self::Water { height, .. } | Self::Magma { height, .. } => height,
        }
    }
}

impl WowHeaderW for LiquidVertex {
    fn wow_write<W: Write>(&self, writer: &mut W) -> wow_data::error::Result<()> {
        match *self {
            Self::Water {
                flow_1,
                flow_2,
                flow_1_pct,
                filler,
                height,
            } => {
                writer.wow_write(&[flow_1, flow_2, flow_1_pct, filler])?;
                writer.wow_write(&height)
            }
            Self::Magma { u, v, height } => {
                writer.wow_write(&u)?;
                writer.wow_write(&v)?;
                writer.wow_write(&height)
            }
        }
    }

    fn wow_size(&self) -> usize {
        8
    }
}

/// MLIQ liquid grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WmoLiquid {
    pub header: MliqHeader,
    /// `x_verts * y_verts` entries, row major
    pub vertices: Vec<LiquidVertex>,
    /// One byte per tile, `x_tiles * y_tiles` entries
    pub tile_flags: Vec<u8>,
    /// Bytes after the tile flags, kept as read
    pub trailing: Vec<u8>,
}

impl WmoLiquid {
    fn parse(chunk: &Chunk, magma: bool) -> Result<Self> {
        let mut cursor = chunk.cursor();
        let header: MliqHeader = chunk.read_brw_one()?;
        cursor.set_position(MliqHeader::SIZE as u64);

        let vertex_count = header.x_verts as usize * header.y_verts as usize;
        let tile_count = header.x_tiles as usize * header.y_tiles as usize;
        let needed = MliqHeader::SIZE + vertex_count * 8 + tile_count;
        if chunk.data.len() < needed {
            return Err(WowDataError::ShortRead {
                offset: Some(chunk.payload_offset() + chunk.data.len() as u64),
            }
            .into());
        }

        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let vertex = if magma {
                LiquidVertex::Magma {
                    u: cursor.wow_read()?,
                    v: cursor.wow_read()?,
                    height: cursor.wow_read()?,
                }
            } else {
                let [flow_1, flow_2, flow_1_pct, filler]: [u8; 4] = cursor.wow_read()?;
                LiquidVertex::Water {
                    flow_1,
                    flow_2,
                    flow_1_pct,
                    filler,
                    height: cursor.wow_read()?,
                }
            };
            vertices.push(vertex);
        }

        let tiles_start = MliqHeader::SIZE + vertex_count * 8;
        Ok(Self {
            header,
            vertices,
            tile_flags: chunk.data[tiles_start..tiles_start + tile_count].to_vec(),
            trailing: chunk.data[tiles_start + tile_count..].to_vec(),
        })
    }

    fn to_payload(&self) -> Result<Vec<u8>> {
        let mut out = brw_payload(&[self.header])?;
        for vertex in &self.vertices {
            out.wow_write(vertex)?;
        }
        out.extend_from_slice(&self.tile_flags);
        out.extend_from_slice(&self.trailing);
        Ok(out)
    }
}

/// A decoded group file.
///
/// Optional chunks are `Some` exactly when they are present in the file.
/// `header.flags` is written as stored; call [`WmoGroup::sync_flags`] after
/// adding or removing optional chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct WmoGroup {
    pub version: u32,
    pub header: MogpHeader,
    pub triangle_materials: Vec<MopyEntry>,
    pub indices: Vec<u16>,
    pub vertices: Vec<C3Vector>,
    pub normals: Vec<C3Vector>,
    pub tex_coords: Vec<C2Vector>,
    pub batches: Vec<MobaEntry>,
    /// MOLR, indices into the root's MOLT
    pub light_refs: Option<Vec<u16>>,
    /// MODR, indices into the root's MODD
    pub doodad_refs: Option<Vec<u16>>,
    pub bsp: Option<BspTree>,
    pub vertex_colors: Option<Vec<Color>>,
    pub liquid: Option<WmoLiquid>,
    pub tex_coords_2: Option<Vec<C2Vector>>,
    pub vertex_colors_2: Option<Vec<Color>>,
    /// Unknown MOGP sub-chunks, each written back after the sub-chunk it
    /// followed
    pub extra_chunks: Vec<AnchoredChunk>,
    /// Top-level chunks found after MOGP
    pub trailing_chunks: Vec<Chunk>,
}

impl Default for WmoGroup {
    fn default() -> Self {
        Self {
            version: WMO_VERSION,
            header: MogpHeader::default(),
            triangle_materials: Vec::new(),
            indices: Vec::new(),
            vertices: Vec::new(),
            normals: Vec::new(),
            tex_coords: Vec::new(),
            batches: Vec::new(),
            light_refs: None,
            doodad_refs: None,
            bsp: None,
            vertex_colors: None,
            liquid: None,
            tex_coords_2: None,
            vertex_colors_2: None,
            extra_chunks: Vec::new(),
            trailing_chunks: Vec::new(),
        }
    }
}

impl WmoGroup {
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut chunks = ChunkReader::new(reader, TagOrder::Reversed)?;

        let version: u32 = chunks.expect(MVER)?.read_brw_one()?;
        if version != WMO_VERSION {
            return Err(WowDataError::version_mismatch(WMO_VERSION, version).into());
        }

        let mogp = chunks.expect(MOGP)?;
        if mogp.data.len() < MogpHeader::SIZE {
            return Err(WowDataError::ShortRead {
                offset: Some(mogp.payload_offset() + mogp.data.len() as u64),
            }
            .into());
        }
        let header: MogpHeader = mogp.read_brw_one()?;
        let mut group = Self {
            version,
            header,
            ..Self::default()
        };

        let base = mogp.payload_offset() + MogpHeader::SIZE as u64;
        let mut bsp_nodes = None;
        let mut bsp_faces = None;
        let mut seen_uv = false;
        let mut anchors = Anchors::default();
        for mut chunk in read_chunks(&mogp.data[MogpHeader::SIZE..], TagOrder::Reversed)
            .map_err(|e| e.at_offset(base))?
        {
            chunk.offset += base;
            trace!("{} at {:#x}, {} bytes", chunk.tag, chunk.offset, chunk.data.len());
            if !GROUP_CHUNKS.contains(&chunk.tag) {
                warn!("keeping unknown group chunk {} at {:#x}", chunk.tag, chunk.offset);
                group.extra_chunks.push(anchors.anchor(chunk));
                continue;
            }
            anchors.known(chunk.tag);
            match chunk.tag {
                MOPY => group.triangle_materials = chunk.read_brw(2)?,
                MOVI => group.indices = chunk.read_records(2)?,
                MOVT => group.vertices = chunk.read_records(12)?,
                MONR => group.normals = chunk.read_records(12)?,
                MOTV if !seen_uv => {
                    group.tex_coords = chunk.read_records(8)?;
                    seen_uv = true;
                }
                MOTV => group.tex_coords_2 = Some(chunk.read_records(8)?),
                MOBA => group.batches = chunk.read_brw(MobaEntry::SIZE)?,
                MOLR => group.light_refs = Some(chunk.read_records(2)?),
                MODR => group.doodad_refs = Some(chunk.read_records(2)?),
                MOBN => bsp_nodes = Some(chunk.read_brw(MobnNode::SIZE)?),
                MOBR => bsp_faces = Some(chunk.read_records(2)?),
                MOCV if group.vertex_colors.is_none() => {
                    group.vertex_colors = Some(chunk.read_records(4)?);
                }
                MOCV => group.vertex_colors_2 = Some(chunk.read_records(4)?),
                MLIQ => {
                    let magma = is_magma_liquid(group.header.liquid_type);
                    group.liquid = Some(WmoLiquid::parse(&chunk, magma)?);
                }
                other => warn!("ignoring repeated {other} chunk"),
            }
        }

        if bsp_nodes.is_some() || bsp_faces.is_some() {
            group.bsp = Some(BspTree {
                nodes: bsp_nodes.unwrap_or_default(),
                faces: bsp_faces.unwrap_or_default(),
            });
        }

        for chunk in chunks {
            let chunk = chunk?;
            warn!("keeping chunk {} found after MOGP", chunk.tag);
            group.trailing_chunks.push(chunk);
        }

        let expected = group.present_flags();
        let stored = group.header.group_flags() & Self::chunk_flags();
        if stored != expected {
            warn!(
                "group flags {:?} disagree with chunks present {:?}",
                stored, expected
            );
        }
        debug!(
            "group: {} vertices, {} triangles, {} batches",
            group.vertices.len(),
            group.indices.len() / 3,
            group.batches.len()
        );

        group.validate()?;
        Ok(group)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(&mut Cursor::new(bytes))
    }

    /// Index checks that stay inside the group file.
    pub fn validate(&self) -> Result<()> {
        lookup::check_all_u16("MOVI", &self.indices, self.vertices.len())?;
        for batch in &self.batches {
            let end = batch.start_index as u64 + u64::from(batch.index_count);
            if end > self.indices.len() as u64 {
                return Err(
                    WowDataError::lookup("MOBA.indices", end as u32, self.indices.len()).into(),
                );
            }
        }
        if let Some(bsp) = &self.bsp {
            bsp.validate(self.indices.len() / 3)?;
        }
        Ok(())
    }

    /// Flags backed by optional chunks.
    pub fn chunk_flags() -> WmoGroupFlags {
        WmoGroupFlags::HAS_BSP
            | WmoGroupFlags::HAS_VERTEX_COLORS
            | WmoGroupFlags::HAS_LIGHTS
            | WmoGroupFlags::HAS_DOODADS
            | WmoGroupFlags::HAS_WATER
            | WmoGroupFlags::HAS_TWO_MOCV
            | WmoGroupFlags::HAS_TWO_MOTV
    }

    /// The chunk-backed flags this group's contents call for.
    pub fn present_flags(&self) -> WmoGroupFlags {
        let mut flags = WmoGroupFlags::empty();
        flags.set(WmoGroupFlags::HAS_BSP, self.bsp.is_some());
        flags.set(WmoGroupFlags::HAS_VERTEX_COLORS, self.vertex_colors.is_some());
        flags.set(WmoGroupFlags::HAS_LIGHTS, self.light_refs.is_some());
        flags.set(WmoGroupFlags::HAS_DOODADS, self.doodad_refs.is_some());
        flags.set(WmoGroupFlags::HAS_WATER, self.liquid.is_some());
        flags.set(WmoGroupFlags::HAS_TWO_MOCV, self.vertex_colors_2.is_some());
        flags.set(WmoGroupFlags::HAS_TWO_MOTV, self.tex_coords_2.is_some());
        flags
    }

    /// Set the chunk-backed flag bits from the chunks present. Other bits
    /// are left alone.
    pub fn sync_flags(&mut self) {
        let other = self.header.flags & !Self::chunk_flags().bits();
        self.header.flags = other | self.present_flags().bits();
    }

    pub fn flags(&self) -> WmoGroupFlags {
        self.header.group_flags()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        let mut out = ChunkWriter::new(writer, TagOrder::Reversed);
        out.write_chunk(MVER, &brw_payload(&[self.version])?)?;

        out.begin(MOGP)?;
        out.write_raw(&brw_payload(&[self.header])?)?;

        let mut sections = vec![
            (MOPY, brw_payload(&self.triangle_materials)?),
            (MOVI, packed(&self.indices)?),
            (MOVT, packed(&self.vertices)?),
            (MONR, packed(&self.normals)?),
            (MOTV, packed(&self.tex_coords)?),
            (MOBA, brw_payload(&self.batches)?),
        ];
        if let Some(refs) = &self.light_refs {
            sections.push((MOLR, packed(refs)?));
        }
        if let Some(refs) = &self.doodad_refs {
            sections.push((MODR, packed(refs)?));
        }
        if let Some(bsp) = &self.bsp {
            sections.push((MOBN, brw_payload(&bsp.nodes)?));
            sections.push((MOBR, packed(&bsp.faces)?));
        }
        if let Some(colors) = &self.vertex_colors {
            sections.push((MOCV, packed(colors)?));
        }
        if let Some(liquid) = &self.liquid {
            sections.push((MLIQ, liquid.to_payload()?));
        }
        if let Some(uvs) = &self.tex_coords_2 {
            sections.push((MOTV, packed(uvs)?));
        }
        if let Some(colors) = &self.vertex_colors_2 {
            sections.push((MOCV, packed(colors)?));
        }

        let mut anchors = Anchors::default();
        for (tag, payload) in &sections {
            write_anchored(&mut out, &mut anchors, &self.extra_chunks, *tag, payload)?;
        }
        write_unplaced(&mut out, &anchors, &self.extra_chunks)?;
        out.finish()?;

        for chunk in &self.trailing_chunks {
            out.write_chunk(chunk.tag, &chunk.data)?;
        }
        out.into_inner()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

fn packed<T: WowHeaderW>(items: &[T]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(wow_data::types::slice_size(items));
    for item in items {
        out.wow_write(item)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wow_data::chunk::{ChunkTag, chunk_bytes};

    fn triangle() -> WmoGroup {
        WmoGroup {
            triangle_materials: vec![MopyEntry {
                flags: 0x20,
                material_id: 0,
            }],
            indices: vec![0, 1, 2],
            vertices: vec![
                C3Vector::new(0.0, 0.0, 0.0),
                C3Vector::new(1.0, 0.0, 0.0),
                C3Vector::new(0.0, 1.0, 0.0),
            ],
            normals: vec![C3Vector::new(0.0, 0.0, 1.0); 3],
            tex_coords: vec![C2Vector::new(0.0, 0.0); 3],
            batches: vec![MobaEntry {
                index_count: 3,
                max_index: 2,
                ..MobaEntry::default()
            }],
            ..WmoGroup::default()
        }
    }

    #[test]
    fn mogp_size_covers_the_rest_of_the_file() {
        let bytes = triangle().to_bytes().unwrap();
        assert_eq!(&bytes[12..16], b"PGOM");
        let size = u32::from_le_bytes(bytes[16..20].try_into().unwrap()) as usize;
        assert_eq!(size, bytes.len() - 20);
    }

    #[test]
    fn optional_chunks_round_trip() {
        let mut group = triangle();
        group.light_refs = Some(vec![0]);
        group.vertex_colors = Some(vec![Color::WHITE; 3]);
        group.vertex_colors_2 = Some(vec![Color::TRANSPARENT; 3]);
        group.tex_coords_2 = Some(vec![C2Vector::new(0.5, 0.5); 3]);
        group.bsp = Some(BspTree {
            nodes: vec![MobnNode::leaf(0, 1)],
            faces: vec![0],
        });
        group.sync_flags();

        let back = WmoGroup::from_bytes(&group.to_bytes().unwrap()).unwrap();
        assert_eq!(back, group);
        assert!(back.flags().contains(WmoGroupFlags::HAS_TWO_MOCV | WmoGroupFlags::HAS_BSP));
        assert!(!back.flags().contains(WmoGroupFlags::HAS_DOODADS));
    }

    #[test]
    fn unknown_sub_chunks_keep_their_slot() {
        let mut group = triangle();
        group.vertex_colors = Some(vec![Color::WHITE; 3]);
        group.vertex_colors_2 = Some(vec![Color::TRANSPARENT; 3]);
        group.sync_flags();
        let bytes = group.to_bytes().unwrap();

        // MORI after the first MOCV, MORB after the second, GFID after MOGP
        let mogp = &bytes[12..];
        let mut subs = read_chunks(&mogp[8 + MogpHeader::SIZE..], TagOrder::Reversed).unwrap();
        let mocv: Vec<usize> = subs
            .iter()
            .enumerate()
            .filter_map(|(i, c)| (c.tag == MOCV).then_some(i))
            .collect();
        subs.insert(mocv[1] + 1, Chunk::new(ChunkTag::new(b"MORB"), vec![2; 10]));
        subs.insert(mocv[0] + 1, Chunk::new(ChunkTag::new(b"MORI"), vec![1; 6]));
        let mut payload = mogp[8..8 + MogpHeader::SIZE].to_vec();
        for chunk in &subs {
            payload.extend(chunk_bytes(chunk.tag, &chunk.data, TagOrder::Reversed));
        }
        let mut spliced = bytes[..12].to_vec();
        spliced.extend(chunk_bytes(MOGP, &payload, TagOrder::Reversed));
        spliced.extend(chunk_bytes(ChunkTag::new(b"GFID"), &[9; 4], TagOrder::Reversed));

        let back = WmoGroup::from_bytes(&spliced).unwrap();
        assert_eq!(back.extra_chunks[0].after, Some((MOCV, 0)));
        assert_eq!(back.extra_chunks[1].after, Some((MOCV, 1)));
        assert_eq!(back.trailing_chunks.len(), 1);
        assert_eq!(back.to_bytes().unwrap(), spliced);
    }

    #[test]
    fn sync_flags_keeps_unrelated_bits() {
        let mut group = triangle();
        group.header.flags =
            (WmoGroupFlags::INDOOR | WmoGroupFlags::HAS_WATER).bits() | 0x8000_0000;
        group.sync_flags();
        assert_eq!(group.header.flags, WmoGroupFlags::INDOOR.bits() | 0x8000_0000);
    }

    #[test]
    fn magma_liquid_uses_texture_coordinates() {
        let mut group = triangle();
        group.header.liquid_type = 3;
        group.liquid = Some(WmoLiquid {
            header: MliqHeader {
                x_verts: 2,
                y_verts: 1,
                x_tiles: 1,
                y_tiles: 1,
                ..MliqHeader::default()
            },
            vertices: vec![
                LiquidVertex::Magma {
                    u: 1,
                    v: -1,
                    height: 4.0,
                },
                LiquidVertex::Magma {
                    u: 2,
                    v: -2,
                    height: 5.0,
                },
            ],
            tile_flags: vec![0x0F],
            trailing: vec![0xAA],
        });
        group.sync_flags();

        let back = WmoGroup::from_bytes(&group.to_bytes().unwrap()).unwrap();
        assert_eq!(back.liquid, group.liquid);
    }

    #[test]
    fn water_vertices_keep_flow_bytes() {
        let mut group = triangle();
        group.header.liquid_type = 1;
        group.liquid = Some(WmoLiquid {
            header: MliqHeader {
                x_verts: 1,
                y_verts: 1,
                ..MliqHeader::default()
            },
            vertices: vec![LiquidVertex::Water {
                flow_1: 1,
                flow_2: 2,
                flow_1_pct: 50,
                filler: 0,
                height: 10.0,
            }],
            ..WmoLiquid::default()
        });
        let back = WmoGroup::from_bytes(&group.to_bytes().unwrap()).unwrap();
        assert_eq!(back.liquid.unwrap().vertices[0].height(), 10.0);
    }

    #[test]
    fn truncated_liquid_is_a_short_read() {
        let mut group = triangle();
        group.liquid = Some(WmoLiquid {
            header: MliqHeader {
                x_verts: 4,
                y_verts: 4,
                ..MliqHeader::default()
            },
            ..WmoLiquid::default()
        });
        let err = WmoGroup::from_bytes(&group.to_bytes().unwrap()).unwrap_err();
        assert!(err.kind().is_short_read());
    }

    #[test]
    fn index_past_vertices() {
        let mut group = triangle();
        group.indices[2] = 9;
        let err = WmoGroup::from_bytes(&group.to_bytes().unwrap()).unwrap_err();
        assert!(matches!(err.kind(), WowDataError::LookupOutOfRange { index: 9, .. }));
    }

    #[test]
    fn empty_group_decodes_to_empty_arrays() {
        let back = WmoGroup::from_bytes(&WmoGroup::default().to_bytes().unwrap()).unwrap();
        assert!(back.vertices.is_empty());
        assert!(back.bsp.is_none());
    }
}
