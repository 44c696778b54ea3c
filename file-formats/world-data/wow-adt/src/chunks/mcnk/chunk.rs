//! Reading and writing one MCNK with its sub-chunks.
//!
//! Sub-chunks are found by walking the payload after the 128-byte header,
//! not through the header offsets, which older exporters get wrong. Two
//! quirks of the format are handled while walking:
//!
//! - an MCNR declaring 435 bytes is followed by 13 padding bytes outside
//!   the chunk;
//! - an MCLQ declaring 0 bytes really holds `size_liquid - 8` bytes.

use std::io::Cursor;

use log::{trace, warn};
use wow_data::chunk::{Chunk, ChunkHeader, ChunkTag, TagOrder, brw_payload, chunk_bytes};
use wow_data::error::{Result, WowDataError};
use wow_data::prelude::{WowHeaderW, WowWriterForHeader};

use super::{McnkHeader, McnrChunk, MclyLayer, VERTICES_PER_CHUNK, VertexColor, VertexNormal};
use wow_data::chunk_order::{ChunkOrder, PendingExtras};
use crate::chunks::{
    MCAL, MCCV, MCLQ, MCLV, MCLY, MCNK, MCNK_ORDER, MCNR, MCRF, MCSE, MCSH, MCVT,
};

/// Legacy liquid, kept as the bytes the file holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MclqChunk {
    /// Size in the sub-chunk header; usually 0, with the real length in
    /// `McnkHeader::size_liquid`
    pub declared_size: u32,
    pub data: Vec<u8>,
}

/// A decoded map chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct McnkChunk {
    pub header: McnkHeader,
    /// MCVT, heights relative to `header.position.z`
    pub heights: Option<Vec<f32>>,
    /// MCCV
    pub vertex_colors: Option<Vec<VertexColor>>,
    /// MCLV
    pub vertex_lighting: Option<Vec<VertexColor>>,
    pub normals: Option<McnrChunk>,
    /// MCLY
    pub layers: Option<Vec<MclyLayer>>,
    /// MCRF: `n_doodad_refs` MDDF indices, then `n_map_obj_refs` MODF indices
    pub refs: Option<Vec<u32>>,
    /// MCSH, 64×64 bit shadow map
    pub shadow: Option<Vec<u8>>,
    /// MCAL, alpha maps of every layer back to back
    pub alpha: Option<Vec<u8>>,
    pub liquid: Option<MclqChunk>,
    /// MCSE, sound emitters
    pub sound_emitters: Option<Vec<u8>>,
    /// Sub-chunks this crate does not decode
    pub extra_chunks: Vec<Chunk>,
    /// Bytes after the last sub-chunk too short to be one
    pub trailing: Vec<u8>,
    pub order: ChunkOrder,
}

impl McnkChunk {
    /// A flat chunk at grid cell (`index_x`, `index_y`) with no textures.
    pub fn new(index_x: u32, index_y: u32) -> Self {
        Self {
            heights: Some(vec![0.0; VERTICES_PER_CHUNK]),
            normals: Some(McnrChunk::default()),
            layers: Some(Vec::new()),
            refs: Some(Vec::new()),
            ..Self::empty(McnkHeader {
                index_x,
                index_y,
                ..McnkHeader::default()
            })
        }
    }

    fn empty(header: McnkHeader) -> Self {
        Self {
            header,
            heights: None,
            vertex_colors: None,
            vertex_lighting: None,
            normals: None,
            layers: None,
            refs: None,
            shadow: None,
            alpha: None,
            liquid: None,
            sound_emitters: None,
            extra_chunks: Vec::new(),
            trailing: Vec::new(),
            order: ChunkOrder::default(),
        }
    }

    /// Decode a top level MCNK chunk.
    pub fn from_chunk(chunk: &Chunk) -> Result<Self> {
        chunk.expect(MCNK)?;
        let base = chunk.payload_offset();
        let data = &chunk.data;
        if data.len() < McnkHeader::SIZE {
            return Err(WowDataError::ShortRead { offset: Some(base) });
        }
        let header: McnkHeader = chunk.read_brw_one()?;
        let mut mcnk = Self::empty(header);

        let mut pos = McnkHeader::SIZE;
        while pos < data.len() {
            if data.len() - pos < ChunkHeader::SIZE as usize {
                warn!(
                    "{} trailing bytes in MCNK ({}, {}) at {:#x}",
                    data.len() - pos,
                    header.index_x,
                    header.index_y,
                    chunk.offset
                );
                mcnk.trailing = data[pos..].to_vec();
                break;
            }
            let sub_header = ChunkHeader::read(&mut Cursor::new(&data[pos..]), TagOrder::Reversed)?;
            let mut len = sub_header.size as usize;
            if sub_header.tag == MCLQ && len == 0 {
                len = (header.size_liquid as usize).saturating_sub(ChunkHeader::SIZE as usize);
            }
            let start = pos + ChunkHeader::SIZE as usize;
            let end = start + len;
            if end > data.len() {
                return Err(WowDataError::ShortRead {
                    offset: Some(base + pos as u64),
                });
            }
            let sub = Chunk {
                tag: sub_header.tag,
                offset: base + pos as u64,
                data: data[start..end].to_vec(),
            };
            trace!("  {} at {:#x}, {} bytes", sub.tag, sub.offset, sub.data.len());
            pos = end;
            mcnk.order.record(sub.tag);

            match sub.tag {
                MCVT => mcnk.heights = Some(sub.read_records(4)?),
                MCCV => mcnk.vertex_colors = Some(sub.read_brw(4)?),
                MCLV => mcnk.vertex_lighting = Some(sub.read_brw(4)?),
                MCNR => {
                    let mut normals = read_normals(&sub.data);
                    if !normals.padding_in_size && outside_padding_follows(data, pos) {
                        normals.padding = data[pos..pos + McnrChunk::PADDING].to_vec();
                        pos += McnrChunk::PADDING;
                    }
                    mcnk.normals = Some(normals);
                }
                MCLY => mcnk.layers = Some(sub.read_brw(MclyLayer::SIZE)?),
                MCRF => mcnk.refs = Some(sub.read_records(4)?),
                MCSH => mcnk.shadow = Some(sub.data),
                MCAL => mcnk.alpha = Some(sub.data),
                MCLQ => {
                    mcnk.liquid = Some(MclqChunk {
                        declared_size: sub_header.size,
                        data: sub.data,
                    });
                }
                MCSE => mcnk.sound_emitters = Some(sub.data),
                _ => {
                    warn!("keeping unknown MCNK sub-chunk {} at {:#x}", sub.tag, sub.offset);
                    mcnk.extra_chunks.push(sub);
                }
            }
        }
        Ok(mcnk)
    }

    /// The MCNK payload: header with recomputed offsets, then sub-chunks
    /// in their read order.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        let mut header = self.header;
        if !header.flags.high_res_holes() {
            header.set_sub_offsets(0, 0);
        }
        header.n_layers = self.layers.as_ref().map_or(0, |l| l.len() as u32);
        header.ofs_layer = 0;
        header.ofs_refs = 0;
        header.ofs_alpha = 0;
        header.size_alpha = 0;
        header.ofs_shadow = 0;
        header.size_shadow = 0;
        header.ofs_snd_emitters = 0;
        header.ofs_liquid = 0;
        header.size_liquid = 0;
        header.ofs_mccv = 0;
        header.ofs_mclv = 0;

        let mut body = Vec::new();
        let mut written: Vec<ChunkTag> = Vec::new();
        let mut pending = PendingExtras::new(&self.extra_chunks);
        for tag in self.order.plan(&MCNK_ORDER) {
            if written.contains(&tag) {
                continue;
            }
            // offsets count from the MCNK chunk header
            let at = (ChunkHeader::SIZE as usize + McnkHeader::SIZE + body.len()) as u32;
            let emitted = match tag {
                MCVT => self.heights.as_ref().map(|h| -> Result<()> {
                    if !header.flags.high_res_holes() {
                        let normal = header.ofs_normal();
                        header.set_sub_offsets(at, normal);
                    }
                    body.extend(chunk_bytes(MCVT, &packed(h)?, TagOrder::Reversed));
                    Ok(())
                }),
                MCCV => self.vertex_colors.as_ref().map(|c| -> Result<()> {
                    header.ofs_mccv = at;
                    body.extend(chunk_bytes(MCCV, &brw_payload(c)?, TagOrder::Reversed));
                    Ok(())
                }),
                MCLV => self.vertex_lighting.as_ref().map(|c| -> Result<()> {
                    header.ofs_mclv = at;
                    body.extend(chunk_bytes(MCLV, &brw_payload(c)?, TagOrder::Reversed));
                    Ok(())
                }),
                MCNR => self.normals.as_ref().map(|n| -> Result<()> {
                    if !header.flags.high_res_holes() {
                        let height = header.ofs_height();
                        header.set_sub_offsets(height, at);
                    }
                    write_normals(&mut body, n);
                    Ok(())
                }),
                MCLY => self.layers.as_ref().map(|l| -> Result<()> {
                    header.ofs_layer = at;
                    body.extend(chunk_bytes(MCLY, &brw_payload(l)?, TagOrder::Reversed));
                    Ok(())
                }),
                MCRF => self.refs.as_ref().map(|r| -> Result<()> {
                    header.ofs_refs = at;
                    body.extend(chunk_bytes(MCRF, &packed(r)?, TagOrder::Reversed));
                    Ok(())
                }),
                MCSH => self.shadow.as_ref().map(|s| -> Result<()> {
                    header.ofs_shadow = at;
                    header.size_shadow = (s.len() + ChunkHeader::SIZE as usize) as u32;
                    body.extend(chunk_bytes(MCSH, s, TagOrder::Reversed));
                    Ok(())
                }),
                MCAL => self.alpha.as_ref().map(|a| -> Result<()> {
                    header.ofs_alpha = at;
                    header.size_alpha = (a.len() + ChunkHeader::SIZE as usize) as u32;
                    body.extend(chunk_bytes(MCAL, a, TagOrder::Reversed));
                    Ok(())
                }),
                MCLQ => self.liquid.as_ref().map(|l| -> Result<()> {
                    header.ofs_liquid = at;
                    header.size_liquid = (l.data.len() + ChunkHeader::SIZE as usize) as u32;
                    body.extend_from_slice(&MCLQ.to_wire(TagOrder::Reversed));
                    let declared = if l.declared_size == 0 { 0 } else { l.data.len() as u32 };
                    body.extend_from_slice(&declared.to_le_bytes());
                    body.extend_from_slice(&l.data);
                    Ok(())
                }),
                MCSE => self.sound_emitters.as_ref().map(|s| -> Result<()> {
                    header.ofs_snd_emitters = at;
                    body.extend(chunk_bytes(MCSE, s, TagOrder::Reversed));
                    Ok(())
                }),
                other => {
                    if let Some(chunk) = pending.take(other) {
                        body.extend(chunk_bytes(chunk.tag, &chunk.data, TagOrder::Reversed));
                    }
                    None
                }
            };
            if let Some(result) = emitted {
                result?;
                written.push(tag);
            }
        }
        for chunk in pending.rest() {
            body.extend(chunk_bytes(chunk.tag, &chunk.data, TagOrder::Reversed));
        }
        body.extend_from_slice(&self.trailing);

        let mut payload = brw_payload(&[header])?;
        payload.extend(body);
        Ok(payload)
    }

    /// MDDF indices referenced by this chunk.
    pub fn doodad_refs(&self) -> &[u32] {
        let refs = self.refs.as_deref().unwrap_or_default();
        refs.get(..self.header.n_doodad_refs as usize).unwrap_or(refs)
    }

    /// MODF indices referenced by this chunk.
    pub fn map_object_refs(&self) -> &[u32] {
        let refs = self.refs.as_deref().unwrap_or_default();
        let start = (self.header.n_doodad_refs as usize).min(refs.len());
        let end = (start + self.header.n_map_obj_refs as usize).min(refs.len());
        &refs[start..end]
    }

    /// The raw MCAL bytes of `layer`, if it has an alpha map.
    ///
    /// A layer's map runs to the start of the next layer's map, or to the
    /// end of MCAL. Decompressing or expanding it is up to the caller.
    pub fn layer_alpha(&self, layer: usize) -> Option<&[u8]> {
        let layers = self.layers.as_ref()?;
        let alpha = self.alpha.as_ref()?;
        let current = layers.get(layer).filter(|l| l.flags.use_alpha_map())?;
        let start = current.offset_in_mcal as usize;
        let end = layers[layer + 1..]
            .iter()
            .find(|l| l.flags.use_alpha_map())
            .map_or(alpha.len(), |l| l.offset_in_mcal as usize);
        alpha.get(start..end)
    }

    /// Height of outer vertex (`x`, `y`) in world units, 0..=8 each.
    pub fn outer_height(&self, x: usize, y: usize) -> Option<f32> {
        let index = super::vertex_index(y * 2, x)?;
        let heights = self.heights.as_ref()?;
        heights.get(index).map(|h| h + self.header.position.z)
    }
}

fn packed<T: WowHeaderW>(items: &[T]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(wow_data::types::slice_size(items));
    for item in items {
        out.wow_write(item)?;
    }
    Ok(out)
}

/// Whole normals go to `normals`; anything after them, including a stray
/// partial normal, is kept as padding.
fn read_normals(data: &[u8]) -> McnrChunk {
    let split = data.len().min(McnrChunk::NORMALS_SIZE) / 3 * 3;
    let normals = data[..split]
        .chunks_exact(3)
        .map(|c| VertexNormal {
            x: c[0] as i8,
            z: c[1] as i8,
            y: c[2] as i8,
        })
        .collect();
    McnrChunk {
        normals,
        padding: data[split..].to_vec(),
        padding_in_size: data.len() > split,
    }
}

/// Whether the 13 bytes at `pos` are MCNR padding rather than the next
/// sub-chunk.
fn outside_padding_follows(data: &[u8], pos: usize) -> bool {
    if data.len() < pos + McnrChunk::PADDING {
        return false;
    }
    let wire = [data[pos], data[pos + 1], data[pos + 2], data[pos + 3]];
    !MCNK_ORDER.contains(&ChunkTag::from_wire(wire, TagOrder::Reversed))
}

fn write_normals(body: &mut Vec<u8>, normals: &McnrChunk) {
    body.extend_from_slice(&MCNR.to_wire(TagOrder::Reversed));
    body.extend_from_slice(&(normals.declared_size() as u32).to_le_bytes());
    for n in &normals.normals {
        body.extend_from_slice(&[n.x as u8, n.z as u8, n.y as u8]);
    }
    body.extend_from_slice(&normals.padding);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::McnkFlags;
    use pretty_assertions::assert_eq;
    use wow_data::chunk::read_chunks;

    #[test]
    fn partial_normal_stays_in_padding() {
        let data = [1, 2, 3, 4, 5, 6, 7, 8];
        let normals = read_normals(&data);
        assert_eq!(normals.normals.len(), 2);
        assert_eq!(normals.padding, vec![7, 8]);
        assert_eq!(normals.declared_size(), data.len());

        let mut body = Vec::new();
        write_normals(&mut body, &normals);
        assert_eq!(&body[8..], &data);
    }

    fn reparse(mcnk: &McnkChunk) -> McnkChunk {
        let bytes = chunk_bytes(MCNK, &mcnk.to_payload().unwrap(), TagOrder::Reversed);
        let chunks = read_chunks(&bytes, TagOrder::Reversed).unwrap();
        McnkChunk::from_chunk(&chunks[0]).unwrap()
    }

    fn textured_chunk() -> McnkChunk {
        let mut mcnk = McnkChunk::new(2, 5);
        mcnk.header.flags = McnkFlags::new(McnkFlags::HAS_MCCV | 0x0100_0000);
        mcnk.header.unknown_but_used = 1;
        mcnk.vertex_colors = Some(vec![VertexColor::NEUTRAL; VERTICES_PER_CHUNK]);
        mcnk.layers = Some(vec![
            MclyLayer::default(),
            MclyLayer {
                texture_id: 1,
                flags: crate::chunks::MclyFlags {
                    value: crate::chunks::MclyFlags::USE_ALPHA_MAP,
                },
                offset_in_mcal: 0,
                effect_id: MclyLayer::NO_EFFECT,
            },
        ]);
        mcnk.alpha = Some(vec![0x11; 2048]);
        mcnk.refs = Some(vec![0, 1, 0]);
        mcnk.header.n_doodad_refs = 2;
        mcnk.header.n_map_obj_refs = 1;
        mcnk.liquid = Some(MclqChunk {
            declared_size: 0,
            data: vec![0xAA; 20],
        });
        mcnk.sound_emitters = Some(Vec::new());
        mcnk
    }

    #[test]
    fn offsets_point_at_their_sub_chunks() {
        let mcnk = textured_chunk();
        let payload = mcnk.to_payload().unwrap();
        let header = reparse(&mcnk).header;

        let tag_at = |ofs: u32| {
            let at = ofs as usize - 8;
            ChunkTag::from_wire(
                [payload[at], payload[at + 1], payload[at + 2], payload[at + 3]],
                TagOrder::Reversed,
            )
        };
        assert_eq!(header.ofs_height(), 8 + 128);
        assert_eq!(tag_at(header.ofs_height()), MCVT);
        assert_eq!(tag_at(header.ofs_mccv), MCCV);
        assert_eq!(tag_at(header.ofs_normal()), MCNR);
        assert_eq!(tag_at(header.ofs_layer), MCLY);
        assert_eq!(tag_at(header.ofs_refs), MCRF);
        assert_eq!(tag_at(header.ofs_alpha), MCAL);
        assert_eq!(tag_at(header.ofs_liquid), MCLQ);
        assert_eq!(tag_at(header.ofs_snd_emitters), MCSE);
        assert_eq!(header.size_alpha, 2048 + 8);
        assert_eq!(header.size_liquid, 28);
        assert_eq!(header.n_layers, 2);
        assert_eq!(header.ofs_shadow, 0);
        assert_eq!(header.ofs_mclv, 0);
    }

    #[test]
    fn unknown_bits_and_fields_are_preserved() {
        let mcnk = textured_chunk();
        let back = reparse(&mcnk);
        assert_eq!(back.header.flags.value, McnkFlags::HAS_MCCV | 0x0100_0000);
        assert_eq!(back.header.unknown_but_used, 1);
        assert_eq!(back.liquid, mcnk.liquid);
        assert_eq!(back.doodad_refs(), &[0, 1]);
        assert_eq!(back.map_object_refs(), &[0]);
        assert_eq!(back.layer_alpha(1).map(<[u8]>::len), Some(2048));
        assert_eq!(back.layer_alpha(0), None);
        assert_eq!(back.to_payload().unwrap(), mcnk.to_payload().unwrap());
    }

    #[test]
    fn short_normals_keep_their_padding_outside() {
        let mcnk = McnkChunk::new(0, 0);
        let payload = mcnk.to_payload().unwrap();
        let ofs = reparse(&mcnk).header.ofs_normal() as usize - 8;
        assert_eq!(&payload[ofs + 4..ofs + 8], &435u32.to_le_bytes());
        // the MCLY header follows the padding
        let next = ofs + 8 + 435 + 13;
        assert_eq!(&payload[next..next + 4], b"YLCM");

        let back = reparse(&mcnk);
        let normals = back.normals.unwrap();
        assert_eq!(normals.padding.len(), 13);
        assert!(!normals.padding_in_size);
        assert_eq!(normals.normals[0], VertexNormal::UP);
    }

    #[test]
    fn unknown_sub_chunks_keep_their_place() {
        let mut mcnk = McnkChunk::new(0, 0);
        let tag = ChunkTag::new(b"MCDD");
        mcnk.order.record(MCVT);
        mcnk.order.record(tag);
        mcnk.order.record(MCNR);
        mcnk.extra_chunks.push(Chunk::new(tag, vec![1, 2, 3, 4]));

        let back = reparse(&mcnk);
        assert_eq!(&back.order.tags()[..3], &[MCVT, tag, MCNR]);
        assert_eq!(back.extra_chunks[0].data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn truncated_sub_chunk() {
        let mut payload = McnkChunk::new(0, 0).to_payload().unwrap();
        payload.truncate(McnkHeader::SIZE + 100);
        let chunk = Chunk::new(MCNK, payload);
        let err = McnkChunk::from_chunk(&chunk).unwrap_err();
        assert!(matches!(err, WowDataError::ShortRead { offset: Some(136) }));
    }

    #[test]
    fn heights_are_relative_to_the_chunk() {
        let mut mcnk = McnkChunk::new(0, 0);
        mcnk.header.position.z = 100.0;
        if let Some(heights) = mcnk.heights.as_mut() {
            heights[super::super::vertex_index(2, 1).unwrap()] = 5.0;
        }
        assert_eq!(mcnk.outer_height(1, 1), Some(105.0));
        assert_eq!(mcnk.outer_height(9, 0), None);
    }
}
