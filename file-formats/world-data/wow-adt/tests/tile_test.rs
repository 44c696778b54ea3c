use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wow_adt::chunks::*;
use wow_adt::{Adt, AdtError};
use wow_data::chunk::{ChunkTag, TagOrder, chunk_bytes, read_chunks};
use wow_data::error::WowDataError;
use wow_data::primitives::C3Vector;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn le(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// A one-chunk tile laid out by hand the way older clients ship it: the
/// MCLQ sub-chunk declares zero bytes and MCNR is followed by padding
/// outside its size.
fn hand_built_tile() -> Vec<u8> {
    let mut header = McnkHeader {
        flags: McnkFlags::new(McnkFlags::LQ_RIVER | 0x0004_0000),
        index_x: 0,
        index_y: 0,
        area_id: 40,
        unknown_but_used: 0x1234,
        position: C3Vector::new(1.0, 2.0, 3.0),
        ..McnkHeader::default()
    };
    let liquid = vec![0x5A; 24];
    header.size_liquid = liquid.len() as u32 + 8;

    let mut body = Vec::new();
    header.set_sub_offsets(136, 0);
    body.extend(chunk_bytes(MCVT, &vec![0; 580], TagOrder::Reversed));
    header.set_sub_offsets(136, 136 + body.len() as u32);
    body.extend_from_slice(b"RNCM");
    body.extend_from_slice(&435u32.to_le_bytes());
    body.extend_from_slice(&[0, 0, 127].repeat(145));
    body.extend_from_slice(&[0xEE; 13]);
    header.ofs_layer = 136 + body.len() as u32;
    body.extend(chunk_bytes(MCLY, &[], TagOrder::Reversed));
    header.ofs_refs = 136 + body.len() as u32;
    body.extend(chunk_bytes(MCRF, &[], TagOrder::Reversed));
    header.ofs_liquid = 136 + body.len() as u32;
    body.extend_from_slice(b"QLCM");
    body.extend_from_slice(&0u32.to_le_bytes());
    body.extend_from_slice(&liquid);
    header.ofs_snd_emitters = 136 + body.len() as u32;
    body.extend(chunk_bytes(MCSE, &[], TagOrder::Reversed));

    let mut mcnk = wow_data::chunk::brw_payload(&[header]).unwrap();
    mcnk.extend(body);

    let mut tile = Vec::new();
    tile.extend(chunk_bytes(MVER, &le(&[18]), TagOrder::Reversed));
    let mut mhdr = vec![0; 16];
    mhdr[1] = 0x40;
    let mhdr_at = tile.len();
    tile.extend(chunk_bytes(MHDR, &le(&mhdr), TagOrder::Reversed));
    let mcin_at = tile.len();
    tile.extend(chunk_bytes(MCIN, &vec![0; 4096], TagOrder::Reversed));
    for tag in [MTEX, MMDX, MMID, MWMO, MWID, MDDF, MODF] {
        tile.extend(chunk_bytes(tag, &[], TagOrder::Reversed));
    }
    let mcnk_at = tile.len();
    tile.extend(chunk_bytes(MCNK, &mcnk, TagOrder::Reversed));

    // fill in MHDR and the single MCIN entry
    let data_start = mhdr_at + 8;
    let mut offsets = vec![0u32; 16];
    let mut cursor = mcin_at;
    for (slot, size) in [(1, 4096), (2, 0), (3, 0), (4, 0), (5, 0), (6, 0), (7, 0), (8, 0)] {
        offsets[slot] = (cursor - data_start) as u32;
        cursor += 8 + size;
    }
    tile[data_start..data_start + 64].copy_from_slice(&le(&offsets));
    let entry = le(&[mcnk_at as u32, (mcnk.len() + 8) as u32, 0, 0]);
    tile[mcin_at + 8..mcin_at + 24].copy_from_slice(&entry);
    tile
}

#[test]
fn legacy_layout_survives_byte_for_byte() {
    init_logging();
    let bytes = hand_built_tile();
    let adt = Adt::from_bytes(&bytes).unwrap();

    let chunk = &adt.chunks[0];
    assert_eq!(chunk.header.unknown_but_used, 0x1234);
    assert_eq!(chunk.header.flags.value, McnkFlags::LQ_RIVER | 0x0004_0000);
    assert!(chunk.header.flags.has_liquid());
    let normals = chunk.normals.as_ref().unwrap();
    assert_eq!(normals.padding, vec![0xEE; 13]);
    assert!(!normals.padding_in_size);
    let liquid = chunk.liquid.as_ref().unwrap();
    assert_eq!(liquid.declared_size, 0);
    assert_eq!(liquid.data.len(), 24);

    assert_eq!(adt.to_bytes().unwrap(), bytes);
}

#[test]
fn saved_tile_opens_again() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Azeroth_32_48.adt");

    let mut adt = Adt::flat();
    let texture = adt.add_texture("tileset/generic/grass.blp");
    adt.chunks[17].layers = Some(vec![MclyLayer {
        texture_id: texture,
        ..MclyLayer::default()
    }]);
    adt.chunks[17].header.area_id = 12;
    adt.save(&path).unwrap();

    let loaded = Adt::open(&path).unwrap();
    assert_eq!(loaded.chunks.len(), CHUNKS_PER_TILE);
    let chunk = loaded.chunk_at(1, 1).unwrap();
    assert_eq!(chunk.header.area_id, 12);
    assert_eq!(chunk.header.n_layers, 1);
    assert_eq!(loaded.texture_name(0).unwrap(), "tileset/generic/grass.blp");
    assert_eq!(loaded.to_bytes().unwrap(), fs::read(&path).unwrap());
}

#[test]
fn truncated_file_reports_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.adt");
    let mut bytes = Adt::flat().to_bytes().unwrap();
    bytes.truncate(bytes.len() - 100);
    fs::write(&path, bytes).unwrap();

    let err = Adt::open(&path).unwrap_err();
    assert!(matches!(&err, AdtError::InFile { path: p, .. } if p == &path));
    assert!(err.kind().is_short_read());
}

#[test]
fn not_an_adt() {
    let bytes = chunk_bytes(ChunkTag::new(b"MOMO"), &[0; 4], TagOrder::Reversed);
    let err = Adt::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err.kind(), WowDataError::BadMagic { offset: 0, .. }));
}

#[test]
fn water_and_texture_flags_are_carried() {
    let mut adt = Adt::flat();
    adt.water = Some(vec![1, 2, 3, 4, 5, 6, 7, 8]);
    adt.texture_flags = Some(vec![0x1]);
    adt.add_texture("a.blp");

    let bytes = adt.to_bytes().unwrap();
    let chunks = read_chunks(&bytes, TagOrder::Reversed).unwrap();
    let header: MhdrChunk = chunks[1].read_brw_one().unwrap();
    let water = chunks.iter().find(|c| c.tag == MH2O).unwrap();
    assert_eq!(u64::from(header.mh2o) + 0x14, water.offset);
    assert_eq!(chunks.last().unwrap().tag, MTXF);

    let back = Adt::from_bytes(&bytes).unwrap();
    assert_eq!(back.water, adt.water);
    assert_eq!(back.texture_flags, Some(vec![0x1]));
}
